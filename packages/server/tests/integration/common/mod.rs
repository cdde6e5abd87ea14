use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use chrono::Utc;
use ::common::config::{DiskConfig, LocalDiskConfig, MemoryDiskConfig, StorageAppConfig};
use ::common::{Disk, DiskRegistry};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, Set};
use serde_json::Value;
use tempfile::TempDir;

use server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, UploadConfig,
};
use server::entity::user;
use server::state::AppState;
use server::utils::jwt;

const JWT_SECRET: &str = "test-secret-for-integration-tests";

/// Distinct user names across tests in this binary.
static USER_COUNTER: AtomicI32 = AtomicI32::new(0);

pub mod routes {
    pub const CERTIFICATES: &str = "/api/v1/certificates";
    pub const UPLOAD_LINKS: &str = "/api/v1/upload-links";
    pub const LATEST_UPLOAD_LINK: &str = "/api/v1/upload-links/latest";
    pub const DOCUMENTS: &str = "/api/v1/documents";
    pub const AVATAR: &str = "/api/v1/users/me/avatar";
    pub const ME: &str = "/api/v1/users/me";

    pub fn certificate(owner_id: i32, filename: &str) -> String {
        format!("/certificate/{owner_id}/{filename}")
    }

    pub fn public_upload_link(token: &str) -> String {
        format!("/api/v1/public/upload-links/{token}")
    }

    pub fn document(id: i32) -> String {
        format!("/api/v1/documents/{id}")
    }

    pub fn file(id: i32) -> String {
        format!("/api/v1/files/{id}")
    }

    pub fn owner_files(kind: &str, id: i32) -> String {
        format!("/api/v1/owners/{kind}/{id}/files")
    }
}

/// A running test server backed by in-memory SQLite, a temp-dir public disk
/// and an in-memory remote disk.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub disks: Arc<DiskRegistry>,
    _storage_dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body.
    pub bytes: Vec<u8>,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
    pub headers: reqwest::header::HeaderMap,
}

/// A user row plus a bearer token for it.
pub struct TestUser {
    pub id: i32,
    pub token: String,
}

/// One multipart file part.
pub struct FilePart<'a> {
    pub field: &'a str,
    pub filename: &'a str,
    pub mime: &'a str,
    pub bytes: Vec<u8>,
}

impl<'a> FilePart<'a> {
    pub fn new(filename: &'a str, mime: &'a str, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            field: "file",
            filename,
            mime,
            bytes: bytes.into(),
        }
    }

    pub fn pdf(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new("certificate.pdf", "application/pdf", bytes)
    }

    pub fn jpg(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new("avatar.jpg", "image/jpeg", bytes)
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(configure: impl FnOnce(&mut UploadConfig)) -> Self {
        let storage_dir = tempfile::tempdir().expect("Failed to create storage dir");

        let mut upload = UploadConfig::default();
        configure(&mut upload);

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
                log_level: "debug".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
            },
            storage: StorageAppConfig {
                default_disk: "public".to_string(),
                remote_disk: "s3".to_string(),
                disks: HashMap::from([
                    (
                        "public".to_string(),
                        DiskConfig::Local(LocalDiskConfig {
                            root: storage_dir.path().to_path_buf(),
                            url: "/storage".to_string(),
                        }),
                    ),
                    (
                        "s3".to_string(),
                        DiskConfig::Memory(MemoryDiskConfig {
                            url: "https://bucket.test".to_string(),
                        }),
                    ),
                ]),
            },
            upload,
        };

        let db = server::database::init_db(&app_config.database.url)
            .await
            .expect("Failed to initialize test database");
        let disks = Arc::new(
            DiskRegistry::from_config(&app_config.storage)
                .await
                .expect("Failed to build test disks"),
        );

        let state = AppState {
            db: db.clone(),
            disks: disks.clone(),
            config: app_config,
        };
        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            disks,
            _storage_dir: storage_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn remote(&self) -> &Arc<dyn Disk> {
        self.disks.remote_disk().expect("remote disk is configured")
    }

    /// Insert a user row directly and sign a token for it.
    pub async fn create_user(&self) -> TestUser {
        let n = USER_COUNTER.fetch_add(1, Ordering::Relaxed);
        let model = user::ActiveModel {
            name: Set(format!("member{n}")),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("Failed to insert user");

        let token = jwt::sign(model.id, &model.name, JWT_SECRET).expect("Failed to sign token");
        TestUser {
            id: model.id,
            token,
        }
    }

    /// Make every later write to `table` fail with a database error.
    pub async fn break_table(&self, table: &str) {
        self.db
            .execute_unprepared(&format!("DROP TABLE \"{table}\""))
            .await
            .expect("Failed to drop table");
    }

    /// Sign a token for an account that has no local row yet.
    pub fn token_for(&self, user_id: i32, name: &str) -> TestUser {
        let token = jwt::sign(user_id, name, JWT_SECRET).expect("Failed to sign token");
        TestUser { id: user_id, token }
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Send a multipart form with one file and extra text fields.
    pub async fn upload(
        &self,
        path: &str,
        file: FilePart<'_>,
        fields: &[(&str, &str)],
        token: Option<&str>,
    ) -> TestResponse {
        let part = Part::bytes(file.bytes)
            .file_name(file.filename.to_string())
            .mime_str(file.mime)
            .expect("Failed to set MIME type");
        let mut form = Form::new().part(file.field.to_string(), part);
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }

        let mut req = self.client.post(self.url(path)).multipart(form);
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let res = req
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Upload a certificate for `user` and return the created document body.
    pub async fn store_certificate(&self, user: &TestUser, title: &str, bytes: &[u8]) -> Value {
        let res = self
            .upload(
                routes::CERTIFICATES,
                FilePart::pdf(bytes.to_vec()),
                &[("title", title)],
                Some(&user.token),
            )
            .await;
        assert_eq!(res.status, 201, "store_certificate failed: {}", res.text);
        res.body
    }

    /// Issue an upload link and return its token.
    pub async fn issue_link(&self, user: &TestUser, duration: i64, name: Option<&str>) -> String {
        let res = self
            .post_with_token(
                routes::UPLOAD_LINKS,
                &serde_json::json!({ "duration": duration, "name": name }),
                &user.token,
            )
            .await;
        assert_eq!(res.status, 201, "issue_link failed: {}", res.text);
        res.body["token"]
            .as_str()
            .expect("link response should contain a token")
            .to_string()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            bytes,
            text,
            body,
            headers,
        }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

/// Split a gateway URL `.../certificate/{owner}/{filename}` into its parts.
pub fn gateway_target(url: &str) -> (i32, String) {
    let rest = url
        .split("/certificate/")
        .nth(1)
        .expect("url should point at the certificate gateway");
    let (owner, filename) = rest.split_once('/').expect("owner and filename");
    (owner.parse().expect("numeric owner"), filename.to_string())
}
