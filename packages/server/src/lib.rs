pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod ownership;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use common::config::DiskConfig;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{AppConfig, CorsConfig};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clover File Service API",
        version = "1.0.0",
        description = "Certificates, documents, upload links and stored files of association members"
    ),
    tags(
        (name = "Certificates", description = "Certificate uploads and the public certificate gateway"),
        (name = "Upload Links", description = "Single-use, time-bounded links for anonymous uploads"),
        (name = "Documents", description = "Document metadata bound to stored files"),
        (name = "Files", description = "Stored file records"),
        (name = "Users", description = "Profile pictures and account removal"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes(&state.config))
        .merge(routes::public_routes())
        .split_for_parts();

    let cors = cors_layer(&state.config.server.cors);
    let storage = local_disk_service(&state.config);

    let mut app = router
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api));

    if let Some((url, service)) = storage {
        app = app.nest_service(&url, service);
    }

    app.layer(cors)
}

/// Serve the default disk's files when it is a local directory with a
/// relative URL prefix such as `/storage`.
fn local_disk_service(config: &AppConfig) -> Option<(String, ServeDir)> {
    let storage = &config.storage;
    match storage.disks.get(&storage.default_disk)? {
        DiskConfig::Local(local) if local.url.starts_with('/') && local.url.len() > 1 => Some((
            local.url.trim_end_matches('/').to_string(),
            ServeDir::new(&local.root),
        )),
        _ => None,
    }
}
