use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use server::entity::{file_record, upload_link};

use crate::common::{FilePart, TestApp, routes};

const PDF: &[u8] = b"%PDF-1.4 deposited through a link";

async fn find_link(app: &TestApp, token: &str) -> upload_link::Model {
    upload_link::Entity::find()
        .filter(upload_link::Column::Token.eq(token))
        .one(&app.db)
        .await
        .expect("DB query failed")
        .expect("link should exist")
}

mod issue {
    use super::*;

    #[tokio::test]
    async fn issues_unused_link_for_requested_duration() {
        let app = TestApp::spawn().await;
        let user = app.create_user().await;
        let before = Utc::now();

        let res = app
            .post_with_token(
                routes::UPLOAD_LINKS,
                &serde_json::json!({ "duration": 3 }),
                &user.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let token = res.body["token"].as_str().unwrap();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(
            res.body["url"],
            format!("/api/v1/public/upload-links/{token}")
        );
        assert!(res.body["used_at"].is_null());
        assert!(res.body["title"].is_null());

        let expires_at: DateTime<Utc> = res.body["expires_at"].as_str().unwrap().parse().unwrap();
        let expected = before + Duration::days(3);
        assert!((expires_at - expected).num_seconds().abs() < 60);

        let stored = find_link(&app, token).await;
        assert_eq!(stored.user_id, user.id);
        assert!(stored.used_at.is_none());
    }

    #[tokio::test]
    async fn tokens_are_unique() {
        let app = TestApp::spawn().await;
        let user = app.create_user().await;

        let a = app.issue_link(&user, 1, None).await;
        let b = app.issue_link(&user, 1, None).await;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn rejects_out_of_range_duration() {
        let app = TestApp::spawn().await;
        let user = app.create_user().await;

        for duration in [0, -1, 366] {
            let res = app
                .post_with_token(
                    routes::UPLOAD_LINKS,
                    &serde_json::json!({ "duration": duration }),
                    &user.token,
                )
                .await;
            assert_eq!(res.status, 400, "duration {duration}");
            assert_eq!(res.code(), "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn rejects_malformed_body() {
        let app = TestApp::spawn().await;
        let user = app.create_user().await;

        let res = app
            .post_with_token(
                routes::UPLOAD_LINKS,
                &serde_json::json!({ "duration": "three" }),
                &user.token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn latest_returns_most_recent_link() {
        let app = TestApp::spawn().await;
        let user = app.create_user().await;

        let none = app
            .get_with_token(routes::LATEST_UPLOAD_LINK, &user.token)
            .await;
        assert_eq!(none.status, 404);

        app.issue_link(&user, 2, None).await;
        let second = app.issue_link(&user, 5, Some("Insurance")).await;

        let res = app
            .get_with_token(routes::LATEST_UPLOAD_LINK, &user.token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["url"], routes::public_upload_link(&second));
    }
}

mod public_form {
    use super::*;

    #[tokio::test]
    async fn describes_usable_link() {
        let app = TestApp::spawn().await;
        let user = app.create_user().await;

        let open = app.issue_link(&user, 3, None).await;
        let res = app
            .get_without_token(&routes::public_upload_link(&open))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["title_required"], true);

        let fixed = app.issue_link(&user, 3, Some("Medical certificate")).await;
        let res = app
            .get_without_token(&routes::public_upload_link(&fixed))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["title_required"], false);
        assert_eq!(res.body["title"], "Medical certificate");
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app
            .get_without_token(&routes::public_upload_link(&"x".repeat(64)))
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn expired_link_is_gone_and_stays_gone() {
        let app = TestApp::spawn().await;
        let user = app.create_user().await;
        let token = app.issue_link(&user, 1, None).await;

        let mut link: upload_link::ActiveModel = find_link(&app, &token).await.into();
        link.expires_at = Set(Utc::now() - Duration::seconds(1));
        link.update(&app.db).await.unwrap();

        let form = app
            .get_without_token(&routes::public_upload_link(&token))
            .await;
        assert_eq!(form.status, 410);
        assert_eq!(form.code(), "GONE");

        let upload = app
            .upload(
                &routes::public_upload_link(&token),
                FilePart::pdf(PDF),
                &[("title", "Late")],
                None,
            )
            .await;
        assert_eq!(upload.status, 410);
        assert!(find_link(&app, &token).await.used_at.is_none());
    }
}

mod consume {
    use super::*;

    #[tokio::test]
    async fn first_upload_succeeds_and_second_is_gone() {
        let app = TestApp::spawn().await;
        let user = app.create_user().await;
        let token = app.issue_link(&user, 3, None).await;

        let res = app
            .upload(
                &routes::public_upload_link(&token),
                FilePart::pdf(PDF),
                &[("title", "Medical certificate")],
                None,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["title"], "Medical certificate");
        assert_eq!(res.body["user_id"], user.id);
        assert_eq!(
            res.body["expiration_date"],
            (Utc::now().date_naive() + Duration::days(30)).to_string()
        );
        assert!(
            res.body["file"]["url"]
                .as_str()
                .unwrap()
                .starts_with(&format!("/certificate/{}/", user.id))
        );
        assert!(find_link(&app, &token).await.used_at.is_some());

        let again = app
            .upload(
                &routes::public_upload_link(&token),
                FilePart::pdf(b"%PDF-1.4 something else".to_vec()),
                &[("title", "Second try")],
                None,
            )
            .await;
        assert_eq!(again.status, 410);
        assert_eq!(again.code(), "GONE");

        let form = app
            .get_without_token(&routes::public_upload_link(&token))
            .await;
        assert_eq!(form.status, 410);

        let docs = app.get_with_token(routes::DOCUMENTS, &user.token).await;
        assert_eq!(docs.body["total"], 1);
        assert_eq!(app.remote().list(&format!("certificate/{}/", user.id)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_uploads_consume_link_once() {
        let app = TestApp::spawn().await;
        let user = app.create_user().await;
        let token = app.issue_link(&user, 3, None).await;
        let path = routes::public_upload_link(&token);

        let (a, b) = tokio::join!(
            app.upload(
                &path,
                FilePart::pdf(b"%PDF-1.4 first".to_vec()),
                &[("title", "A")],
                None
            ),
            app.upload(
                &path,
                FilePart::pdf(b"%PDF-1.4 second".to_vec()),
                &[("title", "B")],
                None
            ),
        );

        let mut statuses = [a.status, b.status];
        statuses.sort();
        assert_eq!(statuses, [201, 410], "{} / {}", a.text, b.text);

        let docs = app.get_with_token(routes::DOCUMENTS, &user.token).await;
        assert_eq!(docs.body["total"], 1);
        // The loser's bytes were discarded.
        assert_eq!(app.remote().list(&format!("certificate/{}/", user.id)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fixed_title_wins_over_supplied_title() {
        let app = TestApp::spawn().await;
        let user = app.create_user().await;
        let token = app.issue_link(&user, 3, Some("Insurance")).await;

        let res = app
            .upload(
                &routes::public_upload_link(&token),
                FilePart::pdf(PDF),
                &[("title", "Something else")],
                None,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["title"], "Insurance");

        let token = app.issue_link(&user, 3, Some("Insurance")).await;
        let res = app
            .upload(
                &routes::public_upload_link(&token),
                FilePart::pdf(b"%PDF-1.4 untitled upload".to_vec()),
                &[],
                None,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn rejected_upload_leaves_link_usable() {
        let app = TestApp::spawn().await;
        let user = app.create_user().await;
        let token = app.issue_link(&user, 3, None).await;
        let path = routes::public_upload_link(&token);

        let untitled = app.upload(&path, FilePart::pdf(PDF), &[], None).await;
        assert_eq!(untitled.status, 400);

        let wrong_type = app
            .upload(
                &path,
                FilePart::new("script.sh", "text/x-shellscript", b"echo hi".to_vec()),
                &[("title", "Script")],
                None,
            )
            .await;
        assert_eq!(wrong_type.status, 400);

        assert!(find_link(&app, &token).await.used_at.is_none());
        assert!(app.remote().list("certificate/").await.unwrap().is_empty());

        let ok = app
            .upload(&path, FilePart::pdf(PDF), &[("title", "Finally")], None)
            .await;
        assert_eq!(ok.status, 201, "{}", ok.text);
    }

    #[tokio::test]
    async fn failed_write_after_storage_keeps_link_and_discards_bytes() {
        let app = TestApp::spawn().await;
        let user = app.create_user().await;
        let token = app.issue_link(&user, 3, None).await;
        app.break_table("document").await;

        let res = app
            .upload(
                &routes::public_upload_link(&token),
                FilePart::pdf(PDF),
                &[("title", "Medical certificate")],
                None,
            )
            .await;
        assert_eq!(res.status, 500, "{}", res.text);
        assert_eq!(res.code(), "INTERNAL_ERROR");

        assert!(find_link(&app, &token).await.used_at.is_none());
        assert!(
            app.remote()
                .list(&format!("certificate/{}/", user.id))
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            file_record::Entity::find().count(&app.db).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn duplicate_of_owner_file_is_rejected() {
        let app = TestApp::spawn().await;
        let user = app.create_user().await;
        app.store_certificate(&user, "Original", PDF).await;
        let token = app.issue_link(&user, 3, None).await;

        let res = app
            .upload(
                &routes::public_upload_link(&token),
                FilePart::pdf(PDF),
                &[("title", "Copy")],
                None,
            )
            .await;
        assert_eq!(res.status, 400);
        assert!(find_link(&app, &token).await.used_at.is_none());
    }
}
