use sea_orm::{EntityTrait, PaginatorTrait};
use server::entity::{file_record, upload_link, user};

use crate::common::{FilePart, TestApp, gateway_target, routes};

const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0 400x400 avatar";

mod avatar {
    use super::*;

    #[tokio::test]
    async fn stores_avatar_and_rejects_duplicate_for_same_owner() {
        let app = TestApp::spawn().await;
        let first = app.create_user().await;
        let second = app.create_user().await;

        let res = app
            .upload(routes::AVATAR, FilePart::jpg(JPEG), &[], Some(&first.token))
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["disk"], "s3");
        assert_eq!(res.body["extension"], "jpg");
        assert_eq!(
            res.body["url"],
            format!("https://bucket.test/user_profile_pictures/{}.jpg", first.id)
        );
        assert!(
            app.remote()
                .exists(&format!("user_profile_pictures/{}.jpg", first.id))
                .await
                .unwrap()
        );

        let dup = app
            .upload(routes::AVATAR, FilePart::jpg(JPEG), &[], Some(&first.token))
            .await;
        assert_eq!(dup.status, 400);
        assert_eq!(dup.code(), "VALIDATION_ERROR");

        let other = app
            .upload(routes::AVATAR, FilePart::jpg(JPEG), &[], Some(&second.token))
            .await;
        assert_eq!(other.status, 201, "{}", other.text);
    }

    #[tokio::test]
    async fn replacing_avatar_removes_previous_picture() {
        let app = TestApp::spawn().await;
        let member = app.create_user().await;

        let jpg = app
            .upload(routes::AVATAR, FilePart::jpg(JPEG), &[], Some(&member.token))
            .await;
        assert_eq!(jpg.status, 201);

        let png = app
            .upload(
                routes::AVATAR,
                FilePart::new("me.png", "image/png", b"\x89PNG new avatar".to_vec()),
                &[],
                Some(&member.token),
            )
            .await;
        assert_eq!(png.status, 201, "{}", png.text);

        let jpg_key = format!("user_profile_pictures/{}.jpg", member.id);
        let png_key = format!("user_profile_pictures/{}.png", member.id);
        assert!(!app.remote().exists(&jpg_key).await.unwrap());
        assert!(app.remote().exists(&png_key).await.unwrap());

        let old = app
            .get_with_token(&routes::file(jpg.id()), &member.token)
            .await;
        assert_eq!(old.status, 404);

        let same_ext = app
            .upload(
                routes::AVATAR,
                FilePart::new("me2.png", "image/png", b"\x89PNG newer avatar".to_vec()),
                &[],
                Some(&member.token),
            )
            .await;
        assert_eq!(same_ext.status, 201);
        assert!(app.remote().exists(&png_key).await.unwrap());
        assert_eq!(
            app.remote().get(&png_key).await.unwrap(),
            b"\x89PNG newer avatar"
        );
        assert_eq!(file_record::Entity::find().count(&app.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rejects_documents_and_oversized_images() {
        let app = TestApp::spawn_with(|upload| upload.image_max_size = 32).await;
        let member = app.create_user().await;

        let pdf = app
            .upload(
                routes::AVATAR,
                FilePart::pdf(b"%PDF".to_vec()),
                &[],
                Some(&member.token),
            )
            .await;
        assert_eq!(pdf.status, 400);

        let large = app
            .upload(
                routes::AVATAR,
                FilePart::jpg(vec![0xFF; 33]),
                &[],
                Some(&member.token),
            )
            .await;
        assert_eq!(large.status, 400);
        assert!(
            app.remote()
                .list("user_profile_pictures/")
                .await
                .unwrap()
                .is_empty()
        );
    }
}

mod delete_account {
    use super::*;

    #[tokio::test]
    async fn removes_user_links_documents_files_and_bytes() {
        let app = TestApp::spawn().await;
        let member = app.create_user().await;
        let bystander = app.create_user().await;

        let doc = app.store_certificate(&member, "Diploma", b"%PDF mine").await;
        app.store_certificate(&bystander, "Other", b"%PDF theirs").await;
        app.issue_link(&member, 3, None).await;
        let avatar = app
            .upload(routes::AVATAR, FilePart::jpg(JPEG), &[], Some(&member.token))
            .await;
        assert_eq!(avatar.status, 201);

        let (owner, filename) = gateway_target(doc["file"]["url"].as_str().unwrap());
        let cert_key = format!("certificate/{owner}/{filename}");

        let res = app.delete_with_token(routes::ME, &member.token).await;
        assert_eq!(res.status, 204, "{}", res.text);

        assert!(user::Entity::find_by_id(member.id).one(&app.db).await.unwrap().is_none());
        assert_eq!(upload_link::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(file_record::Entity::find().count(&app.db).await.unwrap(), 1);
        assert!(!app.remote().exists(&cert_key).await.unwrap());
        assert!(
            !app.remote()
                .exists(&format!("user_profile_pictures/{}.jpg", member.id))
                .await
                .unwrap()
        );

        let docs = app.get_with_token(routes::DOCUMENTS, &bystander.token).await;
        assert_eq!(docs.body["total"], 1);

        let again = app.delete_with_token(routes::ME, &member.token).await;
        assert_eq!(again.status, 404);

        // A later write through the same token starts from an empty account.
        app.issue_link(&member, 1, None).await;
        let docs = app.get_with_token(routes::DOCUMENTS, &member.token).await;
        assert_eq!(docs.body["total"], 0);
    }
}

mod provisioning {
    use super::*;

    #[tokio::test]
    async fn first_write_creates_local_account() {
        let app = TestApp::spawn().await;
        let member = app.token_for(4242, "external member");
        assert!(user::Entity::find_by_id(4242).one(&app.db).await.unwrap().is_none());

        let link = app
            .post_with_token(
                routes::UPLOAD_LINKS,
                &serde_json::json!({ "duration": 2 }),
                &member.token,
            )
            .await;
        assert_eq!(link.status, 201, "{}", link.text);

        let stored = user::Entity::find_by_id(4242).one(&app.db).await.unwrap().unwrap();
        assert_eq!(stored.name, "external member");

        let body = app.store_certificate(&member, "Diploma", b"%PDF external").await;
        assert_eq!(body["user_id"], 4242);
        assert_eq!(user::Entity::find().count(&app.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn avatar_upload_provisions_account() {
        let app = TestApp::spawn().await;
        let member = app.token_for(777, "photographer");

        let res = app
            .upload(routes::AVATAR, FilePart::jpg(JPEG), &[], Some(&member.token))
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["owner_id"], 777);
    }
}
