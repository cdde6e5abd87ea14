use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use server::entity::{document, file_record};

use crate::common::{TestApp, gateway_target, routes};

#[tokio::test]
async fn lists_only_own_documents_newest_first() {
    let app = TestApp::spawn().await;
    let alice = app.create_user().await;
    let bob = app.create_user().await;

    app.store_certificate(&alice, "First", b"%PDF one").await;
    app.store_certificate(&alice, "Second", b"%PDF two").await;
    app.store_certificate(&bob, "Bob's", b"%PDF three").await;

    let res = app.get_with_token(routes::DOCUMENTS, &alice.token).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["total"], 2);
    assert_eq!(res.body["documents"][0]["title"], "Second");
    assert_eq!(res.body["documents"][1]["title"], "First");
    assert!(res.body["documents"][0]["file"]["url"].is_string());
}

#[tokio::test]
async fn delete_removes_document_file_record_and_bytes() {
    let app = TestApp::spawn().await;
    let user = app.create_user().await;
    let body = app.store_certificate(&user, "Diploma", b"%PDF bytes").await;
    let doc_id = body["id"].as_i64().unwrap() as i32;
    let file_id = body["file"]["id"].as_i64().unwrap() as i32;
    let url = body["file"]["url"].as_str().unwrap().to_string();
    let (owner, filename) = gateway_target(&url);
    let key = format!("certificate/{owner}/{filename}");
    assert!(app.remote().exists(&key).await.unwrap());

    let res = app
        .delete_with_token(&routes::document(doc_id), &user.token)
        .await;
    assert_eq!(res.status, 204, "{}", res.text);

    assert!(
        document::Entity::find_by_id(doc_id)
            .one(&app.db)
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(
        file_record::Entity::find()
            .filter(file_record::Column::Id.eq(file_id))
            .count(&app.db)
            .await
            .unwrap(),
        0
    );
    assert!(!app.remote().exists(&key).await.unwrap());

    let gateway = app.get_without_token(&url).await;
    assert_eq!(gateway.status, 404);
}

#[tokio::test]
async fn delete_survives_missing_bytes() {
    let app = TestApp::spawn().await;
    let user = app.create_user().await;
    let body = app.store_certificate(&user, "Diploma", b"%PDF gone").await;
    let doc_id = body["id"].as_i64().unwrap() as i32;
    let (owner, filename) = gateway_target(body["file"]["url"].as_str().unwrap());
    app.remote()
        .delete(&format!("certificate/{owner}/{filename}"))
        .await
        .unwrap();

    let res = app
        .delete_with_token(&routes::document(doc_id), &user.token)
        .await;
    assert_eq!(res.status, 204);
    assert_eq!(
        file_record::Entity::find().count(&app.db).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn cannot_delete_someone_elses_document() {
    let app = TestApp::spawn().await;
    let alice = app.create_user().await;
    let bob = app.create_user().await;
    let body = app.store_certificate(&alice, "Diploma", b"%PDF alice").await;
    let doc_id = body["id"].as_i64().unwrap() as i32;

    let res = app
        .delete_with_token(&routes::document(doc_id), &bob.token)
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.code(), "PERMISSION_DENIED");

    let missing = app
        .delete_with_token(&routes::document(doc_id + 100), &bob.token)
        .await;
    assert_eq!(missing.status, 404);

    let still_there = app.get_with_token(routes::DOCUMENTS, &alice.token).await;
    assert_eq!(still_there.body["total"], 1);
}
