use axum::extract::DefaultBodyLimit;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

/// Room for multipart boundaries and text fields on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

fn upload_body_limit(max_file_size: u64) -> DefaultBodyLimit {
    let limit = max_file_size.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(certificate_routes(config))
        .merge(upload_link_routes(config))
        .merge(document_routes())
        .merge(file_routes())
        .merge(user_routes(config))
}

fn certificate_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::certificate::store_certificate))
        .layer(upload_body_limit(config.upload.certificate_max_size))
}

fn upload_link_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let private = OpenApiRouter::new()
        .routes(routes!(handlers::upload_link::generate_link))
        .routes(routes!(handlers::upload_link::latest_link));

    let public = OpenApiRouter::new()
        .routes(routes!(
            handlers::upload_link::show_upload_form,
            handlers::upload_link::upload_through_link
        ))
        .layer(upload_body_limit(config.upload.certificate_max_size));

    private.merge(public)
}

fn document_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::document::list_documents))
        .routes(routes!(handlers::document::delete_document))
}

fn file_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::file::get_file,
            handlers::file::delete_file
        ))
        .routes(routes!(handlers::file::list_owner_files))
}

fn user_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let avatar = OpenApiRouter::new()
        .routes(routes!(handlers::user::upload_avatar))
        .layer(upload_body_limit(config.upload.image_max_size));

    OpenApiRouter::new()
        .routes(routes!(handlers::user::delete_current_user))
        .merge(avatar)
}
