use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/files", file_routes(config.storage.max_blob_size))
        .nest("/labels", label_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::users::search_users))
}

fn file_routes(max_blob_size: u64) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(handlers::files::list_files))
        .routes(routes!(
            handlers::files::get_file,
            handlers::files::update_file,
            handlers::files::delete_file
        ))
        .routes(routes!(handlers::files::download_file))
        .nest("/{id}/contributors", contributor_routes());

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::files::upload_file))
        .layer(handlers::files::upload_body_limit(max_blob_size));

    crud.merge(upload)
}

fn contributor_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::contributors::add_contributor))
        .routes(routes!(
            handlers::contributors::update_contributor,
            handlers::contributors::remove_contributor
        ))
}

fn label_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::labels::list_labels,
            handlers::labels::create_label
        ))
        .routes(routes!(
            handlers::labels::get_label,
            handlers::labels::update_label,
            handlers::labels::delete_label
        ))
        .routes(routes!(handlers::labels::link_file))
}
