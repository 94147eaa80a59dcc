use axum::{Router, routing::get};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .nest("/files", file_routes(config))
        .nest("/entities", entity_routes())
        .nest("/json-data", json_data_routes())
        .nest("/typed-json-data", typed_json_data_routes())
}

fn file_routes(config: &AppConfig) -> Router<AppState> {
    let upload = Router::new()
        .route(
            "/",
            get(handlers::files::list_files).post(handlers::files::create_file),
        )
        .layer(handlers::files::upload_body_limit(
            config.storage.max_blob_size,
        ));

    Router::new()
        .route(
            "/{id}",
            get(handlers::files::get_file)
                .put(handlers::files::update_file)
                .delete(handlers::files::delete_file),
        )
        .route("/{id}/content", get(handlers::files::download_file))
        .route(
            "/by-name/{name}/content",
            get(handlers::files::download_file_by_name),
        )
        .merge(upload)
}

fn entity_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::entities::list_entities).post(handlers::entities::create_entity),
        )
        .route(
            "/{id}",
            get(handlers::entities::get_entity)
                .put(handlers::entities::update_entity)
                .delete(handlers::entities::delete_entity),
        )
}

fn json_data_routes() -> Router<AppState> {
    Router::new().route(
        "/{key}",
        get(handlers::documents::get_document)
            .post(handlers::documents::create_document)
            .put(handlers::documents::update_document)
            .delete(handlers::documents::delete_document),
    )
}

fn typed_json_data_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::documents::list_typed_documents)
                .post(handlers::documents::create_typed_document),
        )
        .route(
            "/{key}",
            get(handlers::documents::get_typed_document)
                .put(handlers::documents::update_typed_document)
                .delete(handlers::documents::delete_typed_document),
        )
}
