pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod repository;
pub mod routes;
pub mod serializer;
pub mod service;
pub mod state;

use std::time::Duration;

use axum::Json;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Docstore API",
        version = "1.0.0",
        description = "Content-addressed files, entities and JSON documents"
    ),
    paths(
        handlers::files::list_files,
        handlers::files::create_file,
        handlers::files::get_file,
        handlers::files::update_file,
        handlers::files::delete_file,
        handlers::files::download_file,
        handlers::files::download_file_by_name,
        handlers::entities::list_entities,
        handlers::entities::create_entity,
        handlers::entities::get_entity,
        handlers::entities::update_entity,
        handlers::entities::delete_entity,
        handlers::documents::create_document,
        handlers::documents::get_document,
        handlers::documents::update_document,
        handlers::documents::delete_document,
        handlers::documents::list_typed_documents,
        handlers::documents::create_typed_document,
        handlers::documents::get_typed_document,
        handlers::documents::update_typed_document,
        handlers::documents::delete_typed_document,
    ),
    components(schemas(error::ErrorBody)),
    tags(
        (name = "Files", description = "Content-addressed file storage"),
        (name = "Entities", description = "Entities with alternative labels and exact matches"),
        (name = "JSON Data", description = "Keyed JSON documents"),
        (name = "Typed JSON Data", description = "Keyed JSON documents with a type"),
    ),
)]
pub struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state.config.server.cors);

    let api = ApiDoc::openapi();

    axum::Router::new()
        .nest("/api", routes::api_routes(&state.config))
        .with_state(state)
        .route(
            "/api-docs/openapi.json",
            get({
                let api = api.clone();
                move || async move { Json(api) }
            }),
        )
        .merge(Scalar::with_url("/scalar", api))
        .layer(cors)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.max_age))
}
