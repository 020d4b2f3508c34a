pub mod categories;
pub mod download;
pub mod reset;
pub mod stats;
pub mod upload;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for the catalog endpoints (mounted at the root)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(upload::upload_spreadsheet))
        .route("/api/download", get(download::download_report))
        .route("/api/reset", post(reset::reset_products))
        .route("/api/stats", get(stats::get_stats))
        .route("/api/categories", get(categories::list_categories))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        upload::upload_spreadsheet,
        download::download_report,
        reset::reset_products,
        stats::get_stats,
        categories::list_categories,
    ),
    components(schemas(
        upload::UploadFileRequest,
        upload::UploadResponse,
        reset::ResetResponse,
    ))
)]
pub struct ApiDoc;
