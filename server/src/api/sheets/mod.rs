pub mod read;
pub mod update;

use crate::AppState;
use axum::routing::post;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/sheets endpoints (mounted at /api/sheets)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/read", post(read::read_sheet))
        .route("/update", post(update::update_sheet))
}

#[derive(OpenApi)]
#[openapi(
    paths(read::read_sheet, update::update_sheet,),
    components(schemas(
        read::ReadSheetRequest,
        read::ReadSheetResponse,
        update::UpdateSheetRequest,
        update::UpdateSheetResponse,
    ))
)]
pub struct ApiDoc;
