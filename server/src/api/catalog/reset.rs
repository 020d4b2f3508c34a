use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/reset",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog cleared", body = ResetResponse)
    )
)]
pub async fn reset_products(State(context): State<AppState>) -> impl IntoResponse {
    context.store.reset().await;
    tracing::info!("Catalog reset");

    (
        StatusCode::OK,
        Json(ResetResponse {
            success: true,
            message: "All products cleared".to_string(),
        }),
    )
        .into_response()
}
