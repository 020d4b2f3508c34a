use crate::api::ErrorResponse;
use crate::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use patroli_core::write_report;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[utoipa::path(
    get,
    path = "/api/download",
    tag = "catalog",
    responses(
        (status = 200, description = "Excel report of the current catalog", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 400, description = "No products loaded", body = ErrorResponse),
        (status = 500, description = "Failed to build the report", body = ErrorResponse)
    )
)]
pub async fn download_report(State(context): State<AppState>) -> impl IntoResponse {
    let records = context.store.snapshot().await;
    if records.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No products to export".to_string(),
            }),
        )
            .into_response();
    }

    let bytes = match write_report(&records) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("Failed to build report: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to build report".to_string(),
                }),
            )
                .into_response();
        }
    };

    let filename = format!("hasil-patroli-{}.xlsx", Utc::now().format("%Y%m%d-%H%M%S"));
    tracing::info!(records = records.len(), filename = %filename, "Exporting report");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, XLSX_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(bytes))
        .unwrap()
        .into_response()
}
