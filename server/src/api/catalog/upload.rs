use crate::api::ErrorResponse;
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use patroli_core::{ensure_supported_extension, ingest, read_rows};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub total_products: usize,
    pub file_name: String,
    pub message: String,
}

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadFileRequest {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "catalog",
    request_body(content_type = "multipart/form-data", content = UploadFileRequest),
    responses(
        (status = 200, description = "Spreadsheet imported, replacing any previous catalog", body = UploadResponse),
        (status = 400, description = "Missing file, unsupported extension, or failed validation", body = ErrorResponse)
    )
)]
pub async fn upload_spreadsheet(
    State(context): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    // Get the file from multipart
    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "No file provided".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!("Multipart read error: {}", e);
            return (
                e.status(),
                Json(ErrorResponse {
                    error: format!("Failed to read multipart data: {}", e.body_text()),
                }),
            )
                .into_response();
        }
    };

    let file_name = field
        .file_name()
        .map(|name| name.to_string())
        .unwrap_or_else(|| "upload.xlsx".to_string());

    if let Err(e) = ensure_supported_extension(&file_name) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response();
    }

    let data = match field.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Field read error: {}", e);
            return (
                e.status(),
                Json(ErrorResponse {
                    error: format!("Failed to read file data: {}", e.body_text()),
                }),
            )
                .into_response();
        }
    };

    let rows = match read_rows(&data) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(file_name = %file_name, "Failed to read workbook: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Failed to read spreadsheet: {}", e),
                }),
            )
                .into_response();
        }
    };

    // All-or-nothing: a failed validation leaves the current catalog alone.
    let records = match ingest(&rows) {
        Ok(records) => records,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    };

    let total = records.len();
    context.store.replace_all(records).await;
    tracing::info!(total, file_name = %file_name, "Imported product catalog from upload");

    (
        StatusCode::OK,
        Json(UploadResponse {
            success: true,
            total_products: total,
            file_name,
            message: format!("Berhasil memuat {} produk", total),
        }),
    )
        .into_response()
}
