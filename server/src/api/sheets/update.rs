use crate::api::ErrorResponse;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use patroli_core::extract_spreadsheet_id;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSheetRequest {
    /// Bare spreadsheet id or a full spreadsheet URL.
    pub spreadsheet_id: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSheetResponse {
    pub success: bool,
    pub updated_count: usize,
    pub skipped_count: usize,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/sheets/update",
    tag = "sheets",
    request_body = UpdateSheetRequest,
    responses(
        (status = 200, description = "Review outcomes written back to the sheet", body = UpdateSheetResponse),
        (status = 400, description = "No products loaded or bad spreadsheet reference", body = ErrorResponse),
        (status = 500, description = "Google Sheets request failed", body = ErrorResponse)
    )
)]
pub async fn update_sheet(
    State(context): State<AppState>,
    Json(request): Json<UpdateSheetRequest>,
) -> impl IntoResponse {
    if request.spreadsheet_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "spreadsheetId is required".to_string(),
            }),
        )
            .into_response();
    }

    let records = context.store.snapshot().await;
    if records.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No products loaded".to_string(),
            }),
        )
            .into_response();
    }

    let spreadsheet_id = extract_spreadsheet_id(&request.spreadsheet_id);
    match context
        .sheets
        .update_review_column(&spreadsheet_id, &records)
        .await
    {
        Ok(summary) => (
            StatusCode::OK,
            Json(UpdateSheetResponse {
                success: true,
                updated_count: summary.updated,
                skipped_count: summary.skipped,
                message: format!(
                    "Berhasil memperbarui {} baris ({} dilewati)",
                    summary.updated, summary.skipped
                ),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(spreadsheet_id = %spreadsheet_id, error = %e, "Failed to update spreadsheet");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to update spreadsheet: {e}"),
                }),
            )
                .into_response()
        }
    }
}
