use crate::api::ErrorResponse;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use patroli_core::{extract_spreadsheet_id, ingest};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadSheetRequest {
    /// Bare spreadsheet id or a full spreadsheet URL.
    pub spreadsheet_id: String,
    /// Recorded in the request log; matching against rows uses the sheet's
    /// own reviewer column.
    pub reviewer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadSheetResponse {
    pub success: bool,
    pub total_products: usize,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/sheets/read",
    tag = "sheets",
    request_body = ReadSheetRequest,
    responses(
        (status = 200, description = "Catalog replaced from the sheet", body = ReadSheetResponse),
        (status = 400, description = "Bad spreadsheet reference or rows failed validation", body = ErrorResponse),
        (status = 500, description = "Google Sheets request failed", body = ErrorResponse)
    )
)]
pub async fn read_sheet(
    State(context): State<AppState>,
    Json(request): Json<ReadSheetRequest>,
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

    let spreadsheet_id = extract_spreadsheet_id(&request.spreadsheet_id);
    let snapshot = match context.sheets.read_snapshot(&spreadsheet_id).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!(spreadsheet_id = %spreadsheet_id, error = %e, "Failed to read spreadsheet");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to read spreadsheet: {e}"),
                }),
            )
                .into_response();
        }
    };

    // An empty sheet falls out of ingest as EmptyInput, same as an empty
    // uploaded file.
    let rows = snapshot.to_rows();
    let records = match ingest(&rows) {
        Ok(records) => records,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    let total = records.len();
    context.store.replace_all(records).await;

    tracing::info!(
        spreadsheet_id = %spreadsheet_id,
        reviewer = request.reviewer_name.as_deref().unwrap_or(""),
        total,
        "Loaded catalog from Google Sheets"
    );

    (
        StatusCode::OK,
        Json(ReadSheetResponse {
            success: true,
            total_products: total,
            message: format!("Berhasil memuat {} produk", total),
        }),
    )
        .into_response()
}
