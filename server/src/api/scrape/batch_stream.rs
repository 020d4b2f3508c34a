use crate::api::ErrorResponse;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    Json,
};
use futures::stream::{self, StreamExt};
use patroli_core::{extract_spreadsheet_id, run_batch};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct BatchStreamQuery {
    /// Bare spreadsheet id or a full spreadsheet URL.
    pub spreadsheet_id: String,
}

#[utoipa::path(
    get,
    path = "/api/scrape-batch-stream",
    tag = "scrape",
    params(BatchStreamQuery),
    responses(
        (status = 200, description = "Event stream; each frame is one BatchEvent, closed by a {\"type\":\"done\"} frame", content_type = "text/event-stream"),
        (status = 400, description = "Missing spreadsheet reference", body = ErrorResponse)
    )
)]
pub async fn scrape_batch_stream(
    State(context): State<AppState>,
    Query(query): Query<BatchStreamQuery>,
) -> impl IntoResponse {
    if query.spreadsheet_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "spreadsheetId is required".to_string(),
            }),
        )
            .into_response();
    }
    let spreadsheet_id = extract_spreadsheet_id(&query.spreadsheet_id);

    let (tx, rx) = mpsc::channel(32);
    let cancel = CancellationToken::new();
    // Dropping the response stream (client went away) trips the token, which
    // stops the batch instead of letting it scrape into the void.
    let guard = cancel.clone().drop_guard();

    let sheets = context.sheets.clone();
    let scraper = context.scraper.clone();
    tokio::spawn(async move {
        run_batch(sheets, scraper, &spreadsheet_id, tx, cancel).await;
    });

    let stream = ReceiverStream::new(rx)
        .map(|event| Event::default().json_data(&event))
        .chain(stream::once(std::future::ready(
            Event::default().json_data(serde_json::json!({"type": "done"})),
        )))
        .map(move |frame| {
            let _ = &guard;
            frame
        });

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}
