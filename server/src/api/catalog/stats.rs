use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use patroli_core::Stats;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatsQuery {
    /// Restrict counts to one reviewer's slice of the catalog.
    pub reviewer: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "catalog",
    params(StatsQuery),
    responses(
        (status = 200, description = "Review progress counters", body = Stats)
    )
)]
pub async fn get_stats(
    State(context): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> impl IntoResponse {
    let stats = context.store.stats(query.reviewer.as_deref()).await;
    (StatusCode::OK, Json(stats)).into_response()
}
