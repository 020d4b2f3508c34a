use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoriesQuery {
    /// Restrict to categories appearing in one reviewer's slice.
    pub reviewer: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "catalog",
    params(CategoriesQuery),
    responses(
        (status = 200, description = "Sorted distinct kategori_lv3 values", body = Vec<String>)
    )
)]
pub async fn list_categories(
    State(context): State<AppState>,
    Query(query): Query<CategoriesQuery>,
) -> impl IntoResponse {
    let categories = context
        .store
        .distinct_categories(query.reviewer.as_deref())
        .await;
    (StatusCode::OK, Json(categories)).into_response()
}
