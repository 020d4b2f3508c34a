use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use patroli_core::{PaginationInfo, ProductQuery, ProductRecord, Stats};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
    /// 1-based page of the unreviewed partition.
    pub page_unreviewed: Option<usize>,
    pub limit_unreviewed: Option<usize>,
    /// 1-based page of the reviewed partition.
    pub page_reviewed: Option<usize>,
    pub limit_reviewed: Option<usize>,
    /// Exact reviewer filter.
    pub reviewer: Option<String>,
    /// Case-insensitive substring match on the product name.
    pub search: Option<String>,
    /// Exact kategori_lv3 filter.
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductsListResponse {
    pub unreviewed: Vec<ProductRecord>,
    pub reviewed: Vec<ProductRecord>,
    pub stats: Stats,
    pub pagination: PaginationInfo,
}

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "products",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "Both review partitions with pager metadata", body = ProductsListResponse)
    )
)]
pub async fn list_products(
    State(context): State<AppState>,
    Query(params): Query<ListProductsQuery>,
) -> impl IntoResponse {
    let defaults = ProductQuery::default();
    let query = ProductQuery {
        reviewer: params.reviewer,
        search: params.search,
        category: params.category,
        page_unreviewed: params.page_unreviewed.unwrap_or(defaults.page_unreviewed),
        limit_unreviewed: params.limit_unreviewed.unwrap_or(defaults.limit_unreviewed),
        page_reviewed: params.page_reviewed.unwrap_or(defaults.page_reviewed),
        limit_reviewed: params.limit_reviewed.unwrap_or(defaults.limit_reviewed),
    };

    let view = context.store.query(&query).await;
    // Stats stay reviewer-scoped but ignore search and category, so the
    // progress counters don't jump around while someone narrows the list.
    let stats = context.store.stats(query.reviewer.as_deref()).await;

    (
        StatusCode::OK,
        Json(ProductsListResponse {
            unreviewed: view.unreviewed,
            reviewed: view.reviewed,
            stats,
            pagination: view.pagination,
        }),
    )
        .into_response()
}
