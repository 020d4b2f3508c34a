use crate::api::ErrorResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use patroli_core::{ProductRecord, ReviewOutcome, StoreError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    /// "Benar" or "Salah".
    pub hasil_review: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub success: bool,
    pub product: ProductRecord,
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "products",
    params(
        ("id" = u64, Path, description = "Product id")
    ),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review recorded", body = ReviewResponse),
        (status = 400, description = "Unrecognized review outcome", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
pub async fn review_product(
    State(context): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<ReviewRequest>,
) -> impl IntoResponse {
    let Some(outcome) = ReviewOutcome::from_str(&request.hasil_review) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!(
                    "Invalid hasilReview '{}': expected 'Benar' or 'Salah'",
                    request.hasil_review
                ),
            }),
        )
            .into_response();
    };

    match context.store.review(id, outcome).await {
        Ok(product) => (
            StatusCode::OK,
            Json(ReviewResponse {
                success: true,
                product,
            }),
        )
            .into_response(),
        Err(StoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Product {id} not found"),
            }),
        )
            .into_response(),
    }
}
