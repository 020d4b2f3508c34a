use crate::api::ErrorResponse;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use patroli_core::llm::explain_product_prompt;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExplainProductRequest {
    pub product_name: String,
    /// Narrows the explanation when the catalog category is known.
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExplainProductResponse {
    pub success: bool,
    pub product_name: String,
    pub explanation: String,
}

#[utoipa::path(
    post,
    path = "/api/ai/explain-product",
    tag = "ai",
    request_body = ExplainProductRequest,
    responses(
        (status = 200, description = "Short Indonesian explanation of the product", body = ExplainProductResponse),
        (status = 400, description = "Missing product name", body = ErrorResponse),
        (status = 500, description = "Provider call failed", body = ErrorResponse)
    )
)]
pub async fn explain_product(
    State(context): State<AppState>,
    Json(request): Json<ExplainProductRequest>,
) -> impl IntoResponse {
    let product_name = request.product_name.trim();
    if product_name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "productName is required".to_string(),
            }),
        )
            .into_response();
    }

    let prompt = explain_product_prompt(product_name, request.category_name.as_deref());
    match context.llm.complete(&prompt).await {
        Ok(explanation) => (
            StatusCode::OK,
            Json(ExplainProductResponse {
                success: true,
                product_name: product_name.to_string(),
                explanation,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(
                provider = context.llm.provider_name(),
                error = %e,
                "Explanation request failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to generate explanation".to_string(),
                }),
            )
                .into_response()
        }
    }
}
