use crate::api::ErrorResponse;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use patroli_core::{StoreError, Tier};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeImageRequest {
    /// Id of the product the image belongs to.
    pub product_id: u64,
    /// Product page to scrape.
    pub url: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeImageResponse {
    pub success: bool,
    /// Best candidate, also written onto the product record.
    pub image_url: String,
    /// Every candidate the winning tier produced, best first.
    pub images: Vec<String>,
    pub tier: Option<Tier>,
}

#[utoipa::path(
    post,
    path = "/api/scrape-image",
    tag = "scrape",
    request_body = ScrapeImageRequest,
    responses(
        (status = 200, description = "Image found and stored on the record", body = ScrapeImageResponse),
        (status = 400, description = "Invalid URL", body = ErrorResponse),
        (status = 404, description = "Unknown product or no image found", body = ErrorResponse)
    )
)]
pub async fn scrape_image(
    State(context): State<AppState>,
    Json(request): Json<ScrapeImageRequest>,
) -> impl IntoResponse {
    let page_url = request.url.trim();
    let parsed = match Url::parse(page_url) {
        Ok(parsed) => parsed,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid URL: {}", e),
                }),
            )
                .into_response();
        }
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid URL: unsupported scheme '{}'", parsed.scheme()),
            }),
        )
            .into_response();
    }

    // Reject unknown ids before paying for a scrape; the rendering tier can
    // hold a browser open for most of a minute.
    let known = context
        .store
        .snapshot()
        .await
        .iter()
        .any(|record| record.id == request.product_id);
    if !known {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Product {} not found", request.product_id),
            }),
        )
            .into_response();
    }

    let outcome = context.scraper.scrape(page_url).await;
    let Some(best) = outcome.best() else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No image found".to_string(),
            }),
        )
            .into_response();
    };
    let best = best.to_string();

    match context
        .store
        .set_image_url(request.product_id, &best)
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(ScrapeImageResponse {
                success: true,
                image_url: best,
                images: outcome.images,
                tier: outcome.tier,
            }),
        )
            .into_response(),
        Err(StoreError::NotFound(id)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Product {id} not found"),
            }),
        )
            .into_response(),
    }
}
