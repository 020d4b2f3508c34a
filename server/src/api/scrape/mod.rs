pub mod batch_stream;
pub mod image;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for the scraping endpoints (absolute paths, merged at the root)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/scrape-image", post(image::scrape_image))
        .route(
            "/api/scrape-batch-stream",
            get(batch_stream::scrape_batch_stream),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(image::scrape_image, batch_stream::scrape_batch_stream,),
    components(schemas(image::ScrapeImageRequest, image::ScrapeImageResponse,))
)]
pub struct ApiDoc;
