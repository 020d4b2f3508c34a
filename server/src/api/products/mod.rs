pub mod list;
pub mod review;

use crate::AppState;
use axum::routing::{get, put};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/products endpoints (mounted at /api/products)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_products))
        .route("/{id}", put(review::review_product))
}

#[derive(OpenApi)]
#[openapi(
    paths(list::list_products, review::review_product,),
    components(schemas(
        list::ProductsListResponse,
        review::ReviewRequest,
        review::ReviewResponse,
    ))
)]
pub struct ApiDoc;
