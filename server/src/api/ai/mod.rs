pub mod explain;

use crate::AppState;
use axum::routing::post;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/ai endpoints (mounted at /api/ai)
pub fn router() -> Router<AppState> {
    Router::new().route("/explain-product", post(explain::explain_product))
}

#[derive(OpenApi)]
#[openapi(
    paths(explain::explain_product,),
    components(schemas(
        explain::ExplainProductRequest,
        explain::ExplainProductResponse,
    ))
)]
pub struct ApiDoc;
