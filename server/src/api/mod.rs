pub mod ai;
pub mod catalog;
pub mod products;
pub mod scrape;
pub mod sheets;

use patroli_core::{
    BatchEvent, BatchItemResult, PageInfo, PaginationInfo, ProductRecord, ReviewOutcome, Stats,
    Tier,
};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Base spec with the shared components
    #[derive(OpenApi)]
    #[openapi(components(schemas(
        ErrorResponse,
        ProductRecord,
        ReviewOutcome,
        Stats,
        PageInfo,
        PaginationInfo,
        Tier,
        BatchEvent,
        BatchItemResult,
    )))]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    // Merge in each module's spec
    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        catalog::ApiDoc::openapi(),
        products::ApiDoc::openapi(),
        sheets::ApiDoc::openapi(),
        scrape::ApiDoc::openapi(),
        ai::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        // Merge paths
        spec.paths.paths.extend(module_spec.paths.paths);

        // Merge components (schemas)
        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
