//! OpenAPI 3.0 specification definition

use utoipa::OpenApi;

use crate::api::handlers::{
    health::HealthResponse,
    products::{DeleteResponse, ErrorResponse},
};
use crate::db::models::{Product, ProductCategory};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "WebAR Backend API",
        version = "1.0.0",
        description = "Product catalog for a WebAR viewer: 3D model uploads, thumbnails and metadata",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "system", description = "System health endpoints"),
        (name = "products", description = "Product catalog endpoints")
    ),
    paths(
        crate::api::handlers::health::health_check,
        crate::api::handlers::products::list_products,
        crate::api::handlers::products::create_product,
        crate::api::handlers::products::delete_product,
    ),
    components(
        schemas(
            HealthResponse,
            Product,
            ProductCategory,
            DeleteResponse,
            ErrorResponse,
        )
    )
)]
pub struct ApiDoc;
