//! API endpoint modules.

pub mod document_types;
pub mod documents;
pub mod health;
pub mod openapi;

use actix_web::web;

pub use documents::UploadLimit;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;

/// Configure every `/api/v1` route.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(documents::configure_routes)
        .configure(document_types::configure_routes);
}
