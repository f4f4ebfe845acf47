//! Document type catalog handlers.

use actix_web::{HttpResponse, web};

use crate::error::AppResult;
use crate::models::DocumentType;
use crate::services::DocumentService;

/// List active document types in display order.
#[utoipa::path(
    get,
    path = "/api/v1/document-types",
    tag = "Document Types",
    responses(
        (status = 200, description = "Active document types", body = [DocumentType])
    )
)]
pub async fn list_document_types(service: web::Data<DocumentService>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.list_document_types()?))
}

/// Configure document type routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/document-types").route(web::get().to(list_document_types)));
}
