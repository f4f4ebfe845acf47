//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models, services};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Student Documents Server",
        version = "0.1.0",
        description = "Student compliance documents: typed file collections, verification ledger and expiry tracking"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Document endpoints
        api::documents::create_document,
        api::documents::list_documents,
        api::documents::get_document,
        api::documents::update_document,
        api::documents::delete_document,
        // File endpoints
        api::documents::upload_file,
        api::documents::set_primary_file,
        api::documents::reorder_file,
        api::documents::remove_file,
        api::documents::file_url,
        api::documents::file_content,
        // Verification endpoints
        api::documents::submit_verification,
        api::documents::list_verifications,
        api::documents::resubmit_document,
        // Catalog endpoints
        api::document_types::list_document_types,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Catalog
            models::DocumentCategory,
            models::DocumentType,
            // Documents
            models::DocumentStatus,
            models::DocumentRecord,
            models::DocumentDetail,
            models::DocumentListResponse,
            models::CreateDocumentRequest,
            models::UpdateDocumentRequest,
            services::DeletionReport,
            // Files
            models::DocumentFile,
            models::FileCollectionSummary,
            models::FileUrlResponse,
            models::ReorderFileRequest,
            // Verification
            models::VerificationStatus,
            models::VerificationEntry,
            models::SubmitVerificationRequest,
            models::ResubmitRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Documents", description = "Student document records"),
        (name = "Files", description = "File collections of a document"),
        (name = "Verification", description = "Verification ledger and workflow"),
        (name = "Document Types", description = "Document type catalog")
    ),
    modifiers(&ActorAddon)
)]
pub struct ApiDoc;

/// Add the actor identity header scheme.
struct ActorAddon;

impl utoipa::Modify for ActorAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "actor_id",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new(
                            crate::config::ACTOR_ID_HEADER,
                        ),
                    ),
                ),
            );
        }
    }
}
