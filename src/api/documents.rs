//! Document API handlers.

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{HttpResponse, web};
use futures_util::StreamExt;
use uuid::Uuid;

use crate::auth::ActorIdentity;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateDocumentRequest, DocumentDetail, DocumentFile, DocumentFilter, DocumentListResponse,
    DocumentRecord, FileUrlResponse, ListDocumentsQuery, NewDocument, ReorderFileRequest,
    ResubmitRequest, SubmitVerificationRequest, UpdateDocumentRequest, UploadCandidate,
    VerificationEntry, VerificationSubmission,
};
use crate::services::{DeletionReport, DocumentService};

/// Maximum bytes accepted for one multipart upload request.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimit(pub usize);

/// Create a student's document, or return the existing one for that type.
#[utoipa::path(
    post,
    path = "/api/v1/students/{student_id}/documents",
    tag = "Documents",
    params(
        ("student_id" = Uuid, Path, description = "Student UUID")
    ),
    request_body = CreateDocumentRequest,
    responses(
        (status = 200, description = "Document created or already present", body = DocumentRecord),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing actor identity", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown document type", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_document(
    actor: ActorIdentity,
    service: web::Data<DocumentService>,
    path: web::Path<Uuid>,
    body: web::Json<CreateDocumentRequest>,
) -> AppResult<HttpResponse> {
    let student_id = path.into_inner();
    let req = body.into_inner();

    let record = service
        .create_or_get_document(NewDocument {
            student_id,
            type_key: req.document_type,
            title: req.title,
            description: req.description,
        })
        .await?;

    tracing::debug!(
        "create_or_get_document student_id={} document_id={} actor={}",
        student_id,
        record.id,
        actor.user_id
    );

    Ok(HttpResponse::Ok().json(record))
}

/// List a student's documents.
#[utoipa::path(
    get,
    path = "/api/v1/students/{student_id}/documents",
    tag = "Documents",
    params(
        ("student_id" = Uuid, Path, description = "Student UUID"),
        ("status" = Option<String>, Query, description = "Effective status (pending, verified, rejected, needs_revision, expired)"),
        ("category" = Option<String>, Query, description = "Document type category"),
        ("expiring_within_days" = Option<u32>, Query, description = "Only documents expiring within this many days")
    ),
    responses(
        (status = 200, description = "Documents", body = DocumentListResponse),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_documents(
    service: web::Data<DocumentService>,
    path: web::Path<Uuid>,
    query: web::Query<ListDocumentsQuery>,
) -> AppResult<HttpResponse> {
    let filter = DocumentFilter::try_from(query.into_inner())?;
    let documents = service.list_documents(path.into_inner(), &filter).await?;
    let total = documents.len();

    Ok(HttpResponse::Ok().json(DocumentListResponse { documents, total }))
}

/// Get a document with its files.
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}",
    tag = "Documents",
    params(
        ("id" = Uuid, Path, description = "Document UUID")
    ),
    responses(
        (status = 200, description = "Document detail", body = DocumentDetail),
        (status = 404, description = "Document not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_document(
    service: web::Data<DocumentService>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let detail = service.get_document(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Update document details.
#[utoipa::path(
    patch,
    path = "/api/v1/documents/{id}",
    tag = "Documents",
    params(
        ("id" = Uuid, Path, description = "Document UUID")
    ),
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "Document updated", body = DocumentRecord),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing actor identity", body = crate::error::ErrorResponse),
        (status = 404, description = "Document not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn update_document(
    _actor: ActorIdentity,
    service: web::Data<DocumentService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateDocumentRequest>,
) -> AppResult<HttpResponse> {
    let record = service
        .update_document(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Delete a document with its files and verification history.
///
/// Blob deletion failures are logged and do not fail the request.
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{id}",
    tag = "Documents",
    params(
        ("id" = Uuid, Path, description = "Document UUID")
    ),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 401, description = "Missing actor identity", body = crate::error::ErrorResponse),
        (status = 404, description = "Document not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_document(
    actor: ActorIdentity,
    service: web::Data<DocumentService>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let report: DeletionReport = service.delete_document(path.into_inner()).await?;

    tracing::info!(
        "Document deleted document_id={} by={} files={}",
        report.document_id,
        actor.user_id,
        report.files_removed
    );

    Ok(HttpResponse::NoContent().finish())
}

/// Upload a file to a document.
///
/// Multipart fields: `file` (required, with filename), `hash` (optional
/// SHA-256 hex of the content), `description` (optional).
#[utoipa::path(
    post,
    path = "/api/v1/documents/{id}/files",
    tag = "Files",
    params(
        ("id" = Uuid, Path, description = "Document UUID")
    ),
    responses(
        (status = 201, description = "File stored", body = DocumentFile),
        (status = 400, description = "Disallowed extension or size", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing actor identity", body = crate::error::ErrorResponse),
        (status = 404, description = "Document not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Duplicate content or file limit reached", body = crate::error::ErrorResponse),
        (status = 502, description = "Blob storage failed", body = crate::error::ErrorResponse),
    )
)]
pub async fn upload_file(
    actor: ActorIdentity,
    service: web::Data<DocumentService>,
    limit: web::Data<UploadLimit>,
    path: web::Path<Uuid>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let document_id = path.into_inner();

    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut declared_hash = None;
    let mut description = None;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?;
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(String::from);

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::Validation(format!("Read error: {}", e)))?;
            if data.len() + chunk.len() > limit.0 {
                return Err(AppError::Validation(format!(
                    "upload exceeds the {} byte request limit",
                    limit.0
                )));
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "file" => {
                let filename = filename.ok_or_else(|| {
                    AppError::Validation("Missing filename in multipart".to_string())
                })?;
                upload = Some((filename, data));
            }
            "hash" => declared_hash = Some(text_field(&name, data)?),
            "description" => description = Some(text_field(&name, data)?),
            _ => {}
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::Validation("multipart field 'file' is required".into()))?;

    let file = service
        .upload_file(
            document_id,
            UploadCandidate {
                uploaded_by: actor.user_id,
                file_name,
                bytes,
                declared_hash,
                description,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(file))
}

fn text_field(name: &str, data: Vec<u8>) -> AppResult<String> {
    String::from_utf8(data)
        .map_err(|_| AppError::Validation(format!("multipart field '{}' must be UTF-8", name)))
}

/// Make a file the primary file of its document.
#[utoipa::path(
    put,
    path = "/api/v1/documents/{id}/files/{file_id}/primary",
    tag = "Files",
    params(
        ("id" = Uuid, Path, description = "Document UUID"),
        ("file_id" = Uuid, Path, description = "File UUID")
    ),
    responses(
        (status = 200, description = "Primary file changed", body = DocumentDetail),
        (status = 401, description = "Missing actor identity", body = crate::error::ErrorResponse),
        (status = 404, description = "Document or file not found", body = crate::error::ErrorResponse),
        (status = 409, description = "File belongs to another document", body = crate::error::ErrorResponse),
    )
)]
pub async fn set_primary_file(
    _actor: ActorIdentity,
    service: web::Data<DocumentService>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (document_id, file_id) = path.into_inner();
    service.set_primary_file(document_id, file_id).await?;
    let detail = service.get_document(document_id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Move a file within its document's collection.
#[utoipa::path(
    put,
    path = "/api/v1/documents/{id}/files/{file_id}/position",
    tag = "Files",
    params(
        ("id" = Uuid, Path, description = "Document UUID"),
        ("file_id" = Uuid, Path, description = "File UUID")
    ),
    request_body = ReorderFileRequest,
    responses(
        (status = 200, description = "Files in their new order", body = [DocumentFile]),
        (status = 401, description = "Missing actor identity", body = crate::error::ErrorResponse),
        (status = 404, description = "Document or file not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn reorder_file(
    _actor: ActorIdentity,
    service: web::Data<DocumentService>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<ReorderFileRequest>,
) -> AppResult<HttpResponse> {
    let (document_id, file_id) = path.into_inner();
    let files = service
        .reorder_file(document_id, file_id, body.position)
        .await?;
    Ok(HttpResponse::Ok().json(files))
}

/// Remove a file from a document.
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{id}/files/{file_id}",
    tag = "Files",
    params(
        ("id" = Uuid, Path, description = "Document UUID"),
        ("file_id" = Uuid, Path, description = "File UUID")
    ),
    responses(
        (status = 204, description = "File removed"),
        (status = 401, description = "Missing actor identity", body = crate::error::ErrorResponse),
        (status = 404, description = "Document or file not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn remove_file(
    _actor: ActorIdentity,
    service: web::Data<DocumentService>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (document_id, file_id) = path.into_inner();
    service.remove_file(document_id, file_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Get a download URL for a file.
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}/files/{file_id}/url",
    tag = "Files",
    params(
        ("id" = Uuid, Path, description = "Document UUID"),
        ("file_id" = Uuid, Path, description = "File UUID")
    ),
    responses(
        (status = 200, description = "File URL", body = FileUrlResponse),
        (status = 404, description = "Document or file not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn file_url(
    service: web::Data<DocumentService>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (document_id, file_id) = path.into_inner();
    let url = service.file_url(document_id, file_id).await?;
    Ok(HttpResponse::Ok().json(url))
}

/// Download a file's content.
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}/files/{file_id}/content",
    tag = "Files",
    params(
        ("id" = Uuid, Path, description = "Document UUID"),
        ("file_id" = Uuid, Path, description = "File UUID")
    ),
    responses(
        (status = 200, description = "File bytes"),
        (status = 404, description = "Document or file not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Blob storage failed", body = crate::error::ErrorResponse),
    )
)]
pub async fn file_content(
    service: web::Data<DocumentService>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (document_id, file_id) = path.into_inner();
    let content = service.file_content(document_id, file_id).await?;

    let content_type = content.content_type.unwrap_or_else(|| {
        crate::services::storage::content_type_for_extension(&content.file.file_type).to_string()
    });

    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                content.file.file_name.replace('"', "")
            ),
        ))
        .body(content.bytes))
}

/// Record a verification decision.
#[utoipa::path(
    post,
    path = "/api/v1/documents/{id}/verifications",
    tag = "Verification",
    params(
        ("id" = Uuid, Path, description = "Document UUID")
    ),
    request_body = SubmitVerificationRequest,
    responses(
        (status = 201, description = "Decision recorded", body = VerificationEntry),
        (status = 400, description = "Missing rejection reason", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing actor identity", body = crate::error::ErrorResponse),
        (status = 404, description = "Document not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Invalid status or workflow state", body = crate::error::ErrorResponse),
    )
)]
pub async fn submit_verification(
    actor: ActorIdentity,
    service: web::Data<DocumentService>,
    path: web::Path<Uuid>,
    body: web::Json<SubmitVerificationRequest>,
) -> AppResult<HttpResponse> {
    let submission = VerificationSubmission::try_from(body.into_inner())?;
    let entry = service
        .submit_verification(path.into_inner(), actor.user_id, submission)
        .await?;
    Ok(HttpResponse::Created().json(entry))
}

/// Verification history of a document, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}/verifications",
    tag = "Verification",
    params(
        ("id" = Uuid, Path, description = "Document UUID")
    ),
    responses(
        (status = 200, description = "Ledger entries", body = [VerificationEntry]),
        (status = 404, description = "Document not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_verifications(
    service: web::Data<DocumentService>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let entries = service.list_verifications(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// Reopen a reviewed or expired document for review.
#[utoipa::path(
    post,
    path = "/api/v1/documents/{id}/resubmit",
    tag = "Verification",
    params(
        ("id" = Uuid, Path, description = "Document UUID")
    ),
    request_body = ResubmitRequest,
    responses(
        (status = 201, description = "Document back in review", body = VerificationEntry),
        (status = 401, description = "Missing actor identity", body = crate::error::ErrorResponse),
        (status = 404, description = "Document not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Document is already pending or has no files", body = crate::error::ErrorResponse),
    )
)]
pub async fn resubmit_document(
    actor: ActorIdentity,
    service: web::Data<DocumentService>,
    path: web::Path<Uuid>,
    body: Option<web::Json<ResubmitRequest>>,
) -> AppResult<HttpResponse> {
    let notes = body.and_then(|b| b.into_inner().notes);
    let entry = service
        .resubmit_document(path.into_inner(), actor.user_id, notes)
        .await?;
    Ok(HttpResponse::Created().json(entry))
}

/// Configure document routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/students/{student_id}/documents")
            .route(web::post().to(create_document))
            .route(web::get().to(list_documents)),
    )
    .service(
        web::resource("/documents/{id}")
            .route(web::get().to(get_document))
            .route(web::patch().to(update_document))
            .route(web::delete().to(delete_document)),
    )
    .service(web::resource("/documents/{id}/files").route(web::post().to(upload_file)))
    .service(
        web::resource("/documents/{id}/files/{file_id}").route(web::delete().to(remove_file)),
    )
    .service(
        web::resource("/documents/{id}/files/{file_id}/primary")
            .route(web::put().to(set_primary_file)),
    )
    .service(
        web::resource("/documents/{id}/files/{file_id}/position")
            .route(web::put().to(reorder_file)),
    )
    .service(
        web::resource("/documents/{id}/files/{file_id}/url").route(web::get().to(file_url)),
    )
    .service(
        web::resource("/documents/{id}/files/{file_id}/content")
            .route(web::get().to(file_content)),
    )
    .service(
        web::resource("/documents/{id}/verifications")
            .route(web::post().to(submit_verification))
            .route(web::get().to(list_verifications)),
    )
    .service(web::resource("/documents/{id}/resubmit").route(web::post().to(resubmit_document)));
}
