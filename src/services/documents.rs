//! Document service: file collections, verification workflow, and deletion.
//!
//! Every mutation of a document runs in one transaction that first locks the
//! document row, so concurrent uploads or primary changes on the same document
//! are serialized while unrelated documents proceed in parallel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use futures_util::future::join_all;
use sea_orm::DatabaseTransaction;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::documents::{DetailChange, DocumentRow, StatusChange};
use crate::db::document_files::FileEntry;
use crate::db::{DbPool, document_files, documents, verifications};
use crate::entity::document;
use crate::error::{AppError, AppResult};
use crate::models::document::parse_stored_status;
use crate::models::verification::non_blank;
use crate::models::{
    DocumentDetail, DocumentFile, DocumentFilter, DocumentRecord, DocumentStatus, DocumentType,
    FileCollectionSummary, FileUrlResponse, NewDocument, UpdateDocumentRequest, UploadCandidate,
    VerificationEntry, VerificationStatus, VerificationSubmission,
};
use crate::services::catalog::DocumentTypeCatalog;
use crate::services::expiry;
use crate::services::storage::{self, StorageGateway, with_timeout};

/// Outcome of a cascade delete.
///
/// Blob deletions that failed are listed for reconciliation; they never fail the call.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeletionReport {
    pub document_id: Uuid,
    pub files_removed: u64,
    pub storage_failures: Vec<String>,
}

/// Stored file with its bytes.
#[derive(Debug, Clone)]
pub struct FileContent {
    pub file: DocumentFile,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Entry point for every document operation.
pub struct DocumentService {
    pool: DbPool,
    storage: Arc<dyn StorageGateway>,
    catalog: Arc<DocumentTypeCatalog>,
    storage_timeout: Duration,
}

impl DocumentService {
    pub fn new(
        pool: DbPool,
        storage: Arc<dyn StorageGateway>,
        catalog: Arc<DocumentTypeCatalog>,
        storage_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            storage,
            catalog,
            storage_timeout,
        }
    }

    pub fn catalog(&self) -> &DocumentTypeCatalog {
        &self.catalog
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Active document types in display order.
    pub fn list_document_types(&self) -> AppResult<Vec<DocumentType>> {
        self.catalog.list_active()
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    /// Return the student's record for the type, creating a pending one if absent.
    pub async fn create_or_get_document(&self, new: NewDocument) -> AppResult<DocumentRecord> {
        let doc_type = self.catalog.by_key(new.type_key.trim())?.ok_or_else(|| {
            AppError::NotFound(format!("Document type '{}'", new.type_key.trim()))
        })?;
        let title = non_blank(Some(new.title))
            .ok_or_else(|| AppError::Validation("title is required".into()))?;

        let conn = self.pool.connection();

        if let Some(existing) =
            documents::find_by_student_and_type(conn, new.student_id, doc_type.id).await?
        {
            return self.record(existing);
        }

        if !doc_type.is_active {
            return Err(AppError::Validation(format!(
                "document type '{}' no longer accepts new documents",
                doc_type.key
            )));
        }

        let row = DocumentRow {
            student_id: new.student_id,
            document_type: &doc_type,
            title,
            description: non_blank(new.description),
        };

        let model = match documents::insert(conn, row).await {
            Ok(model) => {
                info!(
                    "Created document document_id={} student_id={} type={}",
                    model.id, model.student_id, doc_type.key
                );
                model
            }
            // Lost a race with a concurrent create for the same student and type
            Err(AppError::Conflict(_)) => {
                documents::find_by_student_and_type(conn, new.student_id, doc_type.id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Database(format!(
                            "document for student {} and type {} vanished after conflict",
                            new.student_id, doc_type.key
                        ))
                    })?
            }
            Err(e) => return Err(e),
        };

        DocumentRecord::from_model(model, &doc_type, expiry::today())
    }

    /// Record with its files and collection summary.
    pub async fn get_document(&self, document_id: Uuid) -> AppResult<DocumentDetail> {
        let conn = self.pool.connection();
        let doc = documents::get(conn, document_id).await?;
        let files: Vec<DocumentFile> = document_files::list_for_document(conn, document_id)
            .await?
            .into_iter()
            .map(DocumentFile::from)
            .collect();

        Ok(DocumentDetail {
            document: self.record(doc)?,
            summary: FileCollectionSummary::from_files(&files),
            files,
        })
    }

    /// A student's records matching `filter`, evaluated as of today.
    pub async fn list_documents(
        &self,
        student_id: Uuid,
        filter: &DocumentFilter,
    ) -> AppResult<Vec<DocumentRecord>> {
        self.list_documents_as_of(student_id, filter, expiry::today())
            .await
    }

    /// A student's records matching `filter`, evaluated as of `today`.
    ///
    /// The status filter matches the effective status, so a past-dated record
    /// is listed under `expired` whatever its stored status.
    pub async fn list_documents_as_of(
        &self,
        student_id: Uuid,
        filter: &DocumentFilter,
        today: NaiveDate,
    ) -> AppResult<Vec<DocumentRecord>> {
        let type_ids = filter
            .category
            .map(|category| self.catalog.ids_in_category(category))
            .transpose()?;
        if type_ids.as_ref().is_some_and(|ids| ids.is_empty()) {
            return Ok(Vec::new());
        }

        let rows =
            documents::list_by_student(self.pool.connection(), student_id, type_ids.as_deref())
                .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let expiry_date = row.expiry_date;
            let record = self.record_as_of(row, today)?;

            if filter
                .status
                .is_some_and(|status| record.effective_status != status)
            {
                continue;
            }
            if let Some(window) = filter.expiring_within_days
                && !expiry::is_expiring_soon(expiry_date, today, window)
            {
                continue;
            }
            records.push(record);
        }

        Ok(records)
    }

    /// Edit title, description, expiry date, or visibility.
    pub async fn update_document(
        &self,
        document_id: Uuid,
        req: UpdateDocumentRequest,
    ) -> AppResult<DocumentRecord> {
        let title = match req.title {
            Some(title) => Some(
                non_blank(Some(title))
                    .ok_or_else(|| AppError::Validation("title cannot be empty".into()))?,
            ),
            None => None,
        };
        let change = DetailChange {
            title,
            description: req.description.map(|d| non_blank(Some(d))),
            expiry_date: if req.clear_expiry_date {
                Some(None)
            } else {
                req.expiry_date.map(Some)
            },
            is_public: req.is_public,
        };

        let txn = self.pool.begin().await?;
        let doc = documents::lock(&txn, document_id).await?;
        let updated = documents::apply_details(&txn, doc, change).await?;
        commit(txn).await?;

        info!("Updated document document_id={}", document_id);
        self.record(updated)
    }

    /// Delete a record, its files, and its ledger, then remove the blobs.
    ///
    /// Rows are removed in one transaction. Blob deletions run after commit;
    /// failures are logged and reported, never raised.
    pub async fn delete_document(&self, document_id: Uuid) -> AppResult<DeletionReport> {
        let txn = self.pool.begin().await?;
        let doc = documents::lock(&txn, document_id).await?;
        let files = document_files::list_for_document(&txn, doc.id).await?;

        let files_removed = document_files::delete_for_document(&txn, doc.id).await?;
        verifications::delete_for_document(&txn, doc.id).await?;
        documents::delete(&txn, doc.id).await?;
        commit(txn).await?;

        let deletions = files.iter().map(|file| async move {
            let result = with_timeout(
                self.storage_timeout,
                "blob delete",
                self.storage.delete(&file.file_path),
            )
            .await;
            (file.file_path.as_str(), result)
        });

        let mut storage_failures = Vec::new();
        for (path, result) in join_all(deletions).await {
            if let Err(e) = result {
                warn!(
                    "Failed to delete blob for removed document document_id={} path={}: {}",
                    document_id, path, e
                );
                storage_failures.push(path.to_string());
            }
        }

        info!(
            "Deleted document document_id={} files={} storage_failures={}",
            document_id,
            files_removed,
            storage_failures.len()
        );

        Ok(DeletionReport {
            document_id,
            files_removed,
            storage_failures,
        })
    }

    // ------------------------------------------------------------------
    // File collection
    // ------------------------------------------------------------------

    /// Validate and store a new file.
    ///
    /// The first file becomes primary; later files are appended at the end.
    /// A blob write failure or timeout rolls back the row insert.
    pub async fn upload_file(
        &self,
        document_id: Uuid,
        candidate: UploadCandidate,
    ) -> AppResult<DocumentFile> {
        let file_size = i64::try_from(candidate.bytes.len())
            .map_err(|_| AppError::Validation("file is too large".into()))?;
        let file_hash = hex::encode(Sha256::digest(&candidate.bytes));

        if let Some(declared) = non_blank(candidate.declared_hash.clone())
            && !declared.eq_ignore_ascii_case(&file_hash)
        {
            return Err(AppError::Validation(format!(
                "declared hash {} does not match content hash {}",
                declared, file_hash
            )));
        }

        let txn = self.pool.begin().await?;
        let doc = documents::lock(&txn, document_id).await?;
        let doc_type = self.catalog.require(doc.document_type_id)?;
        let extension = doc_type.validate_file(&candidate.file_name, file_size)?;

        let files = document_files::list_for_document(&txn, doc.id).await?;
        if files.len() as u64 >= doc_type.file_limit() {
            return Err(AppError::Conflict(format!(
                "{} accepts at most {} file(s)",
                doc_type.name,
                doc_type.file_limit()
            )));
        }

        if let Some(existing) = document_files::find_by_hash(&txn, &file_hash).await? {
            return Err(AppError::Conflict(format!(
                "identical content is already stored as file {} of document {}",
                existing.id, existing.document_id
            )));
        }

        let sort_order = files
            .iter()
            .map(|f| f.sort_order)
            .max()
            .map_or(0, |max| max + 1);
        let file_id = Uuid::now_v7();
        let file_path = storage::document_key(doc.student_id, doc.id, file_id, &extension);

        let file = document_files::insert(
            &txn,
            FileEntry {
                id: file_id,
                document_id: doc.id,
                file_path: file_path.clone(),
                file_name: candidate.file_name.clone(),
                file_type: extension.clone(),
                file_size,
                file_hash,
                description: non_blank(candidate.description.clone()),
                is_primary: files.is_empty(),
                sort_order,
            },
        )
        .await?;

        if parse_stored_status(&doc)? == DocumentStatus::NeedsRevision {
            let submission = VerificationSubmission::new(VerificationStatus::Pending)
                .with_notes("Resubmitted with a new file upload");
            append_verification(&txn, doc, candidate.uploaded_by, &submission).await?;
        } else {
            documents::touch(&txn, doc.id).await?;
        }

        let content_type = storage::content_type_for_extension(&extension);
        if let Err(e) = with_timeout(
            self.storage_timeout,
            "blob upload",
            self.storage.put(&file_path, candidate.bytes, Some(content_type)),
        )
        .await
        {
            warn!(
                "Blob upload failed, rolling back document_id={} file_id={}: {}",
                document_id, file_id, e
            );
            drop(txn);
            self.discard_blob(&file_path).await;
            return Err(e);
        }

        if let Err(e) = commit(txn).await {
            self.discard_blob(&file_path).await;
            return Err(e);
        }

        info!(
            "Uploaded file file_id={} document_id={} size={} primary={}",
            file.id, document_id, file.file_size, file.is_primary
        );

        Ok(DocumentFile::from(file))
    }

    /// Make `file_id` the only primary file of the document. Idempotent.
    pub async fn set_primary_file(&self, document_id: Uuid, file_id: Uuid) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        let doc = documents::lock(&txn, document_id).await?;
        document_files::get_member(&txn, doc.id, file_id).await?;

        document_files::clear_primary(&txn, doc.id).await?;
        document_files::mark_primary(&txn, file_id).await?;
        documents::touch(&txn, doc.id).await?;
        commit(txn).await?;

        info!(
            "Set primary file file_id={} document_id={}",
            file_id, document_id
        );
        Ok(())
    }

    /// Remove one file, promoting the lowest-ordered remaining file if it was primary.
    pub async fn remove_file(&self, document_id: Uuid, file_id: Uuid) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        let doc = documents::lock(&txn, document_id).await?;
        let file = document_files::get_member(&txn, doc.id, file_id).await?;

        document_files::delete(&txn, file.id).await?;
        if file.is_primary {
            let remaining = document_files::list_for_document(&txn, doc.id).await?;
            if let Some(next) = remaining.first() {
                document_files::mark_primary(&txn, next.id).await?;
            }
        }
        documents::touch(&txn, doc.id).await?;
        commit(txn).await?;

        if let Err(e) = with_timeout(
            self.storage_timeout,
            "blob delete",
            self.storage.delete(&file.file_path),
        )
        .await
        {
            warn!(
                "Failed to delete blob for removed file file_id={} path={}: {}",
                file.id, file.file_path, e
            );
        }

        info!("Removed file file_id={} document_id={}", file_id, document_id);
        Ok(())
    }

    /// Move a file to `position` (clamped) and renumber the collection from zero.
    pub async fn reorder_file(
        &self,
        document_id: Uuid,
        file_id: Uuid,
        position: u32,
    ) -> AppResult<Vec<DocumentFile>> {
        let txn = self.pool.begin().await?;
        let doc = documents::lock(&txn, document_id).await?;
        document_files::get_member(&txn, doc.id, file_id).await?;

        let mut files = document_files::list_for_document(&txn, doc.id).await?;
        let from = files
            .iter()
            .position(|f| f.id == file_id)
            .ok_or_else(|| AppError::NotFound(format!("File {}", file_id)))?;
        let moved = files.remove(from);
        let to = (position as usize).min(files.len());
        files.insert(to, moved);

        for (index, file) in files.iter_mut().enumerate() {
            let index = index as i32;
            if file.sort_order != index {
                document_files::set_sort_order(&txn, file.id, index).await?;
                file.sort_order = index;
            }
        }
        documents::touch(&txn, doc.id).await?;
        commit(txn).await?;

        info!(
            "Reordered file file_id={} document_id={} position={}",
            file_id, document_id, to
        );
        Ok(files.into_iter().map(DocumentFile::from).collect())
    }

    /// Retrievable URL of a stored file.
    pub async fn file_url(&self, document_id: Uuid, file_id: Uuid) -> AppResult<FileUrlResponse> {
        let file = document_files::get_member(self.pool.connection(), document_id, file_id).await?;
        let url = with_timeout(
            self.storage_timeout,
            "blob url",
            self.storage.url(&file.file_path),
        )
        .await?;

        Ok(FileUrlResponse { file_id, url })
    }

    /// Bytes of a stored file.
    pub async fn file_content(&self, document_id: Uuid, file_id: Uuid) -> AppResult<FileContent> {
        let file = document_files::get_member(self.pool.connection(), document_id, file_id).await?;
        let (bytes, content_type) = with_timeout(
            self.storage_timeout,
            "blob read",
            self.storage.get(&file.file_path),
        )
        .await?;

        Ok(FileContent {
            file: DocumentFile::from(file),
            bytes,
            content_type,
        })
    }

    // ------------------------------------------------------------------
    // Verification workflow
    // ------------------------------------------------------------------

    /// Append a ledger entry and mirror its status onto the record.
    ///
    /// Reviewer decisions apply only to pending records with at least one file.
    /// `pending` reopens a reviewed record (see [`Self::resubmit_document`]).
    pub async fn submit_verification(
        &self,
        document_id: Uuid,
        actor: Uuid,
        submission: VerificationSubmission,
    ) -> AppResult<VerificationEntry> {
        if submission.status.requires_reason() && submission.rejection_reason.is_none() {
            return Err(AppError::Validation(format!(
                "a rejection reason is required for '{}'",
                submission.status
            )));
        }

        let txn = self.pool.begin().await?;
        let doc = documents::lock(&txn, document_id).await?;

        let file_count = document_files::count_for_document(&txn, doc.id).await?;
        if file_count == 0 {
            return Err(AppError::State(format!(
                "document {} has no files to verify",
                doc.id
            )));
        }

        let current = parse_stored_status(&doc)?;
        if !current.accepts(submission.status) {
            return Err(AppError::State(format!(
                "cannot record '{}' on a document that is {}",
                submission.status, current
            )));
        }

        let (_, entry) = append_verification(&txn, doc, actor, &submission).await?;
        commit(txn).await?;

        info!(
            "Recorded verification document_id={} status={} by={}",
            document_id, submission.status, actor
        );
        VerificationEntry::try_from(entry)
    }

    /// Explicitly reopen a reviewed or expired record for review.
    pub async fn resubmit_document(
        &self,
        document_id: Uuid,
        actor: Uuid,
        notes: Option<String>,
    ) -> AppResult<VerificationEntry> {
        let mut submission = VerificationSubmission::new(VerificationStatus::Pending);
        submission.notes = non_blank(notes);
        self.submit_verification(document_id, actor, submission)
            .await
    }

    /// Ledger entries of a document, oldest first.
    pub async fn list_verifications(&self, document_id: Uuid) -> AppResult<Vec<VerificationEntry>> {
        let conn = self.pool.connection();
        documents::get(conn, document_id).await?;

        verifications::list_for_document(conn, document_id)
            .await?
            .into_iter()
            .map(VerificationEntry::try_from)
            .collect()
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn record(&self, model: document::Model) -> AppResult<DocumentRecord> {
        self.record_as_of(model, expiry::today())
    }

    fn record_as_of(&self, model: document::Model, today: NaiveDate) -> AppResult<DocumentRecord> {
        let doc_type = self.catalog.require(model.document_type_id)?;
        DocumentRecord::from_model(model, &doc_type, today)
    }

    async fn discard_blob(&self, path: &str) {
        if let Err(e) = with_timeout(self.storage_timeout, "blob delete", self.storage.delete(path))
            .await
        {
            warn!("Failed to discard blob path={}: {}", path, e);
        }
    }
}

/// Write a ledger entry and the record status it implies.
///
/// The only path that appends to the ledger.
async fn append_verification(
    txn: &DatabaseTransaction,
    doc: document::Model,
    actor: Uuid,
    submission: &VerificationSubmission,
) -> AppResult<(document::Model, crate::entity::document_verification::Model)> {
    let now = Utc::now();
    let entry = verifications::append(txn, doc.id, actor, submission, now).await?;

    let change = StatusChange {
        status: DocumentStatus::from_verification(submission.status),
        rejection_reason: if submission.status.requires_reason() {
            submission.rejection_reason.clone()
        } else {
            None
        },
        verified: (submission.status == VerificationStatus::Approved).then_some((now, actor)),
    };
    let updated = documents::apply_status(txn, doc, change).await?;

    Ok((updated, entry))
}

async fn commit(txn: DatabaseTransaction) -> AppResult<()> {
    txn.commit()
        .await
        .map_err(|e| AppError::Database(format!("Failed to commit transaction: {}", e)))
}
