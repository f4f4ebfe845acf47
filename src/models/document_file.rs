//! Document file models and file collection summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::document_file;

/// Physical file attached to a document.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DocumentFile {
    pub id: Uuid,
    pub document_id: Uuid,
    pub file_path: String,
    pub file_name: String,
    /// Lowercase extension.
    pub file_type: String,
    /// Bytes.
    pub file_size: i64,
    /// SHA-256 of the content, hex encoded.
    pub file_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_primary: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl From<document_file::Model> for DocumentFile {
    fn from(m: document_file::Model) -> Self {
        DocumentFile {
            id: m.id,
            document_id: m.document_id,
            file_path: m.file_path,
            file_name: m.file_name,
            file_type: m.file_type,
            file_size: m.file_size,
            file_hash: m.file_hash,
            description: m.description,
            is_primary: m.is_primary,
            sort_order: m.sort_order,
            created_at: m.created_at,
        }
    }
}

/// Derived reads over one document's files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct FileCollectionSummary {
    pub file_count: usize,
    /// Sum of file sizes in bytes.
    pub total_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_file_id: Option<Uuid>,
    pub has_multiple_files: bool,
}

impl FileCollectionSummary {
    pub fn from_files(files: &[DocumentFile]) -> Self {
        FileCollectionSummary {
            file_count: files.len(),
            total_size: files.iter().map(|f| f.file_size).sum(),
            primary_file_id: files.iter().find(|f| f.is_primary).map(|f| f.id),
            has_multiple_files: files.len() > 1,
        }
    }
}

/// File bytes offered for upload.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    /// Acting user; recorded on the ledger when the upload reopens a record.
    pub uploaded_by: Uuid,
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Hash computed by the caller; verified against the content when present.
    pub declared_hash: Option<String>,
    pub description: Option<String>,
}

/// Request body for moving a file within its collection.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReorderFileRequest {
    /// Zero-based target position; clamped to the collection bounds.
    pub position: u32,
}

/// Retrievable location of a stored file.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FileUrlResponse {
    pub file_id: Uuid,
    pub url: String,
}
