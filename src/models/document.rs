//! Document record models, workflow status, and list filters.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::document_file::{DocumentFile, FileCollectionSummary};
use super::document_type::{DocumentCategory, DocumentType};
use super::verification::VerificationStatus;
use crate::entity::document;
use crate::error::{AppError, AppResult};
use crate::services::expiry;

/// Stored workflow status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Verified,
    Rejected,
    NeedsRevision,
    Expired,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::NeedsRevision => "needs_revision",
            Self::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "verified" => Some(Self::Verified),
            "rejected" => Some(Self::Rejected),
            "needs_revision" => Some(Self::NeedsRevision),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    /// Record status mirrored from a ledger decision.
    pub fn from_verification(status: VerificationStatus) -> Self {
        match status {
            VerificationStatus::Pending => Self::Pending,
            VerificationStatus::Approved => Self::Verified,
            VerificationStatus::Rejected => Self::Rejected,
            VerificationStatus::NeedsRevision => Self::NeedsRevision,
        }
    }

    /// Whether a ledger entry with `decision` may be appended in this state.
    ///
    /// Reviewer decisions apply only to pending records. A `pending` entry is a
    /// resubmission and is accepted from every state except pending itself.
    pub fn accepts(&self, decision: VerificationStatus) -> bool {
        match decision {
            VerificationStatus::Pending => !matches!(self, Self::Pending),
            _ => matches!(self, Self::Pending),
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Document record with its read-time expiry projection.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub document_type_id: Uuid,
    pub document_type_key: String,
    pub category: DocumentCategory,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Stored workflow status (system of record for transitions).
    pub status: DocumentStatus,
    /// Status to display: `expired` whenever the expiry date has passed.
    pub effective_status: DocumentStatus,
    pub is_expired: bool,
    pub is_expiring_soon: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    pub is_required: bool,
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Build the record view as of `today`, using the type's warning window.
    pub fn from_model(
        m: document::Model,
        doc_type: &DocumentType,
        today: NaiveDate,
    ) -> AppResult<Self> {
        let status = parse_stored_status(&m)?;
        let window = doc_type.expiry_warning_days.max(0) as u32;

        Ok(DocumentRecord {
            id: m.id,
            student_id: m.student_id,
            document_type_id: m.document_type_id,
            document_type_key: doc_type.key.clone(),
            category: doc_type.category,
            title: m.title,
            description: m.description,
            status,
            effective_status: expiry::effective_status(status, m.expiry_date, today),
            is_expired: expiry::is_expired(status, m.expiry_date, today),
            is_expiring_soon: expiry::is_expiring_soon(m.expiry_date, today, window),
            rejection_reason: m.rejection_reason,
            expiry_date: m.expiry_date,
            is_required: m.is_required,
            is_public: m.is_public,
            verified_at: m.verified_at,
            verified_by: m.verified_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

/// Parse the stored status column of a document row.
pub fn parse_stored_status(m: &document::Model) -> AppResult<DocumentStatus> {
    DocumentStatus::parse(&m.status).ok_or_else(|| {
        AppError::Database(format!(
            "document {} has unknown status '{}'",
            m.id, m.status
        ))
    })
}

/// Document with its file collection.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DocumentDetail {
    pub document: DocumentRecord,
    pub files: Vec<DocumentFile>,
    pub summary: FileCollectionSummary,
}

/// Input for `create_or_get_document`.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub student_id: Uuid,
    pub type_key: String,
    pub title: String,
    pub description: Option<String>,
}

/// Request body for creating (or fetching) a student's document.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateDocumentRequest {
    /// Document type key (e.g. "passport").
    pub document_type: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for updating document details.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateDocumentRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    /// Remove the expiry date (takes precedence over `expiry_date`).
    #[serde(default)]
    pub clear_expiry_date: bool,
    #[serde(default)]
    pub is_public: Option<bool>,
}

/// Query parameters for listing a student's documents.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ListDocumentsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub expiring_within_days: Option<u32>,
}

/// Parsed list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    /// Matched against the effective status.
    pub status: Option<DocumentStatus>,
    pub category: Option<DocumentCategory>,
    pub expiring_within_days: Option<u32>,
}

impl TryFrom<ListDocumentsQuery> for DocumentFilter {
    type Error = AppError;

    fn try_from(query: ListDocumentsQuery) -> AppResult<Self> {
        let status = query
            .status
            .as_deref()
            .map(|s| {
                DocumentStatus::parse(s)
                    .ok_or_else(|| AppError::Validation(format!("unknown status filter '{}'", s)))
            })
            .transpose()?;
        let category = query
            .category
            .as_deref()
            .map(|c| {
                DocumentCategory::parse(c)
                    .ok_or_else(|| AppError::Validation(format!("unknown category filter '{}'", c)))
            })
            .transpose()?;

        Ok(DocumentFilter {
            status,
            category,
            expiring_within_days: query.expiring_within_days,
        })
    }
}

/// Document list response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentRecord>,
    pub total: usize,
}
