//! Verification ledger models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::document_verification;
use crate::error::{AppError, AppResult};

/// Reviewer decision recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
    NeedsRevision,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::NeedsRevision => "needs_revision",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "needs_revision" => Some(Self::NeedsRevision),
            _ => None,
        }
    }

    /// Decisions that must carry a rejection reason.
    pub fn requires_reason(&self) -> bool {
        matches!(self, Self::Rejected | Self::NeedsRevision)
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Named review criteria mapped to pass/fail.
pub type VerificationChecklist = BTreeMap<String, bool>;

/// Ledger entry as returned to callers.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerificationEntry {
    pub id: Uuid,
    pub document_id: Uuid,
    pub verified_by: Uuid,
    pub status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_checklist: Option<VerificationChecklist>,
    pub verified_at: DateTime<Utc>,
}

impl TryFrom<document_verification::Model> for VerificationEntry {
    type Error = AppError;

    fn try_from(m: document_verification::Model) -> Result<Self, Self::Error> {
        let status = VerificationStatus::parse(&m.status).ok_or_else(|| {
            AppError::Database(format!(
                "verification {} has unknown status '{}'",
                m.id, m.status
            ))
        })?;
        let verification_checklist = m
            .verification_checklist
            .map(serde_json::from_value::<VerificationChecklist>)
            .transpose()
            .map_err(|e| {
                AppError::Database(format!(
                    "verification {} has malformed checklist: {}",
                    m.id, e
                ))
            })?;

        Ok(VerificationEntry {
            id: m.id,
            document_id: m.document_id,
            verified_by: m.verified_by,
            status,
            notes: m.notes,
            rejection_reason: m.rejection_reason,
            verification_checklist,
            verified_at: m.verified_at,
        })
    }
}

/// Request body for submitting a verification decision.
///
/// `status` stays a string here so unknown values surface as a workflow error
/// rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitVerificationRequest {
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub checklist: Option<VerificationChecklist>,
}

/// Parsed, validated verification decision.
#[derive(Debug, Clone)]
pub struct VerificationSubmission {
    pub status: VerificationStatus,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub checklist: Option<VerificationChecklist>,
}

impl VerificationSubmission {
    pub fn new(status: VerificationStatus) -> Self {
        Self {
            status,
            notes: None,
            rejection_reason: None,
            checklist: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.rejection_reason = Some(reason.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_checklist(mut self, checklist: VerificationChecklist) -> Self {
        self.checklist = Some(checklist);
        self
    }
}

impl TryFrom<SubmitVerificationRequest> for VerificationSubmission {
    type Error = AppError;

    fn try_from(req: SubmitVerificationRequest) -> AppResult<Self> {
        let status = VerificationStatus::parse(req.status.trim()).ok_or_else(|| {
            AppError::State(format!(
                "'{}' is not a verification status (expected pending, approved, rejected or needs_revision)",
                req.status
            ))
        })?;

        Ok(VerificationSubmission {
            status,
            notes: non_blank(req.notes),
            rejection_reason: non_blank(req.rejection_reason),
            checklist: req.checklist,
        })
    }
}

/// Request body for an explicit resubmission.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ResubmitRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
