//! Database queries for the append-only verification ledger.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::document_verification::{self, ActiveModel, Entity as DocumentVerification};
use crate::error::{AppError, AppResult};
use crate::models::VerificationSubmission;

/// Append a ledger entry.
pub async fn append<C: ConnectionTrait>(
    conn: &C,
    document_id: Uuid,
    verified_by: Uuid,
    submission: &VerificationSubmission,
    verified_at: DateTime<Utc>,
) -> AppResult<document_verification::Model> {
    let checklist = submission
        .checklist
        .as_ref()
        .map(serde_json::to_value)
        .transpose()?;

    let model = ActiveModel {
        id: Set(Uuid::now_v7()),
        document_id: Set(document_id),
        verified_by: Set(verified_by),
        status: Set(submission.status.as_str().to_string()),
        notes: Set(submission.notes.clone()),
        rejection_reason: Set(submission.rejection_reason.clone()),
        verification_checklist: Set(checklist),
        verified_at: Set(verified_at),
    };

    model
        .insert(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to append verification: {}", e)))
}

/// Ledger entries of a document, oldest first.
pub async fn list_for_document<C: ConnectionTrait>(
    conn: &C,
    document_id: Uuid,
) -> AppResult<Vec<document_verification::Model>> {
    DocumentVerification::find()
        .filter(document_verification::Column::DocumentId.eq(document_id))
        .order_by_asc(document_verification::Column::VerifiedAt)
        .order_by_asc(document_verification::Column::Id)
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list verifications: {}", e)))
}

/// Delete the ledger of a document being removed.
pub async fn delete_for_document<C: ConnectionTrait>(conn: &C, document_id: Uuid) -> AppResult<u64> {
    let result = DocumentVerification::delete_many()
        .filter(document_verification::Column::DocumentId.eq(document_id))
        .exec(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete verifications: {}", e)))?;

    Ok(result.rows_affected)
}
