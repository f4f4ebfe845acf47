//! Database queries for document records.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use crate::entity::document::{self, ActiveModel, Entity as Document};
use crate::error::{AppError, AppResult};
use crate::models::{DocumentStatus, DocumentType};

/// Fields written when a record is first created.
#[derive(Debug, Clone)]
pub struct DocumentRow<'a> {
    pub student_id: Uuid,
    pub document_type: &'a DocumentType,
    pub title: String,
    pub description: Option<String>,
}

/// Status change applied to a record together with its ledger entry.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: DocumentStatus,
    pub rejection_reason: Option<String>,
    /// Set on approval; other decisions leave the previous values.
    pub verified: Option<(DateTime<Utc>, Uuid)>,
}

/// Detail fields editable after creation.
#[derive(Debug, Clone, Default)]
pub struct DetailChange {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    /// `Some(None)` clears the date.
    pub expiry_date: Option<Option<NaiveDate>>,
    pub is_public: Option<bool>,
}

/// Insert a new pending record.
///
/// A unique-index violation on (student, type) surfaces as `Conflict`.
pub async fn insert<C: ConnectionTrait>(
    conn: &C,
    row: DocumentRow<'_>,
) -> AppResult<document::Model> {
    let now = Utc::now();
    let model = ActiveModel {
        id: Set(Uuid::now_v7()),
        student_id: Set(row.student_id),
        document_type_id: Set(row.document_type.id),
        title: Set(row.title),
        description: Set(row.description),
        status: Set(DocumentStatus::Pending.as_str().to_string()),
        rejection_reason: Set(None),
        expiry_date: Set(None),
        is_required: Set(row.document_type.is_required),
        is_public: Set(false),
        verified_at: Set(None),
        verified_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    model.insert(conn).await.map_err(|e| {
        AppError::from_insert(e, || {
            format!(
                "student {} already has a {} document",
                row.student_id, row.document_type.key
            )
        })
    })
}

/// Get a record by id.
pub async fn find_by_id<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<Option<document::Model>> {
    Document::find_by_id(id)
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get document: {}", e)))
}

/// Get a record by id, failing with `NotFound` when absent.
pub async fn get<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<document::Model> {
    find_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {}", id)))
}

/// Load a record for update, holding a row lock until the transaction ends.
pub async fn lock<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<document::Model> {
    lock_query(conn.get_database_backend(), id)
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to lock document: {}", e)))?
        .ok_or_else(|| AppError::NotFound(format!("Document {}", id)))
}

/// `SELECT ... FOR UPDATE` on the record row.
///
/// SQLite has no row locks; its single writer already serializes transactions.
fn lock_query(backend: DbBackend, id: Uuid) -> Select<Document> {
    let query = Document::find_by_id(id);
    if backend == DbBackend::Sqlite {
        query
    } else {
        query.lock_exclusive()
    }
}

/// Get the record a student holds for a document type.
pub async fn find_by_student_and_type<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
    document_type_id: Uuid,
) -> AppResult<Option<document::Model>> {
    Document::find()
        .filter(document::Column::StudentId.eq(student_id))
        .filter(document::Column::DocumentTypeId.eq(document_type_id))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get student document: {}", e)))
}

/// All records of a student, optionally restricted to some document types.
pub async fn list_by_student<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
    document_type_ids: Option<&[Uuid]>,
) -> AppResult<Vec<document::Model>> {
    let mut query = Document::find().filter(document::Column::StudentId.eq(student_id));
    if let Some(ids) = document_type_ids {
        query = query.filter(document::Column::DocumentTypeId.is_in(ids.iter().copied()));
    }

    query
        .order_by_asc(document::Column::CreatedAt)
        .order_by_asc(document::Column::Id)
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list documents: {}", e)))
}

/// Write a workflow status change.
pub async fn apply_status<C: ConnectionTrait>(
    conn: &C,
    doc: document::Model,
    change: StatusChange,
) -> AppResult<document::Model> {
    let mut model: ActiveModel = doc.into();
    model.status = Set(change.status.as_str().to_string());
    model.rejection_reason = Set(change.rejection_reason);
    if let Some((verified_at, verified_by)) = change.verified {
        model.verified_at = Set(Some(verified_at));
        model.verified_by = Set(Some(verified_by));
    }
    model.updated_at = Set(Utc::now());

    model
        .update(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update document status: {}", e)))
}

/// Write edited detail fields.
pub async fn apply_details<C: ConnectionTrait>(
    conn: &C,
    doc: document::Model,
    change: DetailChange,
) -> AppResult<document::Model> {
    let mut model: ActiveModel = doc.into();
    if let Some(title) = change.title {
        model.title = Set(title);
    }
    if let Some(description) = change.description {
        model.description = Set(description);
    }
    if let Some(expiry_date) = change.expiry_date {
        model.expiry_date = Set(expiry_date);
    }
    if let Some(is_public) = change.is_public {
        model.is_public = Set(is_public);
    }
    model.updated_at = Set(Utc::now());

    model
        .update(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update document: {}", e)))
}

/// Touch `updated_at` after a change to the file collection.
pub async fn touch<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<()> {
    Document::update_many()
        .col_expr(document::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(document::Column::Id.eq(id))
        .exec(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to touch document: {}", e)))?;
    Ok(())
}

/// Delete a record row.
pub async fn delete<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<u64> {
    let result = Document::delete_by_id(id)
        .exec(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete document: {}", e)))?;
    Ok(result.rows_affected)
}

/// Persist `expired` on every record whose expiry date is before `today`.
pub async fn mark_expired<C: ConnectionTrait>(conn: &C, today: NaiveDate) -> AppResult<u64> {
    let result = Document::update_many()
        .col_expr(
            document::Column::Status,
            Expr::value(DocumentStatus::Expired.as_str()),
        )
        .col_expr(document::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(document::Column::ExpiryDate.lt(today))
        .filter(document::Column::Status.ne(DocumentStatus::Expired.as_str()))
        .exec(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to mark expired documents: {}", e)))?;

    Ok(result.rows_affected)
}
