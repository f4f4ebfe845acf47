//! Database queries for document files.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::document_file::{self, ActiveModel, Entity as DocumentFile};
use crate::error::{AppError, AppResult};

/// File row to insert into the database.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub id: Uuid,
    pub document_id: Uuid,
    pub file_path: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub file_hash: String,
    pub description: Option<String>,
    pub is_primary: bool,
    pub sort_order: i32,
}

/// Insert a file row.
///
/// The store-wide unique index on `file_hash` turns a concurrent duplicate into `Conflict`.
pub async fn insert<C: ConnectionTrait>(conn: &C, entry: FileEntry) -> AppResult<document_file::Model> {
    let hash = entry.file_hash.clone();
    let model = ActiveModel {
        id: Set(entry.id),
        document_id: Set(entry.document_id),
        file_path: Set(entry.file_path),
        file_name: Set(entry.file_name),
        file_type: Set(entry.file_type),
        file_size: Set(entry.file_size),
        file_hash: Set(entry.file_hash),
        description: Set(entry.description),
        is_primary: Set(entry.is_primary),
        sort_order: Set(entry.sort_order),
        created_at: Set(Utc::now()),
    };

    model
        .insert(conn)
        .await
        .map_err(|e| AppError::from_insert(e, || format!("a file with hash {} already exists", hash)))
}

/// Files of a document in collection order.
pub async fn list_for_document<C: ConnectionTrait>(
    conn: &C,
    document_id: Uuid,
) -> AppResult<Vec<document_file::Model>> {
    DocumentFile::find()
        .filter(document_file::Column::DocumentId.eq(document_id))
        .order_by_asc(document_file::Column::SortOrder)
        .order_by_asc(document_file::Column::CreatedAt)
        .order_by_asc(document_file::Column::Id)
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list document files: {}", e)))
}

/// Count files of a document.
pub async fn count_for_document<C: ConnectionTrait>(conn: &C, document_id: Uuid) -> AppResult<u64> {
    DocumentFile::find()
        .filter(document_file::Column::DocumentId.eq(document_id))
        .count(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to count document files: {}", e)))
}

/// Get a file by id regardless of owner.
pub async fn find_by_id<C: ConnectionTrait>(
    conn: &C,
    file_id: Uuid,
) -> AppResult<Option<document_file::Model>> {
    DocumentFile::find_by_id(file_id)
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get document file: {}", e)))
}

/// Get a file that must belong to `document_id`.
///
/// Unknown ids are `NotFound`; a file owned by another document is `Conflict`.
pub async fn get_member<C: ConnectionTrait>(
    conn: &C,
    document_id: Uuid,
    file_id: Uuid,
) -> AppResult<document_file::Model> {
    let file = find_by_id(conn, file_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File {}", file_id)))?;

    if file.document_id != document_id {
        return Err(AppError::Conflict(format!(
            "file {} does not belong to document {}",
            file_id, document_id
        )));
    }

    Ok(file)
}

/// Find a file by content hash anywhere in the store.
pub async fn find_by_hash<C: ConnectionTrait>(
    conn: &C,
    file_hash: &str,
) -> AppResult<Option<document_file::Model>> {
    DocumentFile::find()
        .filter(document_file::Column::FileHash.eq(file_hash))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to look up file hash: {}", e)))
}

/// Clear the primary flag on every file of a document.
pub async fn clear_primary<C: ConnectionTrait>(conn: &C, document_id: Uuid) -> AppResult<u64> {
    let result = DocumentFile::update_many()
        .col_expr(document_file::Column::IsPrimary, Expr::value(false))
        .filter(document_file::Column::DocumentId.eq(document_id))
        .filter(document_file::Column::IsPrimary.eq(true))
        .exec(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to clear primary file: {}", e)))?;

    Ok(result.rows_affected)
}

/// Mark one file as primary.
pub async fn mark_primary<C: ConnectionTrait>(conn: &C, file_id: Uuid) -> AppResult<()> {
    DocumentFile::update_many()
        .col_expr(document_file::Column::IsPrimary, Expr::value(true))
        .filter(document_file::Column::Id.eq(file_id))
        .exec(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to set primary file: {}", e)))?;

    Ok(())
}

/// Set the sort order of one file.
pub async fn set_sort_order<C: ConnectionTrait>(
    conn: &C,
    file_id: Uuid,
    sort_order: i32,
) -> AppResult<()> {
    DocumentFile::update_many()
        .col_expr(document_file::Column::SortOrder, Expr::value(sort_order))
        .filter(document_file::Column::Id.eq(file_id))
        .exec(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to reorder file: {}", e)))?;

    Ok(())
}

/// Delete one file row.
pub async fn delete<C: ConnectionTrait>(conn: &C, file_id: Uuid) -> AppResult<u64> {
    let result = DocumentFile::delete_by_id(file_id)
        .exec(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete document file: {}", e)))?;

    Ok(result.rows_affected)
}

/// Delete every file row of a document.
pub async fn delete_for_document<C: ConnectionTrait>(conn: &C, document_id: Uuid) -> AppResult<u64> {
    let result = DocumentFile::delete_many()
        .filter(document_file::Column::DocumentId.eq(document_id))
        .exec(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete document files: {}", e)))?;

    Ok(result.rows_affected)
}
