//! Database queries for the document type catalog.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::document_type::{self, ActiveModel, Entity as DocumentTypeEntity};
use crate::error::{AppError, AppResult};
use crate::models::DocumentTypeDefinition;

/// Insert a definition or refresh the row with the same key.
///
/// The row id and any soft deletion survive the refresh.
pub async fn upsert_definition<C: ConnectionTrait>(
    conn: &C,
    def: &DocumentTypeDefinition,
) -> AppResult<document_type::Model> {
    let now = Utc::now();

    match find_by_key(conn, &def.key).await? {
        Some(row) => {
            let mut model: ActiveModel = row.into();
            apply_definition(&mut model, def)?;
            model.updated_at = Set(now);
            model
                .update(conn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to update document type: {}", e)))
        }
        None => {
            let mut model = ActiveModel {
                id: Set(Uuid::now_v7()),
                key: Set(def.key.clone()),
                created_at: Set(now),
                updated_at: Set(now),
                deleted_at: Set(None),
                ..Default::default()
            };
            apply_definition(&mut model, def)?;
            model
                .insert(conn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to insert document type: {}", e)))
        }
    }
}

fn apply_definition(model: &mut ActiveModel, def: &DocumentTypeDefinition) -> AppResult<()> {
    model.name = Set(def.name.clone());
    model.description = Set(def.description.clone());
    model.category = Set(def.category.as_str().to_string());
    model.is_active = Set(def.is_active);
    model.is_required = Set(def.is_required);
    model.sort_order = Set(def.sort_order);
    model.allowed_extensions = Set(serde_json::to_value(&def.allowed_extensions)?);
    model.max_file_size = Set(def.max_file_size);
    model.allows_multiple_files = Set(def.allows_multiple_files);
    model.max_files = Set(def.max_files);
    model.is_visa_required = Set(def.is_visa_required);
    model.has_expiry_validation = Set(def.has_expiry_validation);
    model.expiry_warning_days = Set(def.expiry_warning_days);
    model.requires_verification = Set(def.requires_verification);
    model.requires_notarization = Set(def.requires_notarization);
    model.requires_translation = Set(def.requires_translation);
    Ok(())
}

/// Get a document type by key, including soft-deleted rows.
pub async fn find_by_key<C: ConnectionTrait>(
    conn: &C,
    key: &str,
) -> AppResult<Option<document_type::Model>> {
    DocumentTypeEntity::find()
        .filter(document_type::Column::Key.eq(key))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get document type: {}", e)))
}

/// All document types, including soft-deleted ones, in display order.
pub async fn list_all<C: ConnectionTrait>(conn: &C) -> AppResult<Vec<document_type::Model>> {
    DocumentTypeEntity::find()
        .order_by_asc(document_type::Column::SortOrder)
        .order_by_asc(document_type::Column::Key)
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list document types: {}", e)))
}

/// Soft delete a document type. Existing documents keep referencing it.
pub async fn soft_delete<C: ConnectionTrait>(conn: &C, key: &str) -> AppResult<bool> {
    let Some(row) = find_by_key(conn, key).await? else {
        return Ok(false);
    };
    if row.deleted_at.is_some() {
        return Ok(false);
    }

    let now = Utc::now();
    let mut active: ActiveModel = row.into();
    active.deleted_at = Set(Some(now));
    active.updated_at = Set(now);
    active
        .update(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete document type: {}", e)))?;

    Ok(true)
}
