//! Document type entity for SeaORM.
//!
//! Catalog rows are soft-deleted (`deleted_at`) and never removed while documents reference them.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "document_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub is_active: bool,
    pub is_required: bool,
    pub sort_order: i32,

    // File policy
    #[sea_orm(column_type = "Json")]
    pub allowed_extensions: JsonValue,
    pub max_file_size: i64, // kilobytes
    pub allows_multiple_files: bool,
    pub max_files: i32,

    // Compliance flags
    pub is_visa_required: bool,
    pub has_expiry_validation: bool,
    pub expiry_warning_days: i32,
    pub requires_verification: bool,
    pub requires_notarization: bool,
    pub requires_translation: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::document::Entity")]
    Documents,
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
