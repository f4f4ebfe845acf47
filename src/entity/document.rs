//! Document entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub student_id: Uuid,
    pub document_type_id: Uuid,
    pub title: String,
    pub description: Option<String>,

    // Workflow
    pub status: String,
    pub rejection_reason: Option<String>,
    pub expiry_date: Option<Date>,
    pub is_required: bool,
    pub is_public: bool,

    // Denormalized from the latest approved verification
    pub verified_at: Option<DateTimeUtc>,
    pub verified_by: Option<Uuid>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::document_type::Entity",
        from = "Column::DocumentTypeId",
        to = "super::document_type::Column::Id",
        on_delete = "Restrict"
    )]
    DocumentType,
    #[sea_orm(has_many = "super::document_file::Entity")]
    Files,
    #[sea_orm(has_many = "super::document_verification::Entity")]
    Verifications,
}

impl Related<super::document_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocumentType.def()
    }
}

impl Related<super::document_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl Related<super::document_verification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Verifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
