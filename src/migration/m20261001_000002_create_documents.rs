//! Create documents table.

use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_document_types::DocumentType;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Document::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Document::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Document::StudentId).uuid().not_null())
                    .col(ColumnDef::new(Document::DocumentTypeId).uuid().not_null())
                    .col(ColumnDef::new(Document::Title).string().not_null())
                    .col(ColumnDef::new(Document::Description).text())
                    .col(
                        ColumnDef::new(Document::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Document::RejectionReason).text())
                    .col(ColumnDef::new(Document::ExpiryDate).date())
                    .col(
                        ColumnDef::new(Document::IsRequired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Document::IsPublic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Document::VerifiedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Document::VerifiedBy).uuid())
                    .col(
                        ColumnDef::new(Document::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Document::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_documents_document_type")
                            .from(Document::Table, Document::DocumentTypeId)
                            .to(DocumentType::Table, DocumentType::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // One logical document per student and type
        manager
            .create_index(
                Index::create()
                    .name("idx_documents_student_type")
                    .table(Document::Table)
                    .col(Document::StudentId)
                    .col(Document::DocumentTypeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_documents_status")
                    .table(Document::Table)
                    .col(Document::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_documents_expiry_date")
                    .table(Document::Table)
                    .col(Document::ExpiryDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Document::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Document {
    #[sea_orm(iden = "documents")]
    Table,
    Id,
    StudentId,
    DocumentTypeId,
    Title,
    Description,
    Status,
    RejectionReason,
    ExpiryDate,
    IsRequired,
    IsPublic,
    VerifiedAt,
    VerifiedBy,
    CreatedAt,
    UpdatedAt,
}
