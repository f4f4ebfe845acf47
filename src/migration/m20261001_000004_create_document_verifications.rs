//! Create document_verifications table (append-only ledger).

use sea_orm_migration::prelude::*;

use super::m20261001_000002_create_documents::Document;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DocumentVerification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DocumentVerification::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DocumentVerification::DocumentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentVerification::VerifiedBy)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentVerification::Status)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(DocumentVerification::Notes).text())
                    .col(ColumnDef::new(DocumentVerification::RejectionReason).text())
                    .col(ColumnDef::new(DocumentVerification::VerificationChecklist).json())
                    .col(
                        ColumnDef::new(DocumentVerification::VerifiedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_verifications_document")
                            .from(DocumentVerification::Table, DocumentVerification::DocumentId)
                            .to(Document::Table, Document::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_document_verifications_document")
                    .table(DocumentVerification::Table)
                    .col(DocumentVerification::DocumentId)
                    .col(DocumentVerification::VerifiedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DocumentVerification::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DocumentVerification {
    #[sea_orm(iden = "document_verifications")]
    Table,
    Id,
    DocumentId,
    VerifiedBy,
    Status,
    Notes,
    RejectionReason,
    VerificationChecklist,
    VerifiedAt,
}
