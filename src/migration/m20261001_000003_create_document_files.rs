//! Create document_files table.

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
                    .table(DocumentFile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DocumentFile::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DocumentFile::DocumentId).uuid().not_null())
                    .col(ColumnDef::new(DocumentFile::FilePath).string_len(500).not_null())
                    .col(ColumnDef::new(DocumentFile::FileName).string_len(255).not_null())
                    .col(ColumnDef::new(DocumentFile::FileType).string_len(20).not_null())
                    .col(ColumnDef::new(DocumentFile::FileSize).big_integer().not_null())
                    .col(ColumnDef::new(DocumentFile::FileHash).string_len(64).not_null())
                    .col(ColumnDef::new(DocumentFile::Description).text())
                    .col(
                        ColumnDef::new(DocumentFile::IsPrimary)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DocumentFile::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DocumentFile::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_files_document")
                            .from(DocumentFile::Table, DocumentFile::DocumentId)
                            .to(Document::Table, Document::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Content-addressed: the same bytes may be stored only once
        manager
            .create_index(
                Index::create()
                    .name("idx_document_files_file_hash")
                    .table(DocumentFile::Table)
                    .col(DocumentFile::FileHash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_document_files_primary")
                    .table(DocumentFile::Table)
                    .col(DocumentFile::DocumentId)
                    .col(DocumentFile::IsPrimary)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_document_files_sort_order")
                    .table(DocumentFile::Table)
                    .col(DocumentFile::DocumentId)
                    .col(DocumentFile::SortOrder)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DocumentFile::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DocumentFile {
    #[sea_orm(iden = "document_files")]
    Table,
    Id,
    DocumentId,
    FilePath,
    FileName,
    FileType,
    FileSize,
    FileHash,
    Description,
    IsPrimary,
    SortOrder,
    CreatedAt,
}
