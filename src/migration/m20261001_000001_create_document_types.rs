//! Create document_types table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DocumentType::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DocumentType::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DocumentType::Key)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(DocumentType::Name).string().not_null())
                    .col(ColumnDef::new(DocumentType::Description).text())
                    .col(ColumnDef::new(DocumentType::Category).string_len(30).not_null())
                    .col(
                        ColumnDef::new(DocumentType::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(DocumentType::IsRequired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DocumentType::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(DocumentType::AllowedExtensions).json().not_null())
                    .col(
                        ColumnDef::new(DocumentType::MaxFileSize)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentType::AllowsMultipleFiles)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DocumentType::MaxFiles)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(DocumentType::IsVisaRequired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DocumentType::HasExpiryValidation)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DocumentType::ExpiryWarningDays)
                            .integer()
                            .not_null()
                            .default(30),
                    )
                    .col(
                        ColumnDef::new(DocumentType::RequiresVerification)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DocumentType::RequiresNotarization)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DocumentType::RequiresTranslation)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DocumentType::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(DocumentType::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(DocumentType::DeletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_document_types_category")
                    .table(DocumentType::Table)
                    .col(DocumentType::Category)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DocumentType::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum DocumentType {
    #[sea_orm(iden = "document_types")]
    Table,
    Id,
    Key,
    Name,
    Description,
    Category,
    IsActive,
    IsRequired,
    SortOrder,
    AllowedExtensions,
    MaxFileSize,
    AllowsMultipleFiles,
    MaxFiles,
    IsVisaRequired,
    HasExpiryValidation,
    ExpiryWarningDays,
    RequiresVerification,
    RequiresNotarization,
    RequiresTranslation,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
