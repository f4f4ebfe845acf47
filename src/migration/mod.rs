//! SeaORM database migrations.
//!
//! Written with the schema builder so the same migrations run on PostgreSQL
//! and on the in-memory SQLite database used by the test suite.

pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_document_types;
mod m20261001_000002_create_documents;
mod m20261001_000003_create_document_files;
mod m20261001_000004_create_document_verifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_document_types::Migration),
            Box::new(m20261001_000002_create_documents::Migration),
            Box::new(m20261001_000003_create_document_files::Migration),
            Box::new(m20261001_000004_create_document_verifications::Migration),
        ]
    }
}
