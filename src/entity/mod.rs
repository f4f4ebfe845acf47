//! SeaORM entity definitions.

pub mod document;
pub mod document_file;
pub mod document_type;
pub mod document_verification;
