//! Domain models for student compliance documents.

pub mod document;
pub mod document_file;
pub mod document_type;
pub mod verification;

// Re-export commonly used types
pub use document::{
    CreateDocumentRequest, DocumentDetail, DocumentFilter, DocumentListResponse, DocumentRecord,
    DocumentStatus, ListDocumentsQuery, NewDocument, UpdateDocumentRequest,
};
pub use document_file::{
    DocumentFile, FileCollectionSummary, FileUrlResponse, ReorderFileRequest, UploadCandidate,
};
pub use document_type::{DocumentCategory, DocumentType, DocumentTypeDefinition};
pub use verification::{
    ResubmitRequest, SubmitVerificationRequest, VerificationChecklist, VerificationEntry,
    VerificationStatus, VerificationSubmission,
};
