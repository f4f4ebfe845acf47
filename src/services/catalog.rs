//! Document type catalog.
//!
//! Definitions are seeded into `document_types` at startup (from a JSON file or
//! the built-in set) and then held in memory for lookups. The catalog is live:
//! a reload after an edit changes the policy applied to existing documents.

use std::collections::HashSet;
use std::path::Path;
use std::sync::RwLock;

use tracing::info;
use uuid::Uuid;

use crate::db::{DbPool, document_types};
use crate::error::{AppError, AppResult};
use crate::models::{DocumentCategory, DocumentType, DocumentTypeDefinition};

/// In-memory view of the `document_types` table.
#[derive(Debug, Default)]
pub struct DocumentTypeCatalog {
    types: RwLock<Vec<DocumentType>>,
}

impl DocumentTypeCatalog {
    /// Build a catalog from already loaded types.
    pub fn from_types(types: Vec<DocumentType>) -> Self {
        Self {
            types: RwLock::new(types),
        }
    }

    /// Load every document type, soft-deleted ones included.
    pub async fn load(pool: &DbPool) -> AppResult<Self> {
        let catalog = Self::default();
        catalog.reload(pool).await?;
        Ok(catalog)
    }

    /// Replace the in-memory view with the current table contents.
    pub async fn reload(&self, pool: &DbPool) -> AppResult<usize> {
        let rows = document_types::list_all(pool.connection()).await?;
        let types = rows
            .into_iter()
            .map(DocumentType::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        let count = types.len();

        let mut guard = self
            .types
            .write()
            .map_err(|_| AppError::Database("document type catalog lock poisoned".into()))?;
        *guard = types;

        Ok(count)
    }

    /// Soft delete a type and refresh. Its documents stay readable.
    pub async fn retire(&self, pool: &DbPool, key: &str) -> AppResult<bool> {
        let retired = document_types::soft_delete(pool.connection(), key).await?;
        if retired {
            info!("Retired document type {}", key);
            self.reload(pool).await?;
        }
        Ok(retired)
    }

    /// Look up a type by key.
    pub fn by_key(&self, key: &str) -> AppResult<Option<DocumentType>> {
        self.read(|types| types.iter().find(|t| t.key == key).cloned())
    }

    /// Look up a type by id.
    pub fn by_id(&self, id: Uuid) -> AppResult<Option<DocumentType>> {
        self.read(|types| types.iter().find(|t| t.id == id).cloned())
    }

    /// Look up a type by id, failing with `NotFound`.
    pub fn require(&self, id: Uuid) -> AppResult<DocumentType> {
        self.by_id(id)?
            .ok_or_else(|| AppError::NotFound(format!("Document type {}", id)))
    }

    /// Active types in display order.
    pub fn list_active(&self) -> AppResult<Vec<DocumentType>> {
        let mut active: Vec<DocumentType> =
            self.read(|types| types.iter().filter(|t| t.is_active).cloned().collect())?;
        active.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.key.cmp(&b.key)));
        Ok(active)
    }

    /// Ids of every type in a category, inactive ones included.
    pub fn ids_in_category(&self, category: DocumentCategory) -> AppResult<Vec<Uuid>> {
        self.read(|types| {
            types
                .iter()
                .filter(|t| t.category == category)
                .map(|t| t.id)
                .collect()
        })
    }

    /// Number of loaded types, retired ones included.
    pub fn count(&self) -> AppResult<usize> {
        self.read(|types| types.len())
    }

    fn read<T>(&self, f: impl FnOnce(&[DocumentType]) -> T) -> AppResult<T> {
        let types = self
            .types
            .read()
            .map_err(|_| AppError::Database("document type catalog lock poisoned".into()))?;
        Ok(f(&types))
    }
}

/// Upsert definitions by key. Returns the number written.
pub async fn seed(pool: &DbPool, definitions: &[DocumentTypeDefinition]) -> AppResult<usize> {
    let txn = pool.begin().await?;
    for def in definitions {
        document_types::upsert_definition(&txn, def).await?;
    }
    txn.commit()
        .await
        .map_err(|e| AppError::Database(format!("Failed to commit catalog seed: {}", e)))?;

    info!("Seeded {} document types", definitions.len());
    Ok(definitions.len())
}

/// Read definitions from a JSON array file, or use the built-in set.
pub fn load_definitions(path: Option<&Path>) -> AppResult<Vec<DocumentTypeDefinition>> {
    let definitions = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                AppError::Validation(format!(
                    "Failed to read catalog file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let parsed: Vec<DocumentTypeDefinition> = serde_json::from_str(&raw)?;
            info!(
                "Loaded {} document type definitions from {}",
                parsed.len(),
                path.display()
            );
            parsed
        }
        None => default_definitions(),
    };

    let definitions: Vec<DocumentTypeDefinition> = definitions
        .into_iter()
        .map(DocumentTypeDefinition::normalized)
        .collect();

    let mut seen = HashSet::new();
    for def in &definitions {
        def.validate()?;
        if !seen.insert(def.key.as_str()) {
            return Err(AppError::Validation(format!(
                "document type '{}' is defined more than once",
                def.key
            )));
        }
    }

    Ok(definitions)
}

/// Built-in catalog used when no catalog file is configured.
pub fn default_definitions() -> Vec<DocumentTypeDefinition> {
    fn def(
        key: &str,
        name: &str,
        category: DocumentCategory,
        sort_order: i32,
        extensions: &[&str],
        max_file_size_kb: i64,
    ) -> DocumentTypeDefinition {
        DocumentTypeDefinition {
            key: key.to_string(),
            name: name.to_string(),
            description: None,
            category,
            is_active: true,
            is_required: false,
            sort_order,
            allowed_extensions: extensions.iter().map(|e| e.to_string()).collect(),
            max_file_size: max_file_size_kb,
            allows_multiple_files: false,
            max_files: 1,
            is_visa_required: false,
            has_expiry_validation: false,
            expiry_warning_days: 30,
            requires_verification: true,
            requires_notarization: false,
            requires_translation: false,
        }
    }

    const SCAN: &[&str] = &["pdf", "jpg", "jpeg", "png"];

    vec![
        DocumentTypeDefinition {
            description: Some("Valid passport identification page".into()),
            is_required: true,
            is_visa_required: true,
            has_expiry_validation: true,
            expiry_warning_days: 180,
            ..def("passport", "Passport", DocumentCategory::Identity, 10, &["pdf", "jpg", "jpeg"], 5120)
        },
        DocumentTypeDefinition {
            has_expiry_validation: true,
            ..def("national_id", "National ID card", DocumentCategory::Identity, 20, SCAN, 5120)
        },
        DocumentTypeDefinition {
            description: Some("Official transcript of records".into()),
            is_required: true,
            allows_multiple_files: true,
            max_files: 5,
            requires_translation: true,
            ..def("transcript", "Academic transcript", DocumentCategory::Academic, 30, &["pdf"], 10240)
        },
        DocumentTypeDefinition {
            is_required: true,
            requires_notarization: true,
            requires_translation: true,
            ..def("diploma", "Diploma", DocumentCategory::Academic, 40, &["pdf", "jpg", "jpeg"], 10240)
        },
        DocumentTypeDefinition {
            has_expiry_validation: true,
            expiry_warning_days: 60,
            is_visa_required: true,
            ..def("ielts", "IELTS test report", DocumentCategory::Language, 50, &["pdf"], 5120)
        },
        DocumentTypeDefinition {
            has_expiry_validation: true,
            expiry_warning_days: 60,
            is_visa_required: true,
            ..def("toefl", "TOEFL score report", DocumentCategory::Language, 60, &["pdf"], 5120)
        },
        DocumentTypeDefinition {
            description: Some("Bank statements covering the last three months".into()),
            is_required: true,
            is_visa_required: true,
            allows_multiple_files: true,
            max_files: 3,
            has_expiry_validation: true,
            ..def("bank_statement", "Bank statement", DocumentCategory::Financial, 70, &["pdf"], 10240)
        },
        DocumentTypeDefinition {
            allows_multiple_files: true,
            max_files: 3,
            is_visa_required: true,
            ..def("sponsorship_letter", "Sponsorship letter", DocumentCategory::Financial, 80, &["pdf"], 5120)
        },
        DocumentTypeDefinition {
            has_expiry_validation: true,
            is_visa_required: true,
            ..def("medical_certificate", "Medical certificate", DocumentCategory::Medical, 90, SCAN, 5120)
        },
        DocumentTypeDefinition {
            has_expiry_validation: true,
            expiry_warning_days: 60,
            ..def("visa", "Student visa", DocumentCategory::Visa, 100, SCAN, 5120)
        },
        DocumentTypeDefinition {
            allows_multiple_files: true,
            max_files: 3,
            ..def("recommendation_letter", "Recommendation letter", DocumentCategory::Recommendation, 110, &["pdf", "doc", "docx"], 5120)
        },
        DocumentTypeDefinition {
            requires_verification: false,
            ..def("cv", "Curriculum vitae", DocumentCategory::Experience, 120, &["pdf", "doc", "docx"], 5120)
        },
        DocumentTypeDefinition {
            requires_verification: false,
            ..def("personal_statement", "Personal statement", DocumentCategory::Personal, 130, &["pdf", "doc", "docx"], 5120)
        },
        DocumentTypeDefinition {
            requires_verification: false,
            ..def("passport_photo", "Passport photo", DocumentCategory::Personal, 140, &["jpg", "jpeg", "png"], 2048)
        },
        DocumentTypeDefinition {
            has_expiry_validation: true,
            ..def("travel_insurance", "Travel insurance", DocumentCategory::Travel, 150, &["pdf"], 5120)
        },
        def("accommodation_proof", "Proof of accommodation", DocumentCategory::Accommodation, 160, &["pdf"], 5120),
    ]
}
