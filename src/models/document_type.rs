//! Document type catalog models and file policy checks.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::document_type;
use crate::error::{AppError, AppResult};

/// Document category enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Academic,
    Financial,
    Identity,
    Medical,
    Visa,
    Language,
    Experience,
    Recommendation,
    Personal,
    Travel,
    Accommodation,
    Other,
}

impl DocumentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Financial => "financial",
            Self::Identity => "identity",
            Self::Medical => "medical",
            Self::Visa => "visa",
            Self::Language => "language",
            Self::Experience => "experience",
            Self::Recommendation => "recommendation",
            Self::Personal => "personal",
            Self::Travel => "travel",
            Self::Accommodation => "accommodation",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "academic" => Some(Self::Academic),
            "financial" => Some(Self::Financial),
            "identity" => Some(Self::Identity),
            "medical" => Some(Self::Medical),
            "visa" => Some(Self::Visa),
            "language" => Some(Self::Language),
            "experience" => Some(Self::Experience),
            "recommendation" => Some(Self::Recommendation),
            "personal" => Some(Self::Personal),
            "travel" => Some(Self::Travel),
            "accommodation" => Some(Self::Accommodation),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Document type definition as supplied by catalog configuration.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DocumentTypeDefinition {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: DocumentCategory,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub sort_order: i32,
    /// Lowercase extensions without the leading dot.
    pub allowed_extensions: Vec<String>,
    /// Maximum size of one file, in kilobytes.
    pub max_file_size: i64,
    #[serde(default)]
    pub allows_multiple_files: bool,
    #[serde(default = "default_max_files")]
    pub max_files: i32,
    #[serde(default)]
    pub is_visa_required: bool,
    #[serde(default)]
    pub has_expiry_validation: bool,
    #[serde(default = "default_warning_days")]
    pub expiry_warning_days: i32,
    #[serde(default)]
    pub requires_verification: bool,
    #[serde(default)]
    pub requires_notarization: bool,
    #[serde(default)]
    pub requires_translation: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_files() -> i32 {
    1
}

fn default_warning_days() -> i32 {
    30
}

impl DocumentTypeDefinition {
    /// Canonicalize extensions and the file cap.
    ///
    /// `max_files` is forced to 1 when multiple files are not allowed.
    pub fn normalized(mut self) -> Self {
        self.key = self.key.trim().to_string();
        self.allowed_extensions = self
            .allowed_extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .filter(|ext| !ext.is_empty())
            .collect();
        self.allowed_extensions.sort();
        self.allowed_extensions.dedup();
        self.max_files = if self.allows_multiple_files {
            self.max_files.max(1)
        } else {
            1
        };
        self.expiry_warning_days = self.expiry_warning_days.max(0);
        self
    }

    /// Reject definitions that could never accept a file.
    pub fn validate(&self) -> AppResult<()> {
        if self.key.is_empty() {
            return Err(AppError::Validation("document type key is required".into()));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "document type '{}' has no name",
                self.key
            )));
        }
        if self.allowed_extensions.is_empty() {
            return Err(AppError::Validation(format!(
                "document type '{}' allows no file extensions",
                self.key
            )));
        }
        if self.max_file_size <= 0 {
            return Err(AppError::Validation(format!(
                "document type '{}' has a non-positive max_file_size",
                self.key
            )));
        }
        Ok(())
    }
}

/// Document type with its file policy.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DocumentType {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: DocumentCategory,
    pub is_active: bool,
    pub is_required: bool,
    pub sort_order: i32,
    pub allowed_extensions: Vec<String>,
    /// Kilobytes.
    pub max_file_size: i64,
    pub allows_multiple_files: bool,
    pub max_files: i32,
    pub is_visa_required: bool,
    pub has_expiry_validation: bool,
    pub expiry_warning_days: i32,
    pub requires_verification: bool,
    pub requires_notarization: bool,
    pub requires_translation: bool,
}

impl DocumentType {
    /// Size cap in bytes.
    pub fn max_file_size_bytes(&self) -> i64 {
        self.max_file_size.saturating_mul(1024)
    }

    /// File cap, never above 1 for single-file types.
    pub fn file_limit(&self) -> u64 {
        if self.allows_multiple_files {
            self.max_files.max(1) as u64
        } else {
            1
        }
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        let ext = normalize_extension(extension);
        self.allowed_extensions.iter().any(|allowed| *allowed == ext)
    }

    /// Check extension and size of a candidate file.
    pub fn validate_file(&self, file_name: &str, size_bytes: i64) -> AppResult<String> {
        let extension = file_extension(file_name).ok_or_else(|| {
            AppError::Validation(format!("file '{}' has no extension", file_name))
        })?;

        if !self.allows_extension(&extension) {
            return Err(AppError::Validation(format!(
                "file type '.{}' is not allowed for {} (allowed: {})",
                extension,
                self.name,
                self.allowed_extensions.join(", ")
            )));
        }

        if size_bytes <= 0 {
            return Err(AppError::Validation(format!("file '{}' is empty", file_name)));
        }

        if size_bytes > self.max_file_size_bytes() {
            return Err(AppError::Validation(format!(
                "file '{}' is {} bytes, exceeding the {} KB limit for {}",
                file_name, size_bytes, self.max_file_size, self.name
            )));
        }

        Ok(extension)
    }
}

impl TryFrom<document_type::Model> for DocumentType {
    type Error = AppError;

    fn try_from(m: document_type::Model) -> Result<Self, Self::Error> {
        let category = DocumentCategory::parse(&m.category).ok_or_else(|| {
            AppError::Database(format!(
                "document type {} has unknown category '{}'",
                m.key, m.category
            ))
        })?;
        let allowed_extensions: Vec<String> = serde_json::from_value(m.allowed_extensions)
            .map_err(|e| {
                AppError::Database(format!(
                    "document type {} has malformed allowed_extensions: {}",
                    m.key, e
                ))
            })?;

        Ok(DocumentType {
            id: m.id,
            key: m.key,
            name: m.name,
            description: m.description,
            category,
            is_active: m.is_active && m.deleted_at.is_none(),
            is_required: m.is_required,
            sort_order: m.sort_order,
            allowed_extensions,
            max_file_size: m.max_file_size,
            allows_multiple_files: m.allows_multiple_files,
            max_files: m.max_files,
            is_visa_required: m.is_visa_required,
            has_expiry_validation: m.has_expiry_validation,
            expiry_warning_days: m.expiry_warning_days,
            requires_verification: m.requires_verification,
            requires_notarization: m.requires_notarization,
            requires_translation: m.requires_translation,
        })
    }
}

/// Lowercase an extension and strip any leading dot.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Extract the normalized extension from a file name.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(normalize_extension(ext))
}
