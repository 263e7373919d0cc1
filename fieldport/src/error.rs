//! Error types for field migration

use thiserror::Error;

use crate::key::RecordId;

/// Result type for migration operations
pub type Result<T> = std::result::Result<T, MigrationError>;

/// Severity levels for migration errors.
///
/// A `Warning` never stops the field it was raised for; an `Error` aborts the
/// current field but leaves the caller free to continue with the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The affected setting was degraded, the field itself carries on
    Warning,
    /// The current field could not be exported or imported
    Error,
}

/// Trait for error types that have severity levels
pub trait Severity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

/// The kind of external entity a reference in field settings points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    AssetSource,
    AssetVolume,
    ImageTransform,
    Category,
    Section,
    Tag,
    UserGroup,
    LayoutField,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ReferenceKind::AssetSource => "Asset source",
            ReferenceKind::AssetVolume => "Asset volume",
            ReferenceKind::ImageTransform => "Image transform",
            ReferenceKind::Category => "Category",
            ReferenceKind::Section => "Section",
            ReferenceKind::Tag => "Tag",
            ReferenceKind::UserGroup => "User Group",
            ReferenceKind::LayoutField => "Layout field",
        };
        f.write_str(label)
    }
}

/// Errors raised while exporting or importing a field
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MigrationError {
    /// Export target does not exist
    #[error("field not found by id: {id}")]
    FieldNotFound { id: RecordId },

    /// A handle or id embedded in settings could not be mapped
    #[error("{kind}: {handle} is not defined in system")]
    UnresolvableReference { kind: ReferenceKind, handle: String },

    /// The constructed model was rejected before or during save
    #[error("error importing {handle} field: {message}")]
    ValidationFailed { handle: String, message: String },

    /// Save returned failure without validation detail
    #[error("could not save the {handle} field: {reason}")]
    SaveFailed { handle: String, reason: String },

    /// The field group named by the document could not be created
    #[error("could not create field group '{name}': {reason}")]
    GroupSaveFailed { name: String, reason: String },

    /// A composite block type's field layout could not be persisted
    #[error("could not save field layout for block type {block_type}: {reason}")]
    LayoutSaveFailed { block_type: String, reason: String },
}

impl MigrationError {
    pub fn unresolvable(kind: ReferenceKind, handle: impl Into<String>) -> Self {
        Self::UnresolvableReference {
            kind,
            handle: handle.into(),
        }
    }

    pub fn validation(handle: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            handle: handle.into(),
            message: message.into(),
        }
    }
}

impl Severity for MigrationError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            MigrationError::UnresolvableReference { .. } | MigrationError::LayoutSaveFailed { .. } => {
                ErrorSeverity::Warning
            }
            MigrationError::FieldNotFound { .. }
            | MigrationError::ValidationFailed { .. }
            | MigrationError::SaveFailed { .. }
            | MigrationError::GroupSaveFailed { .. } => ErrorSeverity::Error,
        }
    }
}

/// Failure reported by the destination when persisting a record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SaveError {
    /// The destination rejected the record with validation messages
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),

    /// The destination refused the record for another reason
    #[error("{0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolvable_reference_names_handle() {
        let err = MigrationError::unresolvable(ReferenceKind::AssetSource, "missingVolume");
        assert_eq!(
            err.to_string(),
            "Asset source: missingVolume is not defined in system"
        );
        assert_eq!(err.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_validation_error() {
        let err = MigrationError::validation("body", "handle is reserved");
        assert!(err.to_string().contains("body"));
        assert!(err.to_string().contains("handle is reserved"));
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_save_error_joins_messages() {
        let err = SaveError::Validation(vec!["Name cannot be blank.".into(), "Handle is taken.".into()]);
        assert_eq!(err.to_string(), "Name cannot be blank.; Handle is taken.");
    }
}
