//! Error and manifest sink for a migration run.

use tracing::{error, warn};

use crate::error::{ErrorSeverity, MigrationError, Severity};

/// Issues and processed handles collected across a batch.
#[derive(Debug, Clone, Default)]
pub struct Report {
    errors: Vec<MigrationError>,
    manifest: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, err: MigrationError) {
        match err.severity() {
            ErrorSeverity::Warning => warn!("{}", err),
            ErrorSeverity::Error => error!("{}", err),
        }
        self.errors.push(err);
    }

    /// Record that a handle was processed.
    pub fn add_manifest(&mut self, handle: impl Into<String>) {
        self.manifest.push(handle.into());
    }

    pub fn errors(&self) -> &[MigrationError] {
        &self.errors
    }

    pub fn manifest(&self) -> &[String] {
        &self.manifest
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors that aborted a field, as opposed to degraded settings.
    pub fn failures(&self) -> impl Iterator<Item = &MigrationError> {
        self.errors
            .iter()
            .filter(|e| e.severity() == ErrorSeverity::Error)
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
        self.manifest.clear();
    }
}
