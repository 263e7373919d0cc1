//! The migration service.

use crate::config::MigrationConfig;
use crate::hooks::{MigrationHooks, NoHooks};
use crate::registry::FieldTypeRegistry;
use crate::report::Report;

/// Exports and imports fields one at a time against an explicit destination.
///
/// The service itself holds no destination state between calls; only the
/// [`Report`] accumulates across a batch.
///
/// ```ignore
/// let mut migration = FieldMigration::new(MigrationConfig::default());
/// let doc = migration.export(&source_site, field_id, false)?;
/// migration.import(&mut target_site, doc)?;
/// ```
#[derive(Debug)]
pub struct FieldMigration<H: MigrationHooks = NoHooks> {
    pub(crate) config: MigrationConfig,
    pub(crate) registry: FieldTypeRegistry,
    pub(crate) hooks: H,
    pub(crate) report: Report,
}

impl FieldMigration<NoHooks> {
    pub fn new(config: MigrationConfig) -> Self {
        Self::with_hooks(config, NoHooks)
    }
}

impl<H: MigrationHooks> FieldMigration<H> {
    pub fn with_hooks(config: MigrationConfig, hooks: H) -> Self {
        Self {
            config,
            registry: FieldTypeRegistry::with_builtin(),
            hooks,
            report: Report::new(),
        }
    }

    /// Replace the built-in field type registry.
    pub fn with_registry(mut self, registry: FieldTypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn registry_mut(&mut self) -> &mut FieldTypeRegistry {
        &mut self.registry
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Hand over the collected report and start a fresh one.
    pub fn take_report(&mut self) -> Report {
        std::mem::take(&mut self.report)
    }
}
