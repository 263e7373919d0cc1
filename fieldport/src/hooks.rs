//! Extension points around export and import.

use crate::key::RecordId;
use crate::live::LiveField;
use crate::types::{FieldDef, FieldModel};

/// Callbacks a host can register on a migration. Every method defaults to a
/// pass-through.
pub trait MigrationHooks {
    /// Called with the finished record of a full export. The returned record
    /// replaces it.
    fn before_export(&mut self, _field: &LiveField, def: FieldDef) -> FieldDef {
        def
    }

    /// Called with the resolved model just before it is saved. An `Err`
    /// aborts the field with the given validation message.
    fn before_import(&mut self, _model: &mut FieldModel, _def: &FieldDef) -> Result<(), String> {
        Ok(())
    }

    /// Called after a successful save.
    fn after_import(&mut self, _id: RecordId, _model: &FieldModel, _def: &FieldDef) {}
}

/// No-op hooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl MigrationHooks for NoHooks {}
