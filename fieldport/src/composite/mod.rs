//! Composite field types.
//!
//! A composite field owns block types, and block types own sub-fields. Each
//! variant knows how to read that structure out of the destination, how to
//! reconcile an incoming document against it, and what it needs before the
//! field can be saved.

mod matrix;
mod neo;
mod super_table;

pub use matrix::MatrixType;
pub use neo::NeoType;
pub use super_table::SuperTableType;

use crate::export::ExportCx;
use crate::import::{MergeCx, SaveCx};
use crate::key::RecordId;
use crate::live::LiveField;
use crate::types::FieldDef;

pub trait CompositeType: Send + Sync {
    /// Append the nested structure of `field` to `def`.
    fn extract(&self, cx: &ExportCx<'_>, def: &mut FieldDef, field: &LiveField);

    /// Re-key incoming block types and sub-fields that already exist under
    /// `existing`. Only called when the types match.
    fn merge(&self, cx: &MergeCx<'_>, def: &mut FieldDef, existing: &LiveField);

    /// Whether reference resolution descends into block sub-fields.
    fn resolves_nested(&self) -> bool {
        true
    }

    /// Last step before save, once all references hold live keys.
    fn prepare(&self, _cx: &mut SaveCx<'_>, _def: &mut FieldDef) {}

    /// Field layouts persisted by [`CompositeType::prepare`] for `def`.
    /// They are removed again when the field itself is not saved.
    fn staged_layouts(&self, _def: &FieldDef) -> Vec<RecordId> {
        Vec::new()
    }
}
