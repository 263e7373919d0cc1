//! Collaborator traits the engine needs from a host system.
//!
//! Every export and import call receives the destination explicitly. Lookups
//! that may legitimately find nothing return `Option`; only saves can fail.

use crate::error::SaveError;
use crate::key::RecordId;
use crate::live::{
    FieldContext, FieldGroup, FieldLayout, LiveBlockType, LiveField, NeoBlockType, NeoGroup,
    SourceKind, SourceLookup, SourceRecord,
};
use crate::types::FieldModel;

/// Fields, field groups and field layouts.
pub trait FieldRepository {
    fn field_by_id(&self, id: RecordId) -> Option<LiveField>;

    /// Look up a field by handle within one context.
    fn field_by_handle(&self, handle: &str, context: &FieldContext) -> Option<LiveField>;

    /// All fields stored in a context, in storage order.
    fn fields_in_context(&self, context: &FieldContext) -> Vec<LiveField>;

    fn group_by_id(&self, id: RecordId) -> Option<FieldGroup>;

    /// Exact, case-sensitive name match.
    fn group_by_name(&self, name: &str) -> Option<FieldGroup>;

    fn field_layout(&self, id: RecordId) -> Option<FieldLayout>;

    fn save_group(&mut self, name: &str) -> Result<FieldGroup, SaveError>;

    /// Insert (`model.id == None`) or update a field together with its nested
    /// block types and sub-fields. Returns the field id.
    fn save_field(&mut self, model: &FieldModel) -> Result<RecordId, SaveError>;

    fn save_field_layout(&mut self, layout: &FieldLayout) -> Result<RecordId, SaveError>;

    fn delete_field_layout(&mut self, id: RecordId) -> Result<(), SaveError>;
}

/// Nested structure of composite field types, by owning field id.
pub trait CompositeRepository {
    fn matrix_block_types(&self, field_id: RecordId) -> Vec<LiveBlockType>;

    fn super_table_block_types(&self, field_id: RecordId) -> Vec<LiveBlockType>;

    fn neo_block_types(&self, field_id: RecordId) -> Vec<NeoBlockType>;

    fn neo_groups(&self, field_id: RecordId) -> Vec<NeoGroup>;
}

/// Entities referenced from field settings.
pub trait SourceRepository {
    fn find_source(&self, kind: SourceKind, lookup: SourceLookup<'_>) -> Option<SourceRecord>;

    /// The top-level folder of a volume.
    fn root_folder(&self, volume_id: RecordId) -> Option<SourceRecord>;
}

/// Everything a migration run needs from its destination.
pub trait Destination: FieldRepository + CompositeRepository + SourceRepository {}

impl<T> Destination for T where T: FieldRepository + CompositeRepository + SourceRepository {}
