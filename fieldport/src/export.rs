//! Live field to portable document.

use tracing::{debug, info};

use crate::config::MigrationConfig;
use crate::error::{MigrationError, Result};
use crate::hooks::MigrationHooks;
use crate::key::{ItemKey, RecordId};
use crate::live::{FieldContext, LiveField};
use crate::logging::Pretty;
use crate::migration::FieldMigration;
use crate::registry::FieldTypeRegistry;
use crate::repository::Destination;
use crate::resolver::Sources;
use crate::types::{FieldDef, TypeSettings};

/// State shared by one recursive export walk.
pub struct ExportCx<'a> {
    dest: &'a dyn Destination,
    registry: &'a FieldTypeRegistry,
    config: &'a MigrationConfig,
}

impl<'a> ExportCx<'a> {
    pub fn new(
        dest: &'a dyn Destination,
        registry: &'a FieldTypeRegistry,
        config: &'a MigrationConfig,
    ) -> Self {
        Self {
            dest,
            registry,
            config,
        }
    }

    pub fn dest(&self) -> &'a dyn Destination {
        self.dest
    }

    pub fn include_ids(&self) -> bool {
        self.config.include_ids
    }

    /// Key of the `ordinal`-th nested item (1-based) with live id `id`.
    pub fn key_for(&self, ordinal: u32, id: RecordId) -> ItemKey {
        if self.include_ids() {
            ItemKey::Existing(id)
        } else {
            ItemKey::Pending(ordinal)
        }
    }

    pub fn block_key(&self, uid: &str, id: RecordId) -> String {
        self.config.addressing.block_key(uid, id)
    }

    /// A top-level field with its group and searchability.
    pub fn top_level(&self, field: &LiveField) -> FieldDef {
        let mut def = flat_attributes(field);
        def.group = field
            .group_id
            .and_then(|id| self.dest.group_by_id(id))
            .map(|group| group.name);
        def.searchable = Some(field.searchable.unwrap_or(true));
        self.extract_composite(&mut def, field);
        def
    }

    /// A sub-field of a block type, keyed `key`.
    pub fn nested_field(&self, field: &LiveField, key: ItemKey) -> FieldDef {
        let mut def = flat_attributes(field);
        def.key = key;
        self.extract_composite(&mut def, field);
        def
    }

    /// Every field stored in `context`, keyed from `new1` in storage order.
    pub fn nested_fields(&self, context: &FieldContext) -> Vec<FieldDef> {
        (1..)
            .zip(self.dest.fields_in_context(context))
            .map(|(ordinal, field)| self.nested_field(&field, self.key_for(ordinal, field.id)))
            .collect()
    }

    fn extract_composite(&self, def: &mut FieldDef, field: &LiveField) {
        if let Some(composite) = self.registry.composite(&field.field_type) {
            composite.extract(self, def, field);
        }
    }
}

/// Attributes common to top-level and nested fields.
fn flat_attributes(field: &LiveField) -> FieldDef {
    FieldDef {
        key: ItemKey::NEW,
        group: None,
        name: field.name.clone(),
        handle: field.handle.clone(),
        instructions: field.instructions.clone(),
        translation_method: field.translation_method.clone(),
        translation_key_format: field.translation_key_format.clone(),
        required: field.required,
        searchable: None,
        field_type: field.field_type.clone(),
        settings: TypeSettings::from_values(field.settings.clone()),
    }
}

impl<H: MigrationHooks> FieldMigration<H> {
    /// Export the field with the given id.
    ///
    /// Nested keys are placeholders unless the configuration asks for ids.
    /// With `full_export` the finished record is offered to
    /// [`MigrationHooks::before_export`].
    pub fn export(
        &mut self,
        dest: &dyn Destination,
        id: RecordId,
        full_export: bool,
    ) -> Result<FieldDef> {
        let Some(field) = dest.field_by_id(id) else {
            let err = MigrationError::FieldNotFound { id };
            self.report.add_error(err.clone());
            return Err(err);
        };
        self.report.add_manifest(&field.handle);

        let cx = ExportCx::new(dest, &self.registry, &self.config);
        let mut def = cx.top_level(&field);

        let sources = Sources::new(dest, &self.config);
        self.registry.resolve_handles(&mut def, &sources);

        if full_export {
            def = self.hooks.before_export(&field, def);
        }

        info!(handle = %def.handle, "exported field");
        debug!("portable field: {}", Pretty(&def));
        Ok(def)
    }

    /// Export every top-level field in storage order.
    pub fn export_all(&mut self, dest: &dyn Destination, full_export: bool) -> Vec<FieldDef> {
        let ids: Vec<RecordId> = dest
            .fields_in_context(&FieldContext::Global)
            .iter()
            .map(|field| field.id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.export(dest, id, full_export).ok())
            .collect()
    }
}
