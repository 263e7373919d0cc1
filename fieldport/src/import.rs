//! Portable document to live field.
//!
//! An import looks the field up by handle, reconciles the document against
//! what already exists, resolves handles back to live keys and saves.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::config::MigrationConfig;
use crate::error::{MigrationError, Result, SaveError};
use crate::hooks::MigrationHooks;
use crate::key::{ItemKey, RecordId};
use crate::live::{FieldContext, FieldGroup, LiveField};
use crate::logging::Pretty;
use crate::migration::FieldMigration;
use crate::registry::FieldTypeRegistry;
use crate::report::Report;
use crate::repository::Destination;
use crate::resolver::Sources;
use crate::types::{FieldDef, FieldModel};

/// Read-only view of the destination used while reconciling.
pub struct MergeCx<'a> {
    dest: &'a dyn Destination,
    registry: &'a FieldTypeRegistry,
    config: &'a MigrationConfig,
}

impl<'a> MergeCx<'a> {
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

    pub fn block_key(&self, uid: &str, id: RecordId) -> String {
        self.config.addressing.block_key(uid, id)
    }

    /// Adopt the id of `existing` and, when the type is unchanged, reconcile
    /// nested structure. A changed type replaces the field wholesale.
    pub fn merge_updates(&self, def: &mut FieldDef, existing: &LiveField) {
        def.key = ItemKey::Existing(existing.id);
        if def.field_type != existing.field_type {
            debug!(
                handle = %def.handle,
                from = %existing.field_type,
                to = %def.field_type,
                "field type changed, replacing"
            );
            return;
        }
        if let Some(composite) = self.registry.composite(&existing.field_type) {
            composite.merge(self, def, existing);
        }
    }

    /// Match incoming sub-fields against those stored in `context` by handle.
    /// Unmatched sub-fields keep their placeholder key.
    pub fn merge_fields(&self, fields: &mut [FieldDef], context: &FieldContext) {
        let existing = self.dest.fields_in_context(context);
        for field in fields.iter_mut() {
            if let Some(found) = existing.iter().find(|e| e.handle == field.handle) {
                self.merge_updates(field, found);
            }
        }
    }
}

/// Mutable access to the destination for the last step before save.
pub struct SaveCx<'a> {
    pub dest: &'a mut dyn Destination,
    pub report: &'a mut Report,
}

fn is_identifier(handle: &str) -> bool {
    let mut chars = handle.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_field(def: &FieldDef) -> std::result::Result<(), String> {
    if !is_identifier(&def.handle) {
        return Err(format!(
            "handle \"{}\" must start with a letter and contain only letters, numbers and underscores",
            def.handle
        ));
    }
    if def.name.trim().is_empty() {
        return Err(format!("{}: name cannot be blank", def.handle));
    }
    if def.field_type.trim().is_empty() {
        return Err(format!("{}: type cannot be blank", def.handle));
    }

    let mut block_handles = HashSet::new();
    for block in &def.settings.block_types {
        if !block.handle.is_empty() && !block_handles.insert(block.handle.as_str()) {
            return Err(format!(
                "{}: block type handle \"{}\" is used more than once",
                def.handle, block.handle
            ));
        }
        let mut field_handles = HashSet::new();
        for field in &block.fields {
            if !field_handles.insert(field.handle.as_str()) {
                return Err(format!(
                    "{}: field handle \"{}\" is used more than once in one block type",
                    def.handle, field.handle
                ));
            }
            check_field(field)?;
        }
    }
    Ok(())
}

/// Structural checks a document must pass before anything is written.
pub fn validate(def: &FieldDef) -> Result<()> {
    check_field(def).map_err(|message| MigrationError::validation(&def.handle, message))
}

/// Find a field group by exact name or create it.
fn field_group(dest: &mut dyn Destination, name: &str) -> Result<FieldGroup> {
    if let Some(group) = dest.group_by_name(name) {
        return Ok(group);
    }
    info!(group = name, "creating field group");
    dest.save_group(name)
        .map_err(|err| MigrationError::GroupSaveFailed {
            name: name.to_string(),
            reason: err.to_string(),
        })
}

impl<H: MigrationHooks> FieldMigration<H> {
    /// Import one portable field, creating it or merging into the field with
    /// the same handle. Failures are returned and also recorded in the report.
    pub fn import(&mut self, dest: &mut dyn Destination, def: FieldDef) -> Result<RecordId> {
        let result = self.import_field(dest, def);
        if let Err(err) = &result {
            self.report.add_error(err.clone());
        }
        result
    }

    fn import_field(&mut self, dest: &mut dyn Destination, mut def: FieldDef) -> Result<RecordId> {
        let handle = def.handle.clone();
        let document = def.clone();
        info!(handle = %handle, "importing field");
        def.settings.forget_ids();

        match dest.field_by_handle(&handle, &FieldContext::Global) {
            Some(existing) => {
                debug!(handle = %handle, id = existing.id, "merging into existing field");
                MergeCx::new(&*dest, &self.registry, &self.config).merge_updates(&mut def, &existing);
            }
            None => def.key = ItemKey::NEW,
        }

        let mut model = self.create_model(dest, def)?;
        let saved = self
            .hooks
            .before_import(&mut model, &document)
            .map_err(|message| MigrationError::validation(&handle, message))
            .and_then(|()| {
                debug!("saving model: {}", Pretty(&model));
                dest.save_field(&model).map_err(|err| match err {
                    SaveError::Validation(messages) => {
                        MigrationError::validation(&handle, messages.join("; "))
                    }
                    SaveError::Rejected(reason) => MigrationError::SaveFailed {
                        handle: handle.clone(),
                        reason,
                    },
                })
            });
        let id = match saved {
            Ok(id) => id,
            Err(err) => {
                self.discard_layouts(dest, &model);
                return Err(err);
            }
        };

        self.hooks.after_import(id, &model, &document);
        info!(handle = %handle, id, "imported field");
        Ok(id)
    }

    /// Remove the field layouts staged for a model that was never saved.
    fn discard_layouts(&self, dest: &mut dyn Destination, model: &FieldModel) {
        let Some(composite) = self.registry.composite(&model.def.field_type) else {
            return;
        };
        for id in composite.staged_layouts(&model.def) {
            match dest.delete_field_layout(id) {
                Ok(()) => debug!(layout = id, "discarded field layout"),
                Err(err) => warn!(layout = id, "could not discard field layout: {err}"),
            }
        }
    }

    /// Turn a reconciled document into a saveable model: validate it, find
    /// or create its group, resolve every handle to a live key and run the
    /// composite pre-save step.
    pub fn create_model(&mut self, dest: &mut dyn Destination, mut def: FieldDef) -> Result<FieldModel> {
        validate(&def)?;

        let group_name = def
            .group
            .clone()
            .unwrap_or_else(|| self.config.default_group.clone());
        let group = field_group(dest, &group_name)?;
        def.group = Some(group_name);
        def.searchable = Some(def.searchable.unwrap_or(true));

        let sources = Sources::new(&*dest, &self.config);
        self.registry.resolve_ids(&mut def, &sources, &mut self.report);

        if let Some(composite) = self.registry.composite(&def.field_type) {
            let mut cx = SaveCx {
                dest: &mut *dest,
                report: &mut self.report,
            };
            composite.prepare(&mut cx, &mut def);
        }

        Ok(FieldModel {
            id: def.key.existing_id(),
            group_id: group.id,
            def,
        })
    }
}
