//! Imports against a destination that refuses to persist.
//!
//! These tests verify:
//! - Refused saves surface as errors naming the field
//! - Nothing is handed to `after_import` when the save fails
//! - A Neo block type whose layout cannot be saved is dropped
//! - Layouts staged for a field that is never saved are removed again

mod test_helpers;

use fieldport::{
    field_types, BlockTypeDef, CompositeRepository, FieldContext, FieldDef, FieldGroup, FieldLayout,
    FieldMigration, FieldModel, FieldRepository, ItemKey, LiveBlockType, LiveField,
    MigrationConfig, MigrationError, MigrationHooks, NeoBlockType, NeoGroup, RecordId, SaveError,
    SourceKind, SourceLookup, SourceRecord, SourceRepository,
};
use fieldport_site::Site;
use test_helpers::text;

/// Wraps a [`Site`] and fails the saves it is told to.
#[derive(Default)]
struct Refusing {
    site: Site,
    field: Option<SaveError>,
    group: Option<SaveError>,
    layout: Option<SaveError>,
}

impl FieldRepository for Refusing {
    fn field_by_id(&self, id: RecordId) -> Option<LiveField> {
        self.site.field_by_id(id)
    }

    fn field_by_handle(&self, handle: &str, context: &FieldContext) -> Option<LiveField> {
        self.site.field_by_handle(handle, context)
    }

    fn fields_in_context(&self, context: &FieldContext) -> Vec<LiveField> {
        self.site.fields_in_context(context)
    }

    fn group_by_id(&self, id: RecordId) -> Option<FieldGroup> {
        self.site.group_by_id(id)
    }

    fn group_by_name(&self, name: &str) -> Option<FieldGroup> {
        self.site.group_by_name(name)
    }

    fn field_layout(&self, id: RecordId) -> Option<FieldLayout> {
        self.site.field_layout(id)
    }

    fn save_group(&mut self, name: &str) -> Result<FieldGroup, SaveError> {
        match &self.group {
            Some(err) => Err(err.clone()),
            None => self.site.save_group(name),
        }
    }

    fn save_field(&mut self, model: &FieldModel) -> Result<RecordId, SaveError> {
        match &self.field {
            Some(err) => Err(err.clone()),
            None => self.site.save_field(model),
        }
    }

    fn save_field_layout(&mut self, layout: &FieldLayout) -> Result<RecordId, SaveError> {
        match &self.layout {
            Some(err) => Err(err.clone()),
            None => self.site.save_field_layout(layout),
        }
    }

    fn delete_field_layout(&mut self, id: RecordId) -> Result<(), SaveError> {
        self.site.delete_field_layout(id)
    }
}

impl CompositeRepository for Refusing {
    fn matrix_block_types(&self, field_id: RecordId) -> Vec<LiveBlockType> {
        self.site.matrix_block_types(field_id)
    }

    fn super_table_block_types(&self, field_id: RecordId) -> Vec<LiveBlockType> {
        self.site.super_table_block_types(field_id)
    }

    fn neo_block_types(&self, field_id: RecordId) -> Vec<NeoBlockType> {
        self.site.neo_block_types(field_id)
    }

    fn neo_groups(&self, field_id: RecordId) -> Vec<NeoGroup> {
        self.site.neo_groups(field_id)
    }
}

impl SourceRepository for Refusing {
    fn find_source(&self, kind: SourceKind, lookup: SourceLookup<'_>) -> Option<SourceRecord> {
        self.site.find_source(kind, lookup)
    }

    fn root_folder(&self, volume_id: RecordId) -> Option<SourceRecord> {
        self.site.root_folder(volume_id)
    }
}

#[derive(Default)]
struct Saved {
    ids: Vec<RecordId>,
    veto: bool,
}

impl MigrationHooks for Saved {
    fn before_import(&mut self, _model: &mut FieldModel, _def: &FieldDef) -> Result<(), String> {
        if self.veto {
            Err("not today".into())
        } else {
            Ok(())
        }
    }

    fn after_import(&mut self, id: RecordId, _model: &FieldModel, _def: &FieldDef) {
        self.ids.push(id);
    }
}

fn migration() -> FieldMigration<Saved> {
    FieldMigration::with_hooks(MigrationConfig::default(), Saved::default())
}

/// A Neo field with one block type laid out over `summary`.
fn builder() -> FieldDef {
    let mut block = BlockTypeDef::new(ItemKey::Pending(1), "Text", "text");
    block
        .field_layout
        .insert("Content".into(), vec!["summary".into()]);
    FieldDef::new("builder", "Builder", field_types::NEO).with_block_type(block)
}

fn with_summary(dest: &mut Refusing) {
    dest.site.add_field("Common", text("summary")).unwrap();
}

#[test_log::test]
fn rejected_save_names_the_field() {
    let mut migration = migration();
    let mut dest = Refusing {
        field: Some(SaveError::Rejected("read-only".into())),
        ..Default::default()
    };

    let err = migration.import(&mut dest, text("summary")).unwrap_err();

    assert_eq!(
        err,
        MigrationError::SaveFailed {
            handle: "summary".into(),
            reason: "read-only".into(),
        }
    );
    assert!(err.to_string().contains("summary"));
    assert_eq!(migration.report().failures().count(), 1);
    assert!(migration.hooks().ids.is_empty());
    assert!(dest.site.fields().is_empty());
}

#[test_log::test]
fn destination_validation_is_a_validation_failure() {
    let mut migration = migration();
    let mut dest = Refusing {
        field: Some(SaveError::Validation(vec![
            "Handle is reserved.".into(),
            "Name is too long.".into(),
        ])),
        ..Default::default()
    };

    let err = migration.import(&mut dest, text("title")).unwrap_err();

    assert!(matches!(err, MigrationError::ValidationFailed { ref handle, .. } if handle == "title"));
    assert_eq!(
        err.to_string(),
        "error importing title field: Handle is reserved.; Name is too long."
    );
    assert_eq!(migration.report().failures().count(), 1);
    assert!(migration.hooks().ids.is_empty());
}

#[test_log::test]
fn group_that_cannot_be_created_aborts_the_field() {
    let mut migration = migration();
    let mut dest = Refusing {
        group: Some(SaveError::Rejected("groups are locked".into())),
        ..Default::default()
    };

    let err = migration
        .import(&mut dest, text("summary").with_group("Marketing"))
        .unwrap_err();

    assert_eq!(
        err,
        MigrationError::GroupSaveFailed {
            name: "Marketing".into(),
            reason: "groups are locked".into(),
        }
    );
    assert!(err.to_string().contains("Marketing"));
    assert_eq!(migration.report().failures().count(), 1);
    assert!(migration.hooks().ids.is_empty());
    assert!(dest.site.fields().is_empty());
}

#[test_log::test]
fn block_type_without_a_layout_is_dropped() {
    let mut migration = migration();
    let mut dest = Refusing {
        layout: Some(SaveError::Rejected("layouts are locked".into())),
        ..Default::default()
    };
    with_summary(&mut dest);

    let id = migration.import(&mut dest, builder()).unwrap();

    assert!(dest.site.neo_block_types(id).is_empty());
    assert!(dest.site.layouts().is_empty());
    let messages = migration.report().messages();
    assert_eq!(
        messages,
        ["could not save field layout for block type text: layouts are locked"]
    );
    assert_eq!(migration.report().failures().count(), 0);
    assert_eq!(migration.hooks().ids, [id]);
}

#[test_log::test]
fn layouts_of_a_refused_field_are_removed() {
    let mut migration = migration();
    let mut dest = Refusing {
        field: Some(SaveError::Rejected("read-only".into())),
        ..Default::default()
    };
    with_summary(&mut dest);

    assert!(migration.import(&mut dest, builder()).is_err());

    assert!(dest.site.layouts().is_empty());
    assert!(dest
        .site
        .field_by_handle("builder", &FieldContext::Global)
        .is_none());
}

#[test_log::test]
fn layouts_of_a_vetoed_field_are_removed() {
    let mut migration = FieldMigration::with_hooks(
        MigrationConfig::default(),
        Saved {
            veto: true,
            ..Default::default()
        },
    );
    let mut dest = Refusing::default();
    with_summary(&mut dest);

    let err = migration.import(&mut dest, builder()).unwrap_err();

    assert_eq!(err.to_string(), "error importing builder field: not today");
    assert!(dest.site.layouts().is_empty());
    assert!(migration.hooks().ids.is_empty());
}

#[test_log::test]
fn layouts_of_an_existing_field_survive_a_refused_update() {
    let mut migration = migration();
    let mut dest = Refusing::default();
    with_summary(&mut dest);
    let id = migration.import(&mut dest, builder()).unwrap();
    let layouts = dest.site.layouts().to_vec();
    assert_eq!(layouts.len(), 1);

    dest.field = Some(SaveError::Rejected("read-only".into()));
    assert!(migration.import(&mut dest, builder()).is_err());

    assert_eq!(dest.site.layouts(), &layouts[..]);
    let live = dest.site.neo_block_types(id);
    assert_eq!(live[0].field_layout_id, layouts[0].id);
}
