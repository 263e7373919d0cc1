//! Export and import between in-memory sites.
//!
//! These tests verify:
//! - Exporting and re-importing a field leaves its settings unchanged
//! - Re-importing keeps ids of fields, block types and sub-fields
//! - Unmatched blocks are inserted next to untouched existing ones
//! - Reference tokens are rewritten for the target site
//! - Dangling references are reported and dropped

mod test_helpers;

use fieldport::{
    field_types, AddressingScheme, BlockTypeDef, CompositeRepository, FieldContext, FieldDef,
    FieldMigration, FieldModel, FieldRepository, ItemKey, LiveField, MigrationConfig,
    MigrationError, MigrationHooks, RecordId, SectionType, SourceKind, SourceRecord,
};
use fieldport_site::Site;
use serde_json::json;
use test_helpers::{body, global, image, nested, site_with_images, text};

fn migration() -> FieldMigration {
    FieldMigration::new(MigrationConfig::default())
}

#[test_log::test]
fn round_trip_leaves_settings_unchanged() {
    let mut migration = migration();
    let mut source = site_with_images();
    let id = migration.import(&mut source, body()).unwrap();
    let exported = migration.export(&source, id, false).unwrap();

    assert_eq!(exported.settings, body().settings);
    assert_eq!(exported.group.as_deref(), Some("Content"));
    assert_eq!(exported.searchable, Some(true));

    let mut target = site_with_images();
    let target_id = migration.import(&mut target, exported.clone()).unwrap();
    let again = migration.export(&target, target_id, false).unwrap();

    assert_eq!(again, exported);
    assert!(!migration.report().has_errors(), "{:?}", migration.report().messages());
    assert_eq!(migration.report().manifest(), ["body", "body"]);
}

#[test_log::test]
fn reimport_keeps_every_id() {
    let mut migration = migration();
    let mut site = site_with_images();
    let first = migration.import(&mut site, body()).unwrap();
    let blocks = site.matrix_block_types(first);
    let text_block = &blocks[0];
    let copy = site
        .field_by_handle("copy", &FieldContext::MatrixBlockType(text_block.uid.clone()))
        .unwrap();
    let field_count = site.fields().len();

    let second = migration.import(&mut site, body()).unwrap();

    assert_eq!(first, second);
    assert_eq!(site.matrix_block_types(second), blocks);
    let copy_again = site
        .field_by_handle("copy", &FieldContext::MatrixBlockType(text_block.uid.clone()))
        .unwrap();
    assert_eq!(copy_again.id, copy.id);
    assert_eq!(site.fields().len(), field_count);
}

#[test_log::test]
fn exported_ids_address_existing_records() {
    let mut migration = FieldMigration::new(MigrationConfig {
        include_ids: true,
        ..Default::default()
    });
    let mut site = site_with_images();
    let id = migration.import(&mut site, body()).unwrap();
    let doc = migration.export(&site, id, false).unwrap();

    let block = &doc.settings.block_types[0];
    let live_block = site.matrix_block_types(id)[0].clone();
    assert_eq!(block.key, ItemKey::Existing(live_block.id));
    let copy = site
        .field_by_handle("copy", &FieldContext::MatrixBlockType(live_block.uid.clone()))
        .unwrap();
    assert_eq!(block.fields[0].key, ItemKey::Existing(copy.id));

    let json = serde_json::to_value(&doc).unwrap();
    let key = live_block.id.to_string();
    assert!(json["typesettings"]["blockTypes"][&key]["fields"][copy.id.to_string()].is_object());
}

#[test_log::test]
fn unmatched_block_is_inserted_beside_existing() {
    let mut migration = migration();
    let mut site = site_with_images();
    let id = migration.import(&mut site, body()).unwrap();
    let before = site.matrix_block_types(id);

    let extended = body().with_block_type(
        BlockTypeDef::new(ItemKey::Pending(3), "Gallery", "gallery")
            .with_field(nested(1, image("photos", "images"))),
    );
    migration.import(&mut site, extended).unwrap();

    let after = site.matrix_block_types(id);
    assert_eq!(after.len(), 3);
    assert_eq!(&after[..2], &before[..]);
    assert_eq!(after[2].handle, "gallery");
    assert!(!before.iter().any(|b| b.id == after[2].id));
    let photos = site.fields_in_context(&FieldContext::MatrixBlockType(after[2].uid.clone()));
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].handle, "photos");
}

#[test_log::test]
fn blocks_missing_from_the_document_are_removed() {
    let mut migration = migration();
    let mut site = site_with_images();
    let id = migration.import(&mut site, body()).unwrap();

    let mut trimmed = body();
    trimmed.settings.block_types.truncate(1);
    migration.import(&mut site, trimmed).unwrap();

    let blocks = site.matrix_block_types(id);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].handle, "text");
    assert!(site.fields().iter().all(|f| f.handle != "quote"));
}

#[test_log::test]
fn foreign_ids_never_address_live_records() {
    let mut migration = migration();
    let mut site = site_with_images();
    let id = migration.import(&mut site, body()).unwrap();
    let before = site.matrix_block_types(id);
    let text_context = FieldContext::MatrixBlockType(before[0].uid.clone());
    let copy = site.field_by_handle("copy", &text_context).unwrap();

    // Keys from another system, one of them equal to a live sibling's id.
    let mut doc = body();
    doc.settings.block_types[0].key = ItemKey::Existing(90);
    doc.settings.block_types[1].key = ItemKey::Existing(91);
    doc.settings.block_types.insert(
        1,
        BlockTypeDef::new(ItemKey::Existing(before[1].id), "Gallery", "gallery")
            .with_field(text("photos").with_key(ItemKey::Existing(copy.id))),
    );
    migration.import(&mut site, doc).unwrap();

    let after = site.matrix_block_types(id);
    let handles: Vec<&str> = after.iter().map(|b| b.handle.as_str()).collect();
    assert_eq!(handles, ["text", "gallery", "quote"]);
    assert_eq!(after[0].id, before[0].id);
    assert_eq!(after[2].id, before[1].id);
    assert!(!before.iter().any(|b| b.id == after[1].id));

    assert_eq!(site.field_by_handle("copy", &text_context).unwrap().id, copy.id);
    let photos = site.fields_in_context(&FieldContext::MatrixBlockType(after[1].uid.clone()));
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].handle, "photos");
    assert_ne!(photos[0].id, copy.id);
}

#[test_log::test]
fn new_field_ignores_ids_of_other_fields() {
    let mut migration = migration();
    let mut site = site_with_images();
    let body_id = migration.import(&mut site, body()).unwrap();
    let body_blocks = site.matrix_block_types(body_id);
    let text_context = FieldContext::MatrixBlockType(body_blocks[0].uid.clone());
    let copy = site.field_by_handle("copy", &text_context).unwrap();

    let layout = FieldDef::new("layout", "Layout", field_types::MATRIX).with_block_type(
        BlockTypeDef::new(ItemKey::Existing(body_blocks[0].id), "Hero", "hero")
            .with_field(text("headline").with_key(ItemKey::Existing(copy.id))),
    );
    let layout_id = migration.import(&mut site, layout).unwrap();

    assert_eq!(site.matrix_block_types(body_id), body_blocks);
    assert_eq!(site.field_by_handle("copy", &text_context).unwrap().id, copy.id);
    let hero = site.matrix_block_types(layout_id)[0].clone();
    assert_ne!(hero.id, body_blocks[0].id);
    let headline = site.fields_in_context(&FieldContext::MatrixBlockType(hero.uid.clone()));
    assert_eq!(headline.len(), 1);
    assert_ne!(headline[0].id, copy.id);
}

#[test_log::test]
fn placeholder_keys_follow_block_order() {
    let mut migration = migration();
    let mut site = Site::new();
    let def = FieldDef::new("layout", "Layout", field_types::MATRIX)
        .with_block_type(BlockTypeDef::new(ItemKey::Pending(1), "One", "one"))
        .with_block_type(BlockTypeDef::new(ItemKey::Pending(2), "Two", "two"))
        .with_block_type(BlockTypeDef::new(ItemKey::Pending(3), "Three", "three"));
    let id = migration.import(&mut site, def).unwrap();

    let doc = migration.export(&site, id, false).unwrap();
    let json = serde_json::to_value(&doc).unwrap();
    let keys: Vec<&String> = json["typesettings"]["blockTypes"]
        .as_object()
        .unwrap()
        .keys()
        .collect();
    assert_eq!(keys, ["new1", "new2", "new3"]);
}

#[test_log::test]
fn volume_tokens_follow_the_target_site() {
    let config = MigrationConfig {
        addressing: AddressingScheme::NumericId,
        ..Default::default()
    };
    let mut migration = FieldMigration::new(config);

    let mut source = Site::new();
    let volume = source.insert_source(SourceKind::Volume, SourceRecord::new(5, "v5", "images"));
    source.add_root_folder(&volume);
    let field = FieldDef::new("hero", "Hero", field_types::ASSETS)
        .with_setting("sources", json!(["volume:5"]));
    let id = source.add_field("Common", field).unwrap();

    let doc = migration.export(&source, id, false).unwrap();
    assert_eq!(doc.settings.get("sources"), Some(&json!(["images"])));

    let mut target = Site::new();
    let volume = target.insert_source(SourceKind::Volume, SourceRecord::new(9, "v9", "images"));
    target.add_root_folder(&volume);
    let target_id = migration.import(&mut target, doc).unwrap();

    let stored = target.field_by_id(target_id).unwrap();
    assert_eq!(stored.settings.get("sources"), Some(&json!(["volume:9"])));
}

#[test_log::test]
fn dangling_volume_is_reported_and_dropped() {
    let mut migration = migration();
    let mut site = site_with_images();
    let def = FieldDef::new("hero", "Hero", field_types::ASSETS)
        .with_setting("sources", json!(["missingVolume", "images"]))
        .with_setting("singleUploadLocationSource", json!("missingVolume"));

    let id = migration.import(&mut site, def).unwrap();

    let stored = site.field_by_id(id).unwrap();
    let sources = stored.settings["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 1);
    assert!(sources[0].as_str().unwrap().starts_with("volume:"));
    assert_eq!(stored.settings["singleUploadLocationSource"], json!(""));

    let messages = migration.report().messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.contains("missingVolume")));
    assert_eq!(migration.report().failures().count(), 0);
}

#[test_log::test]
fn dangling_volume_in_a_block_is_reported_and_dropped() {
    let mut migration = migration();
    let mut site = site_with_images();
    let mut doc = body();
    doc.settings.block_types[0].fields[1] = nested(2, image("image", "missingVolume"));

    let id = migration.import(&mut site, doc).unwrap();

    let text_block = site.matrix_block_types(id)[0].clone();
    let stored = site
        .field_by_handle("image", &FieldContext::MatrixBlockType(text_block.uid.clone()))
        .unwrap();
    assert_eq!(stored.settings["sources"], json!([]));
    assert_eq!(stored.settings["defaultUploadLocationSource"], json!(""));
    assert_eq!(global(&site, "body").settings["maxBlocks"], json!(5));

    let messages = migration.report().messages();
    assert_eq!(
        messages,
        ["Asset source: missingVolume is not defined in system"; 2]
    );
    assert_eq!(migration.report().failures().count(), 0);
}

#[test_log::test]
fn relation_sources_are_translated_by_handle() {
    let mut migration = migration();
    let mut source = Site::new();
    let news = source.add_section("news", SectionType::Channel);
    let home = source.add_section("homepage", SectionType::Single);
    let editors = source.add_source(SourceKind::UserGroup, "editors");
    let entries = FieldDef::new("related", "Related", field_types::ENTRIES).with_setting(
        "sources",
        json!([format!("section:{}", news.uid), format!("single:{}", home.uid), "singles"]),
    );
    let users = FieldDef::new("authors", "Authors", field_types::USERS)
        .with_setting("sources", json!([format!("group:{}", editors.uid), "admins"]));
    let entries_id = source.add_field("Common", entries).unwrap();
    let users_id = source.add_field("Common", users).unwrap();

    let docs = migration.export_all(&source, false);
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].settings.get("sources"), Some(&json!(["news", "homepage", "singles"])));
    assert_eq!(docs[1].settings.get("sources"), Some(&json!(["editors", "admins"])));

    let mut target = Site::new();
    let news = target.add_section("news", SectionType::Structure);
    let home = target.add_section("homepage", SectionType::Single);
    let editors = target.add_source(SourceKind::UserGroup, "editors");
    for doc in docs {
        migration.import(&mut target, doc).unwrap();
    }

    assert_eq!(
        global(&target, "related").settings["sources"],
        json!([format!("section:{}", news.uid), format!("single:{}", home.uid), "singles"])
    );
    assert_eq!(
        global(&target, "authors").settings["sources"],
        json!([format!("group:{}", editors.uid), "admins"])
    );
    assert_ne!(entries_id, users_id);
}

#[test_log::test]
fn changed_type_replaces_the_field() {
    let mut migration = migration();
    let mut site = site_with_images();
    let id = migration.import(&mut site, body()).unwrap();

    let replaced = migration
        .import(&mut site, text("body").with_group("Content"))
        .unwrap();

    assert_eq!(replaced, id);
    assert_eq!(global(&site, "body").field_type, field_types::PLAIN_TEXT);
    assert!(site.matrix_block_types(id).is_empty());
    assert_eq!(site.fields().len(), 1);
}

#[test_log::test]
fn invalid_document_writes_nothing() {
    let mut migration = migration();
    let mut site = Site::new();

    let err = migration.import(&mut site, text("2col")).unwrap_err();

    assert!(matches!(err, MigrationError::ValidationFailed { .. }));
    assert!(site.fields().is_empty());
    assert!(site.groups().is_empty());
    assert_eq!(migration.report().failures().count(), 1);
}

#[test_log::test]
fn missing_group_falls_back_to_default() {
    let mut migration = FieldMigration::new(MigrationConfig {
        default_group: "Imported".into(),
        ..Default::default()
    });
    let mut site = Site::new();
    let id = migration.import(&mut site, text("summary")).unwrap();

    let group = site.group_by_name("Imported").unwrap();
    assert_eq!(site.field_by_id(id).unwrap().group_id, Some(group.id));
}

#[test_log::test]
fn exporting_an_unknown_id_is_recorded() {
    let mut migration = migration();
    let site = Site::new();
    let err = migration.export(&site, 404, false).unwrap_err();
    assert!(matches!(err, MigrationError::FieldNotFound { id: 404 }));
    assert!(migration.report().has_errors());
    assert!(migration.report().manifest().is_empty());
}

#[derive(Default)]
struct Recording {
    exported: Vec<String>,
    imported: Vec<RecordId>,
    veto: Option<String>,
}

impl MigrationHooks for Recording {
    fn before_export(&mut self, field: &LiveField, mut def: FieldDef) -> FieldDef {
        self.exported.push(field.handle.clone());
        def.instructions = Some("exported".into());
        def
    }

    fn before_import(&mut self, model: &mut FieldModel, _def: &FieldDef) -> Result<(), String> {
        if self.veto.as_deref() == Some(model.handle()) {
            return Err("vetoed".into());
        }
        model.def.required = true;
        Ok(())
    }

    fn after_import(&mut self, id: RecordId, _model: &FieldModel, _def: &FieldDef) {
        self.imported.push(id);
    }
}

#[test_log::test]
fn hooks_see_full_exports_and_every_save() {
    let mut migration = FieldMigration::with_hooks(MigrationConfig::default(), Recording::default());
    let mut site = Site::new();
    let id = migration.import(&mut site, text("summary")).unwrap();
    assert!(site.field_by_id(id).unwrap().required);

    let partial = migration.export(&site, id, false).unwrap();
    assert_eq!(partial.instructions, None);
    let full = migration.export(&site, id, true).unwrap();
    assert_eq!(full.instructions.as_deref(), Some("exported"));

    assert_eq!(migration.hooks().exported, ["summary"]);
    assert_eq!(migration.hooks().imported, [id]);
}

#[test_log::test]
fn vetoed_import_is_a_validation_failure() {
    let hooks = Recording {
        veto: Some("summary".into()),
        ..Default::default()
    };
    let mut migration = FieldMigration::with_hooks(MigrationConfig::default(), hooks);
    let mut site = Site::new();

    let err = migration.import(&mut site, text("summary")).unwrap_err();

    assert_eq!(err.to_string(), "error importing summary field: vetoed");
    assert!(site.fields().is_empty());
    assert!(migration.hooks().imported.is_empty());
}
