//! An in-memory CMS schema.
//!
//! `Site` keeps one table per record kind and implements every collaborator
//! trait the migration engine needs. Ids come from one counter per table and
//! start at 1; uids are fresh ULIDs.

use std::collections::HashSet;

use fieldport::{
    field_types, BlockTypeDef, CompositeRepository, FieldContext, FieldDef, FieldGroup,
    FieldLayout, FieldModel, FieldRepository, LiveBlockType, LiveField, NeoBlockType, NeoGroup,
    RecordId, SaveError, SectionType, SourceKind, SourceLookup, SourceRecord, SourceRepository,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ulid::Ulid;

/// Last id handed out per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Counters {
    pub fields: RecordId,
    pub groups: RecordId,
    pub block_types: RecordId,
    pub neo_block_types: RecordId,
    pub neo_groups: RecordId,
    pub layouts: RecordId,
    pub sources: RecordId,
}

fn next(counter: &mut RecordId) -> RecordId {
    *counter += 1;
    *counter
}

fn new_uid() -> String {
    Ulid::new().to_string().to_lowercase()
}

/// A referenced entity together with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSource {
    pub kind: SourceKind,
    #[serde(flatten)]
    pub record: SourceRecord,
}

/// Block type tables that own sub-fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockTable {
    Matrix,
    SuperTable,
}

impl BlockTable {
    pub(crate) fn context(self, uid: &str) -> FieldContext {
        match self {
            BlockTable::Matrix => FieldContext::MatrixBlockType(uid.to_string()),
            BlockTable::SuperTable => FieldContext::SuperTableBlockType(uid.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Site {
    pub(crate) counters: Counters,
    pub(crate) groups: Vec<FieldGroup>,
    pub(crate) sources: Vec<StoredSource>,
    pub(crate) layouts: Vec<FieldLayout>,
    pub(crate) fields: Vec<LiveField>,
    pub(crate) matrix_blocks: Vec<LiveBlockType>,
    pub(crate) table_blocks: Vec<LiveBlockType>,
    pub(crate) neo_blocks: Vec<NeoBlockType>,
    pub(crate) neo_groups: Vec<NeoGroup>,
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Builders ---

    /// Find a field group by name or create it.
    pub fn add_group(&mut self, name: &str) -> FieldGroup {
        if let Some(group) = self.group_by_name(name) {
            return group;
        }
        let group = FieldGroup {
            id: next(&mut self.counters.groups),
            name: name.to_string(),
        };
        self.groups.push(group.clone());
        group
    }

    pub fn add_source(&mut self, kind: SourceKind, handle: &str) -> SourceRecord {
        let record = SourceRecord::new(next(&mut self.counters.sources), new_uid(), handle);
        self.sources.push(StoredSource {
            kind,
            record: record.clone(),
        });
        record
    }

    /// Store a source with a caller-chosen id and uid.
    pub fn insert_source(&mut self, kind: SourceKind, record: SourceRecord) -> SourceRecord {
        self.counters.sources = self.counters.sources.max(record.id);
        self.sources.push(StoredSource {
            kind,
            record: record.clone(),
        });
        record
    }

    /// Add a volume together with its root folder.
    pub fn add_volume(&mut self, handle: &str) -> SourceRecord {
        let volume = self.add_source(SourceKind::Volume, handle);
        self.add_root_folder(&volume);
        volume
    }

    pub fn add_root_folder(&mut self, volume: &SourceRecord) -> SourceRecord {
        let folder = SourceRecord {
            volume_id: Some(volume.id),
            ..SourceRecord::new(next(&mut self.counters.sources), new_uid(), "")
        };
        self.sources.push(StoredSource {
            kind: SourceKind::Folder,
            record: folder.clone(),
        });
        folder
    }

    pub fn add_section(&mut self, handle: &str, section_type: SectionType) -> SourceRecord {
        let mut section = self.add_source(SourceKind::Section, handle);
        section.section_type = Some(section_type);
        if let Some(stored) = self.sources.last_mut() {
            stored.record.section_type = Some(section_type);
        }
        section
    }

    /// Create a top-level field in the named group.
    pub fn add_field(&mut self, group: &str, def: FieldDef) -> Result<RecordId, SaveError> {
        let group = self.add_group(group);
        self.save_field(&FieldModel {
            id: None,
            group_id: group.id,
            def,
        })
    }

    // --- Accessors ---

    /// Every stored field, nested ones included.
    pub fn fields(&self) -> &[LiveField] {
        &self.fields
    }

    pub fn groups(&self) -> &[FieldGroup] {
        &self.groups
    }

    pub fn layouts(&self) -> &[FieldLayout] {
        &self.layouts
    }

    pub fn sources(&self) -> &[StoredSource] {
        &self.sources
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    // --- Internal ---

    fn blocks(&self, table: BlockTable) -> &Vec<LiveBlockType> {
        match table {
            BlockTable::Matrix => &self.matrix_blocks,
            BlockTable::SuperTable => &self.table_blocks,
        }
    }

    fn blocks_mut(&mut self, table: BlockTable) -> &mut Vec<LiveBlockType> {
        match table {
            BlockTable::Matrix => &mut self.matrix_blocks,
            BlockTable::SuperTable => &mut self.table_blocks,
        }
    }

    pub(crate) fn sorted_blocks(&self, table: BlockTable, field_id: RecordId) -> Vec<LiveBlockType> {
        let mut blocks: Vec<LiveBlockType> = self
            .blocks(table)
            .iter()
            .filter(|b| b.field_id == field_id)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| (b.sort_order, b.id));
        blocks
    }

    /// Contexts may name their block type by uid or by id; stored fields
    /// always use the uid.
    fn canonical_context(&self, context: &FieldContext) -> FieldContext {
        let (table, key) = match context {
            FieldContext::Global => return FieldContext::Global,
            FieldContext::MatrixBlockType(key) => (BlockTable::Matrix, key),
            FieldContext::SuperTableBlockType(key) => (BlockTable::SuperTable, key),
        };
        self.blocks(table)
            .iter()
            .find(|b| b.uid == *key || b.id.to_string() == *key)
            .map(|b| table.context(&b.uid))
            .unwrap_or_else(|| context.clone())
    }

    fn check_model(&self, model: &FieldModel) -> Result<(), SaveError> {
        let def = &model.def;
        if self.group_by_id(model.group_id).is_none() {
            return Err(SaveError::Rejected(format!(
                "field group {} does not exist",
                model.group_id
            )));
        }
        if let Some(id) = model.id {
            if !self.fields.iter().any(|f| f.id == id && f.context.is_global()) {
                return Err(SaveError::Rejected(format!("no field with id {id}")));
            }
        }
        if let Some(other) = self.field_by_handle(&def.handle, &FieldContext::Global) {
            if Some(other.id) != model.id {
                return Err(SaveError::Validation(vec![format!(
                    "Handle \"{}\" has already been taken.",
                    def.handle
                )]));
            }
        }
        let mut messages = Vec::new();
        check_def(def, &mut messages);
        if messages.is_empty() {
            Ok(())
        } else {
            Err(SaveError::Validation(messages))
        }
    }

    /// Insert or update a field in `context` and store its nested structure.
    fn upsert_field(
        &mut self,
        id: Option<RecordId>,
        context: FieldContext,
        group_id: Option<RecordId>,
        def: &FieldDef,
    ) -> RecordId {
        let searchable = if context.is_global() {
            Some(def.searchable.unwrap_or(true))
        } else {
            None
        };
        let mut record = LiveField {
            id: 0,
            uid: String::new(),
            context,
            group_id,
            name: def.name.clone(),
            handle: def.handle.clone(),
            instructions: def.instructions.clone(),
            translation_method: def.translation_method.clone(),
            translation_key_format: def.translation_key_format.clone(),
            required: def.required,
            searchable,
            field_type: def.field_type.clone(),
            settings: def.settings.values.clone(),
        };

        let existing = id.and_then(|id| {
            self.fields
                .iter()
                .position(|f| f.id == id && f.context == record.context)
        });
        let field_id = match existing {
            Some(index) => {
                record.id = self.fields[index].id;
                record.uid = self.fields[index].uid.clone();
                debug!(handle = %record.handle, id = record.id, "updating field");
                self.fields[index] = record;
                self.fields[index].id
            }
            None => {
                record.id = next(&mut self.counters.fields);
                record.uid = new_uid();
                debug!(handle = %record.handle, id = record.id, context = %record.context, "inserting field");
                let id = record.id;
                self.fields.push(record);
                id
            }
        };

        self.save_composite(field_id, def);
        field_id
    }

    fn save_composite(&mut self, field_id: RecordId, def: &FieldDef) {
        let blocks = &def.settings.block_types;
        match def.field_type.as_str() {
            field_types::MATRIX => {
                self.drop_neo(field_id);
                self.purge_blocks(BlockTable::SuperTable, field_id, &[]);
                self.replace_blocks(BlockTable::Matrix, field_id, blocks);
            }
            field_types::SUPER_TABLE => {
                self.drop_neo(field_id);
                self.purge_blocks(BlockTable::Matrix, field_id, &[]);
                self.replace_blocks(BlockTable::SuperTable, field_id, blocks);
            }
            field_types::NEO => {
                self.purge_blocks(BlockTable::Matrix, field_id, &[]);
                self.purge_blocks(BlockTable::SuperTable, field_id, &[]);
                self.replace_neo(field_id, def);
            }
            _ => self.purge_composite(field_id),
        }
    }

    fn replace_blocks(&mut self, table: BlockTable, field_id: RecordId, blocks: &[BlockTypeDef]) {
        let mut kept = Vec::with_capacity(blocks.len());
        for (position, block) in (1..).zip(blocks) {
            let existing = block.key.existing_id().and_then(|id| {
                self.blocks(table)
                    .iter()
                    .position(|b| b.id == id && b.field_id == field_id)
            });
            let uid = match existing {
                Some(index) => {
                    let stored = &mut self.blocks_mut(table)[index];
                    stored.name = block.name.clone();
                    stored.handle = block.handle.clone();
                    stored.sort_order = Some(position);
                    if block.field_layout_id.is_some() {
                        stored.field_layout_id = block.field_layout_id;
                    }
                    kept.push(stored.id);
                    stored.uid.clone()
                }
                None => {
                    let stored = LiveBlockType {
                        id: next(&mut self.counters.block_types),
                        uid: new_uid(),
                        field_id,
                        name: block.name.clone(),
                        handle: block.handle.clone(),
                        sort_order: Some(position),
                        field_layout_id: block.field_layout_id,
                    };
                    debug!(block = %stored.handle, id = stored.id, "inserting block type");
                    kept.push(stored.id);
                    let uid = stored.uid.clone();
                    self.blocks_mut(table).push(stored);
                    uid
                }
            };
            self.replace_context_fields(table.context(&uid), &block.fields);
        }
        self.purge_blocks(table, field_id, &kept);
    }

    fn replace_context_fields(&mut self, context: FieldContext, fields: &[FieldDef]) {
        let kept: Vec<RecordId> = fields
            .iter()
            .map(|field| self.upsert_field(field.key.existing_id(), context.clone(), None, field))
            .collect();
        self.remove_context_fields(&context, &kept);
    }

    fn replace_neo(&mut self, field_id: RecordId, def: &FieldDef) {
        self.neo_groups.retain(|g| g.field_id != field_id);
        for group in &def.settings.groups {
            let stored = NeoGroup {
                id: next(&mut self.counters.neo_groups),
                field_id,
                name: group.name.clone(),
                sort_order: group.sort_order,
            };
            self.neo_groups.push(stored);
        }

        let mut kept = Vec::with_capacity(def.settings.block_types.len());
        for (position, block) in (1..).zip(&def.settings.block_types) {
            let existing = block.key.existing_id().and_then(|id| {
                self.neo_blocks
                    .iter()
                    .position(|b| b.id == id && b.field_id == field_id)
            });
            let mut stored = NeoBlockType {
                id: 0,
                uid: String::new(),
                field_id,
                name: block.name.clone(),
                handle: block.handle.clone(),
                sort_order: Some(position),
                max_blocks: block.max_blocks,
                max_sibling_blocks: block.max_sibling_blocks,
                max_child_blocks: block.max_child_blocks,
                child_blocks: block.child_blocks.clone(),
                top_level: block.top_level.unwrap_or(true),
                field_layout_id: block.field_layout_id,
            };
            match existing {
                Some(index) => {
                    let old = &self.neo_blocks[index];
                    stored.id = old.id;
                    stored.uid = old.uid.clone();
                    if let Some(old_layout) = old.field_layout_id {
                        if stored.field_layout_id != Some(old_layout) {
                            self.layouts.retain(|l| l.id != Some(old_layout));
                        }
                    }
                    kept.push(stored.id);
                    self.neo_blocks[index] = stored;
                }
                None => {
                    stored.id = next(&mut self.counters.neo_block_types);
                    stored.uid = new_uid();
                    kept.push(stored.id);
                    self.neo_blocks.push(stored);
                }
            }
        }
        self.purge_neo(field_id, &kept);
    }

    /// Remove block types of `field_id` not in `keep`, with their sub-fields.
    fn purge_blocks(&mut self, table: BlockTable, field_id: RecordId, keep: &[RecordId]) {
        let (removed, remaining): (Vec<LiveBlockType>, Vec<LiveBlockType>) =
            std::mem::take(self.blocks_mut(table))
                .into_iter()
                .partition(|b| b.field_id == field_id && !keep.contains(&b.id));
        *self.blocks_mut(table) = remaining;
        for block in removed {
            debug!(block = %block.handle, id = block.id, "removing block type");
            self.remove_context_fields(&table.context(&block.uid), &[]);
        }
    }

    fn purge_neo(&mut self, field_id: RecordId, keep: &[RecordId]) {
        let (removed, remaining): (Vec<NeoBlockType>, Vec<NeoBlockType>) =
            std::mem::take(&mut self.neo_blocks)
                .into_iter()
                .partition(|b| b.field_id == field_id && !keep.contains(&b.id));
        self.neo_blocks = remaining;
        let layouts: HashSet<RecordId> = removed.iter().filter_map(|b| b.field_layout_id).collect();
        self.layouts
            .retain(|l| l.id.is_none_or(|id| !layouts.contains(&id)));
    }

    fn drop_neo(&mut self, field_id: RecordId) {
        self.purge_neo(field_id, &[]);
        self.neo_groups.retain(|g| g.field_id != field_id);
    }

    fn purge_composite(&mut self, field_id: RecordId) {
        self.purge_blocks(BlockTable::Matrix, field_id, &[]);
        self.purge_blocks(BlockTable::SuperTable, field_id, &[]);
        self.drop_neo(field_id);
    }

    /// Remove fields stored in `context` not in `keep`, with anything they own.
    fn remove_context_fields(&mut self, context: &FieldContext, keep: &[RecordId]) {
        let (removed, remaining): (Vec<LiveField>, Vec<LiveField>) = std::mem::take(&mut self.fields)
            .into_iter()
            .partition(|f| f.context == *context && !keep.contains(&f.id));
        self.fields = remaining;
        for field in removed {
            debug!(handle = %field.handle, id = field.id, "removing field");
            self.purge_composite(field.id);
        }
    }
}

/// Handle checks applied to a field and its nested sub-fields.
fn check_def(def: &FieldDef, messages: &mut Vec<String>) {
    if def.handle.trim().is_empty() {
        messages.push("Handle cannot be blank.".to_string());
    }
    if def.name.trim().is_empty() {
        messages.push(format!("{}: Name cannot be blank.", def.handle));
    }
    for block in &def.settings.block_types {
        let mut seen = HashSet::new();
        for field in &block.fields {
            if !seen.insert(field.handle.as_str()) {
                messages.push(format!(
                    "{}: Handle \"{}\" has already been taken.",
                    block.handle, field.handle
                ));
            }
            check_def(field, messages);
        }
    }
}

impl FieldRepository for Site {
    fn field_by_id(&self, id: RecordId) -> Option<LiveField> {
        self.fields.iter().find(|f| f.id == id).cloned()
    }

    fn field_by_handle(&self, handle: &str, context: &FieldContext) -> Option<LiveField> {
        let context = self.canonical_context(context);
        self.fields
            .iter()
            .find(|f| f.context == context && f.handle == handle)
            .cloned()
    }

    fn fields_in_context(&self, context: &FieldContext) -> Vec<LiveField> {
        let context = self.canonical_context(context);
        self.fields
            .iter()
            .filter(|f| f.context == context)
            .cloned()
            .collect()
    }

    fn group_by_id(&self, id: RecordId) -> Option<FieldGroup> {
        self.groups.iter().find(|g| g.id == id).cloned()
    }

    fn group_by_name(&self, name: &str) -> Option<FieldGroup> {
        self.groups.iter().find(|g| g.name == name).cloned()
    }

    fn field_layout(&self, id: RecordId) -> Option<FieldLayout> {
        self.layouts.iter().find(|l| l.id == Some(id)).cloned()
    }

    fn save_group(&mut self, name: &str) -> Result<FieldGroup, SaveError> {
        if name.trim().is_empty() {
            return Err(SaveError::Validation(vec!["Name cannot be blank.".to_string()]));
        }
        if self.group_by_name(name).is_some() {
            return Err(SaveError::Validation(vec![format!(
                "Name \"{name}\" has already been taken."
            )]));
        }
        Ok(self.add_group(name))
    }

    fn save_field(&mut self, model: &FieldModel) -> Result<RecordId, SaveError> {
        self.check_model(model)?;
        Ok(self.upsert_field(
            model.id,
            FieldContext::Global,
            Some(model.group_id),
            &model.def,
        ))
    }

    fn save_field_layout(&mut self, layout: &FieldLayout) -> Result<RecordId, SaveError> {
        if layout.layout_type.is_empty() {
            return Err(SaveError::Rejected("layout type is required".to_string()));
        }
        let unknown: Vec<String> = layout
            .tabs
            .iter()
            .flat_map(|tab| &tab.fields)
            .filter(|lf| !self.fields.iter().any(|f| f.id == lf.field_id))
            .map(|lf| format!("Unknown field id {}.", lf.field_id))
            .collect();
        if !unknown.is_empty() {
            return Err(SaveError::Validation(unknown));
        }

        let mut stored = layout.clone();
        let existing = layout
            .id
            .and_then(|id| self.layouts.iter().position(|l| l.id == Some(id)));
        match existing {
            Some(index) => {
                self.layouts[index] = stored;
                Ok(self.layouts[index].id.unwrap_or_default())
            }
            None => {
                let id = next(&mut self.counters.layouts);
                stored.id = Some(id);
                self.layouts.push(stored);
                Ok(id)
            }
        }
    }

    fn delete_field_layout(&mut self, id: RecordId) -> Result<(), SaveError> {
        let Some(index) = self.layouts.iter().position(|l| l.id == Some(id)) else {
            return Err(SaveError::Rejected(format!("no field layout with id {id}")));
        };
        self.layouts.remove(index);
        Ok(())
    }
}

impl CompositeRepository for Site {
    fn matrix_block_types(&self, field_id: RecordId) -> Vec<LiveBlockType> {
        self.sorted_blocks(BlockTable::Matrix, field_id)
    }

    fn super_table_block_types(&self, field_id: RecordId) -> Vec<LiveBlockType> {
        self.sorted_blocks(BlockTable::SuperTable, field_id)
    }

    fn neo_block_types(&self, field_id: RecordId) -> Vec<NeoBlockType> {
        let mut blocks: Vec<NeoBlockType> = self
            .neo_blocks
            .iter()
            .filter(|b| b.field_id == field_id)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| (b.sort_order, b.id));
        blocks
    }

    fn neo_groups(&self, field_id: RecordId) -> Vec<NeoGroup> {
        let mut groups: Vec<NeoGroup> = self
            .neo_groups
            .iter()
            .filter(|g| g.field_id == field_id)
            .cloned()
            .collect();
        groups.sort_by_key(|g| (g.sort_order, g.id));
        groups
    }
}

impl SourceRepository for Site {
    fn find_source(&self, kind: SourceKind, lookup: SourceLookup<'_>) -> Option<SourceRecord> {
        if lookup == SourceLookup::Handle("") {
            return None;
        }
        self.sources
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| &s.record)
            .find(|record| match lookup {
                SourceLookup::Id(id) => record.id == id,
                SourceLookup::Uid(uid) => record.uid == uid,
                SourceLookup::Handle(handle) => record.handle == handle,
            })
            .cloned()
    }

    fn root_folder(&self, volume_id: RecordId) -> Option<SourceRecord> {
        self.sources
            .iter()
            .find(|s| s.kind == SourceKind::Folder && s.record.volume_id == Some(volume_id))
            .map(|s| s.record.clone())
    }
}
