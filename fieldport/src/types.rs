//! Portable field definitions.
//!
//! A `FieldDef` is the handle-addressed, id-free form of a field that travels
//! between systems. Composite fields carry their nested block types and
//! sub-fields as a typed tree instead of untyped nested maps; on the wire the
//! nested collections are keyed maps (see [`crate::key`]).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::key::{keyed, ordinal, ItemKey, Keyed, RecordId};

/// Type tags of the field types the engine knows about.
pub mod field_types {
    pub const MATRIX: &str = "craft\\fields\\Matrix";
    pub const SUPER_TABLE: &str = "verbb\\supertable\\fields\\SuperTableField";
    pub const NEO: &str = "benf\\neo\\Field";
    pub const ASSETS: &str = "craft\\fields\\Assets";
    pub const REDACTOR: &str = "craft\\redactor\\Field";
    pub const CATEGORIES: &str = "craft\\fields\\Categories";
    pub const ENTRIES: &str = "craft\\fields\\Entries";
    pub const TAGS: &str = "craft\\fields\\Tags";
    pub const USERS: &str = "craft\\fields\\Users";
    pub const PLAIN_TEXT: &str = "craft\\fields\\PlainText";

    /// Layout type recorded on field layouts built for Neo block types.
    pub const NEO_BLOCK_TYPE: &str = "benf\\neo\\models\\BlockType";
}

fn default_translation_method() -> String {
    "none".to_string()
}

/// Setting that carries Neo block groups on the wire.
pub(crate) const GROUPS_SETTING: &str = "groups";

/// A portable field definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "FieldRepr", into = "FieldRepr")]
pub struct FieldDef {
    /// Map key when nested; for a top-level import this is the id to update
    /// or the `new` sentinel.
    pub key: ItemKey,
    /// Field group name. Only top-level fields belong to a group.
    pub group: Option<String>,
    pub name: String,
    pub handle: String,
    pub instructions: Option<String>,
    pub translation_method: String,
    pub translation_key_format: Option<String>,
    pub required: bool,
    pub searchable: Option<bool>,
    pub field_type: String,
    pub settings: TypeSettings,
}

/// Wire form of [`FieldDef`]. Neo block groups travel as an ordinary
/// `groups` setting and are lifted into [`TypeSettings::groups`] only for
/// Neo fields.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<String>,
    name: String,
    handle: String,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default = "default_translation_method")]
    translation_method: String,
    #[serde(default)]
    translation_key_format: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    searchable: Option<bool>,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(rename = "typesettings", default)]
    settings: TypeSettings,
}

impl TryFrom<FieldRepr> for FieldDef {
    type Error = String;

    fn try_from(repr: FieldRepr) -> Result<Self, Self::Error> {
        let mut settings = repr.settings;
        if repr.field_type == field_types::NEO {
            if let Some(raw) = settings.values.shift_remove(GROUPS_SETTING) {
                let groups: Vec<BlockGroupDef> = ordinal::deserialize(raw)
                    .map_err(|e| format!("{}: invalid block groups: {e}", repr.handle))?;
                settings.groups = groups;
            }
        }
        Ok(FieldDef {
            key: ItemKey::NEW,
            group: repr.group,
            name: repr.name,
            handle: repr.handle,
            instructions: repr.instructions,
            translation_method: repr.translation_method,
            translation_key_format: repr.translation_key_format,
            required: repr.required,
            searchable: repr.searchable,
            field_type: repr.field_type,
            settings,
        })
    }
}

impl From<FieldDef> for FieldRepr {
    fn from(def: FieldDef) -> Self {
        let mut settings = def.settings;
        if !settings.groups.is_empty() {
            let groups = std::mem::take(&mut settings.groups);
            settings
                .values
                .insert(GROUPS_SETTING.to_string(), ordinal::to_value(&groups));
        }
        FieldRepr {
            group: def.group,
            name: def.name,
            handle: def.handle,
            instructions: def.instructions,
            translation_method: def.translation_method,
            translation_key_format: def.translation_key_format,
            required: def.required,
            searchable: def.searchable,
            field_type: def.field_type,
            settings,
        }
    }
}

impl FieldDef {
    pub fn new(handle: impl Into<String>, name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            key: ItemKey::NEW,
            group: None,
            name: name.into(),
            handle: handle.into(),
            instructions: None,
            translation_method: default_translation_method(),
            translation_key_format: None,
            required: false,
            searchable: None,
            field_type: field_type.into(),
            settings: TypeSettings::default(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.set(key, value);
        self
    }

    pub fn with_block_type(mut self, block: BlockTypeDef) -> Self {
        self.settings.block_types.push(block);
        self
    }

    pub fn with_key(mut self, key: ItemKey) -> Self {
        self.key = key;
        self
    }

    pub fn is_type(&self, field_type: &str) -> bool {
        self.field_type == field_type
    }
}

impl Keyed for FieldDef {
    fn key(&self) -> ItemKey {
        self.key
    }

    fn set_key(&mut self, key: ItemKey) {
        self.key = key;
    }
}

/// Type-specific settings of a field.
///
/// Arbitrary settings live in `values` in their original order. Nested block
/// types are lifted out into a typed collection, as are the block groups of
/// a Neo field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TypeSettings {
    #[serde(flatten)]
    pub values: IndexMap<String, Value>,
    #[serde(
        rename = "blockTypes",
        default,
        skip_serializing_if = "Vec::is_empty",
        with = "keyed"
    )]
    pub block_types: Vec<BlockTypeDef>,
    #[serde(skip)]
    pub groups: Vec<BlockGroupDef>,
}

impl TypeSettings {
    /// Wrap live settings. Block types are never taken from the raw map;
    /// composite walkers rebuild them from the live schema.
    pub fn from_values(mut values: IndexMap<String, Value>) -> Self {
        values.shift_remove("blockTypes");
        Self {
            values,
            block_types: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.values.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    /// Replace every nested destination id with a fresh placeholder. Ids in
    /// a document are never trusted; merging re-attaches the items that
    /// match a stored one by handle.
    pub fn forget_ids(&mut self) {
        rekey(&mut self.block_types);
        for block in &mut self.block_types {
            block.field_layout_id = None;
            rekey(&mut block.fields);
            for field in &mut block.fields {
                field.settings.forget_ids();
            }
        }
    }

    /// Sub-fields of every block type, in order.
    pub fn nested_fields_mut(&mut self) -> impl Iterator<Item = &mut FieldDef> {
        self.block_types
            .iter_mut()
            .flat_map(|block| block.fields.iter_mut())
    }
}

/// Give each sibling keyed by id the next placeholder ordinal after the
/// highest one already in use.
fn rekey<T: Keyed>(items: &mut [T]) {
    let mut next = items
        .iter()
        .filter_map(|item| match item.key() {
            ItemKey::Pending(n) => Some(n),
            ItemKey::Existing(_) => None,
        })
        .max()
        .unwrap_or(0);
    for item in items.iter_mut() {
        if let ItemKey::Existing(_) = item.key() {
            next += 1;
            item.set_key(ItemKey::Pending(next));
        }
    }
}

/// A block type of a composite field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockTypeDef {
    #[serde(skip)]
    pub key: ItemKey,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_layout_id: Option<RecordId>,
    #[serde(default, with = "keyed")]
    pub fields: Vec<FieldDef>,

    // Neo block constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_blocks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sibling_blocks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_child_blocks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_blocks: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_level: Option<bool>,
    /// Tab name to the handles of the fields on that tab.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub field_layout: IndexMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<String>,
}

impl BlockTypeDef {
    pub fn new(key: ItemKey, name: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            handle: handle.into(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }
}

impl Keyed for BlockTypeDef {
    fn key(&self) -> ItemKey {
        self.key
    }

    fn set_key(&mut self, key: ItemKey) {
        self.key = key;
    }
}

/// A named partition of Neo block types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockGroupDef {
    pub name: String,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

/// A field ready to be handed to the destination: ids resolved, group
/// assigned, every reference token carrying a live key.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldModel {
    /// `None` inserts a new field.
    pub id: Option<RecordId>,
    pub group_id: RecordId,
    pub def: FieldDef,
}

impl FieldModel {
    pub fn handle(&self) -> &str {
        &self.def.handle
    }
}
