//! Destination-side records.
//!
//! These mirror what a host system stores: numeric ids, opaque uids and
//! settings that embed live reference tokens. They are read through the
//! collaborator traits in [`crate::repository`] and never leave the process.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::key::RecordId;

/// Scope a field's handle is unique within.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum FieldContext {
    #[default]
    Global,
    /// Sub-fields of a Matrix block type, keyed by the block type's uid or id.
    MatrixBlockType(String),
    /// Sub-fields of a SuperTable block type.
    SuperTableBlockType(String),
}

impl FieldContext {
    pub fn is_global(&self) -> bool {
        matches!(self, FieldContext::Global)
    }
}

impl fmt::Display for FieldContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldContext::Global => f.write_str("global"),
            FieldContext::MatrixBlockType(key) => write!(f, "matrixBlockType:{key}"),
            FieldContext::SuperTableBlockType(key) => write!(f, "superTableBlockType:{key}"),
        }
    }
}

impl FromStr for FieldContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "global" {
            return Ok(FieldContext::Global);
        }
        match s.split_once(':') {
            Some(("matrixBlockType", key)) if !key.is_empty() => {
                Ok(FieldContext::MatrixBlockType(key.to_string()))
            }
            Some(("superTableBlockType", key)) if !key.is_empty() => {
                Ok(FieldContext::SuperTableBlockType(key.to_string()))
            }
            _ => Err(format!("unknown field context: {s}")),
        }
    }
}

impl From<FieldContext> for String {
    fn from(context: FieldContext) -> Self {
        context.to_string()
    }
}

impl TryFrom<String> for FieldContext {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A stored field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveField {
    pub id: RecordId,
    pub uid: String,
    #[serde(default)]
    pub context: FieldContext,
    #[serde(default)]
    pub group_id: Option<RecordId>,
    pub name: String,
    pub handle: String,
    #[serde(default)]
    pub instructions: Option<String>,
    pub translation_method: String,
    #[serde(default)]
    pub translation_key_format: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// `None` when the host does not track searchability.
    #[serde(default)]
    pub searchable: Option<bool>,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub settings: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldGroup {
    pub id: RecordId,
    pub name: String,
}

/// A Matrix or SuperTable block type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBlockType {
    pub id: RecordId,
    pub uid: String,
    pub field_id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub sort_order: Option<i64>,
    #[serde(default)]
    pub field_layout_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeoBlockType {
    pub id: RecordId,
    pub uid: String,
    pub field_id: RecordId,
    pub name: String,
    pub handle: String,
    #[serde(default)]
    pub sort_order: Option<i64>,
    #[serde(default)]
    pub max_blocks: Option<u32>,
    #[serde(default)]
    pub max_sibling_blocks: Option<u32>,
    #[serde(default)]
    pub max_child_blocks: Option<u32>,
    #[serde(default)]
    pub child_blocks: Option<Value>,
    #[serde(default)]
    pub top_level: bool,
    #[serde(default)]
    pub field_layout_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeoGroup {
    pub id: RecordId,
    pub field_id: RecordId,
    pub name: String,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

/// An ordered set of tabs, each holding ordered field references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldLayout {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(rename = "type")]
    pub layout_type: String,
    #[serde(default)]
    pub tabs: Vec<LayoutTab>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutTab {
    pub name: String,
    pub sort_order: i64,
    #[serde(default)]
    pub fields: Vec<LayoutField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutField {
    pub field_id: RecordId,
    #[serde(default)]
    pub required: bool,
    pub sort_order: i64,
}

/// Kinds of entities that field settings may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Volume,
    Folder,
    Section,
    CategoryGroup,
    TagGroup,
    UserGroup,
    ImageTransform,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SourceKind::Volume => "volume",
            SourceKind::Folder => "folder",
            SourceKind::Section => "section",
            SourceKind::CategoryGroup => "category group",
            SourceKind::TagGroup => "tag group",
            SourceKind::UserGroup => "user group",
            SourceKind::ImageTransform => "image transform",
        };
        f.write_str(label)
    }
}

/// How a referenced entity is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLookup<'a> {
    Id(RecordId),
    Uid(&'a str),
    Handle(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Single,
    Channel,
    Structure,
}

/// A volume, folder, section, category group, tag group, user group or
/// image transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    pub id: RecordId,
    pub uid: String,
    /// Folders have no handle of their own.
    #[serde(default)]
    pub handle: String,
    /// Owning volume of a folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_type: Option<SectionType>,
}

impl SourceRecord {
    pub fn new(id: RecordId, uid: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            id,
            uid: uid.into(),
            handle: handle.into(),
            volume_id: None,
            section_type: None,
        }
    }

    pub fn is_single(&self) -> bool {
        self.section_type == Some(SectionType::Single)
    }
}
