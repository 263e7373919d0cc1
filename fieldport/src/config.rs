//! Migration settings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::key::RecordId;
use crate::live::{SourceLookup, SourceRecord};

/// How a destination addresses referenced entities inside live settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressingScheme {
    /// Storage-stable surrogate keys.
    #[default]
    Uid,
    /// Raw numeric ids.
    NumericId,
}

impl AddressingScheme {
    /// Key of a record as it appears inside a token.
    pub fn key_of(&self, record: &SourceRecord) -> String {
        match self {
            AddressingScheme::Uid => record.uid.clone(),
            AddressingScheme::NumericId => record.id.to_string(),
        }
    }

    /// Key of a record as a bare settings value.
    pub fn value_of(&self, record: &SourceRecord) -> Value {
        match self {
            AddressingScheme::Uid => Value::String(record.uid.clone()),
            AddressingScheme::NumericId => Value::from(record.id),
        }
    }

    /// Key of a block type inside a field context string.
    pub fn block_key(&self, uid: &str, id: RecordId) -> String {
        match self {
            AddressingScheme::Uid => uid.to_string(),
            AddressingScheme::NumericId => id.to_string(),
        }
    }

    /// Lookup for a key found in live settings. `None` when a numeric scheme
    /// meets a non-numeric key.
    pub fn lookup<'a>(&self, key: &'a str) -> Option<SourceLookup<'a>> {
        match self {
            AddressingScheme::Uid => Some(SourceLookup::Uid(key)),
            AddressingScheme::NumericId => key.trim().parse().ok().map(SourceLookup::Id),
        }
    }
}

/// Token emitted for an asset source on import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetTokenStyle {
    /// `volume:<key>`
    #[default]
    Volume,
    /// `folder:<rootFolderKey>`, for hosts that still address folders.
    Folder,
}

fn default_group_name() -> String {
    "Common".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub addressing: AddressingScheme,
    pub asset_tokens: AssetTokenStyle,
    /// Export live ids instead of placeholder keys.
    pub include_ids: bool,
    /// Group assigned to top-level documents that name none.
    pub default_group: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            addressing: AddressingScheme::default(),
            asset_tokens: AssetTokenStyle::default(),
            include_ids: false,
            default_group: default_group_name(),
        }
    }
}
