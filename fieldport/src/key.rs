//! Keys for nested items in a portable document.
//!
//! Block types and sub-fields are stored as keyed maps on the wire. A key is
//! either a destination id that must be preserved on save, or a placeholder
//! (`new`, `new1`, `new2`, ...) that asks the destination to insert a fresh
//! record.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Numeric identifier assigned by a destination system.
pub type RecordId = i64;

/// Key of a block type or sub-field inside its parent map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKey {
    /// Not yet stored. `Pending(0)` is the bare `new` sentinel.
    Pending(u32),
    /// Matched to an existing record in the destination.
    Existing(RecordId),
}

impl ItemKey {
    /// The bare `new` sentinel.
    pub const NEW: ItemKey = ItemKey::Pending(0);

    pub fn existing_id(&self) -> Option<RecordId> {
        match self {
            ItemKey::Existing(id) => Some(*id),
            ItemKey::Pending(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ItemKey::Pending(_))
    }
}

impl Default for ItemKey {
    fn default() -> Self {
        ItemKey::NEW
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Pending(0) => f.write_str("new"),
            ItemKey::Pending(n) => write!(f, "new{n}"),
            ItemKey::Existing(id) => write!(f, "{id}"),
        }
    }
}

/// A map key that is neither a placeholder nor a numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid item key: {0}")]
pub struct InvalidItemKey(pub String);

impl FromStr for ItemKey {
    type Err = InvalidItemKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("new") {
            if rest.is_empty() {
                return Ok(ItemKey::NEW);
            }
            return rest
                .parse::<u32>()
                .map(ItemKey::Pending)
                .map_err(|_| InvalidItemKey(s.to_string()));
        }
        s.parse::<RecordId>()
            .map(ItemKey::Existing)
            .map_err(|_| InvalidItemKey(s.to_string()))
    }
}

/// Items that carry their own map key.
pub trait Keyed {
    fn key(&self) -> ItemKey;
    fn set_key(&mut self, key: ItemKey);
}

/// Accepted wire shapes for a keyed collection. Hosts that encode an empty
/// map as an empty list produce the second form.
#[derive(Deserialize)]
#[serde(untagged)]
enum KeyedRepr<T> {
    Map(IndexMap<String, T>),
    List(Vec<T>),
}

/// `#[serde(with = "keyed")]` for `Vec<T: Keyed>` stored as `{ <key>: T }`.
pub mod keyed {
    use super::*;
    use serde::de::Error as _;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S, T>(items: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Keyed + Serialize,
    {
        let mut map = serializer.serialize_map(Some(items.len()))?;
        for item in items {
            map.serialize_entry(&item.key().to_string(), item)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Keyed + Deserialize<'de>,
    {
        match KeyedRepr::<T>::deserialize(deserializer)? {
            KeyedRepr::Map(entries) => entries
                .into_iter()
                .map(|(raw, mut item)| {
                    let key = raw.parse::<ItemKey>().map_err(D::Error::custom)?;
                    item.set_key(key);
                    Ok(item)
                })
                .collect(),
            KeyedRepr::List(items) => Ok((1..)
                .zip(items)
                .map(|(ordinal, mut item)| {
                    item.set_key(ItemKey::Pending(ordinal));
                    item
                })
                .collect()),
        }
    }
}

/// Collections stored as `{ uid0: T, uid1: T }`.
///
/// Only the order of the entries is significant; the keys are regenerated on
/// every write.
pub mod ordinal {
    use super::*;
    use serde_json::{Map, Value};

    pub fn to_value<T: Serialize>(items: &[T]) -> Value {
        let entries: Map<String, Value> = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let value = serde_json::to_value(item).unwrap_or_default();
                (format!("uid{index}"), value)
            })
            .collect();
        Value::Object(entries)
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(match KeyedRepr::<T>::deserialize(deserializer)? {
            KeyedRepr::Map(entries) => entries.into_values().collect(),
            KeyedRepr::List(items) => items,
        })
    }
}
