//! Translation between live identifiers and portable handles.
//!
//! Each field type that embeds external references contributes one
//! [`ReferenceResolver`]; the [`FieldTypeRegistry`](crate::registry::FieldTypeRegistry)
//! dispatches to it and recurses into nested sub-fields.

mod assets;
mod redactor;
mod relations;

pub use assets::AssetsResolver;
pub use redactor::RedactorResolver;
pub use relations::{CategoriesResolver, EntriesResolver, TagsResolver, UsersResolver};

use serde_json::Value;

use crate::config::{AssetTokenStyle, MigrationConfig};
use crate::error::{MigrationError, ReferenceKind};
use crate::key::RecordId;
use crate::live::{SourceKind, SourceLookup, SourceRecord};
use crate::report::Report;
use crate::repository::SourceRepository;
use crate::token::{RefToken, TokenPrefix, ALL};
use crate::types::TypeSettings;

/// Reference rules of one field type.
pub trait ReferenceResolver: Send + Sync {
    /// Export direction: replace live keys in `settings` with handles.
    /// Unknown ids are left as they are.
    fn ids_to_handles(&self, settings: &mut TypeSettings, sources: &Sources<'_>);

    /// Import direction: replace handles with live reference tokens. Every
    /// handle that cannot be resolved is reported and its value degraded.
    fn handles_to_ids(&self, settings: &mut TypeSettings, sources: &Sources<'_>, report: &mut Report);
}

/// Entity lookups bound to the destination's addressing scheme.
pub struct Sources<'a> {
    repo: &'a dyn SourceRepository,
    config: &'a MigrationConfig,
}

impl<'a> Sources<'a> {
    pub fn new(repo: &'a dyn SourceRepository, config: &'a MigrationConfig) -> Self {
        Self { repo, config }
    }

    pub fn asset_tokens(&self) -> AssetTokenStyle {
        self.config.asset_tokens
    }

    /// Record addressed by a key from live settings.
    pub fn by_key(&self, kind: SourceKind, key: &str) -> Option<SourceRecord> {
        let lookup = self.config.addressing.lookup(key)?;
        self.repo.find_source(kind, lookup)
    }

    /// Like [`Sources::by_key`], also accepting bare numeric ids.
    pub fn by_value(&self, kind: SourceKind, value: &Value) -> Option<SourceRecord> {
        match value {
            Value::Number(n) => n.as_i64().and_then(|id| self.by_id(kind, id)),
            Value::String(key) => self.by_key(kind, key),
            _ => None,
        }
    }

    pub fn by_id(&self, kind: SourceKind, id: RecordId) -> Option<SourceRecord> {
        self.repo.find_source(kind, SourceLookup::Id(id))
    }

    pub fn by_handle(&self, kind: SourceKind, handle: &str) -> Option<SourceRecord> {
        self.repo.find_source(kind, SourceLookup::Handle(handle))
    }

    pub fn root_folder(&self, volume_id: RecordId) -> Option<SourceRecord> {
        self.repo.root_folder(volume_id)
    }

    pub fn token(&self, prefix: TokenPrefix, record: &SourceRecord) -> String {
        RefToken::new(prefix, self.config.addressing.key_of(record)).to_string()
    }

    /// Bare key of a record for raw-key lists.
    pub fn value(&self, record: &SourceRecord) -> Value {
        self.config.addressing.value_of(record)
    }
}

/// Rewrite the elements of a list setting that `rewrite` maps. A missing or
/// non-list value becomes `[]`, except the `*` wildcard.
pub(crate) fn export_list(
    settings: &mut TypeSettings,
    key: &str,
    mut rewrite: impl FnMut(&Value) -> Option<Value>,
) {
    if let Some(Value::Array(items)) = settings.get_mut(key) {
        for item in items.iter_mut() {
            if let Some(replacement) = rewrite(item) {
                *item = replacement;
            }
        }
        return;
    }
    if settings.get_str(key) == Some(ALL) {
        return;
    }
    settings.set(key, Value::Array(Vec::new()));
}

/// Rewrite a string setting when `rewrite` maps it.
pub(crate) fn export_single(
    settings: &mut TypeSettings,
    key: &str,
    rewrite: impl FnOnce(&str) -> Option<Value>,
) {
    let Some(current) = settings.get_str(key) else {
        return;
    };
    if let Some(replacement) = rewrite(current) {
        settings.set(key, replacement);
    }
}

/// Resolve each string element of a list setting. Elements `resolve`
/// rejects are dropped; non-string elements stay.
pub(crate) fn import_list(
    settings: &mut TypeSettings,
    key: &str,
    mut resolve: impl FnMut(&str) -> Option<Value>,
) {
    if let Some(Value::Array(items)) = settings.get_mut(key) {
        let resolved = std::mem::take(items)
            .into_iter()
            .filter_map(|item| match item {
                Value::String(handle) => resolve(&handle),
                other => Some(other),
            })
            .collect();
        *items = resolved;
    }
}

/// Resolve a single handle setting. An unresolvable handle is reported and
/// the setting emptied; empty values are left alone.
pub(crate) fn import_single(
    settings: &mut TypeSettings,
    key: &str,
    kind: ReferenceKind,
    report: &mut Report,
    resolve: impl FnOnce(&str) -> Option<String>,
) {
    let Some(handle) = settings
        .get_str(key)
        .filter(|handle| !handle.is_empty())
        .map(str::to_owned)
    else {
        return;
    };
    let value = match resolve(&handle) {
        Some(token) => token,
        None => {
            report.add_error(MigrationError::unresolvable(kind, handle));
            String::new()
        }
    };
    settings.set(key, Value::String(value));
}
