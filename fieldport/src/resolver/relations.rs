//! Relation fields: categories, entries, tags and users.

use serde_json::Value;

use super::{export_list, export_single, import_list, import_single, ReferenceResolver, Sources};
use crate::error::{MigrationError, ReferenceKind};
use crate::live::SourceKind;
use crate::report::Report;
use crate::token::{RefToken, TokenPrefix, ADMINS, ALL, SINGLES};
use crate::types::TypeSettings;

const SOURCE: &str = "source";
const SOURCES: &str = "sources";

/// Handle of the record behind a token with one of the given prefixes.
fn token_handle(
    value: &str,
    prefixes: &[TokenPrefix],
    kind: SourceKind,
    sources: &Sources<'_>,
) -> Option<String> {
    let token = RefToken::parse(value).filter(|t| prefixes.contains(&t.prefix))?;
    sources.by_key(kind, &token.key).map(|record| record.handle)
}

/// `craft\fields\Categories`: a single `group:` source.
#[derive(Debug, Default)]
pub struct CategoriesResolver;

impl ReferenceResolver for CategoriesResolver {
    fn ids_to_handles(&self, settings: &mut TypeSettings, sources: &Sources<'_>) {
        export_single(settings, SOURCE, |value| {
            let token = RefToken::parse(value).filter(|t| t.prefix == TokenPrefix::Group)?;
            Some(match sources.by_key(SourceKind::CategoryGroup, &token.key) {
                Some(group) => Value::String(group.handle),
                None => Value::Array(Vec::new()),
            })
        });
    }

    fn handles_to_ids(&self, settings: &mut TypeSettings, sources: &Sources<'_>, report: &mut Report) {
        import_single(settings, SOURCE, ReferenceKind::Category, report, |handle| {
            sources
                .by_handle(SourceKind::CategoryGroup, handle)
                .map(|group| sources.token(TokenPrefix::Group, &group))
        });
    }
}

/// `craft\fields\Entries`: `section:`/`single:` sources and the `singles`
/// sentinel.
#[derive(Debug, Default)]
pub struct EntriesResolver;

impl ReferenceResolver for EntriesResolver {
    fn ids_to_handles(&self, settings: &mut TypeSettings, sources: &Sources<'_>) {
        export_list(settings, SOURCES, |item| {
            let value = item.as_str()?;
            token_handle(
                value,
                &[TokenPrefix::Section, TokenPrefix::Single],
                SourceKind::Section,
                sources,
            )
            .map(Value::String)
        });
    }

    fn handles_to_ids(&self, settings: &mut TypeSettings, sources: &Sources<'_>, report: &mut Report) {
        import_list(settings, SOURCES, |handle| {
            if let Some(section) = sources.by_handle(SourceKind::Section, handle) {
                let prefix = if section.is_single() {
                    TokenPrefix::Single
                } else {
                    TokenPrefix::Section
                };
                return Some(Value::String(sources.token(prefix, &section)));
            }
            if handle == SINGLES || handle == ALL {
                return Some(Value::String(handle.to_string()));
            }
            report.add_error(MigrationError::unresolvable(ReferenceKind::Section, handle));
            None
        });
    }
}

/// `craft\fields\Tags`: a single `taggroup:` source.
#[derive(Debug, Default)]
pub struct TagsResolver;

impl ReferenceResolver for TagsResolver {
    fn ids_to_handles(&self, settings: &mut TypeSettings, sources: &Sources<'_>) {
        export_single(settings, SOURCE, |value| {
            token_handle(value, &[TokenPrefix::TagGroup], SourceKind::TagGroup, sources)
                .map(Value::String)
        });
    }

    fn handles_to_ids(&self, settings: &mut TypeSettings, sources: &Sources<'_>, report: &mut Report) {
        import_single(settings, SOURCE, ReferenceKind::Tag, report, |handle| {
            sources
                .by_handle(SourceKind::TagGroup, handle)
                .map(|group| sources.token(TokenPrefix::TagGroup, &group))
        });
    }
}

/// `craft\fields\Users`: `group:` sources and the `admins` sentinel.
#[derive(Debug, Default)]
pub struct UsersResolver;

impl ReferenceResolver for UsersResolver {
    fn ids_to_handles(&self, settings: &mut TypeSettings, sources: &Sources<'_>) {
        export_list(settings, SOURCES, |item| {
            let value = item.as_str()?;
            token_handle(value, &[TokenPrefix::Group], SourceKind::UserGroup, sources).map(Value::String)
        });
    }

    fn handles_to_ids(&self, settings: &mut TypeSettings, sources: &Sources<'_>, report: &mut Report) {
        import_list(settings, SOURCES, |handle| {
            if let Some(group) = sources.by_handle(SourceKind::UserGroup, handle) {
                return Some(Value::String(sources.token(TokenPrefix::Group, &group)));
            }
            if handle == ADMINS || handle == ALL {
                return Some(Value::String(handle.to_string()));
            }
            report.add_error(MigrationError::unresolvable(ReferenceKind::UserGroup, handle));
            None
        });
    }
}
