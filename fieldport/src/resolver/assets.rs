use serde_json::Value;

use super::{export_list, export_single, import_list, import_single, ReferenceResolver, Sources};
use crate::config::AssetTokenStyle;
use crate::error::{MigrationError, ReferenceKind};
use crate::live::SourceKind;
use crate::report::Report;
use crate::token::{RefToken, TokenPrefix, ALL};
use crate::types::TypeSettings;

pub(crate) const SOURCES: &str = "sources";
pub(crate) const DEFAULT_UPLOAD_LOCATION: &str = "defaultUploadLocationSource";
pub(crate) const SINGLE_UPLOAD_LOCATION: &str = "singleUploadLocationSource";

/// Volume handle behind a `folder:` or `volume:` token.
pub(crate) fn location_handle(value: &str, sources: &Sources<'_>) -> Option<String> {
    let token = RefToken::parse(value)?;
    let volume = match token.prefix {
        TokenPrefix::Folder => {
            let folder = sources.by_key(SourceKind::Folder, &token.key)?;
            sources.by_id(SourceKind::Volume, folder.volume_id?)?
        }
        TokenPrefix::Volume => sources.by_key(SourceKind::Volume, &token.key)?,
        _ => return None,
    };
    Some(volume.handle)
}

/// Live token for a volume handle.
pub(crate) fn location_token(handle: &str, sources: &Sources<'_>) -> Option<String> {
    let volume = sources.by_handle(SourceKind::Volume, handle)?;
    match sources.asset_tokens() {
        AssetTokenStyle::Volume => Some(sources.token(TokenPrefix::Volume, &volume)),
        AssetTokenStyle::Folder => {
            let folder = sources.root_folder(volume.id)?;
            Some(sources.token(TokenPrefix::Folder, &folder))
        }
    }
}

/// `craft\fields\Assets`: source list and upload locations.
#[derive(Debug, Default)]
pub struct AssetsResolver;

impl ReferenceResolver for AssetsResolver {
    fn ids_to_handles(&self, settings: &mut TypeSettings, sources: &Sources<'_>) {
        export_list(settings, SOURCES, |item| {
            item.as_str()
                .and_then(|value| location_handle(value, sources))
                .map(Value::String)
        });
        for key in [DEFAULT_UPLOAD_LOCATION, SINGLE_UPLOAD_LOCATION] {
            export_single(settings, key, |value| {
                location_handle(value, sources).map(Value::String)
            });
        }
    }

    fn handles_to_ids(&self, settings: &mut TypeSettings, sources: &Sources<'_>, report: &mut Report) {
        import_list(settings, SOURCES, |handle| {
            if handle == ALL {
                return Some(Value::String(handle.to_string()));
            }
            match location_token(handle, sources) {
                Some(token) => Some(Value::String(token)),
                None => {
                    report.add_error(MigrationError::unresolvable(ReferenceKind::AssetSource, handle));
                    None
                }
            }
        });
        for key in [DEFAULT_UPLOAD_LOCATION, SINGLE_UPLOAD_LOCATION] {
            import_single(settings, key, ReferenceKind::AssetSource, report, |handle| {
                location_token(handle, sources)
            });
        }
    }
}
