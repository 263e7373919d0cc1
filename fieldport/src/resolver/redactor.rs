use serde_json::Value;

use super::assets::{location_handle, location_token, DEFAULT_UPLOAD_LOCATION, SINGLE_UPLOAD_LOCATION};
use super::{export_single, import_list, import_single, ReferenceResolver, Sources};
use crate::error::{MigrationError, ReferenceKind};
use crate::live::SourceKind;
use crate::report::Report;
use crate::types::TypeSettings;

const AVAILABLE_VOLUMES: &str = "availableVolumes";
const AVAILABLE_TRANSFORMS: &str = "availableTransforms";

/// `craft\redactor\Field`: available volumes, upload locations and image
/// transforms. Volume and transform lists hold bare keys rather than tokens.
#[derive(Debug, Default)]
pub struct RedactorResolver;

impl RedactorResolver {
    fn handles_in_place(settings: &mut TypeSettings, key: &str, kind: SourceKind, sources: &Sources<'_>) {
        if let Some(Value::Array(items)) = settings.get_mut(key) {
            for item in items.iter_mut() {
                if let Some(record) = sources.by_value(kind, item) {
                    *item = Value::String(record.handle);
                }
            }
        }
    }
}

impl ReferenceResolver for RedactorResolver {
    fn ids_to_handles(&self, settings: &mut TypeSettings, sources: &Sources<'_>) {
        // A string here is `*` or empty and means "all" or "none".
        if settings.contains(AVAILABLE_VOLUMES) {
            Self::handles_in_place(settings, AVAILABLE_VOLUMES, SourceKind::Volume, sources);
        } else {
            settings.set(AVAILABLE_VOLUMES, Value::Array(Vec::new()));
        }

        for key in [DEFAULT_UPLOAD_LOCATION, SINGLE_UPLOAD_LOCATION] {
            export_single(settings, key, |value| {
                location_handle(value, sources)
                    .or_else(|| sources.by_key(SourceKind::Volume, value).map(|v| v.handle))
                    .map(Value::String)
            });
        }

        Self::handles_in_place(settings, AVAILABLE_TRANSFORMS, SourceKind::ImageTransform, sources);
    }

    fn handles_to_ids(&self, settings: &mut TypeSettings, sources: &Sources<'_>, report: &mut Report) {
        import_list(settings, AVAILABLE_VOLUMES, |handle| {
            match sources.by_handle(SourceKind::Volume, handle) {
                Some(volume) => Some(sources.value(&volume)),
                None => {
                    report.add_error(MigrationError::unresolvable(ReferenceKind::AssetVolume, handle));
                    None
                }
            }
        });

        for key in [DEFAULT_UPLOAD_LOCATION, SINGLE_UPLOAD_LOCATION] {
            import_single(settings, key, ReferenceKind::AssetSource, report, |handle| {
                location_token(handle, sources)
            });
        }

        import_list(settings, AVAILABLE_TRANSFORMS, |handle| {
            match sources.by_handle(SourceKind::ImageTransform, handle) {
                Some(transform) => Some(Value::from(transform.id)),
                None => {
                    report.add_error(MigrationError::unresolvable(ReferenceKind::ImageTransform, handle));
                    None
                }
            }
        });
    }
}
