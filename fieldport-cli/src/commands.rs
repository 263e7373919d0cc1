//! `export` and `import` against a site snapshot directory.

use std::path::Path;

use anyhow::{bail, Context};
use fieldport::{FieldContext, FieldDef, FieldMigration, FieldRepository, MigrationConfig, RecordId};
use fieldport_site::SiteContext;
use serde::Deserialize;
use tracing::{info, warn};

/// A document holds either one field or an array of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Many(Vec<FieldDef>),
    One(Box<FieldDef>),
}

pub fn parse_document(content: &str) -> anyhow::Result<Vec<FieldDef>> {
    let document: Document =
        serde_json::from_str(content).context("document is not a field or an array of fields")?;
    Ok(match document {
        Document::Many(fields) => fields,
        Document::One(field) => vec![*field],
    })
}

/// Export the named fields, or every top-level field, and return the
/// document together with the manifest.
pub async fn export(
    mut config: MigrationConfig,
    site: &Path,
    handles: &[String],
    all: bool,
    with_ids: bool,
) -> anyhow::Result<(String, Vec<String>)> {
    if !all && handles.is_empty() {
        bail!("nothing to export: pass --handle or --all");
    }
    config.include_ids |= with_ids;

    let ctx = SiteContext::open(site)
        .build()
        .await
        .with_context(|| format!("opening site {}", site.display()))?;
    let mut migration = FieldMigration::new(config);

    let fields = if all {
        migration.export_all(ctx.site(), false)
    } else {
        let mut fields = Vec::with_capacity(handles.len());
        for handle in handles {
            let Some(field) = ctx.site().field_by_handle(handle, &FieldContext::Global) else {
                bail!("no field with handle {handle}");
            };
            fields.push(migration.export(ctx.site(), field.id, false)?);
        }
        fields
    };

    let json = serde_json::to_string_pretty(&fields)?;
    Ok((json, migration.report().manifest().to_vec()))
}

/// Outcome of an import run.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub imported: Vec<(String, RecordId)>,
    pub failed: Vec<String>,
    pub issues: Vec<String>,
}

impl ImportSummary {
    pub fn exit_code(&self) -> i32 {
        if self.failed.is_empty() {
            0
        } else {
            1
        }
    }
}

/// Import every field of `file` in order, then save the site. A field that
/// fails does not stop the ones after it.
pub async fn import(config: MigrationConfig, site: &Path, file: &Path) -> anyhow::Result<ImportSummary> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let fields = parse_document(&content)?;

    let mut ctx = SiteContext::open(site)
        .build()
        .await
        .with_context(|| format!("opening site {}", site.display()))?;
    let mut migration = FieldMigration::new(config);
    let mut summary = ImportSummary::default();

    for field in fields {
        let handle = field.handle.clone();
        match migration.import(ctx.site_mut(), field) {
            Ok(id) => summary.imported.push((handle, id)),
            Err(err) => {
                warn!(handle = %handle, "import failed: {err}");
                summary.failed.push(handle);
            }
        }
    }

    ctx.save()
        .await
        .with_context(|| format!("saving site {}", site.display()))?;
    summary.issues = migration.take_report().messages();
    info!(
        imported = summary.imported.len(),
        failed = summary.failed.len(),
        "import finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldport::{field_types, BlockTypeDef, ItemKey};
    use fieldport_site::Site;
    use serde_json::json;
    use tempfile::TempDir;

    async fn seeded(dir: &Path) {
        let mut site = Site::new();
        site.add_volume("images");
        let hero = FieldDef::new("hero", "Hero", field_types::ASSETS)
            .with_setting("sources", json!([]));
        site.add_field("Content", hero).unwrap();
        let body = FieldDef::new("body", "Body", field_types::MATRIX).with_block_type(
            BlockTypeDef::new(ItemKey::Pending(1), "Text", "text")
                .with_field(FieldDef::new("copy", "Copy", field_types::PLAIN_TEXT)),
        );
        site.add_field("Content", body).unwrap();
        let ctx = SiteContext::open(dir).with_seed(site).build().await.unwrap();
        ctx.save().await.unwrap();
    }

    #[test]
    fn single_field_documents_are_accepted() {
        let one = parse_document(r#"{ "name": "Hero", "handle": "hero", "type": "x" }"#).unwrap();
        assert_eq!(one.len(), 1);
        let many = parse_document(r#"[{ "name": "A", "handle": "a", "type": "x" }]"#).unwrap();
        assert_eq!(many[0].handle, "a");
        assert!(parse_document("42").is_err());
    }

    #[test_log::test(tokio::test)]
    async fn export_requires_a_selection() {
        let temp = TempDir::new().unwrap();
        let err = export(MigrationConfig::default(), temp.path(), &[], false, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nothing to export"));
    }

    #[test_log::test(tokio::test)]
    async fn export_then_import_into_a_fresh_site() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        seeded(&source).await;

        let (json, manifest) = export(MigrationConfig::default(), &source, &[], true, false)
            .await
            .unwrap();
        assert_eq!(manifest, ["hero", "body"]);

        let file = temp.path().join("fields.json");
        tokio::fs::write(&file, &json).await.unwrap();
        let target = temp.path().join("target");
        let summary = import(MigrationConfig::default(), &target, &file).await.unwrap();

        assert_eq!(summary.exit_code(), 0);
        assert_eq!(summary.imported.len(), 2);
        assert!(summary.issues.is_empty(), "{:?}", summary.issues);
        assert!(target.join("fields").join("body.yaml").exists());
    }

    #[test_log::test(tokio::test)]
    async fn unknown_handle_fails_the_export() {
        let temp = TempDir::new().unwrap();
        seeded(temp.path()).await;
        let handles = vec!["missing".to_string()];
        let err = export(MigrationConfig::default(), temp.path(), &handles, false, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test_log::test(tokio::test)]
    async fn failed_fields_do_not_stop_the_batch() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("fields.json");
        let document = json!([
            { "name": "Bad", "handle": "2bad", "type": field_types::PLAIN_TEXT },
            { "name": "Good", "handle": "good", "type": field_types::PLAIN_TEXT },
        ]);
        tokio::fs::write(&file, document.to_string()).await.unwrap();

        let summary = import(MigrationConfig::default(), &temp.path().join("site"), &file)
            .await
            .unwrap();

        assert_eq!(summary.failed, ["2bad"]);
        assert_eq!(summary.imported[0].0, "good");
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(summary.issues.len(), 1);
    }
}
