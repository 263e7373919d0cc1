//! SiteContext, a [`Site`] persisted as YAML files.
//!
//! ```text
//! <root>/
//!   site.yaml       ← counters, field groups, sources, layouts
//!   fields/         ← one .yaml per top-level field
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use ulid::Ulid;

use crate::error::{Result, SiteError};
use crate::site::Site;
use crate::snapshot::{FieldFile, SiteManifest};

const MANIFEST_FILE: &str = "site.yaml";
const FIELDS_DIR: &str = "fields";

/// Builder for `SiteContext`. Created by `SiteContext::open()`.
pub struct SiteContextBuilder {
    root: PathBuf,
    seed: Option<Site>,
}

impl SiteContextBuilder {
    /// Use `site` when the directory holds no manifest yet.
    pub fn with_seed(mut self, site: Site) -> Self {
        self.seed = Some(site);
        self
    }

    /// Create directories and load whatever is on disk.
    pub async fn build(self) -> Result<SiteContext> {
        let root = self.root;
        fs::create_dir_all(root.join(FIELDS_DIR)).await?;

        let manifest_path = root.join(MANIFEST_FILE);
        let site = if manifest_path.exists() {
            let content = fs::read_to_string(&manifest_path).await?;
            let manifest: SiteManifest = serde_yaml::from_str(&content)?;
            let fields = load_fields(&root.join(FIELDS_DIR)).await?;
            check_groups(&manifest_path, &manifest, &fields)?;
            Site::from_snapshot(manifest, fields)
        } else {
            self.seed.unwrap_or_default()
        };

        debug!(
            root = %root.display(),
            fields = site.fields().len(),
            groups = site.groups().len(),
            "site context opened"
        );
        Ok(SiteContext { root, site })
    }
}

async fn load_fields(dir: &Path) -> Result<Vec<FieldFile>> {
    let mut fields = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
            continue;
        }
        let content = fs::read_to_string(&path).await?;
        match serde_yaml::from_str::<FieldFile>(&content) {
            Ok(file) => fields.push(file),
            Err(e) => warn!(?path, %e, "skipping invalid field file"),
        }
    }
    Ok(fields)
}

fn check_groups(path: &Path, manifest: &SiteManifest, fields: &[FieldFile]) -> Result<()> {
    let groups: HashSet<_> = manifest.groups.iter().map(|g| g.id).collect();
    for file in fields {
        if let Some(group_id) = file.field.group_id {
            if !groups.contains(&group_id) {
                return Err(SiteError::InvalidSnapshot {
                    path: path.to_path_buf(),
                    message: format!(
                        "field {} refers to field group {group_id}, which does not exist",
                        file.field.handle
                    ),
                });
            }
        }
    }
    Ok(())
}

/// A site directory on disk with its loaded [`Site`].
///
/// Changes made through [`SiteContext::site_mut`] stay in memory until
/// [`SiteContext::save`].
pub struct SiteContext {
    root: PathBuf,
    site: Site,
}

impl SiteContext {
    /// Open or create a site directory.
    ///
    /// ```rust,ignore
    /// let mut ctx = SiteContext::open(path).build().await?;
    /// migration.import(ctx.site_mut(), doc)?;
    /// ctx.save().await?;
    /// ```
    pub fn open(root: impl Into<PathBuf>) -> SiteContextBuilder {
        SiteContextBuilder {
            root: root.into(),
            seed: None,
        }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn site_mut(&mut self) -> &mut Site {
        &mut self.site
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the manifest and every field file, removing files of fields
    /// that no longer exist.
    pub async fn save(&self) -> Result<()> {
        let (manifest, fields) = self.site.to_snapshot();
        let fields_dir = self.root.join(FIELDS_DIR);
        fs::create_dir_all(&fields_dir).await?;

        let mut written = HashSet::new();
        for file in &fields {
            let name = format!("{}.yaml", file.field.handle);
            let yaml = serde_yaml::to_string(file)?;
            atomic_write(&fields_dir.join(&name), yaml.as_bytes()).await?;
            written.insert(name);
        }

        let mut entries = fs::read_dir(&fields_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let stale = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !written.contains(n));
            if stale {
                debug!(?path, "removing stale field file");
                fs::remove_file(&path).await?;
            }
        }

        let yaml = serde_yaml::to_string(&manifest)?;
        atomic_write(&self.root.join(MANIFEST_FILE), yaml.as_bytes()).await?;
        debug!(root = %self.root.display(), fields = fields.len(), "site saved");
        Ok(())
    }
}

/// Write to a temp file then rename for atomic persistence.
async fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent dir"))?;
    let tmp = dir.join(format!(".tmp_{}", Ulid::new()));
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
