//! Layered loading of [`MigrationConfig`].
//!
//! Precedence, lowest first: built-in defaults, `fieldport.yaml`,
//! `fieldport.toml`, an explicit `--config` file, `FIELDPORT_*` variables.

use std::path::Path;

use anyhow::{bail, Context};
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use fieldport::MigrationConfig;
use tracing::debug;

const ENV_PREFIX: &str = "FIELDPORT_";

/// Defaults merged with the config files found in `dir` and `explicit`.
fn file_figment(dir: &Path, explicit: Option<&Path>) -> anyhow::Result<Figment> {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(MigrationConfig::default()))
        .merge(Yaml::file(dir.join("fieldport.yaml")))
        .merge(Toml::file(dir.join("fieldport.toml")));

    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("config file {} does not exist", path.display());
        }
        figment = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => figment.merge(Toml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => figment.merge(Yaml::file(path)),
        };
    }
    Ok(figment)
}

pub fn load_config(dir: &Path, explicit: Option<&Path>) -> anyhow::Result<MigrationConfig> {
    let config: MigrationConfig = file_figment(dir, explicit)?
        .merge(Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().into()))
        .extract()
        .context("invalid fieldport configuration")?;
    debug!(?config, "loaded configuration");
    Ok(config)
}
