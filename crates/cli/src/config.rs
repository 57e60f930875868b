//! Client configuration: file, environment and flags.

use anyhow::Result;
use cmsweep_core::SessionConfig;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::path::{Path, PathBuf};

pub const CLIENT_CONFIG_ENV: &str = "CMSWEEP_CLIENT_CONFIG";

/// Location of `client.toml`: explicit path, then `$CMSWEEP_CLIENT_CONFIG`,
/// then the XDG config directory.
pub fn client_config_path(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = std::env::var_os(CLIENT_CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(path) => PathBuf::from(path),
        None => {
            let home = std::env::var_os("HOME")
                .ok_or_else(|| anyhow::anyhow!("HOME not set; set {CLIENT_CONFIG_ENV}"))?;
            PathBuf::from(home).join(".config")
        }
    };

    Ok(base.join("cmsweep").join("client.toml"))
}

/// Merge the config file (if present) with `CMSWEEP_*` environment variables.
pub fn load_client_config(path: &Path) -> Result<SessionConfig> {
    let mut figment = Figment::new();

    if path.exists() {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("CMSWEEP_").split("__"));

    match figment.extract() {
        Ok(config) => Ok(config),
        Err(_) if !path.exists() => Ok(SessionConfig::default()),
        Err(err) => Err(anyhow::anyhow!(err).context("failed to load client configuration")),
    }
}
