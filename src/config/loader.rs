// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::ServiceInfo;
use crate::config::settings::Settings;
use crate::config::validate::validate_settings;
use crate::errors::Result;

/// File name looked up next to the `runasd` binary when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "runasd.toml";

/// Load a configuration file from a given path.
///
/// This only performs TOML parsing; it does **not** check that mandatory
/// values are present. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading configuration file");

    let contents = fs::read_to_string(path)?;
    Settings::from_toml_str(&contents)
}

/// Load a configuration file from path and run basic validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Checks for:
///   - a non-empty service `name`,
///   - a non-empty `executable`,
///   - a well-formed `killProcessTree`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<(Settings, ServiceInfo)> {
    let settings = load_from_path(&path)?;
    let info = validate_settings(&settings)?;
    Ok((settings, info))
}

/// Resolve the default config path: `runasd.toml` in the directory that
/// holds the running binary, or the current directory if that cannot be
/// determined.
pub fn default_config_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_CONFIG_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
