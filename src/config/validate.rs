// src/config/validate.rs

use toml::Value;

use crate::config::model::{RawServiceSection, ServiceInfo};
use crate::config::Settings;
use crate::errors::{Result, RunAsError};

impl TryFrom<RawServiceSection> for ServiceInfo {
    type Error = RunAsError;

    fn try_from(raw: RawServiceSection) -> std::result::Result<Self, Self::Error> {
        validate_service_section(&raw)?;
        Ok(ServiceInfo::new_unchecked(raw))
    }
}

impl ServiceInfo {
    /// Deserialize and validate the service identity from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let raw: RawServiceSection = Value::Table(settings.root().clone()).try_into()?;
        ServiceInfo::try_from(raw)
    }
}

fn validate_service_section(raw: &RawServiceSection) -> Result<()> {
    if raw.name.trim().is_empty() {
        return Err(RunAsError::ConfigError(
            "`name` is mandatory to identify the service".to_string(),
        ));
    }
    Ok(())
}

/// Check the settings a service needs before anything is started.
///
/// This checks:
/// - the service identity (`name`)
/// - `executable` is present
/// - `killProcessTree`, when present, is a boolean
///
/// Hook-specific settings are validated by each hook when it is configured;
/// a hook with bad settings is kept but disabled.
pub fn validate_settings(settings: &Settings) -> Result<ServiceInfo> {
    let info = ServiceInfo::from_settings(settings)?;

    if settings.value("executable").trim().is_empty() {
        return Err(RunAsError::ConfigError(
            "Executable is mandatory to start the command.".to_string(),
        ));
    }
    settings.bool_value("killProcessTree")?;

    Ok(info)
}
