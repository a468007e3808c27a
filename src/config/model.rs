// src/config/model.rs

use serde::Deserialize;

/// Top-level service identity, deserialized from the root of the
/// configuration file:
///
/// ```toml
/// name = "myapp"
/// displayName = "My App"
/// description = "Keeps myapp alive"
/// exitHooks = "EmailNotifyHook, RestartHook"
///
/// executable = "/opt/myapp/bin/myapp"
/// parameters = "--port 8080"
/// killProcessTree = true
///
/// [restart]
/// times = 3
/// ```
///
/// Command and hook settings (`executable`, `restart/times`, `email/*`, ...)
/// are not part of this struct; they are read lazily through
/// [`Settings`](super::Settings) by the component that owns them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawServiceSection {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub description: String,

    /// Comma-separated hook names, run in order after an unexpected exit.
    #[serde(default)]
    pub exit_hooks: String,
}

/// Validated service identity.
///
/// Construct through `ServiceInfo::try_from(RawServiceSection)` or
/// [`ServiceInfo::from_settings`](super::validate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub exit_hooks: String,
}

impl ServiceInfo {
    pub(crate) fn new_unchecked(raw: RawServiceSection) -> Self {
        let display_name = raw
            .display_name
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| raw.name.clone());

        Self {
            name: raw.name,
            display_name,
            description: raw.description,
            exit_hooks: raw.exit_hooks,
        }
    }

    /// Hook names in configured order, trimmed, empty entries removed.
    pub fn hook_names(&self) -> Vec<&str> {
        split_hook_names(&self.exit_hooks)
    }
}

/// Split a comma-separated hook list.
pub fn split_hook_names(names: &str) -> Vec<&str> {
    names
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect()
}
