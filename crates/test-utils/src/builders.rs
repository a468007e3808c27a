// crates/test-utils/src/builders.rs

#![allow(dead_code)]

use runasd::config::{ServiceInfo, Settings};
use toml::{Table, Value};

/// Builder for `Settings` to simplify test setup.
///
/// Keys are `/`-separated paths, the same way components read them.
pub struct SettingsBuilder {
    root: Table,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self { root: Table::new() }
    }

    /// A minimal valid service: `name` + `executable`.
    pub fn service(name: &str, executable: &str) -> Self {
        Self::new().with("name", name).with("executable", executable)
    }

    pub fn with(self, path: &str, value: impl Into<Value>) -> Self {
        self.with_value(path, value.into())
    }

    pub fn with_list(self, path: &str, values: &[&str]) -> Self {
        let list = values.iter().map(|v| Value::String(v.to_string())).collect();
        self.with_value(path, Value::Array(list))
    }

    pub fn parameters(self, parameters: &str) -> Self {
        self.with("parameters", parameters)
    }

    pub fn exit_hooks(self, hooks: &str) -> Self {
        self.with("exitHooks", hooks)
    }

    pub fn restart_times(self, times: i64) -> Self {
        self.with("restart/times", times)
    }

    pub fn kill_process_tree(self, kill: bool) -> Self {
        self.with("killProcessTree", kill)
    }

    /// A complete, valid `email` section.
    pub fn email(self, host: &str, to: &str, from: &str) -> Self {
        self.with("email/smtp/host", host)
            .with("email/address/to", to)
            .with("email/address/from", from)
    }

    pub fn build(self) -> Settings {
        Settings::new(self.root)
    }

    /// Settings plus the validated service identity.
    pub fn build_with_info(self) -> (Settings, ServiceInfo) {
        let settings = self.build();
        let info = ServiceInfo::from_settings(&settings)
            .expect("Failed to build valid service info from builder");
        (settings, info)
    }

    fn with_value(mut self, path: &str, value: Value) -> Self {
        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let last = segments.pop().expect("settings path must not be empty");

        let mut table = &mut self.root;
        for segment in segments {
            let entry = table
                .entry(segment.to_string())
                .or_insert_with(|| Value::Table(Table::new()));
            table = entry
                .as_table_mut()
                .expect("settings path goes through a non-table value");
        }
        table.insert(last.to_string(), value);
        self
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
