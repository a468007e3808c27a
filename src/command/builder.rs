// src/command/builder.rs

use std::sync::Arc;

use tracing::{debug, error};

use crate::config::Settings;
use crate::errors::{Result, RunAsError};
use crate::process::ProcessManager;

use super::Command;

/// Builds [`Command`]s from configuration.
#[derive(Clone)]
pub struct CommandBuilder {
    manager: Arc<dyn ProcessManager>,
}

impl CommandBuilder {
    pub fn new(manager: Arc<dyn ProcessManager>) -> Self {
        Self { manager }
    }

    /// Build the command called `name` from:
    ///
    /// - `executable` (mandatory)
    /// - `parameters` (default: empty)
    /// - `killProcessTree` (default: `false`)
    pub fn build_command(&self, settings: &Settings, name: &str) -> Result<Command> {
        debug!("reading command configuration");

        let executable = settings.value("executable");
        if executable.trim().is_empty() {
            error!("executable is mandatory to start the command");
            return Err(RunAsError::ConfigError(
                "Executable is mandatory to start the command.".to_string(),
            ));
        }

        let parameters = settings.value("parameters");
        let kill_children = settings.bool_value("killProcessTree")?.unwrap_or(false);

        Ok(Command::new(
            Arc::clone(&self.manager),
            name,
            executable,
            parameters,
            kill_children,
        ))
    }
}
