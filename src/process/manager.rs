// src/process/manager.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, error};

use crate::errors::{Result, RunAsError};

use super::handle::{ChildProcess, LaunchSpec, ProcessHandle};
use super::tree::{kill_descendants, ProcessTable, SysinfoProcessTable};

/// Creates process handles and terminates them.
///
/// Production code uses [`SystemProcessManager`]; tests can provide
/// [`FakeProcessManager`](super::mock::FakeProcessManager) which never
/// touches the OS.
pub trait ProcessManager: Send + Sync {
    /// Build a not-yet-started handle for `executable` with `parameters`.
    ///
    /// Fails with [`RunAsError::NotFound`] if the executable path cannot be
    /// split into a directory and a file name.
    fn create_process(&self, executable: &str, parameters: &str) -> Result<Box<dyn ProcessHandle>>;

    /// Kill the process, or the process and all its descendants when
    /// `kill_children` is set.
    fn terminate(&self, process: &mut dyn ProcessHandle, kill_children: bool) -> Result<()>;
}

/// Process manager for the running OS.
pub struct SystemProcessManager {
    table: Arc<dyn ProcessTable>,
}

impl SystemProcessManager {
    pub fn new() -> Self {
        Self::with_table(Arc::new(SysinfoProcessTable::new()))
    }

    pub fn with_table(table: Arc<dyn ProcessTable>) -> Self {
        Self { table }
    }
}

impl Default for SystemProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessManager for SystemProcessManager {
    fn create_process(&self, executable: &str, parameters: &str) -> Result<Box<dyn ProcessHandle>> {
        let spec = resolve_launch_spec(executable, parameters)?;
        debug!(?spec, "process prepared");
        Ok(Box::new(ChildProcess::new(spec)))
    }

    fn terminate(&self, process: &mut dyn ProcessHandle, kill_children: bool) -> Result<()> {
        let walked = if kill_children {
            let pid = process.id()?;
            kill_descendants(self.table.as_ref(), pid)
                .map(|_| ())
                .inspect_err(|e| error!(pid, error = %e, "cannot walk the process tree"))
        } else {
            Ok(())
        };

        // The root goes down even when its descendants could not be listed.
        process.kill()?;
        walked
    }
}

/// Turn a configured executable + argument string into a [`LaunchSpec`].
///
/// The working directory is the executable's directory. A bare program name
/// (no directory part) is resolved through `PATH` from the current
/// directory.
pub fn resolve_launch_spec(executable: &str, parameters: &str) -> Result<LaunchSpec> {
    let path = Path::new(executable.trim());

    let (file_name, dir) = match (path.file_name(), path.parent()) {
        (Some(file_name), Some(dir)) => (file_name, dir),
        _ => {
            error!(executable, "executable not found");
            return Err(RunAsError::NotFound(format!("executable {executable} not found!")));
        }
    };

    let args = split_arguments(parameters);

    if dir.as_os_str().is_empty() {
        return Ok(LaunchSpec {
            program: PathBuf::from(file_name),
            args,
            working_dir: None,
        });
    }

    let dir = std::path::absolute(dir)?;
    Ok(LaunchSpec {
        program: dir.join(file_name),
        args,
        working_dir: Some(dir),
    })
}

static ARGUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]*)"|'([^']*)'|(\S+)"#).expect("argument pattern is valid")
});

/// Split an argument string into words. Double or single quotes group
/// words containing spaces.
pub fn split_arguments(parameters: &str) -> Vec<String> {
    ARGUMENT
        .captures_iter(parameters)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str().to_string())
        .collect()
}
