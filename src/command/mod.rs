// src/command/mod.rs

//! The supervised command.
//!
//! A [`Command`] owns at most one process at a time. Starting a running
//! command restarts it; stopping an idle command is a logged no-op; after
//! [`Command::dispose`] every `start`/`stop` fails with `Disposed`.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, error};

use crate::errors::{Result, RunAsError};
use crate::process::{lock_unpoisoned, ProcessHandle, ProcessManager};

pub mod builder;

pub use builder::CommandBuilder;

/// Listener told about every unexpected exit of the command's process.
pub type ExitListener = Arc<dyn Fn() + Send + Sync>;

pub struct Command {
    name: String,
    executable: String,
    parameters: String,
    kill_children: bool,
    manager: Arc<dyn ProcessManager>,
    process: Option<Box<dyn ProcessHandle>>,
    listener: Arc<Mutex<Option<ExitListener>>>,
    disposed: bool,
}

impl Command {
    pub fn new(
        manager: Arc<dyn ProcessManager>,
        name: impl Into<String>,
        executable: impl Into<String>,
        parameters: impl Into<String>,
        kill_children: bool,
    ) -> Self {
        let command = Self {
            name: name.into(),
            executable: executable.into(),
            parameters: parameters.into(),
            kill_children,
            manager,
            process: None,
            listener: Arc::new(Mutex::new(None)),
            disposed: false,
        };
        debug!(command = %command, kill_children, "created command");
        command
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn parameters(&self) -> &str {
        &self.parameters
    }

    /// Whether stopping the command also kills the processes it spawned.
    pub fn kill_children(&self) -> bool {
        self.kill_children
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether a process is attached and still reported as running.
    pub fn is_running(&self) -> bool {
        self.process
            .as_ref()
            .and_then(|p| p.is_started().ok())
            .unwrap_or(false)
    }

    /// Id of the attached process, if any.
    pub fn process_id(&self) -> Option<u32> {
        self.process
            .as_ref()
            .and_then(|p| p.id().ok())
            .filter(|id| *id != 0)
    }

    /// Set the single listener for unexpected exits.
    pub fn on_exit(&self, listener: ExitListener) {
        *lock_unpoisoned(&self.listener) = Some(listener);
    }

    pub fn clear_exit_listener(&self) {
        lock_unpoisoned(&self.listener).take();
    }

    /// Launch a fresh process, tearing down any previous one first.
    ///
    /// A process the OS refuses to launch is logged and discarded; the
    /// command is then left idle.
    pub fn start(&mut self) -> Result<()> {
        if self.disposed {
            return Err(RunAsError::Disposed("command"));
        }

        if self.process.is_some() {
            self.clean();
        }

        let mut process = self
            .manager
            .create_process(&self.executable, &self.parameters)?;

        let listener = Arc::clone(&self.listener);
        let name = self.name.clone();
        process.subscribe_exit(Box::new(move || {
            error!(command = %name, "command has unexpectedly exited (maybe killed)");
            let listener = lock_unpoisoned(&listener).clone();
            if let Some(listener) = listener {
                listener();
            }
        }));

        match process.start() {
            Ok(true) => {
                debug!(command = %self, "started");
                self.process = Some(process);
            }
            Ok(false) => {
                process.dispose();
                error!(command = %self, "unable to start command: launch refused");
            }
            Err(e) => {
                process.dispose();
                error!(command = %self, error = %e, "unable to start command");
            }
        }

        Ok(())
    }

    /// Kill and release the current process. Absorbs kill/dispose failures.
    pub fn stop(&mut self) -> Result<()> {
        if self.disposed {
            return Err(RunAsError::Disposed("command"));
        }

        debug!(command = %self.name, "stopping");
        if self.process.is_some() {
            self.clean();
            debug!(command = %self.name, "stopped");
        } else {
            error!(command = %self.name, "command is not started; no need to stop it");
        }
        Ok(())
    }

    /// Stop once, then refuse any further use. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.clean();
        self.clear_exit_listener();
        self.disposed = true;
    }

    fn clean(&mut self) {
        let Some(mut process) = self.process.take() else {
            return;
        };

        // Unsubscribe before terminating: the kill must not be reported as
        // an unexpected exit.
        process.unsubscribe_exit();

        match process.is_started() {
            Ok(true) => {
                if let Err(e) = self.manager.terminate(process.as_mut(), self.kill_children) {
                    error!(command = %self.name, error = %e, "command can't be killed");
                }
            }
            Ok(false) => {}
            Err(e) => {
                error!(command = %self.name, error = %e, "cannot query process state");
            }
        }

        process.dispose();
    }
}

impl Drop for Command {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: \"{}\" {}", self.name, self.executable, self.parameters)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("executable", &self.executable)
            .field("parameters", &self.parameters)
            .field("kill_children", &self.kill_children)
            .field("running", &self.is_running())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
