// src/service/mod.rs

//! The owning service.
//!
//! [`Service`] holds the single active command and the hook repository.
//! Exit notifications from the command are turned into
//! [`ServiceEvent::CommandExited`] and handled by [`ServiceRuntime`], which
//! serializes them with shutdown requests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::command::{Command, CommandBuilder};
use crate::config::{ServiceInfo, Settings};
use crate::errors::{Result, RunAsError};
use crate::hooks::{HookRepository, MailTransport, ServiceControl};
use crate::process::lock_unpoisoned;

pub mod runtime;

pub use runtime::ServiceRuntime;

/// Events flowing into the service runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceEvent {
    /// The command started as `generation` exited on its own.
    CommandExited { generation: u64 },
    /// Graceful shutdown requested (e.g. Ctrl-C, SIGTERM).
    ShutdownRequested,
}

#[derive(Default)]
struct ServiceState {
    command: Option<Command>,
    /// Bumped for every command started, so late exits of an older command
    /// can be told apart.
    generation: u64,
    disposed: bool,
}

pub struct Service {
    info: ServiceInfo,
    settings: Settings,
    builder: CommandBuilder,
    state: Mutex<ServiceState>,
    hooks: Mutex<HookRepository>,
    stopped: AtomicBool,
    reset_pending: AtomicBool,
    events: mpsc::UnboundedSender<ServiceEvent>,
}

impl Service {
    /// Create the service and the receiving end of its event channel.
    ///
    /// Hooks listed in `exitHooks` are built and configured immediately.
    pub fn new(
        info: ServiceInfo,
        settings: Settings,
        builder: CommandBuilder,
        mailer: Arc<dyn MailTransport>,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<ServiceEvent>)> {
        let (events, events_rx) = mpsc::unbounded_channel();

        let service = Arc::new_cyclic(|weak: &Weak<Service>| {
            let control: Weak<dyn ServiceControl> = weak.clone();
            let hooks = HookRepository::unloaded(
                info.exit_hooks.clone(),
                settings.clone(),
                control,
                mailer,
            );

            Service {
                info,
                settings,
                builder,
                state: Mutex::new(ServiceState::default()),
                hooks: Mutex::new(hooks),
                stopped: AtomicBool::new(true),
                reset_pending: AtomicBool::new(false),
                events,
            }
        });

        lock_unpoisoned(&service.hooks).reset()?;
        debug!(service = %service.info.display_name, "initialized");

        Ok((service, events_rx))
    }

    pub fn info(&self) -> &ServiceInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Sender for events into this service's runtime.
    pub fn events(&self) -> mpsc::UnboundedSender<ServiceEvent> {
        self.events.clone()
    }

    /// Run `f` against the hook repository.
    pub fn with_hooks<R>(&self, f: impl FnOnce(&HookRepository) -> R) -> R {
        f(&lock_unpoisoned(&self.hooks))
    }

    /// Whether a command is currently attached.
    pub fn has_command(&self) -> bool {
        lock_unpoisoned(&self.state).command.is_some()
    }

    /// Id of the running command's process, if any.
    pub fn command_process_id(&self) -> Option<u32> {
        lock_unpoisoned(&self.state)
            .command
            .as_ref()
            .and_then(Command::process_id)
    }

    /// Service start: launch the command.
    pub fn start(&self) -> Result<()> {
        info!(service = %self.info.display_name, "starting");
        self.start_command()
    }

    /// Tear the command down for good. Later `start_command` calls fail.
    pub fn dispose(&self) {
        let command = {
            let mut state = lock_unpoisoned(&self.state);
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.command.take()
        };

        if let Some(mut command) = command {
            command.clear_exit_listener();
            command.dispose();
        }
        debug!(service = %self.info.display_name, "disposed");
    }

    /// React to the exit of the command started as `generation`.
    ///
    /// Stale notifications (the command was already stopped or replaced)
    /// are ignored. Otherwise the exited command is released and every
    /// hook runs in order.
    pub fn handle_command_exited(&self, generation: u64) {
        let command = {
            let mut state = lock_unpoisoned(&self.state);
            if state.generation != generation || state.command.is_none() {
                debug!(generation, current = state.generation, "ignoring stale exit notification");
                return;
            }
            state.command.take()
        };

        if let Some(mut command) = command {
            command.clear_exit_listener();
            command.dispose();
        }

        let mut hooks = lock_unpoisoned(&self.hooks);
        let acted = hooks.launch_all();
        debug!(acted, "exit hooks done");

        if self.reset_pending.swap(false, Ordering::SeqCst) {
            if let Err(e) = hooks.reset() {
                error!(error = %e, "cannot reset exit hooks");
            }
        }
    }

    fn reset_hooks(&self) {
        // A hook chain in progress holds the lock; it resets when it is done.
        self.reset_pending.store(true, Ordering::SeqCst);
        if let Ok(mut hooks) = self.hooks.try_lock() {
            if self.reset_pending.swap(false, Ordering::SeqCst) {
                if let Err(e) = hooks.reset() {
                    error!(error = %e, "cannot reset exit hooks");
                }
            }
        }
    }
}

impl ServiceControl for Service {
    fn display_name(&self) -> &str {
        &self.info.display_name
    }

    fn description(&self) -> &str {
        &self.info.description
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn start_command(&self) -> Result<()> {
        self.stopped.store(false, Ordering::SeqCst);

        let mut state = lock_unpoisoned(&self.state);
        if state.disposed {
            error!(service = %self.info.name, "service is disposed");
            return Err(RunAsError::Disposed("service"));
        }
        if state.command.is_some() {
            error!(service = %self.info.name, "cannot start twice the command");
            return Err(RunAsError::AlreadyRunning(self.info.name.clone()));
        }

        let mut command = self.builder.build_command(&self.settings, &self.info.name)?;

        state.generation += 1;
        let generation = state.generation;
        let events = self.events.clone();
        command.on_exit(Arc::new(move || {
            if events.send(ServiceEvent::CommandExited { generation }).is_err() {
                warn!(generation, "service runtime is gone; exit not handled");
            }
        }));

        command.start()?;
        state.command = Some(command);
        Ok(())
    }

    fn stop(&self) {
        debug!(service = %self.info.display_name, "stopping");

        let command = lock_unpoisoned(&self.state).command.take();
        if let Some(mut command) = command {
            command.clear_exit_listener();
            if let Err(e) = command.stop() {
                error!(error = %e, "cannot stop the command");
            }
            command.dispose();
        }

        self.reset_hooks();
        self.stopped.store(true, Ordering::SeqCst);
        info!(service = %self.info.display_name, "stopped");
    }
}
