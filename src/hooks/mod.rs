// src/hooks/mod.rs

//! Exit hooks: recovery policies run after an unexpected exit.
//!
//! The set of policies is closed ([`HookKind`]): stop the service, restart
//! the command a bounded number of times, or send a notification mail. Each
//! hook is configured once through [`ExitHook::init`]; a hook whose settings
//! are rejected stays in the chain but never acts.

use std::sync::{Arc, Weak};

use tracing::{debug, warn};

use crate::config::Settings;
use crate::errors::{Result, RunAsError};
use crate::types::HookKind;

pub mod email;
pub mod mailer;
pub mod mock;
pub mod repository;
pub mod restart;
pub mod stop;

pub use email::EmailNotifyHook;
pub use mailer::{AlertMessage, MailTransport, SmtpCredentials, SmtpMailer, SmtpServer};
pub use repository::HookRepository;
pub use restart::RestartHook;
pub use stop::StopHook;

/// What hooks may ask of the service that runs them.
pub trait ServiceControl: Send + Sync {
    fn display_name(&self) -> &str;

    fn description(&self) -> &str;

    fn is_stopped(&self) -> bool;

    /// Build and start a new command.
    fn start_command(&self) -> Result<()>;

    /// Stop the service (and its command).
    fn stop(&self);
}

/// Policy-specific part of a hook.
#[derive(Debug)]
pub enum HookPolicy {
    Stop(StopHook),
    Restart(RestartHook),
    EmailNotify(EmailNotifyHook),
}

impl HookPolicy {
    fn configure(&mut self, settings: &Settings, service: &dyn ServiceControl) -> Result<()> {
        match self {
            HookPolicy::Stop(hook) => hook.configure(settings),
            HookPolicy::Restart(hook) => hook.configure(settings),
            HookPolicy::EmailNotify(hook) => hook.configure(settings, service),
        }
    }

    fn execute(&mut self, service: &dyn ServiceControl) -> bool {
        match self {
            HookPolicy::Stop(hook) => hook.execute(service),
            HookPolicy::Restart(hook) => hook.execute(service),
            HookPolicy::EmailNotify(hook) => hook.execute(),
        }
    }
}

/// A configured recovery policy bound to its service.
#[derive(Debug)]
pub struct ExitHook {
    kind: HookKind,
    policy: HookPolicy,
    service: Option<Weak<dyn ServiceControl>>,
    initialized: bool,
}

impl ExitHook {
    pub fn new(kind: HookKind, mailer: Arc<dyn MailTransport>) -> Self {
        let policy = match kind {
            HookKind::Stop => HookPolicy::Stop(StopHook),
            HookKind::Restart => HookPolicy::Restart(RestartHook::default()),
            HookKind::EmailNotify => HookPolicy::EmailNotify(EmailNotifyHook::new(mailer)),
        };

        Self {
            kind,
            policy,
            service: None,
            initialized: false,
        }
    }

    pub fn kind(&self) -> HookKind {
        self.kind
    }

    pub fn policy(&self) -> &HookPolicy {
        &self.policy
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn as_restart(&self) -> Option<&RestartHook> {
        match &self.policy {
            HookPolicy::Restart(hook) => Some(hook),
            _ => None,
        }
    }

    pub fn as_email(&self) -> Option<&EmailNotifyHook> {
        match &self.policy {
            HookPolicy::EmailNotify(hook) => Some(hook),
            _ => None,
        }
    }

    /// Bind the hook to `service` and configure it from `settings`.
    ///
    /// Fails with `InvalidArgument` when the service is already gone.
    /// Rejected settings are not an error: the hook is simply left
    /// uninitialized and `Ok(false)` is returned.
    pub fn init(&mut self, settings: &Settings, service: Weak<dyn ServiceControl>) -> Result<bool> {
        let Some(target) = service.upgrade() else {
            return Err(RunAsError::InvalidArgument(
                "service is required to initialize a hook".to_string(),
            ));
        };

        self.initialized = match self.policy.configure(settings, target.as_ref()) {
            Ok(()) => true,
            Err(e) => {
                warn!(hook = %self.kind, error = %e, "hook disabled: invalid configuration");
                false
            }
        };
        self.service = Some(service);

        Ok(self.initialized)
    }

    /// Run the policy. Returns whether it did something meaningful.
    pub fn launch(&mut self) -> bool {
        if !self.initialized {
            debug!(hook = %self.kind, "hook not initialized; skipping");
            return false;
        }

        let Some(service) = self.service.as_ref().and_then(Weak::upgrade) else {
            warn!(hook = %self.kind, "service is gone; skipping hook");
            return false;
        };

        self.policy.execute(service.as_ref())
    }
}
