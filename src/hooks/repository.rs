// src/hooks/repository.rs

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use tracing::{debug, info, warn};

use crate::config::{split_hook_names, Settings};
use crate::errors::Result;
use crate::types::HookKind;

use super::{ExitHook, MailTransport, ServiceControl};

/// Ordered, resettable list of exit hooks built from a comma-separated
/// list of hook names.
///
/// Order follows the configured list. Unknown names and repeated hooks are
/// skipped (and logged) rather than failing the whole repository.
pub struct HookRepository {
    hook_names: String,
    settings: Settings,
    service: Weak<dyn ServiceControl>,
    mailer: Arc<dyn MailTransport>,
    hooks: Vec<ExitHook>,
}

impl HookRepository {
    /// Build and initialize every hook named in `hook_names`.
    pub fn new(
        hook_names: impl Into<String>,
        settings: Settings,
        service: Weak<dyn ServiceControl>,
        mailer: Arc<dyn MailTransport>,
    ) -> Result<Self> {
        let mut repository = Self::unloaded(hook_names, settings, service, mailer);
        repository.reset()?;
        Ok(repository)
    }

    /// Same as [`HookRepository::new`] but without building the hooks yet.
    ///
    /// Used while the owning service is still being constructed; call
    /// [`HookRepository::reset`] once the service can be reached.
    pub fn unloaded(
        hook_names: impl Into<String>,
        settings: Settings,
        service: Weak<dyn ServiceControl>,
        mailer: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            hook_names: hook_names.into(),
            settings,
            service,
            mailer,
            hooks: Vec::new(),
        }
    }

    pub fn hooks(&self) -> &[ExitHook] {
        &self.hooks
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Rebuild every hook from the configuration, discarding their state
    /// (e.g. restart counters go back to the configured value).
    pub fn reset(&mut self) -> Result<()> {
        let mut hooks = Vec::new();
        let mut seen = HashSet::new();

        for name in split_hook_names(&self.hook_names) {
            let kind = match name.parse::<HookKind>() {
                Ok(kind) => kind,
                Err(e) => {
                    warn!(hook = name, error = %e, "cannot create hook; ignoring it");
                    continue;
                }
            };

            if !seen.insert(kind) {
                warn!(hook = name, "hook listed more than once; ignoring the repeat");
                continue;
            }

            let mut hook = ExitHook::new(kind, Arc::clone(&self.mailer));
            hook.init(&self.settings, self.service.clone())?;
            hooks.push(hook);
        }

        debug!(hooks = ?hooks.iter().map(|h| h.kind()).collect::<Vec<_>>(), "hooks loaded");
        self.hooks = hooks;
        Ok(())
    }

    /// Launch every hook in order. A hook doing nothing (or failing) never
    /// prevents the next one from running.
    ///
    /// Returns how many hooks performed an action.
    pub fn launch_all(&mut self) -> usize {
        let mut acted = 0;
        for hook in self.hooks.iter_mut() {
            let kind = hook.kind();
            if hook.launch() {
                acted += 1;
                info!(hook = %kind, "exit hook applied");
            } else {
                debug!(hook = %kind, "exit hook did nothing");
            }
        }
        acted
    }
}
