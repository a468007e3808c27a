// src/hooks/restart.rs

use tracing::{debug, error};

use crate::config::Settings;
use crate::errors::{Result, RunAsError};
use crate::types::RestartBudget;

use super::ServiceControl;

/// Settings path of the restart limit.
pub const TIMES_PATH: &str = "restart/times";

/// Restart the command when an unwanted exit is detected.
///
/// With `restart/times` set, the service is stopped once the budget is
/// spent. The budget survives across launches and is only restored when
/// the hook repository is reset.
#[derive(Debug, Default, Clone)]
pub struct RestartHook {
    remaining: RestartBudget,
}

impl RestartHook {
    pub fn remaining(&self) -> RestartBudget {
        self.remaining
    }

    pub(super) fn configure(&mut self, settings: &Settings) -> Result<()> {
        let times = settings.parse_value::<u32>(TIMES_PATH).map_err(|e| {
            RunAsError::ConfigError(format!(
                "cannot limit the number of restarts, the times property is not well defined: {e}"
            ))
        })?;

        self.remaining = match times {
            Some(n) => RestartBudget::Remaining(n),
            None => RestartBudget::Unlimited,
        };
        Ok(())
    }

    pub(super) fn execute(&mut self, service: &dyn ServiceControl) -> bool {
        if self.remaining.is_exhausted() {
            if service.is_stopped() {
                debug!("not restarted: max allowed times already done and the service is stopped");
                return false;
            }

            debug!("not restarted: max allowed times already done, stopping the service");
            service.stop();
            return true;
        }

        self.remaining = self.remaining.consume();

        if let Err(e) = service.start_command() {
            error!(error = %e, remaining = %self.remaining, "restart failed");
            return false;
        }

        debug!(remaining = %self.remaining, "restarted the command");
        true
    }
}
