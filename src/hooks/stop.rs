// src/hooks/stop.rs

use tracing::debug;

use crate::config::Settings;
use crate::errors::Result;

use super::ServiceControl;

/// Stop the service when an unwanted exit is detected.
#[derive(Debug, Default, Clone, Copy)]
pub struct StopHook;

impl StopHook {
    pub(super) fn configure(&mut self, _settings: &Settings) -> Result<()> {
        Ok(())
    }

    pub(super) fn execute(&mut self, service: &dyn ServiceControl) -> bool {
        if service.is_stopped() {
            debug!("service already stopped");
            return false;
        }

        service.stop();
        true
    }
}
