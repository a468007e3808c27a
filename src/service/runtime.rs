// src/service/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::errors::Result;
use crate::hooks::ServiceControl;

use super::{Service, ServiceEvent};

/// Drives a [`Service`] in response to [`ServiceEvent`]s.
///
/// Events are handled one at a time, so a hook chain never overlaps with
/// another one or with shutdown. Hooks may block (SMTP, process table
/// snapshots); they run on the blocking pool.
pub struct ServiceRuntime {
    service: Arc<Service>,
    event_rx: mpsc::UnboundedReceiver<ServiceEvent>,
}

impl fmt::Debug for ServiceRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRuntime")
            .field("service", &self.service.name())
            .finish_non_exhaustive()
    }
}

impl ServiceRuntime {
    pub fn new(service: Arc<Service>, event_rx: mpsc::UnboundedReceiver<ServiceEvent>) -> Self {
        Self { service, event_rx }
    }

    /// Main event loop. Returns once the service has been stopped and
    /// disposed: on a shutdown request, or when an exit leaves the service
    /// stopped (`StopHook`, spent restart budget).
    pub async fn run(mut self) -> Result<()> {
        info!(service = %self.service.display_name(), "runtime started");

        loop {
            // The service keeps a sender alive, so `None` only happens once
            // every producer is gone.
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");

            match event {
                ServiceEvent::CommandExited { generation } => {
                    let service = Arc::clone(&self.service);
                    let handled = tokio::task::spawn_blocking(move || {
                        service.handle_command_exited(generation);
                    })
                    .await;
                    if let Err(e) = handled {
                        error!(error = %e, "exit hooks panicked");
                    }
                    if self.service.is_stopped() {
                        info!(
                            service = %self.service.display_name(),
                            "service stopped after its command exited"
                        );
                        break;
                    }
                }
                ServiceEvent::ShutdownRequested => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || {
            service.stop();
            service.dispose();
        })
        .await
        .map_err(anyhow::Error::from)?;

        info!("runtime exiting");
        Ok(())
    }
}
