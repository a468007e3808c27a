// src/hooks/mock.rs

//! Recording doubles for the hook collaborators.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use crate::errors::RunAsError;
use crate::process::lock_unpoisoned;

use super::mailer::{AlertMessage, MailTransport, SmtpServer};
use super::ServiceControl;

/// [`ServiceControl`] that only counts what hooks asked for.
///
/// Starts in the *running* state (`is_stopped() == false`).
#[derive(Debug)]
pub struct RecordingService {
    display_name: String,
    stopped: AtomicBool,
    fail_start: AtomicBool,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
}

impl RecordingService {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            stopped: AtomicBool::new(false),
            fail_start: AtomicBool::new(false),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_stopped(&self, stopped: bool) {
        self.stopped.store(stopped, Ordering::SeqCst);
    }

    /// Make `start_command` fail.
    pub fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

impl ServiceControl for RecordingService {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn description(&self) -> &str {
        "recording service"
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn start_command(&self) -> crate::errors::Result<()> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(RunAsError::AlreadyRunning(self.display_name.clone()));
        }
        self.stopped.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// [`MailTransport`] that keeps sent mails in memory.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(SmtpServer, AlertMessage)>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send fail as if the server were unreachable.
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(SmtpServer, AlertMessage)> {
        lock_unpoisoned(&self.sent).clone()
    }
}

impl MailTransport for RecordingMailer {
    fn send(&self, server: &SmtpServer, message: &AlertMessage) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused by {}", server.host));
        }
        lock_unpoisoned(&self.sent).push((server.clone(), message.clone()));
        Ok(())
    }
}
