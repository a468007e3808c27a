// src/process/mock.rs

//! In-memory process doubles.
//!
//! These never touch the OS: handles record what happened to them into a
//! shared event log, and exits are simulated on demand.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::{Result, RunAsError};

use super::handle::{ExitCallback, ProcessHandle};
use super::lock_unpoisoned;
use super::manager::ProcessManager;
use super::tree::{KillOutcome, ProcessEntry, ProcessTable};

/// What happened to a fake process, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Created {
        id: u32,
        executable: String,
        parameters: String,
    },
    Started {
        id: u32,
    },
    Terminated {
        id: u32,
        kill_children: bool,
    },
    Killed {
        id: u32,
    },
    Disposed {
        id: u32,
    },
}

#[derive(Default)]
struct Shared {
    events: Mutex<Vec<ProcessEvent>>,
    processes: Mutex<Vec<Arc<FakeProcessState>>>,
    next_id: AtomicU32,
    fail_create: AtomicBool,
    fail_start: AtomicBool,
}

impl Shared {
    fn record(&self, event: ProcessEvent) {
        lock_unpoisoned(&self.events).push(event);
    }
}

struct FakeProcessState {
    id: u32,
    started: AtomicBool,
    disposed: AtomicBool,
    on_exit: Mutex<Option<ExitCallback>>,
}

/// [`ProcessManager`] that hands out [`FakeProcessHandle`]s.
///
/// Cloning shares the same event log, so a test can keep a clone while the
/// code under test owns another.
#[derive(Clone, Default)]
pub struct FakeProcessManager {
    shared: Arc<Shared>,
}

impl FakeProcessManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `create_process` calls fail with `NotFound`.
    pub fn fail_create(&self, fail: bool) {
        self.shared.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Make the next launches report that the OS refused them.
    pub fn fail_start(&self, fail: bool) {
        self.shared.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<ProcessEvent> {
        lock_unpoisoned(&self.shared.events).clone()
    }

    pub fn created(&self) -> usize {
        lock_unpoisoned(&self.shared.processes).len()
    }

    pub fn terminations(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProcessEvent::Terminated { .. }))
            .count()
    }

    pub fn is_disposed(&self, index: usize) -> bool {
        lock_unpoisoned(&self.shared.processes)
            .get(index)
            .map(|p| p.disposed.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Simulate the OS reporting that the `index`-th created process exited.
    ///
    /// Returns whether an exit callback was still registered and fired.
    pub fn exit_process(&self, index: usize) -> bool {
        let process = match lock_unpoisoned(&self.shared.processes).get(index) {
            Some(p) => Arc::clone(p),
            None => return false,
        };

        process.started.store(false, Ordering::SeqCst);
        let callback = lock_unpoisoned(&process.on_exit).take();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Simulate an exit of the most recently created process.
    pub fn exit_latest(&self) -> bool {
        match self.created() {
            0 => false,
            n => self.exit_process(n - 1),
        }
    }
}

impl ProcessManager for FakeProcessManager {
    fn create_process(&self, executable: &str, parameters: &str) -> Result<Box<dyn ProcessHandle>> {
        if self.shared.fail_create.load(Ordering::SeqCst) {
            return Err(RunAsError::NotFound(format!("executable {executable} not found!")));
        }

        let id = 1000 + self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        let state = Arc::new(FakeProcessState {
            id,
            started: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            on_exit: Mutex::new(None),
        });

        lock_unpoisoned(&self.shared.processes).push(Arc::clone(&state));
        self.shared.record(ProcessEvent::Created {
            id,
            executable: executable.to_string(),
            parameters: parameters.to_string(),
        });

        Ok(Box::new(FakeProcessHandle {
            state,
            shared: Arc::clone(&self.shared),
        }))
    }

    fn terminate(&self, process: &mut dyn ProcessHandle, kill_children: bool) -> Result<()> {
        let id = process.id()?;
        self.shared.record(ProcessEvent::Terminated { id, kill_children });
        process.kill()
    }
}

/// Handle created by [`FakeProcessManager`].
pub struct FakeProcessHandle {
    state: Arc<FakeProcessState>,
    shared: Arc<Shared>,
}

impl FakeProcessHandle {
    fn ensure_alive(&self) -> Result<()> {
        if self.state.disposed.load(Ordering::SeqCst) {
            return Err(RunAsError::Disposed("process handle"));
        }
        Ok(())
    }
}

impl ProcessHandle for FakeProcessHandle {
    fn start(&mut self) -> Result<bool> {
        self.ensure_alive()?;
        if self.shared.fail_start.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.state.started.store(true, Ordering::SeqCst);
        self.shared.record(ProcessEvent::Started { id: self.state.id });
        Ok(true)
    }

    fn is_started(&self) -> Result<bool> {
        self.ensure_alive()?;
        Ok(self.state.started.load(Ordering::SeqCst))
    }

    fn id(&self) -> Result<u32> {
        self.ensure_alive()?;
        Ok(self.state.id)
    }

    fn kill(&mut self) -> Result<()> {
        self.ensure_alive()?;
        if self.state.started.swap(false, Ordering::SeqCst) {
            self.shared.record(ProcessEvent::Killed { id: self.state.id });
        }
        Ok(())
    }

    fn subscribe_exit(&mut self, callback: ExitCallback) {
        *lock_unpoisoned(&self.state.on_exit) = Some(callback);
    }

    fn unsubscribe_exit(&mut self) {
        lock_unpoisoned(&self.state.on_exit).take();
    }

    fn dispose(&mut self) {
        if self.state.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.unsubscribe_exit();
        self.shared.record(ProcessEvent::Disposed { id: self.state.id });
    }
}

impl Drop for FakeProcessHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// [`ProcessTable`] over a hand-written process listing.
#[derive(Default)]
pub struct FakeProcessTable {
    processes: Mutex<Vec<ProcessEntry>>,
    killed: Mutex<Vec<u32>>,
    failing: HashSet<u32>,
    vanishing: HashSet<u32>,
    unreadable: bool,
}

impl FakeProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(self, pid: u32, parent: Option<u32>) -> Self {
        lock_unpoisoned(&self.processes).push(ProcessEntry {
            pid,
            parent,
            name: format!("proc-{pid}"),
        });
        self
    }

    /// Killing `pid` fails.
    pub fn failing_kill(mut self, pid: u32) -> Self {
        self.failing.insert(pid);
        self
    }

    /// `pid` is listed but has already exited when the kill arrives.
    pub fn vanishing(mut self, pid: u32) -> Self {
        self.vanishing.insert(pid);
        self
    }

    /// The process listing cannot be read at all.
    pub fn unreadable(mut self) -> Self {
        self.unreadable = true;
        self
    }

    /// Pids killed so far, in kill order.
    pub fn killed(&self) -> Vec<u32> {
        lock_unpoisoned(&self.killed).clone()
    }

    /// Pids still listed.
    pub fn alive(&self) -> Vec<u32> {
        lock_unpoisoned(&self.processes).iter().map(|p| p.pid).collect()
    }
}

impl ProcessTable for FakeProcessTable {
    fn snapshot(&self) -> Result<Vec<ProcessEntry>> {
        if self.unreadable {
            return Err(RunAsError::Permission(
                "cannot iterate on process list".to_string(),
            ));
        }
        Ok(lock_unpoisoned(&self.processes).clone())
    }

    fn kill(&self, pid: u32) -> Result<KillOutcome> {
        if self.failing.contains(&pid) {
            return Err(RunAsError::KillFailed {
                pid,
                reason: "access denied".to_string(),
            });
        }

        let mut processes = lock_unpoisoned(&self.processes);
        let position = processes.iter().position(|p| p.pid == pid);
        match position {
            Some(index) => {
                processes.remove(index);
                if self.vanishing.contains(&pid) {
                    return Ok(KillOutcome::Gone);
                }
                lock_unpoisoned(&self.killed).push(pid);
                Ok(KillOutcome::Killed)
            }
            None => Ok(KillOutcome::Gone),
        }
    }
}
