// src/process/tree.rs

//! Process-tree termination.
//!
//! The descendant walk only needs two OS capabilities, captured by
//! [`ProcessTable`]: list every process with its parent, and kill one
//! process by id. [`SysinfoProcessTable`] provides them for the running OS;
//! tests use [`FakeProcessTable`](super::mock::FakeProcessTable).

use std::collections::HashSet;
use std::sync::Mutex;

use sysinfo::{Pid, System};
use tracing::{debug, error, info};

use crate::errors::{Result, RunAsError};

use super::lock_unpoisoned;

/// One row of a process listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub parent: Option<u32>,
    pub name: String,
}

/// Result of killing a single process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    Killed,
    /// The process disappeared before it could be killed.
    Gone,
}

pub trait ProcessTable: Send + Sync {
    /// List all processes currently known to the OS.
    ///
    /// Fails with [`RunAsError::Permission`] when the listing cannot be read.
    fn snapshot(&self) -> Result<Vec<ProcessEntry>>;

    fn kill(&self, pid: u32) -> Result<KillOutcome>;
}

/// Kill every transitive child of `pid`, depth-first.
///
/// A child's own descendants are killed before the child itself. Failing
/// to kill one process is logged and the walk goes on. Returns how many
/// processes were actually killed.
pub fn kill_descendants(table: &dyn ProcessTable, pid: u32) -> Result<usize> {
    if pid == 0 {
        debug!("no process id; skipping process-tree walk");
        return Ok(0);
    }

    let snapshot = table.snapshot()?;
    let mut visited = HashSet::from([pid]);
    let killed = walk(table, &snapshot, pid, &mut visited);

    info!(pid, killed, "process tree terminated");
    Ok(killed)
}

fn walk(
    table: &dyn ProcessTable,
    snapshot: &[ProcessEntry],
    parent: u32,
    visited: &mut HashSet<u32>,
) -> usize {
    let mut killed = 0;

    for entry in snapshot.iter().filter(|e| e.parent == Some(parent)) {
        // pid reuse can make the listing look cyclic
        if !visited.insert(entry.pid) {
            continue;
        }

        killed += walk(table, snapshot, entry.pid, visited);

        match table.kill(entry.pid) {
            Ok(KillOutcome::Killed) => {
                debug!(pid = entry.pid, name = %entry.name, "killed child process");
                killed += 1;
            }
            Ok(KillOutcome::Gone) => {
                debug!(pid = entry.pid, name = %entry.name, "child process already gone");
            }
            Err(e) => {
                error!(
                    parent,
                    pid = entry.pid,
                    error = %e,
                    "failed to kill child process"
                );
            }
        }
    }

    killed
}

/// [`ProcessTable`] backed by `sysinfo`.
pub struct SysinfoProcessTable {
    system: Mutex<System>,
}

impl SysinfoProcessTable {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SysinfoProcessTable {
    fn snapshot(&self) -> Result<Vec<ProcessEntry>> {
        let mut system = lock_unpoisoned(&self.system);
        system.refresh_processes();

        let entries: Vec<ProcessEntry> = system
            .processes()
            .iter()
            .map(|(pid, process)| ProcessEntry {
                pid: pid.as_u32(),
                parent: process.parent().map(|p| p.as_u32()),
                name: process.name().to_string(),
            })
            .collect();

        if entries.is_empty() {
            return Err(RunAsError::Permission(
                "cannot iterate on process list".to_string(),
            ));
        }
        Ok(entries)
    }

    fn kill(&self, pid: u32) -> Result<KillOutcome> {
        let mut system = lock_unpoisoned(&self.system);
        let sys_pid = Pid::from_u32(pid);

        if !system.refresh_process(sys_pid) {
            return Ok(KillOutcome::Gone);
        }

        match system.process(sys_pid) {
            Some(process) if process.kill() => Ok(KillOutcome::Killed),
            Some(_) => Err(RunAsError::KillFailed {
                pid,
                reason: "kill signal was not delivered".to_string(),
            }),
            None => Ok(KillOutcome::Gone),
        }
    }
}
