// src/process/mod.rs

//! Process layer.
//!
//! - [`handle`] wraps one OS process (`ProcessHandle` + the tokio-backed
//!   `ChildProcess`) and delivers its exit notification.
//! - [`manager`] creates handles from an executable path and an argument
//!   string, and terminates them.
//! - [`tree`] kills whole descendant trees through the `ProcessTable`
//!   abstraction.
//! - [`mock`] provides in-memory doubles for all three.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod handle;
pub mod manager;
pub mod mock;
pub mod tree;

pub use handle::{ChildProcess, ExitCallback, LaunchSpec, ProcessHandle};
pub use manager::{resolve_launch_spec, split_arguments, ProcessManager, SystemProcessManager};
pub use tree::{kill_descendants, KillOutcome, ProcessEntry, ProcessTable, SysinfoProcessTable};

/// Lock a mutex, recovering the data if a panicking holder poisoned it.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
