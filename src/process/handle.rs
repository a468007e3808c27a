// src/process/handle.rs

//! One supervised OS process.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::{Result, RunAsError};
use crate::logging::CHILD_OUTPUT_TARGET;

use super::lock_unpoisoned;

/// Callback fired once when the OS process terminates.
pub type ExitCallback = Box<dyn FnOnce() + Send + 'static>;

/// Abstraction over one OS process, owned exclusively by a `Command`.
///
/// Production code uses [`ChildProcess`]; tests use
/// [`FakeProcessHandle`](super::mock::FakeProcessHandle).
pub trait ProcessHandle: Send {
    /// Launch the process. Returns whether the OS accepted the launch.
    fn start(&mut self) -> Result<bool>;

    /// Whether the process was launched and has not exited yet.
    fn is_started(&self) -> Result<bool>;

    /// OS process id, `0` while not started.
    fn id(&self) -> Result<u32>;

    /// Request termination. No-op once the process has exited.
    fn kill(&mut self) -> Result<()>;

    /// Register the exit callback, replacing any previous one.
    fn subscribe_exit(&mut self, callback: ExitCallback);

    /// Drop the exit callback; a later exit notifies nobody.
    fn unsubscribe_exit(&mut self);

    /// Unregister the exit callback, then release the OS handle.
    /// Calling it more than once is a no-op.
    fn dispose(&mut self);
}

/// Everything needed to launch the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleState {
    NotStarted,
    Started { pid: u32 },
    Disposed,
}

/// Requests sent to the monitor task that owns the `Child`.
#[derive(Debug)]
enum Control {
    Kill,
    Release,
}

/// Real process handle backed by `tokio::process`.
///
/// Once started, the `Child` lives in a background monitor task which
/// either observes the exit (and fires the exit callback) or serves kill /
/// release requests coming from this handle.
pub struct ChildProcess {
    spec: LaunchSpec,
    state: HandleState,
    exited: Arc<AtomicBool>,
    on_exit: Arc<Mutex<Option<ExitCallback>>>,
    control: Option<mpsc::UnboundedSender<Control>>,
}

impl ChildProcess {
    pub fn new(spec: LaunchSpec) -> Self {
        Self {
            spec,
            state: HandleState::NotStarted,
            exited: Arc::new(AtomicBool::new(false)),
            on_exit: Arc::new(Mutex::new(None)),
            control: None,
        }
    }

    pub fn spec(&self) -> &LaunchSpec {
        &self.spec
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.spec.program);
        cmd.args(&self.spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);

        if let Some(ref dir) = self.spec.working_dir {
            cmd.current_dir(dir);
        }

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        cmd
    }
}

impl ProcessHandle for ChildProcess {
    fn start(&mut self) -> Result<bool> {
        match self.state {
            HandleState::Disposed => return Err(RunAsError::Disposed("process handle")),
            HandleState::Started { pid } => {
                warn!(pid, "process already started; ignoring start request");
                return Ok(false);
            }
            HandleState::NotStarted => {}
        }

        let mut child = match self.command().spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(
                    program = %self.spec.program.display(),
                    error = %e,
                    "OS refused to launch the process"
                );
                return Ok(false);
            }
        };

        let pid = child.id().unwrap_or(0);
        info!(pid, program = %self.spec.program.display(), "process started");

        if let Some(stdout) = child.stdout.take() {
            forward_output(stdout, pid, "stdout");
        }
        if let Some(stderr) = child.stderr.take() {
            forward_output(stderr, pid, "stderr");
        }

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(monitor(
            child,
            pid,
            rx,
            Arc::clone(&self.exited),
            Arc::clone(&self.on_exit),
        ));

        self.control = Some(tx);
        self.state = HandleState::Started { pid };
        Ok(true)
    }

    fn is_started(&self) -> Result<bool> {
        match self.state {
            HandleState::Disposed => Err(RunAsError::Disposed("process handle")),
            HandleState::NotStarted => Ok(false),
            HandleState::Started { pid } => Ok(pid != 0 && !self.exited.load(Ordering::SeqCst)),
        }
    }

    fn id(&self) -> Result<u32> {
        match self.state {
            HandleState::Disposed => Err(RunAsError::Disposed("process handle")),
            HandleState::NotStarted => Ok(0),
            HandleState::Started { pid } => Ok(pid),
        }
    }

    fn kill(&mut self) -> Result<()> {
        match self.state {
            HandleState::Disposed => Err(RunAsError::Disposed("process handle")),
            HandleState::NotStarted => {
                debug!("kill requested on a process that was never started");
                Ok(())
            }
            HandleState::Started { pid } => {
                if self.exited.load(Ordering::SeqCst) {
                    debug!(pid, "process already exited; nothing to kill");
                    return Ok(());
                }
                if let Some(ref control) = self.control {
                    if control.send(Control::Kill).is_err() {
                        debug!(pid, "monitor already finished while killing");
                    }
                }
                Ok(())
            }
        }
    }

    fn subscribe_exit(&mut self, callback: ExitCallback) {
        *lock_unpoisoned(&self.on_exit) = Some(callback);
    }

    fn unsubscribe_exit(&mut self) {
        lock_unpoisoned(&self.on_exit).take();
    }

    fn dispose(&mut self) {
        if self.state == HandleState::Disposed {
            return;
        }

        // Unregister first so a racing exit cannot reach a released handle.
        self.unsubscribe_exit();

        if let Some(control) = self.control.take() {
            let _ = control.send(Control::Release);
        }
        self.state = HandleState::Disposed;
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Own the child until it exits or the handle releases it.
async fn monitor(
    mut child: Child,
    pid: u32,
    mut control_rx: mpsc::UnboundedReceiver<Control>,
    exited: Arc<AtomicBool>,
    on_exit: Arc<Mutex<Option<ExitCallback>>>,
) {
    loop {
        tokio::select! {
            status_res = child.wait() => {
                exited.store(true, Ordering::SeqCst);
                match status_res {
                    Ok(status) => info!(pid, exit_code = ?status.code(), "process exited"),
                    Err(e) => warn!(pid, error = %e, "failed waiting for process; treating it as exited"),
                }

                let callback = lock_unpoisoned(&on_exit).take();
                if let Some(callback) = callback {
                    callback();
                }
                break;
            }

            request = control_rx.recv() => {
                match request {
                    Some(Control::Kill) => {
                        info!(pid, "killing process");
                        if let Err(e) = child.start_kill() {
                            warn!(pid, error = %e, "failed to kill process");
                        }
                    }
                    Some(Control::Release) | None => {
                        debug!(pid, "process handle released");
                        break;
                    }
                }
            }
        }
    }
}

/// Consume a child output stream so buffers don't fill. Lines are logged at
/// debug under [`CHILD_OUTPUT_TARGET`].
fn forward_output<R>(stream: R, pid: u32, name: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let reader = BufReader::new(stream);
        let mut lines = reader.lines();

        while let Ok(Some(line)) = lines.next_line().await {
            debug!(target: CHILD_OUTPUT_TARGET, pid, stream = name, "{}", line);
        }
    });
}
