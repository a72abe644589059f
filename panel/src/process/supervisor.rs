use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::launch::LaunchSpec;
use super::log_buffer::LogBuffer;
use crate::constants::process::{READ_CHUNK_BYTES, STOP_COMMAND};

/// How long the exit watcher waits for the output pumps to drain after the child exits
const PUMP_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Control operation accepted by the supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    Start,
    Stop,
    Kill,
    Command(String),
}

impl ControlAction {
    pub fn name(&self) -> &'static str {
        match self {
            ControlAction::Start => "start",
            ControlAction::Stop => "stop",
            ControlAction::Kill => "kill",
            ControlAction::Command(_) => "command",
        }
    }
}

/// Who asked for a control operation. Permission checks happen in the caller;
/// `Scheduler` is the trusted in-process path and is never checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOrigin {
    Interactive,
    Scheduler,
}

impl fmt::Display for ControlOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlOrigin::Interactive => write!(f, "interactive"),
            ControlOrigin::Scheduler => write!(f, "scheduler"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessStatus {
    pub running: bool,
    pub logs: Vec<String>,
}

/// Live child bookkeeping. The `Child` itself is owned by the exit watcher task.
struct ProcessHandle {
    generation: u64,
    pid: Option<u32>,
    stdin_tx: mpsc::UnboundedSender<String>,
    kill_tx: Option<oneshot::Sender<()>>,
}

/// Sole owner of the managed child process.
///
/// At most one child exists at any time: `start` checks and assigns the
/// handle under one lock with no suspension point in between. Output from
/// both pipes lands in the shared [`LogBuffer`]; stdin writes are queued to a
/// writer task so control calls never block on the child.
pub struct ProcessSupervisor {
    launch: LaunchSpec,
    handle: Arc<Mutex<Option<ProcessHandle>>>,
    logs: Arc<LogBuffer>,
    generation: AtomicU64,
}

impl ProcessSupervisor {
    pub fn new(launch: LaunchSpec, log_capacity: usize) -> Self {
        Self {
            launch,
            handle: Arc::new(Mutex::new(None)),
            logs: Arc::new(LogBuffer::new(log_capacity)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn launch_spec(&self) -> &LaunchSpec {
        &self.launch
    }

    /// Number of children spawned over the supervisor's lifetime
    pub fn spawn_count(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        lock_slot(&self.handle).is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        lock_slot(&self.handle).as_ref().and_then(|h| h.pid)
    }

    /// Never blocks on child I/O
    pub fn status(&self) -> ProcessStatus {
        ProcessStatus {
            running: self.is_running(),
            logs: self.logs.snapshot(),
        }
    }

    /// Single entry point for interactive and scheduled control requests
    pub async fn apply(&self, action: ControlAction, origin: ControlOrigin) {
        info!(origin = %origin, action = action.name(), "Control request");
        match action {
            ControlAction::Start => self.start().await,
            ControlAction::Stop => self.stop(),
            ControlAction::Kill => self.kill(),
            ControlAction::Command(text) => self.send_command(&text),
        }
    }

    /// Spawn the child unless one is already running. Spawn failures are
    /// written to the log buffer, never returned.
    #[instrument(skip(self), fields(program = %self.launch.program))]
    pub async fn start(&self) {
        if self.is_running() {
            debug!("Managed process already running, start ignored");
            return;
        }

        let args = self.launch.resolve_args().await;

        let mut slot = lock_slot(&self.handle);
        if slot.is_some() {
            debug!("Managed process started concurrently, start ignored");
            return;
        }

        info!(
            "Starting managed process in {}: {} {}",
            self.launch.working_dir.display(),
            self.launch.program,
            args.join(" ")
        );

        let mut command = Command::new(&self.launch.program);
        command
            .args(&args)
            .current_dir(&self.launch.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to spawn managed process: {}", e);
                self.logs.push(format!(
                    "[System Error] Failed to launch {}: {}",
                    self.launch.program, e
                ));
                if e.kind() == std::io::ErrorKind::NotFound {
                    self.logs.push(format!(
                        "[System Error] '{}' was not found. Install it or set server.program, and check that {} exists",
                        self.launch.program,
                        self.launch.working_dir.display()
                    ));
                }
                return;
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let pid = child.id();

        let stdout_pump = child
            .stdout
            .take()
            .map(|out| spawn_output_pump(out, self.logs.clone()));
        let stderr_pump = child
            .stderr
            .take()
            .map(|err| spawn_output_pump(err, self.logs.clone()));

        let (stdin_tx, stdin_rx) = mpsc::unbounded_channel();
        if let Some(stdin) = child.stdin.take() {
            spawn_stdin_writer(stdin, stdin_rx);
        }

        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let logs = self.logs.clone();
        let slot_ref = self.handle.clone();

        tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status,
                _ = kill_rx => {
                    if let Err(e) = child.start_kill() {
                        warn!("Failed to signal managed process: {}", e);
                    }
                    child.wait().await
                }
            };

            for pump in [stdout_pump, stderr_pump].into_iter().flatten() {
                if tokio::time::timeout(PUMP_DRAIN_TIMEOUT, pump).await.is_err() {
                    debug!("Output pump still open after exit, detaching");
                }
            }

            let code = match status {
                Ok(status) => status.code().unwrap_or(-1),
                Err(e) => {
                    warn!("Failed to collect managed process exit status: {}", e);
                    -1
                }
            };
            info!("Managed process exited with code {}", code);
            logs.push(format!("[System] process exited with code {}", code));

            // a kill followed by a new start must not be undone by the old watcher
            let mut slot = lock_slot(&slot_ref);
            if slot.as_ref().map(|h| h.generation) == Some(generation) {
                *slot = None;
            }
        });

        *slot = Some(ProcessHandle {
            generation,
            pid,
            stdin_tx,
            kill_tx: Some(kill_tx),
        });
        info!("Managed process started (pid {:?})", pid);
    }

    /// Ask the child to shut down by writing `stop` to its stdin
    pub fn stop(&self) {
        if self.write_line(STOP_COMMAND) {
            info!("Stop command sent to managed process");
        }
    }

    /// Forcibly terminate the child. The handle is cleared before the OS
    /// confirms the exit.
    pub fn kill(&self) {
        let taken = lock_slot(&self.handle).take();
        if let Some(mut handle) = taken {
            if let Some(kill_tx) = handle.kill_tx.take() {
                let _ = kill_tx.send(());
            }
            warn!("Managed process killed (pid {:?})", handle.pid);
        }
    }

    /// Write `text` plus a newline to the child's stdin; ignored without a child
    pub fn send_command(&self, text: &str) {
        if self.write_line(text) {
            debug!("Command queued for managed process: {}", text);
        }
    }

    fn write_line(&self, text: &str) -> bool {
        let slot = lock_slot(&self.handle);
        match slot.as_ref() {
            Some(handle) => handle.stdin_tx.send(format!("{}\n", text)).is_ok(),
            None => false,
        }
    }
}

fn lock_slot(slot: &Mutex<Option<ProcessHandle>>) -> MutexGuard<'_, Option<ProcessHandle>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn spawn_output_pump<R>(mut reader: R, logs: Arc<LogBuffer>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; READ_CHUNK_BYTES];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => logs.push(String::from_utf8_lossy(&buf[..n]).into_owned()),
                Err(e) => {
                    debug!("Managed process output closed: {}", e);
                    break;
                }
            }
        }
    })
}

fn spawn_stdin_writer(mut stdin: ChildStdin, mut rx: mpsc::UnboundedReceiver<String>) {
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if let Err(e) = stdin.write_all(line.as_bytes()).await {
                debug!("Managed process stdin closed: {}", e);
                break;
            }
            if let Err(e) = stdin.flush().await {
                debug!("Managed process stdin flush failed: {}", e);
                break;
            }
        }
    });
}
