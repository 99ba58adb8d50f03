// src/process/supervisor.rs

//! The restartable child command.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use command_group::AsyncCommandGroup;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::debug;

use crate::errors::{RespawnError, Result};
use crate::process::{kill, ChildEvent, StatusSink};

/// Pause after a failed spawn, so a missing binary (e.g. one a build step has
/// not produced yet) does not turn into a hot failure loop.
const SPAWN_RETRY_COOLDOWN: Duration = Duration::from_secs(2);

/// Supervises one command: launches it, waits for it, and relaunches it on
/// request.
///
/// Restart requests are debounced and coalesced: the launch slot holds at
/// most one pending launch, and while a restart is in flight further
/// `restart` calls are no-ops. A command that exits on its own is *not*
/// relaunched until the next request.
pub struct Supervisor {
    program: String,
    args: Vec<String>,
    delay: Duration,
    sink: Arc<dyn StatusSink>,

    /// Capacity-1 launch slot; `try_send` drops excess requests.
    launch_tx: mpsc::Sender<()>,
    launch_rx: Mutex<Option<mpsc::Receiver<()>>>,

    /// Present while a child is running; firing it kills that child.
    cancel: Mutex<Option<oneshot::Sender<()>>>,

    restarting: AtomicBool,
    killed: AtomicBool,
    stopped: AtomicBool,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    /// Build a supervisor for `command` (program followed by its arguments).
    pub fn new(command: Vec<String>, delay: Duration, sink: Arc<dyn StatusSink>) -> Result<Self> {
        let mut parts = command.into_iter();
        let program = parts
            .next()
            .ok_or_else(|| RespawnError::Config("no command specified".to_string()))?;
        let args = parts.collect();

        let (launch_tx, launch_rx) = mpsc::channel(1);

        Ok(Self {
            program,
            args,
            delay,
            sink,
            launch_tx,
            launch_rx: Mutex::new(Some(launch_rx)),
            cancel: Mutex::new(None),
            restarting: AtomicBool::new(false),
            killed: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        })
    }

    /// Launch loop; runs until [`stop`](Self::stop) is called.
    ///
    /// The slot is pre-seeded so the first launch happens immediately.
    pub async fn run(self: Arc<Self>) {
        let Some(mut launch_rx) = self
            .launch_rx
            .lock()
            .expect("launch slot lock poisoned")
            .take()
        else {
            debug!("supervisor run loop already started; ignoring");
            return;
        };

        let _ = self.launch_tx.try_send(());

        while !self.is_stopped() {
            if launch_rx.recv().await.is_none() {
                break;
            }
            if self.is_stopped() {
                break;
            }

            let mut cmd = Command::new(&self.program);
            cmd.args(&self.args)
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());

            let mut child = match cmd.group_spawn() {
                Ok(child) => child,
                Err(err) => {
                    self.sink.report(ChildEvent::SpawnFailed {
                        error: err.to_string(),
                    });
                    sleep(SPAWN_RETRY_COOLDOWN).await;
                    continue;
                }
            };
            self.killed.store(false, Ordering::SeqCst);

            let pid = child.id();
            debug!(pid, program = %self.program, "child started");

            let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
            *self.cancel.lock().expect("cancel slot lock poisoned") = Some(cancel_tx);

            tokio::select! {
                status = child.wait() => {
                    let code = match &status {
                        Ok(status) => status.code().unwrap_or(-1),
                        Err(_) => -1,
                    };
                    if let Err(err) = &status {
                        debug!(error = %err, "waiting for child failed");
                    }
                    // A deliberate kill already produced a Restarting report;
                    // only a natural exit is surfaced.
                    if !self.killed.load(Ordering::SeqCst) {
                        self.sink.report(ChildEvent::Exited { code });
                    }
                    debug!(pid, code, "child exited");
                }
                _ = &mut cancel_rx => {
                    kill::terminate(&mut child).await;
                    debug!(pid, "child terminated");
                }
            }

            *self.cancel.lock().expect("cancel slot lock poisoned") = None;
        }

        debug!("supervisor loop finished");
    }

    /// Kill the current child (if any) and queue exactly one relaunch.
    ///
    /// The call sleeps for the debounce delay first, so a burst of changes
    /// (an editor's "save all") collapses into a single restart; while one
    /// restart is in flight, further calls return immediately.
    pub async fn restart(&self) {
        if self.restarting.swap(true, Ordering::SeqCst) {
            return;
        }

        sleep(self.delay).await;
        self.sink.report(ChildEvent::Restarting);

        self.killed.store(true, Ordering::SeqCst);
        if let Some(cancel) = self.cancel.lock().expect("cancel slot lock poisoned").take() {
            let _ = cancel.send(());
        }
        let _ = self.launch_tx.try_send(());

        self.restarting.store(false, Ordering::SeqCst);
    }

    /// Stop the launch loop and kill any live child. Idempotent.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(cancel) = self.cancel.lock().expect("cancel slot lock poisoned").take() {
            let _ = cancel.send(());
        }
        // Wake the loop so it observes the stop even with no child running.
        let _ = self.launch_tx.try_send(());
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}
