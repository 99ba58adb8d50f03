// src/session.rs

//! One watch-and-restart session: wiring plus idempotent shutdown.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::info;

use crate::errors::{RespawnError, Result};
use crate::matcher::{Matcher, Polarity};
use crate::process::{StatusSink, Supervisor};
use crate::watch::{make_watcher, spawn_router, WatchTree};

/// Everything needed to start a session.
pub struct SessionOptions {
    /// Directory tree to observe.
    pub root: PathBuf,
    /// Pattern of files to watch; mutually exclusive with `exclude`.
    pub include: Option<String>,
    /// Pattern of files to ignore; mutually exclusive with `include`.
    pub exclude: Option<String>,
    /// Also watch hidden files and directories.
    pub include_hidden: bool,
    /// Debounce delay between a change and the restart.
    pub delay: Duration,
    /// Command to supervise: program followed by its arguments.
    pub command: Vec<String>,
    /// Destination for child status reports.
    pub sink: Arc<dyn StatusSink>,
}

/// Shared state behind a running session.
pub(crate) struct SessionState {
    pub(crate) root: PathBuf,
    pub(crate) matcher: Arc<Matcher>,
    pub(crate) tree: WatchTree,
    pub(crate) supervisor: Arc<Supervisor>,
    done_tx: Mutex<Option<oneshot::Sender<Result<()>>>>,
}

impl SessionState {
    /// End the session with `result`. Only the first call takes effect:
    /// it stops the supervisor, closes the notification source, and
    /// resolves [`Session::wait`].
    pub(crate) fn stop_with(&self, result: Result<()>) {
        let Some(done_tx) = self
            .done_tx
            .lock()
            .expect("session done slot lock poisoned")
            .take()
        else {
            return;
        };
        self.supervisor.stop();
        self.tree.close();
        let _ = done_tx.send(result);
    }
}

/// A running watch-and-restart session.
pub struct Session {
    state: Arc<SessionState>,
    done_rx: oneshot::Receiver<Result<()>>,
}

/// Clonable handle for stopping a session from elsewhere (e.g. a Ctrl-C
/// task) while [`Session::wait`] is pending.
#[derive(Clone)]
pub struct StopHandle {
    state: Arc<SessionState>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.state.stop_with(Ok(()));
    }
}

impl Session {
    /// Compile the matcher, initialise the notification source, perform the
    /// initial tree walk, and spawn the router and supervisor tasks.
    ///
    /// Fails fast when the notifier cannot be initialised or the root cannot
    /// be registered; every later failure is a session outcome delivered via
    /// [`wait`](Self::wait).
    pub async fn spawn(opts: SessionOptions) -> Result<Session> {
        let root = opts.root.canonicalize()?;

        let matcher = match (&opts.include, &opts.exclude) {
            (Some(_), Some(_)) => {
                return Err(RespawnError::Config(
                    "include and exclude patterns cannot be combined".to_string(),
                ));
            }
            (Some(pattern), None) => {
                Matcher::compile(&root, pattern, Polarity::Include, opts.include_hidden)?
            }
            (None, Some(pattern)) => {
                Matcher::compile(&root, pattern, Polarity::Exclude, opts.include_hidden)?
            }
            (None, None) => Matcher::match_all(opts.include_hidden),
        };
        let matcher = Arc::new(matcher);

        let supervisor = Arc::new(Supervisor::new(opts.command, opts.delay, opts.sink)?);

        let (watcher, event_rx) = make_watcher()?;
        let tree = WatchTree::new(root.clone(), Arc::clone(&matcher), watcher);
        tree.watch(&root)?;
        if !tree.is_watched(&root) {
            // A hidden root, or an exclude pattern covering the whole tree,
            // would leave the session watching nothing at all.
            return Err(RespawnError::Config(format!(
                "nothing to watch: {} is rejected by the configured filters",
                root.display()
            )));
        }
        info!(root = %root.display(), dirs = tree.watch_count(), "watching");

        let (done_tx, done_rx) = oneshot::channel();
        let state = Arc::new(SessionState {
            root,
            matcher,
            tree,
            supervisor: Arc::clone(&supervisor),
            done_tx: Mutex::new(Some(done_tx)),
        });

        spawn_router(Arc::clone(&state), event_rx);
        tokio::spawn(supervisor.run());

        Ok(Session { state, done_rx })
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Stop the session explicitly.
    pub fn stop(&self) {
        self.state.stop_with(Ok(()));
    }

    /// Wait for the session to end: `Ok(())` after an explicit stop, an
    /// error when the session died on its own (e.g. root removed).
    pub async fn wait(self) -> Result<()> {
        let Session { state, done_rx } = self;
        let result = done_rx.await.unwrap_or(Ok(()));
        drop(state);
        result
    }
}
