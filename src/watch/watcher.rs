// src/watch/watcher.rs

//! `notify` wiring and the event router loop.

use std::sync::Arc;

use notify::{Config, Event, RecommendedWatcher, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::errors::Result;
use crate::session::SessionState;
use crate::watch::events::{classify, handle_change};

/// Build the notification source.
///
/// The watcher's callback runs on `notify`'s own thread; it only forwards
/// results into the returned channel, where the async router consumes them.
/// Dropping the watcher closes the channel and thereby ends the router.
pub fn make_watcher() -> Result<(
    RecommendedWatcher,
    mpsc::UnboundedReceiver<notify::Result<Event>>,
)> {
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            // A closed channel means the session is shutting down.
            let _ = event_tx.send(res);
        },
        Config::default(),
    )?;

    Ok((watcher, event_rx))
}

/// Spawn the router task: drain the notification stream, classify each
/// event, and dispatch a handler task per affected path.
///
/// Error results from the source are logged and never fatal. Handlers run
/// concurrently; the supervisor's own coalescing keeps overlapping restart
/// attempts bounded.
pub(crate) fn spawn_router(
    session: Arc<SessionState>,
    mut event_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(res) = event_rx.recv().await {
            match res {
                Ok(event) => {
                    debug!(?event, "notify event");
                    for (path, change) in classify(&event) {
                        let session = Arc::clone(&session);
                        tokio::spawn(async move {
                            handle_change(&session, path, change).await;
                        });
                    }
                }
                Err(err) => {
                    debug!(error = %err, "watch error");
                }
            }
        }
        debug!("event router finished");
    })
}
