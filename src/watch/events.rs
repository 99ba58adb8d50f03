// src/watch/events.rs

//! Classification and handling of filesystem notifications.

use std::path::PathBuf;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use tracing::debug;

use crate::errors::RespawnError;
use crate::session::SessionState;

/// What a notification means for one affected path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathChange {
    /// The path was removed or renamed away.
    Removed,
    /// The path was created or written.
    Changed,
}

/// Map a raw event onto per-path changes.
///
/// Metadata-only modifications and access events carry no content change and
/// produce nothing. A rename is a removal on its old path and a change on
/// its new one; rename kinds the backend could not pin down degrade to
/// removal, and the new path announces itself with its own create event.
pub fn classify(event: &Event) -> Vec<(PathBuf, PathChange)> {
    let change = match event.kind {
        EventKind::Remove(_) => PathChange::Removed,
        EventKind::Create(_) => PathChange::Changed,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut changes = Vec::with_capacity(2);
            if let Some(from) = event.paths.first() {
                changes.push((from.clone(), PathChange::Removed));
            }
            if let Some(to) = event.paths.get(1) {
                changes.push((to.clone(), PathChange::Changed));
            }
            return changes;
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => PathChange::Changed,
        EventKind::Modify(ModifyKind::Name(_)) => PathChange::Removed,
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(_) => PathChange::Changed,
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .map(|path| (path.clone(), change))
        .collect()
}

/// Apply one classified change to the session.
pub(crate) async fn handle_change(session: &SessionState, path: PathBuf, change: PathChange) {
    match change {
        PathChange::Removed => {
            if session.tree.unwatch(&path) {
                if path == session.root {
                    session.stop_with(Err(RespawnError::RootRemoved(path)));
                } else {
                    debug!(path = %path.display(), "watched directory removed");
                }
            } else if session.matcher.match_file(&path) {
                debug!(path = %path.display(), "file deleted");
                session.supervisor.restart().await;
            }
        }
        PathChange::Changed => {
            // Re-stat: the path may already be gone again.
            let meta = match std::fs::metadata(&path) {
                Ok(meta) => meta,
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "stat failed");
                    return;
                }
            };
            if meta.is_dir() {
                if let Err(err) = session.tree.watch(&path) {
                    debug!(path = %path.display(), error = %err, "failed to extend watch");
                }
            } else if meta.is_file() && session.matcher.match_file(&path) {
                debug!(path = %path.display(), "file changed");
                session.supervisor.restart().await;
            }
        }
    }
}
