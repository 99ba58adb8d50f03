// src/process/kill.rs

//! Child termination policy.
//!
//! The child is spawned as the leader of its own process group so that any
//! descendants it spawned are reaped along with it. Group semantics differ
//! across platforms, so a failed group kill falls back to killing only the
//! direct child.

use command_group::AsyncGroupChild;
use tracing::{debug, warn};

/// Terminate `child` and reap it.
pub(crate) async fn terminate(child: &mut AsyncGroupChild) {
    if let Err(err) = child.kill() {
        warn!(error = %err, "process group kill failed; killing child process directly");
        if let Err(err) = child.inner().start_kill() {
            warn!(error = %err, "failed to kill child process");
        }
    }
    if let Err(err) = child.wait().await {
        debug!(error = %err, "failed to reap terminated child");
    }
}
