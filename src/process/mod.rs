// src/process/mod.rs

//! Child process supervision.
//!
//! This module owns the lifecycle of the supervised command:
//!
//! - [`supervisor`] runs the launch loop, waits for the child, and exposes
//!   the debounced, coalescing `restart` operation.
//! - [`kill`] implements the termination policy: kill the whole process
//!   group, falling back to killing only the direct child.
//!
//! User-visible child status goes through [`StatusSink`] instead of ambient
//! logging state, so the binary logs it and tests can record it.

pub mod supervisor;

mod kill;

pub use supervisor::Supervisor;

use tracing::info;

/// User-visible events in the child's lifecycle.
///
/// A deliberate kill during a restart produces no event of its own; the
/// `Restarting` report already covers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildEvent {
    /// The debounce window closed and the child is being relaunched.
    Restarting,
    /// The child exited on its own with the given code.
    Exited { code: i32 },
    /// The child could not be started at all.
    SpawnFailed { error: String },
}

/// Destination for [`ChildEvent`]s.
///
/// Production code uses [`LogSink`]; tests can substitute an implementation
/// that records the events it sees.
pub trait StatusSink: Send + Sync {
    fn report(&self, event: ChildEvent);
}

/// Default sink: surfaces child status as log lines.
#[derive(Debug, Default)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn report(&self, event: ChildEvent) {
        match event {
            ChildEvent::Restarting => info!("restarting command"),
            ChildEvent::Exited { code } => info!(code, "command exited"),
            ChildEvent::SpawnFailed { error } => {
                info!(%error, "command failed to start");
            }
        }
    }
}
