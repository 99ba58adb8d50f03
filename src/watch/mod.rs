// src/watch/mod.rs

//! Directory watching and change routing.
//!
//! This module keeps the set of watched directories in sync with the live
//! tree and turns raw filesystem notifications into supervisor actions:
//!
//! - [`tree`] owns the watched-directory set: the initial pruned walk plus
//!   incremental extension when new directories appear.
//! - [`watcher`] wires the `notify` backend into an event channel and runs
//!   the router loop.
//! - [`events`] classifies raw notifications and applies them to the
//!   session.
//!
//! It does **not** know how the child command is run; it only calls into the
//! supervisor's `restart`.

pub mod events;
pub mod tree;
pub mod watcher;

pub use events::{classify, PathChange};
pub use tree::WatchTree;
pub use watcher::make_watcher;

pub(crate) use watcher::spawn_router;
