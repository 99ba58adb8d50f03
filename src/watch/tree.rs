// src/watch/tree.rs

//! The watched-directory set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::debug;

use crate::errors::Result;
use crate::matcher::Matcher;

/// Registers directories with the notification source and remembers which
/// ones are registered.
///
/// Directories are watched non-recursively, one registration per directory;
/// recursion is this type's job, so that the matcher can prune whole
/// subtrees out of the walk.
pub struct WatchTree {
    root: PathBuf,
    matcher: Arc<Matcher>,
    watcher: Mutex<Option<RecommendedWatcher>>,
    dirs: Mutex<HashSet<PathBuf>>,
}

impl std::fmt::Debug for WatchTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchTree")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl WatchTree {
    pub fn new(root: PathBuf, matcher: Arc<Matcher>, watcher: RecommendedWatcher) -> Self {
        Self {
            root,
            matcher,
            watcher: Mutex::new(Some(watcher)),
            dirs: Mutex::new(HashSet::new()),
        }
    }

    /// Watch `path` and every qualifying directory below it.
    ///
    /// Directories the matcher rejects are skipped along with their whole
    /// subtree. Registration failure is fatal only for the session root;
    /// elsewhere it is logged and the walk moves past that entry.
    pub fn watch(&self, path: &Path) -> Result<()> {
        let mut stack = vec![path.to_path_buf()];

        while let Some(dir) = stack.pop() {
            if !self.matcher.match_dir(&dir) {
                debug!(path = %dir.display(), "skipping directory");
                continue;
            }
            if self.is_watched(&dir) {
                continue;
            }

            let registered = {
                let mut watcher = self.watcher.lock().expect("watcher lock poisoned");
                match watcher.as_mut() {
                    Some(watcher) => watcher.watch(&dir, RecursiveMode::NonRecursive),
                    // Session already closed; nothing left to register with.
                    None => return Ok(()),
                }
            };
            if let Err(err) = registered {
                if dir == self.root {
                    return Err(err.into());
                }
                debug!(path = %dir.display(), error = %err, "watch registration failed; skipping");
                continue;
            }

            let count = {
                let mut dirs = self.dirs.lock().expect("watched set lock poisoned");
                dirs.insert(dir.clone());
                dirs.len()
            };
            debug!(count, path = %dir.display(), "watching directory");

            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!(path = %dir.display(), error = %err, "failed to list directory");
                    continue;
                }
            };
            for entry in entries.flatten() {
                if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    stack.push(entry.path());
                }
            }
        }

        Ok(())
    }

    /// Drop `path` from the watched set; returns whether it was watched.
    ///
    /// No deregistration call is made: the OS-level watch on a deleted
    /// directory dies with the directory.
    pub fn unwatch(&self, path: &Path) -> bool {
        self.dirs
            .lock()
            .expect("watched set lock poisoned")
            .remove(path)
    }

    pub fn is_watched(&self, path: &Path) -> bool {
        self.dirs
            .lock()
            .expect("watched set lock poisoned")
            .contains(path)
    }

    pub fn watch_count(&self) -> usize {
        self.dirs.lock().expect("watched set lock poisoned").len()
    }

    /// Close the notification source. Further `watch` calls become no-ops.
    pub fn close(&self) {
        *self.watcher.lock().expect("watcher lock poisoned") = None;
    }
}
