// src/matcher.rs

//! Include/exclude pattern matching for watched paths.
//!
//! A single glob-like pattern is compiled into two anchored regexes: one for
//! full file paths and one for the pattern's directory prefix. The directory
//! regex is what lets the tree walk skip entire subtrees that can never
//! contain a match (e.g. an excluded `node_modules/`).

use std::fmt;
use std::path::Path;

use regex::Regex;

use crate::errors::{RespawnError, Result};

/// Whether a pattern selects the files to watch or the files to ignore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Include,
    Exclude,
}

/// Compiled matcher for one watch session.
///
/// Paths are matched in absolute, `/`-separated form; the pattern is joined
/// to the watch root at compile time so both sides line up.
pub struct Matcher {
    include_hidden: bool,
    polarity: Polarity,
    compiled: Option<Compiled>,
}

struct Compiled {
    /// Full pattern text after the trailing-`/` rewrite.
    pattern: String,
    /// Pattern covers every file below its directory (ends in `**/*`).
    all_files: bool,
    file: Regex,
    dir: Regex,
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("polarity", &self.polarity)
            .field("include_hidden", &self.include_hidden)
            .field("pattern", &self.compiled.as_ref().map(|c| &c.pattern))
            .finish_non_exhaustive()
    }
}

impl Matcher {
    /// A matcher with no pattern: accepts everything except hidden entries.
    pub fn match_all(include_hidden: bool) -> Self {
        Self {
            include_hidden,
            polarity: Polarity::Include,
            compiled: None,
        }
    }

    /// Compile `pattern` relative to `root`.
    ///
    /// A pattern ending in `/` means "everything below this directory" and
    /// is rewritten to end in `/**/*` before compiling.
    pub fn compile(
        root: &Path,
        pattern: &str,
        polarity: Polarity,
        include_hidden: bool,
    ) -> Result<Self> {
        let mut pattern = join_pattern(root, pattern);
        if pattern.ends_with('/') {
            pattern.push_str("**/*");
        }
        let all_files = pattern.ends_with("**/*");

        // The directory scope is the pattern up to and including its last
        // slash, i.e. the deepest explicit directory prefix.
        let last_slash = pattern
            .rfind('/')
            .ok_or_else(|| RespawnError::Config(format!("pattern has no directory part: {pattern}")))?;

        let file = glob_to_regex(&pattern)
            .map_err(|e| RespawnError::Config(format!("invalid pattern '{pattern}': {e}")))?;
        let dir = glob_to_regex(&pattern[..=last_slash])
            .map_err(|e| RespawnError::Config(format!("invalid pattern '{pattern}': {e}")))?;

        Ok(Self {
            include_hidden,
            polarity,
            compiled: Some(Compiled {
                pattern,
                all_files,
                file,
                dir,
            }),
        })
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Should a change to this file trigger a restart?
    pub fn match_file(&self, path: &Path) -> bool {
        self.matches(path, true)
    }

    /// Should the walk descend into (and watch) this directory?
    pub fn match_dir(&self, path: &Path) -> bool {
        self.matches(path, false)
    }

    fn matches(&self, path: &Path, is_file: bool) -> bool {
        // Hidden entries (notably version-control directories) are out
        // unless explicitly requested, pattern or no pattern.
        if !self.include_hidden && is_hidden(path) {
            return false;
        }
        let Some(c) = &self.compiled else {
            return true;
        };

        let s = path_str(path);
        if is_file {
            return self.flip(c.file.is_match(&s));
        }

        // An exclude pattern naming specific files still requires descending
        // everywhere: excluded files can sit next to watched ones, and the
        // distinction is only resolvable per file.
        if self.polarity == Polarity::Exclude && !c.all_files {
            return true;
        }

        // Directory candidates carry a trailing slash, like the dir regex.
        let mut s = s;
        if !s.ends_with('/') {
            s.push('/');
        }

        // Ancestors of the pattern's target directory are on the way there.
        if self.polarity == Polarity::Include && c.pattern.starts_with(&s) {
            return true;
        }

        self.flip(c.dir.is_match(&s))
    }

    fn flip(&self, matched: bool) -> bool {
        match self.polarity {
            Polarity::Include => matched,
            Polarity::Exclude => !matched,
        }
    }
}

/// Translate the glob-like pattern syntax into an anchored regex.
///
/// `*` matches one path segment, `/**/` any number of whole directories
/// (including none). The characters `/ . $ ^` are escaped before the
/// placeholders are expanded.
fn glob_to_regex(glob: &str) -> std::result::Result<Regex, regex::Error> {
    // Placeholders survive the escaping pass below.
    const SEGMENT: char = '\u{1}';
    const SUBTREE: char = '\u{2}';

    let glob = glob
        .replace("/**/", &SUBTREE.to_string())
        .replace('*', &SEGMENT.to_string());

    let mut re = String::with_capacity(glob.len() + 8);
    re.push('^');
    for ch in glob.chars() {
        match ch {
            '/' | '.' | '$' | '^' => {
                re.push('\\');
                re.push(ch);
            }
            SEGMENT => re.push_str("[^/]+"),
            SUBTREE => re.push_str(r"/([^/]+/)*"),
            other => re.push(other),
        }
    }
    re.push('$');
    Regex::new(&re)
}

/// Join `pattern` onto `root` as a `/`-separated string.
fn join_pattern(root: &Path, pattern: &str) -> String {
    let root = path_str(root);
    let root = root.trim_end_matches('/');
    let pattern = pattern.trim_start_matches("./").trim_start_matches('/');
    format!("{root}/{pattern}")
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
