// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `respawn`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "respawn",
    version,
    about = "Run a command and restart it whenever watched files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory to watch.
    ///
    /// The whole tree below it is observed; the command itself still runs
    /// from the current working directory.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Watch only files matching this pattern, relative to DIR.
    ///
    /// `*` matches one path segment, `/**/` any number of directories.
    /// A trailing `/` watches everything below that directory.
    /// Examples: `src/**/*.go`, `lib/**/*.js`, `assets/`.
    #[arg(long, value_name = "PATTERN")]
    pub include: Option<String>,

    /// Ignore files matching this pattern, relative to DIR.
    ///
    /// Same syntax as `--include`; the two cannot be combined.
    #[arg(long, value_name = "PATTERN", conflicts_with = "include")]
    pub exclude: Option<String>,

    /// Debounce delay between a file change and the restart (e.g. "500ms", "2s").
    #[arg(
        long,
        value_name = "DURATION",
        default_value = "500ms",
        value_parser = parse_duration
    )]
    pub delay: Duration,

    /// Also watch hidden files and directories.
    #[arg(long)]
    pub hidden: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RESPAWN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Command to run and restart, with its arguments.
    #[arg(
        value_name = "COMMAND",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

/// Parse a duration string like `"250ms"`, `"2s"`, `"1m"`, `"2h"`.
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
