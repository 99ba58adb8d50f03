// src/lib.rs

pub mod cli;
pub mod errors;
pub mod logging;
pub mod matcher;
pub mod process;
pub mod session;
pub mod watch;

use std::sync::Arc;

use crate::cli::CliArgs;
use crate::errors::Result;
use crate::process::LogSink;
use crate::session::{Session, SessionOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the matcher and watch tree (via [`Session::spawn`])
/// - the process supervisor
/// - Ctrl-C handling
///
/// and then blocks until the session ends.
pub async fn run(args: CliArgs) -> Result<()> {
    let opts = SessionOptions {
        root: args.dir,
        include: args.include,
        exclude: args.exclude,
        include_hidden: args.hidden,
        delay: args.delay,
        command: args.command,
        sink: Arc::new(LogSink),
    };

    let session = Session::spawn(opts).await?;

    // Ctrl-C → graceful shutdown.
    {
        let stop = session.stop_handle();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            stop.stop();
        });
    }

    session.wait().await
}
