// tests/session.rs
mod common;
use crate::common::init_tracing;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use respawn::errors::RespawnError;
use respawn::process::LogSink;
use respawn::session::{Session, SessionOptions};

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// A visible project root inside the scratch directory.
///
/// Tempdir names start with a dot, which the hidden-entry filter would
/// reject as a watch root, so the watched tree lives one level down.
fn project_root(scratch: &tempfile::TempDir) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let root = scratch.path().join("proj");
    fs::create_dir(&root)?;
    Ok(root)
}

fn count_runs(marker: &Path) -> usize {
    fs::read_to_string(marker)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

/// Options for a session whose child logs one line to `marker` per launch.
fn logging_options(root: &Path, marker: &Path) -> SessionOptions {
    SessionOptions {
        root: root.to_path_buf(),
        include: None,
        exclude: None,
        include_hidden: false,
        delay: Duration::from_millis(100),
        command: vec![
            "sh".to_string(),
            "-c".to_string(),
            format!("echo run >> {}", marker.display()),
        ],
        sink: Arc::new(LogSink),
    }
}

#[tokio::test]
async fn file_change_restarts_the_command() -> TestResult {
    init_tracing();

    let scratch = tempfile::tempdir()?;
    let root = project_root(&scratch)?;
    let out = tempfile::tempdir()?;
    let marker = out.path().join("runs.log");
    fs::write(root.join("a.txt"), "before")?;

    let session = Session::spawn(logging_options(&root, &marker)).await?;

    sleep(Duration::from_millis(500)).await;
    assert_eq!(count_runs(&marker), 1);

    fs::write(root.join("a.txt"), "after")?;
    sleep(Duration::from_millis(900)).await;
    assert_eq!(count_runs(&marker), 2);

    session.stop();
    timeout(Duration::from_secs(2), session.wait()).await??;
    Ok(())
}

#[tokio::test]
async fn include_pattern_limits_triggers_and_follows_new_directories() -> TestResult {
    init_tracing();

    let scratch = tempfile::tempdir()?;
    let root = project_root(&scratch)?;
    let out = tempfile::tempdir()?;
    let marker = out.path().join("runs.log");
    fs::create_dir(root.join("src"))?;

    let mut opts = logging_options(&root, &marker);
    opts.include = Some("src/**/*.go".to_string());
    let session = Session::spawn(opts).await?;

    sleep(Duration::from_millis(500)).await;
    assert_eq!(count_runs(&marker), 1);

    // Not covered by the pattern: no restart.
    fs::write(root.join("README.md"), "docs")?;
    sleep(Duration::from_millis(600)).await;
    assert_eq!(count_runs(&marker), 1);

    // Covered: restart.
    fs::write(root.join("src/main.go"), "package main")?;
    sleep(Duration::from_millis(900)).await;
    assert_eq!(count_runs(&marker), 2);

    // A directory created later is picked up and its files trigger too.
    fs::create_dir(root.join("src/pkg"))?;
    sleep(Duration::from_millis(400)).await;
    fs::write(root.join("src/pkg/util.go"), "package pkg")?;
    sleep(Duration::from_millis(900)).await;
    assert_eq!(count_runs(&marker), 3);

    session.stop();
    timeout(Duration::from_secs(2), session.wait()).await??;
    Ok(())
}

#[tokio::test]
async fn excluded_subtree_produces_no_triggers() -> TestResult {
    init_tracing();

    let scratch = tempfile::tempdir()?;
    let root = project_root(&scratch)?;
    let out = tempfile::tempdir()?;
    let marker = out.path().join("runs.log");
    fs::create_dir(root.join("tmp"))?;

    let mut opts = logging_options(&root, &marker);
    opts.exclude = Some("tmp/".to_string());
    let session = Session::spawn(opts).await?;

    sleep(Duration::from_millis(500)).await;
    assert_eq!(count_runs(&marker), 1);

    // The pruned subtree is not even watched.
    fs::write(root.join("tmp/scratch.txt"), "noise")?;
    sleep(Duration::from_millis(600)).await;
    assert_eq!(count_runs(&marker), 1);

    fs::write(root.join("app.txt"), "change")?;
    sleep(Duration::from_millis(900)).await;
    assert_eq!(count_runs(&marker), 2);

    session.stop();
    timeout(Duration::from_secs(2), session.wait()).await??;
    Ok(())
}

#[tokio::test]
async fn removing_the_root_ends_the_session_with_an_error() -> TestResult {
    init_tracing();

    let scratch = tempfile::tempdir()?;
    let root = project_root(&scratch)?;

    let opts = SessionOptions {
        root: root.clone(),
        include: None,
        exclude: None,
        include_hidden: false,
        delay: Duration::from_millis(100),
        command: vec!["sleep".to_string(), "30".to_string()],
        sink: Arc::new(LogSink),
    };
    let session = Session::spawn(opts).await?;

    sleep(Duration::from_millis(300)).await;
    fs::remove_dir_all(&root)?;

    let result = timeout(Duration::from_secs(5), session.wait()).await?;
    assert!(matches!(result, Err(RespawnError::RootRemoved(_))));
    Ok(())
}

#[tokio::test]
async fn removing_a_subdirectory_keeps_the_session_alive() -> TestResult {
    init_tracing();

    let scratch = tempfile::tempdir()?;
    let root = project_root(&scratch)?;
    let out = tempfile::tempdir()?;
    let marker = out.path().join("runs.log");
    fs::create_dir(root.join("sub"))?;

    let session = Session::spawn(logging_options(&root, &marker)).await?;

    sleep(Duration::from_millis(500)).await;
    fs::remove_dir_all(root.join("sub"))?;
    sleep(Duration::from_millis(600)).await;

    // Still running: an explicit stop ends it cleanly, not the removal.
    session.stop();
    timeout(Duration::from_secs(2), session.wait()).await??;
    Ok(())
}

#[tokio::test]
async fn stop_is_idempotent_across_handles() -> TestResult {
    init_tracing();

    let scratch = tempfile::tempdir()?;
    let root = project_root(&scratch)?;
    let out = tempfile::tempdir()?;
    let marker = out.path().join("runs.log");

    let session = Session::spawn(logging_options(&root, &marker)).await?;
    sleep(Duration::from_millis(300)).await;

    let handle = session.stop_handle();
    handle.stop();
    handle.stop();
    session.stop();

    timeout(Duration::from_secs(2), session.wait()).await??;
    Ok(())
}

#[tokio::test]
async fn include_and_exclude_together_are_rejected() -> TestResult {
    init_tracing();

    let scratch = tempfile::tempdir()?;
    let root = project_root(&scratch)?;
    let out = tempfile::tempdir()?;
    let marker = out.path().join("runs.log");

    let mut opts = logging_options(&root, &marker);
    opts.include = Some("src/**/*.go".to_string());
    opts.exclude = Some("tmp/*".to_string());

    let res = Session::spawn(opts).await;
    assert!(matches!(res, Err(RespawnError::Config(_))));
    Ok(())
}
