//! Binary-level tests: argument handling, exit codes and the log file format

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn replisync() -> Command {
    Command::cargo_bin("replisync").expect("binary should be built")
}

#[test]
fn test_help_lists_options() {
    replisync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--interval"))
        .stdout(predicate::str::contains("--log"))
        .stdout(predicate::str::contains("--once"));
}

#[test]
fn test_missing_arguments_exit_non_zero() {
    replisync().assert().failure();
}

#[test]
fn test_missing_source_exits_non_zero() {
    let dir = TempDir::new().expect("create tempdir");

    replisync()
        .current_dir(dir.path())
        .arg(dir.path().join("does-not-exist"))
        .arg(dir.path().join("replica"))
        .arg("--once")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source path does not exist"));

    assert!(!dir.path().join("replica").exists());
}

#[test]
fn test_zero_interval_is_rejected() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    replisync()
        .current_dir(dst.path())
        .arg(src.path())
        .arg(dst.path())
        .args(["--interval", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Interval must be at least 1 second"));
}

#[test]
fn test_once_mirrors_and_writes_log_lines() {
    let src = TempDir::new().expect("create src tempdir");
    let work = TempDir::new().expect("create work tempdir");
    let replica = work.path().join("replica");
    let log_file = work.path().join("logs/sync.log");
    fs::write(src.path().join("a.txt"), b"hello").expect("write source file");

    replisync()
        .current_dir(work.path())
        .arg(src.path())
        .arg(&replica)
        .arg("--log")
        .arg(&log_file)
        .arg("--once")
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stdout(predicate::str::contains("INFO - Copied"));

    assert_eq!(fs::read(replica.join("a.txt")).expect("read copy"), b"hello");

    let log = fs::read_to_string(&log_file).expect("log file written");
    let copied = log
        .lines()
        .find(|line| line.contains("Copied"))
        .expect("copy is logged");
    let parts: Vec<&str> = copied.splitn(3, " - ").collect();
    assert_eq!(parts.len(), 3, "unexpected log line: {copied}");
    assert!(
        chrono::NaiveDateTime::parse_from_str(parts[0], "%Y-%m-%d %H:%M:%S").is_ok(),
        "bad timestamp in: {copied}"
    );
    assert_eq!(parts[1], "INFO");
    assert_eq!(
        parts[2],
        format!(
            "Copied {} to {}",
            src.path().join("a.txt").display(),
            replica.join("a.txt").display()
        )
    );
    assert!(log.contains("Finished synchronization"));
}

#[test]
fn test_log_file_is_appended_across_runs() {
    let src = TempDir::new().expect("create src tempdir");
    let work = TempDir::new().expect("create work tempdir");
    let replica = work.path().join("replica");
    let log_file = work.path().join("sync.log");
    fs::write(&log_file, "previous run\n").expect("seed log file");

    replisync()
        .current_dir(work.path())
        .arg(src.path())
        .arg(&replica)
        .arg("--log")
        .arg(&log_file)
        .arg("--once")
        .assert()
        .success();

    let log = fs::read_to_string(&log_file).expect("read log");
    assert!(log.starts_with("previous run\n"));
    assert!(log.contains("Starting synchronization"));
}
