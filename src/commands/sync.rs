//! Main sync command

use crate::reconcile::{CycleReport, EntryWarning, Reconciler};
use crate::scheduler::{cancel_on_shutdown_signal, Scheduler};
use crate::types::SyncError;
use crate::Config;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

/// Run the mirror loop until a shutdown signal arrives (or after one cycle with `--once`)
///
/// # Errors
/// * `SyncError::Config` if the replica cannot be prepared
/// * The first cycle's fatal error in single-shot mode
pub async fn run(config: Config) -> Result<(), SyncError> {
    config.prepare_replica()?;

    let reconciler = Reconciler::from_config(&config);
    let scheduler = Scheduler::new(reconciler, config.interval)
        .once(config.once)
        .with_report_callback(Arc::new(report_warnings));

    if !config.once {
        tracing::info!(
            "Mirroring every {}s, press Ctrl-C to stop",
            config.interval.as_secs()
        );
    }
    cancel_on_shutdown_signal(scheduler.cancel_token());

    scheduler.run().await?;
    Ok(())
}

fn report_warnings(report: &CycleReport) {
    if report.warnings.is_empty() {
        return;
    }
    let records: Vec<WarningRecord> = report.warnings.iter().map(WarningRecord::new).collect();
    tracing::warn!("{}", format_warning_summary(&records));
}

#[derive(Debug)]
struct WarningRecord {
    kind: &'static str,
    action: &'static str,
    path: PathBuf,
    message: String,
    suggestion: Option<String>,
}

impl WarningRecord {
    fn new(warning: &EntryWarning) -> Self {
        let (message, suggestion) = humanize_error(&warning.error);
        Self {
            kind: error_kind_label(&warning.error),
            action: warning.action,
            path: warning.path.clone(),
            message,
            suggestion,
        }
    }
}

fn humanize_error(error: &SyncError) -> (String, Option<String>) {
    if let SyncError::Config(msg) = error {
        return (msg.clone(), None);
    }

    match error.io_kind() {
        Some(ErrorKind::NotFound) => (
            "File vanished while the cycle was running".to_string(),
            Some("Nothing to do, the next cycle picks up the current state.".to_string()),
        ),
        Some(ErrorKind::PermissionDenied) => (
            "Permission denied while accessing file".to_string(),
            Some("Check file permissions or run with a user that has access.".to_string()),
        ),
        Some(ErrorKind::AlreadyExists) => (
            "The replica path already exists as a file or directory".to_string(),
            Some("Remove or rename the conflicting path in the replica.".to_string()),
        ),
        Some(ErrorKind::WriteZero | ErrorKind::BrokenPipe | ErrorKind::UnexpectedEof) => (
            "File transfer was interrupted before completion".to_string(),
            Some("The next cycle retries; check disk stability if it keeps happening.".to_string()),
        ),
        _ => (
            error.to_string(),
            Some(
                "The next cycle retries. If this keeps happening, check disk health and permissions."
                    .to_string(),
            ),
        ),
    }
}

fn error_kind_label(error: &SyncError) -> &'static str {
    if let Some(ErrorKind::PermissionDenied) = error.io_kind() {
        return "Permission denied";
    }
    match error {
        SyncError::Scan { .. } => "Scan error",
        SyncError::Read { .. } => "Read error",
        SyncError::Write { .. } => "Write error",
        SyncError::Config(_) => "Configuration error",
        SyncError::Io(_) => "I/O error",
    }
}

fn format_warning_summary(records: &[WarningRecord]) -> String {
    let mut groups: BTreeMap<&'static str, Vec<&WarningRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.kind).or_default().push(record);
    }

    let mut lines = Vec::new();
    lines.push(format!("{} file(s) could not be synchronized:", records.len()));
    for (kind, items) in groups {
        lines.push(format!("  {} ({}):", kind, items.len()));
        for record in items.iter().take(3) {
            lines.push(format!(
                "    - {} {}: {}",
                record.action,
                record.path.display(),
                record.message
            ));
            if let Some(suggestion) = &record.suggestion {
                lines.push(format!("      Try: {}", suggestion));
            }
        }
        if items.len() > 3 {
            lines.push(format!("    - ... {} more", items.len() - 3));
        }
    }
    lines.join("\n")
}
