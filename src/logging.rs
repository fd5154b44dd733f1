//! Log sinks: `<timestamp> - <LEVEL> - <message>` lines to a file and stdout

use crate::reconcile::CycleEvent;
use crate::types::SyncError;
use chrono::Local;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Timestamp layout of every log line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Event formatter producing `<timestamp> - <LEVEL> - <message>`
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} - {} - ",
            Local::now().format(TIMESTAMP_FORMAT),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber: one layer appending to `log_file`, one to stdout.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process. `RUST_LOG` overrides the default level.
///
/// # Errors
/// * `SyncError::Config` if the log file cannot be created or a subscriber is
///   already installed
pub fn init(log_file: &Path, verbose: bool) -> Result<WorkerGuard, SyncError> {
    let directory = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .ok_or_else(|| SyncError::Config(format!("Log path has no file name: {:?}", log_file)))?;

    fs::create_dir_all(directory).map_err(|e| {
        SyncError::Config(format!(
            "Cannot create log directory {:?}: {}",
            directory, e
        ))
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy().into_owned())
        .build(directory)
        .map_err(|e| SyncError::Config(format!("Cannot open log file {:?}: {}", log_file, e)))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let default_directive = if verbose { "replisync=debug,info" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_writer(file_writer)
        .with_ansi(false);
    let console_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| SyncError::Config(format!("Logging already initialised: {}", e)))?;

    Ok(guard)
}

/// Default cycle event sink: one log line per action and per cycle boundary
pub fn log_event(event: &CycleEvent<'_>) {
    match event {
        CycleEvent::CycleStarted {
            source,
            replica,
            dry_run,
        } => {
            tracing::info!(
                "Starting synchronization from {} to {}{}",
                source.display(),
                replica.display(),
                if *dry_run { " (dry run)" } else { "" }
            );
        }
        CycleEvent::Planned {
            source_files,
            replica_files,
            to_add,
            to_remove,
        } => {
            tracing::debug!(
                "Source has {} file(s), replica has {}; {} to add, {} to remove",
                source_files,
                replica_files,
                to_add,
                to_remove
            );
        }
        CycleEvent::ActionApplied { message, .. } => tracing::info!("{}", message),
        CycleEvent::EntryFailed { warning } => {
            tracing::warn!(
                "{} failed for {}: {}",
                warning.action,
                warning.path.display(),
                warning.error
            );
        }
        CycleEvent::Cancelled => tracing::warn!("Cancellation requested, stopping cycle early"),
        CycleEvent::CycleFinished {
            source,
            replica,
            report,
        } => {
            tracing::info!(
                "Finished synchronization from {} to {}: {}",
                source.display(),
                replica.display(),
                report.summary()
            );
        }
    }
}
