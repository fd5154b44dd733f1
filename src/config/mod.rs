//! Configuration management

use crate::types::SyncError;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default pause between two cycles
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Default log file, relative to the working directory
pub const DEFAULT_LOG_FILE: &str = "sync.log";

/// Command-line interface
#[derive(Parser, Debug, Clone)]
#[command(
    name = "replisync",
    version,
    about = "Periodically mirror a source folder into a replica folder"
)]
pub struct Cli {
    /// Source directory (read only)
    pub source: PathBuf,

    /// Replica directory (made to match the source)
    pub replica: PathBuf,

    /// Seconds to sleep between cycles [default: 60]
    #[arg(short, long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Log file, appended to [default: sync.log]
    #[arg(short, long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// TOML file supplying defaults for the options below
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Glob of files to leave out of both trees (repeatable)
    #[arg(short, long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Log planned actions without touching the replica
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Detect renames before copying new files
    #[arg(long)]
    pub renames_first: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Order of the copy and rename-detection phases within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseOrder {
    /// Copy additions, then match removals against them. A detected rename
    /// overwrites the file just copied to the same destination.
    #[default]
    CopyFirst,

    /// Match removals against additions first; claimed additions are not copied.
    RenamesFirst,
}

/// Optional settings file, every key may be omitted
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub interval: Option<u64>,
    pub log: Option<PathBuf>,
    pub exclude: Vec<String>,
    pub renames_first: Option<bool>,
    pub dry_run: Option<bool>,
}

impl FileConfig {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let content = fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            SyncError::Config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }
}

/// Resolved configuration for replisync
#[derive(Debug, Clone)]
pub struct Config {
    /// Source directory
    pub source: PathBuf,

    /// Replica directory
    pub replica: PathBuf,

    /// Sleep between cycles
    pub interval: Duration,

    /// Log file destination
    pub log_file: PathBuf,

    /// Exclude patterns (globs)
    pub exclude_patterns: Vec<String>,

    pub phase_order: PhaseOrder,

    /// Dry run (log actions, don't execute)
    pub dry_run: bool,

    /// Stop after the first cycle
    pub once: bool,

    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            replica: PathBuf::new(),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            exclude_patterns: Vec::new(),
            phase_order: PhaseOrder::CopyFirst,
            dry_run: false,
            once: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), SyncError> {
        if !self.source.exists() {
            return Err(SyncError::Config(format!(
                "Source path does not exist: {:?}",
                self.source
            )));
        }

        if !self.source.is_dir() {
            return Err(SyncError::Config(format!(
                "Source path is not a directory: {:?}",
                self.source
            )));
        }

        if self.replica.exists() && !self.replica.is_dir() {
            return Err(SyncError::Config(format!(
                "Replica path is not a directory: {:?}",
                self.replica
            )));
        }

        if self.source == self.replica {
            return Err(SyncError::Config(
                "Source and replica cannot be the same".to_string(),
            ));
        }

        if self.interval < Duration::from_secs(1) {
            return Err(SyncError::Config(
                "Interval must be at least 1 second".to_string(),
            ));
        }

        self.check_layout()
    }

    /// Create the replica root if needed.
    ///
    /// The layout is checked again first, so nothing is created inside the
    /// source when the paths overlap.
    pub fn prepare_replica(&self) -> Result<(), SyncError> {
        self.check_layout()?;

        fs::create_dir_all(&self.replica).map_err(|e| {
            SyncError::Config(format!(
                "Cannot create replica directory {:?}: {}",
                self.replica, e
            ))
        })
    }

    /// Reject overlapping roots and a log file the first cycle would delete
    fn check_layout(&self) -> Result<(), SyncError> {
        let source = resolve_path(&self.source)?;
        let replica = resolve_path(&self.replica)?;
        check_not_nested(&source, &replica)?;

        let log_file = resolve_path(&self.log_file)?;
        if log_file.starts_with(&replica) {
            return Err(SyncError::Config(format!(
                "Log file {:?} is inside replica {:?} and would be deleted",
                self.log_file, self.replica
            )));
        }
        Ok(())
    }
}

/// Absolute, symlink-free form of a path that may not exist yet.
///
/// The deepest existing ancestor is canonicalised and the missing tail is
/// appended back onto it.
pub fn resolve_path(path: &Path) -> Result<PathBuf, SyncError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| SyncError::Config(format!("Cannot read working directory: {}", e)))?
            .join(path)
    };

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(resolved) = fs::canonicalize(existing) {
            return Ok(missing
                .iter()
                .rev()
                .fold(resolved, |acc: PathBuf, name| acc.join(name)));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => {
                return Err(SyncError::Config(format!("Cannot resolve path {:?}", path)));
            }
        }
    }
}

/// Reject source and replica roots that contain one another
pub fn check_not_nested(source: &Path, replica: &Path) -> Result<(), SyncError> {
    if source == replica {
        return Err(SyncError::Config(
            "Source and replica resolve to the same directory".to_string(),
        ));
    }
    if replica.starts_with(source) {
        return Err(SyncError::Config(format!(
            "Replica {:?} is inside source {:?}",
            replica, source
        )));
    }
    if source.starts_with(replica) {
        return Err(SyncError::Config(format!(
            "Source {:?} is inside replica {:?}",
            source, replica
        )));
    }
    Ok(())
}

impl TryFrom<Cli> for Config {
    type Error = SyncError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let mut exclude_patterns = file.exclude;
        exclude_patterns.extend(cli.exclude);

        let renames_first = cli.renames_first || file.renames_first.unwrap_or(false);

        let config = Config {
            source: cli.source,
            replica: cli.replica,
            interval: Duration::from_secs(
                cli.interval
                    .or(file.interval)
                    .unwrap_or(DEFAULT_INTERVAL_SECS),
            ),
            log_file: cli
                .log
                .or(file.log)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            exclude_patterns,
            phase_order: if renames_first {
                PhaseOrder::RenamesFirst
            } else {
                PhaseOrder::CopyFirst
            },
            dry_run: cli.dry_run || file.dry_run.unwrap_or(false),
            once: cli.once,
            verbose: cli.verbose,
        };

        config.validate()?;
        Ok(config)
    }
}
