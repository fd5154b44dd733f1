//! Scheduler - Runs reconciliation cycles back to back with a fixed pause

use crate::logging::log_event;
use crate::reconcile::{CycleCallback, CycleReport, Reconciler};
use crate::types::SyncError;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Callback invoked with each completed cycle's report
pub type ReportCallback = dyn Fn(&CycleReport) + Send + Sync;

/// Drives a `Reconciler` until cancelled.
///
/// Cycles never overlap: the pause starts once a cycle has returned, so the
/// period is `interval` plus the cycle duration.
pub struct Scheduler {
    reconciler: Arc<Reconciler>,
    interval: Duration,
    once: bool,
    cancel: CancellationToken,
    on_event: Arc<CycleCallback>,
    on_report: Option<Arc<ReportCallback>>,
}

impl Scheduler {
    pub fn new(reconciler: Reconciler, interval: Duration) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
            interval,
            once: false,
            cancel: CancellationToken::new(),
            on_event: Arc::new(log_event),
            on_report: None,
        }
    }

    /// Stop after the first cycle
    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    /// Replace the default token, e.g. to share it with a signal handler
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Replace the default event sink (`logging::log_event`)
    pub fn with_event_callback(mut self, callback: Arc<CycleCallback>) -> Self {
        self.on_event = callback;
        self
    }

    pub fn with_report_callback(mut self, callback: Arc<ReportCallback>) -> Self {
        self.on_report = Some(callback);
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run cycles until the token is cancelled, or once in single-shot mode.
    ///
    /// A fatal cycle error is logged and the loop keeps going; the next cycle
    /// starts from a fresh scan. Returns the number of cycles started.
    ///
    /// # Errors
    /// In single-shot mode the cycle's fatal error is returned.
    pub async fn run(&self) -> Result<usize, SyncError> {
        let mut cycles = 0;

        while !self.cancel.is_cancelled() {
            cycles += 1;
            match self.run_cycle().await {
                Ok(report) => {
                    if let Some(callback) = &self.on_report {
                        callback(&report);
                    }
                }
                Err(e) => {
                    tracing::error!("Synchronization cycle failed: {}", e);
                    if self.once {
                        return Err(e);
                    }
                }
            }

            if self.once {
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        if self.cancel.is_cancelled() {
            tracing::info!("Stopped after {} cycle(s)", cycles);
        }
        Ok(cycles)
    }

    /// One cycle on the blocking pool; filesystem work never runs on the runtime threads
    async fn run_cycle(&self) -> Result<CycleReport, SyncError> {
        let reconciler = Arc::clone(&self.reconciler);
        let cancel = self.cancel.clone();
        let on_event = Arc::clone(&self.on_event);

        tokio::task::spawn_blocking(move || reconciler.run_cycle(&cancel, Some(on_event.as_ref())))
            .await
            .map_err(|e| SyncError::Io(io::Error::other(e)))?
    }
}

/// Cancel `token` on Ctrl-C (and SIGTERM on Unix).
///
/// Must be called from within a Tokio runtime.
pub fn cancel_on_shutdown_signal(token: CancellationToken) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("Shutdown requested, finishing current step");
        token.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!("Cannot listen for SIGTERM: {}", e);
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
