use std::path::PathBuf;
use std::time::Duration;

use statline_journal::RejectSink;
use statline_log::LogError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::backend::{Backend, Upload};
use crate::config::{Config, ConfigError};
use crate::cycle::{CycleError, Uploader};

/// The default time between upload cycles.
pub const DEFAULT_UPLOAD_INTERVAL: Duration = Duration::from_millis(120_000);

/// An error reported through the upload loop's error callback.
#[derive(Debug, thiserror::Error)]
pub enum UploadLoopError {
    /// An upload cycle failed.
    ///
    /// The loop keeps running; the failed cycle's capture file is retried on
    /// the next tick.
    #[error("upload cycle failed")]
    Cycle(#[source] CycleError),

    /// Journal lines were rejected during validation since the last drain.
    #[error("{} journal lines were rejected during validation", .0.len())]
    RejectedLines(Vec<String>),
}

/// A handle to a running upload loop.
///
/// The loop stops when [`stop`](Self::stop) is called or the handle is
/// dropped.
#[derive(Debug)]
pub struct UploadLoopHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl UploadLoopHandle {
    /// Stops all future upload cycles.
    ///
    /// A cycle already in flight is not interrupted; it runs to one of its
    /// defined exits before the loop winds down.
    pub fn stop(&self) {
        self.shutdown.send(true).ok();
    }

    /// Waits for the loop task to finish.
    ///
    /// Returns once a stopped loop has completed its in-flight cycle, if
    /// any.
    pub async fn join(self) {
        self.task.await.ok();
    }
}

/// Starts the periodic upload loop described by `config`.
///
/// The backend resolves synchronously: configuration errors surface here and
/// nothing is spawned. Once running, the loop never stops on its own; every
/// cycle error and every batch of rejected lines goes to `on_error`, and the
/// next tick proceeds regardless.
///
/// Must be called within a tokio runtime.
pub fn start_upload_loop<F>(config: Config, on_error: F) -> Result<UploadLoopHandle, ConfigError>
where
    F: FnMut(UploadLoopError) + Send + 'static,
{
    let Config {
        journal_path,
        instance,
        upload_interval_ms,
        backend,
        ..
    } = config;

    let backend = Backend::from_config(backend, instance)?;
    let rejects = backend.reject_sink();

    Ok(start_upload_loop_with(
        journal_path,
        backend,
        rejects,
        Duration::from_millis(upload_interval_ms),
        on_error,
    ))
}

/// Starts an upload loop over an explicit backend.
///
/// This is the generic entry point behind [`start_upload_loop`]: any
/// [`Upload`] implementation can drive it. The first cycle runs one full
/// `interval` after start, and `rejects` is drained after every cycle so
/// leftover rejected lines reach `on_error` instead of accumulating
/// silently.
pub fn start_upload_loop_with<U, F>(
    journal_path: impl Into<PathBuf>,
    backend: U,
    rejects: RejectSink,
    interval: Duration,
    mut on_error: F,
) -> UploadLoopHandle
where
    U: Upload + Send + Sync + 'static,
    F: FnMut(UploadLoopError) + Send + 'static,
{
    let uploader = Uploader::new(journal_path);
    let (shutdown, mut stopped) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => (),
                _ = stopped.changed() => break,
            }

            match uploader.run_cycle(&backend).await {
                Ok(outcome) => statline_log::trace!(?outcome, "upload cycle finished"),
                Err(error) => {
                    statline_log::error!("upload cycle failed: {}", LogError(&error));
                    on_error(UploadLoopError::Cycle(error));
                }
            }

            let rejected = rejects.drain();
            if !rejected.is_empty() {
                on_error(UploadLoopError::RejectedLines(rejected));
            }
        }

        statline_log::debug!(
            journal = %uploader.journal_path().display(),
            "upload loop stopped"
        );
    });

    UploadLoopHandle { shutdown, task }
}
