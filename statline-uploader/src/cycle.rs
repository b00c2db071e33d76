use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::fs;

use crate::backend::{Upload, UploadError};
use crate::rotate::rotate;

/// An error from one upload cycle.
///
/// Every variant names the failing step and carries the underlying cause.
/// The capture-file state implied by each variant drives the retry behavior
/// of the next cycle.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// Rotating the journal into its capture file failed.
    ///
    /// Nothing was uploaded and no file changed; the next cycle starts over.
    #[error("failed to rotate journal into capture file")]
    Rotate(#[source] io::Error),

    /// The capture file could not be read.
    ///
    /// The capture is left in place and retried on the next cycle.
    #[error("failed to read capture file")]
    Read(#[source] io::Error),

    /// The backend reported an upload failure.
    ///
    /// The capture is left in place and retried with identical contents.
    #[error("failed to upload captured samples")]
    Upload(#[source] UploadError),

    /// Removing the capture file after a successful upload failed.
    ///
    /// The upload is logically complete; the next cycle may deliver the same
    /// samples again, which at-least-once semantics allow.
    #[error("failed to remove capture file after upload")]
    Cleanup(#[source] io::Error),
}

/// How an upload cycle ended when it did not fail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CycleOutcome {
    /// Another cycle was already in flight; this call did nothing.
    Skipped,

    /// The journal was empty; the capture file was removed without an upload.
    Empty,

    /// The captured samples were handed to the backend and the capture file
    /// was removed.
    Uploaded,
}

/// Drives the rotate → read → upload → cleanup sequence for one journal.
///
/// At most one cycle runs per `Uploader` value at a time: a cycle started
/// while another is in flight returns [`CycleOutcome::Skipped`] without side
/// effects. The guard is owned by this value, not global, so uploaders for
/// different journals run independently of each other.
#[derive(Debug)]
pub struct Uploader {
    journal_path: PathBuf,
    in_flight: AtomicBool,
}

impl Uploader {
    /// Creates an uploader for the journal at `journal_path`.
    pub fn new(journal_path: impl Into<PathBuf>) -> Self {
        Self {
            journal_path: journal_path.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Returns the path of the journal this uploader rotates.
    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    /// Runs one upload cycle against the given backend.
    ///
    /// The steps run strictly in sequence: rotate the journal into its
    /// capture file, read the capture, hand the raw contents to the backend,
    /// and remove the capture once the backend reports success. An empty
    /// capture is removed without involving the backend.
    ///
    /// On any error the capture file stays where the failing step left it,
    /// so the next cycle picks it up again; see [`CycleError`] for the
    /// per-step retry behavior.
    pub async fn run_cycle<U: Upload>(&self, backend: &U) -> Result<CycleOutcome, CycleError> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            statline_log::debug!(
                journal = %self.journal_path.display(),
                "upload cycle already in flight, skipping"
            );
            return Ok(CycleOutcome::Skipped);
        }

        // Cleared on every exit path, including cancellation of this future.
        let _guard = InFlightGuard(&self.in_flight);

        let capture = rotate(&self.journal_path)
            .await
            .map_err(CycleError::Rotate)?;

        let contents = fs::read_to_string(&capture)
            .await
            .map_err(CycleError::Read)?;

        if contents.is_empty() {
            fs::remove_file(&capture)
                .await
                .map_err(CycleError::Cleanup)?;

            statline_log::debug!(
                journal = %self.journal_path.display(),
                "journal was empty, nothing to upload"
            );
            return Ok(CycleOutcome::Empty);
        }

        backend.upload(&contents).await.map_err(CycleError::Upload)?;

        fs::remove_file(&capture)
            .await
            .map_err(CycleError::Cleanup)?;

        statline_log::debug!(
            journal = %self.journal_path.display(),
            bytes = contents.len(),
            "uploaded capture file"
        );

        Ok(CycleOutcome::Uploaded)
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
