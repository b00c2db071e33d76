use statline_journal::{DEFAULT_STALE_THRESHOLD, RejectSink, Sample};

use super::{Upload, UploadError};

/// Logs validated samples instead of transmitting them.
///
/// A dry-run strategy for staging a journal before gateway credentials
/// exist: contents run through the same validation as a real upload, valid
/// samples are logged at info level, and the upload always succeeds, so
/// capture files are cleaned up as in production.
#[derive(Debug)]
pub struct LogBackend {
    instance: Option<String>,
    rejects: RejectSink,
}

impl LogBackend {
    /// Creates a log backend attaching `instance` to parsed samples.
    pub fn new(instance: Option<String>) -> Self {
        Self {
            instance,
            rejects: RejectSink::new(),
        }
    }

    /// Returns a handle to the sink receiving rejected journal lines.
    pub fn reject_sink(&self) -> RejectSink {
        self.rejects.clone()
    }

    /// Installs a new sink for rejected lines, returning the previous one
    /// with its un-drained contents intact.
    pub fn set_reject_sink(&mut self, sink: RejectSink) -> RejectSink {
        std::mem::replace(&mut self.rejects, sink)
    }
}

impl Upload for LogBackend {
    async fn upload(&self, contents: &str) -> Result<(), UploadError> {
        let samples = Sample::parse(
            contents,
            self.instance.as_deref(),
            DEFAULT_STALE_THRESHOLD,
            Some(&self.rejects),
        );

        for sample in &samples {
            statline_log::info!(
                name = %sample.name,
                value = sample.value,
                collected_at = %sample.collected_at,
                "would upload sample"
            );
        }

        statline_log::info!(samples = samples.len(), "dry-run upload complete");
        Ok(())
    }
}
