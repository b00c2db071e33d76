use std::future::Future;

use statline_journal::RejectSink;

use crate::config::{BackendConfig, ConfigError};

mod gateway;
mod log;

pub use self::gateway::{API_KEY_HEADER, GatewayBackend};
pub use self::log::LogBackend;

/// An upload capability consuming raw captured journal contents.
///
/// Implementations receive the unparsed capture file contents. Parsing is
/// the backend's responsibility: staleness windows and format rules differ
/// between backends, so the orchestration layer never interprets the data it
/// moves.
pub trait Upload {
    /// Uploads the raw contents of one capture file.
    ///
    /// Returning an error leaves the capture file in place; the same
    /// contents are offered again on the next cycle.
    fn upload(&self, contents: &str) -> impl Future<Output = Result<(), UploadError>> + Send;
}

/// An error reported by an upload backend.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The request could not be sent, or failed before a response arrived.
    #[error("could not send upload request")]
    Network(#[source] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("metrics backend responded with status {status}")]
    Status {
        /// The HTTP status code of the response.
        status: reqwest::StatusCode,
        /// The response body, kept verbatim as opaque diagnostic text.
        body: String,
    },
}

/// A configured upload strategy.
///
/// The set of strategies is closed and resolved from [`BackendConfig`] when
/// configuration loads; nothing dispatches on backend names at upload time.
#[derive(Debug)]
pub enum Backend {
    /// Upload to a remote metrics gateway over HTTP.
    Gateway(GatewayBackend),

    /// Log samples instead of uploading them.
    Log(LogBackend),
}

impl Backend {
    /// Resolves a backend configuration into a ready-to-use backend.
    ///
    /// `instance` is attached to every sample the backend parses. Fails fast
    /// on configuration errors; nothing here is retried.
    pub fn from_config(
        config: BackendConfig,
        instance: Option<String>,
    ) -> Result<Self, ConfigError> {
        match config {
            BackendConfig::Gateway(config) => {
                Ok(Self::Gateway(GatewayBackend::new(config, instance)?))
            }
            BackendConfig::Log => Ok(Self::Log(LogBackend::new(instance))),
        }
    }

    /// Returns a handle to the backend's rejected-line sink.
    pub fn reject_sink(&self) -> RejectSink {
        match self {
            Self::Gateway(backend) => backend.reject_sink(),
            Self::Log(backend) => backend.reject_sink(),
        }
    }

    /// Installs a new rejected-line sink, returning the previous one with
    /// its un-drained contents intact.
    pub fn set_reject_sink(&mut self, sink: RejectSink) -> RejectSink {
        match self {
            Self::Gateway(backend) => backend.set_reject_sink(sink),
            Self::Log(backend) => backend.set_reject_sink(sink),
        }
    }
}

impl Upload for Backend {
    async fn upload(&self, contents: &str) -> Result<(), UploadError> {
        match self {
            Self::Gateway(backend) => backend.upload(contents).await,
            Self::Log(backend) => backend.upload(contents).await,
        }
    }
}
