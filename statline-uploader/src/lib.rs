//! Journal rotation and batch upload pipeline for Statline.
//!
//! The uploader turns an append-only sample journal into batched deliveries
//! to a metrics backend with at-least-once semantics:
//!
//!  1. [`rotate`](rotate()) atomically hands the journal off to a capture
//!     file, so new samples keep accumulating under the original name.
//!  2. [`Uploader::run_cycle`] reads the capture, passes the raw contents to
//!     an [`Upload`] backend, and deletes the capture only after the backend
//!     reports success. A failed upload leaves the capture in place, and the
//!     next cycle retries it with identical contents.
//!  3. [`start_upload_loop`] drives cycles on a fixed interval, reporting
//!     every failure to an error callback without ever stopping the loop.
//!
//! Backends are configured through [`BackendConfig`], a closed set resolved
//! into a typed [`Backend`] when configuration loads. The bundled gateway
//! backend validates samples against a two-hour staleness window and POSTs
//! them as JSON; rejected lines are diverted to a
//! [`RejectSink`](statline_journal::RejectSink) for diagnostics.

#![warn(missing_docs)]

mod backend;
mod config;
mod cycle;
mod rotate;
mod schedule;

pub use self::backend::{API_KEY_HEADER, Backend, GatewayBackend, LogBackend, Upload, UploadError};
pub use self::config::{BackendConfig, Config, ConfigError, GatewayConfig};
pub use self::cycle::{CycleError, CycleOutcome, Uploader};
pub use self::rotate::{CAPTURE_SUFFIX, capture_path, rotate};
pub use self::schedule::{
    DEFAULT_UPLOAD_INTERVAL, UploadLoopError, UploadLoopHandle, start_upload_loop,
    start_upload_loop_with,
};
