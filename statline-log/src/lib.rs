//! Logging facade for Statline.
//!
//! # Setup
//!
//! To enable logging, invoke the [`init`] function with a [`LogConfig`]. The
//! configuration implements `serde` traits, so it can be obtained from
//! configuration files.
//!
//! ```
//! let log_config = statline_log::LogConfig {
//!     enable_backtraces: true,
//!     ..Default::default()
//! };
//!
//! statline_log::init(&log_config);
//! ```
//!
//! # Logging
//!
//! The basic use of this crate is through the five logging macros: [`error!`],
//! [`warn!`], [`info!`], [`debug!`] and [`trace!`] where `error!` represents
//! the highest-priority log messages and `trace!` the lowest. The log messages
//! are filtered by configuring the log level to exclude messages with a lower
//! priority. Each of these macros accept format strings similarly to
//! [`println!`].
//!
//! ## Conventions
//!
//! Log messages should start lowercase and end without punctuation. Prefer
//! short and precise log messages over verbose text. Choose the log level
//! according to these rules:
//!
//! - [`error!`] for bugs and invalid behavior.
//! - [`warn!`] for undesirable behavior.
//! - [`info!`] for messages relevant to the average user.
//! - [`debug!`] for messages usually relevant to debugging.
//! - [`trace!`] for full auxiliary information.
//!
//! ## Logging Error Types
//!
//! To log error types with their full chain of causes, use the [`LogError`]
//! wrapper.
//!
//! ```
//! use statline_log::LogError;
//!
//! if let Err(error) = std::env::var("FOO") {
//!     statline_log::error!("env failed: {}", LogError(&error));
//! }
//! ```
//!
//! # Testing
//!
//! For unit testing, there is a separate initialization macro `init_test!`,
//! gated behind the `test` feature, that should be called at the beginning of
//! the test method. It enables test mode of the logger and customizes log
//! levels for the current crate.
//!
//! ```ignore
//! #[test]
//! fn test_something() {
//!     statline_log::init_test!();
//! }
//! ```

#![warn(missing_docs)]

#[cfg(feature = "init")]
mod setup;
#[cfg(feature = "init")]
pub use setup::*;

#[cfg(feature = "test")]
mod test;
#[cfg(feature = "test")]
pub use test::*;

mod utils;
pub use utils::*;

// Expose the minimal log facade.
#[doc(inline)]
pub use tracing::{debug, error, info, trace, warn};
