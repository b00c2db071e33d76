use std::env;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// All crates of the Statline workspace, used for default log filters.
const CRATE_NAMES: &[&str] = &["statline_journal", "statline_log", "statline_uploader"];

/// Controls the log format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Auto detect the best format.
    ///
    /// This chooses [`LogFormat::Pretty`] for TTY, otherwise
    /// [`LogFormat::Simplified`].
    Auto,

    /// Pretty printing with colors.
    Pretty,

    /// Simplified plain text output.
    Simplified,

    /// Dump out JSON lines.
    Json,
}

/// The logging level for Statline crates.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only log errors.
    Error,
    /// Log errors and warnings.
    Warn,
    /// Log messages relevant to the average user.
    #[default]
    Info,
    /// Log messages relevant to debugging.
    Debug,
    /// Log full auxiliary information.
    Trace,
}

impl LogLevel {
    fn level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }
}

/// Controls the logging system.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// The log level for Statline crates.
    ///
    /// Third-party crates always log at `info` and above.
    pub level: LogLevel,

    /// Controls the log output format.
    ///
    /// Defaults to [`LogFormat::Auto`], which detects the best format based on
    /// the TTY.
    pub format: LogFormat,

    /// When set to `true`, backtraces are forced on.
    ///
    /// Otherwise, backtraces can be enabled by setting the `RUST_BACKTRACE`
    /// variable to `full`.
    pub enable_backtraces: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Auto,
            enable_backtraces: false,
        }
    }
}

/// Returns the default filter when `RUST_LOG` is not set.
///
/// Third-party crates are filtered at `info`, workspace crates follow the
/// configured level.
fn default_filter(level: LogLevel) -> EnvFilter {
    let mut filter = EnvFilter::new("info");

    for name in CRATE_NAMES {
        if let Ok(directive) = format!("{name}={}", level.level_filter()).parse() {
            filter = filter.add_directive(directive);
        }
    }

    filter
}

/// Initializes the logging system.
///
/// # Example
///
/// ```
/// let log_config = statline_log::LogConfig {
///     enable_backtraces: true,
///     ..Default::default()
/// };
///
/// statline_log::init(&log_config);
/// ```
pub fn init(config: &LogConfig) {
    if config.enable_backtraces {
        // Safety: called once during startup before worker threads exist.
        unsafe { env::set_var("RUST_BACKTRACE", "full") };
    }

    let filter = env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .and_then(|raw| raw.parse::<EnvFilter>().ok())
        .unwrap_or_else(|| default_filter(config.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match (config.format, console::user_attended()) {
        (LogFormat::Auto, true) | (LogFormat::Pretty, _) => builder.pretty().init(),
        (LogFormat::Auto, false) | (LogFormat::Simplified, _) => {
            builder.compact().with_ansi(false).init()
        }
        (LogFormat::Json, _) => builder.json().flatten_event(true).init(),
    }
}
