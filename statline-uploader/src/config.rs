use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Indicates config related errors.
///
/// Configuration errors are fatal and surface synchronously; nothing here is
/// retried.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to open the config file.
    #[error("could not open config file {}", path.display())]
    CouldNotOpenFile {
        /// The path of the unreadable file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Parsing YAML failed.
    #[error("could not parse yaml config file")]
    BadYaml(#[source] serde_yaml::Error),

    /// Parsing JSON failed.
    #[error("could not parse json config file")]
    BadJson(#[source] serde_json::Error),

    /// The config file extension is not a supported format.
    #[error("unsupported config file format {extension:?}")]
    UnsupportedFormat {
        /// The unrecognized file extension.
        extension: String,
    },

    /// The gateway backend requires an API key.
    #[error("missing API key for the gateway backend")]
    MissingApiKey,

    /// The gateway endpoint is not a valid URL.
    #[error("invalid gateway endpoint url {endpoint:?}")]
    InvalidEndpoint {
        /// The rejected endpoint value.
        endpoint: String,
    },

    /// The gateway HTTP client could not be constructed.
    #[error("could not construct the gateway HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

/// Top-level uploader configuration.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// The path of the journal file to rotate and upload.
    pub journal_path: PathBuf,

    /// The prefix prepended to metric names written to this journal.
    #[serde(default)]
    pub prefix: String,

    /// The instance identity attached to uploaded samples.
    #[serde(default)]
    pub instance: Option<String>,

    /// Milliseconds between upload cycles.
    #[serde(default = "default_upload_interval_ms")]
    pub upload_interval_ms: u64,

    /// The upload strategy and its settings.
    pub backend: BackendConfig,
}

fn default_upload_interval_ms() -> u64 {
    crate::schedule::DEFAULT_UPLOAD_INTERVAL.as_millis() as u64
}

impl Config {
    /// Loads a configuration file, choosing the format by extension.
    ///
    /// `.yml` and `.yaml` parse as YAML, `.json` as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let contents =
            fs::read_to_string(path).map_err(|source| ConfigError::CouldNotOpenFile {
                path: path.to_path_buf(),
                source,
            })?;

        match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
            "yml" | "yaml" => serde_yaml::from_str(&contents).map_err(ConfigError::BadYaml),
            "json" => serde_json::from_str(&contents).map_err(ConfigError::BadJson),
            other => Err(ConfigError::UnsupportedFormat {
                extension: other.to_owned(),
            }),
        }
    }

    /// Returns the interval between upload cycles.
    pub fn upload_interval(&self) -> Duration {
        Duration::from_millis(self.upload_interval_ms)
    }
}

/// The closed set of upload strategies, as configuration.
///
/// The tag picks the strategy and each variant carries its own typed
/// settings. Resolution into a [`Backend`](crate::Backend) happens when
/// configuration loads, never by string matching at upload time.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Upload to a remote metrics gateway over HTTP.
    Gateway(GatewayConfig),

    /// Log samples instead of uploading them.
    Log,
}

/// Configuration for the HTTP gateway backend.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// The URL receiving upload requests.
    pub endpoint: String,

    /// The API key sent with every upload.
    pub api_key: String,

    /// Seconds before an upload request is abandoned.
    ///
    /// The upload contract imposes no timeout; this is an operational knob
    /// that defaults to off.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl GatewayConfig {
    /// Returns the configured request timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statline.yml");
        std::fs::write(
            &path,
            r#"
journal_path: /var/lib/statline/metrics.journal
prefix: app.
instance: worker-7
backend:
  backend: gateway
  endpoint: https://gateway.example.com/v1/samples
  api_key: secret
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(
            config.journal_path,
            PathBuf::from("/var/lib/statline/metrics.journal")
        );
        assert_eq!(config.prefix, "app.");
        assert_eq!(config.instance.as_deref(), Some("worker-7"));
        assert_eq!(config.upload_interval(), Duration::from_millis(120_000));

        match config.backend {
            BackendConfig::Gateway(gateway) => {
                assert_eq!(gateway.endpoint, "https://gateway.example.com/v1/samples");
                assert_eq!(gateway.api_key, "secret");
                assert_eq!(gateway.timeout(), None);
            }
            other => panic!("expected gateway backend, got {other:?}"),
        }
    }

    #[test]
    fn test_load_json_with_log_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statline.json");
        std::fs::write(
            &path,
            r#"{
                "journal_path": "metrics.journal",
                "upload_interval_ms": 5000,
                "backend": {"backend": "log"}
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.upload_interval(), Duration::from_secs(5));
        assert!(matches!(config.backend, BackendConfig::Log));
        assert_eq!(config.instance, None);
    }

    #[test]
    fn test_load_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statline.toml");
        std::fs::write(&path, "journal_path = 'x'").unwrap();

        let error = Config::load(&path).unwrap_err();
        assert!(matches!(
            error,
            ConfigError::UnsupportedFormat { extension } if extension == "toml"
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let error = Config::load("/does/not/exist/statline.yml").unwrap_err();
        assert!(matches!(error, ConfigError::CouldNotOpenFile { .. }));
    }

    #[test]
    fn test_unknown_backend_name_fails_to_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statline.yml");
        std::fs::write(
            &path,
            "journal_path: metrics.journal\nbackend:\n  backend: carrier-pigeon\n",
        )
        .unwrap();

        let error = Config::load(&path).unwrap_err();
        assert!(matches!(error, ConfigError::BadYaml(_)));
    }
}
