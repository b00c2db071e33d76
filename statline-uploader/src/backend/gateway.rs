use reqwest::{Client, Url, redirect};
use serde::Serialize;
use statline_journal::{DEFAULT_STALE_THRESHOLD, RejectSink, Sample, UnixTimestamp};

use crate::config::{ConfigError, GatewayConfig};

use super::{Upload, UploadError};

/// The header carrying the gateway API key.
pub const API_KEY_HEADER: &str = "X-Statline-Key";

/// The version of the upload payload schema.
const PROTO_VERSION: u32 = 1;

/// The JSON body of one gateway upload.
#[derive(Debug, Serialize)]
struct Payload<'a> {
    timestamp: i64,
    proto_version: u32,
    data: &'a [Sample],
}

/// Uploads validated samples to a remote metrics gateway over HTTP.
///
/// Capture contents are parsed with a fixed two-hour staleness window; lines
/// that fail validation go to the backend's reject sink. When no valid
/// samples remain, the upload succeeds trivially without a network call.
///
/// A cycle issues at most one request: all samples are batched into a single
/// JSON `POST` with the API key in the [`API_KEY_HEADER`] header. Any status
/// of 300 or above is an upload error carrying the response body as
/// diagnostic payload; redirects are never followed.
#[derive(Debug)]
pub struct GatewayBackend {
    endpoint: Url,
    api_key: String,
    instance: Option<String>,
    client: Client,
    rejects: RejectSink,
}

impl GatewayBackend {
    /// Creates a gateway backend from its configuration.
    ///
    /// Fails when the API key is empty or the endpoint is not a valid URL.
    pub fn new(config: GatewayConfig, instance: Option<String>) -> Result<Self, ConfigError> {
        if config.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let endpoint = config
            .endpoint
            .parse::<Url>()
            .map_err(|_| ConfigError::InvalidEndpoint {
                endpoint: config.endpoint.clone(),
            })?;

        let mut builder = Client::builder().redirect(redirect::Policy::none());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            endpoint,
            api_key: config.api_key,
            instance,
            client: builder.build().map_err(ConfigError::HttpClient)?,
            rejects: RejectSink::new(),
        })
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

impl Upload for GatewayBackend {
    async fn upload(&self, contents: &str) -> Result<(), UploadError> {
        let samples = Sample::parse(
            contents,
            self.instance.as_deref(),
            DEFAULT_STALE_THRESHOLD,
            Some(&self.rejects),
        );

        if samples.is_empty() {
            statline_log::debug!("no valid samples in capture, skipping request");
            return Ok(());
        }

        let payload = Payload {
            timestamp: UnixTimestamp::now().as_secs(),
            proto_version: PROTO_VERSION,
            data: &samples,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(UploadError::Network)?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Status { status, body });
        }

        statline_log::debug!(samples = samples.len(), "uploaded samples to gateway");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::task::JoinHandle;

    use super::*;

    fn gateway(endpoint: String) -> GatewayBackend {
        GatewayBackend::new(
            GatewayConfig {
                endpoint,
                api_key: "secret".to_owned(),
                timeout_secs: None,
            },
            Some("worker-7".to_owned()),
        )
        .unwrap()
    }

    /// Serves exactly one canned HTTP response and returns the raw request.
    async fn serve_once(response: &'static str) -> (String, JoinHandle<String>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/upload", listener.local_addr().unwrap());

        let task = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut buffer = [0u8; 4096];
            loop {
                let read = stream.read(&mut buffer).await.unwrap();
                request.extend_from_slice(&buffer[..read]);
                if read == 0 || request_complete(&request) {
                    break;
                }
            }

            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();

            String::from_utf8(request).unwrap()
        });

        (endpoint, task)
    }

    /// Returns `true` once `request` holds all headers and the full body.
    fn request_complete(request: &[u8]) -> bool {
        let Some(headers_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };

        let headers = String::from_utf8_lossy(&request[..headers_end]);
        let content_length = headers
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())?
            })
            .unwrap_or(0);

        request.len() >= headers_end + 4 + content_length
    }

    #[test]
    fn test_invalid_endpoint_is_a_config_error() {
        let error = GatewayBackend::new(
            GatewayConfig {
                endpoint: "not a url".to_owned(),
                api_key: "secret".to_owned(),
                timeout_secs: None,
            },
            None,
        )
        .unwrap_err();

        assert!(matches!(error, ConfigError::InvalidEndpoint { .. }));
    }

    #[tokio::test]
    async fn test_stale_contents_succeed_without_network() {
        // Port 9 would refuse the connection; no request may be attempted.
        let backend = gateway("http://127.0.0.1:9/upload".to_owned());

        let result = backend.upload("1 sample 1.0\n3 sample 3.0\n").await;

        assert!(result.is_ok());
        assert_eq!(
            backend.reject_sink().drain(),
            vec!["1 sample 1.0".to_owned(), "3 sample 3.0".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_upload_posts_batched_payload() {
        let (endpoint, server) =
            serve_once("HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n").await;

        let backend = gateway(endpoint);

        let now = UnixTimestamp::now().as_secs();
        let contents = format!("{now} app.hits 1\n{now} app.time 2.5\n");
        backend.upload(&contents).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /upload HTTP/1.1\r\n"));

        let lowercase = request.to_ascii_lowercase();
        assert!(lowercase.contains("content-type: application/json"));
        assert!(lowercase.contains("x-statline-key: secret"));

        let body_start = request.find("\r\n\r\n").unwrap() + 4;
        let body: serde_json::Value = serde_json::from_str(&request[body_start..]).unwrap();

        assert_eq!(body["proto_version"], 1);
        assert!(body["timestamp"].as_i64().unwrap() >= now);

        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["name"], "app.hits");
        assert_eq!(data[0]["value"], 1.0);
        assert_eq!(data[0]["instance"], "worker-7");
        assert_eq!(data[1]["name"], "app.time");
    }

    #[tokio::test]
    async fn test_error_status_carries_response_body() {
        let (endpoint, server) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 9\r\nconnection: close\r\n\r\nboom time",
        )
        .await;

        let backend = gateway(endpoint);

        let now = UnixTimestamp::now().as_secs();
        let error = backend
            .upload(&format!("{now} app.hits 1\n"))
            .await
            .unwrap_err();

        match error {
            UploadError::Status { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, "boom time");
            }
            other => panic!("expected status error, got {other:?}"),
        }

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_a_network_error() {
        let backend = gateway("http://127.0.0.1:9/upload".to_owned());

        let now = UnixTimestamp::now().as_secs();
        let error = backend
            .upload(&format!("{now} app.hits 1\n"))
            .await
            .unwrap_err();

        assert!(matches!(error, UploadError::Network(_)));
    }
}
