use crate::oauth1::form_body;
use exporter_core::{ConfigError, CoreError, ExporterConfig, StreamApiError};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

const USER_AGENT: &str = concat!("twitter-stream-exporter/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the filter stream.
#[derive(Debug, Clone)]
pub struct StreamClientConfig {
    pub stream_url: Url,
    /// Comma-joined keywords sent as the `track` parameter.
    pub track: String,
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Upstream sends a keep-alive every 30 seconds; three missed ones mean
    /// the connection is dead.
    pub stall_timeout: Duration,
}

impl StreamClientConfig {
    pub fn new(stream_url: Url, track: String) -> Self {
        Self {
            stream_url,
            track,
            user_agent: USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
            stall_timeout: Duration::from_secs(90),
        }
    }

    pub fn from_exporter_config(config: &ExporterConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.stream_url()?,
            config.keyword_set().to_track_param(),
        ))
    }
}

/// HTTP side of the stream adapter: opens the long-lived filter request.
#[derive(Debug)]
pub struct StreamClient {
    http_client: Client,
    config: StreamClientConfig,
}

impl StreamClient {
    pub fn new(config: StreamClientConfig) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &StreamClientConfig {
        &self.config
    }

    /// Form parameters of the filter request, in the order they are sent.
    pub fn form_params(&self) -> [(&str, &str); 2] {
        [
            ("track", self.config.track.as_str()),
            ("stall_warnings", "true"),
        ]
    }

    /// Opens the stream with a ready `Authorization` header value. Only a
    /// 2xx response is returned; every other status is mapped to a
    /// [`StreamApiError`].
    pub async fn connect(&self, authorization: &str) -> Result<Response, CoreError> {
        let endpoint = self.config.stream_url.path().to_string();
        info!(
            "Connecting to filter stream {} tracking [{}]",
            self.config.stream_url, self.config.track
        );

        // Encoded by hand so the body matches the signed parameters byte
        // for byte.
        let body = form_body(&self.form_params());

        let response = self
            .http_client
            .post(self.config.stream_url.clone())
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("Network error connecting to {}: {}", endpoint, e);
                if e.is_timeout() {
                    CoreError::Timeout {
                        seconds: self.config.connect_timeout.as_secs(),
                    }
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!("Stream connected: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Stream request failed with status: {} for {}", status, endpoint);
        Err(status_error(status, &endpoint).into())
    }
}

fn status_error(status: StatusCode, endpoint: &str) -> StreamApiError {
    match status.as_u16() {
        401 => StreamApiError::InvalidToken,
        403 => StreamApiError::Forbidden {
            endpoint: endpoint.to_string(),
        },
        420 | 429 => StreamApiError::RateLimited {
            status_code: status.as_u16(),
        },
        code if status.is_server_error() => StreamApiError::ServerError { status_code: code },
        code => StreamApiError::RequestFailed { status_code: code },
    }
}
