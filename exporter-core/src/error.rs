use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Stream API error: {0}")]
    StreamApi(#[from] StreamApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Operation timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Error, Debug, Clone)]
pub enum StreamApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Token endpoint unreachable: {reason}")]
    TokenEndpointUnavailable { reason: String },

    #[error("Credentials rejected by stream endpoint")]
    InvalidToken,

    #[error("Forbidden access to stream: {endpoint}")]
    Forbidden { endpoint: String },

    #[error("Rate limited by stream endpoint (HTTP {status_code})")]
    RateLimited { status_code: u16 },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },

    #[error("Request failed with HTTP {status_code}")]
    RequestFailed { status_code: u16 },

    #[error("Stream stalled: no data for {seconds} seconds")]
    Stalled { seconds: u64 },

    #[error("Stream closed by upstream")]
    StreamClosed,

    #[error("Disconnected by upstream (code {code}): {reason}")]
    Disconnected { code: u32, reason: String },

    #[error("Stream line exceeded {limit} bytes without a terminator")]
    LineTooLong { limit: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
