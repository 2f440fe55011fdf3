use crate::error::*;
use tracing::{error, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!(code = %self.error_code(), "CoreError: {}", self);
        match self {
            CoreError::StreamApi(e) => {
                error!("Stream API error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!(code = %self.error_code(), "CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::StreamApi(e) => e.is_retryable(),
            CoreError::Config(_) => false,
            CoreError::Network(_) | CoreError::Timeout { .. } => true,
            CoreError::Internal { .. } => true,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::StreamApi(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::Timeout { .. } => {
                "The operation took too long to complete. It will be retried.".to_string()
            }
            CoreError::Internal { .. } => "An unexpected error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::StreamApi(e) => e.error_code(),
            CoreError::Config(e) => e.error_code(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::Timeout { .. } => "TIMEOUT".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for StreamApiError {
    fn log_error(&self) -> &Self {
        error!("StreamApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("StreamApiError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        !matches!(
            self,
            StreamApiError::AuthenticationFailed { .. }
                | StreamApiError::InvalidToken
                | StreamApiError::Forbidden { .. }
        )
    }

    fn user_friendly_message(&self) -> String {
        match self {
            StreamApiError::AuthenticationFailed { .. } => {
                "Stream authentication failed. Please check your consumer key and secret."
                    .to_string()
            }
            StreamApiError::TokenEndpointUnavailable { .. } => {
                "Could not reach the token endpoint. Retrying.".to_string()
            }
            StreamApiError::InvalidToken => {
                "The stream endpoint rejected the credentials. Please check your access token and secret."
                    .to_string()
            }
            StreamApiError::Forbidden { endpoint } => format!(
                "Access denied to {}. Your application may not have streaming access.",
                endpoint
            ),
            StreamApiError::RateLimited { .. } => {
                "Too many connection attempts. Backing off before reconnecting.".to_string()
            }
            StreamApiError::Stalled { .. } => {
                "The stream stopped sending data. Reconnecting.".to_string()
            }
            _ => "Stream connection error occurred. Reconnecting.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            StreamApiError::AuthenticationFailed { .. } => "STREAM_AUTH_FAILED".to_string(),
            StreamApiError::TokenEndpointUnavailable { .. } => {
                "STREAM_TOKEN_UNAVAILABLE".to_string()
            }
            StreamApiError::InvalidToken => "STREAM_INVALID_TOKEN".to_string(),
            StreamApiError::Forbidden { .. } => "STREAM_FORBIDDEN".to_string(),
            StreamApiError::RateLimited { .. } => "STREAM_RATE_LIMIT".to_string(),
            StreamApiError::ServerError { .. } => "STREAM_SERVER_ERROR".to_string(),
            StreamApiError::RequestFailed { .. } => "STREAM_REQUEST_FAILED".to_string(),
            StreamApiError::Stalled { .. } => "STREAM_STALLED".to_string(),
            StreamApiError::StreamClosed => "STREAM_CLOSED".to_string(),
            StreamApiError::Disconnected { .. } => "STREAM_DISCONNECTED".to_string(),
            StreamApiError::LineTooLong { .. } => "STREAM_LINE_TOO_LONG".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::MissingField { field } => {
                format!("Required configuration field '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => format!(
                "Environment variable '{}' is required but not set.",
                var_name
            ),
            ConfigError::Parse(_) => {
                "Configuration file format is invalid. Please check the settings.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

/// Logs an error that is about to end the process, with its code and the
/// operator-facing message.
pub fn report_fatal(error: &CoreError) {
    error.log_error();
    error!(
        code = %error.error_code(),
        "{}",
        error.user_friendly_message()
    );
}
