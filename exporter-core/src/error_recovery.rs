//! Error recovery strategies for the streaming connection.
//!
//! The stream adapter keeps a single long-lived connection open. When that
//! connection fails, the error decides whether to reconnect and which backoff
//! schedule to follow, or whether to give up and surface the error to the
//! process.

use crate::{CoreError, ErrorExt, StreamApiError};

/// Backoff schedule family to apply before reconnecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffKind {
    /// TCP/IP level failures and read stalls: short linear steps.
    Network,
    /// HTTP error responses: exponential from a few seconds.
    Http,
    /// HTTP 420/429: exponential from a minute.
    RateLimited,
}

/// Recovery strategy for handling a failed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Reconnect after waiting according to the given schedule
    Reconnect(BackoffKind),
    /// Stop streaming and propagate the error
    Fail,
}

impl RecoveryStrategy {
    pub fn is_reconnect(&self) -> bool {
        matches!(self, RecoveryStrategy::Reconnect(_))
    }
}

/// Maps connection errors to recovery strategies
pub struct ErrorRecovery;

impl ErrorRecovery {
    /// Determine the appropriate recovery strategy for a given error
    pub fn determine_strategy(error: &CoreError) -> RecoveryStrategy {
        match error {
            CoreError::StreamApi(api_error) => Self::strategy_for_api_error(api_error),

            // Dropped connections, resets and body read failures
            CoreError::Network(_) | CoreError::Timeout { .. } => {
                RecoveryStrategy::Reconnect(BackoffKind::Network)
            }

            // Configuration errors need operator intervention
            CoreError::Config(_) => RecoveryStrategy::Fail,

            CoreError::Internal { .. } => RecoveryStrategy::Reconnect(BackoffKind::Http),
        }
    }

    fn strategy_for_api_error(error: &StreamApiError) -> RecoveryStrategy {
        if !error.is_retryable() {
            return RecoveryStrategy::Fail;
        }

        match error {
            StreamApiError::RateLimited { .. } => {
                RecoveryStrategy::Reconnect(BackoffKind::RateLimited)
            }
            StreamApiError::ServerError { .. }
            | StreamApiError::RequestFailed { .. }
            | StreamApiError::Disconnected { .. } => RecoveryStrategy::Reconnect(BackoffKind::Http),
            StreamApiError::Stalled { .. }
            | StreamApiError::StreamClosed
            | StreamApiError::LineTooLong { .. }
            | StreamApiError::TokenEndpointUnavailable { .. } => {
                RecoveryStrategy::Reconnect(BackoffKind::Network)
            }
            StreamApiError::AuthenticationFailed { .. }
            | StreamApiError::InvalidToken
            | StreamApiError::Forbidden { .. } => RecoveryStrategy::Fail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;

    #[test]
    fn test_network_errors_reconnect_linearly() {
        let timeout = CoreError::Timeout { seconds: 10 };
        assert_eq!(
            ErrorRecovery::determine_strategy(&timeout),
            RecoveryStrategy::Reconnect(BackoffKind::Network)
        );

        let unreachable = CoreError::StreamApi(StreamApiError::TokenEndpointUnavailable {
            reason: "connection refused".to_string(),
        });
        assert_eq!(
            ErrorRecovery::determine_strategy(&unreachable),
            RecoveryStrategy::Reconnect(BackoffKind::Network)
        );

        let stalled = CoreError::StreamApi(StreamApiError::Stalled { seconds: 90 });
        assert_eq!(
            ErrorRecovery::determine_strategy(&stalled),
            RecoveryStrategy::Reconnect(BackoffKind::Network)
        );
    }

    #[test]
    fn test_http_errors_reconnect_exponentially() {
        let server_error = CoreError::StreamApi(StreamApiError::ServerError { status_code: 503 });
        assert_eq!(
            ErrorRecovery::determine_strategy(&server_error),
            RecoveryStrategy::Reconnect(BackoffKind::Http)
        );

        let rate_limited = CoreError::StreamApi(StreamApiError::RateLimited { status_code: 420 });
        assert_eq!(
            ErrorRecovery::determine_strategy(&rate_limited),
            RecoveryStrategy::Reconnect(BackoffKind::RateLimited)
        );
    }

    #[test]
    fn test_auth_and_config_errors_fail() {
        let auth = CoreError::StreamApi(StreamApiError::InvalidToken);
        assert_eq!(
            ErrorRecovery::determine_strategy(&auth),
            RecoveryStrategy::Fail
        );

        let config_error = CoreError::Config(ConfigError::MissingField {
            field: "track".to_string(),
        });
        let strategy = ErrorRecovery::determine_strategy(&config_error);
        assert!(!strategy.is_reconnect());
    }
}
