use crate::oauth1::OAuth1Signer;
use exporter_core::{CoreError, Credentials, StreamApiError};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthType, AuthUrl, ClientId, ClientSecret, RequestTokenError, TokenResponse, TokenUrl,
};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Produces the `Authorization` header for the stream request.
///
/// User-context credentials sign every request with OAuth 1.0a. App-only
/// credentials send a bearer token; consumer credentials are exchanged once
/// with the client-credentials grant and the token is cached until
/// invalidated.
#[derive(Debug)]
pub struct Authenticator {
    credentials: Credentials,
    token_url: Url,
    token_timeout: Duration,
    signer: Option<OAuth1Signer>,
    cached: Option<String>,
}

impl Authenticator {
    pub fn new(credentials: Credentials, token_url: Url) -> Self {
        let (signer, cached) = match &credentials {
            Credentials::OAuth1 {
                consumer_key,
                consumer_secret,
                access_token,
                access_secret,
            } => (
                Some(OAuth1Signer::new(
                    consumer_key.clone(),
                    consumer_secret.clone(),
                    access_token.clone(),
                    access_secret.clone(),
                )),
                None,
            ),
            Credentials::Bearer(token) => (None, Some(token.clone())),
            Credentials::ClientCredentials { .. } => (None, None),
        };

        Self {
            credentials,
            token_url,
            token_timeout: Duration::from_secs(10),
            signer,
            cached,
        }
    }

    pub fn with_token_timeout(mut self, token_timeout: Duration) -> Self {
        self.token_timeout = token_timeout;
        self
    }

    /// True when a request can be authorized without a token exchange.
    pub fn has_token(&self) -> bool {
        self.signer.is_some() || self.cached.is_some()
    }

    /// Header value for a request with the given form parameters.
    pub async fn authorization(
        &mut self,
        method: &str,
        url: &Url,
        params: &[(&str, &str)],
    ) -> Result<String, CoreError> {
        if let Some(signer) = &self.signer {
            return signer.authorization(method, url, params);
        }

        let token = self.bearer_token().await?;
        Ok(format!("Bearer {}", token))
    }

    pub async fn bearer_token(&mut self) -> Result<String, CoreError> {
        if let Some(token) = &self.cached {
            return Ok(token.clone());
        }

        let token = self.exchange_client_credentials().await?;
        self.cached = Some(token.clone());
        Ok(token)
    }

    /// Drops a cached exchanged token so the next call fetches a new one.
    /// Returns whether anything was dropped; configured tokens and signed
    /// requests have nothing to refresh.
    pub fn invalidate(&mut self) -> bool {
        if matches!(self.credentials, Credentials::ClientCredentials { .. })
            && self.cached.is_some()
        {
            debug!("Invalidating cached bearer token");
            self.cached = None;
            return true;
        }
        false
    }

    async fn exchange_client_credentials(&self) -> Result<String, CoreError> {
        let Credentials::ClientCredentials {
            consumer_key,
            consumer_secret,
        } = &self.credentials
        else {
            return Err(CoreError::Internal {
                message: "No consumer credentials to exchange".to_string(),
            });
        };

        info!("Requesting app-only bearer token from {}", self.token_url);

        // The authorize URL is never visited by the client-credentials grant.
        let client = BasicClient::new(
            ClientId::new(consumer_key.clone()),
            Some(ClientSecret::new(consumer_secret.clone())),
            AuthUrl::from_url(self.token_url.clone()),
            Some(TokenUrl::from_url(self.token_url.clone())),
        )
        .set_auth_type(AuthType::BasicAuth);

        let exchange = client
            .exchange_client_credentials()
            .request_async(async_http_client);

        let response = tokio::time::timeout(self.token_timeout, exchange)
            .await
            .map_err(|_| CoreError::Timeout {
                seconds: self.token_timeout.as_secs(),
            })?
            .map_err(|e| match e {
                RequestTokenError::Request(e) => StreamApiError::TokenEndpointUnavailable {
                    reason: e.to_string(),
                },
                RequestTokenError::Other(reason) => {
                    StreamApiError::TokenEndpointUnavailable { reason }
                }
                rejected => StreamApiError::AuthenticationFailed {
                    reason: rejected.to_string(),
                },
            })?;

        debug!("Bearer token obtained");
        Ok(response.access_token().secret().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_url() -> Url {
        Url::parse("https://api.example.com/oauth2/token").unwrap()
    }

    fn stream_url() -> Url {
        Url::parse("https://stream.example.com/1.1/statuses/filter.json").unwrap()
    }

    #[tokio::test]
    async fn test_configured_bearer_token_is_used_directly() {
        let mut auth = Authenticator::new(Credentials::Bearer("abc".to_string()), token_url());
        assert!(auth.has_token());
        assert_eq!(
            auth.authorization("POST", &stream_url(), &[]).await.unwrap(),
            "Bearer abc"
        );

        assert!(!auth.invalidate());
        assert!(auth.has_token());
    }

    #[tokio::test]
    async fn test_user_context_requests_are_signed() {
        let mut auth = Authenticator::new(
            Credentials::OAuth1 {
                consumer_key: "ckey".to_string(),
                consumer_secret: "csecret".to_string(),
                access_token: "atoken".to_string(),
                access_secret: "asecret".to_string(),
            },
            token_url(),
        );
        assert!(auth.has_token());

        let header = auth
            .authorization("POST", &stream_url(), &[("track", "widget")])
            .await
            .unwrap();
        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_consumer_key=\"ckey\""));
        assert!(header.contains("oauth_token=\"atoken\""));
        assert!(!header.contains("csecret"));
        assert!(!header.contains("asecret"));
        assert!(!auth.invalidate());
    }

    #[test]
    fn test_client_credentials_start_without_token() {
        let auth = Authenticator::new(
            Credentials::ClientCredentials {
                consumer_key: "key".to_string(),
                consumer_secret: "secret".to_string(),
            },
            token_url(),
        );
        assert!(!auth.has_token());
    }

    #[tokio::test]
    async fn test_unreachable_token_endpoint_is_retryable() {
        let mut auth = Authenticator::new(
            Credentials::ClientCredentials {
                consumer_key: "key".to_string(),
                consumer_secret: "secret".to_string(),
            },
            Url::parse("http://127.0.0.1:1/oauth2/token").unwrap(),
        );

        let result = auth.bearer_token().await;
        assert!(matches!(
            result,
            Err(CoreError::StreamApi(
                StreamApiError::TokenEndpointUnavailable { .. }
            ))
        ));
        assert!(!auth.has_token());
    }
}
