use crate::{ConfigError, KeywordSet};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use url::Url;

pub const DEFAULT_LISTEN_ADDRESS: &str = ":19000";
pub const DEFAULT_TELEMETRY_PATH: &str = "/metrics";
pub const DEFAULT_STREAM_URL: &str = "https://stream.twitter.com/1.1/statuses/filter.json";
pub const DEFAULT_TOKEN_URL: &str = "https://api.twitter.com/oauth2/token";
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

pub const ENV_CONSUMER_KEY: &str = "TWITTER_CONSUMER_KEY";
pub const ENV_CONSUMER_SECRET: &str = "TWITTER_CONSUMER_SECRET";
pub const ENV_ACCESS_TOKEN: &str = "TWITTER_ACCESS_TOKEN";
pub const ENV_ACCESS_SECRET: &str = "TWITTER_ACCESS_SECRET";
pub const ENV_BEARER_TOKEN: &str = "TWITTER_BEARER_TOKEN";

/// Exporter settings, loaded from an optional TOML file and overridden by
/// command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    pub track: Vec<String>,
    pub listen_address: String,
    pub telemetry_path: String,
    pub stream_url: String,
    pub token_url: String,
    pub channel_capacity: usize,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub access_token: Option<String>,
    pub access_secret: Option<String>,
    pub bearer_token: Option<String>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            track: Vec::new(),
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            telemetry_path: DEFAULT_TELEMETRY_PATH.to_string(),
            stream_url: DEFAULT_STREAM_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            consumer_key: None,
            consumer_secret: None,
            access_token: None,
            access_secret: None,
            bearer_token: None,
        }
    }
}

/// How the stream client authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// User-context OAuth 1.0a: every request is signed with the consumer
    /// and access token secrets.
    OAuth1 {
        consumer_key: String,
        consumer_secret: String,
        access_token: String,
        access_secret: String,
    },
    /// A ready-made app-only bearer token.
    Bearer(String),
    /// Consumer key and secret, exchanged for a bearer token at startup.
    ClientCredentials {
        consumer_key: String,
        consumer_secret: String,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::OAuth1 {
                consumer_key,
                access_token,
                ..
            } => f
                .debug_struct("Credentials::OAuth1")
                .field("consumer_key", consumer_key)
                .field("access_token", access_token)
                .finish_non_exhaustive(),
            Credentials::Bearer(_) => f.write_str("Credentials::Bearer(..)"),
            Credentials::ClientCredentials { consumer_key, .. } => f
                .debug_struct("Credentials::ClientCredentials")
                .field("consumer_key", consumer_key)
                .finish_non_exhaustive(),
        }
    }
}

impl ExporterConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Sets the keyword list from a comma-delimited string.
    pub fn set_track(&mut self, list: &str) {
        self.track = list.split(',').map(str::to_string).collect();
    }

    pub fn keyword_set(&self) -> KeywordSet {
        KeywordSet::new(&self.track)
    }

    /// Resolves the listen address, accepting the `:port` shorthand.
    pub fn listen_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let address = if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        };

        address.parse().map_err(|_| ConfigError::InvalidValue {
            field: "listen_address".to_string(),
            value: self.listen_address.clone(),
        })
    }

    /// Picks the authentication scheme from whichever secrets are set.
    ///
    /// An access token or secret selects user-context OAuth 1.0a, which then
    /// needs all four values. Otherwise a bearer token is used as is, and a
    /// lone consumer key and secret are exchanged for an app-only token.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let access_token = non_blank(&self.access_token);
        let access_secret = non_blank(&self.access_secret);

        if access_token.is_some() || access_secret.is_some() {
            let (consumer_key, consumer_secret) = self.consumer_pair()?;
            return Ok(Credentials::OAuth1 {
                consumer_key,
                consumer_secret,
                access_token: required(access_token, ENV_ACCESS_TOKEN)?,
                access_secret: required(access_secret, ENV_ACCESS_SECRET)?,
            });
        }

        if let Some(token) = non_blank(&self.bearer_token) {
            return Ok(Credentials::Bearer(token.to_string()));
        }

        let (consumer_key, consumer_secret) = self.consumer_pair()?;
        Ok(Credentials::ClientCredentials {
            consumer_key,
            consumer_secret,
        })
    }

    fn consumer_pair(&self) -> Result<(String, String), ConfigError> {
        Ok((
            required(non_blank(&self.consumer_key), ENV_CONSUMER_KEY)?,
            required(non_blank(&self.consumer_secret), ENV_CONSUMER_SECRET)?,
        ))
    }

    pub fn stream_url(&self) -> Result<Url, ConfigError> {
        parse_url("stream_url", &self.stream_url)
    }

    pub fn token_url(&self) -> Result<Url, ConfigError> {
        parse_url("token_url", &self.token_url)
    }

    /// Checks every setting needed to start the exporter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keyword_set().is_empty() {
            return Err(ConfigError::MissingField {
                field: "track".to_string(),
            });
        }

        if !is_plain_path(&self.telemetry_path) {
            return Err(ConfigError::InvalidValue {
                field: "telemetry_path".to_string(),
                value: self.telemetry_path.clone(),
            });
        }

        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "channel_capacity".to_string(),
                value: "0".to_string(),
            });
        }

        self.listen_socket_addr()?;
        self.stream_url()?;
        self.token_url()?;
        self.credentials()?;

        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required(value: Option<&str>, var_name: &str) -> Result<String, ConfigError> {
    value
        .map(str::to_string)
        .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
            var_name: var_name.to_string(),
        })
}

/// An absolute path made of unreserved URL characters only. Route syntax
/// such as `:name`, `*rest` or `{name}` is rejected since the path is
/// mounted verbatim on the HTTP router.
fn is_plain_path(path: &str) -> bool {
    path.starts_with('/')
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '.' | '_' | '~'))
}

fn parse_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ExporterConfig {
        ExporterConfig {
            track: vec!["widgetfrobber".to_string()],
            bearer_token: Some("token".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = ExporterConfig::default();
        assert_eq!(config.listen_address, ":19000");
        assert_eq!(config.telemetry_path, "/metrics");
        assert_eq!(config.channel_capacity, 1024);
        assert!(config.track.is_empty());
    }

    #[test]
    fn test_listen_address_shorthand() {
        let config = valid_config();
        assert_eq!(
            config.listen_socket_addr().unwrap(),
            "0.0.0.0:19000".parse::<SocketAddr>().unwrap()
        );

        let config = ExporterConfig {
            listen_address: "127.0.0.1:9100".to_string(),
            ..valid_config()
        };
        assert_eq!(config.listen_socket_addr().unwrap().port(), 9100);

        let config = ExporterConfig {
            listen_address: "not-an-address".to_string(),
            ..valid_config()
        };
        assert!(matches!(
            config.listen_socket_addr(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_requires_keywords() {
        let config = ExporterConfig {
            track: vec![" ".to_string(), "".to_string()],
            ..valid_config()
        };
        match config.validate() {
            Err(ConfigError::MissingField { field }) => assert_eq!(field, "track"),
            other => panic!("Expected MissingField error, got {:?}", other),
        }

        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_credentials_resolution() {
        let config = ExporterConfig {
            bearer_token: None,
            consumer_key: Some("key".to_string()),
            consumer_secret: Some("secret".to_string()),
            ..valid_config()
        };
        assert_eq!(
            config.credentials().unwrap(),
            Credentials::ClientCredentials {
                consumer_key: "key".to_string(),
                consumer_secret: "secret".to_string(),
            }
        );

        let config = ExporterConfig {
            bearer_token: Some("  ".to_string()),
            consumer_key: Some("key".to_string()),
            ..valid_config()
        };
        match config.credentials() {
            Err(ConfigError::MissingEnvironmentVariable { var_name }) => {
                assert_eq!(var_name, ENV_CONSUMER_SECRET)
            }
            other => panic!("Expected missing secret, got {:?}", other),
        }
    }

    #[test]
    fn test_access_token_selects_oauth1() {
        let config = ExporterConfig {
            bearer_token: Some("ignored".to_string()),
            consumer_key: Some("key".to_string()),
            consumer_secret: Some("secret".to_string()),
            access_token: Some("token".to_string()),
            access_secret: Some("token-secret".to_string()),
            ..valid_config()
        };
        assert_eq!(
            config.credentials().unwrap(),
            Credentials::OAuth1 {
                consumer_key: "key".to_string(),
                consumer_secret: "secret".to_string(),
                access_token: "token".to_string(),
                access_secret: "token-secret".to_string(),
            }
        );

        let config = ExporterConfig {
            access_secret: None,
            ..config
        };
        match config.credentials() {
            Err(ConfigError::MissingEnvironmentVariable { var_name }) => {
                assert_eq!(var_name, ENV_ACCESS_SECRET)
            }
            other => panic!("Expected missing access secret, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_credentials_name_the_variable() {
        let config = ExporterConfig {
            bearer_token: None,
            ..valid_config()
        };
        match config.validate() {
            Err(ConfigError::MissingEnvironmentVariable { var_name }) => {
                assert_eq!(var_name, ENV_CONSUMER_KEY)
            }
            other => panic!("Expected missing consumer key, got {:?}", other),
        }
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let rendered = format!("{:?}", Credentials::Bearer("very-secret".to_string()));
        assert!(!rendered.contains("very-secret"));

        let rendered = format!(
            "{:?}",
            Credentials::OAuth1 {
                consumer_key: "key".to_string(),
                consumer_secret: "consumer-secret".to_string(),
                access_token: "token".to_string(),
                access_secret: "access-secret".to_string(),
            }
        );
        assert!(!rendered.contains("consumer-secret"));
        assert!(!rendered.contains("access-secret"));
    }

    #[test]
    fn test_telemetry_path_must_be_plain() {
        for path in ["/metrics/*", "/metrics/*rest", "/:name", "/{name}", "/a b", "metrics", "/m?x"] {
            let config = ExporterConfig {
                telemetry_path: path.to_string(),
                ..valid_config()
            };
            match config.validate() {
                Err(ConfigError::InvalidValue { field, .. }) => {
                    assert_eq!(field, "telemetry_path", "path {:?}", path)
                }
                other => panic!("Expected {:?} to be rejected, got {:?}", path, other),
            }
        }

        for path in ["/", "/metrics", "/twitter/metrics.txt", "/v1/stream-stats_~"] {
            let config = ExporterConfig {
                telemetry_path: path.to_string(),
                ..valid_config()
            };
            assert!(config.validate().is_ok(), "path {:?}", path);
        }
    }

    #[test]
    fn test_toml_loading() {
        let config = ExporterConfig::from_toml_str(
            r#"
            track = ["WidgetFrobber", "dodgycorp"]
            listen_address = "127.0.0.1:9000"
            bearer_token = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.track.len(), 2);
        assert_eq!(config.telemetry_path, "/metrics");
        assert!(config.validate().is_ok());

        let result = ExporterConfig::from_toml_str("track = 5");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_set_track() {
        let mut config = ExporterConfig::default();
        config.set_track("a,B, c");
        assert_eq!(config.keyword_set().to_track_param(), "a,b,c");
    }
}
