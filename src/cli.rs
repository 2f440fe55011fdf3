use clap::Parser;
use exporter_core::{ConfigError, ExporterConfig};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "twitter-stream-exporter",
    version,
    about = "Exports keyword mention counts from the Twitter filter stream as Prometheus metrics"
)]
pub struct Cli {
    /// TOML file with exporter settings; flags override its values.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Comma-separated list of keywords to track.
    #[arg(long = "twitter.track", value_name = "KEYWORDS")]
    pub track: Option<String>,

    /// Address on which to expose metrics and web interface.
    #[arg(long = "web.listen-address", value_name = "ADDRESS")]
    pub listen_address: Option<String>,

    /// Path under which to expose metrics.
    #[arg(long = "web.telemetry-path", value_name = "PATH")]
    pub telemetry_path: Option<String>,

    #[arg(long = "twitter.stream-url", value_name = "URL")]
    pub stream_url: Option<String>,

    #[arg(long = "twitter.token-url", value_name = "URL")]
    pub token_url: Option<String>,

    /// Posts buffered between the stream and the classifier.
    #[arg(long = "stream.channel-capacity", value_name = "N")]
    pub channel_capacity: Option<usize>,

    #[arg(
        long = "twitter.consumer-key",
        env = "TWITTER_CONSUMER_KEY",
        hide_env_values = true
    )]
    pub consumer_key: Option<String>,

    #[arg(
        long = "twitter.consumer-secret",
        env = "TWITTER_CONSUMER_SECRET",
        hide_env_values = true
    )]
    pub consumer_secret: Option<String>,

    #[arg(
        long = "twitter.access-token",
        env = "TWITTER_ACCESS_TOKEN",
        hide_env_values = true
    )]
    pub access_token: Option<String>,

    #[arg(
        long = "twitter.access-secret",
        env = "TWITTER_ACCESS_SECRET",
        hide_env_values = true
    )]
    pub access_secret: Option<String>,

    #[arg(
        long = "twitter.bearer-token",
        env = "TWITTER_BEARER_TOKEN",
        hide_env_values = true
    )]
    pub bearer_token: Option<String>,
}

impl Cli {
    /// Loads the config file if given, applies flag overrides and validates
    /// the result.
    pub fn into_config(self) -> Result<ExporterConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ExporterConfig::from_file(path)?,
            None => ExporterConfig::default(),
        };

        if let Some(track) = &self.track {
            config.set_track(track);
        }
        if let Some(listen_address) = self.listen_address {
            config.listen_address = listen_address;
        }
        if let Some(telemetry_path) = self.telemetry_path {
            config.telemetry_path = telemetry_path;
        }
        if let Some(stream_url) = self.stream_url {
            config.stream_url = stream_url;
        }
        if let Some(token_url) = self.token_url {
            config.token_url = token_url;
        }
        if let Some(channel_capacity) = self.channel_capacity {
            config.channel_capacity = channel_capacity;
        }
        if self.consumer_key.is_some() {
            config.consumer_key = self.consumer_key;
        }
        if self.consumer_secret.is_some() {
            config.consumer_secret = self.consumer_secret;
        }
        if self.access_token.is_some() {
            config.access_token = self.access_token;
        }
        if self.access_secret.is_some() {
            config.access_secret = self.access_secret;
        }
        if self.bearer_token.is_some() {
            config.bearer_token = self.bearer_token;
        }

        config.validate()?;
        Ok(config)
    }
}
