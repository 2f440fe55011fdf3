//! Prints posts from the filter stream to stdout.
//!
//! ```text
//! TWITTER_CONSUMER_KEY=... TWITTER_CONSUMER_SECRET=... \
//! TWITTER_ACCESS_TOKEN=... TWITTER_ACCESS_SECRET=... \
//!     cargo run -p stream-client --example tail_stream -- rust,tokio
//! ```

use exporter_core::{
    ExporterConfig, ENV_ACCESS_SECRET, ENV_ACCESS_TOKEN, ENV_BEARER_TOKEN, ENV_CONSUMER_KEY,
    ENV_CONSUMER_SECRET,
};
use stream_client::{Authenticator, StreamAdapter, StreamClient, StreamClientConfig};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let track = std::env::args().nth(1).unwrap_or_else(|| "rust".to_string());
    let mut config = ExporterConfig {
        consumer_key: std::env::var(ENV_CONSUMER_KEY).ok(),
        consumer_secret: std::env::var(ENV_CONSUMER_SECRET).ok(),
        access_token: std::env::var(ENV_ACCESS_TOKEN).ok(),
        access_secret: std::env::var(ENV_ACCESS_SECRET).ok(),
        bearer_token: std::env::var(ENV_BEARER_TOKEN).ok(),
        ..ExporterConfig::default()
    };
    config.set_track(&track);
    config.validate()?;

    let client = StreamClient::new(StreamClientConfig::from_exporter_config(&config)?)?;
    let authenticator = Authenticator::new(config.credentials()?, config.token_url()?);

    let cancel = CancellationToken::new();
    let (sender, mut receiver) = mpsc::channel(64);
    let adapter = StreamAdapter::new(client, authenticator, sender, cancel.clone());
    let stats = adapter.stats();
    let stream_task = tokio::spawn(adapter.run());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                break;
            }
            post = receiver.recv() => match post {
                Some(post) => {
                    let kind = if post.retweeted_status.is_some() { "RT" } else { "  " };
                    println!("{} {}", kind, post.text.replace('\n', " "));
                }
                None => break,
            },
        }
    }

    stream_task.await??;
    println!("{:?}", stats.snapshot());
    Ok(())
}
