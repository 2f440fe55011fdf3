mod cli;
mod server;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use exporter_core::{report_fatal, CoreError, ExporterConfig};
use server::AppState;
use std::sync::Arc;
use stream_client::{Authenticator, StreamAdapter, StreamClient, StreamClientConfig};
use stream_metrics::{
    post_channel, BuildInfo, ClassificationService, CounterRegistry, PostClassifier,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "twitter_stream_exporter=info,stream_client=info,stream_metrics=info,exporter_core=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = cli.into_config().map_err(|e| {
        let e = CoreError::from(e);
        report_fatal(&e);
        e
    })?;

    run(config).await
}

async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    let build_info = BuildInfo::from_build_env(env!("CARGO_PKG_VERSION"));
    info!(
        version = %build_info.version,
        commit_sha = %build_info.commit_sha,
        build_date = %build_info.build_date,
        rust_version = %build_info.rust_version,
        "Starting twitter-stream-exporter"
    );

    let keywords = Arc::new(config.keyword_set());
    info!(
        "Tracking {} keywords: {}",
        keywords.len(),
        keywords.to_track_param()
    );

    let registry = Arc::new(CounterRegistry::new());
    let classifier = PostClassifier::new(Arc::clone(&keywords), Arc::clone(&registry));
    let (sender, receiver) = post_channel(config.channel_capacity);
    let cancel = CancellationToken::new();

    let client = StreamClient::new(StreamClientConfig::from_exporter_config(&config)?)?;
    let authenticator = Authenticator::new(config.credentials()?, config.token_url()?);
    let adapter = StreamAdapter::new(client, authenticator, sender, cancel.clone());

    let listen_address = config.listen_socket_addr()?;
    let listener = TcpListener::bind(listen_address)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", listen_address))?;

    let state = AppState {
        registry,
        build_info: Arc::new(build_info),
        telemetry_path: Arc::from(config.telemetry_path.as_str()),
    };

    let classification_task = tokio::spawn(ClassificationService::new(classifier, receiver).run());
    let stream_task = tokio::spawn(adapter.run());
    let server_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let result = server::serve(listener, state, cancel.clone()).await;
            if let Err(e) = &result {
                error!("Metrics server failed: {}", e);
                cancel.cancel();
            }
            result
        })
    };
    tokio::spawn(cancel_on_signal(cancel.clone()));

    // The stream task ends on cancellation or on a non-retryable error;
    // either way everything else shuts down with it.
    let stream_result = stream_task.await.context("stream task panicked")?;
    cancel.cancel();

    let processed = classification_task
        .await
        .context("classification task panicked")?;
    server_task
        .await
        .context("metrics server task panicked")?
        .context("metrics server failed")?;

    info!("Shutdown complete, {} posts classified", processed);

    stream_result.map_err(|e| {
        report_fatal(&e);
        anyhow::Error::from(e).context("stream adapter stopped")
    })
}

async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
        _ = cancel.cancelled() => return,
    }
    cancel.cancel();
}
