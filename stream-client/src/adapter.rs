use crate::api::StreamClient;
use crate::auth::Authenticator;
use crate::decoder::LineDecoder;
use crate::message::StreamMessage;
use crate::retry::ReconnectBackoff;
use crate::stats::StreamStats;
use exporter_core::{
    CoreError, ErrorExt, ErrorRecovery, Post, RecoveryStrategy, StreamApiError,
};
use futures::{Stream, StreamExt};
use reqwest::Response;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Why forwarding stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    Cancelled,
    ReceiverClosed,
}

/// Owns the upstream connection and feeds decoded posts into the
/// classification channel, reconnecting until cancelled or a
/// non-retryable error occurs.
pub struct StreamAdapter {
    client: StreamClient,
    authenticator: Authenticator,
    backoff: ReconnectBackoff,
    sender: mpsc::Sender<Post>,
    cancel: CancellationToken,
    stats: Arc<StreamStats>,
}

impl StreamAdapter {
    pub fn new(
        client: StreamClient,
        authenticator: Authenticator,
        sender: mpsc::Sender<Post>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            authenticator,
            backoff: ReconnectBackoff::default(),
            sender,
            cancel,
            stats: Arc::new(StreamStats::new()),
        }
    }

    pub fn with_backoff(mut self, backoff: ReconnectBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn stats(&self) -> Arc<StreamStats> {
        Arc::clone(&self.stats)
    }

    pub async fn run(mut self) -> Result<(), CoreError> {
        info!("Stream adapter started");

        loop {
            if self.cancel.is_cancelled() {
                info!("Stream adapter cancelled");
                return Ok(());
            }

            let err = match self.connect_and_forward().await {
                Ok(ForwardOutcome::Cancelled) => {
                    info!("Stream adapter cancelled");
                    return Ok(());
                }
                Ok(ForwardOutcome::ReceiverClosed) => {
                    info!("Post channel closed, stopping stream adapter");
                    return Ok(());
                }
                Err(err) => err,
            };

            let kind = match ErrorRecovery::determine_strategy(&err) {
                RecoveryStrategy::Fail => {
                    err.log_error();
                    error!(
                        "Stream connection failed permanently: {}",
                        err.user_friendly_message()
                    );
                    return Err(err);
                }
                RecoveryStrategy::Reconnect(kind) => kind,
            };

            let delay = self.backoff.next_delay(kind);
            err.log_warn();
            warn!(
                "Reconnecting in {:?} (attempt {}), stream stats: {:?}",
                delay,
                self.backoff.attempts(),
                self.stats.snapshot()
            );

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Stream adapter cancelled while waiting to reconnect");
                    return Ok(());
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn connect_and_forward(&mut self) -> Result<ForwardOutcome, CoreError> {
        self.stats.record_connection_attempt();

        let response = match self.open_stream().await? {
            Some(response) => response,
            None => return Ok(ForwardOutcome::Cancelled),
        };

        self.backoff.reset();
        self.stats.record_connected();
        info!("Connected to filter stream");

        forward_messages(
            response.bytes_stream(),
            &self.sender,
            &self.cancel,
            &self.stats,
            self.client.config().stall_timeout,
        )
        .await
    }

    /// Authorizes and sends the filter request. A rejected exchanged token
    /// is refreshed and the request retried once. `None` means cancelled.
    async fn open_stream(&mut self) -> Result<Option<Response>, CoreError> {
        let stream_url = self.client.config().stream_url.clone();
        let mut refreshed = false;

        loop {
            let params = self.client.form_params();
            let authorization = tokio::select! {
                _ = self.cancel.cancelled() => return Ok(None),
                result = self.authenticator.authorization("POST", &stream_url, &params) => result?,
            };

            let connected = tokio::select! {
                _ = self.cancel.cancelled() => return Ok(None),
                result = self.client.connect(&authorization) => result,
            };

            match connected {
                Ok(response) => return Ok(Some(response)),
                Err(CoreError::StreamApi(StreamApiError::InvalidToken))
                    if !refreshed && self.authenticator.invalidate() =>
                {
                    warn!("Bearer token rejected, requesting a new one");
                    refreshed = true;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Reads a chunked body line by line and forwards posts to `sender`.
///
/// Returns an error when the body ends, stalls for longer than
/// `stall_timeout`, fails, delivers a disconnect notice, or sends a line
/// longer than the decoder accepts.
pub async fn forward_messages<S, B, E>(
    body: S,
    sender: &mpsc::Sender<Post>,
    cancel: &CancellationToken,
    stats: &StreamStats,
    stall_timeout: Duration,
) -> Result<ForwardOutcome, CoreError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<CoreError>,
{
    tokio::pin!(body);
    let mut decoder = LineDecoder::new();

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return Ok(ForwardOutcome::Cancelled),
            next = tokio::time::timeout(stall_timeout, body.next()) => next,
        };

        let chunk = match next {
            Err(_) => {
                return Err(StreamApiError::Stalled {
                    seconds: stall_timeout.as_secs(),
                }
                .into())
            }
            Ok(None) => {
                if let Some(line) = decoder.finish() {
                    if let Some(outcome) = dispatch_line(&line, sender, cancel, stats).await? {
                        return Ok(outcome);
                    }
                }
                return Err(StreamApiError::StreamClosed.into());
            }
            Ok(Some(Err(error))) => return Err(error.into()),
            Ok(Some(Ok(chunk))) => chunk,
        };

        for line in decoder.push(chunk.as_ref())? {
            if let Some(outcome) = dispatch_line(&line, sender, cancel, stats).await? {
                return Ok(outcome);
            }
        }
    }
}

async fn dispatch_line(
    line: &str,
    sender: &mpsc::Sender<Post>,
    cancel: &CancellationToken,
    stats: &StreamStats,
) -> Result<Option<ForwardOutcome>, CoreError> {
    let message = match StreamMessage::decode(line) {
        Ok(message) => message,
        Err(e) => {
            stats.record_decode_error();
            warn!("Skipping undecodable stream line: {}", e);
            return Ok(None);
        }
    };
    stats.record_message(message.kind());

    match message {
        StreamMessage::Post(post) => {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(Some(ForwardOutcome::Cancelled)),
                sent = sender.send(*post) => {
                    if sent.is_err() {
                        return Ok(Some(ForwardOutcome::ReceiverClosed));
                    }
                }
            }
        }
        StreamMessage::Limit(notice) => {
            stats.record_limit_track(notice.track);
            warn!("Upstream withheld {} matching posts so far", notice.track);
        }
        StreamMessage::StallWarning(warning) => {
            warn!(
                "Stall warning {} ({}% full): {}",
                warning.code, warning.percent_full, warning.message
            );
        }
        StreamMessage::Disconnect(notice) => {
            return Err(StreamApiError::Disconnected {
                code: notice.code,
                reason: notice.reason,
            }
            .into());
        }
        StreamMessage::Delete(notice) => {
            debug!("Delete notice for {:?}", notice.id_str);
        }
        other => {
            debug!("Ignoring {} message", other.kind().as_str());
        }
    }

    Ok(None)
}
