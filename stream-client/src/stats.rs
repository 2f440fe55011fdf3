use crate::message::MessageKind;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Adapter-side bookkeeping. Logged, not exported as metrics.
#[derive(Debug, Default)]
pub struct StreamStats {
    connection_attempts: AtomicU64,
    connections: AtomicU64,
    posts: AtomicU64,
    deletes: AtomicU64,
    limits: AtomicU64,
    stall_warnings: AtomicU64,
    disconnects: AtomicU64,
    other_messages: AtomicU64,
    decode_errors: AtomicU64,
    limit_track: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStatsSnapshot {
    pub connection_attempts: u64,
    pub connections: u64,
    pub posts: u64,
    pub deletes: u64,
    pub limits: u64,
    pub stall_warnings: u64,
    pub disconnects: u64,
    pub other_messages: u64,
    pub decode_errors: u64,
    /// Latest undelivered-match count reported by a limit notice.
    pub limit_track: u64,
}

impl StreamStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connection_attempt(&self) {
        self.connection_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connected(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message(&self, kind: MessageKind) {
        let counter = match kind {
            MessageKind::Post => &self.posts,
            MessageKind::Delete => &self.deletes,
            MessageKind::Limit => &self.limits,
            MessageKind::StallWarning => &self.stall_warnings,
            MessageKind::Disconnect => &self.disconnects,
            MessageKind::StatusWithheld
            | MessageKind::UserWithheld
            | MessageKind::ScrubGeo
            | MessageKind::Other => &self.other_messages,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_limit_track(&self, track: u64) {
        self.limit_track.store(track, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StreamStatsSnapshot {
        StreamStatsSnapshot {
            connection_attempts: self.connection_attempts.load(Ordering::Relaxed),
            connections: self.connections.load(Ordering::Relaxed),
            posts: self.posts.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            limits: self.limits.load(Ordering::Relaxed),
            stall_warnings: self.stall_warnings.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
            other_messages: self.other_messages.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            limit_track: self.limit_track.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_collection() {
        let stats = StreamStats::new();

        stats.record_connection_attempt();
        stats.record_connected();
        stats.record_message(MessageKind::Post);
        stats.record_message(MessageKind::Post);
        stats.record_message(MessageKind::ScrubGeo);
        stats.record_message(MessageKind::Limit);
        stats.record_limit_track(42);
        stats.record_decode_error();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.connection_attempts, 1);
        assert_eq!(snapshot.connections, 1);
        assert_eq!(snapshot.posts, 2);
        assert_eq!(snapshot.other_messages, 1);
        assert_eq!(snapshot.limits, 1);
        assert_eq!(snapshot.limit_track, 42);
        assert_eq!(snapshot.decode_errors, 1);
    }

    #[test]
    fn test_snapshot_export() {
        let stats = StreamStats::new();
        stats.record_message(MessageKind::StallWarning);

        let exported = serde_json::to_string(&stats.snapshot()).unwrap();
        assert!(exported.contains("\"stall_warnings\":1"));
    }
}
