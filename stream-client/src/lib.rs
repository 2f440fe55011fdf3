pub mod adapter;
pub mod api;
pub mod auth;
pub mod decoder;
pub mod message;
pub mod oauth1;
pub mod retry;
pub mod stats;


pub use adapter::{forward_messages, ForwardOutcome, StreamAdapter};
pub use api::{StreamClient, StreamClientConfig};
pub use auth::Authenticator;
pub use decoder::LineDecoder;
pub use message::{
    DeleteNotice, DisconnectNotice, LimitNotice, MessageKind, StallWarning, StreamMessage,
};
pub use oauth1::OAuth1Signer;
pub use retry::{ReconnectBackoff, ReconnectConfig};
pub use stats::{StreamStats, StreamStatsSnapshot};
