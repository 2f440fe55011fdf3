use exporter_core::Post;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Notice that a post was deleted upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteNotice {
    #[serde(default)]
    pub id_str: Option<String>,
}

/// Number of matching posts withheld since the connection opened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitNotice {
    #[serde(default)]
    pub track: u64,
}

/// Upstream warning that the client is falling behind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StallWarning {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub percent_full: u32,
}

/// Upstream is about to close the connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisconnectNotice {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub stream_name: Option<String>,
    #[serde(default)]
    pub reason: String,
}

/// One decoded line of the filter stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    Post(Box<Post>),
    Delete(DeleteNotice),
    Limit(LimitNotice),
    StallWarning(StallWarning),
    Disconnect(DisconnectNotice),
    StatusWithheld,
    UserWithheld,
    ScrubGeo,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Post,
    Delete,
    Limit,
    StallWarning,
    Disconnect,
    StatusWithheld,
    UserWithheld,
    ScrubGeo,
    Other,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Post => "post",
            MessageKind::Delete => "delete",
            MessageKind::Limit => "limit",
            MessageKind::StallWarning => "warning",
            MessageKind::Disconnect => "disconnect",
            MessageKind::StatusWithheld => "status_withheld",
            MessageKind::UserWithheld => "user_withheld",
            MessageKind::ScrubGeo => "scrub_geo",
            MessageKind::Other => "other",
        }
    }
}

impl StreamMessage {
    /// Decodes one non-blank stream line.
    ///
    /// Control messages are recognised by their top-level key; anything with
    /// post fields is a post. Unknown JSON objects decode as `Other`.
    pub fn decode(line: &str) -> Result<Self, serde_json::Error> {
        let mut value: Value = serde_json::from_str(line)?;

        let Some(object) = value.as_object_mut() else {
            return Ok(StreamMessage::Other);
        };

        if let Some(delete) = object.remove("delete") {
            let status = delete.get("status").cloned().unwrap_or(Value::Null);
            let notice = if status.is_null() {
                DeleteNotice::default()
            } else {
                serde_json::from_value(status)?
            };
            return Ok(StreamMessage::Delete(notice));
        }
        if object.contains_key("scrub_geo") {
            return Ok(StreamMessage::ScrubGeo);
        }
        if let Some(limit) = object.remove("limit") {
            return Ok(StreamMessage::Limit(serde_json::from_value(limit)?));
        }
        if object.contains_key("status_withheld") {
            return Ok(StreamMessage::StatusWithheld);
        }
        if object.contains_key("user_withheld") {
            return Ok(StreamMessage::UserWithheld);
        }
        if let Some(disconnect) = object.remove("disconnect") {
            return Ok(StreamMessage::Disconnect(serde_json::from_value(disconnect)?));
        }
        if let Some(warning) = object.remove("warning") {
            return Ok(StreamMessage::StallWarning(serde_json::from_value(warning)?));
        }

        if ["text", "id_str", "retweet_count"]
            .iter()
            .any(|key| object.contains_key(*key))
        {
            let post: Post = serde_json::from_value(value)?;
            return Ok(StreamMessage::Post(Box::new(post)));
        }

        Ok(StreamMessage::Other)
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            StreamMessage::Post(_) => MessageKind::Post,
            StreamMessage::Delete(_) => MessageKind::Delete,
            StreamMessage::Limit(_) => MessageKind::Limit,
            StreamMessage::StallWarning(_) => MessageKind::StallWarning,
            StreamMessage::Disconnect(_) => MessageKind::Disconnect,
            StreamMessage::StatusWithheld => MessageKind::StatusWithheld,
            StreamMessage::UserWithheld => MessageKind::UserWithheld,
            StreamMessage::ScrubGeo => MessageKind::ScrubGeo,
            StreamMessage::Other => MessageKind::Other,
        }
    }
}
