use serde::{Deserialize, Deserializer, Serialize};

/// A single post as delivered by the filter stream.
///
/// Only the fields needed for classification are decoded. Absent or `null`
/// text and entity lists decode to empty values so that classification never
/// fails on partial payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id_str: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default)]
    pub retweeted_status: Option<Box<Post>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entities: Entities,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default, deserialize_with = "null_as_default")]
    pub hashtags: Vec<HashtagEntity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_mentions: Vec<UserMentionEntity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HashtagEntity {
    /// Tag text without the leading `#`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMentionEntity {
    /// Handle without the leading `@`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub screen_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Post {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_hashtags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities.hashtags = tags
            .into_iter()
            .map(|text| HashtagEntity { text: text.into() })
            .collect();
        self
    }

    pub fn with_mentions<I, S>(mut self, handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities.user_mentions = handles
            .into_iter()
            .map(|handle| UserMentionEntity {
                screen_name: handle.into(),
                name: None,
            })
            .collect();
        self
    }

    /// Wraps `original` in a reshare post with its own text.
    pub fn reshare_of(original: Post, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            retweeted_status: Some(Box::new(original)),
            ..Default::default()
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
