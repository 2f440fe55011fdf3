//! Lock-free labeled counter registry

use dashmap::DashMap;
use exporter_core::Keyword;
use std::sync::atomic::{AtomicU64, Ordering};

pub const LABEL_KEYWORD: &str = "keyword";
pub const LABEL_RETWEET: &str = "retweet";

/// Where in a post a keyword occurrence was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchSource {
    Hashtag,
    UserMention,
    Word,
}

/// One counter family per classification axis, in exposition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricFamily {
    Tweets,
    HashtagMentions,
    UserMentions,
    WordMentions,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 4] = [
        MetricFamily::Tweets,
        MetricFamily::HashtagMentions,
        MetricFamily::UserMentions,
        MetricFamily::WordMentions,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MetricFamily::Tweets => "twitter_stream_tweets_total",
            MetricFamily::HashtagMentions => "twitter_stream_hashtag_mentions_total",
            MetricFamily::UserMentions => "twitter_stream_user_mentions_total",
            MetricFamily::WordMentions => "twitter_stream_word_mentions_total",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            MetricFamily::Tweets => "Total number of tweets delivered to the stream.",
            MetricFamily::HashtagMentions => "Total mentions of tracked keywords as hashtags.",
            MetricFamily::UserMentions => "Total mentions of tracked keywords as usernames.",
            MetricFamily::WordMentions => "Total mentions of tracked keywords as raw words.",
        }
    }

    pub fn label_names(&self) -> &'static [&'static str] {
        match self {
            MetricFamily::Tweets => &[LABEL_RETWEET],
            _ => &[LABEL_KEYWORD, LABEL_RETWEET],
        }
    }
}

impl From<MatchSource> for MetricFamily {
    fn from(source: MatchSource) -> Self {
        match source {
            MatchSource::Hashtag => MetricFamily::HashtagMentions,
            MatchSource::UserMention => MetricFamily::UserMentions,
            MatchSource::Word => MetricFamily::WordMentions,
        }
    }
}

/// A counter series: metric family plus its label values.
///
/// The `keyword` label can only carry a [`Keyword`], which keeps the number
/// of series bounded by the configured keyword count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Series {
    Tweets {
        retweet: bool,
    },
    Mentions {
        source: MatchSource,
        keyword: Keyword,
        retweet: bool,
    },
}

impl Series {
    pub fn tweets(retweet: bool) -> Self {
        Series::Tweets { retweet }
    }

    pub fn mentions(source: MatchSource, keyword: Keyword, retweet: bool) -> Self {
        Series::Mentions {
            source,
            keyword,
            retweet,
        }
    }

    pub fn family(&self) -> MetricFamily {
        match self {
            Series::Tweets { .. } => MetricFamily::Tweets,
            Series::Mentions { source, .. } => (*source).into(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.family().name()
    }

    /// Label pairs in the family's label order.
    pub fn labels(&self) -> Vec<(&'static str, &str)> {
        match self {
            Series::Tweets { retweet } => vec![(LABEL_RETWEET, bool_label(*retweet))],
            Series::Mentions {
                keyword, retweet, ..
            } => vec![
                (LABEL_KEYWORD, keyword.as_str()),
                (LABEL_RETWEET, bool_label(*retweet)),
            ],
        }
    }
}

fn bool_label(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Current value of one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub series: Series,
    pub value: u64,
}

impl Sample {
    pub fn name(&self) -> &'static str {
        self.series.name()
    }

    pub fn labels(&self) -> Vec<(&'static str, &str)> {
        self.series.labels()
    }
}

/// Monotonic counters keyed by series.
///
/// Series are created on first increment and never removed. Each value is an
/// independent atomic, so concurrent increments are never lost and readers
/// see a per-series consistent value without blocking writers.
#[derive(Debug, Default)]
pub struct CounterRegistry {
    counters: DashMap<Series, AtomicU64>,
}

impl CounterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one to `series`, creating it at zero first if needed.
    /// Returns the value after the increment.
    pub fn increment(&self, series: &Series) -> u64 {
        if let Some(counter) = self.counters.get(series) {
            return counter.fetch_add(1, Ordering::Relaxed) + 1;
        }

        self.counters
            .entry(series.clone())
            .or_default()
            .fetch_add(1, Ordering::Relaxed)
            + 1
    }

    pub fn get(&self, series: &Series) -> Option<u64> {
        self.counters
            .get(series)
            .map(|counter| counter.load(Ordering::Relaxed))
    }

    pub fn series_count(&self) -> usize {
        self.counters.len()
    }

    /// All series with their current values, ordered by family then labels.
    ///
    /// Values are read one series at a time; the result is not a single
    /// point-in-time view across series.
    pub fn snapshot(&self) -> Vec<Sample> {
        let mut samples: Vec<Sample> = self
            .counters
            .iter()
            .map(|entry| Sample {
                series: entry.key().clone(),
                value: entry.value().load(Ordering::Relaxed),
            })
            .collect();

        samples.sort_by(|a, b| a.series.cmp(&b.series));
        samples
    }
}
