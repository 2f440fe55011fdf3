use crate::registry::{CounterRegistry, MatchSource, Series};
use exporter_core::{KeywordSet, Post};
use std::sync::Arc;

/// Outcome of classifying one post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub retweet: bool,
    pub hashtag_matches: u32,
    pub mention_matches: u32,
    pub word_matches: u32,
}

impl Classification {
    pub fn total_matches(&self) -> u32 {
        self.hashtag_matches + self.mention_matches + self.word_matches
    }
}

/// Turns posts into counter increments.
///
/// A reshare is counted as a reshare, but keywords are always looked up on
/// the original post it wraps, since that is where the hashtags, mentions and
/// text live.
#[derive(Debug, Clone)]
pub struct PostClassifier {
    keywords: Arc<KeywordSet>,
    registry: Arc<CounterRegistry>,
}

impl PostClassifier {
    pub fn new(keywords: Arc<KeywordSet>, registry: Arc<CounterRegistry>) -> Self {
        Self { keywords, registry }
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    pub fn registry(&self) -> &Arc<CounterRegistry> {
        &self.registry
    }

    pub fn classify(&self, post: &Post) -> Classification {
        let (retweet, subject) = match post.retweeted_status.as_deref() {
            Some(original) => (true, original),
            None => (false, post),
        };

        self.registry.increment(&Series::tweets(retweet));

        let mut classification = Classification {
            retweet,
            ..Default::default()
        };

        for hashtag in &subject.entities.hashtags {
            if self.record(MatchSource::Hashtag, &hashtag.text, retweet) {
                classification.hashtag_matches += 1;
            }
        }

        for mention in &subject.entities.user_mentions {
            if self.record(MatchSource::UserMention, &mention.screen_name, retweet) {
                classification.mention_matches += 1;
            }
        }

        // Plain whitespace split: punctuation stays attached to the word.
        let text = subject.text.to_lowercase();
        for word in text.split_whitespace() {
            if self.record(MatchSource::Word, word, retweet) {
                classification.word_matches += 1;
            }
        }

        classification
    }

    fn record(&self, source: MatchSource, token: &str, retweet: bool) -> bool {
        match self.keywords.lookup(token) {
            Some(keyword) => {
                self.registry
                    .increment(&Series::mentions(source, keyword.clone(), retweet));
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(keywords: &[&str]) -> PostClassifier {
        PostClassifier::new(
            Arc::new(KeywordSet::new(keywords.iter().copied())),
            Arc::new(CounterRegistry::new()),
        )
    }

    fn mentions(
        classifier: &PostClassifier,
        source: MatchSource,
        word: &str,
        retweet: bool,
    ) -> Option<u64> {
        let keyword = classifier.keywords().lookup(word)?.clone();
        classifier
            .registry()
            .get(&Series::mentions(source, keyword, retweet))
    }

    #[test]
    fn test_unmatched_post_counts_only_total() {
        let classifier = classifier(&["widget"]);
        let post = Post::new("nothing to see")
            .with_hashtags(["other"])
            .with_mentions(["someone"]);

        let result = classifier.classify(&post);

        assert_eq!(result.total_matches(), 0);
        assert!(!result.retweet);
        assert_eq!(classifier.registry().get(&Series::tweets(false)), Some(1));
        assert_eq!(classifier.registry().series_count(), 1);
    }

    #[test]
    fn test_reshare_uses_original_content() {
        let classifier = classifier(&["widget"]);
        let original = Post::new("plain text").with_hashtags(["Widget"]);
        let post = Post::reshare_of(original, "RT widget widget").with_mentions(["widget"]);

        let result = classifier.classify(&post);

        assert!(result.retweet);
        assert_eq!(result.hashtag_matches, 1);
        assert_eq!(result.mention_matches, 0);
        assert_eq!(result.word_matches, 0);
        assert_eq!(classifier.registry().get(&Series::tweets(true)), Some(1));
        assert_eq!(classifier.registry().get(&Series::tweets(false)), None);
        assert_eq!(mentions(&classifier, MatchSource::Hashtag, "widget", true), Some(1));
    }

    #[test]
    fn test_repeated_words_count_each_occurrence() {
        let classifier = classifier(&["widget"]);
        let post = Post::new("Widget\twidget\nWIDGET widgets widget!");

        let result = classifier.classify(&post);

        assert_eq!(result.word_matches, 3);
        assert_eq!(mentions(&classifier, MatchSource::Word, "widget", false), Some(3));
    }

    #[test]
    fn test_sources_do_not_cross() {
        let classifier = classifier(&["widget", "frobber"]);
        let post = Post::new("frobber").with_hashtags(["widget"]);

        classifier.classify(&post);

        assert_eq!(mentions(&classifier, MatchSource::Hashtag, "widget", false), Some(1));
        assert_eq!(mentions(&classifier, MatchSource::Word, "widget", false), None);
        assert_eq!(mentions(&classifier, MatchSource::Word, "frobber", false), Some(1));
        assert_eq!(mentions(&classifier, MatchSource::Hashtag, "frobber", false), None);
    }

    #[test]
    fn test_connector_and_punctuation_limits() {
        let classifier = classifier(&["widget"]);
        let post = Post::new("#widget @widget widget_frobber (widget) widget,");

        let result = classifier.classify(&post);

        assert_eq!(result.word_matches, 0);
        assert_eq!(classifier.registry().series_count(), 1);
    }
}
