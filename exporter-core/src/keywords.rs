use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// A tracked keyword in its lowercase form.
///
/// Values can only be obtained from [`KeywordSet::lookup`], so anything
/// holding a `Keyword` holds one of the configured phrases and never raw
/// post content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Keyword(Arc<str>);

impl Keyword {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Keyword {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Immutable, case-insensitive set of tracked keywords.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    keywords: HashSet<Keyword>,
    // Configuration order, for logging and the upstream track parameter.
    ordered: Vec<Keyword>,
}

impl KeywordSet {
    /// Builds the set from configured phrases.
    ///
    /// Phrases are trimmed and lowercased; blank phrases are skipped and
    /// duplicates collapse to one entry.
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keywords = HashSet::new();
        let mut ordered = Vec::new();

        for phrase in phrases {
            let normalized = phrase.as_ref().trim().to_lowercase();
            if normalized.is_empty() {
                continue;
            }

            let keyword = Keyword(Arc::from(normalized));
            if keywords.insert(keyword.clone()) {
                ordered.push(keyword);
            }
        }

        Self { keywords, ordered }
    }

    /// Parses a comma-delimited list such as the `--twitter.track` flag.
    pub fn from_delimited(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.lookup(token).is_some()
    }

    /// Returns the stored keyword equal to the lowercase form of `token`.
    pub fn lookup(&self, token: &str) -> Option<&Keyword> {
        let lowered = token.to_lowercase();
        self.keywords.get(lowered.as_str())
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keyword> {
        self.ordered.iter()
    }

    /// Keywords joined with commas, in configuration order.
    pub fn to_track_param(&self) -> String {
        self.ordered
            .iter()
            .map(Keyword::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::borrow::Borrow<str> for Keyword {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_membership() {
        let keywords = KeywordSet::new(["Widget"]);

        assert!(keywords.contains("WIDGET"));
        assert!(keywords.contains("widget"));
        assert!(keywords.contains("WiDgEt"));
        assert_eq!(keywords.lookup("WIDGET").map(Keyword::as_str), Some("widget"));
    }

    #[test]
    fn test_exact_token_matching_only() {
        let keywords = KeywordSet::new(["widget"]);

        assert!(!keywords.contains("widgets"));
        assert!(!keywords.contains("widget!"));
        assert!(!keywords.contains("#widget"));
        assert!(!keywords.contains("my widget"));
        assert!(!keywords.contains(""));
    }

    #[test]
    fn test_delimited_parsing() {
        let keywords = KeywordSet::from_delimited("WidgetFrobber, dodgycorp,,widgetfrobber");

        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords.to_track_param(), "widgetfrobber,dodgycorp");
    }

    #[test]
    fn test_empty_set() {
        let keywords = KeywordSet::new(Vec::<String>::new());

        assert!(keywords.is_empty());
        assert!(!keywords.contains("anything"));
        assert_eq!(keywords.iter().count(), 0);
    }
}
