use exporter_core::{KeywordSet, Post};
use stream_metrics::{render, CounterRegistry, MatchSource, PostClassifier, Series};
use std::sync::Arc;

fn setup(keywords: &[&str]) -> (PostClassifier, Arc<CounterRegistry>) {
    let registry = Arc::new(CounterRegistry::new());
    let classifier = PostClassifier::new(
        Arc::new(KeywordSet::new(keywords.iter().copied())),
        Arc::clone(&registry),
    );
    (classifier, registry)
}

fn snapshot_lines(registry: &CounterRegistry) -> Vec<String> {
    registry
        .snapshot()
        .iter()
        .map(|sample| {
            let labels: Vec<String> = sample
                .labels()
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect();
            format!("{}{{{}}} {}", sample.name(), labels.join(","), sample.value)
        })
        .collect()
}

#[test]
fn test_three_post_scenario() {
    let (classifier, registry) = setup(&["widgetfrobber", "dodgycorp"]);

    let posts = vec![
        Post::new("love my widgetfrobber"),
        Post::reshare_of(
            Post::new("check out #DodgyCorp").with_hashtags(["DodgyCorp"]),
            "RT @someone: check out #DodgyCorp",
        ),
        Post::new("no match here").with_mentions(["dodgycorp"]),
    ];

    for post in &posts {
        classifier.classify(post);
    }

    assert_eq!(
        snapshot_lines(&registry),
        vec![
            "twitter_stream_tweets_total{retweet=false} 2",
            "twitter_stream_tweets_total{retweet=true} 1",
            "twitter_stream_hashtag_mentions_total{keyword=dodgycorp,retweet=true} 1",
            "twitter_stream_user_mentions_total{keyword=dodgycorp,retweet=false} 1",
            "twitter_stream_word_mentions_total{keyword=widgetfrobber,retweet=false} 1",
        ]
    );
}

#[test]
fn test_decoded_reshare_matches_original_only() {
    let (classifier, registry) = setup(&["dodgycorp"]);
    let post: Post = serde_json::from_str(
        r##"{
            "text": "RT @dodgycorp: news",
            "entities": {
                "hashtags": [{"text": "dodgycorp"}],
                "user_mentions": [{"screen_name": "DodgyCorp", "name": "Dodgy Corp"}]
            },
            "retweeted_status": {
                "text": "news",
                "entities": {"hashtags": [], "user_mentions": []}
            }
        }"##,
    )
    .unwrap();

    let result = classifier.classify(&post);

    assert!(result.retweet);
    assert_eq!(result.total_matches(), 0);
    assert_eq!(registry.series_count(), 1);
    assert_eq!(registry.get(&Series::tweets(true)), Some(1));
}

#[test]
fn test_case_insensitive_hashtags() {
    let (classifier, registry) = setup(&["Widget"]);

    for tag in ["WIDGET", "widget", "WiDgEt"] {
        classifier.classify(&Post::new("").with_hashtags([tag]));
    }

    let widget = classifier.keywords().lookup("widget").cloned().unwrap();
    assert_eq!(
        registry.get(&Series::mentions(MatchSource::Hashtag, widget, false)),
        Some(3)
    );
}

#[test]
fn test_empty_keyword_set_counts_only_totals() {
    let (classifier, registry) = setup(&[]);

    classifier.classify(&Post::new("widget dodgycorp").with_hashtags(["widget"]));
    classifier.classify(&Post::reshare_of(
        Post::new("widget").with_mentions(["widget"]),
        "RT",
    ));

    assert_eq!(registry.series_count(), 2);
    assert_eq!(registry.get(&Series::tweets(false)), Some(1));
    assert_eq!(registry.get(&Series::tweets(true)), Some(1));

    let rendered = render(&registry, None).unwrap();
    assert!(!rendered.contains("keyword="));
}

#[test]
fn test_fixed_sequence_matches_hand_computed_counts() {
    let (classifier, registry) = setup(&["rust", "tokio"]);

    let posts = vec![
        Post::new("rust rust RUST"),
        Post::new("tokio, rust").with_hashtags(["Tokio", "async"]),
        Post::reshare_of(Post::new("learning rust").with_mentions(["tokio"]), "RT rust"),
        Post::new("nothing"),
    ];

    for post in &posts {
        classifier.classify(post);
    }

    assert_eq!(
        snapshot_lines(&registry),
        vec![
            "twitter_stream_tweets_total{retweet=false} 3",
            "twitter_stream_tweets_total{retweet=true} 1",
            "twitter_stream_hashtag_mentions_total{keyword=tokio,retweet=false} 1",
            "twitter_stream_user_mentions_total{keyword=tokio,retweet=true} 1",
            "twitter_stream_word_mentions_total{keyword=rust,retweet=false} 4",
            "twitter_stream_word_mentions_total{keyword=rust,retweet=true} 1",
        ]
    );
}

#[test]
fn test_mentions_match_on_handle_not_display_name() {
    let (classifier, registry) = setup(&["dodgycorp"]);

    let by_display_name: Post = serde_json::from_str(
        r#"{"text":"thanks @acme_support","entities":{"user_mentions":[
            {"screen_name":"acme_support","name":"dodgycorp"}]}}"#,
    )
    .unwrap();
    let by_handle: Post = serde_json::from_str(
        r#"{"text":"thanks @DodgyCorp","entities":{"user_mentions":[
            {"screen_name":"DodgyCorp","name":"Acme Support"}]}}"#,
    )
    .unwrap();

    assert_eq!(classifier.classify(&by_display_name).mention_matches, 0);
    assert_eq!(classifier.classify(&by_handle).mention_matches, 1);

    let keywords = KeywordSet::new(["dodgycorp"]);
    let dodgycorp = keywords.lookup("dodgycorp").cloned().unwrap();
    assert_eq!(
        registry.get(&Series::mentions(MatchSource::UserMention, dodgycorp, false)),
        Some(1)
    );
}

#[test]
fn test_hashtag_entity_counts_when_text_is_only_a_link() {
    let (classifier, registry) = setup(&["widget"]);

    let post = Post::new("https://t.co/xyz").with_hashtags(["Widget"]);
    let result = classifier.classify(&post);

    assert_eq!(result.hashtag_matches, 1);
    assert_eq!(result.word_matches, 0);
    assert_eq!(
        snapshot_lines(&registry),
        vec![
            "twitter_stream_tweets_total{retweet=false} 1",
            "twitter_stream_hashtag_mentions_total{keyword=widget,retweet=false} 1",
        ]
    );
}
