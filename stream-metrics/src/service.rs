use crate::classifier::PostClassifier;
use exporter_core::Post;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Creates the bounded channel between the stream adapter and the
/// classification task.
pub fn post_channel(capacity: usize) -> (mpsc::Sender<Post>, mpsc::Receiver<Post>) {
    mpsc::channel(capacity)
}

/// Drains decoded posts and classifies them one at a time, in delivery order.
pub struct ClassificationService {
    classifier: PostClassifier,
    receiver: mpsc::Receiver<Post>,
}

impl ClassificationService {
    pub fn new(classifier: PostClassifier, receiver: mpsc::Receiver<Post>) -> Self {
        Self {
            classifier,
            receiver,
        }
    }

    /// Runs until every sender is dropped. Returns the number of posts
    /// classified.
    pub async fn run(mut self) -> u64 {
        info!(
            "Classification service started with {} tracked keywords",
            self.classifier.keywords().len()
        );

        let mut processed = 0u64;
        while let Some(post) = self.receiver.recv().await {
            let classification = self.classifier.classify(&post);
            processed += 1;

            debug!(
                post_id = post.id_str.as_deref().unwrap_or("-"),
                retweet = classification.retweet,
                hashtags = classification.hashtag_matches,
                mentions = classification.mention_matches,
                words = classification.word_matches,
                "Classified post"
            );
        }

        info!(
            "Classification service stopped after {} posts ({} series)",
            processed,
            self.classifier.registry().series_count()
        );
        processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CounterRegistry, Series};
    use exporter_core::KeywordSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_service_drains_channel_until_closed() {
        let registry = Arc::new(CounterRegistry::new());
        let classifier = PostClassifier::new(
            Arc::new(KeywordSet::new(["widget"])),
            Arc::clone(&registry),
        );
        let (tx, rx) = post_channel(4);
        let service = tokio::spawn(ClassificationService::new(classifier, rx).run());

        tx.send(Post::new("widget")).await.unwrap();
        tx.send(Post::reshare_of(Post::new("widget"), "RT")).await.unwrap();
        tx.send(Post::new("other")).await.unwrap();
        drop(tx);

        let processed = service.await.unwrap();
        assert_eq!(processed, 3);
        assert_eq!(registry.get(&Series::tweets(false)), Some(2));
        assert_eq!(registry.get(&Series::tweets(true)), Some(1));
    }
}
