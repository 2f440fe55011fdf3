pub mod classifier;
pub mod exposition;
pub mod registry;
pub mod service;

pub use classifier::{Classification, PostClassifier};
pub use exposition::{render, BuildInfo, CONTENT_TYPE};
pub use registry::{CounterRegistry, MatchSource, MetricFamily, Sample, Series};
pub use service::{post_channel, ClassificationService};
