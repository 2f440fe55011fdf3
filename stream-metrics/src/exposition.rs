//! Prometheus text exposition (format version 0.0.4)

use crate::registry::{CounterRegistry, MetricFamily, Sample};
use prometheus::{proto, Encoder, TextEncoder};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const BUILD_INFO_NAME: &str = "twitter_stream_exporter_build_info";
const BUILD_INFO_HELP: &str = "twitter_stream exporter build info.";

/// Build metadata exported as a constant gauge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub commit_sha: String,
    pub build_date: String,
    pub rust_version: String,
}

impl BuildInfo {
    /// Uses `version` plus the `STREAM_EXPORTER_*` values recorded by the
    /// build script. Undetectable values read `UNKNOWN`.
    pub fn from_build_env(version: &str) -> Self {
        Self {
            version: version.to_string(),
            commit_sha: env!("STREAM_EXPORTER_COMMIT_SHA").to_string(),
            build_date: env!("STREAM_EXPORTER_BUILD_DATE").to_string(),
            rust_version: env!("STREAM_EXPORTER_RUST_VERSION").to_string(),
        }
    }
}

/// Renders every counter family that has at least one series, followed by
/// the build info gauge when given.
pub fn render(
    registry: &CounterRegistry,
    build_info: Option<&BuildInfo>,
) -> Result<String, prometheus::Error> {
    let samples = registry.snapshot();
    let mut families = Vec::new();

    for family in MetricFamily::ALL {
        let metrics: Vec<proto::Metric> = samples
            .iter()
            .filter(|sample| sample.series.family() == family)
            .map(counter_metric)
            .collect();

        if metrics.is_empty() {
            continue;
        }

        families.push(metric_family(
            family.name(),
            family.help(),
            proto::MetricType::COUNTER,
            metrics,
        ));
    }

    if let Some(info) = build_info {
        let labels = [
            ("build_date", info.build_date.as_str()),
            ("commit_sha", info.commit_sha.as_str()),
            ("rust_version", info.rust_version.as_str()),
            ("version", info.version.as_str()),
        ];
        let mut gauge = proto::Gauge::default();
        gauge.set_value(1.0);
        let mut metric = proto::Metric::default();
        metric.set_label(label_pairs(&labels).into());
        metric.set_gauge(gauge);

        families.push(metric_family(
            BUILD_INFO_NAME,
            BUILD_INFO_HELP,
            proto::MetricType::GAUGE,
            vec![metric],
        ));
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

fn metric_family(
    name: &str,
    help: &str,
    kind: proto::MetricType,
    metrics: Vec<proto::Metric>,
) -> proto::MetricFamily {
    let mut family = proto::MetricFamily::default();
    family.set_name(name.to_string());
    family.set_help(help.to_string());
    family.set_field_type(kind);
    family.set_metric(metrics.into());
    family
}

fn counter_metric(sample: &Sample) -> proto::Metric {
    let mut counter = proto::Counter::default();
    counter.set_value(sample.value as f64);

    let mut metric = proto::Metric::default();
    metric.set_label(label_pairs(&sample.labels()).into());
    metric.set_counter(counter);
    metric
}

fn label_pairs(labels: &[(&str, &str)]) -> Vec<proto::LabelPair> {
    labels
        .iter()
        .map(|(name, value)| {
            let mut pair = proto::LabelPair::default();
            pair.set_name(name.to_string());
            pair.set_value(value.to_string());
            pair
        })
        .collect()
}
