pub mod aggregator;
pub mod percentiles;
pub mod registry;
pub mod sample;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use aggregator::{default_aggregators, Aggregator};
pub use percentiles::PercentileSet;
pub use registry::{Metadata, Registry, SampleTable, Snapshot};
pub use sample::Sample;

/// The closed set of metrics a sample can belong to.
/// Doubles as bucket key and as an aggregator's output key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum MetricName {
    Bandwidth,
    NetworkLatency,
    Fps,
    BufferLoadTime,
    NetworkBufferSize,
    Extent,
}

impl MetricName {
    pub const ALL: [MetricName; 6] = [
        MetricName::Bandwidth,
        MetricName::NetworkLatency,
        MetricName::Fps,
        MetricName::BufferLoadTime,
        MetricName::NetworkBufferSize,
        MetricName::Extent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricName::Bandwidth => "bandwidth",
            MetricName::NetworkLatency => "networkLatency",
            MetricName::Fps => "fps",
            MetricName::BufferLoadTime => "bufferLoadTime",
            MetricName::NetworkBufferSize => "networkBufferSize",
            MetricName::Extent => "extent",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric name \"{0}\"")]
pub struct ParseMetricNameError(pub String);

impl FromStr for MetricName {
    type Err = ParseMetricNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricName::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ParseMetricNameError(s.to_owned()))
    }
}
