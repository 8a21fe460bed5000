//! Metric formulas.
//!
//! Each formula reads the whole sample table, not only its own bucket, and
//! always yields a number: empty input degrades to 0 (average), `inf` (fps)
//! or NaN (extent) instead of failing.

use std::fmt;

use super::registry::SampleTable;
use super::MetricName;

/// A named, stateless reduction from the sample table to one value.
#[derive(Clone, Copy)]
pub struct Aggregator {
    pub name: MetricName,
    pub compute: fn(&SampleTable) -> f64,
}

impl Aggregator {
    pub const fn new(name: MetricName, compute: fn(&SampleTable) -> f64) -> Self {
        Self { name, compute }
    }

    pub fn apply(&self, table: &SampleTable) -> f64 {
        (self.compute)(table)
    }
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator").field("name", &self.name).finish()
    }
}

/// Built-in formulas, in the order snapshots evaluate them.
pub fn default_aggregators() -> Vec<Aggregator> {
    vec![
        Aggregator::new(MetricName::Bandwidth, bandwidth),
        Aggregator::new(MetricName::NetworkLatency, network_latency),
        Aggregator::new(MetricName::Fps, fps),
        Aggregator::new(MetricName::Extent, extent),
    ]
}

// ─── Reductions ──────────────────────────────────────────────────

pub fn sum(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc, v| acc + v)
}

/// Arithmetic mean; 0 for no data.
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    sum(values) / values.len() as f64
}

/// Every value of every sample in a bucket, in registration then
/// recording order.
pub fn flatten_bucket(table: &SampleTable, name: MetricName) -> Vec<f64> {
    let mut out = Vec::new();
    for sample in table.bucket(name) {
        sample.extend_into(&mut out);
    }
    out
}

fn bucket_average(table: &SampleTable, name: MetricName) -> f64 {
    average(&flatten_bucket(table, name))
}

// ─── Formulas ────────────────────────────────────────────────────

pub fn network_latency(table: &SampleTable) -> f64 {
    bucket_average(table, MetricName::NetworkLatency)
}

/// Mean buffer size over mean latency. Only meaningful when the two series
/// are recorded pairwise.
pub fn bandwidth(table: &SampleTable) -> f64 {
    bucket_average(table, MetricName::NetworkBufferSize)
        / bucket_average(table, MetricName::NetworkLatency)
}

/// Frames per second from mean inter-frame interval in ms.
pub fn fps(table: &SampleTable) -> f64 {
    1000.0 / bucket_average(table, MetricName::Fps)
}

/// Latest value of the first extent sample. Later extent samples are ignored.
pub fn extent(table: &SampleTable) -> f64 {
    table
        .bucket(MetricName::Extent)
        .first()
        .and_then(|sample| sample.last_value())
        .unwrap_or(f64::NAN)
}
