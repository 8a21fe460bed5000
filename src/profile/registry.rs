use std::collections::BTreeMap;

use serde::Serialize;

use super::aggregator::{default_aggregators, flatten_bucket, Aggregator};
use super::percentiles::PercentileSet;
use super::{MetricName, Sample};
use crate::session::SessionContext;

// ─── Public types ────────────────────────────────────────────────

/// Samples grouped by metric. Every metric has a bucket from construction.
#[derive(Debug, Clone)]
pub struct SampleTable {
    buckets: BTreeMap<MetricName, Vec<Sample>>,
}

/// Who sent a snapshot, and when.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub client_id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// One timestamped bundle of derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub metadata: Metadata,
    pub profile: BTreeMap<MetricName, f64>,
}

/// Owns every registered sample and turns them into snapshots.
///
/// Aggregation is cumulative: nothing is dropped between snapshots unless
/// `reset` is called.
pub struct Registry {
    table: SampleTable,
    aggregators: Vec<Aggregator>,
    session: SessionContext,
}

// ─── SampleTable impl ────────────────────────────────────────────

impl SampleTable {
    pub fn new() -> Self {
        Self {
            buckets: MetricName::ALL
                .into_iter()
                .map(|name| (name, Vec::new()))
                .collect(),
        }
    }

    /// Samples under `name`, in registration order.
    pub fn bucket(&self, name: MetricName) -> &[Sample] {
        self.buckets.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append to the sample's bucket. Duplicates are kept.
    pub fn push(&mut self, sample: Sample) {
        self.buckets.entry(sample.name()).or_default().push(sample);
    }

    pub fn sample_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Empty every registered sample, keeping bucket membership so a call
    /// site holding a handle keeps feeding the next window. Samples nothing
    /// else can reach are dropped.
    pub fn clear(&mut self) {
        for bucket in self.buckets.values_mut() {
            bucket.retain(Sample::is_shared);
            for sample in bucket.iter() {
                sample.clear_values();
            }
        }
    }
}

impl Default for SampleTable {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Registry impl ───────────────────────────────────────────────

impl Registry {
    pub fn new(session: SessionContext, aggregators: Vec<Aggregator>) -> Self {
        Self {
            table: SampleTable::new(),
            aggregators,
            session,
        }
    }

    pub fn with_default_aggregators(session: SessionContext) -> Self {
        Self::new(session, default_aggregators())
    }

    /// Add `sample` to its bucket. Registering the same sample twice counts
    /// its values twice.
    pub fn register(&mut self, sample: Sample) {
        tracing::debug!(
            metric = %sample.name(),
            bucket_len = self.table.bucket(sample.name()).len() + 1,
            "sample registered"
        );
        self.table.push(sample);
    }

    /// Every aggregator over the current table, in registration order.
    pub fn profile(&self) -> BTreeMap<MetricName, f64> {
        self.aggregators
            .iter()
            .map(|agg| (agg.name, agg.apply(&self.table)))
            .collect()
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            client_id: self.session.session_id().to_owned(),
            timestamp: self.session.timestamp(),
        }
    }

    /// Read-only pass over everything registered since start (or last reset).
    pub fn snapshot(&self) -> Snapshot {
        let profile = self.profile();
        tracing::debug!(
            samples = self.table.sample_count(),
            metrics = profile.len(),
            "snapshot computed"
        );
        Snapshot {
            metadata: self.metadata(),
            profile,
        }
    }

    /// Start a fresh window: recorded values are discarded, held samples
    /// stay registered.
    pub fn reset(&mut self) {
        self.table.clear();
    }

    /// Percentile breakdown of one bucket's raw values.
    pub fn distribution(&self, name: MetricName) -> PercentileSet {
        PercentileSet::from_values(&flatten_bucket(&self.table, name))
    }

    pub fn table(&self) -> &SampleTable {
        &self.table
    }

    pub fn aggregators(&self) -> &[Aggregator] {
        &self.aggregators
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::session::{ManualClock, SharedClock};

    fn registry() -> (Arc<ManualClock>, Registry) {
        let clock = Arc::new(ManualClock::new(0.0, 1_700_000_000_000));
        let shared: SharedClock = clock.clone();
        let session = SessionContext::with_clock("test-session", shared);
        (clock, Registry::with_default_aggregators(session))
    }

    fn sample(name: MetricName, values: &[f64]) -> Sample {
        let sample = Sample::new(name);
        for v in values {
            sample.record(*v);
        }
        sample
    }

    #[test]
    fn every_bucket_exists_up_front() {
        let table = SampleTable::new();
        for name in MetricName::ALL {
            assert!(table.bucket(name).is_empty());
        }
    }

    #[test]
    fn snapshot_carries_session_and_all_formulas() {
        let (_clock, mut reg) = registry();
        reg.register(sample(MetricName::Fps, &[10.0, 10.0]));
        reg.register(sample(MetricName::Extent, &[4.0]));

        let snap = reg.snapshot();
        assert_eq!(snap.metadata.client_id, "test-session");
        assert_eq!(snap.metadata.timestamp, 1_700_000_000_000);
        assert_eq!(snap.profile.len(), 4);
        assert_eq!(snap.profile[&MetricName::Fps], 100.0);
        assert_eq!(snap.profile[&MetricName::Extent], 4.0);
        assert_eq!(snap.profile[&MetricName::NetworkLatency], 0.0);
        assert!(!snap.profile.contains_key(&MetricName::BufferLoadTime));
    }

    #[test]
    fn values_recorded_after_registration_count() {
        let (_clock, mut reg) = registry();
        let latency = Sample::new(MetricName::NetworkLatency);
        reg.register(latency.clone());
        latency.record(30.0);
        assert_eq!(reg.snapshot().profile[&MetricName::NetworkLatency], 30.0);
    }

    #[test]
    fn snapshots_accumulate_until_reset() {
        let (_clock, mut reg) = registry();
        reg.register(sample(MetricName::NetworkLatency, &[10.0]));
        let first = reg.snapshot();
        reg.register(sample(MetricName::NetworkLatency, &[30.0]));
        let second = reg.snapshot();
        assert_eq!(first.profile[&MetricName::NetworkLatency], 10.0);
        assert_eq!(second.profile[&MetricName::NetworkLatency], 20.0);

        reg.reset();
        assert_eq!(reg.table().sample_count(), 0);
        assert_eq!(reg.snapshot().profile[&MetricName::NetworkLatency], 0.0);
    }

    #[test]
    fn reset_keeps_held_samples_registered() {
        let (_clock, mut reg) = registry();
        let frame = Sample::new(MetricName::Fps);
        reg.register(frame.clone());
        frame.record(20.0);
        reg.register(sample(MetricName::Fps, &[40.0]));
        assert_eq!(reg.table().sample_count(), 2);

        reg.reset();
        assert_eq!(reg.table().sample_count(), 1);
        assert!(reg.table().bucket(MetricName::Fps)[0].ptr_eq(&frame));
        assert!(frame.is_empty());

        frame.record(10.0);
        assert_eq!(reg.snapshot().profile[&MetricName::Fps], 100.0);
    }

    #[test]
    fn custom_aggregators_replace_defaults() {
        fn buffer_load_total(table: &SampleTable) -> f64 {
            crate::profile::aggregator::sum(&flatten_bucket(
                table,
                MetricName::BufferLoadTime,
            ))
        }
        let mut reg = Registry::new(
            SessionContext::with_seed(1),
            vec![Aggregator::new(MetricName::BufferLoadTime, buffer_load_total)],
        );
        reg.register(sample(MetricName::BufferLoadTime, &[1.5, 2.5]));
        let profile = reg.profile();
        assert_eq!(profile.len(), 1);
        assert_eq!(profile[&MetricName::BufferLoadTime], 4.0);
    }

    #[test]
    fn distribution_covers_unaggregated_bucket() {
        let (_clock, mut reg) = registry();
        reg.register(sample(MetricName::BufferLoadTime, &[5.0, 15.0, 25.0]));
        let dist = reg.distribution(MetricName::BufferLoadTime);
        assert_eq!(dist.count, 3);
        assert!(dist.has_data());
    }
}
