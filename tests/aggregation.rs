use std::sync::Arc;

use client_profiler::profile::aggregator::{average, sum};
use client_profiler::session::SharedClock;
use client_profiler::{ManualClock, MetricName, Registry, Sample, SessionContext};

fn registry_on(clock: &Arc<ManualClock>) -> Registry {
    let shared: SharedClock = clock.clone();
    Registry::with_default_aggregators(SessionContext::with_clock("it-session", shared))
}

fn recorded(name: MetricName, values: &[f64]) -> Sample {
    let sample = Sample::new(name);
    for v in values {
        sample.record(*v);
    }
    sample
}

#[test]
fn average_agrees_with_sum() {
    let cases: [&[f64]; 4] = [
        &[1.0],
        &[0.5, 0.25, 0.125],
        &[-40.0, 40.0, 1e-9, 7.75],
        &[16.6, 16.7, 16.8, 33.3, 15.9, 17.0],
    ];
    for values in cases {
        let expected = sum(values);
        let got = average(values) * values.len() as f64;
        assert!((got - expected).abs() < 1e-9, "{values:?}");
    }
    assert_eq!(average(&[]), 0.0);
}

#[test]
fn fps_from_frame_intervals() {
    let clock = Arc::new(ManualClock::new(0.0, 0));
    let mut reg = registry_on(&clock);
    reg.register(recorded(MetricName::Fps, &[10.0, 10.0]));
    assert_eq!(reg.snapshot().profile[&MetricName::Fps], 100.0);
}

#[test]
fn bandwidth_from_buffer_size_and_latency() {
    let clock = Arc::new(ManualClock::new(0.0, 0));
    let mut reg = registry_on(&clock);
    reg.register(recorded(MetricName::NetworkLatency, &[50.0, 150.0]));
    reg.register(recorded(MetricName::NetworkBufferSize, &[1000.0, 3000.0]));

    let profile = reg.snapshot().profile;
    assert_eq!(profile[&MetricName::Bandwidth], 20.0);
    assert_eq!(profile[&MetricName::NetworkLatency], 100.0);
}

#[test]
fn extent_ignores_later_samples() {
    let clock = Arc::new(ManualClock::new(0.0, 0));
    let mut reg = registry_on(&clock);
    reg.register(recorded(MetricName::Extent, &[1.0, 2.0, 3.0]));
    reg.register(recorded(MetricName::Extent, &[9.0]));
    reg.register(recorded(MetricName::Extent, &[10.0, 11.0]));
    assert_eq!(reg.snapshot().profile[&MetricName::Extent], 3.0);
}

#[test]
fn repeated_snapshots_differ_only_in_timestamp() {
    let clock = Arc::new(ManualClock::new(0.0, 1_700_000_000_000));
    let mut reg = registry_on(&clock);
    reg.register(recorded(MetricName::NetworkLatency, &[12.0, 18.0]));
    reg.register(recorded(MetricName::Fps, &[16.0]));
    reg.register(recorded(MetricName::Extent, &[5.0]));

    let first = reg.snapshot();
    clock.advance(1.0);
    let second = reg.snapshot();

    assert_eq!(first.profile, second.profile);
    assert_eq!(first.metadata.client_id, second.metadata.client_id);
    assert_ne!(first.metadata.timestamp, second.metadata.timestamp);
}

#[test]
fn double_registration_double_counts() {
    let clock = Arc::new(ManualClock::new(0.0, 0));
    let mut reg = registry_on(&clock);
    let latency = recorded(MetricName::NetworkLatency, &[10.0, 30.0]);
    reg.register(latency.clone());
    reg.register(latency.clone());
    reg.register(recorded(MetricName::NetworkLatency, &[100.0]));

    let flat = client_profiler::profile::aggregator::flatten_bucket(
        reg.table(),
        MetricName::NetworkLatency,
    );
    assert_eq!(flat, vec![10.0, 30.0, 10.0, 30.0, 100.0]);
    assert_eq!(sum(&flat), 180.0);
    assert_eq!(reg.snapshot().profile[&MetricName::NetworkLatency], 36.0);
}

#[test]
fn immediate_elapsed_is_near_zero() {
    let sample = Sample::new(MetricName::BufferLoadTime);
    sample.mark_start();
    let elapsed = sample.record_elapsed(true);
    assert!(elapsed >= 0.0);
    assert!(elapsed < 50.0);

    let clock = Arc::new(ManualClock::new(250.0, 0));
    let shared: SharedClock = clock.clone();
    let exact = Sample::with_clock(MetricName::BufferLoadTime, shared);
    exact.mark_start();
    assert_eq!(exact.record_elapsed(true), 0.0);
}

#[test]
fn empty_registry_never_fails() {
    let clock = Arc::new(ManualClock::new(0.0, 0));
    let reg = registry_on(&clock);
    let profile = reg.snapshot().profile;
    assert_eq!(profile[&MetricName::NetworkLatency], 0.0);
    assert_eq!(profile[&MetricName::Fps], f64::INFINITY);
    assert!(profile[&MetricName::Bandwidth].is_nan());
    assert!(profile[&MetricName::Extent].is_nan());
}
