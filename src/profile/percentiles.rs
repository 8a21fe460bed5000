use hdrhistogram::Histogram;
use serde::Serialize;

/// Values are kept at 1/1000 resolution inside the histogram.
const FIXED_POINT_SCALE: f64 = 1000.0;

/// Histogram range in fixed-point units: 0.001 → 3.6e9, 3 significant figures.
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 3_600_000_000_000;
const HIST_SIGFIG: u8 = 3;

/// Percentile breakdown of one bucket's raw values, in the bucket's own
/// unit (ms for timings, bytes for buffer sizes).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileSet {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub p999: f64,
    pub count: u64,
    /// Values left out of the histogram (negative or non-finite).
    pub skipped: u64,
}

impl PercentileSet {
    /// Build from raw values. Negative and non-finite values are counted in
    /// `skipped`; everything else is clamped into the histogram range.
    pub fn from_values(values: &[f64]) -> Self {
        let Ok(mut hist) =
            Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
        else {
            return Self::empty();
        };

        let mut skipped = 0;
        for &value in values {
            if !value.is_finite() || value < 0.0 {
                skipped += 1;
                continue;
            }
            let fixed = ((value * FIXED_POINT_SCALE).round() as u64)
                .clamp(HIST_LOW, HIST_HIGH);
            if hist.record(fixed).is_err() {
                skipped += 1;
            }
        }

        let mut set = Self::from_histogram(&hist);
        set.skipped = skipped;
        set
    }

    /// Zeroed values if the histogram is empty.
    pub fn from_histogram(hist: &Histogram<u64>) -> Self {
        if hist.len() == 0 {
            return Self::empty();
        }

        let unscale = |v: u64| v as f64 / FIXED_POINT_SCALE;
        Self {
            min: unscale(hist.min()),
            max: unscale(hist.max()),
            mean: hist.mean() / FIXED_POINT_SCALE,
            p50: unscale(hist.value_at_percentile(50.0)),
            p95: unscale(hist.value_at_percentile(95.0)),
            p99: unscale(hist.value_at_percentile(99.0)),
            p999: unscale(hist.value_at_percentile(99.9)),
            count: hist.len(),
            skipped: 0,
        }
    }

    pub fn empty() -> Self {
        Self {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            p50: 0.0,
            p95: 0.0,
            p99: 0.0,
            p999: 0.0,
            count: 0,
            skipped: 0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}
