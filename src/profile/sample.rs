use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::MetricName;
use crate::session::{system_clock, SharedClock};

/// One named measurement series.
///
/// `Sample` is a handle: clones share the same window and values, so a call
/// site can register a sample and keep recording into it afterwards.
#[derive(Clone)]
pub struct Sample {
    name: MetricName,
    clock: SharedClock,
    state: Arc<Mutex<SampleState>>,
}

#[derive(Debug, Default)]
struct SampleState {
    start: f64,
    end: f64,
    started: bool,
    values: Vec<f64>,
}

impl Sample {
    pub fn new(name: MetricName) -> Self {
        Self::with_clock(name, system_clock())
    }

    pub fn with_clock(name: MetricName, clock: SharedClock) -> Self {
        Self {
            name,
            clock,
            state: Arc::new(Mutex::new(SampleState::default())),
        }
    }

    pub fn name(&self) -> MetricName {
        self.name
    }

    /// Overwrites any earlier start mark.
    pub fn mark_start(&self) {
        let now = self.clock.monotonic_ms();
        let mut state = self.state.lock();
        state.start = now;
        state.started = true;
    }

    /// Overwrites any earlier end mark.
    pub fn mark_end(&self) {
        let now = self.clock.monotonic_ms();
        self.state.lock().end = now;
    }

    /// Append a raw value. Anything goes: negative, NaN, infinite.
    pub fn record(&self, value: f64) {
        self.state.lock().values.push(value);
    }

    /// Append `end - start`, optionally marking the end first.
    /// Returns the appended value.
    ///
    /// A sample that was never started measures from 0, i.e. from process
    /// start. The value is still recorded; a warning is logged.
    pub fn record_elapsed(&self, auto_mark_end: bool) -> f64 {
        if auto_mark_end {
            self.mark_end();
        }
        let mut state = self.state.lock();
        if !state.started {
            tracing::warn!(
                metric = %self.name,
                "elapsed recorded on a sample with no start mark"
            );
        }
        let elapsed = state.end - state.start;
        state.values.push(elapsed);
        elapsed
    }

    /// `record_elapsed(true)`: the usual one-call-per-operation path.
    pub fn measure(&self) -> f64 {
        self.record_elapsed(true)
    }

    pub fn start(&self) -> f64 {
        self.state.lock().start
    }

    pub fn end(&self) -> f64 {
        self.state.lock().end
    }

    pub fn has_started(&self) -> bool {
        self.state.lock().started
    }

    /// Copy of the recorded values, oldest first.
    pub fn values(&self) -> Vec<f64> {
        self.state.lock().values.clone()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.state.lock().values.last().copied()
    }

    pub fn len(&self) -> usize {
        self.state.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append this sample's values onto `out` without an intermediate copy.
    pub(crate) fn extend_into(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&self.state.lock().values);
    }

    /// Drop recorded values, keeping the window marks.
    pub(crate) fn clear_values(&self) {
        self.state.lock().values.clear();
    }

    /// True when some handle besides this one can still reach the series.
    pub(crate) fn is_shared(&self) -> bool {
        Arc::strong_count(&self.state) > 1
    }

    /// True when both handles point at the same series.
    pub fn ptr_eq(&self, other: &Sample) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Sample")
            .field("name", &self.name)
            .field("start", &state.start)
            .field("end", &state.end)
            .field("values", &state.values)
            .finish()
    }
}
