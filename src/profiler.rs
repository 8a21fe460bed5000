use parking_lot::Mutex;

use crate::config::WindowPolicy;
use crate::message::ProfiledMessage;
use crate::profile::{MetricName, PercentileSet, Registry, Sample, Snapshot};
use crate::transport::{Transport, TransportError};

/// Shareable front end over a [`Registry`] and a [`Transport`].
///
/// Call sites register samples, the sender ships snapshots. Every method
/// takes the lock briefly and never across an await.
pub struct Profiler {
    inner: Mutex<Registry>,
    transport: Box<dyn Transport>,
    window: WindowPolicy,
}

impl Profiler {
    pub fn new(registry: Registry, transport: Box<dyn Transport>) -> Self {
        Self {
            inner: Mutex::new(registry),
            transport,
            window: WindowPolicy::Cumulative,
        }
    }

    pub fn with_window(mut self, window: WindowPolicy) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> WindowPolicy {
        self.window
    }

    pub fn session_id(&self) -> String {
        self.inner.lock().session().session_id().to_owned()
    }

    pub fn register(&self, sample: Sample) {
        self.inner.lock().register(sample);
    }

    /// New sample on the session's clock, already registered.
    pub fn sample(&self, name: MetricName) -> Sample {
        let mut registry = self.inner.lock();
        let sample = Sample::with_clock(name, registry.session().clock().clone());
        registry.register(sample.clone());
        sample
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.lock().snapshot()
    }

    pub fn distribution(&self, name: MetricName) -> PercentileSet {
        self.inner.lock().distribution(name)
    }

    /// Start a fresh window. Handles held by call sites stay registered.
    pub fn reset(&self) {
        self.inner.lock().reset();
        tracing::info!("profile reset");
    }

    /// Snapshot, wrap with `kind`/`content`, hand to the transport once.
    ///
    /// Under [`WindowPolicy::ResetAfterSend`] the table is cleared in the same
    /// critical section as the snapshot, whether or not the send succeeds.
    pub async fn send_profiled_message(
        &self,
        kind: &str,
        content: serde_json::Value,
    ) -> Result<Snapshot, TransportError> {
        let snapshot = {
            let mut registry = self.inner.lock();
            let snapshot = registry.snapshot();
            if self.window == WindowPolicy::ResetAfterSend {
                registry.reset();
            }
            snapshot
        };

        let message = ProfiledMessage::new(kind, content, snapshot);
        if let Err(e) = self.transport.send(&message).await {
            tracing::warn!(kind, error = %e, "profiled message not delivered");
            return Err(e);
        }
        Ok(message.telemetry)
    }
}
