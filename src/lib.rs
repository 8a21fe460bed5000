//! Client-side performance telemetry.
//!
//! Instrumentation sites create [`Sample`]s and record timings or raw values
//! into them. A [`Registry`] keeps every sample by [`MetricName`] and runs its
//! [`Aggregator`]s over the whole table to build a [`Snapshot`]. The
//! [`Profiler`] wraps that for shared use and hands snapshots to a
//! [`transport::Transport`].

pub mod config;
pub mod message;
pub mod profile;
pub mod profiler;
pub mod session;
pub mod transport;

pub use config::{ProfilerConfig, WindowPolicy};
pub use message::ProfiledMessage;
pub use profile::{
    Aggregator, Metadata, MetricName, PercentileSet, Registry, Sample, SampleTable,
    Snapshot,
};
pub use profiler::Profiler;
pub use session::{Clock, ManualClock, SessionContext, SystemClock};
