use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use client_profiler::Snapshot;

use crate::AppState;

/// SSE event name carried by every profile update.
pub const PROFILE_EVENT: &str = "profile";

// ─── GET /api/profile ────────────────────────────────────────────
/// One snapshot as JSON. Useful for curl.

pub async fn get_profile(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.profiler.snapshot())
}

// ─── GET /api/profile/stream ─────────────────────────────────────
/// Server-Sent Events. Polls every `stream_interval_ms` and emits a
/// `profile` event only when the derived metrics moved; the event id is the
/// snapshot timestamp. Idle periods fall back to keep-alives.

pub async fn profile_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval =
        tokio::time::interval(Duration::from_millis(state.config.stream_interval_ms));

    let mut tracker = ProfileChanges::default();
    let stream = IntervalStream::new(interval).filter_map(move |_| {
        let snapshot = state.profiler.snapshot();
        tracker.changed(&snapshot).map(|json| {
            Ok(Event::default()
                .event(PROFILE_EVENT)
                .id(snapshot.metadata.timestamp.to_string())
                .data(json))
        })
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Remembers the last profile sent on one stream.
///
/// Profiles are compared in their JSON form so NaN/inf entries (both `null`)
/// count as unchanged.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    last_profile: Option<String>,
}

impl ProfileChanges {
    /// Full snapshot JSON when the profile differs from the last one seen,
    /// `None` otherwise. Timestamps alone never count as a change.
    pub fn changed(&mut self, snapshot: &Snapshot) -> Option<String> {
        let profile = serde_json::to_string(&snapshot.profile).ok()?;
        if self.last_profile.as_deref() == Some(profile.as_str()) {
            return None;
        }
        let json = serde_json::to_string(snapshot).ok()?;
        self.last_profile = Some(profile);
        Some(json)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use client_profiler::{Metadata, MetricName};

    use super::*;

    fn snapshot(timestamp: i64, fps: f64) -> Snapshot {
        let mut profile = BTreeMap::new();
        profile.insert(MetricName::Fps, fps);
        profile.insert(MetricName::Extent, f64::NAN);
        Snapshot {
            metadata: Metadata {
                client_id: "c".into(),
                timestamp,
            },
            profile,
        }
    }

    #[test]
    fn first_snapshot_is_always_emitted() {
        let mut tracker = ProfileChanges::default();
        let json = tracker.changed(&snapshot(1, 60.0)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["profile"]["fps"], 60.0);
        assert_eq!(value["metadata"]["timestamp"], 1);
    }

    #[test]
    fn new_timestamp_alone_is_skipped() {
        let mut tracker = ProfileChanges::default();
        assert!(tracker.changed(&snapshot(1, 60.0)).is_some());
        assert!(tracker.changed(&snapshot(2, 60.0)).is_none());
        assert!(tracker.changed(&snapshot(3, 59.0)).is_some());
        assert!(tracker.changed(&snapshot(4, 60.0)).is_some());
    }

    #[test]
    fn non_finite_values_compare_equal() {
        let mut tracker = ProfileChanges::default();
        assert!(tracker.changed(&snapshot(1, f64::INFINITY)).is_some());
        assert!(tracker.changed(&snapshot(2, f64::INFINITY)).is_none());
    }
}
