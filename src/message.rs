use serde::Serialize;

use crate::profile::Snapshot;

/// Outbound envelope: caller-supplied type tag and content with the
/// profiling snapshot riding along.
///
/// Non-finite profile values (an `inf` fps, a NaN extent) serialize as
/// JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfiledMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: serde_json::Value,
    pub telemetry: Snapshot,
}

impl ProfiledMessage {
    pub fn new(
        kind: impl Into<String>,
        content: serde_json::Value,
        telemetry: Snapshot,
    ) -> Self {
        Self {
            kind: kind.into(),
            content,
            telemetry,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
