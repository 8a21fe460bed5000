use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use client_profiler::{MetricName, PercentileSet, Snapshot};

use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

/// Raw values pushed by a remote instrumentation site.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub name: String,
    #[serde(default)]
    pub values: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub name: MetricName,
    pub recorded: usize,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct DistributionResponse {
    pub name: MetricName,
    pub distribution: PercentileSet,
}

fn parse_metric(raw: &str) -> Result<MetricName, AppError> {
    raw.parse::<MetricName>()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

// ─── POST /api/samples ───────────────────────────────────────────
/// One new sample per request, holding the posted values in order.

pub async fn ingest_samples(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, AppError> {
    let name = parse_metric(&req.name)?;

    let sample = state.profiler.sample(name);
    for value in &req.values {
        sample.record(*value);
    }

    Ok(Json(IngestResponse {
        name,
        recorded: req.values.len(),
    }))
}

// ─── POST /api/profile/send ──────────────────────────────────────

pub async fn send_profile(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendRequest>,
) -> Result<Json<Snapshot>, AppError> {
    let kind = req
        .kind
        .unwrap_or_else(|| state.config.message_type.clone());

    let snapshot = state
        .profiler
        .send_profiled_message(&kind, req.content)
        .await
        .map_err(|e| AppError::Transport(e.to_string()))?;

    Ok(Json(snapshot))
}

// ─── POST /api/profile/reset ─────────────────────────────────────

pub async fn reset_profile(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    state.profiler.reset();
    Json(state.profiler.snapshot())
}

// ─── GET /api/profile/distribution/:metric ───────────────────────

pub async fn get_distribution(
    State(state): State<Arc<AppState>>,
    Path(metric): Path<String>,
) -> Result<Json<DistributionResponse>, AppError> {
    let name = parse_metric(&metric)?;
    Ok(Json(DistributionResponse {
        name,
        distribution: state.profiler.distribution(name),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_metric_is_bad_request() {
        let err = parse_metric("latency").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(parse_metric("bufferLoadTime").unwrap(), MetricName::BufferLoadTime);
    }

    #[test]
    fn send_request_defaults() {
        let req: SendRequest = serde_json::from_str("{}").unwrap();
        assert!(req.kind.is_none());
        assert!(req.content.is_null());
    }
}
