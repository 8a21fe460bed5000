use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// How long the simulated page stays open (seconds)
    #[serde(default = "default_duration")]
    pub duration_secs: u64,

    /// Target inter-frame interval (ms), jittered ±25%
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,

    /// Simulated network fetches per second
    #[serde(default = "default_fetches_per_sec")]
    pub fetches_per_sec: u32,

    /// Base seed for the per-call-site RNGs
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_duration() -> u64 {
    30
}
fn default_frame_interval() -> u64 {
    16
}
fn default_fetches_per_sec() -> u32 {
    5
}
fn default_seed() -> u64 {
    1000
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.duration_secs == 0 || self.duration_secs > 600 {
            return Err(AppError::BadRequest(
                "duration_secs must be between 1 and 600".into(),
            ));
        }
        if self.frame_interval_ms == 0 || self.frame_interval_ms > 1000 {
            return Err(AppError::BadRequest(
                "frame_interval_ms must be between 1 and 1000".into(),
            ));
        }
        if self.fetches_per_sec == 0 || self.fetches_per_sec > 100 {
            return Err(AppError::BadRequest(
                "fetches_per_sec must be between 1 and 100".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct SimulationStatus {
    pub running: bool,
    pub message: String,
}

// ─── POST /api/simulation/start ──────────────────────────────────

pub async fn start_simulation(
    State(state): State<Arc<AppState>>,
    Json(config): Json<SimulationConfig>,
) -> Result<Json<SimulationStatus>, AppError> {
    if state.sim_running.load(Ordering::SeqCst) {
        return Err(AppError::AlreadyRunning);
    }
    config.validate()?;

    state.sim_running.store(true, Ordering::SeqCst);

    let msg = format!(
        "Started: {}s, {}ms frames, {} fetches/s",
        config.duration_secs, config.frame_interval_ms, config.fetches_per_sec,
    );
    tracing::info!(
        duration_secs = config.duration_secs,
        frame_interval_ms = config.frame_interval_ms,
        fetches_per_sec = config.fetches_per_sec,
        "simulation started"
    );

    let running = state.sim_running.clone();
    let profiler = state.profiler.clone();
    let message_type = state.config.message_type.clone();
    let send_interval = Duration::from_millis(state.config.send_interval_ms);

    let handle = tokio::spawn(async move {
        crate::simulation::run(running, profiler, config, message_type, send_interval)
            .await;
    });

    let mut guard = state.sim_handle.lock().await;
    *guard = Some(handle);

    Ok(Json(SimulationStatus {
        running: true,
        message: msg,
    }))
}

// ─── POST /api/simulation/stop ───────────────────────────────────

pub async fn stop_simulation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SimulationStatus>, AppError> {
    if !state.sim_running.load(Ordering::SeqCst) {
        return Ok(Json(SimulationStatus {
            running: false,
            message: "No simulation is running".into(),
        }));
    }

    state.sim_running.store(false, Ordering::SeqCst);

    let mut guard = state.sim_handle.lock().await;
    if let Some(handle) = guard.take() {
        // JoinError only means the task already ended
        let _ = handle.await;
    }

    Ok(Json(SimulationStatus {
        running: false,
        message: "Simulation stopped".into(),
    }))
}

// ─── GET /api/simulation/status ──────────────────────────────────

pub async fn simulation_status(
    State(state): State<Arc<AppState>>,
) -> Json<SimulationStatus> {
    let running = state.sim_running.load(Ordering::SeqCst);
    Json(SimulationStatus {
        running,
        message: if running {
            "Simulation in progress".into()
        } else {
            "Idle".into()
        },
    })
}
