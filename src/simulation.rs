use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use client_profiler::{MetricName, Profiler};

use crate::handlers::simulation::SimulationConfig;

// ─── Public entry point ──────────────────────────────────────────

/// Drives the profiler the way a page would: a frame loop, a stream of
/// network fetches, an extent probe, and a periodic sender. Runs until the
/// deadline or until `running` goes false.
pub async fn run(
    running: Arc<AtomicBool>,
    profiler: Arc<Profiler>,
    config: SimulationConfig,
    message_type: String,
    send_interval: Duration,
) {
    let deadline = Instant::now() + Duration::from_secs(config.duration_secs);
    let seed = config.seed;

    let handles = vec![
        tokio::spawn(frame_loop(
            running.clone(),
            profiler.clone(),
            deadline,
            config.frame_interval_ms,
            StdRng::seed_from_u64(seed),
        )),
        tokio::spawn(fetch_loop(
            running.clone(),
            profiler.clone(),
            deadline,
            config.fetches_per_sec,
            StdRng::seed_from_u64(seed + 1),
        )),
        tokio::spawn(extent_probe(
            running.clone(),
            profiler.clone(),
            deadline,
            StdRng::seed_from_u64(seed + 2),
        )),
        tokio::spawn(sender(
            running.clone(),
            profiler,
            deadline,
            message_type,
            send_interval,
        )),
    ];

    for h in handles {
        let _ = h.await;
    }

    running.store(false, Ordering::SeqCst);
    tracing::info!("simulation finished");
}

/// Longest a call site sleeps before re-checking the stop flag.
const STOP_POLL: Duration = Duration::from_millis(100);

fn live(running: &AtomicBool, deadline: Instant) -> bool {
    running.load(Ordering::Relaxed) && Instant::now() < deadline
}

/// Sleep for `total` in `STOP_POLL` slices. Returns false as soon as the
/// simulation is stopped or past its deadline.
async fn pause(running: &AtomicBool, deadline: Instant, total: Duration) -> bool {
    let wake = Instant::now() + total;
    loop {
        if !live(running, deadline) {
            return false;
        }
        let now = Instant::now();
        if now >= wake {
            return true;
        }
        sleep((wake - now).min(STOP_POLL)).await;
    }
}

fn jittered(base_ms: f64, spread: f64, rng: &mut StdRng) -> Duration {
    let factor = rng.gen_range(1.0 - spread..=1.0 + spread);
    Duration::from_secs_f64((base_ms * factor).max(0.0) / 1000.0)
}

// ─── Call sites ──────────────────────────────────────────────────

/// One long-lived fps sample; each frame records the interval since the
/// previous one.
async fn frame_loop(
    running: Arc<AtomicBool>,
    profiler: Arc<Profiler>,
    deadline: Instant,
    frame_interval_ms: u64,
    mut rng: StdRng,
) {
    let frame = profiler.sample(MetricName::Fps);
    frame.mark_start();

    while live(&running, deadline) {
        sleep(jittered(frame_interval_ms as f64, 0.25, &mut rng)).await;
        frame.measure();
        frame.mark_start();
    }
}

/// A fresh latency / buffer-size / buffer-load sample per simulated fetch.
/// Size and latency are recorded pairwise.
async fn fetch_loop(
    running: Arc<AtomicBool>,
    profiler: Arc<Profiler>,
    deadline: Instant,
    fetches_per_sec: u32,
    mut rng: StdRng,
) {
    let gap_ms = 1000.0 / f64::from(fetches_per_sec.max(1));

    while live(&running, deadline) {
        let latency = profiler.sample(MetricName::NetworkLatency);
        latency.mark_start();
        sleep(Duration::from_millis(rng.gen_range(20..=200))).await;
        latency.measure();

        let bytes = rng.gen_range(16_384..=1_048_576u32);
        profiler
            .sample(MetricName::NetworkBufferSize)
            .record(f64::from(bytes));

        let load = profiler.sample(MetricName::BufferLoadTime);
        load.mark_start();
        sleep(Duration::from_micros(u64::from(bytes / 64))).await;
        load.measure();

        sleep(jittered(gap_ms, 0.5, &mut rng)).await;
    }
}

/// Single extent sample; snapshots report its latest value.
async fn extent_probe(
    running: Arc<AtomicBool>,
    profiler: Arc<Profiler>,
    deadline: Instant,
    mut rng: StdRng,
) {
    let extent = profiler.sample(MetricName::Extent);
    let mut current: f64 = 1_000.0;

    while live(&running, deadline) {
        current = (current + rng.gen_range(-100.0..=100.0)).max(0.0);
        extent.record(current);
        if !pause(&running, deadline, Duration::from_secs(1)).await {
            break;
        }
    }
}

async fn sender(
    running: Arc<AtomicBool>,
    profiler: Arc<Profiler>,
    deadline: Instant,
    message_type: String,
    interval: Duration,
) {
    let mut tick: u64 = 0;

    while pause(&running, deadline, interval).await {
        tick += 1;
        let content = serde_json::json!({ "source": "simulation", "tick": tick });
        // Delivery failures are logged inside the profiler.
        let _ = profiler.send_profiled_message(&message_type, content).await;
    }
}
