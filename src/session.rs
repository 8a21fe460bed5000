use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

// ─── Clocks ──────────────────────────────────────────────────────

/// Time source for samples (monotonic) and snapshot metadata (wall clock).
pub trait Clock: Send + Sync {
    /// Milliseconds since process start. Never goes backwards.
    fn monotonic_ms(&self) -> f64;

    /// Milliseconds since the Unix epoch.
    fn unix_ms(&self) -> i64;
}

/// Shared handle to a clock.
pub type SharedClock = Arc<dyn Clock>;

/// Real clock. The monotonic origin is fixed the first time any
/// `SystemClock` is asked for the time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

fn process_origin() -> Instant {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    *ORIGIN.get_or_init(Instant::now)
}

impl Clock for SystemClock {
    fn monotonic_ms(&self) -> f64 {
        process_origin().elapsed().as_secs_f64() * 1000.0
    }

    fn unix_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Process-wide default clock handed to samples created without one.
pub fn system_clock() -> SharedClock {
    static CLOCK: OnceLock<SharedClock> = OnceLock::new();
    CLOCK.get_or_init(|| Arc::new(SystemClock)).clone()
}

/// Hand-driven clock for deterministic timing.
///
/// Both readings only move when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    monotonic_bits: AtomicU64,
    unix_base_ms: AtomicI64,
    /// Total wall-clock advance, fractional part included.
    unix_offset_bits: AtomicU64,
}

impl ManualClock {
    pub fn new(monotonic_ms: f64, unix_ms: i64) -> Self {
        Self {
            monotonic_bits: AtomicU64::new(monotonic_ms.to_bits()),
            unix_base_ms: AtomicI64::new(unix_ms),
            unix_offset_bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    /// Move both readings forward by `ms`.
    pub fn advance(&self, ms: f64) {
        let now = f64::from_bits(self.monotonic_bits.load(Ordering::SeqCst));
        self.monotonic_bits
            .store((now + ms).to_bits(), Ordering::SeqCst);
        let offset = f64::from_bits(self.unix_offset_bits.load(Ordering::SeqCst));
        self.unix_offset_bits
            .store((offset + ms).to_bits(), Ordering::SeqCst);
    }

    pub fn set_monotonic(&self, ms: f64) {
        self.monotonic_bits.store(ms.to_bits(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn monotonic_ms(&self) -> f64 {
        f64::from_bits(self.monotonic_bits.load(Ordering::SeqCst))
    }

    fn unix_ms(&self) -> i64 {
        let offset = f64::from_bits(self.unix_offset_bits.load(Ordering::SeqCst));
        self.unix_base_ms.load(Ordering::SeqCst) + offset.floor() as i64
    }
}

// ─── Session identity ────────────────────────────────────────────

/// Random label of the form `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
///
/// Bits come straight from the PRNG with no version/variant nibbles, so this
/// is an opaque tag, not an RFC 4122 UUID.
pub fn generate_session_id<R: Rng>(rng: &mut R) -> String {
    let bytes: [u8; 16] = rng.gen();
    Uuid::from_bytes(bytes).hyphenated().to_string()
}

/// Per-session identity plus the clock used to stamp snapshots.
#[derive(Clone)]
pub struct SessionContext {
    session_id: String,
    clock: SharedClock,
}

impl SessionContext {
    pub fn new() -> Self {
        let mut rng = StdRng::from_entropy();
        Self::with_clock(generate_session_id(&mut rng), system_clock())
    }

    /// Deterministic session id, system clock.
    pub fn with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::with_clock(generate_session_id(&mut rng), system_clock())
    }

    pub fn with_clock(session_id: impl Into<String>, clock: SharedClock) -> Self {
        Self {
            session_id: session_id.into(),
            clock,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn timestamp(&self) -> i64 {
        self.clock.unix_ms()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_has_five_hex_groups() {
        let id = SessionContext::new().session_id().to_owned();
        let groups: Vec<&str> = id.split('-').collect();
        let lens: Vec<usize> = groups.iter().map(|g| g.len()).collect();
        assert_eq!(lens, vec![8, 4, 4, 4, 12]);
        assert!(groups
            .iter()
            .all(|g| g.chars().all(|c| c.is_ascii_hexdigit())));
    }

    #[test]
    fn seeded_sessions_repeat() {
        let a = SessionContext::with_seed(7);
        let b = SessionContext::with_seed(7);
        let c = SessionContext::with_seed(8);
        assert_eq!(a.session_id(), b.session_id());
        assert_ne!(a.session_id(), c.session_id());
    }

    #[test]
    fn manual_clock_moves_only_when_advanced() {
        let clock = ManualClock::new(10.0, 1_000);
        assert_eq!(clock.monotonic_ms(), 10.0);
        clock.advance(5.0);
        assert_eq!(clock.monotonic_ms(), 15.0);
        assert_eq!(clock.unix_ms(), 1_005);
    }

    #[test]
    fn manual_clock_accumulates_fractional_wall_time() {
        let clock = ManualClock::new(0.0, 1_000);
        clock.advance(0.5);
        assert_eq!(clock.unix_ms(), 1_000);
        clock.advance(0.5);
        assert_eq!(clock.unix_ms(), 1_001);
        clock.advance(0.75);
        clock.advance(0.75);
        assert_eq!(clock.unix_ms(), 1_002);
        assert_eq!(clock.monotonic_ms(), 2.5);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock;
        let a = clock.monotonic_ms();
        let b = clock.monotonic_ms();
        assert!(b >= a);
        assert!(clock.unix_ms() > 1_600_000_000_000);
    }
}
