//! Injectable identifier generation for setups and signals.
//!
//! The engine never invents ids on its own. Tests use the sequential or
//! seeded generators for reproducible runs; `ContentIdGenerator` derives ids
//! from the setup's natural key so re-running a scan yields the same id.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::domain::{SetupId, SignalId, Timeframe};

/// Source of identifiers. Implementations must be safe to share across threads.
pub trait IdGenerator: Send + Sync {
    fn setup_id(&self, pair: &str, timeframe: Timeframe, signal_time: DateTime<Utc>) -> SetupId;

    fn signal_id(&self, setup_id: &SetupId) -> SignalId;
}

/// `setup-1`, `setup-2`, ... and `signal-1`, `signal-2`, ...
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    setups: AtomicU64,
    signals: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn setup_id(&self, _pair: &str, _timeframe: Timeframe, _signal_time: DateTime<Utc>) -> SetupId {
        let n = self.setups.fetch_add(1, Ordering::Relaxed) + 1;
        SetupId(format!("setup-{n}"))
    }

    fn signal_id(&self, _setup_id: &SetupId) -> SignalId {
        let n = self.signals.fetch_add(1, Ordering::Relaxed) + 1;
        SignalId(format!("signal-{n}"))
    }
}

/// Random 64-bit hex ids from a seeded RNG.
#[derive(Debug)]
pub struct SeededIdGenerator {
    rng: Mutex<StdRng>,
}

impl SeededIdGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seed from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    fn next_hex(&self) -> String {
        // A poisoned lock only means another thread panicked mid-draw; the RNG state is still usable.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        format!("{:016x}", rng.gen::<u64>())
    }
}

impl IdGenerator for SeededIdGenerator {
    fn setup_id(&self, _pair: &str, _timeframe: Timeframe, _signal_time: DateTime<Utc>) -> SetupId {
        SetupId(format!("setup-{}", self.next_hex()))
    }

    fn signal_id(&self, _setup_id: &SetupId) -> SignalId {
        SignalId(format!("signal-{}", self.next_hex()))
    }
}

/// BLAKE3 of the natural key. Same inputs, same id, on every platform.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentIdGenerator;

impl ContentIdGenerator {
    fn short_hash(parts: &[&[u8]]) -> String {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part);
            hasher.update(&[0]);
        }
        hasher.finalize().to_hex()[..16].to_string()
    }
}

impl IdGenerator for ContentIdGenerator {
    fn setup_id(&self, pair: &str, timeframe: Timeframe, signal_time: DateTime<Utc>) -> SetupId {
        let hash = Self::short_hash(&[
            pair.as_bytes(),
            timeframe.as_str().as_bytes(),
            &signal_time.timestamp().to_le_bytes(),
        ]);
        SetupId(format!("setup-{hash}"))
    }

    fn signal_id(&self, setup_id: &SetupId) -> SignalId {
        let hash = Self::short_hash(&[b"signal", setup_id.as_str().as_bytes()]);
        SignalId(format!("signal-{hash}"))
    }
}
