//! Deterministic random number generation.
//!
//! RULE: Nothing in the crate may call any platform RNG.
//! All randomness flows through DeskRng instances derived
//! from a single master seed.
//!
//! Each consumer gets its own stream, seeded deterministically
//! from (master_seed XOR stream_index). This means:
//!   - Adding a new stream never changes existing streams.
//!   - Each stream is fully reproducible in isolation.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single consumer.
pub struct DeskRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl DeskRng {
    /// Create a stream RNG from the master seed and a stable
    /// stream index. The index must never change once assigned.
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll an integer in [min, max], both inclusive.
    pub fn int_inclusive(&mut self, min: i64, max: i64) -> i64 {
        assert!(min <= max, "empty range {min}..={max}");
        let span = (max - min) as u64 + 1;
        min + self.next_u64_below(span) as i64
    }

    /// Roll a float in [low, high).
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_f64() * (high - low)
    }

    /// Pick one element uniformly. Panics on an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        let index = self.next_u64_below(items.len() as u64) as usize;
        &items[index]
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_u64_below(i as u64 + 1) as usize;
            items.swap(i, j);
        }
    }

    /// A random (version 4 layout) UUID built from this stream.
    pub fn uuid(&mut self) -> uuid::Uuid {
        let mut bytes = [0u8; 16];
        self.inner.fill_bytes(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }

    /// A short lowercase id, e.g. `"3f9c2a71b"`.
    pub fn short_id(&mut self) -> String {
        let simple = self.uuid().simple().to_string();
        simple[..9].to_string()
    }
}

/// All stream RNGs for a single run, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_stream(&self, slot: StreamSlot) -> DeskRng {
        DeskRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries; only append.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Service = 0,
    Queue = 1,
    Demo = 2,
    Inbox = 3,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Queue => "queue",
            Self::Demo => "demo",
            Self::Inbox => "inbox",
        }
    }
}
