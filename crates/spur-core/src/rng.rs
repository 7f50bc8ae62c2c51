//! Deterministic, independently positioned RNG streams.
//!
//! # Determinism strategy
//!
//! Every jitter instance owns its own `ChaCha8Rng` seeded by:
//!
//!   seed = global_seed XOR (salt * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive salts uniformly across the seed space.
//! This means:
//!
//! - Streams never share state, so the draws made for one component do not
//!   depend on how often any other component was sampled.
//! - A stream's position is a single word counter, so it can be captured in a
//!   snapshot and restored exactly.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Mix the run's global seed with a per-stream salt.
#[inline]
pub fn derive_seed(global_seed: u64, salt: u64) -> u64 {
    global_seed ^ salt.wrapping_add(1).wrapping_mul(MIXING_CONSTANT)
}

// ── StreamPosition ────────────────────────────────────────────────────────────

/// Where a stream stands: enough to rebuild it bit-for-bit.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamPosition {
    pub seed:     u64,
    /// ChaCha word counter (number of 32-bit words consumed).
    pub word_pos: u64,
}

// ── StreamRng ─────────────────────────────────────────────────────────────────

/// A seeded, restorable random stream.
///
/// The type is deliberately not `Clone`: two handles to the same stream
/// position would silently duplicate draws.
pub struct StreamRng {
    seed:  u64,
    inner: ChaCha8Rng,
}

impl StreamRng {
    /// Seed deterministically from the run's global seed and a stream salt.
    pub fn new(global_seed: u64, salt: u64) -> Self {
        Self::from_seed(derive_seed(global_seed, salt))
    }

    /// Seed directly, without mixing.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Rebuild a stream at a previously captured position.
    pub fn at(position: StreamPosition) -> Self {
        let mut rng = Self::from_seed(position.seed);
        rng.inner.set_word_pos(u128::from(position.word_pos));
        rng
    }

    /// Capture the current position.
    pub fn position(&self) -> StreamPosition {
        StreamPosition {
            seed:     self.seed,
            word_pos: self.inner.get_word_pos() as u64,
        }
    }

    /// Expose the inner generator for use with `rand` distribution types
    /// (`rng.inner().sample(...)`, `rng.inner().gen_range(...)`, etc.)
    #[inline]
    pub fn inner(&mut self) -> &mut ChaCha8Rng {
        &mut self.inner
    }

    /// A uniformly distributed `f64` in `[0, 1)`.
    #[inline]
    pub fn unit_f64(&mut self) -> f64 {
        // 53 random mantissa bits.
        (self.inner.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

impl std::fmt::Debug for StreamRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRng")
            .field("position", &self.position())
            .finish()
    }
}
