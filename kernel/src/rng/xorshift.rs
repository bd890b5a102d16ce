//! xorshift64* random number generator.
//!
//! Fast, deterministic PRNG for holding-time sampling. Same seed → same
//! sequence, which together with the kernel's ordered iteration gives
//! bit-reproducible runs.
//!
//! The kernel itself never draws from this generator; it is threaded into
//! actors by the embedding model code and sampled during `update_time`.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*.
///
/// # Example
/// ```
/// use multiscale_simulator_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let holding_time = rng.exponential(0.5);
/// assert!(holding_time > 0.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    /// Internal state (64-bit, never zero).
    state: u64,
}

impl RngManager {
    /// Create a new RNG with the given seed. A zero seed is mapped to 1
    /// (xorshift requires non-zero state).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Next random u64.
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Random f64 in `[0.0, 1.0)`.
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Random value in `[min, max)`.
    ///
    /// # Panics
    /// Panics if `min >= max`.
    pub fn range(&mut self, min: i64, max: i64) -> i64 {
        assert!(min < max, "min must be less than max");
        let value = self.next();
        let range_size = (max - min) as u64;
        min + (value % range_size) as i64
    }

    /// Sample an exponentially distributed holding time with the given
    /// rate (mean `1 / rate`).
    ///
    /// # Panics
    /// Panics unless `rate` is finite and positive.
    pub fn exponential(&mut self, rate: f64) -> f64 {
        assert!(rate.is_finite() && rate > 0.0, "rate must be finite and positive");
        let u = self.next_f64();
        -(1.0 - u).ln() / rate
    }

    /// Current RNG state (for checkpointing/replay).
    pub fn get_state(&self) -> u64 {
        self.state
    }
}
