// Deterministic, portable pseudo-random number generator.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding,
// plus the handful of collection helpers the composition strategies need
// (uniform choice, weighted choice, distinct sampling).
//
// This crate is the single source of randomness for `cadenza_music`. Every
// strategy receives a `&mut ComposerRng` explicitly; nothing reaches for a
// global or thread-local generator. Two runs with the same seed and the same
// preset therefore produce byte-identical MIDI output.
//
// **Critical constraint: determinism.** The core generator must produce
// identical output given the same prior state, regardless of platform,
// compiler version, or optimization level. Floating point only appears in the
// derived helpers (`next_f64`, `range_f64`, `choose_weighted`), and those are
// pure functions of the integer stream.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG used for every random decision during composition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComposerRng {
    s: [u64; 4],
}

impl ComposerRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Generate a uniform `f64` in [0, 1) from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a uniform random integer in `[low, high)`.
    ///
    /// Uses rejection sampling to avoid modulo bias.
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Uniform `usize` in `[low, high)`. Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Uniform `usize` in `[low, high]`. Panics if `low > high`.
    pub fn range_usize_inclusive(&mut self, low: usize, high: usize) -> usize {
        assert!(low <= high, "range_usize_inclusive: low must be <= high");
        self.range_u64(low as u64, high as u64 + 1) as usize
    }

    /// Uniform `i32` in `[low, high]`. Panics if `low > high`.
    pub fn range_i32_inclusive(&mut self, low: i32, high: i32) -> i32 {
        assert!(low <= high, "range_i32_inclusive: low must be <= high");
        let span = (high as i64 - low as i64) as u64 + 1;
        (low as i64 + self.range_u64(0, span) as i64) as i32
    }

    /// Uniform `f64` in `[low, high)`. Panics if `low >= high`.
    pub fn range_f64(&mut self, low: f64, high: f64) -> f64 {
        assert!(low < high, "range_f64: low must be less than high");
        low + self.next_f64() * (high - low)
    }

    /// Return `true` with probability `p`.
    ///
    /// `p <= 0.0` always returns false, `p >= 1.0` always returns true.
    pub fn random_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick a uniformly random element, or `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.range_usize(0, items.len());
        Some(&items[idx])
    }

    /// Pick an index with probability proportional to its weight.
    ///
    /// Scans cumulatively and returns the first index whose running sum
    /// exceeds `u * total`. Returns `None` if the slice is empty or the
    /// weights sum to zero or less. Always consumes exactly one draw when the
    /// weights are usable.
    pub fn choose_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().sum();
        if weights.is_empty() || total <= 0.0 {
            return None;
        }
        let target = self.next_f64() * total;
        let mut cumulative = 0.0;
        for (i, &w) in weights.iter().enumerate() {
            cumulative += w;
            if cumulative > target {
                return Some(i);
            }
        }
        // Rounding left the target at the very top of the range.
        weights.iter().rposition(|&w| w > 0.0)
    }

    /// Draw `k` distinct indices from `0..len`, in draw order.
    ///
    /// Partial Fisher-Yates; `k` is capped at `len`.
    pub fn sample_indices(&mut self, len: usize, k: usize) -> Vec<usize> {
        let k = k.min(len);
        let mut pool: Vec<usize> = (0..len).collect();
        for i in 0..k {
            let j = self.range_usize(i, len);
            pool.swap(i, j);
        }
        pool.truncate(k);
        pool
    }
}

/// SplitMix64, used only for seeding xoshiro256++ from a single `u64`.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determinism_same_seed_same_output() {
        let mut a = ComposerRng::new(42);
        let mut b = ComposerRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_different_output() {
        let mut a = ComposerRng::new(42);
        let mut b = ComposerRng::new(43);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn f64_in_unit_range() {
        let mut rng = ComposerRng::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn range_i32_inclusive_hits_both_ends() {
        let mut rng = ComposerRng::new(7);
        let mut seen = [false; 5];
        for _ in 0..10_000 {
            let v = rng.range_i32_inclusive(-2, 2);
            assert!((-2..=2).contains(&v));
            seen[(v + 2) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s), "every value in -2..=2 should appear");
    }

    #[test]
    fn range_f64_within_bounds() {
        let mut rng = ComposerRng::new(777);
        for _ in 0..10_000 {
            let v = rng.range_f64(0.5, 1.5);
            assert!((0.5..1.5).contains(&v), "range_f64 out of range: {v}");
        }
    }

    #[test]
    fn random_bool_extremes() {
        let mut rng = ComposerRng::new(42);
        for _ in 0..100 {
            assert!(!rng.random_bool(0.0));
            assert!(rng.random_bool(1.0));
        }
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = ComposerRng::new(1);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[9]), Some(&9));
    }

    #[test]
    fn choose_weighted_skips_zero_weights() {
        let mut rng = ComposerRng::new(3);
        for _ in 0..1000 {
            let idx = rng.choose_weighted(&[0.0, 1.0, 0.0, 2.0]).unwrap();
            assert!(idx == 1 || idx == 3);
        }
        assert_eq!(rng.choose_weighted(&[]), None);
        assert_eq!(rng.choose_weighted(&[0.0, 0.0]), None);
    }

    #[test]
    fn sample_indices_are_distinct() {
        let mut rng = ComposerRng::new(99);
        for _ in 0..200 {
            let mut picked = rng.sample_indices(14, 5);
            assert_eq!(picked.len(), 5);
            picked.sort_unstable();
            picked.dedup();
            assert_eq!(picked.len(), 5);
            assert!(picked.iter().all(|&i| i < 14));
        }
        assert_eq!(rng.sample_indices(3, 10).len(), 3);
    }

    #[test]
    fn serialization_roundtrip() {
        let mut rng = ComposerRng::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: ComposerRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
