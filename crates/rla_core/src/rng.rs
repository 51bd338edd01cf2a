// crates/rla_core/src/rng.rs
//
// Deterministic, integer-only RNG for phantom-ballot simulation.
//
// • The seed is the only source of randomness; there is no OS entropy path.
// • Unbiased ranges via rejection sampling (no modulo bias, no floats).
// • Cross-platform determinism: explicit seeding and word-index accounting.

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

/// Deterministic RNG used to substitute outcomes for unretrieved ballots.
///
/// Internally ChaCha20 with an explicit 32-byte seed derived from the 64-bit
/// seed (little-endian bytes in the first 8 positions; the rest 0).
#[derive(Debug, Clone)]
pub struct PhantomRng {
    rng: ChaCha20Rng,
    words_consumed: u128,
}

impl PhantomRng {
    #[inline]
    pub fn from_seed_u64(seed: u64) -> Self {
        let mut seed32 = [0u8; 32];
        seed32[..8].copy_from_slice(&seed.to_le_bytes());
        Self {
            rng: ChaCha20Rng::from_seed(seed32),
            words_consumed: 0,
        }
    }

    /// Number of 64-bit words drawn so far (saturating).
    #[inline]
    pub fn words_consumed(&self) -> u128 {
        self.words_consumed
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.words_consumed = self.words_consumed.saturating_add(1);
        self.rng.next_u64()
    }

    /// Unbiased integer in [0, n). Returns `None` if `n == 0`.
    ///
    /// `threshold = 2^64 mod n`; accept `x >= threshold`, then `x % n` is uniform.
    #[inline]
    pub fn gen_range(&mut self, n: u64) -> Option<u64> {
        if n == 0 {
            return None;
        }
        let threshold = n.wrapping_neg() % n;
        loop {
            let x = self.next_u64();
            if x >= threshold {
                return Some(x % n);
            }
        }
    }

    /// Pick one element index from a slice; `None` when empty.
    #[inline]
    pub fn choose_index<T>(&mut self, slice: &[T]) -> Option<usize> {
        self.gen_range(slice.len() as u64).map(|v| v as usize)
    }
}
