//! Level generator drawing from a buffered random bit reservoir.

use rand::{RngCore, SeedableRng, rngs::SmallRng};
use thiserror::Error;

use crate::level_generator::LevelGenerator;

/// Number of bits drawn from the random number generator at each refill.
const RESERVOIR_BITS: u32 = u64::BITS;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Errors that can occur when creating a [`RandomBits`] level generator.
#[expect(
    clippy::module_name_repetitions,
    reason = "Using 'Error' would be too generic and may cause confusion."
)]
#[non_exhaustive]
pub enum BitsError {
    /// The maximum number of levels must be non-zero.
    #[error("max must be non-zero.")]
    ZeroMax,
    /// The sample width must be within the reservoir width.
    #[error("bits must be in [1, 64], got {bits}.")]
    InvalidBits {
        /// The rejected sample width.
        bits: u32,
    },
}

/// A level generator consuming a few random bits per promotion.
///
/// A new node starts at level 0 and is promoted one level at a time for as
/// long as a `bits`-wide random sample is nonzero, up to `total - 1`. The
/// probability that a node present at level `$n$` is also present at level
/// `$n + 1$` is therefore `$1 - 2^{-\text{bits}}$`, and `bits = 1` gives the
/// classic skiplist with `$p = 1/2$`.
///
/// Samples are cut from a 64-bit reservoir which is refilled from the
/// generator's own random number generator once it runs low, so most levels
/// cost a handful of shifts rather than a call into the random number
/// generator. The reservoir belongs to the instance; two lists never share
/// random state.
#[derive(Debug, Clone)]
pub struct RandomBits {
    /// The total number of levels that are assumed to exist.
    total: usize,
    /// Width of each sample.
    bits: u32,
    /// Unconsumed random bits, least significant first.
    reservoir: u64,
    /// Number of valid bits left in `reservoir`.
    remaining: u32,
    /// The random number generator.
    rng: SmallRng,
}

impl RandomBits {
    /// Create a new level generator with `total` number of levels, promoting
    /// nodes whenever a `bits`-wide sample is nonzero.
    ///
    /// The random number generator is seeded from the thread-local generator.
    ///
    /// # Errors
    ///
    /// `total` must be at least 1, and `bits` must be between 1 and 64.
    #[inline]
    pub fn new(total: usize, bits: u32) -> Result<Self, BitsError> {
        Self::with_rng(total, bits, SmallRng::from_rng(&mut rand::rng()))
    }

    /// Create a new level generator whose output is fully determined by
    /// `seed`.
    ///
    /// # Errors
    ///
    /// `total` must be at least 1, and `bits` must be between 1 and 64.
    #[inline]
    pub fn with_seed(total: usize, bits: u32, seed: u64) -> Result<Self, BitsError> {
        Self::with_rng(total, bits, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(total: usize, bits: u32, rng: SmallRng) -> Result<Self, BitsError> {
        if total == 0 {
            return Err(BitsError::ZeroMax);
        }
        if bits == 0 || bits > RESERVOIR_BITS {
            return Err(BitsError::InvalidBits { bits });
        }
        Ok(RandomBits {
            total,
            bits,
            reservoir: 0,
            remaining: 0,
            rng,
        })
    }

    /// The width of each sample.
    #[inline]
    #[must_use]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Cut the next `bits`-wide sample from the reservoir.
    fn sample(&mut self) -> u64 {
        if self.bits > self.remaining {
            self.reservoir = self.rng.next_u64();
            self.remaining = RESERVOIR_BITS;
        }
        let mask = u64::MAX >> (RESERVOIR_BITS - self.bits);
        let sample = self.reservoir & mask;
        self.reservoir = self.reservoir.checked_shr(self.bits).unwrap_or(0);
        self.remaining -= self.bits;
        sample
    }
}

impl LevelGenerator for RandomBits {
    #[inline]
    fn total(&self) -> usize {
        self.total
    }

    #[inline]
    fn level(&mut self) -> usize {
        let mut level = 0;
        while level + 1 < self.total && self.sample() != 0 {
            level += 1;
        }
        level
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, bail};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{BitsError, RandomBits};
    use crate::level_generator::LevelGenerator;

    #[test]
    fn invalid_max() {
        assert_eq!(RandomBits::new(0, 1).err(), Some(BitsError::ZeroMax));
    }

    #[rstest]
    #[case(0)]
    #[case(65)]
    #[case(u32::MAX)]
    fn invalid_bits(#[case] bits: u32) {
        assert_eq!(
            RandomBits::new(4, bits).err(),
            Some(BitsError::InvalidBits { bits })
        );
    }

    #[test]
    fn error_messages() {
        assert_eq!(BitsError::ZeroMax.to_string(), "max must be non-zero.");
        assert_eq!(
            BitsError::InvalidBits { bits: 0 }.to_string(),
            "bits must be in [1, 64], got 0."
        );
    }

    #[rstest]
    fn range(
        #[values(1, 2, 16, 128)] n: usize,
        #[values(1, 2, 7, 32, 64)] bits: u32,
    ) -> Result<()> {
        let mut generator = RandomBits::with_seed(n, bits, 0x1234_abcd)?;
        assert_eq!(generator.total(), n);
        assert_eq!(generator.bits(), bits);
        for _ in 0..10_000 {
            let level = generator.level();
            assert!((0..n).contains(&level));
        }
        Ok(())
    }

    #[test]
    fn reaches_extremes() -> Result<()> {
        let n = 8;
        let mut generator = RandomBits::with_seed(n, 1, 7)?;
        let levels: Vec<usize> = (0..100_000).map(|_| generator.level()).collect();
        if !levels.contains(&0) {
            bail!("Failed to generate a level-0 node.");
        }
        if !levels.contains(&(n - 1)) {
            bail!("Failed to generate a level-{} node.", n - 1);
        }
        Ok(())
    }

    /// With two levels, the fraction of level-1 nodes is the promotion
    /// probability `1 - 2^-bits`.
    #[rstest]
    #[case(1, 0.5)]
    #[case(2, 0.75)]
    #[case(3, 0.875)]
    #[case(4, 0.9375)]
    fn promotion_rate(#[case] bits: u32, #[case] expected: f64) -> Result<()> {
        let samples: u32 = 200_000;
        let mut generator = RandomBits::with_seed(2, bits, 0xdead_beef)?;
        let promoted = (0..samples).filter(|_| generator.level() == 1).count();
        #[expect(clippy::as_conversions, clippy::cast_precision_loss, reason = "test")]
        let rate = promoted as f64 / f64::from(samples);
        assert!(
            (rate - expected).abs() < 0.01,
            "promotion rate {rate} too far from {expected}"
        );
        Ok(())
    }

    #[test]
    fn seeded() -> Result<()> {
        let mut first = RandomBits::with_seed(16, 1, 42)?;
        let mut second = RandomBits::with_seed(16, 1, 42)?;
        let a: Vec<usize> = (0..1000).map(|_| first.level()).collect();
        let b: Vec<usize> = (0..1000).map(|_| second.level()).collect();
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn single_level() -> Result<()> {
        let mut generator = RandomBits::new(1, 1)?;
        for _ in 0..1000 {
            assert_eq!(generator.level(), 0);
        }
        Ok(())
    }
}
