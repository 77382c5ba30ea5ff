//! Fast, non cryptographically secure random number generation.

/// Maps a 53-bit integer draw onto the unit interval.
const UNIT_53: f64 = 1.0 / (1u64 << 53) as f64;

/// A xoroshiro128++ generator.
///
/// The standard library generators dominate the per-block cost of the
/// simulation, while this two-word generator costs about a cycle per draw
/// with more than enough statistical quality for Monte Carlo sampling.
#[derive(Debug, Clone)]
pub struct Rng {
    s0: u64,
    s1: u64,
}

impl Rng {
    /// Creates a generator from a 64-bit seed. The two state words are
    /// initialized with successive SplitMix64 advances of the seed, so a
    /// zero seed is fine.
    pub fn new(mut seed: u64) -> Self {
        let s0 = Self::split_mix_64(&mut seed);
        let s1 = Self::split_mix_64(&mut seed);
        Rng { s0, s1 }
    }

    /// Creates a generator seeded from OS entropy. Independent calls yield
    /// statistically independent streams.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    #[inline]
    fn split_mix_64(seed: &mut u64) -> u64 {
        *seed = seed.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = *seed;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }

    /// Returns a uniformly distributed 64-bit integer.
    #[inline]
    pub fn rand64(&mut self) -> u64 {
        let s0 = self.s0;
        let mut s1 = self.s1;
        let result = s0.wrapping_add(s1).rotate_left(17).wrapping_add(s0);
        s1 ^= s0;
        self.s0 = s0.rotate_left(49) ^ s1 ^ (s1 << 21);
        self.s1 = s1.rotate_left(28);
        result
    }

    /// Returns a draw from the exponential distribution with the given mean.
    ///
    /// Computed as `-mean * ln(1 - u)` for a 53-bit uniform `u`, through
    /// `ln_1p` to keep precision as the argument approaches zero. Always
    /// nonnegative and finite.
    #[inline]
    pub fn exporand(&mut self, mean: f64) -> f64 {
        let uniform = (self.rand64() >> 11) as f64;
        -mean * (-uniform * UNIT_53).ln_1p()
    }
}

#[cfg(test)]
mod tests {
    use super::Rng;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Rng::new(0xdeadbeef);
        let mut b = Rng::new(0xdeadbeef);
        for _ in 0..1000 {
            assert_eq!(a.rand64(), b.rand64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Rng::new(1);
        let mut b = Rng::new(2);
        let same = (0..64).filter(|_| a.rand64() == b.rand64()).count();
        assert!(same < 4);
    }

    #[test]
    fn exporand_is_nonnegative_and_finite() {
        let mut rng = Rng::new(42);
        for _ in 0..100_000 {
            let x = rng.exporand(600_000.0);
            assert!(x.is_finite());
            assert!(x >= 0.0);
        }
    }

    // The sample mean of 200k draws has a standard error of mean/sqrt(200k),
    // about 1350 here, so the band below is over seven standard errors wide.
    #[test]
    fn exporand_sample_mean_matches() {
        const MEAN: f64 = 600_000.0;
        const DRAWS: usize = 200_000;

        let mut rng = Rng::from_entropy();
        let sum: f64 = (0..DRAWS).map(|_| rng.exporand(MEAN)).sum();
        let sample_mean = sum / DRAWS as f64;

        assert!((sample_mean - MEAN).abs() < 10_000.0, "mean {}", sample_mean);
    }
}
