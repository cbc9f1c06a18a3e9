//! Rate-computation plugins.
//!
//! A rate source supplies the budget for each upcoming round. Values below
//! one mean "no work this round" and are not an error.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Budget supplier for a governor's rounds. Must return promptly; the
/// governor calls it inline on every round.
pub trait RateSource: Send {
    fn rate(&mut self) -> i64;
}

/// Fixed budget every round.
#[derive(Debug, Clone)]
pub struct ConstantRate {
    count: i64,
}

impl ConstantRate {
    pub fn new(count: i64) -> Self {
        Self { count }
    }
}

impl RateSource for ConstantRate {
    fn rate(&mut self) -> i64 {
        self.count
    }
}

/// Base budget with uniform jitter of `+/- base * spread` per round.
#[derive(Debug)]
pub struct PerturbedRate {
    base: i64,
    spread: f64,
    rng: StdRng,
}

impl PerturbedRate {
    pub fn new(base: i64, spread: f64) -> Self {
        Self {
            base,
            spread,
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded variant for deterministic tests.
    pub fn with_seed(base: i64, spread: f64, seed: u64) -> Self {
        Self {
            base,
            spread,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RateSource for PerturbedRate {
    fn rate(&mut self) -> i64 {
        let magnitude = (self.base as f64 * self.spread).abs();
        if magnitude < f64::EPSILON {
            return self.base;
        }
        let delta = self.rng.gen_range(-magnitude..=magnitude);
        self.base + delta as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_rate_is_stable() {
        let mut rater = ConstantRate::new(4096);
        assert_eq!(rater.rate(), 4096);
        assert_eq!(rater.rate(), 4096);
    }

    #[test]
    fn test_perturbed_rate_stays_in_bounds() {
        let mut rater = PerturbedRate::with_seed(1000, 0.2, 42);
        for _ in 0..100 {
            let rate = rater.rate();
            assert!((800..=1200).contains(&rate), "rate {rate} out of bounds");
        }
    }

    #[test]
    fn test_perturbed_rate_zero_spread() {
        let mut rater = PerturbedRate::with_seed(1000, 0.0, 42);
        assert_eq!(rater.rate(), 1000);
    }
}
