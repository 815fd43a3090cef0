use std::time::Duration;

use rand::Rng;

use super::ChaosParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Injection {
    pub latency_ms: u64,
    pub should_fail: bool,
}

impl Injection {
    pub async fn apply_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;
        }
    }
}

/// Draw a latency from `[min_latency, max_latency]` (0 when `max_latency` is 0)
/// and a Bernoulli trial for failure.
pub fn sample_with<R: Rng>(rng: &mut R, params: &ChaosParams) -> Injection {
    let latency_ms = if params.max_latency() > 0 {
        rng.random_range(params.min_latency()..=params.max_latency())
    } else {
        0
    };
    let should_fail = rng.random_bool(params.fail_rate().probability());

    Injection {
        latency_ms,
        should_fail,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FaultInjector;

impl FaultInjector {
    pub fn new() -> Self {
        Self
    }

    pub fn sample(&self, params: &ChaosParams) -> Injection {
        sample_with(&mut rand::rng(), params)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::chaos::FailRate;

    const TRIALS: usize = 2_000;

    fn params(min: i64, max: i64, fail_rate: FailRate) -> ChaosParams {
        ChaosParams::new(min, max, fail_rate).unwrap()
    }

    #[test]
    fn latency_stays_within_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let p = params(100, 250, FailRate::default());
        let mut seen_min = u64::MAX;
        let mut seen_max = 0;
        for _ in 0..TRIALS {
            let latency = sample_with(&mut rng, &p).latency_ms;
            assert!((100..=250).contains(&latency), "latency {latency} out of range");
            seen_min = seen_min.min(latency);
            seen_max = seen_max.max(latency);
        }
        // Closed interval: both ends are reachable
        assert_eq!(seen_min, 100);
        assert_eq!(seen_max, 250);
    }

    #[test]
    fn zero_max_latency_means_no_delay() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = params(0, 0, FailRate::default());
        for _ in 0..TRIALS {
            assert_eq!(sample_with(&mut rng, &p).latency_ms, 0);
        }
    }

    #[test]
    fn equal_bounds_yield_exact_value() {
        let mut rng = StdRng::seed_from_u64(2);
        let p = params(100, 100, FailRate::default());
        for _ in 0..100 {
            assert_eq!(sample_with(&mut rng, &p).latency_ms, 100);
        }
    }

    #[test]
    fn zero_fail_rate_never_fails() {
        let mut rng = StdRng::seed_from_u64(3);
        for fail_rate in [FailRate::Percent(0), FailRate::Fraction(0.0)] {
            let p = params(0, 0, fail_rate);
            assert!((0..TRIALS).all(|_| !sample_with(&mut rng, &p).should_fail));
        }
    }

    #[test]
    fn full_fail_rate_always_fails() {
        let mut rng = StdRng::seed_from_u64(4);
        for fail_rate in [FailRate::Percent(100), FailRate::Fraction(1.0)] {
            let p = params(0, 0, fail_rate);
            assert!((0..TRIALS).all(|_| sample_with(&mut rng, &p).should_fail));
        }
    }

    #[test]
    fn partial_fail_rate_fails_roughly_proportionally() {
        let mut rng = StdRng::seed_from_u64(5);
        let p = params(0, 0, FailRate::Percent(30));
        let failures = (0..10_000)
            .filter(|_| sample_with(&mut rng, &p).should_fail)
            .count();
        assert!((2_500..3_500).contains(&failures), "got {failures} failures");
    }

    #[tokio::test]
    async fn zero_latency_does_not_sleep() {
        let start = std::time::Instant::now();
        Injection {
            latency_ms: 0,
            should_fail: false,
        }
        .apply_latency()
        .await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
