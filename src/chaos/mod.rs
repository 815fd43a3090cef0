pub mod injector;

use serde::Serialize;

use crate::proxy::ProxyError;

pub use injector::{FaultInjector, Injection, sample_with};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FailRate {
    /// Integer percent, 0..=100.
    Percent(u8),
    /// Probability, 0.0..=1.0.
    Fraction(f64),
}

impl FailRate {
    pub fn from_percent(value: i64) -> Result<Self, ProxyError> {
        match u8::try_from(value) {
            Ok(percent) if percent <= 100 => Ok(FailRate::Percent(percent)),
            _ => Err(ProxyError::InvalidArgument(
                "fail_rate must be between 0 and 100".to_string(),
            )),
        }
    }

    pub fn from_fraction(value: f64) -> Result<Self, ProxyError> {
        // NaN fails the range check
        if (0.0..=1.0).contains(&value) {
            Ok(FailRate::Fraction(value))
        } else {
            Err(ProxyError::InvalidArgument(
                "fail_rate must be between 0.0 and 1.0".to_string(),
            ))
        }
    }

    pub fn probability(&self) -> f64 {
        match *self {
            FailRate::Percent(percent) => f64::from(percent) / 100.0,
            FailRate::Fraction(fraction) => fraction,
        }
    }
}

impl Default for FailRate {
    fn default() -> Self {
        FailRate::Percent(0)
    }
}

/// Only constructible through `new`, which enforces `0 <= min <= max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaosParams {
    min_latency: u64,
    max_latency: u64,
    fail_rate: FailRate,
}

impl ChaosParams {
    pub fn new(min_latency: i64, max_latency: i64, fail_rate: FailRate) -> Result<Self, ProxyError> {
        if min_latency < 0 || max_latency < 0 {
            return Err(ProxyError::InvalidArgument(
                "Latency values must be non-negative".to_string(),
            ));
        }
        if min_latency > max_latency {
            return Err(ProxyError::InvalidArgument(
                "min_latency must be less than or equal to max_latency".to_string(),
            ));
        }

        Ok(Self {
            min_latency: min_latency.unsigned_abs(),
            max_latency: max_latency.unsigned_abs(),
            fail_rate,
        })
    }

    pub fn min_latency(&self) -> u64 {
        self.min_latency
    }

    pub fn max_latency(&self) -> u64 {
        self.max_latency
    }

    pub fn fail_rate(&self) -> FailRate {
        self.fail_rate
    }
}
