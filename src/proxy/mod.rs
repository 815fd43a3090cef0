pub mod error;
pub mod forward;
pub mod target;

pub use error::ProxyError;
pub use forward::{Forwarder, ProxyResponse};
pub use target::ProxyTarget;

use crate::chaos::{ChaosParams, FailRate};

/// A validated ad-hoc proxy request. Always issued as GET.
#[derive(Debug, Clone)]
pub struct AdHocRequest {
    pub target: ProxyTarget,
    pub chaos: ChaosParams,
    pub sandbox: bool,
}

impl AdHocRequest {
    pub fn new(
        url: &str,
        min_latency: i64,
        max_latency: i64,
        fail_rate: f64,
        sandbox: bool,
    ) -> Result<Self, ProxyError> {
        let target = ProxyTarget::get(url)?;
        let fail_rate = FailRate::from_fraction(fail_rate)?;
        let chaos = ChaosParams::new(min_latency, max_latency, fail_rate)?;

        Ok(Self {
            target,
            chaos,
            sandbox,
        })
    }
}

impl Forwarder {
    pub async fn forward_adhoc(&self, request: &AdHocRequest) -> Result<ProxyResponse, ProxyError> {
        self.execute(&request.target, &request.chaos, request.sandbox)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adhoc_validates_before_anything_else() {
        assert!(matches!(
            AdHocRequest::new("not a url", 0, 0, 0.0, false),
            Err(ProxyError::InvalidArgument(_))
        ));
        assert!(matches!(
            AdHocRequest::new("https://example.com", 0, 0, 1.5, false),
            Err(ProxyError::InvalidArgument(_))
        ));
        assert!(matches!(
            AdHocRequest::new("https://example.com", 200, 100, 0.0, false),
            Err(ProxyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn adhoc_is_always_get() {
        let req = AdHocRequest::new("https://example.com/a", 10, 20, 0.5, true).unwrap();
        assert_eq!(req.target.method, reqwest::Method::GET);
        assert_eq!(req.chaos.fail_rate(), FailRate::Fraction(0.5));
        assert!(req.sandbox);
    }
}
