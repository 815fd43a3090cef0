use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::{ProxyError, ProxyTarget};
use crate::chaos::{ChaosParams, FaultInjector, Injection};
use crate::db::Directory;

/// `content` is JSON when the downstream body parses, text otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub content: Value,
}

/// No retries: one failed attempt is one reported error.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    injector: FaultInjector,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            injector: FaultInjector::new(),
            timeout,
        })
    }

    /// Stored mode: resolve the endpoint for the requesting principal and run it.
    pub async fn forward(
        &self,
        directory: &dyn Directory,
        endpoint_id: Uuid,
        requester: Option<Uuid>,
    ) -> Result<ProxyResponse, ProxyError> {
        let owner_id = requester.ok_or(ProxyError::Unauthorized)?;
        let endpoint = directory
            .get_endpoint(endpoint_id, owner_id)
            .await?
            .ok_or(ProxyError::NotFound)?;

        let chaos = endpoint.chaos()?;
        let target = ProxyTarget::from_endpoint(&endpoint)?;

        self.execute(&target, &chaos, endpoint.sandbox).await
    }

    pub async fn execute(
        &self,
        target: &ProxyTarget,
        chaos: &ChaosParams,
        sandbox: bool,
    ) -> Result<ProxyResponse, ProxyError> {
        let injection = self.injector.sample(chaos);
        tracing::debug!(
            url = %target.url,
            latency_ms = injection.latency_ms,
            should_fail = injection.should_fail,
            sandbox,
            "Chaos sampled"
        );

        injection.apply_latency().await;

        if injection.should_fail {
            tracing::debug!(url = %target.url, "Injecting simulated failure");
            return Err(ProxyError::SimulatedFailure);
        }

        if sandbox {
            return Ok(sandbox_response(target, chaos, &injection));
        }

        self.send(target).await
    }

    async fn send(&self, target: &ProxyTarget) -> Result<ProxyResponse, ProxyError> {
        let mut req = self
            .client
            .request(target.method.clone(), target.url.clone())
            .headers(target.headers.clone())
            .timeout(self.timeout);

        if let Some(body) = &target.body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| self.translate(target, e))?;

        let status_code = resp.status().as_u16();
        let headers = flatten_headers(resp.headers());
        let text = resp.text().await.map_err(|e| self.translate(target, e))?;
        let content = serde_json::from_str(&text).unwrap_or(Value::String(text));

        tracing::debug!(url = %target.url, status_code, "Downstream responded");

        Ok(ProxyResponse {
            status_code,
            headers,
            content,
        })
    }

    fn translate(&self, target: &ProxyTarget, err: reqwest::Error) -> ProxyError {
        if err.is_timeout() {
            tracing::warn!(url = %target.url, "Downstream timed out");
            ProxyError::GatewayTimeout(self.timeout)
        } else {
            tracing::warn!(url = %target.url, "Downstream request failed: {err}");
            ProxyError::BadGateway(err.to_string())
        }
    }
}

fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    out
}

fn sandbox_response(target: &ProxyTarget, chaos: &ChaosParams, injection: &Injection) -> ProxyResponse {
    ProxyResponse {
        status_code: 200,
        headers: BTreeMap::from([("content-type".to_string(), "application/json".to_string())]),
        content: json!({
            "message": "Sandbox mode enabled",
            "url": target.configured_url,
            "method": target.method.as_str(),
            "latency": {
                "min": chaos.min_latency(),
                "max": chaos.max_latency(),
                "actual": injection.latency_ms,
            },
            "fail_rate": chaos.fail_rate(),
            "timestamp": Utc::now().to_rfc3339(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;
    use crate::chaos::FailRate;

    #[test]
    fn repeated_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));

        let flat = flatten_headers(&headers);
        assert_eq!(flat["set-cookie"], "a=1, b=2");
        assert_eq!(flat["content-type"], "text/plain");
    }

    #[tokio::test]
    async fn sandbox_never_touches_the_network() {
        // Port 9 (discard) on a reserved TEST-NET address: a real send would fail.
        let target = ProxyTarget::get("http://192.0.2.1:9/unused").unwrap();
        let chaos = ChaosParams::new(0, 0, FailRate::Percent(0)).unwrap();
        let forwarder = Forwarder::new(Duration::from_millis(200)).unwrap();

        let resp = forwarder.execute(&target, &chaos, true).await.unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.content["url"], "http://192.0.2.1:9/unused");
        assert_eq!(resp.content["latency"]["actual"], 0);
        assert_eq!(resp.content["fail_rate"], 0);
    }

    #[tokio::test]
    async fn certain_failure_short_circuits_before_sandbox() {
        let target = ProxyTarget::get("http://192.0.2.1:9/").unwrap();
        let chaos = ChaosParams::new(0, 0, FailRate::Fraction(1.0)).unwrap();
        let forwarder = Forwarder::new(Duration::from_millis(200)).unwrap();

        let err = forwarder.execute(&target, &chaos, true).await.unwrap_err();
        assert!(matches!(err, ProxyError::SimulatedFailure));
    }

    async fn stored_sandbox_endpoint(
        dir: &crate::db::MemoryDirectory,
        owner: Uuid,
        url: &str,
    ) -> Uuid {
        use crate::models::EndpointFields;

        let collection = dir.create_collection(owner, "c", None).await.unwrap();
        let fields = EndpointFields {
            name: "sandboxed".to_string(),
            url: url.to_string(),
            method: "GET".to_string(),
            headers: None,
            body: None,
            fail_rate: 0,
            min_latency: 0,
            max_latency: 0,
            sandbox: true,
        };
        dir.create_endpoint(collection.id, owner, &fields)
            .await
            .unwrap()
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn stored_mode_needs_a_requester() {
        let dir = crate::db::MemoryDirectory::new();
        let owner = Uuid::now_v7();
        let id = stored_sandbox_endpoint(&dir, owner, "http://192.0.2.1:9/stored").await;
        let forwarder = Forwarder::new(Duration::from_millis(200)).unwrap();

        let err = forwarder.forward(&dir, id, None).await.unwrap_err();
        assert!(matches!(err, ProxyError::Unauthorized));
    }

    #[tokio::test]
    async fn stored_mode_hides_foreign_endpoints() {
        let dir = crate::db::MemoryDirectory::new();
        let owner = Uuid::now_v7();
        let id = stored_sandbox_endpoint(&dir, owner, "http://192.0.2.1:9/stored").await;
        let forwarder = Forwarder::new(Duration::from_millis(200)).unwrap();

        let foreign = forwarder.forward(&dir, id, Some(Uuid::now_v7())).await.unwrap_err();
        let missing = forwarder
            .forward(&dir, Uuid::now_v7(), Some(owner))
            .await
            .unwrap_err();
        assert_eq!(foreign.to_string(), missing.to_string());
        assert!(matches!(foreign, ProxyError::NotFound));

        let resp = forwarder.forward(&dir, id, Some(owner)).await.unwrap();
        assert_eq!(resp.content["url"], "http://192.0.2.1:9/stored");
        assert_eq!(resp.content["fail_rate"], 0);
    }

    #[tokio::test]
    async fn sandbox_echoes_url_exactly_as_stored() {
        let dir = crate::db::MemoryDirectory::new();
        let owner = Uuid::now_v7();
        let forwarder = Forwarder::new(Duration::from_millis(200)).unwrap();

        for url in ["https://example.com", "HTTPS://Example.COM/Path"] {
            let id = stored_sandbox_endpoint(&dir, owner, url).await;
            let resp = forwarder.forward(&dir, id, Some(owner)).await.unwrap();
            assert_eq!(resp.content["url"], url);
        }
    }
}
