use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};

use super::ProxyError;
use crate::models::Endpoint;

const ALLOWED_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

#[derive(Debug, Clone)]
pub struct ProxyTarget {
    pub url: Url,
    /// The URL exactly as configured, before parsing normalizes it.
    pub configured_url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl ProxyTarget {
    pub fn get(raw_url: &str) -> Result<Self, ProxyError> {
        Ok(Self {
            url: parse_url(raw_url)?,
            configured_url: raw_url.to_string(),
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        })
    }

    pub fn from_endpoint(endpoint: &Endpoint) -> Result<Self, ProxyError> {
        let url = parse_url(&endpoint.url)?;
        let method = parse_method(&endpoint.method)?;
        let headers = match &endpoint.headers {
            Some(headers) => parse_headers(headers)?,
            None => HeaderMap::new(),
        };
        let body = if carries_body(&method) {
            endpoint.body.clone()
        } else {
            None
        };

        Ok(Self {
            url,
            configured_url: endpoint.url.clone(),
            method,
            headers,
            body,
        })
    }
}

/// Accept only absolute http(s) URLs with a host.
pub fn parse_url(raw: &str) -> Result<Url, ProxyError> {
    let invalid =
        || ProxyError::InvalidArgument("Invalid URL format. Must be http:// or https://".to_string());

    let url = Url::parse(raw).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none_or(str::is_empty) {
        return Err(invalid());
    }
    Ok(url)
}

pub fn parse_method(raw: &str) -> Result<Method, ProxyError> {
    let upper = raw.trim().to_ascii_uppercase();
    if !ALLOWED_METHODS.contains(&upper.as_str()) {
        return Err(ProxyError::InvalidArgument(format!(
            "Unsupported method '{raw}'. Expected one of {}",
            ALLOWED_METHODS.join(", ")
        )));
    }
    Method::from_bytes(upper.as_bytes())
        .map_err(|e| ProxyError::InvalidArgument(format!("Invalid method '{raw}': {e}")))
}

pub fn parse_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ProxyError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ProxyError::InvalidArgument(format!("Invalid header name '{name}'")))?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            ProxyError::InvalidArgument(format!("Invalid value for header '{name}'"))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

pub fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}
