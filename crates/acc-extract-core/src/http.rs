//! HTTP transport over a shared tokio runtime.
//!
//! Uses async reqwest internally but presents a sync interface: the
//! extraction pipeline is strictly sequential, one call in flight at a time.

use std::sync::LazyLock;
use std::time::Duration;

use crate::error::ApiError;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
        }
    }
}

/// Request payload with its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub content_type: String,
    pub data: String,
}

/// Fully resolved request: absolute URL, headers, optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl ApiRequest {
    pub fn post(url: impl Into<String>, content_type: &str, data: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(Body {
                content_type: content_type.to_string(),
                data: data.into(),
            }),
        }
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Response as seen by the pipeline: status, headers, text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Executes one HTTP exchange.
///
/// Any response that arrives is `Ok`, whatever its status; only failures to
/// get a response at all are errors. Status handling belongs to the caller.
pub trait Transport {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Production transport backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(request_timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .pool_max_idle_per_host(2)
            .build()
            .map_err(ApiError::from_reqwest)?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        SHARED_RUNTIME.handle().block_on(async {
            let mut builder = self
                .client
                .request(request.method.as_reqwest(), &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                builder = builder
                    .header(reqwest::header::CONTENT_TYPE, body.content_type.as_str())
                    .body(body.data.clone());
            }

            let response = builder.send().await.map_err(ApiError::from_reqwest)?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| {
                    v.to_str()
                        .ok()
                        .map(|v| (k.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.text().await.map_err(ApiError::from_reqwest)?;

            Ok(ApiResponse {
                status,
                headers,
                body,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let resp = ApiResponse {
            status: 429,
            headers: vec![("Retry-After".to_string(), "5".to_string())],
            body: String::new(),
        };
        assert_eq!(resp.header("retry-after"), Some("5"));
        assert_eq!(resp.header("x-missing"), None);
    }

    #[test]
    fn success_range() {
        let mut resp = ApiResponse {
            status: 200,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(resp.is_success());
        resp.status = 204;
        assert!(resp.is_success());
        resp.status = 302;
        assert!(!resp.is_success());
        resp.status = 429;
        assert!(!resp.is_success());
    }

    #[test]
    fn post_builder_sets_body() {
        let req = ApiRequest::post("https://example.com/x", "application/json", "{}");
        assert_eq!(req.method, Method::Post);
        let body = req.body.as_ref().unwrap();
        assert_eq!(body.content_type, "application/json");
        assert_eq!(body.data, "{}");
        assert!(req.header("authorization").is_none());
    }
}
