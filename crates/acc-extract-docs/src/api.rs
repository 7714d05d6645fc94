//! Rate-limited platform API client and the two batch operations

use std::cell::Cell;
use std::time::Duration;

use serde_json::{Value, json};

use acc_extract_core::{ApiRequest, Body, Method, RetryPolicy, Transport, send_with_retry_after};

use crate::auth::CredentialProvider;
use crate::error::FetchError;

const JSON_CONTENT_TYPE: &str = "application/json";
const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

/// Request relative to the API base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl RequestSpec {
    pub fn post_json(path: impl Into<String>, content_type: &str, body: &Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            headers: Vec::new(),
            body: Some(Body {
                content_type: content_type.to_string(),
                data: body.to_string(),
            }),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Sequential API client: bearer auth, base URL, retry-after handling.
///
/// One call at a time; the credential provider's token is shared by all calls.
pub struct ApiClient {
    transport: Box<dyn Transport>,
    credentials: CredentialProvider,
    base_url: String,
    policy: RetryPolicy,
    sleep: Box<dyn Fn(Duration)>,
    rate_limit_waits: Cell<u32>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("policy", &self.policy)
            .field("rate_limit_waits", &self.rate_limit_waits.get())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        transport: Box<dyn Transport>,
        credentials: CredentialProvider,
        base_url: &str,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
            sleep: Box::new(std::thread::sleep),
            rate_limit_waits: Cell::new(0),
        }
    }

    /// Replace the rate-limit sleep (tests observe waits instead of taking them)
    pub fn with_sleep(mut self, sleep: impl Fn(Duration) + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    /// Number of rate-limit waits taken so far
    pub fn rate_limit_waits(&self) -> u32 {
        self.rate_limit_waits.get()
    }

    /// Execute `spec` and parse the 2xx body as JSON.
    ///
    /// An explicit `Authorization` header is sent as is; otherwise the cached
    /// bearer token is attached, fetching it first if needed.
    pub fn call(&mut self, spec: &RequestSpec) -> Result<Value, FetchError> {
        let mut headers = spec.headers.clone();
        let has_auth = headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("authorization"));
        if !has_auth {
            let token = self.credentials.token(self.transport.as_ref())?;
            headers.push((
                "Authorization".to_string(),
                format!("Bearer {}", token.as_str()),
            ));
        }

        let request = ApiRequest {
            method: spec.method,
            url: self.url(&spec.path),
            headers,
            body: spec.body.clone(),
        };

        let waits = &self.rate_limit_waits;
        let sleep = &self.sleep;
        let resp = send_with_retry_after(self.transport.as_ref(), &request, self.policy, &|d| {
            waits.set(waits.get() + 1);
            sleep(d);
        })?;

        if resp.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&resp.body)?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Data Management addresses projects with a `b.` prefix; Docs does not
fn dm_project_id(project_id: &str) -> String {
    if project_id.starts_with("b.") {
        project_id.to_string()
    } else {
        format!("b.{project_id}")
    }
}

fn docs_project_id(project_id: &str) -> &str {
    project_id.strip_prefix("b.").unwrap_or(project_id)
}

/// ListItems command naming every urn of the chunk
pub fn list_items_request(project_id: &str, urns: &[String]) -> RequestSpec {
    let resources: Vec<Value> = urns
        .iter()
        .map(|urn| json!({ "type": "items", "id": urn }))
        .collect();
    let body = json!({
        "jsonapi": { "version": "1.0" },
        "data": {
            "type": "commands",
            "attributes": {
                "extension": {
                    "type": "commands:autodesk.core:ListItems",
                    "version": "1.1.0",
                    "data": { "includePathInProject": true }
                }
            },
            "relationships": {
                "resources": { "data": resources }
            }
        }
    });
    RequestSpec::post_json(
        format!("data/v1/projects/{}/commands", dm_project_id(project_id)),
        JSON_API_CONTENT_TYPE,
        &body,
    )
}

/// Latest version details for the same urns
pub fn batch_get_versions_request(project_id: &str, urns: &[String]) -> RequestSpec {
    RequestSpec::post_json(
        format!(
            "bim360/docs/v1/projects/{}/versions:batch-get",
            docs_project_id(project_id)
        ),
        JSON_CONTENT_TYPE,
        &json!({ "urns": urns }),
    )
}
