//! Two-legged OAuth: client credentials for a bearer token, fetched once per run

use serde::Deserialize;

use acc_extract_core::{ApiError, ApiRequest, Transport};

use crate::config::Credentials;
use crate::error::AuthError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Bearer token; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Owns the credentials and the token cache.
///
/// The token is requested lazily on first use and kept for the rest of the
/// process. There is no expiry tracking: a run longer than the token lifetime
/// will start failing with 401s.
#[derive(Debug)]
pub struct CredentialProvider {
    credentials: Credentials,
    token_url: String,
    token: Option<AccessToken>,
}

impl CredentialProvider {
    pub fn new(credentials: Credentials, token_url: impl Into<String>) -> Self {
        Self {
            credentials,
            token_url: token_url.into(),
            token: None,
        }
    }

    /// Cached token, exchanging credentials on first call
    pub fn token(&mut self, transport: &dyn Transport) -> Result<&AccessToken, AuthError> {
        match self.token {
            Some(ref token) => Ok(token),
            None => {
                log::debug!("Requesting access token");
                let token = self.exchange(transport)?;
                log::info!("Authenticated as {}", self.credentials.client_id);
                Ok(self.token.insert(token))
            }
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn exchange(&self, transport: &dyn Transport) -> Result<AccessToken, AuthError> {
        let request = ApiRequest::post(&self.token_url, FORM_CONTENT_TYPE, self.form_body());
        let resp = transport.execute(&request).map_err(AuthError::Transport)?;
        if !resp.is_success() {
            return Err(AuthError::Rejected(ApiError::from_response(&resp)));
        }
        let parsed: TokenResponse =
            serde_json::from_str(&resp.body).map_err(|e| AuthError::Malformed(e.to_string()))?;
        if parsed.access_token.is_empty() {
            return Err(AuthError::Malformed("empty access_token".to_string()));
        }
        Ok(AccessToken(parsed.access_token))
    }

    /// Form body; scopes joined with a literal `%20`
    fn form_body(&self) -> String {
        let mut form = url::form_urlencoded::Serializer::new(String::new());
        form.append_pair("client_id", &self.credentials.client_id)
            .append_pair("client_secret", &self.credentials.client_secret)
            .append_pair("grant_type", "client_credentials");
        let mut body = form.finish();
        if !self.credentials.scopes.is_empty() {
            body.push_str("&scope=");
            body.push_str(&self.credentials.scopes.join("%20"));
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use acc_extract_core::ApiResponse;

    use super::*;

    struct TokenEndpoint {
        status: u16,
        body: &'static str,
        calls: RefCell<Vec<ApiRequest>>,
    }

    impl TokenEndpoint {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for TokenEndpoint {
        fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
            self.calls.borrow_mut().push(request.clone());
            Ok(ApiResponse {
                status: self.status,
                headers: Vec::new(),
                body: self.body.to_string(),
            })
        }
    }

    fn provider() -> CredentialProvider {
        CredentialProvider::new(
            Credentials {
                client_id: "my id".to_string(),
                client_secret: "s&cret".to_string(),
                scopes: vec!["data:read".to_string(), "account:read".to_string()],
            },
            "https://api.test/authentication/v2/token",
        )
    }

    #[test]
    fn token_fetched_once_and_cached() {
        let endpoint = TokenEndpoint::new(200, r#"{"access_token":"tok","expires_in":3599}"#);
        let mut provider = provider();
        assert!(!provider.has_token());
        assert_eq!(provider.token(&endpoint).unwrap().as_str(), "tok");
        assert_eq!(provider.token(&endpoint).unwrap().as_str(), "tok");
        assert_eq!(endpoint.calls.borrow().len(), 1);
    }

    #[test]
    fn form_body_joins_scopes_with_literal_percent20() {
        let endpoint = TokenEndpoint::new(200, r#"{"access_token":"tok"}"#);
        provider().token(&endpoint).unwrap();
        let calls = endpoint.calls.borrow();
        let body = calls[0].body.as_ref().unwrap();
        assert_eq!(body.content_type, FORM_CONTENT_TYPE);
        assert_eq!(
            body.data,
            "client_id=my+id&client_secret=s%26cret&grant_type=client_credentials&scope=data:read%20account:read"
        );
        assert_eq!(calls[0].url, "https://api.test/authentication/v2/token");
    }

    #[test]
    fn non_2xx_is_rejected() {
        let endpoint = TokenEndpoint::new(401, r#"{"developerMessage":"bad client"}"#);
        let err = provider().token(&endpoint).unwrap_err();
        assert!(matches!(err, AuthError::Rejected(_)));
        assert!(format!("{err}").contains("bad client"));
    }

    #[test]
    fn malformed_body() {
        let endpoint = TokenEndpoint::new(200, "<html>");
        assert!(matches!(
            provider().token(&endpoint).unwrap_err(),
            AuthError::Malformed(_)
        ));
        let endpoint = TokenEndpoint::new(200, r#"{"access_token":""}"#);
        assert!(matches!(
            provider().token(&endpoint).unwrap_err(),
            AuthError::Malformed(_)
        ));
    }

    #[test]
    fn token_not_in_debug() {
        assert_eq!(format!("{:?}", AccessToken("secret".to_string())), "AccessToken(***)");
    }
}
