//! Error types for credential exchange and chunk fetching

use acc_extract_core::ApiError;

/// Credential exchange failed. Fatal for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Token endpoint unreachable
    Transport(ApiError),
    /// Token endpoint answered with a non-2xx status
    Rejected(ApiError),
    /// 2xx answer without a usable `access_token`
    Malformed(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "token request failed: {e}"),
            Self::Rejected(e) => write!(f, "token request rejected: {e}"),
            Self::Malformed(msg) => write!(f, "malformed token response: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Error from one API call made on behalf of a chunk.
#[derive(Debug)]
pub enum FetchError {
    /// No token, so nothing else can succeed either
    Auth(AuthError),
    /// Network failure or non-2xx status
    Api(ApiError),
    /// Body is not JSON or not the expected shape
    Decode(String),
    /// 2xx body that only carries a JSON:API `errors` array
    Structured(Vec<String>),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(e) => write!(f, "{e}"),
            Self::Api(e) => write!(f, "{e}"),
            Self::Decode(msg) => write!(f, "unexpected response: {msg}"),
            Self::Structured(details) => write!(f, "API errors: {}", details.join("; ")),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Auth(e) => Some(e),
            Self::Api(e) => Some(e),
            Self::Decode(_) | Self::Structured(_) => None,
        }
    }
}

impl FetchError {
    /// Fatal errors abort the run; everything else only costs one chunk.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<AuthError> for FetchError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

impl From<ApiError> for FetchError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
