//! Documents pipeline configuration

use std::path::PathBuf;
use std::time::Duration;

use acc_extract_core::RetryPolicy;

/// Platform API root
pub const DEFAULT_BASE_URL: &str = "https://developer.api.autodesk.com";

/// Two-legged OAuth token endpoint, relative to the base URL
pub const DEFAULT_TOKEN_PATH: &str = "authentication/v2/token";

/// Most urns the batch endpoints accept per request
pub const DEFAULT_CHUNK_SIZE: usize = 50;

pub const DEFAULT_SCOPES: &[&str] = &["data:read", "account:read"];

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Input table declaring which columns carry the project id and the urn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSource {
    pub file: PathBuf,
    pub project_column: String,
    pub urn_column: String,
}

impl InputSource {
    pub fn new(file: impl Into<PathBuf>, project_column: &str, urn_column: &str) -> Self {
        Self {
            file: file.into(),
            project_column: project_column.to_string(),
            urn_column: urn_column.to_string(),
        }
    }

    /// Parse `file:project_column:urn_column`.
    ///
    /// Splits from the right so a path containing `:` still works.
    pub fn parse(spec: &str) -> anyhow::Result<Self> {
        let mut parts = spec.rsplitn(3, ':');
        let (Some(urn), Some(project), Some(file)) = (parts.next(), parts.next(), parts.next())
        else {
            anyhow::bail!("Invalid input '{spec}', expected file:project_column:urn_column");
        };
        anyhow::ensure!(
            !file.is_empty() && !project.is_empty() && !urn.is_empty(),
            "Invalid input '{spec}', empty file or column name"
        );
        Ok(Self::new(file, project, urn))
    }

    /// Data Extract tables that reference documents
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("issues_issues.csv", "bim360_project_id", "linked_document_urn"),
            Self::new(
                "reviews_review_documents.csv",
                "bim360_project_id",
                "lineage_urn",
            ),
        ]
    }
}

/// App credentials for the client-credentials grant
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Runtime configuration for the documents pipeline
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// API root every request path is joined to
    pub base_url: String,
    pub token_path: String,
    pub inputs: Vec<InputSource>,
    /// Directory receiving the output tables
    pub output_dir: PathBuf,
    pub chunk_size: usize,
    /// `None` keeps retrying rate-limited calls for as long as the server asks
    pub max_rate_limit_retries: Option<u32>,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            inputs: InputSource::defaults(),
            output_dir: PathBuf::from("."),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_rate_limit_retries: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Config {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_rate_limit_retries: self.max_rate_limit_retries,
        }
    }

    /// Check values that would only fail later, mid-run
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.chunk_size > 0, "chunk_size must be at least 1");
        anyhow::ensure!(!self.inputs.is_empty(), "No input tables configured");
        anyhow::ensure!(
            !self.credentials.client_id.is_empty(),
            "Client id missing (set APS_CLIENT_ID or [auth].client_id)"
        );
        anyhow::ensure!(
            !self.credentials.client_secret.is_empty(),
            "Client secret missing (set APS_CLIENT_SECRET or [auth].client_secret)"
        );
        Ok(())
    }
}
