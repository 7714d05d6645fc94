//! acc-extract docs - document metadata pipeline
//!
//! Reads document urns from Data Extract tables, fetches item and version
//! details from the platform API in rate-limited batches, and writes the
//! enriched documents back out as tables.
//!
//! # Example
//!
//! ```ignore
//! use acc_extract_docs::{Config, run};
//!
//! let config = Config {
//!     output_dir: "output".into(),
//!     ..Default::default()
//! };
//!
//! let summary = run(&config, &progress)?;
//! println!("Wrote {} documents", summary.output.documents);
//! ```

pub mod accumulator;
pub mod api;
pub mod auth;
pub mod collect;
pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod runner;
pub mod schema;
pub mod stats;

// Re-exports
pub use accumulator::DocumentAccumulator;
pub use api::{ApiClient, RequestSpec};
pub use auth::{AccessToken, CredentialProvider};
pub use collect::{IdentifierRecord, ProjectGroups, collect_identifiers};
pub use config::{Config, Credentials, InputSource};
pub use error::{AuthError, FetchError};
pub use fetch::{BatchFetcher, FetchOutput};
pub use runner::{run, run_with_transport};
pub use schema::{EnrichedDocument, ItemRecord, VersionDetail};
pub use stats::{FetchStats, Summary};
