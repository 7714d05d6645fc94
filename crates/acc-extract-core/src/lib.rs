//! acc-extract core - shared infrastructure for platform extraction pipelines
//!
//! This crate provides the pieces every extraction pipeline needs:
//! HTTP transport over a shared runtime, the retry-after loop,
//! CSV output sinks, logging and progress reporting.

pub mod error;
pub mod http;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod shutdown;
pub mod sink;

// Re-exports for convenience
pub use error::ApiError;
pub use http::{ApiRequest, ApiResponse, Body, Method, ReqwestTransport, SHARED_RUNTIME, Transport};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, fmt_num};
pub use retry::{RATE_LIMIT_PADDING, RetryPolicy, parse_retry_after, send_with_retry_after};
pub use shutdown::{install_signal_handlers, is_shutdown_requested};
pub use sink::{CsvSink, cleanup_tmp_files};
