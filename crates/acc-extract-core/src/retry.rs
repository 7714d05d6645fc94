//! Retry loop honoring the server's `retry-after` on HTTP 429

use std::time::Duration;

use crate::error::ApiError;
use crate::http::{ApiRequest, ApiResponse, Transport};

/// Extra wait on top of the advertised `retry-after`
pub const RATE_LIMIT_PADDING: Duration = Duration::from_secs(1);

const TOO_MANY_REQUESTS: u16 = 429;

/// How far the rate-limit loop may go.
///
/// `max_rate_limit_retries = None` retries for as long as the server keeps
/// advertising a wait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_rate_limit_retries: Option<u32>,
}

/// Parse `retry-after` as delta-seconds. HTTP-date and garbage yield `None`.
pub fn parse_retry_after(resp: &ApiResponse) -> Option<Duration> {
    resp.header("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Send `request`, sleeping and resending the identical request on each 429
/// that carries `retry-after`.
///
/// Returns the first 2xx response unchanged. Network errors, other non-2xx
/// statuses and 429 without `retry-after` are returned without retry.
pub fn send_with_retry_after(
    transport: &dyn Transport,
    request: &ApiRequest,
    policy: RetryPolicy,
    sleep: &dyn Fn(Duration),
) -> Result<ApiResponse, ApiError> {
    let mut retries = 0u32;
    loop {
        let resp = transport.execute(request)?;
        if resp.is_success() {
            return Ok(resp);
        }

        let wait = match parse_retry_after(&resp) {
            Some(wait) if resp.status == TOO_MANY_REQUESTS => wait,
            _ => return Err(ApiError::from_response(&resp)),
        };
        if policy.max_rate_limit_retries.is_some_and(|max| retries >= max) {
            log::error!("Rate limit: giving up after {retries} retries");
            return Err(ApiError::RateLimitExhausted { retries });
        }

        retries += 1;
        let delay = wait.saturating_add(RATE_LIMIT_PADDING);
        log::warn!(
            "Rate limit hit, waiting {}s before retry {retries}",
            delay.as_secs()
        );
        sleep(delay);
    }
}
