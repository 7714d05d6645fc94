//! Main execution logic for the documents pipeline

use std::time::{Duration, Instant};

use anyhow::Context;
use acc_extract_core::{ProgressContext, ReqwestTransport, Transport, cleanup_tmp_files};

use crate::api::ApiClient;
use crate::auth::CredentialProvider;
use crate::collect::collect_identifiers;
use crate::config::Config;
use crate::fetch::BatchFetcher;
use crate::output::write_outputs;
use crate::stats::Summary;

/// Run against the live API
pub fn run(config: &Config, progress: &ProgressContext) -> anyhow::Result<Summary> {
    config.validate()?;
    let transport =
        ReqwestTransport::new(config.request_timeout).context("Failed to build HTTP client")?;
    run_with_transport(config, Box::new(transport), std::thread::sleep, progress)
}

/// Collect, fetch, write.
///
/// Credential failures abort the run before anything is written. An
/// interrupted run still writes what it has and sets `interrupted`.
pub fn run_with_transport(
    config: &Config,
    transport: Box<dyn Transport>,
    sleep: impl Fn(Duration) + 'static,
    progress: &ProgressContext,
) -> anyhow::Result<Summary> {
    let start = Instant::now();
    log::info!(
        "acc-extract documents starting: inputs={}, chunk_size={}, output={}",
        config.inputs.len(),
        config.chunk_size,
        config.output_dir.display()
    );

    let groups = collect_identifiers(&config.inputs)?;

    std::fs::create_dir_all(&config.output_dir).context("Cannot create output directory")?;
    cleanup_tmp_files(&config.output_dir).context("Failed to clean stale tmp files")?;

    let token_url = format!(
        "{}/{}",
        config.base_url.trim_end_matches('/'),
        config.token_path.trim_start_matches('/')
    );
    let credentials = CredentialProvider::new(config.credentials.clone(), token_url);
    let mut client = ApiClient::new(
        transport,
        credentials,
        &config.base_url,
        config.retry_policy(),
    )
    .with_sleep(sleep);

    let fetched = BatchFetcher::new(&mut client, config.chunk_size, progress)
        .fetch_details(&groups)
        .context("Document fetch aborted")?;

    let output = write_outputs(&config.output_dir, &fetched.documents)
        .context("Failed to write output tables")?;

    let summary = Summary {
        urns_collected: groups.total_urns(),
        fetch: fetched.stats,
        output,
        elapsed: start.elapsed(),
        interrupted: fetched.interrupted,
    };
    if progress.is_tty() {
        summary.print();
    } else {
        summary.log();
    }

    if summary.interrupted {
        log::warn!("Interrupted, output is partial");
    } else {
        log::info!("acc-extract documents completed");
    }
    Ok(summary)
}
