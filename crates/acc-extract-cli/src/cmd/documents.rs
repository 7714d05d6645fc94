//! Documents subcommand - enrich Data Extract urns with document metadata

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use acc_extract_core::{ProgressContext, install_signal_handlers};
use acc_extract_docs::{Credentials, InputSource, Summary};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct DocumentsArgs {
    /// Input table as FILE:PROJECT_COLUMN:URN_COLUMN (repeatable; replaces configured inputs)
    #[arg(short, long = "input", value_parser = parse_input)]
    pub inputs: Vec<InputSource>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Documents per API call
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Give up on a call after this many rate-limit waits (default: never)
    #[arg(long)]
    pub max_rate_limit_retries: Option<u32>,
}

fn parse_input(s: &str) -> Result<InputSource, String> {
    InputSource::parse(s).map_err(|e| e.to_string())
}

/// Merge config file and flags into the pipeline config (flags win)
fn build_config(args: DocumentsArgs, config: &Config) -> acc_extract_docs::Config {
    let inputs = if args.inputs.is_empty() {
        config.input_sources()
    } else {
        args.inputs
    };

    acc_extract_docs::Config {
        credentials: Credentials {
            client_id: config.auth.client_id.clone().unwrap_or_default(),
            client_secret: config.auth.client_secret.clone().unwrap_or_default(),
            scopes: config.auth.scopes.clone(),
        },
        base_url: config.api.base_url.clone(),
        token_path: config.auth.token_path.clone(),
        inputs,
        output_dir: args.output.unwrap_or_else(|| config.output.dir.clone()),
        chunk_size: args.chunk_size.unwrap_or(config.fetch.chunk_size),
        max_rate_limit_retries: args
            .max_rate_limit_retries
            .or(config.api.max_rate_limit_retries),
        request_timeout: Duration::from_secs(config.api.request_timeout_secs),
    }
}

pub fn run(args: DocumentsArgs, config: &Config, progress: &ProgressContext) -> Result<ExitCode> {
    let docs_config = build_config(args, config);

    log::info!("Extracting document metadata");
    log::info!("  Output: {}", docs_config.output_dir.display());
    for input in &docs_config.inputs {
        log::info!(
            "  Input: {} ({} / {})",
            input.file.display(),
            input.project_column,
            input.urn_column
        );
    }

    install_signal_handlers().context("Failed to install signal handlers")?;

    let summary = acc_extract_docs::run(&docs_config, progress)?;
    Ok(ExitCode::from(exit_status(&summary)))
}

/// 130 for an interrupted run; failed chunks alone still count as success
fn exit_status(summary: &Summary) -> u8 {
    if summary.interrupted {
        log::warn!("Shutdown requested, partial output written");
        return 130;
    }
    0
}
