//! acc-extract - document metadata for Data Extract tables
//!
//! Reads document urns from ACC / BIM 360 Data Extract exports, fetches item
//! and version details from the platform API, and writes them as CSV tables.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "acc-extract")]
#[command(about = "Document metadata for ACC / BIM 360 Data Extract tables")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file path (default: ./acc-extract.toml or ~/.config/acc-extract/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch document details for every urn in the input tables
    Documents(cmd::documents::DocumentsArgs),
    /// Show current configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = acc_extract_core::ProgressContext::new();

    // Logging:
    //   TTY:     quiet (warn) unless --debug, progress bars show activity
    //   non-TTY: info unless --quiet/--debug, logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = cli.quiet || (is_tty && !cli.debug);
    acc_extract_core::init_logging(quiet, cli.debug, multi);

    match run(cli, &progress) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, progress: &acc_extract_core::ProgressContext) -> Result<ExitCode> {
    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Documents(args) => cmd::documents::run(args, &config, progress),
        Command::Config => {
            print_config(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_config(config: &Config) {
    use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    let configured = |value: &Option<String>| {
        if value.as_deref().is_some_and(|v| !v.is_empty()) {
            "configured"
        } else {
            "not set"
        }
    };

    table.add_row(vec!["Client id", configured(&config.auth.client_id)]);
    table.add_row(vec!["Client secret", configured(&config.auth.client_secret)]);
    table.add_row(vec!["Scopes", &config.auth.scopes.join(" ")]);
    table.add_row(vec!["Token path", &config.auth.token_path]);
    table.add_row(vec!["API base URL", &config.api.base_url]);
    table.add_row(vec![
        "Request timeout",
        &format!("{}s", config.api.request_timeout_secs),
    ]);
    table.add_row(vec![
        "Max rate-limit retries",
        &config
            .api
            .max_rate_limit_retries
            .map_or_else(|| "unlimited".to_string(), |n| n.to_string()),
    ]);
    table.add_row(vec!["Chunk size", &config.fetch.chunk_size.to_string()]);
    table.add_row(vec![
        "Output directory",
        &config.output.dir.display().to_string(),
    ]);
    for input in config.input_sources() {
        table.add_row(vec![
            "Input".to_string(),
            format!(
                "{} ({} / {})",
                input.file.display(),
                input.project_column,
                input.urn_column
            ),
        ]);
    }

    eprintln!("\n{table}");
}
