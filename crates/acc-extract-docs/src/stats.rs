//! Run statistics and the final summary.
//!
//! - Fetch-level: [`FetchStats`], filled in by the batch fetcher
//! - Run-level: [`Summary`], printed as a table on a TTY and logged otherwise

use std::time::Duration;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use acc_extract_core::fmt_num;

use crate::output::OutputSummary;

/// Counters from the fetch phase
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchStats {
    /// Projects with at least one urn
    pub projects: usize,
    /// Projects seen in the input without any urn
    pub projects_skipped: usize,
    pub chunks: usize,
    /// Chunks whose documents are missing from the output
    pub chunks_failed: usize,
    pub documents: usize,
    /// Documents joined without version details
    pub without_version: usize,
    pub rate_limit_waits: u32,
}

/// Everything worth reporting about one run
#[derive(Debug, Default)]
pub struct Summary {
    pub urns_collected: usize,
    pub fetch: FetchStats,
    pub output: OutputSummary,
    pub elapsed: Duration,
    /// Stopped early on a shutdown request; output is partial
    pub interrupted: bool,
}

impl Summary {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let f = &self.fetch;
        vec![
            ("Unique URNs", fmt_num(self.urns_collected)),
            (
                "Projects",
                format!(
                    "{} ({} without documents)",
                    fmt_num(f.projects),
                    fmt_num(f.projects_skipped)
                ),
            ),
            (
                "Chunks",
                format!("{} ({} failed)", fmt_num(f.chunks), fmt_num(f.chunks_failed)),
            ),
            (
                "Documents",
                format!(
                    "{} ({} without version)",
                    fmt_num(f.documents),
                    fmt_num(f.without_version)
                ),
            ),
            ("Custom attributes", fmt_num(self.output.custom_attributes)),
            ("Rate-limit waits", f.rate_limit_waits.to_string()),
            ("Elapsed", format!("{:.1}s", self.elapsed.as_secs_f64())),
        ]
    }

    /// Print summary table on stderr (TTY mode)
    pub fn print(&self) {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Documents").fg(Color::Cyan),
                Cell::new("Value").fg(Color::Cyan),
            ]);
        for (label, value) in self.rows() {
            let cell = if label == "Chunks" && self.fetch.chunks_failed > 0 {
                Cell::new(value).fg(Color::Red)
            } else {
                Cell::new(value)
            };
            table.add_row(vec![Cell::new(label), cell]);
        }
        eprintln!("\n{table}");
    }

    /// Log summary lines (non-TTY mode)
    pub fn log(&self) {
        for (label, value) in self.rows() {
            log::info!("{label}: {value}");
        }
        if self.fetch.chunks_failed > 0 {
            log::warn!(
                "{} chunks failed; their documents are missing from the output",
                self.fetch.chunks_failed
            );
        }
    }
}
