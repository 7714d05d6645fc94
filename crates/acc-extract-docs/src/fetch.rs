//! Batch fetching: per project, per chunk, listing + version details + join.
//!
//! Processing is strictly sequential (project order, then chunk order, one
//! call in flight) because every call draws on the same per-minute quota.
//! A failed chunk is logged and skipped; only credential failures abort.

use rustc_hash::FxHashMap;
use serde_json::Value;

use acc_extract_core::progress::{ProgressContext, fmt_num};
use acc_extract_core::is_shutdown_requested;

use crate::accumulator::DocumentAccumulator;
use crate::api::{ApiClient, batch_get_versions_request, list_items_request};
use crate::collect::ProjectGroups;
use crate::error::FetchError;
use crate::schema::{
    BatchGetVersionsResponse, EnrichedDocument, ItemRecord, ListItemsResponse, VersionDetail,
};
use crate::stats::FetchStats;

/// Everything the fetch phase produced
#[derive(Debug)]
pub struct FetchOutput {
    pub documents: Vec<EnrichedDocument>,
    pub stats: FetchStats,
    /// Stopped early on a shutdown request
    pub interrupted: bool,
}

pub struct BatchFetcher<'a> {
    client: &'a mut ApiClient,
    chunk_size: usize,
    progress: &'a ProgressContext,
}

impl<'a> BatchFetcher<'a> {
    pub fn new(client: &'a mut ApiClient, chunk_size: usize, progress: &'a ProgressContext) -> Self {
        Self {
            client,
            chunk_size: chunk_size.max(1),
            progress,
        }
    }

    /// Fetch and join details for every urn of every project.
    ///
    /// Returns `Err` only for fatal (credential) failures; chunk failures are
    /// counted in the stats and their documents are missing from the output.
    pub fn fetch_details(&mut self, groups: &ProjectGroups) -> Result<FetchOutput, FetchError> {
        let mut acc = DocumentAccumulator::new();
        let mut stats = FetchStats::default();
        let mut interrupted = false;

        for (project_id, urns) in groups.iter() {
            if urns.is_empty() {
                log::debug!("{project_id}: no documents, skipped");
                stats.projects_skipped += 1;
                continue;
            }
            if is_shutdown_requested() {
                interrupted = true;
                break;
            }

            stats.projects += 1;
            interrupted = self.fetch_project(project_id, urns, &mut acc, &mut stats)?;
            if interrupted {
                break;
            }
        }

        if interrupted {
            log::warn!("Shutdown requested, stopping after {} documents", fmt_num(acc.len()));
        }
        stats.documents = acc.len();
        stats.without_version = acc.without_version();
        stats.rate_limit_waits = self.client.rate_limit_waits();
        Ok(FetchOutput {
            documents: acc.into_documents(),
            stats,
            interrupted,
        })
    }

    /// One project, chunk by chunk. Returns true if interrupted.
    fn fetch_project(
        &mut self,
        project_id: &str,
        urns: &[String],
        acc: &mut DocumentAccumulator,
        stats: &mut FetchStats,
    ) -> Result<bool, FetchError> {
        let total = urns.len();
        let chunk_count = total.div_ceil(self.chunk_size);
        let pb = self.progress.project_bar(project_id, total as u64);
        let mut processed = 0usize;

        for (idx, chunk) in urns.chunks(self.chunk_size).enumerate() {
            if is_shutdown_requested() {
                pb.abandon_with_message("interrupted");
                return Ok(true);
            }

            stats.chunks += 1;
            match self.fetch_chunk(project_id, chunk) {
                Ok(docs) => acc.push_chunk(docs),
                Err(e) if e.is_fatal() => {
                    pb.abandon_with_message("failed");
                    return Err(e);
                }
                Err(e) => {
                    stats.chunks_failed += 1;
                    log::error!(
                        "{project_id}: chunk {}/{chunk_count} failed, skipping: {e}",
                        idx + 1
                    );
                }
            }

            processed += chunk.len();
            pb.set_position(processed as u64);
            log::info!(
                "{project_id}: processed {} / {} documents",
                fmt_num(processed),
                fmt_num(total)
            );
        }

        pb.finish_and_clear();
        Ok(false)
    }

    /// Listing first, then version details, never concurrently
    fn fetch_chunk(
        &mut self,
        project_id: &str,
        urns: &[String],
    ) -> Result<Vec<EnrichedDocument>, FetchError> {
        let listing = self.client.call(&list_items_request(project_id, urns))?;
        check_errors(&listing, "included")?;
        let items: ListItemsResponse = serde_json::from_value(listing)?;

        let versions = self
            .client
            .call(&batch_get_versions_request(project_id, urns))?;
        check_errors(&versions, "results")?;
        let versions: BatchGetVersionsResponse = serde_json::from_value(versions)?;

        Ok(join_versions(project_id, items.included, versions.results))
    }
}

/// Left join of items and version details on `id == item_urn`.
///
/// When several details share an `item_urn`, the first one wins. Items without
/// details keep `version: None`. Every document gets `project_id`.
pub fn join_versions(
    project_id: &str,
    items: Vec<ItemRecord>,
    versions: Vec<VersionDetail>,
) -> Vec<EnrichedDocument> {
    let mut by_item: FxHashMap<String, VersionDetail> = FxHashMap::default();
    for version in versions {
        by_item.entry(version.item_urn.clone()).or_insert(version);
    }

    items
        .into_iter()
        .map(|item| {
            let version = by_item.get(&item.id).cloned();
            if version.is_none() {
                log::debug!("{project_id}: no version details for {}", item.id);
            }
            EnrichedDocument {
                project_id: project_id.to_string(),
                item,
                version,
            }
        })
        .collect()
}

/// Fail on a body that carries only a JSON:API `errors` array.
///
/// Errors next to a payload (per-urn failures in a batch) are logged and the
/// payload is kept.
fn check_errors(body: &Value, payload_key: &str) -> Result<(), FetchError> {
    let Some(errors) = body
        .get("errors")
        .and_then(Value::as_array)
        .filter(|errors| !errors.is_empty())
    else {
        return Ok(());
    };

    let details: Vec<String> = errors.iter().map(describe_error).collect();
    if body.get(payload_key).is_some() {
        log::warn!("Partial API errors: {}", details.join("; "));
        return Ok(());
    }
    Err(FetchError::Structured(details))
}

fn describe_error(error: &Value) -> String {
    let parts: Vec<&str> = ["code", "title", "detail", "urn"]
        .iter()
        .filter_map(|key| error.get(*key).and_then(Value::as_str))
        .collect();
    if parts.is_empty() {
        error.to_string()
    } else {
        parts.join(": ")
    }
}
