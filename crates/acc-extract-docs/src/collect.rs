//! Identifier collection from Data Extract tables.
//!
//! Each input table names a project column and a urn column. Rows become
//! [`IdentifierRecord`]s, which are merged into [`ProjectGroups`]: one
//! ordered, duplicate-free urn list per project.

use std::path::Path;

use anyhow::Context;
use rustc_hash::{FxHashMap, FxHashSet};

use acc_extract_core::fmt_num;

use crate::config::InputSource;

/// One (project, urn) reference read from an input row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierRecord {
    pub project_id: String,
    /// `None` when the column is missing or the cell is empty
    pub document_urn: Option<String>,
}

/// Urns of one project in first-seen order
#[derive(Debug, Default)]
struct ProjectUrns {
    project_id: String,
    urns: Vec<String>,
    seen: FxHashSet<String>,
}

/// Urns grouped by project.
///
/// Projects iterate in first-seen order, urns in insertion order. A project
/// is registered by its first record even when that record carries no urn,
/// so a group may be empty.
#[derive(Debug, Default)]
pub struct ProjectGroups {
    projects: Vec<ProjectUrns>,
    index: FxHashMap<String, usize>,
}

impl ProjectGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one record. Returns true if a new urn was added.
    ///
    /// Records with an empty project id are dropped; empty or repeated urns
    /// are no-ops.
    pub fn insert(&mut self, record: IdentifierRecord) -> bool {
        if record.project_id.is_empty() {
            return false;
        }
        let idx = match self.index.get(&record.project_id) {
            Some(&idx) => idx,
            None => {
                self.projects.push(ProjectUrns {
                    project_id: record.project_id.clone(),
                    ..Default::default()
                });
                let idx = self.projects.len() - 1;
                self.index.insert(record.project_id, idx);
                idx
            }
        };

        let Some(urn) = record.document_urn.filter(|u| !u.is_empty()) else {
            return false;
        };
        let group = &mut self.projects[idx];
        if !group.seen.insert(urn.clone()) {
            return false;
        }
        group.urns.push(urn);
        true
    }

    /// Urns of one project, if the project was seen
    pub fn get(&self, project_id: &str) -> Option<&[String]> {
        self.index
            .get(project_id)
            .map(|&idx| self.projects[idx].urns.as_slice())
    }

    /// (project_id, urns) in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.projects
            .iter()
            .map(|p| (p.project_id.as_str(), p.urns.as_slice()))
    }

    /// Number of projects, including those without urns
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Unique urns across all projects
    pub fn total_urns(&self) -> usize {
        self.projects.iter().map(|p| p.urns.len()).sum()
    }
}

impl Extend<IdentifierRecord> for ProjectGroups {
    fn extend<I: IntoIterator<Item = IdentifierRecord>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<IdentifierRecord> for ProjectGroups {
    fn from_iter<I: IntoIterator<Item = IdentifierRecord>>(iter: I) -> Self {
        let mut groups = Self::new();
        groups.extend(iter);
        groups
    }
}

/// Read every source and group its urns by project
pub fn collect_identifiers(sources: &[InputSource]) -> anyhow::Result<ProjectGroups> {
    let mut groups = ProjectGroups::new();
    let mut collected = 0usize;

    for source in sources {
        let records = read_source(source)?;
        log::debug!(
            "{}: {} rows",
            source.file.display(),
            fmt_num(records.len())
        );
        let orphaned = urns_without_project(&records);
        if orphaned > 0 {
            log::warn!(
                "{}: {} rows have a URN but no '{}', dropped",
                source.file.display(),
                fmt_num(orphaned),
                source.project_column
            );
        }
        collected += records.len();
        groups.extend(records);
    }

    log::info!("Collected {} URNs from Data Extract", fmt_num(collected));
    log::info!(
        "{} unique URNs across {} projects",
        fmt_num(groups.total_urns()),
        fmt_num(groups.len())
    );
    Ok(groups)
}

/// Rows whose urn cannot be fetched because the project id is empty
fn urns_without_project(records: &[IdentifierRecord]) -> usize {
    records
        .iter()
        .filter(|r| r.project_id.is_empty())
        .filter(|r| r.document_urn.as_deref().is_some_and(|u| !u.is_empty()))
        .count()
}

/// Read one input table into identifier records
pub fn read_source(source: &InputSource) -> anyhow::Result<Vec<IdentifierRecord>> {
    let content = read_table(&source.file)?;
    parse_records(&content, source)
        .with_context(|| format!("Cannot parse {}", source.file.display()))
}

fn read_table(path: &Path) -> anyhow::Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    Ok(match content.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => content,
    })
}

/// Map rows to records using the source's declared columns.
///
/// A trailing blank row is dropped. Missing columns are not an error: the
/// corresponding value is simply absent.
fn parse_records(content: &str, source: &InputSource) -> anyhow::Result<Vec<IdentifierRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let project_idx = headers.iter().position(|h| h == source.project_column);
    let urn_idx = headers.iter().position(|h| h == source.urn_column);
    if urn_idx.is_none() {
        log::warn!(
            "{}: no '{}' column, no URNs will be read",
            source.file.display(),
            source.urn_column
        );
    }

    let mut rows = reader.records().collect::<Result<Vec<_>, _>>()?;
    if rows
        .last()
        .is_some_and(|row| row.iter().all(|field| field.trim().is_empty()))
    {
        rows.pop();
    }

    let cell = |row: &csv::StringRecord, idx: Option<usize>| {
        idx.and_then(|i| row.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    };

    Ok(rows
        .iter()
        .map(|row| IdentifierRecord {
            project_id: cell(row, project_idx).unwrap_or_default(),
            document_urn: cell(row, urn_idx),
        })
        .collect())
}
