//! Global ordered sequence of enriched documents

use crate::schema::EnrichedDocument;

/// Appends chunk results in project → chunk → item order.
///
/// No deduplication happens here; urns are already unique per project.
#[derive(Debug, Default)]
pub struct DocumentAccumulator {
    documents: Vec<EnrichedDocument>,
    without_version: usize,
}

impl DocumentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one chunk's documents
    pub fn push_chunk(&mut self, chunk: Vec<EnrichedDocument>) {
        self.without_version += chunk.iter().filter(|d| d.version.is_none()).count();
        self.documents.extend(chunk);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents whose version details were not returned
    pub fn without_version(&self) -> usize {
        self.without_version
    }

    pub fn documents(&self) -> &[EnrichedDocument] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<EnrichedDocument> {
        self.documents
    }
}
