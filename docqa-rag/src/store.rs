//! Chunk store trait and the filter combinators it is queried with.

use async_trait::async_trait;
use regex::Regex;

use crate::document::{Chunk, ScoredChunk};
use crate::error::Result;

/// A predicate over stored chunks.
///
/// Filters compose with [`and`](ChunkFilter::and), [`any`](ChunkFilter::any)
/// and [`negate`](ChunkFilter::negate), so stores never need embedded
/// scripting for length or pattern predicates.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::ChunkFilter;
///
/// let filter = ChunkFilter::document("doc-1")
///     .and(ChunkFilter::length(10, 200));
/// let headings = store.find(&filter, 10).await?;
/// ```
#[derive(Debug, Clone)]
pub enum ChunkFilter {
    /// Chunks of one document.
    DocumentId(String),
    /// Chunks whose text matches the regex.
    TextMatches(Regex),
    /// Chunks whose text contains the (lower-cased) needle, ignoring case.
    TextContains(String),
    /// Chunks whose text length in characters is within the bounds.
    TextLength {
        /// Inclusive lower bound.
        min: usize,
        /// Inclusive upper bound, unbounded when `None`.
        max: Option<usize>,
    },
    /// Chunks not matching the inner filter.
    Not(Box<ChunkFilter>),
    /// Chunks matching every inner filter. Empty matches everything.
    All(Vec<ChunkFilter>),
    /// Chunks matching at least one inner filter. Empty matches nothing.
    Any(Vec<ChunkFilter>),
}

impl ChunkFilter {
    /// Chunks of `document_id`.
    pub fn document(document_id: impl Into<String>) -> Self {
        Self::DocumentId(document_id.into())
    }

    /// Chunks whose text matches `regex`.
    pub fn matches(regex: Regex) -> Self {
        Self::TextMatches(regex)
    }

    /// Chunks whose text contains `needle`, ignoring case.
    pub fn contains(needle: impl AsRef<str>) -> Self {
        Self::TextContains(needle.as_ref().to_lowercase())
    }

    /// Chunks with a text length in `[min, max]` characters.
    pub fn length(min: usize, max: usize) -> Self {
        Self::TextLength { min, max: Some(max) }
    }

    /// Chunks with at least `min` characters.
    pub fn min_length(min: usize) -> Self {
        Self::TextLength { min, max: None }
    }

    /// Chunks matching any of `filters`.
    pub fn any(filters: Vec<ChunkFilter>) -> Self {
        Self::Any(filters)
    }

    /// Combine with another filter; both must match.
    pub fn and(self, other: ChunkFilter) -> Self {
        match self {
            Self::All(mut filters) => {
                filters.push(other);
                Self::All(filters)
            }
            first => Self::All(vec![first, other]),
        }
    }

    /// Invert this filter.
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// The document id this filter is restricted to, if it is.
    ///
    /// Stores use this to scan only the relevant partition.
    pub fn document_scope(&self) -> Option<&str> {
        match self {
            Self::DocumentId(id) => Some(id),
            Self::All(filters) => filters.iter().find_map(ChunkFilter::document_scope),
            _ => None,
        }
    }

    /// Evaluate the filter against a chunk.
    pub fn is_match(&self, chunk: &Chunk) -> bool {
        match self {
            Self::DocumentId(id) => chunk.document_id == *id,
            Self::TextMatches(regex) => regex.is_match(&chunk.text),
            Self::TextContains(needle) => chunk.text.to_lowercase().contains(needle.as_str()),
            Self::TextLength { min, max } => {
                let len = chunk.char_len();
                len >= *min && max.is_none_or(|max| len <= max)
            }
            Self::Not(inner) => !inner.is_match(chunk),
            Self::All(filters) => filters.iter().all(|f| f.is_match(chunk)),
            Self::Any(filters) => filters.iter().any(|f| f.is_match(chunk)),
        }
    }
}

/// A persistent collection of embedded text chunks.
///
/// Every query stage of the retrieval cascade is a read against this trait;
/// implementations must allow concurrent reads. Writes are bulk operations
/// used by ingestion.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{ChunkFilter, ChunkStore, InMemoryChunkStore};
///
/// let store = InMemoryChunkStore::new();
/// store.replace_document("doc-1", chunks).await?;
/// let count = store.count_documents(&ChunkFilter::document("doc-1")).await?;
/// let hits = store.vector_search("doc-1", &query, 5, 20, "vector_index").await?;
/// ```
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Count chunks matching `filter`.
    async fn count_documents(&self, filter: &ChunkFilter) -> Result<usize>;

    /// Return up to `limit` chunks matching `filter` in document order.
    async fn find(&self, filter: &ChunkFilter, limit: usize) -> Result<Vec<Chunk>>;

    /// Return a uniform random sample of up to `size` chunks matching `filter`.
    async fn aggregate_sample(&self, filter: &ChunkFilter, size: usize) -> Result<Vec<Chunk>>;

    /// Search `document_id`'s chunks by vector similarity using the named index.
    ///
    /// Considers at most `candidate_pool` candidates and returns the best `k`,
    /// ordered by descending score on a 0–1 scale.
    ///
    /// # Errors
    ///
    /// Returns [`DocQaError::IndexNotFound`](crate::DocQaError::IndexNotFound)
    /// if `index` does not exist.
    async fn vector_search(
        &self,
        document_id: &str,
        query: &[f32],
        k: usize,
        candidate_pool: usize,
        index: &str,
    ) -> Result<Vec<ScoredChunk>>;

    /// Delete chunks matching `filter`, returning how many were removed.
    async fn delete_many(&self, filter: &ChunkFilter) -> Result<usize>;

    /// Insert chunks.
    async fn insert_many(&self, chunks: Vec<Chunk>) -> Result<()>;

    /// Replace all chunks of `document_id` with `chunks`.
    ///
    /// The default implementation deletes then inserts, so a concurrent reader
    /// may observe the document half-replaced. Stores that can swap a
    /// document's chunk set atomically should override it.
    async fn replace_document(&self, document_id: &str, chunks: Vec<Chunk>) -> Result<()> {
        self.delete_many(&ChunkFilter::document(document_id)).await?;
        self.insert_many(chunks).await
    }
}
