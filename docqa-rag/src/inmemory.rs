//! In-memory chunk store using cosine similarity.
//!
//! This module provides [`InMemoryChunkStore`], a dependency-free
//! [`ChunkStore`] backed by a `BTreeMap` protected by a `tokio::sync::RwLock`.
//! It is suitable for development, testing, demos and single-process use.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{Chunk, ScoredChunk};
use crate::error::{DocQaError, Result};
use crate::store::{ChunkFilter, ChunkStore};

const BACKEND: &str = "InMemory";

/// The index name registered by [`InMemoryChunkStore::new`].
pub const DEFAULT_INDEX: &str = "vector_index";

/// An in-memory chunk store.
///
/// Chunks are partitioned by document id and kept in `chunk_index` order, so
/// [`find`](ChunkStore::find) returns chunks in document order. Vector search
/// is exhaustive cosine similarity; index names only gate which names are
/// accepted, mirroring stores whose vector indexes are provisioned by name.
///
/// [`replace_document`](ChunkStore::replace_document) swaps a document's chunk
/// set under a single write lock, so readers observe either the old or the new
/// set, never a mix.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{ChunkFilter, ChunkStore, InMemoryChunkStore};
///
/// let store = InMemoryChunkStore::new();
/// store.replace_document("doc-1", chunks).await?;
/// assert_eq!(store.count_documents(&ChunkFilter::document("doc-1")).await?, 3);
/// ```
#[derive(Debug)]
pub struct InMemoryChunkStore {
    documents: RwLock<BTreeMap<String, Vec<Chunk>>>,
    indexes: BTreeSet<String>,
}

impl Default for InMemoryChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryChunkStore {
    /// Create an empty store with the default `vector_index` index.
    pub fn new() -> Self {
        Self::with_indexes([DEFAULT_INDEX])
    }

    /// Create an empty store that accepts exactly the given index names.
    pub fn with_indexes<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            indexes: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Ids of all documents with at least one chunk.
    pub async fn document_ids(&self) -> Vec<String> {
        self.documents.read().await.keys().cloned().collect()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the dimensions differ.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Check chunk text and `chunk_index` uniqueness against the partitions the
/// batch writes to.
fn validate_batch<'a>(
    chunks: &'a [Chunk],
    documents: &'a BTreeMap<String, Vec<Chunk>>,
) -> Result<()> {
    let touched: BTreeSet<&str> = chunks.iter().map(|c| c.document_id.as_str()).collect();
    let mut seen: HashSet<(&str, usize)> = touched
        .iter()
        .filter_map(|id| documents.get(*id))
        .flatten()
        .map(|c| (c.document_id.as_str(), c.position.chunk_index))
        .collect();
    for chunk in chunks {
        if chunk.text.trim().is_empty() {
            return Err(DocQaError::InvalidChunk(format!(
                "chunk {} of '{}' has empty text",
                chunk.position.chunk_index, chunk.document_id
            )));
        }
        if !seen.insert((chunk.document_id.as_str(), chunk.position.chunk_index)) {
            return Err(DocQaError::InvalidChunk(format!(
                "duplicate chunk index {} for document '{}'",
                chunk.position.chunk_index, chunk.document_id
            )));
        }
    }
    Ok(())
}

/// Append `chunks` to their partitions, re-sorting only the partitions touched.
fn insert_sorted(documents: &mut BTreeMap<String, Vec<Chunk>>, chunks: Vec<Chunk>) {
    let mut touched = BTreeSet::new();
    for chunk in chunks {
        touched.insert(chunk.document_id.clone());
        documents.entry(chunk.document_id.clone()).or_default().push(chunk);
    }
    for id in &touched {
        if let Some(partition) = documents.get_mut(id) {
            partition.sort_by_key(|c| c.position.chunk_index);
        }
    }
}

impl InMemoryChunkStore {
    /// Chunks in the partitions a filter can match, in document order.
    fn scan<'a>(
        documents: &'a BTreeMap<String, Vec<Chunk>>,
        filter: &'a ChunkFilter,
    ) -> impl Iterator<Item = &'a Chunk> + 'a {
        let partitions: Box<dyn Iterator<Item = &'a Vec<Chunk>> + 'a> =
            match filter.document_scope() {
                Some(id) => Box::new(documents.get(id).into_iter()),
                None => Box::new(documents.values()),
            };
        partitions.flatten().filter(move |c| filter.is_match(c))
    }
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn count_documents(&self, filter: &ChunkFilter) -> Result<usize> {
        let documents = self.documents.read().await;
        Ok(Self::scan(&documents, filter).count())
    }

    async fn find(&self, filter: &ChunkFilter, limit: usize) -> Result<Vec<Chunk>> {
        let documents = self.documents.read().await;
        Ok(Self::scan(&documents, filter).take(limit).cloned().collect())
    }

    async fn aggregate_sample(&self, filter: &ChunkFilter, size: usize) -> Result<Vec<Chunk>> {
        let documents = self.documents.read().await;
        let matching: Vec<&Chunk> = Self::scan(&documents, filter).collect();
        let mut rng = rand::rng();
        Ok(matching.choose_multiple(&mut rng, size).map(|c| (*c).clone()).collect())
    }

    async fn vector_search(
        &self,
        document_id: &str,
        query: &[f32],
        k: usize,
        candidate_pool: usize,
        index: &str,
    ) -> Result<Vec<ScoredChunk>> {
        if !self.indexes.contains(index) {
            return Err(DocQaError::IndexNotFound { index: index.to_string() });
        }

        let documents = self.documents.read().await;
        let Some(partition) = documents.get(document_id) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<ScoredChunk> = partition
            .iter()
            .filter_map(|chunk| {
                let embedding = chunk.embedding.as_deref()?;
                let score = cosine_similarity(embedding, query).clamp(0.0, 1.0);
                Some(ScoredChunk::scored(chunk.clone(), score))
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k.min(candidate_pool));
        debug!(backend = BACKEND, document_id, index, result_count = scored.len(), "vector search");
        Ok(scored)
    }

    async fn delete_many(&self, filter: &ChunkFilter) -> Result<usize> {
        let mut documents = self.documents.write().await;
        let mut removed = 0;
        documents.retain(|_, partition| {
            let before = partition.len();
            partition.retain(|c| !filter.is_match(c));
            removed += before - partition.len();
            !partition.is_empty()
        });
        Ok(removed)
    }

    async fn insert_many(&self, chunks: Vec<Chunk>) -> Result<()> {
        let mut documents = self.documents.write().await;
        validate_batch(&chunks, &documents)?;
        insert_sorted(&mut documents, chunks);
        Ok(())
    }

    async fn replace_document(&self, document_id: &str, chunks: Vec<Chunk>) -> Result<()> {
        if let Some(stray) = chunks.iter().find(|c| c.document_id != document_id) {
            return Err(DocQaError::InvalidChunk(format!(
                "chunk for document '{}' passed when replacing '{document_id}'",
                stray.document_id
            )));
        }
        validate_batch(&chunks, &BTreeMap::new())?;

        let mut documents = self.documents.write().await;
        documents.remove(document_id);
        insert_sorted(&mut documents, chunks);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ChunkPosition;

    fn chunk(document_id: &str, index: usize, text: &str) -> Chunk {
        let position = ChunkPosition { chunk_index: index, page_number: None };
        Chunk::new(document_id, text, position, "a.pdf")
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn find_returns_document_order_regardless_of_insert_order() {
        let store = InMemoryChunkStore::new();
        let chunks = vec![chunk("d", 2, "third"), chunk("d", 0, "first"), chunk("d", 1, "second")];
        store.insert_many(chunks).await.unwrap();

        let found = store.find(&ChunkFilter::document("d"), 10).await.unwrap();
        let texts: Vec<&str> = found.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_positions_and_empty_text() {
        let store = InMemoryChunkStore::new();
        store.insert_many(vec![chunk("d", 0, "one")]).await.unwrap();

        let err = store.insert_many(vec![chunk("d", 0, "again")]).await.unwrap_err();
        assert!(matches!(err, DocQaError::InvalidChunk(_)));

        let err = store.insert_many(vec![chunk("d", 1, "   ")]).await.unwrap_err();
        assert!(matches!(err, DocQaError::InvalidChunk(_)));
        assert_eq!(store.count_documents(&ChunkFilter::document("d")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn batches_only_check_the_partitions_they_write() {
        let store = InMemoryChunkStore::new();
        store.insert_many(vec![chunk("d", 1, "d second"), chunk("d", 0, "d first")]).await.unwrap();
        store.insert_many(vec![chunk("e", 0, "e first"), chunk("d", 2, "d third")]).await.unwrap();

        let d = store.find(&ChunkFilter::document("d"), 10).await.unwrap();
        let texts: Vec<&str> = d.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["d first", "d second", "d third"]);

        let err = store.insert_many(vec![chunk("e", 1, "e second"), chunk("e", 0, "dup")]).await;
        assert!(matches!(err, Err(DocQaError::InvalidChunk(_))));
        assert_eq!(store.count_documents(&ChunkFilter::document("e")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_index_is_reported() {
        let store = InMemoryChunkStore::new();
        let err = store.vector_search("d", &[1.0], 5, 20, "missing").await.unwrap_err();
        assert!(matches!(err, DocQaError::IndexNotFound { index } if index == "missing"));
    }

    #[tokio::test]
    async fn vector_search_skips_unembedded_chunks_and_scopes_by_document() {
        let store = InMemoryChunkStore::new();
        store
            .insert_many(vec![
                chunk("d", 0, "close").with_embedding(vec![1.0, 0.0]),
                chunk("d", 1, "far").with_embedding(vec![-1.0, 0.0]),
                chunk("d", 2, "pending"),
                chunk("other", 0, "elsewhere").with_embedding(vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let hits = store.vector_search("d", &[1.0, 0.0], 5, 20, DEFAULT_INDEX).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "close");
        assert_eq!(hits[1].score, Some(0.0));
    }

    #[tokio::test]
    async fn sample_is_bounded_and_distinct() {
        let store = InMemoryChunkStore::new();
        let chunks = (0..20).map(|i| chunk("d", i, &format!("chunk {i}"))).collect();
        store.insert_many(chunks).await.unwrap();

        let sample = store.aggregate_sample(&ChunkFilter::document("d"), 8).await.unwrap();
        assert_eq!(sample.len(), 8);
        let ids: HashSet<&str> = sample.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), 8);

        let all = store.aggregate_sample(&ChunkFilter::document("d"), 50).await.unwrap();
        assert_eq!(all.len(), 20);
    }

    #[tokio::test]
    async fn replace_document_swaps_whole_chunk_set() {
        let store = InMemoryChunkStore::new();
        store.replace_document("d", vec![chunk("d", 0, "a"), chunk("d", 1, "b")]).await.unwrap();
        store.replace_document("d", vec![chunk("d", 0, "c")]).await.unwrap();

        let found = store.find(&ChunkFilter::document("d"), 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "c");

        let err = store.replace_document("d", vec![chunk("e", 0, "x")]).await.unwrap_err();
        assert!(matches!(err, DocQaError::InvalidChunk(_)));
    }

    #[tokio::test]
    async fn delete_many_counts_removed_chunks() {
        let store = InMemoryChunkStore::new();
        let chunks = vec![chunk("d", 0, "a"), chunk("d", 1, "b"), chunk("e", 0, "c")];
        store.insert_many(chunks).await.unwrap();

        assert_eq!(store.delete_many(&ChunkFilter::document("d")).await.unwrap(), 2);
        assert_eq!(store.document_ids().await, vec!["e".to_string()]);
    }
}
