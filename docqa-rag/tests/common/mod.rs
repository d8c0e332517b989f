//! Shared test doubles for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa_rag::heuristics::significant_words;
use docqa_rag::{
    Chunk, ChunkFilter, ChunkPosition, ChunkStore, DocQaError, EmbeddingProvider,
    InMemoryChunkStore, Result, ScoredChunk,
};

pub const DIM: usize = 256;

/// Deterministic bag-of-words embedder: each significant word is hashed into
/// one of `DIM` buckets, then the vector is L2-normalized.
#[derive(Default)]
pub struct MockEmbeddingProvider {
    pub failing: AtomicBool,
    pub calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    pub fn failing() -> Self {
        Self { failing: AtomicBool::new(true), calls: AtomicUsize::new(0) }
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; DIM];
        for word in significant_words(text) {
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for byte in word.bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x0100_0000_01b3);
            }
            v[(hash % DIM as u64) as usize] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DocQaError::EmbeddingError {
                provider: "mock".into(),
                message: "quota exceeded".into(),
            });
        }
        Ok(Self::vector(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Per-method call counters.
#[derive(Debug, Default)]
pub struct Calls {
    pub count: AtomicUsize,
    pub find: AtomicUsize,
    pub sample: AtomicUsize,
    pub vector: AtomicUsize,
    pub delete: AtomicUsize,
    pub insert: AtomicUsize,
    pub replace: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        let counters = [
            &self.count,
            &self.find,
            &self.sample,
            &self.vector,
            &self.delete,
            &self.insert,
            &self.replace,
        ];
        counters
            .iter()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }
}

/// Wraps the in-memory store, counting calls and optionally failing or
/// returning scripted vector scores.
#[derive(Default)]
pub struct CountingStore {
    pub inner: InMemoryChunkStore,
    pub calls: Calls,
    pub failing: AtomicBool,
    pub vector_scores: Option<Vec<f32>>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vector search returns the document's first chunks with these scores.
    pub fn with_vector_scores(scores: Vec<f32>) -> Self {
        Self { vector_scores: Some(scores), ..Self::default() }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn enter(&self, counter: &AtomicUsize) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DocQaError::store("counting", "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ChunkStore for CountingStore {
    async fn count_documents(&self, filter: &ChunkFilter) -> Result<usize> {
        self.enter(&self.calls.count)?;
        self.inner.count_documents(filter).await
    }

    async fn find(&self, filter: &ChunkFilter, limit: usize) -> Result<Vec<Chunk>> {
        self.enter(&self.calls.find)?;
        self.inner.find(filter, limit).await
    }

    async fn aggregate_sample(&self, filter: &ChunkFilter, size: usize) -> Result<Vec<Chunk>> {
        self.enter(&self.calls.sample)?;
        self.inner.aggregate_sample(filter, size).await
    }

    async fn vector_search(
        &self,
        document_id: &str,
        query: &[f32],
        k: usize,
        candidate_pool: usize,
        index: &str,
    ) -> Result<Vec<ScoredChunk>> {
        self.enter(&self.calls.vector)?;
        match &self.vector_scores {
            Some(scores) => {
                let chunks =
                    self.inner.find(&ChunkFilter::document(document_id), scores.len()).await?;
                let scored = chunks.into_iter().zip(scores);
                Ok(scored.map(|(c, s)| ScoredChunk::scored(c, *s)).collect())
            }
            None => self.inner.vector_search(document_id, query, k, candidate_pool, index).await,
        }
    }

    async fn delete_many(&self, filter: &ChunkFilter) -> Result<usize> {
        self.enter(&self.calls.delete)?;
        self.inner.delete_many(filter).await
    }

    async fn insert_many(&self, chunks: Vec<Chunk>) -> Result<()> {
        self.enter(&self.calls.insert)?;
        self.inner.insert_many(chunks).await
    }

    async fn replace_document(&self, document_id: &str, chunks: Vec<Chunk>) -> Result<()> {
        self.enter(&self.calls.replace)?;
        self.inner.replace_document(document_id, chunks).await
    }
}

/// Chunks of `texts` for `document_id`, embedded with the mock embedder.
pub fn embedded_chunks(document_id: &str, texts: &[&str]) -> Vec<Chunk> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let position = ChunkPosition { chunk_index: i, page_number: Some(i as u32 + 1) };
            Chunk::new(document_id, *text, position, "physics.pdf")
                .with_embedding(MockEmbeddingProvider::vector(text))
        })
        .collect()
}

/// Chunks of `texts` for `document_id` without embeddings.
pub fn plain_chunks(document_id: &str, texts: &[&str]) -> Vec<Chunk> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let position = ChunkPosition { chunk_index: i, page_number: None };
            Chunk::new(document_id, *text, position, "physics.pdf")
        })
        .collect()
}

/// Text of about `len` characters starting with `lead`.
pub fn padded(lead: &str, len: usize) -> String {
    let mut text = lead.to_string();
    while text.chars().count() < len {
        text.push_str(" lorem");
    }
    text
}
