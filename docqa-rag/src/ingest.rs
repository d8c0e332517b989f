//! Ingestion: chunk an upload, embed the chunks, replace the stored document.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::chunking::{Chunker, PageChunker};
use crate::document::DocumentUpload;
use crate::embedding::EmbeddingProvider;
use crate::error::{DocQaError, Result};
use crate::store::{ChunkFilter, ChunkStore};

/// Outcome of ingesting one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Chunks now stored for the document.
    pub chunk_count: usize,
    /// Whether the chunks carry embeddings.
    pub embedded: bool,
}

/// Runs the chunk → embed → store workflow for uploaded documents.
///
/// Re-ingesting a document id replaces its chunks through
/// [`ChunkStore::replace_document`], so repeated uploads never accumulate
/// duplicates.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{DocumentUpload, Ingestor};
///
/// let ingestor = Ingestor::new(store.clone(), Some(embedder.clone()));
/// let report = ingestor.ingest(&DocumentUpload::new("doc-1", "atoms.pdf", pages)).await?;
/// ```
pub struct Ingestor {
    store: Arc<dyn ChunkStore>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    chunker: Arc<dyn Chunker>,
}

impl Ingestor {
    /// Create an ingestor using the default [`PageChunker`].
    ///
    /// Without an embedder, chunks are stored unembedded and only the
    /// non-vector stages of the cascade can find them.
    pub fn new(store: Arc<dyn ChunkStore>, embedder: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        Self { store, embedder, chunker: Arc::new(PageChunker::default()) }
    }

    /// Replace the chunker.
    pub fn with_chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = chunker;
        self
    }

    /// Ingest an upload, replacing any chunks previously stored for its id.
    ///
    /// An embedding failure is not fatal: the chunks are stored without
    /// embeddings and the report says so.
    ///
    /// # Errors
    ///
    /// Returns [`DocQaError::ChunkingError`] if the upload has no text, or the
    /// store's error if the replacement fails.
    pub async fn ingest(&self, upload: &DocumentUpload) -> Result<IngestReport> {
        if upload.document_id.trim().is_empty() {
            return Err(DocQaError::ChunkingError("document id must not be empty".into()));
        }
        if upload.is_blank() {
            return Err(DocQaError::ChunkingError(format!(
                "'{}' contains no text",
                upload.file_name
            )));
        }
        let mut chunks = self.chunker.chunk(upload);
        if chunks.is_empty() {
            return Err(DocQaError::ChunkingError(format!(
                "no text extracted from '{}'",
                upload.file_name
            )));
        }

        let mut embedded = false;
        if let Some(embedder) = &self.embedder {
            let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
            match embedder.embed_batch(&texts).await {
                Ok(embeddings) if embeddings.len() == chunks.len() => {
                    for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
                        chunk.embedding = Some(embedding);
                    }
                    embedded = true;
                }
                Ok(embeddings) => {
                    warn!(
                        document_id = %upload.document_id,
                        expected = chunks.len(),
                        received = embeddings.len(),
                        "embedding count mismatch, storing chunks without embeddings"
                    );
                }
                Err(e) => {
                    warn!(
                        document_id = %upload.document_id,
                        provider = embedder.name(),
                        error = %e,
                        "embedding failed, storing chunks without embeddings"
                    );
                }
            }
        }

        let chunk_count = chunks.len();
        self.store.replace_document(&upload.document_id, chunks).await?;
        info!(document_id = %upload.document_id, chunk_count, embedded, "ingested document");

        Ok(IngestReport { chunk_count, embedded })
    }

    /// Delete every chunk of `document_id`, returning how many were removed.
    pub async fn remove(&self, document_id: &str) -> Result<usize> {
        let removed = self.store.delete_many(&ChunkFilter::document(document_id)).await?;
        info!(document_id, removed, "removed document");
        Ok(removed)
    }
}
