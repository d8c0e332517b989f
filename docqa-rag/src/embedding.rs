//! Embedding service trait for turning text into vectors.

use async_trait::async_trait;

use crate::error::Result;

/// A service that converts text into fixed-dimension embedding vectors.
///
/// Implementations wrap a specific backend (OpenAI, Gemini, a local model)
/// behind one async interface. The default
/// [`embed_batch`](EmbeddingProvider::embed_batch) calls
/// [`embed`](EmbeddingProvider::embed) once per input; backends with native
/// batching should override it.
///
/// Failures (quota, auth, timeout) are reported as
/// [`DocQaError::EmbeddingError`](crate::DocQaError::EmbeddingError). Callers
/// in this crate never retry: a failed question embedding disables vector
/// search for that request only.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::EmbeddingProvider;
///
/// let embedding = provider.embed("what is the ground state energy").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for several texts, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// The dimensionality of the vectors this provider produces.
    fn dimensions(&self) -> usize;

    /// A short provider name for logs and error messages.
    fn name(&self) -> &str {
        "custom"
    }
}
