//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting documents or answering questions.
#[derive(Debug, Error)]
pub enum DocQaError {
    /// The chunk store could not be reached or a query against it failed.
    #[error("Chunk store unavailable ({backend}): {message}")]
    StoreUnavailable {
        /// The store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A named vector index does not exist in the chunk store.
    #[error("Vector index not found: {index}")]
    IndexNotFound {
        /// The index name that was requested.
        index: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The chat-completion model failed.
    #[error("Chat model error ({provider}): {message}")]
    ChatModelError {
        /// The chat model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// No chunks have been ingested for the document.
    #[error("No documents ingested for '{document_id}'")]
    NoDocuments {
        /// The document that was queried.
        document_id: String,
    },

    /// The relevance gate rejected the question.
    #[error("Question is not related to document '{document_id}'")]
    Irrelevant {
        /// The document the question was asked against.
        document_id: String,
    },

    /// A chunk violates a store invariant (empty text, duplicate position).
    #[error("Invalid chunk: {0}")]
    InvalidChunk(String),

    /// An error occurred while chunking or validating uploaded content.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DocQaError {
    /// Shorthand for a [`DocQaError::StoreUnavailable`] raised by `backend`.
    pub fn store(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreUnavailable { backend: backend.into(), message: message.into() }
    }
}

/// A convenience result type for document QA operations.
pub type Result<T> = std::result::Result<T, DocQaError>;
