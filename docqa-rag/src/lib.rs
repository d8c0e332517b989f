//! # docqa-rag
//!
//! Question answering over uploaded documents with a multi-strategy
//! retrieval cascade.
//!
//! ## Overview
//!
//! A question flows through three components:
//!
//! - [`RelevanceGate`] - rejects questions obviously unrelated to the document
//! - [`RetrievalEngine`] - runs the cascade (vector, structural, overview,
//!   keyword, diversity sample) until a stage returns chunks
//! - [`ResponseComposer`] - templates the ranked chunks into an answer with sources
//!
//! [`DocumentAssistant`] wires them together behind the answer
//! request/response contract, and [`Ingestor`] chunks, embeds and stores
//! uploads. Storage, embeddings and chat completion are pluggable through the
//! [`ChunkStore`], [`EmbeddingProvider`] and [`ChatModel`] traits.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{AnswerRequest, DocumentAssistant, DocumentUpload, InMemoryChunkStore, Ingestor};
//!
//! let store = Arc::new(InMemoryChunkStore::new());
//! Ingestor::new(store.clone(), Some(embedder.clone()))
//!     .ingest(&DocumentUpload::new("doc-1", "atoms.pdf", pages))
//!     .await?;
//!
//! let assistant = DocumentAssistant::builder().store(store).embedding_provider(embedder).build()?;
//! let response = assistant.answer(AnswerRequest::new("list the chapters", "doc-1")).await?;
//! ```
//!
//! ## Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `openai` | OpenAI-compatible embedding and chat clients |
//! | `gemini` | Gemini embedding client |
//! | `full` | All of the above |

pub mod assistant;
pub mod chat;
pub mod chunking;
pub mod composer;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod gate;
pub mod heuristics;
pub mod ingest;
pub mod inmemory;
pub mod retrieval;
pub mod store;

#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "openai")]
pub mod openai;

pub use assistant::{DocumentAssistant, DocumentAssistantBuilder};
pub use chat::{ChatModel, condense_question};
pub use chunking::{Chunker, PageChunker};
pub use composer::{AnswerTemplate, ResponseComposer};
pub use config::{RetrievalConfig, RetrievalConfigBuilder};
pub use document::{
    AnswerRequest, AnswerResponse, Chunk, ChunkPosition, DocumentUpload, Question,
    RetrievalResult, Role, ScoredChunk, Source, Strategy, Turn,
};
pub use embedding::EmbeddingProvider;
pub use error::{DocQaError, Result};
pub use gate::RelevanceGate;
pub use ingest::{IngestReport, Ingestor};
pub use inmemory::InMemoryChunkStore;
pub use retrieval::{QueryContext, RetrievalEngine, RetrievalStage};
pub use store::{ChunkFilter, ChunkStore};
