//! Data types for chunks, retrieval results, questions and answers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a chunk sits inside its parent document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPosition {
    /// Zero-based chunk index within the document. Unique per document.
    pub chunk_index: usize,
    /// One-based page number, when the extractor knows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

/// A stored unit of document text with its optional embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Unique identifier for the chunk.
    pub id: String,
    /// The uploaded document this chunk belongs to.
    pub document_id: String,
    /// The text content of the chunk. Never empty.
    pub text: String,
    /// The vector embedding, absent until ingestion has embedded the chunk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Ordering metadata.
    pub position: ChunkPosition,
    /// Original file name, for display.
    pub source_file_name: String,
    /// Ingestion timestamp.
    pub created_at: DateTime<Utc>,
}

impl Chunk {
    /// Create an unembedded chunk with a fresh id and the current timestamp.
    pub fn new(
        document_id: impl Into<String>,
        text: impl Into<String>,
        position: ChunkPosition,
        source_file_name: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_id: document_id.into(),
            text: text.into(),
            embedding: None,
            position,
            source_file_name: source_file_name.into(),
            created_at: Utc::now(),
        }
    }

    /// Attach an embedding vector.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Length of the chunk text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Extracted text of an uploaded document, one entry per page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpload {
    /// The id all chunks of this document are tagged with.
    pub document_id: String,
    /// Original file name, for display.
    pub file_name: String,
    /// Page texts in page order.
    pub pages: Vec<String>,
}

impl DocumentUpload {
    /// Create an upload.
    pub fn new(
        document_id: impl Into<String>,
        file_name: impl Into<String>,
        pages: Vec<String>,
    ) -> Self {
        Self { document_id: document_id.into(), file_name: file_name.into(), pages }
    }

    /// Whether every page is blank.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }
}

/// A [`Chunk`] paired with the score the producing strategy assigned to it.
///
/// The score is a cosine similarity for vector search, a keyword hit count
/// for keyword and overview search, and `None` for unscored strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Strategy-specific score (higher is better).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl ScoredChunk {
    /// Wrap a chunk without a score.
    pub fn unscored(chunk: Chunk) -> Self {
        Self { chunk, score: None }
    }

    /// Wrap a chunk with a score.
    pub fn scored(chunk: Chunk, score: f32) -> Self {
        Self { chunk, score: Some(score) }
    }
}

/// The cascade stage that produced a [`RetrievalResult`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Stage 0: vector similarity with a score floor.
    Vector,
    /// Stage 1: table-of-contents and heading lookup.
    Structural,
    /// Stage 2: introduction and overview passages.
    Overview,
    /// Stage 3: keyword match with front-matter filtering.
    Keyword,
    /// Stage 4: random sample used as last-resort context.
    DiversitySample,
}

impl Strategy {
    /// A stable name for logs and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Vector => "vector",
            Strategy::Structural => "structural",
            Strategy::Overview => "overview",
            Strategy::Keyword => "keyword",
            Strategy::DiversitySample => "diversity_sample",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked outcome of one cascade stage.
///
/// An empty `chunks` sequence is a valid result meaning "this strategy found
/// nothing".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Ranked chunks, best first.
    pub chunks: Vec<ScoredChunk>,
    /// The stage that produced the chunks.
    pub strategy: Strategy,
}

impl RetrievalResult {
    /// Create a result from ranked chunks.
    pub fn new(strategy: Strategy, chunks: Vec<ScoredChunk>) -> Self {
        Self { chunks, strategy }
    }

    /// Create an empty result for `strategy`.
    pub fn empty(strategy: Strategy) -> Self {
        Self { chunks: Vec::new(), strategy }
    }

    /// Whether the strategy found nothing.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of chunks in the result.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// The best (first) score, if the strategy scores its results.
    pub fn best_score(&self) -> Option<f32> {
        self.chunks.first().and_then(|c| c.score)
    }
}

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions.
    User,
    /// The assistant's previous answers.
    Assistant,
}

/// One turn of recent conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    /// The turn's author.
    pub role: Role,
    /// The turn's text.
    pub text: String,
}

/// A question asked against one document.
///
/// This is also the wire shape of an answer request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Free-text question.
    #[serde(rename = "question")]
    pub text: String,
    /// The document to answer from.
    pub document_id: String,
    /// Recent conversation, oldest first. Only used to condense the question.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_history: Vec<Turn>,
}

impl Question {
    /// A question with no conversation history.
    pub fn new(text: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self { text: text.into(), document_id: document_id.into(), recent_history: Vec::new() }
    }

    /// Attach recent conversation turns.
    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.recent_history = history;
        self
    }
}

/// The request accepted by [`DocumentAssistant::answer`](crate::DocumentAssistant::answer).
pub type AnswerRequest = Question;

/// A chunk excerpt cited in an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Leading excerpt of the chunk text.
    pub text: String,
    /// The document the excerpt comes from.
    pub document_id: String,
    /// Original file name, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Page number, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

/// The answer returned for a question. `sources` is always present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    /// The composed answer text.
    pub answer: String,
    /// Cited excerpts in ranking order.
    pub sources: Vec<Source>,
    /// The cascade stage that supplied the context, for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
}

impl AnswerResponse {
    /// An answer with no sources, used for the fixed special-case messages.
    pub fn message(answer: impl Into<String>) -> Self {
        Self { answer: answer.into(), sources: Vec::new(), strategy: None }
    }
}
