//! The retrieval cascade.
//!
//! [`RetrievalEngine`] runs an ordered list of [`RetrievalStage`]s against a
//! [`ChunkStore`]. Each stage decides from the question shape whether it
//! applies; the first applicable stage returning at least one chunk wins and
//! later stages are not attempted. A stage failure is logged and treated as
//! "no result", so one bad query never aborts the request.
//!
//! | Stage | Trigger | Query |
//! |-------|---------|-------|
//! | [`VectorStage`] | question embedding available | vector search with a similarity floor |
//! | [`StructuralStage`] | short listing request | table-of-contents markers, then short chunks |
//! | [`OverviewStage`] | detail request about the document | overview vocabulary, re-ranked |
//! | [`KeywordStage`] | any other question with keywords | keyword match minus front matter |
//! | [`SampleStage`] | always | uniform random sample |

mod keyword;
mod overview;
mod sample;
mod structural;
mod vector;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::RetrievalConfig;
use crate::document::{RetrievalResult, ScoredChunk, Strategy};
use crate::error::Result;
use crate::heuristics::{QuestionShape, extract_keywords};
use crate::store::ChunkStore;

pub use keyword::{KeywordStage, rank_by_keywords};
pub use overview::{OverviewStage, rank_by_overview};
pub use sample::SampleStage;
pub use structural::StructuralStage;
pub use vector::VectorStage;

/// Everything a stage may know about the question being answered.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// The resolved (standalone) question text.
    pub question: String,
    /// The document to retrieve from.
    pub document_id: String,
    /// The question embedding, absent when the embedding service failed.
    pub embedding: Option<Vec<f32>>,
    /// Search keywords extracted from the question.
    pub keywords: Vec<String>,
    /// The question's shape.
    pub shape: QuestionShape,
}

impl QueryContext {
    /// Build a context, extracting keywords and classifying the question.
    pub fn new(
        question: impl Into<String>,
        document_id: impl Into<String>,
        embedding: Option<Vec<f32>>,
    ) -> Self {
        let question = question.into();
        let keywords = extract_keywords(&question);
        let shape = QuestionShape::classify(&question);
        Self { question, document_id: document_id.into(), embedding, keywords, shape }
    }
}

/// One strategy of the cascade.
#[async_trait]
pub trait RetrievalStage: Send + Sync {
    /// The strategy this stage implements.
    fn strategy(&self) -> Strategy;

    /// Whether the question shape calls for this stage.
    fn is_triggered(&self, ctx: &QueryContext) -> bool;

    /// Run the stage. An empty result means "nothing found".
    async fn retrieve(
        &self,
        store: &dyn ChunkStore,
        ctx: &QueryContext,
    ) -> Result<Vec<ScoredChunk>>;
}

/// Runs the retrieval cascade for one question at a time.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{QueryContext, RetrievalEngine};
///
/// let engine = RetrievalEngine::new(store, config)?;
/// let result = engine.retrieve(&QueryContext::new("list the chapters", "doc-1", None)).await;
/// println!("{} chunks from {}", result.len(), result.strategy);
/// ```
pub struct RetrievalEngine {
    store: Arc<dyn ChunkStore>,
    stages: Vec<Box<dyn RetrievalStage>>,
}

impl RetrievalEngine {
    /// Create an engine with the standard five-stage cascade.
    ///
    /// # Errors
    ///
    /// Returns [`DocQaError::ConfigError`](crate::DocQaError::ConfigError) if
    /// the configuration is invalid or its content vocabulary does not compile
    /// into a pattern.
    pub fn new(store: Arc<dyn ChunkStore>, config: Arc<RetrievalConfig>) -> Result<Self> {
        config.validate()?;
        let stages: Vec<Box<dyn RetrievalStage>> = vec![
            Box::new(VectorStage::new(config.clone())),
            Box::new(StructuralStage::new(config.clone())),
            Box::new(OverviewStage::new(config.clone())),
            Box::new(KeywordStage::new(config.clone())?),
            Box::new(SampleStage::new(config)),
        ];
        Ok(Self { store, stages })
    }

    /// Create an engine running a custom list of stages, in order.
    pub fn with_stages(store: Arc<dyn ChunkStore>, stages: Vec<Box<dyn RetrievalStage>>) -> Self {
        Self { store, stages }
    }

    /// Produce the best available ranked chunk set for the question.
    ///
    /// Never fails: when every stage is skipped, fails or finds nothing, the
    /// result is empty and tagged with the last strategy of the cascade.
    pub async fn retrieve(&self, ctx: &QueryContext) -> RetrievalResult {
        for stage in &self.stages {
            let strategy = stage.strategy();
            if !stage.is_triggered(ctx) {
                debug!(document_id = %ctx.document_id, %strategy, "stage not triggered");
                continue;
            }

            match stage.retrieve(self.store.as_ref(), ctx).await {
                Ok(chunks) if !chunks.is_empty() => {
                    debug!(
                        document_id = %ctx.document_id,
                        %strategy,
                        result_count = chunks.len(),
                        "stage produced results"
                    );
                    return RetrievalResult::new(strategy, chunks);
                }
                Ok(_) => {
                    debug!(document_id = %ctx.document_id, %strategy, "stage found nothing");
                }
                Err(e) => {
                    warn!(
                        document_id = %ctx.document_id,
                        %strategy,
                        error = %e,
                        "stage failed, trying next"
                    );
                }
            }
        }

        RetrievalResult::empty(Strategy::DiversitySample)
    }
}
