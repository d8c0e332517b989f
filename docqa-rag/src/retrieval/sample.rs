use std::sync::Arc;

use async_trait::async_trait;

use super::{QueryContext, RetrievalStage};
use crate::config::RetrievalConfig;
use crate::document::{ScoredChunk, Strategy};
use crate::error::Result;
use crate::store::{ChunkFilter, ChunkStore};

/// Stage 4: an unranked random sample, so a document with content never
/// answers with nothing at all.
pub struct SampleStage {
    config: Arc<RetrievalConfig>,
}

impl SampleStage {
    /// Create the stage.
    pub fn new(config: Arc<RetrievalConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RetrievalStage for SampleStage {
    fn strategy(&self) -> Strategy {
        Strategy::DiversitySample
    }

    fn is_triggered(&self, _ctx: &QueryContext) -> bool {
        true
    }

    async fn retrieve(
        &self,
        store: &dyn ChunkStore,
        ctx: &QueryContext,
    ) -> Result<Vec<ScoredChunk>> {
        let sample = store
            .aggregate_sample(&ChunkFilter::document(&ctx.document_id), self.config.sample_size)
            .await?;
        Ok(sample.into_iter().map(ScoredChunk::unscored).collect())
    }
}
