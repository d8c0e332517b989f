use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{QueryContext, RetrievalStage};
use crate::config::RetrievalConfig;
use crate::document::{ScoredChunk, Strategy};
use crate::error::Result;
use crate::heuristics::structural_markers;
use crate::store::{ChunkFilter, ChunkStore};

/// Stage 1: table of contents and heading lookup for listing requests.
pub struct StructuralStage {
    config: Arc<RetrievalConfig>,
}

impl StructuralStage {
    /// Create the stage.
    pub fn new(config: Arc<RetrievalConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RetrievalStage for StructuralStage {
    fn strategy(&self) -> Strategy {
        Strategy::Structural
    }

    fn is_triggered(&self, ctx: &QueryContext) -> bool {
        ctx.shape.listing
    }

    async fn retrieve(
        &self,
        store: &dyn ChunkStore,
        ctx: &QueryContext,
    ) -> Result<Vec<ScoredChunk>> {
        let document = ChunkFilter::document(&ctx.document_id);
        let limit = self.config.structural_limit;

        let marked = document.clone().and(ChunkFilter::matches(structural_markers().clone()));
        let mut chunks = store.find(&marked, limit).await?;

        if chunks.is_empty() {
            debug!(
                document_id = %ctx.document_id,
                "no structural markers, falling back to short chunks"
            );
            let (min, max) = (self.config.heading_min_chars, self.config.heading_max_chars);
            let short = document.and(ChunkFilter::length(min, max));
            chunks = store.find(&short, limit).await?;
        }

        Ok(chunks.into_iter().map(ScoredChunk::unscored).collect())
    }
}
