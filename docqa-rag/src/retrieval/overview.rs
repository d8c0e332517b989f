use std::sync::Arc;

use async_trait::async_trait;

use super::{QueryContext, RetrievalStage};
use crate::config::RetrievalConfig;
use crate::document::{Chunk, ScoredChunk, Strategy};
use crate::error::Result;
use crate::heuristics::{overview_markers, overview_score};
use crate::store::{ChunkFilter, ChunkStore};

/// Stage 2: introduction and overview passages for "details about this document".
pub struct OverviewStage {
    config: Arc<RetrievalConfig>,
}

impl OverviewStage {
    /// Create the stage.
    pub fn new(config: Arc<RetrievalConfig>) -> Self {
        Self { config }
    }
}

/// Order chunks by descending weighted overview score, keeping `limit`.
///
/// Equal scores keep their document order.
pub fn rank_by_overview(chunks: Vec<Chunk>, limit: usize) -> Vec<ScoredChunk> {
    let mut scored: Vec<(u32, Chunk)> =
        chunks.into_iter().map(|c| (overview_score(&c.text), c)).collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(limit);
    scored.into_iter().map(|(score, chunk)| ScoredChunk::scored(chunk, score as f32)).collect()
}

#[async_trait]
impl RetrievalStage for OverviewStage {
    fn strategy(&self) -> Strategy {
        Strategy::Overview
    }

    fn is_triggered(&self, ctx: &QueryContext) -> bool {
        ctx.shape.detail_overview
    }

    async fn retrieve(
        &self,
        store: &dyn ChunkStore,
        ctx: &QueryContext,
    ) -> Result<Vec<ScoredChunk>> {
        let filter = ChunkFilter::document(&ctx.document_id)
            .and(ChunkFilter::matches(overview_markers().clone()));
        let candidates = store.find(&filter, self.config.keyword_candidates).await?;
        Ok(rank_by_overview(candidates, self.config.overview_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ChunkPosition;

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk::new("d", text, ChunkPosition { chunk_index: index, page_number: None }, "a.pdf")
    }

    #[test]
    fn introduction_outranks_plain_overview() {
        let ranked = rank_by_overview(
            vec![
                chunk(0, "This chapter covers spin."),
                chunk(1, "An overview of the field."),
                chunk(2, "Introduction: this book covers atoms."),
            ],
            8,
        );
        let order: Vec<usize> = ranked.iter().map(|c| c.chunk.position.chunk_index).collect();
        assert_eq!(order, vec![2, 1, 0]);
        assert_eq!(ranked[0].score, Some(6.0));
    }

    #[test]
    fn keeps_limit() {
        let chunks = (0..12).map(|i| chunk(i, "overview")).collect();
        assert_eq!(rank_by_overview(chunks, 8).len(), 8);
    }
}
