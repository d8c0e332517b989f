use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{QueryContext, RetrievalStage};
use crate::config::RetrievalConfig;
use crate::document::{ScoredChunk, Strategy};
use crate::error::{DocQaError, Result};
use crate::store::ChunkStore;

/// Stage 0: vector similarity search with a similarity floor.
///
/// Index names are tried in configuration order; a missing index moves on to
/// the next name. When the best hit scores below the floor the whole result
/// set is discarded.
pub struct VectorStage {
    config: Arc<RetrievalConfig>,
}

impl VectorStage {
    /// Create the stage.
    pub fn new(config: Arc<RetrievalConfig>) -> Self {
        Self { config }
    }

    /// Drop `hits` entirely unless the best one reaches `floor`.
    pub fn apply_floor(hits: Vec<ScoredChunk>, floor: f32) -> Vec<ScoredChunk> {
        let best = hits.iter().filter_map(|h| h.score).fold(f32::NEG_INFINITY, f32::max);
        if best < floor { Vec::new() } else { hits }
    }
}

#[async_trait]
impl RetrievalStage for VectorStage {
    fn strategy(&self) -> Strategy {
        Strategy::Vector
    }

    fn is_triggered(&self, ctx: &QueryContext) -> bool {
        ctx.embedding.is_some()
    }

    async fn retrieve(
        &self,
        store: &dyn ChunkStore,
        ctx: &QueryContext,
    ) -> Result<Vec<ScoredChunk>> {
        let Some(embedding) = ctx.embedding.as_deref() else {
            return Ok(Vec::new());
        };

        let mut last_missing = None;
        for index in &self.config.vector_indexes {
            let search = store.vector_search(
                &ctx.document_id,
                embedding,
                self.config.vector_top_k,
                self.config.vector_candidates,
                index,
            );
            match search.await {
                Ok(hits) => {
                    let kept = Self::apply_floor(hits, self.config.similarity_floor);
                    debug!(
                        document_id = %ctx.document_id,
                        index = %index,
                        result_count = kept.len(),
                        "vector search"
                    );
                    return Ok(kept);
                }
                Err(DocQaError::IndexNotFound { index }) => {
                    debug!(
                        document_id = %ctx.document_id,
                        index = %index,
                        "vector index missing, trying next"
                    );
                    last_missing = Some(index);
                }
                Err(e) => return Err(e),
            }
        }

        Err(DocQaError::IndexNotFound {
            index: last_missing.unwrap_or_else(|| "<none configured>".to_string()),
        })
    }
}
