use std::ops::RangeInclusive;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::{QueryContext, RetrievalStage};
use crate::config::RetrievalConfig;
use crate::document::{Chunk, ScoredChunk, Strategy};
use crate::error::{DocQaError, Result};
use crate::heuristics::{boilerplate_markers, has_boilerplate, term_alternation};
use crate::store::{ChunkFilter, ChunkStore};

/// Stage 3: keyword match ranked by distinct hits, with front matter demoted.
///
/// Runs for questions that are neither listing nor overview requests; those
/// fall through to the random sample when their own stage finds nothing.
///
/// Candidates that look like series pages, publisher notices or other short
/// front matter are set aside when real content is available. If the best
/// ranked chunk is still front matter, a second query restricted to content
/// chunks replaces the ranking when it finds anything.
pub struct KeywordStage {
    config: Arc<RetrievalConfig>,
    content_terms: Option<Regex>,
}

impl KeywordStage {
    /// Create the stage, compiling the content vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`DocQaError::ConfigError`] if the vocabulary does not compile.
    pub fn new(config: Arc<RetrievalConfig>) -> Result<Self> {
        let content_terms = term_alternation(&config.content_terms)
            .transpose()
            .map_err(|e| DocQaError::ConfigError(format!("invalid content_terms: {e}")))?;
        Ok(Self { config, content_terms })
    }

    fn keyword_filter(ctx: &QueryContext) -> ChunkFilter {
        ChunkFilter::document(&ctx.document_id)
            .and(ChunkFilter::any(ctx.keywords.iter().map(ChunkFilter::contains).collect()))
    }

    /// Keyword matches that look like body content and carry no boilerplate.
    fn content_filter(&self, ctx: &QueryContext) -> ChunkFilter {
        let mut content = vec![ChunkFilter::min_length(self.config.content_min_chars + 1)];
        if let Some(terms) = &self.content_terms {
            content.push(ChunkFilter::matches(terms.clone()));
        }
        Self::keyword_filter(ctx)
            .and(ChunkFilter::any(content))
            .and(ChunkFilter::matches(boilerplate_markers().clone()).negate())
    }

    fn rank(&self, chunks: Vec<Chunk>, ctx: &QueryContext) -> Vec<ScoredChunk> {
        let config = &self.config;
        rank_by_keywords(chunks, &ctx.keywords, &config.preferred_length, config.keyword_limit)
    }

    fn is_content(&self, chunk: &Chunk) -> bool {
        chunk.char_len() >= self.config.front_matter_min_chars && !has_boilerplate(&chunk.text)
    }
}

/// Rank chunks by the number of distinct `keywords` they contain.
///
/// Ties prefer chunks whose length falls in `preferred`; remaining ties keep
/// their input order. Keeps at most `limit` chunks, scored by keyword count.
pub fn rank_by_keywords(
    chunks: Vec<Chunk>,
    keywords: &[String],
    preferred: &RangeInclusive<usize>,
    limit: usize,
) -> Vec<ScoredChunk> {
    let mut ranked: Vec<(usize, bool, Chunk)> = chunks
        .into_iter()
        .map(|chunk| {
            let lower = chunk.text.to_lowercase();
            let hits = keywords.iter().filter(|k| lower.contains(k.as_str())).count();
            let in_band = preferred.contains(&chunk.char_len());
            (hits, in_band, chunk)
        })
        .collect();

    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
    ranked.truncate(limit);
    ranked.into_iter().map(|(hits, _, chunk)| ScoredChunk::scored(chunk, hits as f32)).collect()
}

#[async_trait]
impl RetrievalStage for KeywordStage {
    fn strategy(&self) -> Strategy {
        Strategy::Keyword
    }

    fn is_triggered(&self, ctx: &QueryContext) -> bool {
        !ctx.keywords.is_empty() && !ctx.shape.listing && !ctx.shape.detail_overview
    }

    async fn retrieve(
        &self,
        store: &dyn ChunkStore,
        ctx: &QueryContext,
    ) -> Result<Vec<ScoredChunk>> {
        let limit = self.config.keyword_candidates;
        let candidates = store.find(&Self::keyword_filter(ctx), limit).await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let (content, front_matter): (Vec<Chunk>, Vec<Chunk>) =
            candidates.into_iter().partition(|c| self.is_content(c));
        let pool = if content.is_empty() { front_matter } else { content };
        let ranked = self.rank(pool, ctx);

        let top_is_front_matter = ranked.first().is_some_and(|c| has_boilerplate(&c.chunk.text));
        if !top_is_front_matter {
            return Ok(ranked);
        }

        debug!(
            document_id = %ctx.document_id,
            "top keyword hit is front matter, re-querying content"
        );
        let retry = store.find(&self.content_filter(ctx), limit).await?;
        if retry.is_empty() {
            return Ok(ranked);
        }
        Ok(self.rank(retry, ctx))
    }
}
