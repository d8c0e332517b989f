//! Property tests for the relevance gate, the similarity floor and in-memory
//! vector search ordering.

mod common;

use std::sync::Arc;

use common::{CountingStore, plain_chunks};
use docqa_rag::document::{Chunk, ChunkPosition, ScoredChunk};
use docqa_rag::heuristics::META_MARKERS;
use docqa_rag::retrieval::VectorStage;
use docqa_rag::{ChunkStore, InMemoryChunkStore, RelevanceGate, RetrievalConfig};
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map("non-zero embedding", |mut v| {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-6 {
            return None;
        }
        for val in &mut v {
            *val /= norm;
        }
        Some(v)
    })
}

fn scored(score: f32) -> ScoredChunk {
    let position = ChunkPosition { chunk_index: 0, page_number: None };
    ScoredChunk::scored(Chunk::new("doc", "text", position, "a.pdf"), score)
}

/// Questions containing a document meta term always pass the gate, whatever
/// the document says and even when the store is down.
mod prop_meta_questions_pass_gate {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn meta_questions_are_relevant(
            prefix in "[a-z ]{0,20}",
            marker in proptest::sample::select(META_MARKERS),
            suffix in "[a-z ]{0,20}",
            document in "[a-z]{1,10}( [a-z]{1,10}){0,5}",
            store_down in any::<bool>(),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let relevant = rt.block_on(async {
                let store = Arc::new(CountingStore::new());
                store.inner.insert_many(plain_chunks("doc", &[document.as_str()])).await.unwrap();
                store.set_failing(store_down);
                let gate = RelevanceGate::new(store, Arc::new(RetrievalConfig::default()));
                gate.is_plausibly_relevant(&format!("{prefix} {marker} {suffix}"), "doc").await
            });
            prop_assert!(relevant);
        }
    }
}

/// Stage 0 never returns a result set whose best score is below the floor.
mod prop_similarity_floor {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn kept_results_reach_the_floor(
            scores in proptest::collection::vec(0.0f32..=1.0f32, 0..10),
            floor in 0.0f32..=1.0f32,
        ) {
            let hits = scores.iter().map(|s| scored(*s)).collect();
            let kept = VectorStage::apply_floor(hits, floor);
            let best = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);

            if kept.is_empty() {
                prop_assert!(scores.is_empty() || best < floor);
            } else {
                prop_assert_eq!(kept.len(), scores.len());
                prop_assert!(best >= floor);
            }
        }
    }
}

/// In-memory vector search returns at most `k` results, ordered by
/// descending score on the 0–1 scale.
mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_k(
            embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let count = embeddings.len();
            let results = rt.block_on(async {
                let store = InMemoryChunkStore::new();
                let chunks = embeddings
                    .into_iter()
                    .enumerate()
                    .map(|(i, e)| {
                        let position = ChunkPosition { chunk_index: i, page_number: None };
                        Chunk::new("doc", format!("chunk {i}"), position, "a.pdf").with_embedding(e)
                    })
                    .collect();
                store.insert_many(chunks).await.unwrap();
                store.vector_search("doc", &query, k, 20, "vector_index").await.unwrap()
            });

            prop_assert!(results.len() <= k);
            prop_assert_eq!(results.len(), count.min(k).min(20));
            for pair in results.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
            for hit in &results {
                let score = hit.score.unwrap();
                prop_assert!((0.0..=1.0).contains(&score));
            }
        }
    }
}
