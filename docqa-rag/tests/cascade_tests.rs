//! Integration tests for the retrieval cascade.

mod common;

use std::sync::Arc;

use common::{CountingStore, DIM, MockEmbeddingProvider, embedded_chunks, padded, plain_chunks};
use docqa_rag::retrieval::VectorStage;
use docqa_rag::{
    ChunkStore, InMemoryChunkStore, QueryContext, RetrievalConfig, RetrievalEngine,
    RetrievalStage, Strategy,
};

fn config() -> Arc<RetrievalConfig> {
    Arc::new(RetrievalConfig::default())
}

fn engine(store: Arc<dyn ChunkStore>) -> RetrievalEngine {
    RetrievalEngine::new(store, config()).unwrap()
}

fn ctx_with_embedding(question: &str) -> QueryContext {
    QueryContext::new(question, "doc", Some(MockEmbeddingProvider::vector(question)))
}

#[tokio::test]
async fn accepted_vector_result_short_circuits_later_stages() {
    let store = Arc::new(CountingStore::new());
    store
        .inner
        .insert_many(embedded_chunks(
            "doc",
            &[
                "The ground state energy of helium",
                "Electron spin and the exclusion principle",
                "1. Introduction",
            ],
        ))
        .await
        .unwrap();

    let ctx = ctx_with_embedding("ground state energy of helium");
    let result = engine(store.clone()).retrieve(&ctx).await;

    assert_eq!(result.strategy, Strategy::Vector);
    assert_eq!(result.chunks[0].chunk.text, "The ground state energy of helium");
    assert!(result.best_score().unwrap() > 0.99);
    assert_eq!(CountingStore::count(&store.calls.vector), 1);
    assert_eq!(CountingStore::count(&store.calls.find), 0);
    assert_eq!(CountingStore::count(&store.calls.sample), 0);
}

#[tokio::test]
async fn low_vector_scores_are_discarded_entirely() {
    let store = Arc::new(CountingStore::with_vector_scores(vec![0.3, 0.2]));
    store
        .inner
        .insert_many(plain_chunks("doc", &["energy levels of hydrogen", "spin orbit coupling"]))
        .await
        .unwrap();
    let ctx = QueryContext::new("energy levels", "doc", Some(vec![1.0; DIM]));

    let stage0 = VectorStage::new(config()).retrieve(store.as_ref(), &ctx).await.unwrap();
    assert!(stage0.is_empty());

    let result = engine(store.clone()).retrieve(&ctx).await;
    assert_eq!(result.strategy, Strategy::Keyword);
    assert_eq!(result.chunks[0].chunk.text, "energy levels of hydrogen");
}

#[tokio::test]
async fn missing_primary_index_retries_alternatives_in_order() {
    let store = Arc::new(InMemoryChunkStore::with_indexes(["embedding_index"]));
    store.insert_many(embedded_chunks("doc", &["photon absorption spectrum"])).await.unwrap();

    let result = engine(store).retrieve(&ctx_with_embedding("photon absorption spectrum")).await;
    assert_eq!(result.strategy, Strategy::Vector);
}

#[tokio::test]
async fn no_usable_index_falls_through_to_keyword_search() {
    let store = Arc::new(InMemoryChunkStore::with_indexes(Vec::<String>::new()));
    store.insert_many(embedded_chunks("doc", &["photon absorption spectrum"])).await.unwrap();

    let result = engine(store).retrieve(&ctx_with_embedding("photon absorption")).await;
    assert_eq!(result.strategy, Strategy::Keyword);
    assert_eq!(result.len(), 1);
}

#[tokio::test]
async fn store_failures_in_every_stage_yield_an_empty_result() {
    let store = Arc::new(CountingStore::new());
    store.set_failing(true);

    let result = engine(store.clone()).retrieve(&ctx_with_embedding("electron energy")).await;

    assert!(result.is_empty());
    assert_eq!(CountingStore::count(&store.calls.vector), 1);
    assert_eq!(CountingStore::count(&store.calls.find), 1);
    assert_eq!(CountingStore::count(&store.calls.sample), 1);
}

#[tokio::test]
async fn listing_without_markers_falls_back_to_short_chunks() {
    let store = Arc::new(InMemoryChunkStore::new());
    let body = padded("The helium atom has two electrons", 600);
    store.insert_many(plain_chunks("doc", &["Atomic Structure", &body, "Spin"])).await.unwrap();

    let result = engine(store).retrieve(&QueryContext::new("list the topics", "doc", None)).await;

    assert_eq!(result.strategy, Strategy::Structural);
    let texts: Vec<&str> = result.chunks.iter().map(|c| c.chunk.text.as_str()).collect();
    assert_eq!(texts, vec!["Atomic Structure"]);
}

#[tokio::test]
async fn unanswered_listing_request_skips_keyword_search() {
    let store = Arc::new(InMemoryChunkStore::new());
    let body = padded("A list of electron properties", 600);
    store.insert_many(plain_chunks("doc", &[&body])).await.unwrap();

    let ctx = QueryContext::new("list the topics", "doc", None);
    assert!(ctx.shape.listing);
    assert_eq!(ctx.keywords, vec!["list"]);

    let result = engine(store).retrieve(&ctx).await;
    assert_eq!(result.strategy, Strategy::DiversitySample);
    assert_eq!(result.len(), 1);
}

#[tokio::test]
async fn overview_requests_rank_introductions_first() {
    let store = Arc::new(InMemoryChunkStore::new());
    store
        .insert_many(plain_chunks(
            "doc",
            &[
                "Preface. An overview of quantum theory.",
                "Introduction. This book covers the helium atom.",
                "Electron spin.",
            ],
        ))
        .await
        .unwrap();

    let ctx = QueryContext::new("give me details about this pdf", "doc", None);
    let result = engine(store).retrieve(&ctx).await;

    assert_eq!(result.strategy, Strategy::Overview);
    assert_eq!(result.len(), 2);
    assert!(result.chunks[0].chunk.text.starts_with("Introduction"));
}

#[tokio::test]
async fn front_matter_top_hit_triggers_content_requery() {
    let store = Arc::new(InMemoryChunkStore::new());
    store
        .insert_many(plain_chunks(
            "doc",
            &[
                "Springer Series on Atomic Physics. Copyright 2009. helium spectrum",
                "Chapter 3 discusses helium",
            ],
        ))
        .await
        .unwrap();

    let result = engine(store).retrieve(&QueryContext::new("helium spectrum", "doc", None)).await;

    assert_eq!(result.strategy, Strategy::Keyword);
    let texts: Vec<&str> = result.chunks.iter().map(|c| c.chunk.text.as_str()).collect();
    assert_eq!(texts, vec!["Chapter 3 discusses helium"]);
}

#[tokio::test]
async fn content_chunks_outrank_front_matter() {
    let store = Arc::new(InMemoryChunkStore::new());
    let front = padded("Published by Elsevier. All rights reserved. electron energy", 400);
    let content = padded("The electron energy in the ground state", 800);
    store.insert_many(plain_chunks("doc", &[&front, &content])).await.unwrap();

    let result = engine(store).retrieve(&QueryContext::new("electron energy", "doc", None)).await;

    assert_eq!(result.strategy, Strategy::Keyword);
    assert_eq!(result.len(), 1);
    assert!(result.chunks[0].chunk.text.starts_with("The electron energy"));
}

#[tokio::test]
async fn unmatched_questions_fall_back_to_a_bounded_sample() {
    let store = Arc::new(InMemoryChunkStore::new());
    let texts: Vec<String> = (0..12).map(|i| format!("paragraph number {i}")).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    store.insert_many(plain_chunks("doc", &refs)).await.unwrap();

    let result = engine(store).retrieve(&QueryContext::new("zzzz qqqq", "doc", None)).await;

    assert_eq!(result.strategy, Strategy::DiversitySample);
    assert_eq!(result.len(), 8);
    assert!(result.chunks.iter().all(|c| c.score.is_none()));
}
