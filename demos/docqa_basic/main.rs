//! # Document QA Basic Example
//!
//! Demonstrates ingesting a small document and answering questions that hit
//! different stages of the retrieval cascade, plus the fixed replies for an
//! unrelated question and a document that was never uploaded.
//!
//! Uses `InMemoryChunkStore` and a deterministic bag-of-words
//! `MockEmbeddingProvider`, so it runs with **zero API keys**.
//!
//! Run: `RUST_LOG=debug cargo run -p docqa-demos --example docqa_basic`

use std::sync::Arc;

use docqa_rag::heuristics::significant_words;
use docqa_rag::{
    AnswerRequest, DocumentAssistant, DocumentUpload, EmbeddingProvider, InMemoryChunkStore,
    Ingestor, RetrievalConfig,
};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// MockEmbeddingProvider: word-hash embeddings, so shared words mean similar vectors
// ---------------------------------------------------------------------------

struct MockEmbeddingProvider {
    dimensions: usize,
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> docqa_rag::Result<Vec<f32>> {
        let mut emb = vec![0.0f32; self.dimensions];
        for word in significant_words(text) {
            let hash =
                word.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            emb[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).compact().init();

    // -- 1. Shared components ---------------------------------------------
    let store = Arc::new(InMemoryChunkStore::new());
    let embedder = Arc::new(MockEmbeddingProvider { dimensions: 256 });

    // -- 2. Ingest a three-page document ----------------------------------
    let upload = DocumentUpload::new(
        "atoms",
        "atomic-physics.pdf",
        vec![
            "Contents\n1. Introduction\n2. The Helium Atom\n3. Electron Spin".into(),
            "1. Introduction\n\nThis book covers the quantum theory of simple atoms, \
             starting from hydrogen and moving to helium."
                .into(),
            "2. The Helium Atom\n\nThe ground state energy of helium is found with \
             perturbation theory. Each electron screens the nucleus from the other."
                .into(),
        ],
    );
    let report = Ingestor::new(store.clone(), Some(embedder.clone())).ingest(&upload).await?;
    println!("Ingested {} chunk(s), embedded: {}", report.chunk_count, report.embedded);

    // -- 3. Build the assistant -------------------------------------------
    let config = RetrievalConfig::builder()
        .domain_terms(["atom", "helium", "hydrogen", "electron", "energy", "quantum", "spin"])
        .build()?;
    let assistant = DocumentAssistant::builder()
        .store(store)
        .embedding_provider(embedder)
        .config(config)
        .build()?;

    // -- 4. Ask questions ---------------------------------------------------
    let questions = [
        ("atoms", "list the chapters"),
        ("atoms", "ground state energy of helium"),
        ("atoms", "give me details about this pdf"),
        ("atoms", "what's the weather today"),
        ("missing", "what is the ground state energy"),
    ];

    for (document_id, question) in questions {
        let response = assistant.answer(AnswerRequest::new(question, document_id)).await?;
        let strategy = response.strategy.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
        println!("\nQ [{document_id}]: {question}");
        println!("strategy: {strategy}, sources: {}", response.sources.len());
        println!("{}", response.answer);
    }

    println!("\nDone.");
    Ok(())
}
