//! The answer request/response entry point.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::chat::{ChatModel, condense_question};
use crate::composer::{IRRELEVANT_MESSAGE, ResponseComposer, UPLOAD_PROMPT};
use crate::config::RetrievalConfig;
use crate::document::{AnswerRequest, AnswerResponse, RetrievalResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{DocQaError, Result};
use crate::gate::RelevanceGate;
use crate::retrieval::{QueryContext, RetrievalEngine};
use crate::store::{ChunkFilter, ChunkStore};

/// Answers questions about uploaded documents.
///
/// Each call is independent: the assistant holds no per-request state, so one
/// instance can serve concurrent requests.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{AnswerRequest, DocumentAssistant};
///
/// let assistant = DocumentAssistant::builder()
///     .store(store)
///     .embedding_provider(embedder)
///     .build()?;
/// let response = assistant.answer(AnswerRequest::new("list the chapters", "doc-1")).await?;
/// ```
pub struct DocumentAssistant {
    store: Arc<dyn ChunkStore>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    chat_model: Option<Arc<dyn ChatModel>>,
    config: Arc<RetrievalConfig>,
    gate: RelevanceGate,
    engine: RetrievalEngine,
    composer: ResponseComposer,
}

impl DocumentAssistant {
    /// Create a new builder for constructing a [`DocumentAssistant`].
    pub fn builder() -> DocumentAssistantBuilder {
        DocumentAssistantBuilder::default()
    }

    /// The configuration in use.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Answer a question about one document.
    ///
    /// Documents with no chunks and questions rejected by the relevance gate
    /// get fixed messages with empty sources rather than errors. Failures of
    /// individual retrieval stages or of the embedding service only narrow
    /// the cascade.
    ///
    /// # Errors
    ///
    /// Returns [`DocQaError::StoreUnavailable`] if the chunk store cannot be
    /// reached when counting the document's chunks.
    pub async fn answer(&self, request: AnswerRequest) -> Result<AnswerResponse> {
        match self.retrieve(&request).await {
            Ok((question, result)) => Ok(self.composer.compose(&question, &result)),
            Err(DocQaError::Irrelevant { .. }) => Ok(AnswerResponse::message(IRRELEVANT_MESSAGE)),
            Err(DocQaError::NoDocuments { .. }) => Ok(AnswerResponse::message(UPLOAD_PROMPT)),
            Err(e) => Err(e),
        }
    }

    /// Run the gate and the cascade without composing an answer.
    ///
    /// Returns the condensed question alongside the ranked chunks, for callers
    /// that hand the context to their own generator.
    ///
    /// # Errors
    ///
    /// - [`DocQaError::Irrelevant`] if the relevance gate rejects the question
    /// - [`DocQaError::StoreUnavailable`] if the document's chunks cannot be counted
    /// - [`DocQaError::NoDocuments`] if nothing has been ingested for the document
    pub async fn retrieve(&self, request: &AnswerRequest) -> Result<(String, RetrievalResult)> {
        let document_id = request.document_id.as_str();
        let question = condense_question(
            self.chat_model.as_deref(),
            &request.recent_history,
            &request.text,
            self.config.max_history_turns,
        )
        .await;

        if !self.gate.is_plausibly_relevant(&question, document_id).await {
            info!(document_id, "question rejected as unrelated to the document");
            return Err(DocQaError::Irrelevant { document_id: document_id.to_string() });
        }

        let filter = ChunkFilter::document(document_id);
        let count = self.store.count_documents(&filter).await.map_err(|e| {
            error!(document_id, error = %e, "chunk store unavailable");
            match e {
                DocQaError::StoreUnavailable { .. } => e,
                other => DocQaError::store("unknown", other.to_string()),
            }
        })?;
        if count == 0 {
            info!(document_id, "no chunks ingested for document");
            return Err(DocQaError::NoDocuments { document_id: document_id.to_string() });
        }

        let embedding = match &self.embedder {
            Some(embedder) => match embedder.embed(&question).await {
                Ok(embedding) => Some(embedding),
                Err(e) => {
                    warn!(
                        document_id,
                        provider = embedder.name(),
                        error = %e,
                        "question embedding failed, skipping vector search"
                    );
                    None
                }
            },
            None => None,
        };

        let ctx = QueryContext::new(question, document_id, embedding);
        let result = self.engine.retrieve(&ctx).await;
        info!(
            document_id,
            strategy = %result.strategy,
            result_count = result.len(),
            "retrieved context"
        );

        Ok((ctx.question, result))
    }
}

/// Builder for constructing a [`DocumentAssistant`].
#[derive(Default)]
pub struct DocumentAssistantBuilder {
    store: Option<Arc<dyn ChunkStore>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    chat_model: Option<Arc<dyn ChatModel>>,
    config: Option<RetrievalConfig>,
}

impl DocumentAssistantBuilder {
    /// Set the chunk store. Required.
    pub fn store(mut self, store: Arc<dyn ChunkStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the embedding provider used for question embeddings.
    ///
    /// Without one, vector search is skipped.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(provider);
        self
    }

    /// Set the chat model used to condense follow-up questions.
    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(model);
        self
    }

    /// Set the retrieval configuration. Defaults to [`RetrievalConfig::default`].
    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the [`DocumentAssistant`].
    ///
    /// # Errors
    ///
    /// Returns [`DocQaError::ConfigError`] if no store is set or the
    /// configuration is invalid.
    pub fn build(self) -> Result<DocumentAssistant> {
        let store =
            self.store.ok_or_else(|| DocQaError::ConfigError("store is required".to_string()))?;
        let config = Arc::new(self.config.unwrap_or_default());
        let engine = RetrievalEngine::new(store.clone(), config.clone())?;

        Ok(DocumentAssistant {
            gate: RelevanceGate::new(store.clone(), config.clone()),
            composer: ResponseComposer::new(config.clone()),
            engine,
            store,
            embedder: self.embedder,
            chat_model: self.chat_model,
            config,
        })
    }
}
