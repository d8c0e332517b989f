//! Relevance gate: cheap rejection of questions unrelated to a document.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::RetrievalConfig;
use crate::heuristics::{is_meta_question, significant_words, unrelated_topic};
use crate::store::{ChunkFilter, ChunkStore};

/// Decides whether a question is plausibly answerable from a document.
///
/// The gate never fails. Questions about the document itself always pass, as
/// do questions it has too little signal to judge. Store errors and empty
/// documents pass too, leaving the decision to the retrieval cascade.
pub struct RelevanceGate {
    store: Arc<dyn ChunkStore>,
    config: Arc<RetrievalConfig>,
}

impl RelevanceGate {
    /// Create a gate sampling chunks from `store`.
    pub fn new(store: Arc<dyn ChunkStore>, config: Arc<RetrievalConfig>) -> Self {
        Self { store, config }
    }

    /// Whether `question` may be answerable from `document_id`.
    ///
    /// A question is rejected when it matches an unrelated-topic pattern, or
    /// when none of its terms overlap the domain vocabulary found in a small
    /// sample of the document. A sample with no vocabulary term at all rejects
    /// every such question unless `pass_without_vocabulary` is set. Unrelated
    /// patterns are checked before the store is queried.
    pub async fn is_plausibly_relevant(&self, question: &str, document_id: &str) -> bool {
        if is_meta_question(question) {
            debug!(document_id, "meta question passes the gate");
            return true;
        }

        if let Some(topic) = unrelated_topic(question) {
            debug!(document_id, topic, "question matches an unrelated topic");
            return false;
        }

        let question_terms = significant_words(question);
        if question_terms.is_empty() {
            return true;
        }

        let filter = ChunkFilter::document(document_id);
        let sample_size = self.config.gate_sample_size;
        let sample = match self.store.aggregate_sample(&filter, sample_size).await {
            Ok(sample) => sample,
            Err(e) => {
                warn!(document_id, error = %e, "relevance gate sampling failed, allowing question");
                return true;
            }
        };
        if sample.is_empty() {
            return true;
        }

        let text =
            sample.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ").to_lowercase();
        let document_terms = document_terms(&text, &self.config.domain_terms);
        if document_terms.is_empty() && self.config.pass_without_vocabulary {
            debug!(document_id, "no vocabulary terms in sample, allowing question");
            return true;
        }

        let relevant = terms_overlap(&question_terms, &document_terms);
        debug!(
            document_id,
            relevant,
            document_terms = document_terms.len(),
            "relevance gate decision"
        );
        relevant
    }
}

/// The vocabulary terms present in lower-cased `text`.
pub fn document_terms<'a>(text: &str, vocabulary: &'a [String]) -> Vec<&'a str> {
    vocabulary.iter().map(String::as_str).filter(|term| text.contains(term)).collect()
}

/// Whether any question term contains, or is contained in, any document term.
pub fn terms_overlap(question_terms: &[String], document_terms: &[&str]) -> bool {
    question_terms.iter().any(|q| {
        document_terms.iter().any(|d| q.contains(d) || d.contains(q.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_terms_are_substring_matches() {
        let vocabulary = vec!["photon".to_string(), "electron".to_string(), "market".to_string()];
        let found = document_terms("photons and electrons collide", &vocabulary);
        assert_eq!(found, vec!["photon", "electron"]);
    }

    #[test]
    fn overlap_works_in_both_directions() {
        assert!(terms_overlap(&["electrons".into()], &["electron"]));
        assert!(terms_overlap(&["atom".into()], &["atomic"]));
        assert!(!terms_overlap(&["recipe".into()], &["photon", "electron"]));
    }
}
