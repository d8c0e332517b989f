//! Answer templating over retrieved chunks.
//!
//! The composer never generates text of its own beyond fixed template
//! prefaces: every sentence of an answer body is copied from the supplied
//! chunks.

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::document::{AnswerResponse, RetrievalResult, ScoredChunk, Source};
use crate::heuristics::{QuestionShape, is_structural_line};

/// Answer given when no chunks exist for the document.
pub const UPLOAD_PROMPT: &str =
    "No document has been uploaded yet. Please upload a PDF so I can answer questions about it.";

/// Answer given when the relevance gate rejects the question.
pub const IRRELEVANT_MESSAGE: &str = "I can only answer questions related to the content of the \
     uploaded document. Please ask something about the document.";

/// Answer given when retrieval found nothing for a non-empty document.
pub const NO_MATCH_MESSAGE: &str = "I couldn't find relevant information about that in the \
     document. Try rephrasing your question.";

/// Most bullets a listing answer shows.
const MAX_LISTING_LINES: usize = 20;

/// Which template an answer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerTemplate {
    /// Bulleted topics, chapters or sections.
    Listing,
    /// "Based on the document" plus an excerpt.
    Explanation,
    /// "Here is an overview" plus an excerpt.
    Overview,
    /// Excerpt only.
    Generic,
}

impl AnswerTemplate {
    /// Choose the template for a question.
    pub fn for_question(question: &str) -> Self {
        let shape = QuestionShape::classify(question);
        if shape.listing {
            Self::Listing
        } else if shape.explanation {
            Self::Explanation
        } else if shape.detail_overview {
            Self::Overview
        } else {
            Self::Generic
        }
    }
}

/// Turns a ranked chunk set into an [`AnswerResponse`].
#[derive(Debug, Clone)]
pub struct ResponseComposer {
    config: Arc<RetrievalConfig>,
}

impl ResponseComposer {
    /// Create a composer.
    pub fn new(config: Arc<RetrievalConfig>) -> Self {
        Self { config }
    }

    /// Compose the answer to `question` from `result`, in ranking order.
    pub fn compose(&self, question: &str, result: &RetrievalResult) -> AnswerResponse {
        if result.is_empty() {
            return AnswerResponse::message(NO_MATCH_MESSAGE);
        }

        let answer = match AnswerTemplate::for_question(question) {
            AnswerTemplate::Listing => listing(&result.chunks),
            AnswerTemplate::Explanation => {
                format!("Based on the document:\n\n{}", self.excerpt(&result.chunks))
            }
            AnswerTemplate::Overview => {
                format!("Here is an overview of the document:\n\n{}", self.excerpt(&result.chunks))
            }
            AnswerTemplate::Generic => {
                format!("Here is what the document says:\n\n{}", self.excerpt(&result.chunks))
            }
        };

        AnswerResponse {
            answer,
            sources: self.sources(&result.chunks),
            strategy: Some(result.strategy),
        }
    }

    /// Chunk texts joined in order and cut to `excerpt_chars` characters.
    pub fn excerpt(&self, chunks: &[ScoredChunk]) -> String {
        let joined =
            chunks.iter().map(|c| c.chunk.text.trim()).collect::<Vec<_>>().join("\n\n");
        truncate_chars(&joined, self.config.excerpt_chars)
    }

    fn sources(&self, chunks: &[ScoredChunk]) -> Vec<Source> {
        chunks
            .iter()
            .map(|c| Source {
                text: truncate_chars(c.chunk.text.trim(), self.config.source_excerpt_chars),
                document_id: c.chunk.document_id.clone(),
                file_name: Some(c.chunk.source_file_name.clone()).filter(|name| !name.is_empty()),
                page_number: c.chunk.position.page_number,
            })
            .collect()
    }
}

/// A bulleted list of the heading lines in `chunks`.
///
/// Chunks without any heading line contribute their first line instead.
fn listing(chunks: &[ScoredChunk]) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for chunk in chunks {
        let text = chunk.chunk.text.as_str();
        let mut headings = text.lines().map(str::trim).filter(|l| is_structural_line(l)).peekable();
        if headings.peek().is_none() {
            lines.extend(text.lines().map(str::trim).find(|l| !l.is_empty()));
        } else {
            lines.extend(headings);
        }
    }

    let mut seen = std::collections::HashSet::new();
    lines.retain(|line| seen.insert(*line));
    lines.truncate(MAX_LISTING_LINES);

    let mut answer = String::from("Here are the topics covered in this document:\n");
    for line in lines {
        answer.push_str("\n- ");
        answer.push_str(line);
    }
    answer
}

/// Cut `text` to at most `max` characters, marking the cut with `...`.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
