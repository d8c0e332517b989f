//! Configuration for the retrieval cascade, relevance gate and composer.

use std::ops::RangeInclusive;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DocQaError, Result};

/// Tunable parameters for answering questions against one document.
///
/// Every field has a default. Construct a customised instance with
/// [`RetrievalConfig::builder`], which validates the values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of results kept from vector search.
    pub vector_top_k: usize,
    /// Candidate pool considered by the vector index before taking `vector_top_k`.
    pub vector_candidates: usize,
    /// Minimum similarity the best vector hit must reach (0–1 cosine scale).
    pub similarity_floor: f32,
    /// Vector index names, primary first, then alternatives tried in order.
    pub vector_indexes: Vec<String>,
    /// Maximum chunks returned by the structural (table of contents) search.
    pub structural_limit: usize,
    /// Shortest chunk treated as a probable heading.
    pub heading_min_chars: usize,
    /// Longest chunk treated as a probable heading.
    pub heading_max_chars: usize,
    /// Chunks kept after overview re-ranking.
    pub overview_limit: usize,
    /// Candidates fetched by the keyword and overview searches.
    pub keyword_candidates: usize,
    /// Chunks kept after keyword ranking.
    pub keyword_limit: usize,
    /// Chunks shorter than this are treated as front matter by keyword search.
    pub front_matter_min_chars: usize,
    /// Chunk length band preferred when keyword counts tie.
    pub preferred_length: RangeInclusive<usize>,
    /// Chunks longer than this count as content in the keyword escape hatch.
    pub content_min_chars: usize,
    /// Size of the last-resort random sample.
    pub sample_size: usize,
    /// Number of chunks the relevance gate samples.
    pub gate_sample_size: usize,
    /// Characters of chunk text interpolated into an answer.
    pub excerpt_chars: usize,
    /// Characters of chunk text kept in each cited source.
    pub source_excerpt_chars: usize,
    /// Conversation turns considered when condensing a follow-up question.
    pub max_history_turns: usize,
    /// Vocabulary the relevance gate looks for in sampled document text.
    #[serde(deserialize_with = "deserialize_terms")]
    pub domain_terms: Vec<String>,
    /// Let questions through when the sampled text contains no vocabulary term.
    pub pass_without_vocabulary: bool,
    /// Terms that mark a chunk as body content in the keyword escape hatch.
    #[serde(deserialize_with = "deserialize_terms")]
    pub content_terms: Vec<String>,
}

/// General science and technical vocabulary used by the relevance gate.
const DEFAULT_DOMAIN_TERMS: &[&str] = &[
    "atom",
    "atomic",
    "electron",
    "photon",
    "proton",
    "neutron",
    "nucleus",
    "helium",
    "hydrogen",
    "quantum",
    "orbital",
    "spin",
    "energy",
    "wave",
    "particle",
    "momentum",
    "spectrum",
    "radiation",
    "physics",
    "chemistry",
    "molecule",
    "equation",
    "theory",
    "experiment",
    "hypothesis",
    "algorithm",
    "method",
    "analysis",
    "model",
    "function",
    "system",
    "network",
    "protein",
    "cell",
    "economy",
    "market",
    "history",
    "policy",
];

const DEFAULT_CONTENT_TERMS: &[&str] =
    &["chapter", "section", "equation", "energy", "electron", "quantum"];

fn to_strings(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            vector_top_k: 5,
            vector_candidates: 20,
            similarity_floor: 0.6,
            vector_indexes: to_strings(&["vector_index", "default", "embedding_index"]),
            structural_limit: 10,
            heading_min_chars: 10,
            heading_max_chars: 200,
            overview_limit: 8,
            keyword_candidates: 20,
            keyword_limit: 8,
            front_matter_min_chars: 300,
            preferred_length: 500..=2000,
            content_min_chars: 500,
            sample_size: 8,
            gate_sample_size: 3,
            excerpt_chars: 1000,
            source_excerpt_chars: 200,
            max_history_turns: 6,
            domain_terms: to_strings(DEFAULT_DOMAIN_TERMS),
            pass_without_vocabulary: false,
            content_terms: to_strings(DEFAULT_CONTENT_TERMS),
        }
    }
}

impl RetrievalConfig {
    /// Create a new builder for constructing a [`RetrievalConfig`].
    pub fn builder() -> RetrievalConfigBuilder {
        RetrievalConfigBuilder::default()
    }

    /// Check that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`DocQaError::ConfigError`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.vector_top_k == 0 {
            return Err(DocQaError::ConfigError("vector_top_k must be greater than zero".into()));
        }
        if self.vector_candidates < self.vector_top_k {
            return Err(DocQaError::ConfigError(format!(
                "vector_candidates ({}) must be at least vector_top_k ({})",
                self.vector_candidates, self.vector_top_k
            )));
        }
        if !(0.0..=1.0).contains(&self.similarity_floor) {
            return Err(DocQaError::ConfigError(format!(
                "similarity_floor ({}) must be within [0, 1]",
                self.similarity_floor
            )));
        }
        if self.vector_indexes.iter().all(|name| name.trim().is_empty()) {
            return Err(DocQaError::ConfigError(
                "at least one vector index name is required".into(),
            ));
        }
        if self.heading_min_chars > self.heading_max_chars {
            return Err(DocQaError::ConfigError(format!(
                "heading_min_chars ({}) must not exceed heading_max_chars ({})",
                self.heading_min_chars, self.heading_max_chars
            )));
        }
        if self.preferred_length.is_empty() {
            return Err(DocQaError::ConfigError("preferred_length range is empty".into()));
        }
        if self.sample_size == 0 {
            return Err(DocQaError::ConfigError("sample_size must be greater than zero".into()));
        }
        if self.keyword_limit == 0 || self.overview_limit == 0 || self.structural_limit == 0 {
            return Err(DocQaError::ConfigError("result limits must be greater than zero".into()));
        }
        let vocabularies =
            [("domain_terms", &self.domain_terms), ("content_terms", &self.content_terms)];
        for (field, terms) in vocabularies {
            let invalid = terms.iter().find(|t| t.trim().is_empty() || **t != t.to_lowercase());
            if let Some(term) = invalid {
                return Err(DocQaError::ConfigError(format!(
                    "{field} entry {term:?} must be non-empty and lower-case"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RetrievalConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetrievalConfigBuilder {
    config: RetrievalConfig,
}

impl RetrievalConfigBuilder {
    /// Set the number of vector hits kept and the candidate pool size.
    pub fn vector_search(mut self, top_k: usize, candidates: usize) -> Self {
        self.config.vector_top_k = top_k;
        self.config.vector_candidates = candidates;
        self
    }

    /// Set the minimum similarity the best vector hit must reach.
    pub fn similarity_floor(mut self, floor: f32) -> Self {
        self.config.similarity_floor = floor;
        self
    }

    /// Set the vector index names, primary first.
    pub fn vector_indexes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.vector_indexes = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the maximum number of chunks returned by the structural search.
    pub fn structural_limit(mut self, limit: usize) -> Self {
        self.config.structural_limit = limit;
        self
    }

    /// Set the character bounds of a probable heading chunk.
    pub fn heading_chars(mut self, min: usize, max: usize) -> Self {
        self.config.heading_min_chars = min;
        self.config.heading_max_chars = max;
        self
    }

    /// Set the keyword candidate pool and the number of ranked chunks kept.
    pub fn keyword_search(mut self, candidates: usize, limit: usize) -> Self {
        self.config.keyword_candidates = candidates;
        self.config.keyword_limit = limit;
        self
    }

    /// Set the number of chunks kept after overview re-ranking.
    pub fn overview_limit(mut self, limit: usize) -> Self {
        self.config.overview_limit = limit;
        self
    }

    /// Set the chunk length band preferred when keyword counts tie.
    pub fn preferred_length(mut self, band: RangeInclusive<usize>) -> Self {
        self.config.preferred_length = band;
        self
    }

    /// Set the size of the last-resort random sample.
    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.sample_size = size;
        self
    }

    /// Set the number of chunks the relevance gate samples.
    pub fn gate_sample_size(mut self, size: usize) -> Self {
        self.config.gate_sample_size = size;
        self
    }

    /// Set how many characters of chunk text go into an answer.
    pub fn excerpt_chars(mut self, chars: usize) -> Self {
        self.config.excerpt_chars = chars;
        self
    }

    /// Set how many conversation turns are used to condense a follow-up.
    pub fn max_history_turns(mut self, turns: usize) -> Self {
        self.config.max_history_turns = turns;
        self
    }

    /// Replace the relevance gate vocabulary.
    pub fn domain_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.domain_terms = normalize_terms(terms);
        self
    }

    /// Let questions through when the gate's sample holds no vocabulary term.
    pub fn pass_without_vocabulary(mut self, pass: bool) -> Self {
        self.config.pass_without_vocabulary = pass;
        self
    }

    /// Replace the content-indicator vocabulary of the keyword escape hatch.
    pub fn content_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.content_terms = normalize_terms(terms);
        self
    }

    /// Build the [`RetrievalConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`DocQaError::ConfigError`] if:
    /// - `vector_top_k == 0` or `vector_candidates < vector_top_k`
    /// - `similarity_floor` is outside `[0, 1]`
    /// - no vector index name is given
    /// - the heading bounds or preferred length band are inverted
    /// - `sample_size` or any result limit is zero
    pub fn build(self) -> Result<RetrievalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn deserialize_terms<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<String>::deserialize(deserializer).map(normalize_terms)
}

fn normalize_terms<I, S>(terms: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    terms
        .into_iter()
        .map(|t| t.into().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RetrievalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.vector_top_k, 5);
        assert_eq!(config.vector_candidates, 20);
        assert!((config.similarity_floor - 0.6).abs() < f32::EPSILON);
        assert_eq!(config.vector_indexes[0], "vector_index");
    }

    #[test]
    fn rejects_floor_outside_unit_range() {
        let err = RetrievalConfig::builder().similarity_floor(1.5).build().unwrap_err();
        assert!(matches!(err, DocQaError::ConfigError(_)));
    }

    #[test]
    fn rejects_candidate_pool_smaller_than_top_k() {
        let err = RetrievalConfig::builder().vector_search(10, 5).build().unwrap_err();
        assert!(err.to_string().contains("vector_candidates"));
    }

    #[test]
    fn rejects_missing_vector_indexes() {
        let err = RetrievalConfig::builder().vector_indexes(Vec::<String>::new()).build();
        assert!(err.is_err());
    }

    #[test]
    fn domain_terms_are_lowercased_and_trimmed() {
        let config =
            RetrievalConfig::builder().domain_terms(["  Photon ", "ELECTRON", ""]).build().unwrap();
        assert_eq!(config.domain_terms, vec!["photon", "electron"]);
    }

    #[test]
    fn deserializes_partial_config_with_defaults() {
        let config: RetrievalConfig =
            serde_json::from_str(r#"{ "similarity_floor": 0.75, "sample_size": 4 }"#).unwrap();
        assert!((config.similarity_floor - 0.75).abs() < f32::EPSILON);
        assert_eq!(config.sample_size, 4);
        assert_eq!(config.keyword_limit, 8);
    }

    #[test]
    fn deserialized_terms_are_normalized() {
        let config: RetrievalConfig =
            serde_json::from_str(r#"{ "domain_terms": ["Photon", " ELECTRON ", ""] }"#).unwrap();
        assert_eq!(config.domain_terms, vec!["photon", "electron"]);
        assert!(!config.pass_without_vocabulary);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unnormalized_terms_set_directly() {
        let config = RetrievalConfig { domain_terms: vec!["Photon".into()], ..Default::default() };
        assert!(matches!(config.validate(), Err(DocQaError::ConfigError(_))));

        let config = RetrievalConfig { content_terms: vec![String::new()], ..Default::default() };
        assert!(config.validate().is_err());
    }
}
