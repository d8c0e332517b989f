//! Pattern tables and question-shape classification.
//!
//! The cascade and the relevance gate make their decisions from the tables in
//! this module. Dispatch code elsewhere only asks questions such as "is this a
//! listing request?" or "does this chunk look like front matter?", so the
//! heuristics can be tuned here without touching control flow.

use std::sync::LazyLock;

use regex::Regex;

/// Substrings that mark a question as being about the document itself.
pub const META_MARKERS: &[&str] = &[
    "pdf",
    "document",
    "file",
    "summary",
    "overview",
    "contents",
    "topics",
    "chapters",
    "sections",
    "tell me about",
    "what is this",
    "details about this",
];

/// Topics that have nothing to do with document question answering.
const UNRELATED_PATTERNS: &[(&str, &str)] = &[
    ("operating systems", r"(?i)\b(windows|linux|ubuntu|mac\s?os|android|iphone|ios)\b"),
    (
        "office software",
        r"(?i)\b(microsoft office|ms word|excel|powerpoint|outlook|google docs|spreadsheets?)\b",
    ),
    ("weather", r"(?i)\b(weather|forecast|raining|snowing|sunny)\b"),
    (
        "food",
        r"(?i)\b(recipes?|cooking|cook|restaurants?|food|dinner|lunch|breakfast|pizza)\b",
    ),
    (
        "sports",
        r"(?i)\b(sports?|football|soccer|basketball|baseball|cricket|tennis|olympics)\b",
    ),
    (
        "entertainment",
        r"(?i)\b(movies?|films?|tv shows?|netflix|music|songs?|celebrit(y|ies)|video games?)\b",
    ),
    ("travel", r"(?i)\b(travel|vacation|holidays?|flights?|hotels?|tourism)\b"),
    ("shopping", r"(?i)\b(shopping|buy|purchase|discounts?|amazon|coupons?)\b"),
];

/// Words ignored when extracting search keywords from a question.
pub const STOP_WORDS: &[&str] = &[
    "what", "which", "when", "where", "whom", "whose", "does", "this", "that", "these",
    "those", "there", "their", "them", "they", "then", "than", "with", "from", "into",
    "onto", "about", "explain", "describe", "tell", "topic", "topics", "please", "could",
    "would", "should", "have", "been", "being", "your", "yours", "some", "more", "most",
    "also", "just", "like", "mean", "means", "give", "show", "know", "want", "need",
    "here", "were", "will", "shall", "each", "other", "such", "only", "very",
];

/// Weighted terms used to re-rank overview candidates.
pub const OVERVIEW_WEIGHTS: &[(&str, u32)] =
    &[("introduction", 3), ("overview", 2), ("this book", 2), ("covers", 1)];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("unreachable error: built-in pattern table is valid")
}

static UNRELATED: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    UNRELATED_PATTERNS.iter().map(|(topic, pattern)| (*topic, compile(pattern))).collect()
});

static LISTING_NOUN: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(topics?|chapters?|sections?|contents|headings?|table of contents)\b")
});

static LISTING_VERB: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(list|show|what are|which|give|enumerate)\b"));

static EXPLANATION: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)\b(explain|explanation|describe|elaborate|why|how does|how do|how is|meaning of)\b",
    )
});

static DETAIL_REQUEST: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(details?|overview|summary|summari[sz]e|about)\b")
});

static DOCUMENT_NOUN: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(pdf|document|book|file)\b"));

static STRUCTURAL_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?im)(\bcontents\b|\bchapter\s+\d+|^\s*\d+(\.\d+)*\.?\s+\S)")
});

static STRUCTURAL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)^\s*(\d+(\.\d+)*\.?\s+\S|chapter\s+\d+|section\s+\d+|part\s+[ivx\d]+\b)")
});

static OVERVIEW_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(introduction|abstract|overview|preface|this book|covers)\b")
});

static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    compile(concat!(
        r"(?i)(series editors?|book series|published by|all rights reserved|\bisbn\b|",
        r"copyright|©|printed in|library of congress|springer|elsevier|wiley|university press)",
    ))
});

static WORD: LazyLock<Regex> = LazyLock::new(|| compile(r"[\p{L}\p{N}]+"));

/// Lower-cased words of `text` longer than three characters, in order.
pub fn significant_words(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.chars().count() > 3)
        .collect()
}

/// Distinct search keywords of a question, stop words removed, in order.
pub fn extract_keywords(question: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for word in significant_words(question) {
        if STOP_WORDS.contains(&word.as_str()) || keywords.contains(&word) {
            continue;
        }
        keywords.push(word);
    }
    keywords
}

/// Whether the question is about the document as a whole.
pub fn is_meta_question(question: &str) -> bool {
    let lower = question.to_lowercase();
    META_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// The off-topic category the question matches, if any.
pub fn unrelated_topic(question: &str) -> Option<&'static str> {
    UNRELATED.iter().find(|(_, re)| re.is_match(question)).map(|(topic, _)| *topic)
}

/// Regex matching table-of-contents markers and numbered heading lines.
pub fn structural_markers() -> &'static Regex {
    &STRUCTURAL_MARKERS
}

/// Whether a single line reads like a heading or table-of-contents entry.
pub fn is_structural_line(line: &str) -> bool {
    STRUCTURAL_LINE.is_match(line)
}

/// Regex matching introduction and overview vocabulary.
pub fn overview_markers() -> &'static Regex {
    &OVERVIEW_MARKERS
}

/// Regex matching series, publisher and copyright boilerplate.
pub fn boilerplate_markers() -> &'static Regex {
    &BOILERPLATE
}

/// Whether `text` contains front-matter boilerplate.
pub fn has_boilerplate(text: &str) -> bool {
    BOILERPLATE.is_match(text)
}

/// Weighted overview score: the sum of the weights of the terms present.
pub fn overview_score(text: &str) -> u32 {
    let lower = text.to_lowercase();
    OVERVIEW_WEIGHTS
        .iter()
        .filter(|(term, _)| lower.contains(term))
        .map(|(_, weight)| weight)
        .sum()
}

/// A case-insensitive whole-word alternation of `terms`.
///
/// Returns `None` when `terms` is empty.
pub fn term_alternation(terms: &[String]) -> Option<Result<Regex, regex::Error>> {
    if terms.is_empty() {
        return None;
    }
    let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    Some(Regex::new(&format!(r"(?i)\b({alternation})")))
}

/// How a question is shaped, as far as the cascade and composer care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuestionShape {
    /// Number of whitespace-separated words.
    pub word_count: usize,
    /// A short, explicit request for a list of topics, chapters or sections.
    pub listing: bool,
    /// The question asks for an explanation.
    pub explanation: bool,
    /// The question asks for details or an overview of the document as a whole.
    pub detail_overview: bool,
}

impl QuestionShape {
    /// Classify `question`.
    pub fn classify(question: &str) -> Self {
        let word_count = question.split_whitespace().count();
        let explanation = EXPLANATION.is_match(question);
        let asks_for_list = LISTING_NOUN.is_match(question)
            && (LISTING_VERB.is_match(question) || word_count <= 3);
        let listing = word_count < 8 && asks_for_list && !explanation;
        let detail_overview = DETAIL_REQUEST.is_match(question) && DOCUMENT_NOUN.is_match(question);
        Self { word_count, listing, explanation, detail_overview }
    }
}
