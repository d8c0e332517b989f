//! Page-aware chunking of extracted document text.
//!
//! This module provides the [`Chunker`] trait and [`PageChunker`], which
//! merges paragraphs within a page up to a character budget and never lets a
//! chunk span two pages, so every chunk carries the page it came from.

use crate::document::{Chunk, ChunkPosition, DocumentUpload};

/// A strategy for splitting an uploaded document into chunks.
///
/// Implementations produce [`Chunk`]s without embeddings, numbered by a
/// document-wide `chunk_index` starting at zero. Embeddings are attached later
/// by the [`Ingestor`](crate::Ingestor).
pub trait Chunker: Send + Sync {
    /// Split an upload into chunks. Blank pages produce nothing.
    fn chunk(&self, upload: &DocumentUpload) -> Vec<Chunk>;
}

/// Merges paragraphs of each page into chunks of at most `chunk_size` characters.
///
/// Paragraphs are separated by blank lines. A paragraph longer than
/// `chunk_size` is split on word boundaries; a single word longer than
/// `chunk_size` is split on character boundaries.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{Chunker, DocumentUpload, PageChunker};
///
/// let upload = DocumentUpload::new("doc-1", "atoms.pdf", pages);
/// let chunks = PageChunker::new(1000).chunk(&upload);
/// ```
#[derive(Debug, Clone)]
pub struct PageChunker {
    chunk_size: usize,
}

impl Default for PageChunker {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl PageChunker {
    /// Create a chunker with the given maximum chunk length in characters.
    ///
    /// A `chunk_size` of zero is treated as one.
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size: chunk_size.max(1) }
    }

    /// Chunk texts of one page.
    pub fn split_page(&self, page: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for paragraph in paragraphs(page) {
            for piece in split_long(&paragraph, self.chunk_size) {
                let needed = piece.chars().count() + if current.is_empty() { 0 } else { 2 };
                if !current.is_empty() && current.chars().count() + needed > self.chunk_size {
                    chunks.push(std::mem::take(&mut current));
                }
                if !current.is_empty() {
                    current.push_str("\n\n");
                }
                current.push_str(&piece);
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }
}

impl Chunker for PageChunker {
    fn chunk(&self, upload: &DocumentUpload) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for (page_index, page) in upload.pages.iter().enumerate() {
            let page_number = u32::try_from(page_index + 1).ok();
            for text in self.split_page(page) {
                let position = ChunkPosition { chunk_index: chunks.len(), page_number };
                chunks.push(Chunk::new(&upload.document_id, text, position, &upload.file_name));
            }
        }
        chunks
    }
}

/// Paragraphs of `text` with their internal whitespace collapsed.
fn paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }
    paragraphs
}

/// Split `text` into pieces of at most `max` characters on word boundaries.
fn split_long(text: &str, max: usize) -> Vec<String> {
    if text.chars().count() <= max {
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > max {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            pieces.extend(chars.chunks(max).map(|c| c.iter().collect::<String>()));
            continue;
        }
        let needed = word_len + usize::from(!current.is_empty());
        if current.chars().count() + needed > max {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
