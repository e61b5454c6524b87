//! Sentence-aware chunking with a character overlap window.
//!
//! Whitespace runs collapse to one space, sentences split after `.`, `!` or
//! `?` followed by a space, and sentences accumulate greedily until the next
//! one would push the buffer past `chunk_size`. A sentence is never split, so a
//! single sentence longer than `chunk_size` becomes one oversized chunk.
//! All lengths are counted in chars.

use regex::Regex;
use std::sync::OnceLock;

use crate::config::RagConfig;
use crate::types::{Chunk, ChunkMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self { chunk_size, overlap }
    }

    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn chunk(&self, text: &str, source_id: &str) -> Vec<Chunk> {
        chunk_text(text, source_id, self.chunk_size, self.overlap)
    }
}

/// Split `text` into overlapping chunks attributed to `source_id`.
///
/// Total over any input; empty or whitespace-only text yields no chunks.
pub fn chunk_text(text: &str, source_id: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    let normalized = normalize_whitespace(text);
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0usize;

    for sentence in split_sentences(normalized.trim()) {
        let sentence_len = sentence.chars().count();
        if !buffer.is_empty() && buffer_len + sentence_len > chunk_size {
            chunks.push(close_chunk(&buffer, buffer_len, source_id, chunk_size));
            let tail = char_suffix(&buffer, buffer_len, overlap);
            let tail_len = buffer_len.min(overlap);
            let mut next = String::with_capacity(tail.len() + 1 + sentence.len());
            next.push_str(tail);
            next.push(' ');
            next.push_str(sentence);
            buffer = next;
            buffer_len = tail_len + 1 + sentence_len;
        } else {
            buffer.push(' ');
            buffer.push_str(sentence);
            buffer_len += 1 + sentence_len;
        }
    }

    if !buffer.trim().is_empty() {
        chunks.push(close_chunk(&buffer, buffer_len, source_id, chunk_size));
    }
    chunks
}

fn close_chunk(buffer: &str, buffer_len: usize, source_id: &str, chunk_size: usize) -> Chunk {
    Chunk {
        content: buffer.trim().to_string(),
        metadata: ChunkMetadata {
            source: source_id.to_string(),
            start_char: buffer_len.saturating_sub(chunk_size),
        },
    }
}

fn normalize_whitespace(text: &str) -> std::borrow::Cow<'_, str> {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE
        .get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
        .replace_all(text, " ")
}

/// Split after terminal punctuation followed by a space, dropping that space.
/// Expects whitespace to be normalized already.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if let Some(&(space_at, ' ')) = chars.peek() {
            sentences.push(&text[start..space_at]);
            chars.next();
            start = space_at + 1;
        }
    }
    sentences.push(&text[start..]);
    sentences.retain(|s| !s.is_empty());
    sentences
}

/// The last `n` chars of `s`, where `s` holds `len` chars.
fn char_suffix(s: &str, len: usize, n: usize) -> &str {
    if n >= len {
        return s;
    }
    match s.char_indices().nth(len - n) {
        Some((at, _)) => &s[at..],
        None => "",
    }
}
