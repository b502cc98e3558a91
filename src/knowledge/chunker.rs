//! Text Chunking Module
//!
//! 문장 경계를 존중하는 텍스트 분할을 제공합니다.
//! 공백을 정규화한 뒤 문장 단위로 나누고, 최대 크기 안에서 문장을 채워 넣습니다.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::TextChunk;

/// 기본 최대 청크 크기 (문자 수)
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 250;

/// 문장 경계: `.`, `!`, `?` 연속 뒤의 공백
static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+\s+").expect("Invalid regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할
    fn chunk(&self, text: &str) -> Vec<TextChunk>;

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// SentenceChunker
// ============================================================================

/// 문장 정렬 청커
///
/// - 연속 공백은 한 칸으로 합치고 양끝을 잘라냅니다
/// - 문장 종결 부호는 앞 문장에 포함됩니다
/// - 문장을 중간에서 자르지 않습니다 (최대 크기보다 긴 문장은 단독 청크)
/// - 오프셋은 정규화된 청크들을 이어 붙인 스트림 기준입니다
pub struct SentenceChunker {
    max_chunk_size: usize,
}

impl SentenceChunker {
    /// 최대 크기 지정하여 생성
    pub fn new(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }

    /// 기본 설정으로 생성 (250자)
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_SIZE)
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let normalized = normalize_whitespace(text);
        if normalized.is_empty() {
            return vec![];
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;
        let mut offset = 0usize;

        for sentence in split_sentences(&normalized) {
            let sentence_len = sentence.chars().count();

            // 구분 공백 포함하여 최대 크기 초과 시 현재 청크 마감
            if current_len > 0 && current_len + 1 + sentence_len > self.max_chunk_size {
                chunks.push(TextChunk::new(
                    std::mem::take(&mut current),
                    offset,
                    offset + current_len,
                ));
                offset += current_len;
                current_len = 0;
            }

            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(sentence);
            current_len += sentence_len;
        }

        if current_len > 0 {
            chunks.push(TextChunk::new(current, offset, offset + current_len));
        }

        tracing::debug!(
            "Split {} chars into {} chunks (max {})",
            normalized.chars().count(),
            chunks.len(),
            self.max_chunk_size
        );

        chunks
    }

    fn name(&self) -> &'static str {
        "SentenceChunker"
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 연속 공백을 한 칸으로 합치고 양끝 공백 제거
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// 문장 분할
///
/// 종결 부호(`.`, `!`, `?`) 연속 뒤에 공백이 오는 위치에서 나눕니다.
/// 종결 부호는 앞 문장에 남고, 빈 문장은 버립니다.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        let terminator_end = boundary.start() + boundary.as_str().trim_end().len();
        let sentence = text[start..terminator_end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = boundary.end();
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(SentenceChunker::with_defaults())
}

/// 문장 청커 생성 (최대 크기 지정)
pub fn sentence_chunker(max_chunk_size: usize) -> Box<dyn Chunker> {
    Box::new(SentenceChunker::new(max_chunk_size))
}

// ============================================================================
// Tests
// ============================================================================
