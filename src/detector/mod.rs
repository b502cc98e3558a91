//! 질문 탐지 모듈 - RFP 문서에서 질문 추출
//!
//! 두 가지 채널을 합칩니다:
//! - 명시적 질문: 문장 단위로 `?`, 의문사 시작어, 명령형 + RFP 키워드 판별
//! - 암묵적 질문: 번호/글머리 목록 항목 중 RFP 요구사항을 의문문으로 변환
//!
//! 중복 제거는 문자열 완전 일치 기준입니다. 같은 요구사항이 두 채널에서
//! 다른 문장으로 나오면 둘 다 남습니다.

mod rules;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::knowledge::{normalize_whitespace, split_sentences};

pub use rules::{
    QuestionRules, FALLBACK_PREFIX, IMPERATIVE_VERBS, QUESTION_STARTERS, REQUIREMENT_TRANSFORMS,
    RFP_KEYWORDS,
};

/// 번호 목록 마커: `12. `
static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s+(.*)$").expect("Invalid regex"));

/// 글머리 목록 마커: `• `, `- `, `* `
static BULLET_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[•\-\*]\s+(.*)$").expect("Invalid regex"));

// ============================================================================
// QuestionDetector
// ============================================================================

/// 질문 탐지기
#[derive(Debug, Clone, Default)]
pub struct QuestionDetector {
    rules: QuestionRules,
}

impl QuestionDetector {
    pub fn new(rules: QuestionRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &QuestionRules {
        &self.rules
    }

    /// 텍스트에서 질문 탐지
    ///
    /// 명시적 질문이 먼저, 암묵적 질문이 뒤에 오며 완전히 같은 문자열은 한 번만 나옵니다.
    pub fn detect(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return vec![];
        }

        let mut seen = HashSet::new();
        let mut questions = Vec::new();

        let explicit = self.detect_explicit(text);
        let implicit = self.detect_implicit(text);
        let explicit_count = explicit.len();

        for question in explicit.into_iter().chain(implicit) {
            if seen.insert(question.clone()) {
                questions.push(question);
            }
        }

        tracing::debug!(
            "Detected {} questions ({} explicit candidates)",
            questions.len(),
            explicit_count
        );

        questions
    }

    /// 단일 문장 판별
    pub fn is_question(&self, sentence: &str) -> bool {
        self.rules.is_explicit_question(sentence)
    }

    /// 명시적 질문 채널
    fn detect_explicit(&self, text: &str) -> Vec<String> {
        let normalized = normalize_whitespace(text);
        split_sentences(&normalized)
            .into_iter()
            .filter(|sentence| self.rules.is_explicit_question(sentence))
            .map(str::to_string)
            .collect()
    }

    /// 암묵적 질문 채널
    fn detect_implicit(&self, text: &str) -> Vec<String> {
        list_items(text)
            .into_iter()
            .filter(|item| {
                item.chars().count() >= self.rules.min_implicit_length
                    && self.rules.contains_keyword(&item.to_lowercase())
            })
            .filter_map(|item| self.rules.rewrite_requirement(&item))
            .collect()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 목록 항목 추출 (마커 제거됨)
///
/// 줄 단위로 공백을 정규화한 뒤, 마커로 시작하는 줄에서 항목을 열고
/// 다음 마커 줄 또는 빈 줄까지 이어지는 줄을 붙입니다.
fn list_items(text: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current: Option<String> = None;

    for raw_line in text.lines() {
        let line = normalize_whitespace(raw_line);

        if line.is_empty() {
            items.extend(current.take());
            continue;
        }

        let marker_body = NUMBERED_ITEM
            .captures(&line)
            .or_else(|| BULLET_ITEM.captures(&line))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        if let Some(body) = marker_body {
            items.extend(current.take());
            current = Some(body);
        } else if let Some(open) = current.as_mut() {
            open.push(' ');
            open.push_str(&line);
        }
    }

    items.extend(current);
    items.retain(|item| !item.trim().is_empty());
    items
}

// ============================================================================
// Tests
// ============================================================================
