//! 데이터 모델 - 지식베이스 문서, RFP 질문, 처리 결과
//!
//! 모든 JSON 필드는 lowerCamelCase로 직렬화됩니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RfpError, RfpResult};

/// 지식베이스 저장 포맷 버전
pub const KNOWLEDGEBASE_VERSION: &str = "1.0";

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// Knowledgebase
// ============================================================================

/// 지식베이스 문서의 청크
///
/// `start_index`/`end_index`는 정규화된 청크 스트림 기준 문자 오프셋입니다.
/// (`end_index`는 exclusive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextChunk {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub embedding: Vec<f32>,
    pub start_index: usize,
    pub end_index: usize,
}

impl TextChunk {
    /// 임베딩 없는 청크 생성
    pub fn new(text: String, start_index: usize, end_index: usize) -> Self {
        Self {
            id: new_id(),
            text,
            embedding: Vec::new(),
            start_index,
            end_index,
        }
    }

    /// 청크 길이 (문자 수)
    pub fn char_len(&self) -> usize {
        self.end_index - self.start_index
    }
}

/// 지식베이스 문서 1건
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgebaseItem {
    pub id: String,
    pub file_name: String,
    pub original_text: String,
    #[serde(default)]
    pub original_text_embedding: Vec<f32>,
    #[serde(default)]
    pub chunks: Vec<TextChunk>,
    pub created_at: DateTime<Utc>,
}

impl KnowledgebaseItem {
    /// 새 문서 생성 (id, 생성 시각 자동 부여)
    pub fn new(file_name: impl Into<String>, original_text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            file_name: file_name.into(),
            original_text: original_text.into(),
            original_text_embedding: Vec::new(),
            chunks: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// 지식베이스 전체 (저장 단위)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Knowledgebase {
    pub version: String,
    #[serde(default)]
    pub items: Vec<KnowledgebaseItem>,
    pub last_updated: DateTime<Utc>,
}

impl Default for Knowledgebase {
    fn default() -> Self {
        Self {
            version: KNOWLEDGEBASE_VERSION.to_string(),
            items: Vec::new(),
            last_updated: Utc::now(),
        }
    }
}

impl Knowledgebase {
    /// 문서 추가 (같은 파일명은 대소문자 무시하고 교체)
    pub fn upsert_by_file_name(&mut self, item: KnowledgebaseItem) {
        self.items
            .retain(|i| !i.file_name.eq_ignore_ascii_case(&item.file_name));
        self.items.push(item);
    }

    /// ID로 문서 제거
    pub fn remove_by_id(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    /// 전체 청크 수
    pub fn chunk_count(&self) -> usize {
        self.items.iter().map(|i| i.chunks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 파이프라인 호출 전 사전 조건
    pub fn ensure_not_empty(&self) -> RfpResult<()> {
        if self.is_empty() {
            return Err(RfpError::EmptyKnowledgebase);
        }
        Ok(())
    }
}

// ============================================================================
// RFP
// ============================================================================

/// RFP 문서에서 탐지된 질문
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfpQuestion {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub confidence: f64,
    /// 답변 근거 문서 ID (중복 없음, 검색 순서 유지)
    #[serde(default)]
    pub relevant_knowledgebase_items: Vec<String>,
    #[serde(default)]
    pub is_answer_edited: bool,
    #[serde(default)]
    pub original_answer: String,
}

impl RfpQuestion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            embedding: Vec::new(),
            answer: String::new(),
            confidence: 0.0,
            relevant_knowledgebase_items: Vec::new(),
            is_answer_edited: false,
            original_answer: String::new(),
        }
    }

    /// 생성된 답변 기록 (answer와 original_answer 모두)
    pub fn set_generated_answer(&mut self, answer: String, confidence: f64) {
        self.original_answer = answer.clone();
        self.answer = answer;
        self.confidence = confidence;
        self.is_answer_edited = false;
    }

    /// 사용자 편집
    pub fn edit_answer(&mut self, answer: impl Into<String>) {
        self.answer = answer.into();
        self.is_answer_edited = self.answer != self.original_answer;
    }

    /// 원래 답변으로 되돌리기
    pub fn reset_answer(&mut self) {
        self.answer = self.original_answer.clone();
        self.is_answer_edited = false;
    }
}

/// 처리 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RfpProcessingStatus {
    NotStarted,
    Uploading,
    ExtractingText,
    DetectingQuestions,
    GeneratingEmbeddings,
    RetrievingRelevantContent,
    GeneratingAnswers,
    Completed,
    Error,
}

impl RfpProcessingStatus {
    /// 종료 상태 여부
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// 화면 표시용 단계 이름
    pub fn step_label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::Uploading => "Uploading document",
            Self::ExtractingText => "Extracting text",
            Self::DetectingQuestions => "Detecting questions",
            Self::GeneratingEmbeddings => "Generating embeddings",
            Self::RetrievingRelevantContent => "Retrieving relevant content",
            Self::GeneratingAnswers => "Generating answers",
            Self::Completed => "Completed",
            Self::Error => "Error occurred",
        }
    }
}

/// 처리 실행 기록
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfpProcessingResult {
    pub id: String,
    pub file_name: String,
    #[serde(default)]
    pub extracted_text: String,
    #[serde(default)]
    pub questions: Vec<RfpQuestion>,
    pub processing_status: RfpProcessingStatus,
    #[serde(default)]
    pub current_step: String,
    #[serde(default)]
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_message: String,
}

impl RfpProcessingResult {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            file_name: file_name.into(),
            extracted_text: String::new(),
            questions: Vec::new(),
            processing_status: RfpProcessingStatus::NotStarted,
            current_step: RfpProcessingStatus::NotStarted.step_label().to_string(),
            progress: 0,
            created_at: Utc::now(),
            completed_at: None,
            error_message: String::new(),
        }
    }

    /// 답변이 채워진 질문 수
    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| !q.answer.is_empty())
            .count()
    }

    /// 평균 신뢰도 (질문이 없으면 None)
    pub fn average_confidence(&self) -> Option<f64> {
        if self.questions.is_empty() {
            return None;
        }
        let total: f64 = self.questions.iter().map(|q| q.confidence).sum();
        Some(total / self.questions.len() as f64)
    }
}

// ============================================================================
// Retrieval / Answer DTOs
// ============================================================================

/// 검색 결과 1건 (저장하지 않음)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagSearchResult {
    pub knowledgebase_item_id: String,
    pub text_chunk_id: String,
    pub text: String,
    pub similarity_score: f32,
    pub file_name: String,
}

/// 답변 생성 응답
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub answer: String,
    pub confidence: f64,
    #[serde(default)]
    pub source_documents: Vec<String>,
}

// ============================================================================
// Tests
// ============================================================================
