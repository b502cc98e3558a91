//! 에러 타입 - RFP 처리 파이프라인 에러 종류
//!
//! 외부 협력자(추출기, 임베딩, 답변 생성)는 `anyhow::Result`를 반환하고,
//! 코디네이터 경계에서 이 enum으로 분류됩니다.

use thiserror::Error;

use crate::models::RfpProcessingStatus;
use crate::pipeline::Transition;

/// RFP 처리 에러
#[derive(Debug, Error)]
pub enum RfpError {
    /// 추출된 텍스트가 비어있음
    #[error("No text could be extracted from the document")]
    NoTextExtracted,

    /// 질문이 하나도 탐지되지 않음
    #[error("No questions detected in the document")]
    NoQuestionsDetected,

    /// 벡터 차원 불일치 (잘라내거나 채우지 않음)
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// 임베딩 배치 실패
    #[error("Failed to generate embeddings: {0:#}")]
    EmbeddingFailure(#[source] anyhow::Error),

    /// 답변 생성 실패
    #[error("Failed to generate answer: {0:#}")]
    AnswerGenerationFailure(#[source] anyhow::Error),

    /// 지식베이스가 비어있음 (파이프라인 호출 전 확인)
    #[error("Knowledgebase is empty. Add documents before processing an RFP")]
    EmptyKnowledgebase,

    /// 텍스트 추출기 실패 (손상/미지원 입력)
    #[error("Failed to extract text: {0:#}")]
    Extraction(#[source] anyhow::Error),

    /// 상태 전이 테이블에 없는 전이
    #[error("Illegal status transition from {from:?} on {transition:?}")]
    IllegalTransition {
        from: RfpProcessingStatus,
        transition: Transition,
    },
}

/// 파이프라인 결과 타입
pub type RfpResult<T> = std::result::Result<T, RfpError>;
