//! 처리 상태 전이 테이블
//!
//! (현재 상태 × 전이) → 다음 상태. 테이블에 없는 조합은 `IllegalTransition`.

use crate::error::{RfpError, RfpResult};
use crate::models::RfpProcessingStatus;

/// 단계 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// 다음 단계로 진행
    Advance,
    /// 실패로 종료
    Fail,
}

/// 전이 테이블 조회
pub fn next_status(
    from: RfpProcessingStatus,
    transition: Transition,
) -> RfpResult<RfpProcessingStatus> {
    use RfpProcessingStatus::*;

    let next = match (from, transition) {
        (Completed | Error, _) => None,
        (_, Transition::Fail) => Some(Error),
        (NotStarted, Transition::Advance) => Some(Uploading),
        (Uploading, Transition::Advance) => Some(ExtractingText),
        (ExtractingText, Transition::Advance) => Some(DetectingQuestions),
        (DetectingQuestions, Transition::Advance) => Some(GeneratingEmbeddings),
        (GeneratingEmbeddings, Transition::Advance) => Some(RetrievingRelevantContent),
        (RetrievingRelevantContent, Transition::Advance) => Some(GeneratingAnswers),
        (GeneratingAnswers, Transition::Advance) => Some(Completed),
    };

    next.ok_or(RfpError::IllegalTransition { from, transition })
}

/// 상태 머신
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMachine {
    current: RfpProcessingStatus,
}

impl Default for StatusMachine {
    fn default() -> Self {
        Self {
            current: RfpProcessingStatus::NotStarted,
        }
    }
}

impl StatusMachine {
    pub fn current(&self) -> RfpProcessingStatus {
        self.current
    }

    /// 전이 적용 (실패 시 상태 유지)
    pub fn apply(&mut self, transition: Transition) -> RfpResult<RfpProcessingStatus> {
        self.current = next_status(self.current, transition)?;
        Ok(self.current)
    }
}
