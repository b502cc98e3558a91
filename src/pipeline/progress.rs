//! 진행률 이벤트와 수신자
//!
//! 7개 단계(업로드, 추출, 탐지, 임베딩, 검색, 답변, 완료)가 100%를 균등 분할합니다.
//! 질문별 루프는 검색 단계 시작점부터 답변 단계 끝까지 선형으로 진행합니다.

use tokio::sync::mpsc::UnboundedSender;

use crate::models::RfpProcessingStatus;

const PHASE_COUNT: u32 = 7;

/// 진행률 이벤트
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub status: RfpProcessingStatus,
    pub message: String,
    /// 0 ~ 100, 한 실행 안에서 감소하지 않음
    pub percent: u8,
}

/// 진행률 수신자
///
/// 코디네이터와 다른 실행 컨텍스트에서 호출될 수 있습니다.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn report(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// 이벤트를 버리는 수신자
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _event: &ProgressEvent) {}
}

/// 채널로 이벤트를 넘기는 수신자 (수신 측이 닫혀도 무시)
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, event: &ProgressEvent) {
        let _ = self.sender.send(event.clone());
    }
}

// ============================================================================
// Percent Mapping
// ============================================================================

/// 단계 시작 시점의 진행률
pub fn phase_percent(status: RfpProcessingStatus) -> u8 {
    use RfpProcessingStatus::*;

    let phase = match status {
        NotStarted | Uploading => 0,
        ExtractingText => 1,
        DetectingQuestions => 2,
        GeneratingEmbeddings => 3,
        RetrievingRelevantContent => 4,
        GeneratingAnswers => 5,
        Completed => PHASE_COUNT,
        // 실패는 별도 진행률 없음 (직전 값 유지)
        Error => 0,
    };
    (phase * 100 / PHASE_COUNT) as u8
}

/// 질문 루프 안에서 `index`번째 질문 처리 시작 시점의 진행률
pub fn question_percent(index: usize, total: usize) -> u8 {
    let start = phase_percent(RfpProcessingStatus::RetrievingRelevantContent) as usize;
    let end = (6 * 100 / PHASE_COUNT) as usize;
    if total == 0 {
        return start as u8;
    }
    (start + index.min(total) * (end - start) / total) as u8
}
