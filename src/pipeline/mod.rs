//! RFP 처리 파이프라인
//!
//! 텍스트 추출 → 질문 탐지 → 질문 임베딩 → 질문별 검색 + 답변 생성 → 완료.
//! 각 단계는 명시적 전이 테이블(`state`)을 따르며, 실패하면 `Error` 상태로
//! 기록하고 지금까지 채운 결과를 그대로 반환합니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let coordinator = ProcessingCoordinator::new(extractor, embedder, answerer, config.retrieval);
//! let result = coordinator.process(&bytes, "rfp.pdf", &knowledgebase, &NoopProgress).await;
//! ```

mod progress;
mod state;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::answer::{AnswerProvider, DEFAULT_MAX_PASSAGES};
use crate::detector::QuestionDetector;
use crate::embedding::EmbeddingProvider;
use crate::error::{RfpError, RfpResult};
use crate::extractor::TextExtractor;
use crate::knowledge::{RetrievalParams, SimilarityRetriever};
use crate::models::{Knowledgebase, RfpProcessingResult, RfpQuestion};

pub use progress::{
    phase_percent, question_percent, ChannelProgress, NoopProgress, ProgressEvent, ProgressSink,
};
pub use state::{next_status, StatusMachine, Transition};

/// 관련 내용이 없을 때의 답변
pub const FALLBACK_ANSWER: &str =
    "No relevant information found in the knowledgebase to answer this question.";

/// 관련 내용이 없을 때의 신뢰도
pub const FALLBACK_CONFIDENCE: f64 = 0.1;

// ============================================================================
// ProcessingCoordinator
// ============================================================================

/// RFP 처리 코디네이터
///
/// 실행 간 공유 상태가 없으므로 여러 문서를 동시에 처리해도 됩니다.
pub struct ProcessingCoordinator {
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn EmbeddingProvider>,
    answerer: Arc<dyn AnswerProvider>,
    detector: QuestionDetector,
    retriever: SimilarityRetriever,
    max_passages: usize,
}

impl ProcessingCoordinator {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn EmbeddingProvider>,
        answerer: Arc<dyn AnswerProvider>,
        retrieval: RetrievalParams,
    ) -> Self {
        Self {
            extractor,
            embedder,
            answerer,
            detector: QuestionDetector::default(),
            retriever: SimilarityRetriever::new(retrieval),
            max_passages: DEFAULT_MAX_PASSAGES,
        }
    }

    /// 질문 탐지기 교체
    pub fn with_detector(mut self, detector: QuestionDetector) -> Self {
        self.detector = detector;
        self
    }

    /// 답변 생성에 넘길 최대 구절 수
    pub fn with_max_passages(mut self, max_passages: usize) -> Self {
        self.max_passages = max_passages;
        self
    }

    /// 문서 1건 처리
    ///
    /// 에러를 반환하지 않습니다. 실패는 결과의 `processing_status`(`Error`)와
    /// `error_message`로 기록되며, 실패 전까지 채운 필드는 유지됩니다.
    pub async fn process(
        &self,
        bytes: &[u8],
        file_name: &str,
        knowledgebase: &Knowledgebase,
        progress: &dyn ProgressSink,
    ) -> RfpProcessingResult {
        let mut run = Run::new(file_name, progress);
        tracing::info!("Processing RFP: {}", file_name);

        let outcome = match run.advance("Uploading document...", None) {
            Ok(()) => self.run_stages(bytes, knowledgebase, &mut run).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => run.complete(),
            Err(e) => run.fail(e),
        }

        run.result
    }

    async fn run_stages(
        &self,
        bytes: &[u8],
        knowledgebase: &Knowledgebase,
        run: &mut Run<'_>,
    ) -> RfpResult<()> {
        // 1. 텍스트 추출
        run.advance("Extracting text from document...", None)?;
        let text = self
            .extractor
            .extract(bytes)
            .await
            .map_err(RfpError::Extraction)?;
        run.result.extracted_text = text;

        if run.result.extracted_text.trim().is_empty() {
            return Err(RfpError::NoTextExtracted);
        }

        // 2. 질문 탐지
        run.advance("Detecting questions in the document...", None)?;
        let detected = self.detector.detect(&run.result.extracted_text);
        if detected.is_empty() {
            return Err(RfpError::NoQuestionsDetected);
        }
        run.result.questions = detected.into_iter().map(RfpQuestion::new).collect();
        tracing::info!("Detected {} questions", run.result.questions.len());

        // 3. 질문 임베딩 (배치 단위 원자적 실패)
        run.advance("Generating embeddings for questions...", None)?;
        let texts: Vec<String> = run.result.questions.iter().map(|q| q.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(RfpError::EmbeddingFailure)?;

        if embeddings.len() != texts.len() {
            return Err(RfpError::EmbeddingFailure(anyhow::anyhow!(
                "expected {} vectors, received {}",
                texts.len(),
                embeddings.len()
            )));
        }
        for (question, embedding) in run.result.questions.iter_mut().zip(embeddings) {
            question.embedding = embedding;
        }

        // 4. 질문별 검색 + 답변
        run.advance("Retrieving relevant content and generating answers...", None)?;
        let total = run.result.questions.len();

        for index in 0..total {
            run.report(
                format!("Processing question {} of {}...", index + 1, total),
                question_percent(index, total),
            );

            let passages = self
                .retriever
                .retrieve(&run.result.questions[index].embedding, knowledgebase)?;

            if index == 0 {
                run.advance("Generating answers...", Some(question_percent(index, total)))?;
            }

            let question = &mut run.result.questions[index];
            if passages.is_empty() {
                tracing::debug!("No relevant content for question {}", index + 1);
                question.set_generated_answer(FALLBACK_ANSWER.to_string(), FALLBACK_CONFIDENCE);
                continue;
            }

            let mut seen = HashSet::new();
            question.relevant_knowledgebase_items = passages
                .iter()
                .filter(|p| seen.insert(p.knowledgebase_item_id.as_str()))
                .map(|p| p.knowledgebase_item_id.clone())
                .collect();

            let response = self
                .answerer
                .answer(&question.text, &passages, self.max_passages)
                .await
                .map_err(RfpError::AnswerGenerationFailure)?;

            tracing::debug!(
                "Answered question {} (confidence {:.2}, {} passages)",
                index + 1,
                response.confidence,
                passages.len()
            );
            question.set_generated_answer(response.answer, response.confidence);
        }

        Ok(())
    }
}

// ============================================================================
// Run State
// ============================================================================

/// 실행 1건의 상태 (결과 + 상태 머신 + 진행률)
struct Run<'a> {
    result: RfpProcessingResult,
    machine: StatusMachine,
    sink: &'a dyn ProgressSink,
    percent: u8,
}

impl<'a> Run<'a> {
    fn new(file_name: &str, sink: &'a dyn ProgressSink) -> Self {
        Self {
            result: RfpProcessingResult::new(file_name),
            machine: StatusMachine::default(),
            sink,
            percent: 0,
        }
    }

    /// 다음 단계로 전이 (진행률 미지정 시 단계 시작 진행률)
    fn advance(&mut self, message: &str, percent: Option<u8>) -> RfpResult<()> {
        let status = self.machine.apply(Transition::Advance)?;
        self.result.processing_status = status;
        self.result.current_step = status.step_label().to_string();

        tracing::info!("[{}] {}", self.result.file_name, status.step_label());
        self.report(message.to_string(), percent.unwrap_or(phase_percent(status)));
        Ok(())
    }

    /// 진행률 보고 (감소하지 않도록 보정)
    fn report(&mut self, message: String, percent: u8) {
        self.percent = self.percent.max(percent.min(100));
        self.result.progress = self.percent;
        self.sink.report(&ProgressEvent {
            status: self.result.processing_status,
            message,
            percent: self.percent,
        });
    }

    fn complete(&mut self) {
        if let Err(e) = self.advance("Processing completed", None) {
            self.fail(e);
            return;
        }
        self.result.completed_at = Some(Utc::now());
        tracing::info!(
            "Completed {} ({} questions)",
            self.result.file_name,
            self.result.questions.len()
        );
    }

    fn fail(&mut self, error: RfpError) {
        tracing::warn!("Processing failed for {}: {}", self.result.file_name, error);

        match self.machine.apply(Transition::Fail) {
            Ok(status) => {
                self.result.processing_status = status;
                self.result.current_step = status.step_label().to_string();
            }
            Err(e) => tracing::warn!("{}", e),
        }
        self.result.error_message = error.to_string();
        let message = format!("Error: {}", self.result.error_message);
        self.report(message, self.percent);
    }
}

// ============================================================================
// Tests
// ============================================================================
