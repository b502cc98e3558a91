//! 답변 생성 모듈 - 검색된 구절을 근거로 RFP 질문에 답변
//!
//! ## 사용법
//! ```rust,ignore
//! let generator = OpenAiAnswerGenerator::new(&config.openai, config.confidence)?;
//! let response = generator.answer("What is your delivery timeline?", &passages, 5).await?;
//! println!("{} ({:.0}%)", response.answer, response.confidence * 100.0);
//! ```

mod confidence;

use std::collections::HashSet;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::OpenAiConfig;
use crate::models::{AnswerResponse, RagSearchResult};
use crate::openai::OpenAiClient;

pub use confidence::ConfidenceWeights;

/// 답변에 포함할 기본 최대 구절 수
pub const DEFAULT_MAX_PASSAGES: usize = 5;

const SYSTEM_PROMPT: &str = "You are an expert assistant helping to answer questions from \
Request for Proposal (RFP) documents. Your task is to provide clear, accurate, and \
comprehensive answers based on the provided context from the knowledgebase.

Guidelines:
1. Answer directly and professionally
2. Use the provided context to support your answer
3. If the context doesn't contain enough information, clearly state what additional information would be needed
4. Structure your answer clearly with bullet points or numbered lists when appropriate
5. Be specific and actionable in your recommendations
6. If you're making assumptions, clearly state them";

// ============================================================================
// AnswerProvider Trait
// ============================================================================

/// 답변 생성 프로바이더 트레이트
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// 질문과 순위가 매겨진 구절로 답변 생성
    ///
    /// 신뢰도는 항상 `[0.1, 0.95]` 범위입니다.
    async fn answer(
        &self,
        question: &str,
        passages: &[RagSearchResult],
        max_passages: usize,
    ) -> Result<AnswerResponse>;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// OpenAI Chat Completions
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI 호환 답변 생성기
#[derive(Debug, Clone)]
pub struct OpenAiAnswerGenerator {
    client: OpenAiClient,
    model: String,
    weights: ConfidenceWeights,
}

impl OpenAiAnswerGenerator {
    pub fn new(config: &OpenAiConfig, weights: ConfidenceWeights) -> Result<Self> {
        Ok(Self {
            client: OpenAiClient::new(config)?,
            model: config.chat_model.clone(),
            weights,
        })
    }
}

#[async_trait]
impl AnswerProvider for OpenAiAnswerGenerator {
    async fn answer(
        &self,
        question: &str,
        passages: &[RagSearchResult],
        max_passages: usize,
    ) -> Result<AnswerResponse> {
        if question.trim().is_empty() {
            anyhow::bail!("Question cannot be empty");
        }

        let user_prompt = build_user_prompt(question, passages, max_passages);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
        };

        tracing::debug!(
            "Requesting answer from {} with {} passages",
            self.model,
            passages.len().min(max_passages)
        );

        let response: ChatResponse = self
            .client
            .post("chat/completions", &request)
            .await
            .context("Answer generation request failed")?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .context("Answer generation returned no content")?;

        Ok(AnswerResponse {
            answer,
            confidence: self.weights.score(passages),
            source_documents: source_documents(passages),
        })
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 근거 구절 블록 (최대 `max_passages`개)
pub fn build_context(passages: &[RagSearchResult], max_passages: usize) -> String {
    let mut context = String::new();
    if passages.is_empty() || max_passages == 0 {
        return context;
    }

    context.push_str("Based on the following relevant information from the knowledgebase:\n\n");
    for passage in passages.iter().take(max_passages) {
        let _ = writeln!(
            context,
            "**Source: {} (Similarity: {:.1}%)**",
            passage.file_name,
            passage.similarity_score * 100.0
        );
        context.push_str(&passage.text);
        context.push_str("\n\n");
    }
    context
}

fn build_user_prompt(question: &str, passages: &[RagSearchResult], max_passages: usize) -> String {
    format!(
        "Context from knowledgebase:\n{}\n\nQuestion: {}\n\n\
         Please provide a comprehensive answer to this question based on the context provided above.",
        build_context(passages, max_passages),
        question.trim()
    )
}

/// 근거 파일명 (중복 제거, 순서 유지)
pub fn source_documents(passages: &[RagSearchResult]) -> Vec<String> {
    let mut seen = HashSet::new();
    passages
        .iter()
        .filter(|p| seen.insert(p.file_name.as_str()))
        .map(|p| p.file_name.clone())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
