//! 설정 모듈 - 환경변수 기반 런타임 설정
//!
//! 프로바이더 접속 정보와 파이프라인 파라미터(검색 임계값, 신뢰도 가중치,
//! 청크 크기)를 한 곳에서 로드합니다.
//!
//! ## 환경변수
//! - `OPENAI_API_KEY`, `OPENAI_BASE_URL`
//! - `RFP_RAG_CHAT_MODEL`, `RFP_RAG_EMBEDDING_MODEL`
//! - `RFP_RAG_MAX_RETRIES`, `RFP_RAG_TIMEOUT_SECS`
//! - `RFP_RAG_TOP_K`, `RFP_RAG_MIN_SIMILARITY`, `RFP_RAG_MAX_PASSAGES`, `RFP_RAG_CHUNK_SIZE`
//! - `RFP_RAG_CONFIDENCE_TOP`, `RFP_RAG_CONFIDENCE_AVERAGE`, `RFP_RAG_CONFIDENCE_PER_PASSAGE`
//! - `RFP_RAG_DATA_DIR`

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::answer::{ConfidenceWeights, DEFAULT_MAX_PASSAGES};
use crate::knowledge::{RetrievalParams, DEFAULT_MAX_CHUNK_SIZE};

/// 기본 OpenAI 호환 엔드포인트
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// 기본 채팅 모델
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";

/// 기본 임베딩 모델
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

// ============================================================================
// Types
// ============================================================================

/// OpenAI 호환 API 설정
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API 키 (프로바이더를 호출하는 명령에서만 필수)
    pub api_key: Option<String>,
    /// API 베이스 URL
    pub base_url: String,
    /// 답변 생성 모델
    pub chat_model: String,
    /// 임베딩 모델
    pub embedding_model: String,
    /// 429/5xx 재시도 횟수
    pub max_retries: u32,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            max_retries: 3,
            timeout_secs: 30,
        }
    }
}

impl OpenAiConfig {
    /// API 키 반환 (없으면 에러)
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => anyhow::bail!(
                "API key not found. Set OPENAI_API_KEY environment variable.\n\
                 Get your API key at: https://platform.openai.com/api-keys"
            ),
        }
    }

    /// API 키 존재 여부
    pub fn has_api_key(&self) -> bool {
        self.require_api_key().is_ok()
    }
}

/// 전체 런타임 설정
#[derive(Debug, Clone)]
pub struct RagConfig {
    pub openai: OpenAiConfig,
    /// 질문별 검색 파라미터 (topK, 최소 유사도)
    pub retrieval: RetrievalParams,
    /// 답변 신뢰도 가중치
    pub confidence: ConfidenceWeights,
    /// 답변 프롬프트에 넣을 최대 구절 수
    pub max_passages: usize,
    /// 지식베이스 청크 최대 크기 (문자 수)
    pub chunk_size: usize,
    /// 데이터 디렉토리 (knowledgebase.json 위치)
    pub data_dir: PathBuf,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig::default(),
            retrieval: RetrievalParams::default(),
            confidence: ConfidenceWeights::default(),
            max_passages: DEFAULT_MAX_PASSAGES,
            chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            data_dir: default_data_dir(),
        }
    }
}

impl RagConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 로드
    ///
    /// 값이 없으면 기본값을 쓰고, 파싱할 수 없는 값은 에러로 처리합니다.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai = OpenAiConfig {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai.base_url),
            chat_model: get("RFP_RAG_CHAT_MODEL").unwrap_or(defaults.openai.chat_model),
            embedding_model: get("RFP_RAG_EMBEDDING_MODEL")
                .unwrap_or(defaults.openai.embedding_model),
            max_retries: parse_or(&get, "RFP_RAG_MAX_RETRIES", defaults.openai.max_retries)?,
            timeout_secs: parse_or(&get, "RFP_RAG_TIMEOUT_SECS", defaults.openai.timeout_secs)?,
        };

        let retrieval = RetrievalParams {
            top_k: parse_or(&get, "RFP_RAG_TOP_K", defaults.retrieval.top_k)?,
            min_similarity: parse_or(
                &get,
                "RFP_RAG_MIN_SIMILARITY",
                defaults.retrieval.min_similarity,
            )?,
        };

        let confidence = ConfidenceWeights {
            top_similarity: parse_or(
                &get,
                "RFP_RAG_CONFIDENCE_TOP",
                defaults.confidence.top_similarity,
            )?,
            average_similarity: parse_or(
                &get,
                "RFP_RAG_CONFIDENCE_AVERAGE",
                defaults.confidence.average_similarity,
            )?,
            per_passage: parse_or(
                &get,
                "RFP_RAG_CONFIDENCE_PER_PASSAGE",
                defaults.confidence.per_passage,
            )?,
            ..defaults.confidence
        };

        let max_passages: usize =
            parse_or(&get, "RFP_RAG_MAX_PASSAGES", defaults.max_passages)?;
        if max_passages == 0 {
            anyhow::bail!("RFP_RAG_MAX_PASSAGES must be greater than zero");
        }

        let chunk_size: usize = parse_or(&get, "RFP_RAG_CHUNK_SIZE", defaults.chunk_size)?;
        if chunk_size == 0 {
            anyhow::bail!("RFP_RAG_CHUNK_SIZE must be greater than zero");
        }

        let data_dir = get("RFP_RAG_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        Ok(Self {
            openai,
            retrieval,
            confidence,
            max_passages,
            chunk_size,
            data_dir,
        })
    }

    /// 지식베이스 파일 경로
    pub fn knowledgebase_path(&self) -> PathBuf {
        self.data_dir.join("knowledgebase.json")
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 데이터 디렉토리 경로 (~/.rfp-rag/)
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rfp-rag")
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = RagConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.retrieval.top_k, 5);
        assert!((config.retrieval.min_similarity - 0.3).abs() < 1e-9);
        assert_eq!(config.chunk_size, 250);
        assert_eq!(config.max_passages, 5);
        assert_eq!(config.openai.chat_model, "gpt-4");
        assert_eq!(config.openai.embedding_model, "text-embedding-3-small");
        assert!(!config.openai.has_api_key());
    }

    #[test]
    fn test_overrides() {
        let config = RagConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("RFP_RAG_TOP_K", "8"),
            ("RFP_RAG_MIN_SIMILARITY", "0.45"),
            ("RFP_RAG_CONFIDENCE_TOP", "0.6"),
            ("RFP_RAG_MAX_PASSAGES", "3"),
            ("RFP_RAG_DATA_DIR", "/tmp/rfp"),
        ]))
        .unwrap();

        assert_eq!(config.openai.require_api_key().unwrap(), "sk-test");
        assert_eq!(config.openai.base_url, "http://localhost:8080/v1");
        assert_eq!(config.retrieval.top_k, 8);
        assert!((config.retrieval.min_similarity - 0.45).abs() < 1e-9);
        assert!((config.confidence.top_similarity - 0.6).abs() < 1e-9);
        assert!((config.confidence.average_similarity - 0.3).abs() < 1e-9);
        assert_eq!(config.max_passages, 3);
        assert_eq!(
            config.knowledgebase_path(),
            PathBuf::from("/tmp/rfp/knowledgebase.json")
        );
    }

    #[test]
    fn test_invalid_number_is_error() {
        let result = RagConfig::from_lookup(lookup_from(&[("RFP_RAG_TOP_K", "five")]));
        assert!(result.is_err());
        assert!(result
            .err()
            .map(|e| e.to_string().contains("RFP_RAG_TOP_K"))
            .unwrap_or(false));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let result = RagConfig::from_lookup(lookup_from(&[("RFP_RAG_CHUNK_SIZE", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_max_passages_rejected() {
        let result = RagConfig::from_lookup(lookup_from(&[("RFP_RAG_MAX_PASSAGES", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = RagConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(!config.openai.has_api_key());
    }
}
