//! 임베딩 모듈 - OpenAI 호환 API를 통한 텍스트 벡터화
//!
//! 텍스트를 벡터로 변환하는 임베딩 프로바이더입니다.
//! 질문 검색과 지식베이스 인덱싱 양쪽에서 사용됩니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = OpenAiEmbedding::new(&config.openai)?;
//! let embedding = embedder.embed("What is your delivery timeline?").await?;
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::OpenAiConfig;
use crate::openai::OpenAiClient;

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 빈 텍스트는 호출 없이 빈 벡터로 매핑합니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 배치 임베딩 (기본 구현: 동시 호출 후 입력 순서대로 합침)
    ///
    /// 하나라도 실패하면 배치 전체가 실패합니다.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        futures::future::try_join_all(texts.iter().map(|text| self.embed(text))).await
    }

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// OpenAI Embedding
// ============================================================================

/// OpenAI 임베딩 요청
/// source: https://platform.openai.com/docs/api-reference/embeddings/create
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

/// OpenAI 임베딩 응답
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI 호환 임베딩 구현체
#[derive(Debug, Clone)]
pub struct OpenAiEmbedding {
    client: OpenAiClient,
    model: String,
}

impl OpenAiEmbedding {
    /// 설정으로 생성 (API 키 필수)
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        Ok(Self {
            client: OpenAiClient::new(config)?,
            model: config.embedding_model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        Ok(results.pop().unwrap_or_default())
    }

    /// 한 번의 요청으로 배치 처리 (빈 텍스트는 요청에서 제외)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results: Vec<Vec<f32>> = vec![Vec::new(); texts.len()];

        let pending: Vec<(usize, &str)> = texts
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(i, text)| (i, text.as_str()))
            .collect();

        if pending.is_empty() {
            return Ok(results);
        }

        let request = EmbedRequest {
            model: &self.model,
            input: pending.iter().map(|(_, text)| *text).collect(),
        };

        tracing::debug!(
            "Embedding batch of {} texts with {}",
            pending.len(),
            self.model
        );

        let response: EmbedResponse = self
            .client
            .post("embeddings", &request)
            .await
            .context("Embedding request failed")?;

        place_embeddings(&mut results, &pending, response.data)?;
        Ok(results)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// 응답 벡터를 `index` 기준으로 원래 위치에 배치
fn place_embeddings(
    results: &mut [Vec<f32>],
    pending: &[(usize, &str)],
    data: Vec<EmbeddingData>,
) -> Result<()> {
    if data.len() != pending.len() {
        anyhow::bail!(
            "Embedding response size mismatch: sent {}, received {}",
            pending.len(),
            data.len()
        );
    }

    let mut filled = vec![false; pending.len()];
    for entry in data {
        let (slot, _) = pending
            .get(entry.index)
            .with_context(|| format!("Embedding response index out of range: {}", entry.index))?;
        if std::mem::replace(&mut filled[entry.index], true) {
            anyhow::bail!("Embedding response has duplicate index: {}", entry.index);
        }
        results[*slot] = entry.embedding;
    }

    if let Some(missing) = filled.iter().position(|done| !done) {
        anyhow::bail!("Embedding response is missing index: {}", missing);
    }

    Ok(())
}

// ============================================================================
// Factory Function
// ============================================================================

/// 임베딩 프로바이더 생성
pub fn create_embedder(config: &OpenAiConfig) -> Result<OpenAiEmbedding> {
    let embedder = OpenAiEmbedding::new(config)?;
    tracing::info!("Using embedding model: {}", embedder.model());
    Ok(embedder)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 글자 수 기반 가짜 프로바이더
    struct LengthEmbedding {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text == "boom" {
                anyhow::bail!("provider down");
            }
            Ok(vec![text.len() as f32, 1.0])
        }

        fn name(&self) -> &str {
            "length"
        }
    }

    #[tokio::test]
    async fn test_default_batch_preserves_order() {
        let provider = LengthEmbedding {
            calls: AtomicUsize::new(0),
        };
        let texts = vec!["a".to_string(), "abc".to_string(), "ab".to_string()];
        let vectors = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0][0], 1.0);
        assert_eq!(vectors[1][0], 3.0);
        assert_eq!(vectors[2][0], 2.0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_default_batch_is_atomic() {
        let provider = LengthEmbedding {
            calls: AtomicUsize::new(0),
        };
        let texts = vec!["ok".to_string(), "boom".to_string()];
        assert!(provider.embed_batch(&texts).await.is_err());
    }

    #[test]
    fn test_place_embeddings_reorders_by_index() {
        let mut results = vec![Vec::new(); 3];
        let pending = vec![(0, "a"), (2, "c")];
        let data = vec![
            EmbeddingData {
                index: 1,
                embedding: vec![2.0],
            },
            EmbeddingData {
                index: 0,
                embedding: vec![1.0],
            },
        ];

        place_embeddings(&mut results, &pending, data).unwrap();
        assert_eq!(results[0], vec![1.0]);
        assert!(results[1].is_empty());
        assert_eq!(results[2], vec![2.0]);
    }

    #[test]
    fn test_place_embeddings_size_mismatch() {
        let mut results = vec![Vec::new(); 2];
        let pending = vec![(0, "a"), (1, "b")];
        let data = vec![EmbeddingData {
            index: 0,
            embedding: vec![1.0],
        }];
        assert!(place_embeddings(&mut results, &pending, data).is_err());
    }

    #[test]
    fn test_place_embeddings_duplicate_index() {
        let mut results = vec![Vec::new(); 2];
        let pending = vec![(0, "a"), (1, "b")];
        let data = vec![
            EmbeddingData {
                index: 0,
                embedding: vec![1.0],
            },
            EmbeddingData {
                index: 0,
                embedding: vec![2.0],
            },
        ];

        let err = place_embeddings(&mut results, &pending, data).unwrap_err();
        assert!(err.to_string().contains("duplicate index"));
    }

    #[test]
    fn test_create_embedder_without_key_returns_error() {
        let result = create_embedder(&OpenAiConfig::default());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_blank_inputs_skip_request() {
        // 모두 빈 텍스트면 네트워크 호출 없이 빈 벡터
        let config = OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "http://127.0.0.1:9".to_string(),
            max_retries: 0,
            ..OpenAiConfig::default()
        };
        let embedder = OpenAiEmbedding::new(&config).unwrap();
        let vectors = embedder
            .embed_batch(&["".to_string(), "   ".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![Vec::<f32>::new(), Vec::new()]);
        assert!(embedder.embed("").await.unwrap().is_empty());
    }
}
