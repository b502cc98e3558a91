//! Knowledge Ingestion - 문서를 지식베이스 항목으로 변환
//!
//! 청크 분할 → 청크 배치 임베딩 → 문서 전체 임베딩 순으로 처리합니다.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::embedding::EmbeddingProvider;
use crate::error::RfpError;
use crate::models::{Knowledgebase, KnowledgebaseItem};

use super::chunker::Chunker;

/// 문서 전체 임베딩에 사용할 최대 문자 수
pub const DOCUMENT_EMBEDDING_CHARS: usize = 8000;

/// 지식베이스 인덱서
pub struct KnowledgeIngestor {
    chunker: Box<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl KnowledgeIngestor {
    pub fn new(chunker: Box<dyn Chunker>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { chunker, embedder }
    }

    /// 문서 1건 인덱싱
    pub async fn ingest(&self, file_name: &str, text: &str) -> Result<KnowledgebaseItem> {
        if text.trim().is_empty() {
            return Err(RfpError::NoTextExtracted)
                .with_context(|| format!("Nothing to index in {}", file_name));
        }

        let mut item = KnowledgebaseItem::new(file_name, text);
        item.chunks = self.chunker.chunk(text);

        let chunk_texts: Vec<String> = item.chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&chunk_texts)
            .await
            .map_err(RfpError::EmbeddingFailure)
            .with_context(|| format!("Failed to embed chunks of {}", file_name))?;

        if embeddings.len() != item.chunks.len() {
            anyhow::bail!(
                "Embedding count mismatch for {}: {} chunks, {} vectors",
                file_name,
                item.chunks.len(),
                embeddings.len()
            );
        }

        for (chunk, embedding) in item.chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let head: String = text.chars().take(DOCUMENT_EMBEDDING_CHARS).collect();
        item.original_text_embedding = self
            .embedder
            .embed(&head)
            .await
            .map_err(RfpError::EmbeddingFailure)
            .with_context(|| format!("Failed to embed document {}", file_name))?;

        tracing::info!(
            "Indexed {} ({} chunks, chunker: {}, embedder: {})",
            file_name,
            item.chunks.len(),
            self.chunker.name(),
            self.embedder.name()
        );

        Ok(item)
    }
}

/// 새 항목의 벡터 차원이 기존 지식베이스와 같은지 확인
///
/// 비어있는 지식베이스나 임베딩 없는 청크는 검사하지 않습니다.
pub fn check_dimensions(knowledgebase: &Knowledgebase, item: &KnowledgebaseItem) -> Result<(), RfpError> {
    let existing = knowledgebase
        .items
        .iter()
        .filter(|i| !i.file_name.eq_ignore_ascii_case(&item.file_name))
        .flat_map(|i| i.chunks.iter())
        .map(|c| c.embedding.len())
        .find(|len| *len > 0);

    let Some(expected) = existing else {
        return Ok(());
    };

    match item
        .chunks
        .iter()
        .map(|c| c.embedding.len())
        .find(|len| *len > 0 && *len != expected)
    {
        Some(actual) => Err(RfpError::DimensionMismatch { expected, actual }),
        None => Ok(()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::sentence_chunker;
    use async_trait::async_trait;

    /// 글자 수/단어 수 기반 가짜 임베딩
    struct CountingEmbedding {
        dims: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.is_empty() {
                return Ok(vec![]);
            }
            let mut v = vec![0.0; self.dims];
            v[0] = text.chars().count() as f32;
            if self.dims > 1 {
                v[1] = text.split_whitespace().count() as f32;
            }
            Ok(v)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct FailingEmbedding;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedding {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            anyhow::bail!("quota exceeded")
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn ingestor(embedder: Arc<dyn EmbeddingProvider>) -> KnowledgeIngestor {
        KnowledgeIngestor::new(sentence_chunker(40), embedder)
    }

    #[tokio::test]
    async fn test_ingest_embeds_every_chunk() {
        let text = "We deliver projects in six weeks. Our team has ten engineers. \
                    Pricing is fixed per milestone.";
        let item = ingestor(Arc::new(CountingEmbedding { dims: 3 }))
            .ingest("capabilities.md", text)
            .await
            .unwrap();

        assert_eq!(item.file_name, "capabilities.md");
        assert_eq!(item.original_text, text);
        assert!(item.chunks.len() >= 3);
        for chunk in &item.chunks {
            assert_eq!(chunk.embedding.len(), 3);
            assert_eq!(chunk.embedding[0], chunk.text.chars().count() as f32);
        }
        assert_eq!(item.original_text_embedding.len(), 3);
    }

    #[tokio::test]
    async fn test_document_embedding_is_truncated() {
        let text = "Budget scope. ".repeat(1000);
        let item = ingestor(Arc::new(CountingEmbedding { dims: 2 }))
            .ingest("long.txt", &text)
            .await
            .unwrap();
        assert_eq!(
            item.original_text_embedding[0],
            DOCUMENT_EMBEDDING_CHARS as f32
        );
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let result = ingestor(Arc::new(CountingEmbedding { dims: 2 }))
            .ingest("blank.txt", "   ")
            .await;
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RfpError>(),
            Some(RfpError::NoTextExtracted)
        ));
    }

    #[tokio::test]
    async fn test_embedding_failure_is_reported() {
        let result = ingestor(Arc::new(FailingEmbedding))
            .ingest("a.txt", "Some content here.")
            .await;
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RfpError>(),
            Some(RfpError::EmbeddingFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_check_dimensions() {
        let small = ingestor(Arc::new(CountingEmbedding { dims: 2 }))
            .ingest("a.txt", "First document text.")
            .await
            .unwrap();
        let large = ingestor(Arc::new(CountingEmbedding { dims: 4 }))
            .ingest("b.txt", "Second document text.")
            .await
            .unwrap();

        let mut kb = Knowledgebase::default();
        assert!(check_dimensions(&kb, &small).is_ok());
        kb.upsert_by_file_name(small);

        assert!(matches!(
            check_dimensions(&kb, &large),
            Err(RfpError::DimensionMismatch {
                expected: 2,
                actual: 4
            })
        ));

        // 같은 파일명 교체는 자기 자신과 비교하지 않음
        let mut replacement = large.clone();
        replacement.file_name = "A.TXT".to_string();
        assert!(check_dimensions(&kb, &replacement).is_ok());
    }
}
