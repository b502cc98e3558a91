//! Vector Retrieval - 코사인 유사도 기반 청크 검색
//!
//! 질의 벡터와 지식베이스의 모든 청크 벡터를 비교하여
//! 최소 유사도 이상인 상위 K개 청크를 반환합니다.

use std::cmp::Ordering;

use crate::error::{RfpError, RfpResult};
use crate::models::{Knowledgebase, RagSearchResult};

/// 기본 검색 결과 수
pub const DEFAULT_TOP_K: usize = 5;

/// 기본 최소 유사도
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.3;

// ============================================================================
// Types
// ============================================================================

/// 검색 파라미터
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalParams {
    /// 최대 결과 수
    pub top_k: usize,
    /// 이 값 미만의 유사도는 버림
    pub min_similarity: f32,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }
}

// ============================================================================
// SimilarityRetriever
// ============================================================================

/// 유사도 검색기
#[derive(Debug, Clone, Default)]
pub struct SimilarityRetriever {
    params: RetrievalParams,
}

impl SimilarityRetriever {
    pub fn new(params: RetrievalParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> RetrievalParams {
        self.params
    }

    /// 설정된 파라미터로 검색
    pub fn retrieve(
        &self,
        query_embedding: &[f32],
        knowledgebase: &Knowledgebase,
    ) -> RfpResult<Vec<RagSearchResult>> {
        retrieve(
            query_embedding,
            knowledgebase,
            self.params.top_k,
            self.params.min_similarity,
        )
    }
}

/// 유사도 상위 K개 청크 검색
///
/// 결과는 유사도 내림차순이며, 동점은 지식베이스 순서를 유지합니다.
/// 빈 질의 벡터나 빈 지식베이스는 빈 결과를 반환하고,
/// 차원이 다른 청크 벡터는 `DimensionMismatch` 에러입니다.
/// 임베딩이 없는 청크(빈 벡터)는 검색 대상에서 제외됩니다.
pub fn retrieve(
    query_embedding: &[f32],
    knowledgebase: &Knowledgebase,
    top_k: usize,
    min_similarity: f32,
) -> RfpResult<Vec<RagSearchResult>> {
    if query_embedding.is_empty() || top_k == 0 {
        return Ok(vec![]);
    }

    let mut results = Vec::new();

    for item in &knowledgebase.items {
        for chunk in &item.chunks {
            if chunk.embedding.is_empty() {
                continue;
            }

            let similarity = cosine_similarity(query_embedding, &chunk.embedding)?;
            if similarity >= min_similarity {
                results.push(RagSearchResult {
                    knowledgebase_item_id: item.id.clone(),
                    text_chunk_id: chunk.id.clone(),
                    text: chunk.text.clone(),
                    similarity_score: similarity,
                    file_name: item.file_name.clone(),
                });
            }
        }
    }

    // sort_by는 안정 정렬이므로 동점은 입력 순서 유지
    results.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(Ordering::Equal)
    });
    results.truncate(top_k);

    Ok(results)
}

// ============================================================================
// Utility Functions
// ============================================================================

/// 코사인 유사도 계산
///
/// 결과는 -1.0 ~ 1.0 범위입니다. 영벡터가 포함되면 0.0입니다.
///
/// # Errors
/// 두 벡터의 차원이 다르면 `DimensionMismatch`
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> RfpResult<f32> {
    if a.len() != b.len() {
        return Err(RfpError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    if a.is_empty() {
        return Ok(0.0);
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (norm_a * norm_b))
}

// ============================================================================
// Tests
// ============================================================================
