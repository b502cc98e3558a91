//! 답변 신뢰도 계산
//!
//! `top * 상위유사도 + average * 평균유사도 + per_passage * min(개수, 5)`를
//! `[floor, ceiling]` 범위로 자릅니다.

use crate::models::RagSearchResult;

/// 신뢰도 가중치
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceWeights {
    /// 최고 유사도 가중치
    pub top_similarity: f64,
    /// 평균 유사도 가중치
    pub average_similarity: f64,
    /// 구절 1개당 가산점
    pub per_passage: f64,
    /// 가산점을 주는 최대 구절 수
    pub max_counted_passages: usize,
    /// 하한 (근거가 없을 때의 값)
    pub floor: f64,
    /// 상한
    pub ceiling: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            top_similarity: 0.5,
            average_similarity: 0.3,
            per_passage: 0.04,
            max_counted_passages: 5,
            floor: 0.1,
            ceiling: 0.95,
        }
    }
}

impl ConfidenceWeights {
    /// 검색 결과로 신뢰도 계산
    pub fn score(&self, passages: &[RagSearchResult]) -> f64 {
        if passages.is_empty() {
            return self.floor;
        }

        let scores = passages.iter().map(|p| p.similarity_score as f64);
        let top = scores.clone().fold(f64::MIN, f64::max);
        let average = scores.sum::<f64>() / passages.len() as f64;
        let counted = passages.len().min(self.max_counted_passages) as f64;

        let raw = self.top_similarity * top
            + self.average_similarity * average
            + self.per_passage * counted;

        raw.max(self.floor).min(self.ceiling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passages(scores: &[f32]) -> Vec<RagSearchResult> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| RagSearchResult {
                knowledgebase_item_id: format!("item-{}", i),
                text_chunk_id: format!("chunk-{}", i),
                text: "text".to_string(),
                similarity_score: *s,
                file_name: "doc.txt".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_empty_is_floor() {
        assert_eq!(ConfidenceWeights::default().score(&[]), 0.1);
    }

    #[test]
    fn test_weighted_blend() {
        // 0.5*0.8 + 0.3*0.6 + 0.04*2 = 0.66
        let score = ConfidenceWeights::default().score(&passages(&[0.8, 0.4]));
        assert!((score - 0.66).abs() < 1e-6);
    }

    #[test]
    fn test_passage_bonus_capped() {
        let weights = ConfidenceWeights::default();
        let five = weights.score(&passages(&[0.4; 5]));
        let ten = weights.score(&passages(&[0.4; 10]));
        assert!((five - ten).abs() < 1e-9);
    }

    #[test]
    fn test_always_within_bounds() {
        let weights = ConfidenceWeights::default();
        let cases: Vec<Vec<f32>> = vec![
            vec![1.0; 8],
            vec![0.99, 0.98, 0.97],
            vec![-1.0, -0.5],
            vec![0.0],
            vec![0.3],
            vec![0.31, 0.30, 0.30, 0.30, 0.30, 0.30],
        ];

        for scores in cases {
            let score = weights.score(&passages(&scores));
            assert!((0.1..=0.95).contains(&score), "{:?} -> {}", scores, score);
        }
    }

    #[test]
    fn test_single_strong_match() {
        // 0.5*0.81 + 0.3*0.81 + 0.04 = 0.688
        let score = ConfidenceWeights::default().score(&passages(&[0.81]));
        assert!((score - 0.688).abs() < 1e-6);
    }
}
