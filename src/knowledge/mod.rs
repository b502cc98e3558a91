//! Knowledge 모듈 - RFP 답변용 지식베이스
//!
//! - Chunker: 문장 경계 기반 텍스트 분할
//! - Vector: 코사인 유사도 기반 상위 K개 청크 검색
//! - Store: 버전이 있는 JSON 문서로 영속화
//! - Ingest: 문서 → 청크 + 임베딩 → 지식베이스 항목

mod chunker;
mod ingest;
mod store;
mod vector;

// Re-exports
pub use chunker::{
    default_chunker, normalize_whitespace, sentence_chunker, split_sentences, Chunker,
    SentenceChunker, DEFAULT_MAX_CHUNK_SIZE,
};
pub use ingest::{check_dimensions, KnowledgeIngestor, DOCUMENT_EMBEDDING_CHARS};
pub use store::{JsonKnowledgeStore, KnowledgeStore, MemoryKnowledgeStore, StoreStats};
pub use vector::{
    cosine_similarity, retrieve, RetrievalParams, SimilarityRetriever, DEFAULT_MIN_SIMILARITY,
    DEFAULT_TOP_K,
};
