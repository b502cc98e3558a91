//! rfp-rag - RFP 질문 자동 답변 RAG 파이프라인
//!
//! RFP 문서에서 텍스트를 추출하고 질문을 탐지한 뒤,
//! 지식베이스에서 관련 구절을 검색하여 근거 기반 답변과 신뢰도를 생성합니다.

pub mod answer;
pub mod cli;
pub mod collector;
pub mod config;
pub mod detector;
pub mod embedding;
pub mod error;
pub mod export;
pub mod extractor;
pub mod knowledge;
pub mod models;
pub mod openai;
pub mod pipeline;

// Re-exports
pub use answer::{AnswerProvider, ConfidenceWeights, OpenAiAnswerGenerator};
pub use config::{OpenAiConfig, RagConfig};
pub use detector::{QuestionDetector, QuestionRules};
pub use embedding::{EmbeddingProvider, OpenAiEmbedding};
pub use error::{RfpError, RfpResult};
pub use export::{to_csv, to_json, ExportFormat};
pub use extractor::{extractor_for_path, PdfExtractor, PlainTextExtractor, TextExtractor};
pub use knowledge::{
    cosine_similarity, retrieve, Chunker, JsonKnowledgeStore, KnowledgeIngestor, KnowledgeStore,
    MemoryKnowledgeStore, RetrievalParams, SentenceChunker, SimilarityRetriever, StoreStats,
};
pub use models::{
    AnswerResponse, Knowledgebase, KnowledgebaseItem, RagSearchResult, RfpProcessingResult,
    RfpProcessingStatus, RfpQuestion, TextChunk,
};
pub use pipeline::{
    NoopProgress, ProcessingCoordinator, ProgressEvent, ProgressSink, StatusMachine, Transition,
};
