//! 텍스트 추출 모듈
//!
//! 업로드된 문서 바이트에서 텍스트를 꺼냅니다.
//! - PDF: pdf-extract (blocking 스레드에서 실행)
//! - 텍스트 문서: UTF-8 디코딩 (손실 허용)

pub mod pdf;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::collector::FileType;

// ============================================================================
// TextExtractor Trait
// ============================================================================

/// 텍스트 추출기 트레이트
///
/// 추출할 텍스트가 없으면 에러가 아니라 빈 문자열을 반환합니다.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8]) -> Result<String>;

    fn name(&self) -> &str;
}

// ============================================================================
// Implementations
// ============================================================================

/// PDF 추출기
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String> {
        // PDF 파싱은 CPU 바운드이므로 spawn_blocking 사용
        let owned = bytes.to_vec();
        let pages = tokio::task::spawn_blocking(move || pdf::extract_pages(&owned))
            .await
            .context("PDF extraction task failed")??;

        tracing::debug!("Extracted {} pages from PDF", pages.len());
        Ok(pdf::join_pages(&pages))
    }

    fn name(&self) -> &str {
        "pdf"
    }
}

/// 텍스트 문서 추출기
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String> {
        let text = String::from_utf8_lossy(bytes);
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }

    fn name(&self) -> &str {
        "text"
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 문서 타입에 맞는 추출기
pub fn extractor_for(file_type: FileType) -> Arc<dyn TextExtractor> {
    match file_type {
        FileType::Pdf => Arc::new(PdfExtractor),
        FileType::Text => Arc::new(PlainTextExtractor),
    }
}

/// 확장자로 추출기 선택 (알 수 없는 확장자는 텍스트로 처리)
pub fn extractor_for_path(path: &Path) -> Arc<dyn TextExtractor> {
    extractor_for(FileType::from_path(path).unwrap_or(FileType::Text))
}

/// 파일을 읽어 텍스트 추출
pub async fn extract_file(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file: {:?}", path))?;

    extractor_for_path(path)
        .extract(&bytes)
        .await
        .with_context(|| format!("Failed to extract text: {:?}", path))
}

// ============================================================================
// Tests
// ============================================================================
