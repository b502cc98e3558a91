//! PDF 텍스트 추출 모듈
//!
//! pdf-extract 크레이트를 사용하여 PDF 바이트에서 텍스트를 추출합니다.

use anyhow::{Context, Result};

/// PDF 바이트에서 페이지별 텍스트 추출
///
/// 동기 함수이므로 async 컨텍스트에서는 `spawn_blocking`으로 호출합니다.
/// 텍스트가 없으면(스캔 문서 등) 빈 벡터를 반환합니다.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>> {
    let text =
        pdf_extract::extract_text_from_mem(bytes).context("Failed to extract text from PDF")?;

    if text.trim().is_empty() {
        tracing::warn!("No text extracted from PDF. It might be a scanned document.");
        return Ok(vec![]);
    }

    Ok(split_pdf_pages(&text))
}

/// 폼피드(`\x0c`) 기준 페이지 분리 (빈 페이지 제외)
pub fn split_pdf_pages(text: &str) -> Vec<String> {
    text.split('\x0c')
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .map(str::to_string)
        .collect()
}

/// 페이지를 줄바꿈으로 이어붙임
pub fn join_pages(pages: &[String]) -> String {
    pages.join("\n")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pdf_pages_with_formfeed() {
        let text = "Page 1 content\x0cPage 2 content\x0c\x0c  \x0cPage 3 content\n";
        let pages = split_pdf_pages(text);
        assert_eq!(
            pages,
            vec!["Page 1 content", "Page 2 content", "Page 3 content"]
        );
    }

    #[test]
    fn test_split_single_page() {
        assert_eq!(split_pdf_pages("  only page  "), vec!["only page"]);
        assert!(split_pdf_pages(" \x0c ").is_empty());
    }

    #[test]
    fn test_join_pages() {
        let pages = split_pdf_pages("Intro.\x0cWhat is your delivery timeline?");
        assert_eq!(join_pages(&pages), "Intro.\nWhat is your delivery timeline?");
    }
}
