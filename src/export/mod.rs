//! 결과 내보내기 - JSON / CSV
//!
//! JSON은 camelCase 필드로 결과 전체를 담고, CSV는 질문당 한 줄로 평탄화합니다.

use std::path::Path;

use anyhow::{Context, Result};

use crate::models::RfpProcessingResult;

/// CSV 헤더
pub const CSV_HEADER: &str = "Question,Answer,Confidence,Is Modified,Original Answer";

/// 내보내기 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn render(self, result: &RfpProcessingResult) -> Result<String> {
        match self {
            ExportFormat::Json => to_json(result),
            ExportFormat::Csv => Ok(to_csv(result)),
        }
    }
}

/// 결과 전체를 pretty JSON으로
pub fn to_json(result: &RfpProcessingResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("Failed to serialize processing result")
}

/// 질문당 한 줄 CSV
pub fn to_csv(result: &RfpProcessingResult) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');

    for question in &result.questions {
        let row = [
            escape_csv(&question.text),
            escape_csv(&question.answer),
            format!("{:.2}", question.confidence),
            question.is_answer_edited.to_string(),
            escape_csv(&question.original_answer),
        ];
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    csv
}

/// 쉼표/따옴표/줄바꿈이 있으면 따옴표로 감싸고 내부 따옴표는 두 번 씀
pub fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// 파일로 저장
pub async fn write_export(
    result: &RfpProcessingResult,
    format: ExportFormat,
    path: &Path,
) -> Result<()> {
    let body = format.render(result)?;
    tokio::fs::write(path, body)
        .await
        .with_context(|| format!("Failed to write export: {:?}", path))?;
    tracing::info!("Exported {} questions to {:?}", result.questions.len(), path);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
