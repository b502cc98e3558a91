//! CLI 모듈
//!
//! rfp-rag CLI 명령어 정의 및 구현

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::answer::OpenAiAnswerGenerator;
use crate::collector::{CollectionStats, CollectorConfig, FileCollector, FileType};
use crate::config::RagConfig;
use crate::embedding::{create_embedder, EmbeddingProvider};
use crate::export::{self, ExportFormat};
use crate::extractor::{extract_file, extractor_for_path};
use crate::knowledge::{
    check_dimensions, sentence_chunker, JsonKnowledgeStore, KnowledgeIngestor, KnowledgeStore,
    StoreStats,
};
use crate::models::{RfpProcessingResult, RfpProcessingStatus};
use crate::pipeline::{ProcessingCoordinator, ProgressEvent};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "rfp-rag")]
#[command(version, about = "RFP 질문 자동 답변 (RAG)", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// RFP 문서를 처리하여 질문별 답변 생성
    Process {
        /// RFP 문서 경로 (PDF 또는 텍스트)
        file: PathBuf,

        /// 내보내기 형식
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,

        /// 내보낼 파일 경로 (형식 미지정 시 확장자로 결정)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 지식베이스 관리
    Kb {
        #[command(subcommand)]
        action: KbCommand,
    },

    /// 상태 확인
    Status,
}

#[derive(Subcommand)]
pub enum KbCommand {
    /// 파일 또는 폴더를 지식베이스에 추가
    Add {
        /// 추가할 파일 경로
        #[arg(long)]
        file: Option<PathBuf>,

        /// 추가할 폴더 경로 (재귀)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// PDF 파일 건너뛰기
        #[arg(long)]
        skip_pdfs: bool,
    },

    /// 저장된 문서 목록
    List {
        /// 결과 개수 제한
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// 문서 삭제
    Remove {
        /// 삭제할 문서 ID
        id: String,
    },

    /// 지식베이스 전체 삭제
    Clear,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let config = RagConfig::from_env().context("설정 로드 실패")?;

    match cli.command {
        Commands::Process {
            file,
            format,
            output,
        } => cmd_process(&config, &file, format, output).await,
        Commands::Kb { action } => match action {
            KbCommand::Add {
                file,
                dir,
                skip_pdfs,
            } => cmd_kb_add(&config, file, dir, skip_pdfs).await,
            KbCommand::List { limit } => cmd_kb_list(&config, limit).await,
            KbCommand::Remove { id } => cmd_kb_remove(&config, &id).await,
            KbCommand::Clear => cmd_kb_clear(&config).await,
        },
        Commands::Status => cmd_status(&config).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// RFP 처리 명령어 (process)
async fn cmd_process(
    config: &RagConfig,
    file: &Path,
    format: Option<ExportFormat>,
    output: Option<PathBuf>,
) -> Result<()> {
    let store = JsonKnowledgeStore::open(&config.knowledgebase_path());
    let knowledgebase = store.load().await.context("지식베이스 로드 실패")?;
    knowledgebase.ensure_not_empty()?;

    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("파일 읽기 실패: {:?}", file))?;
    let file_name = display_name(file);

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(create_embedder(&config.openai)?);
    let answerer = Arc::new(OpenAiAnswerGenerator::new(
        &config.openai,
        config.confidence,
    )?);
    let coordinator =
        ProcessingCoordinator::new(extractor_for_path(file), embedder, answerer, config.retrieval)
            .with_max_passages(config.max_passages);

    println!(
        "[*] RFP 처리 시작: {} (지식베이스 {} 문서, {} 청크)",
        file_name,
        knowledgebase.items.len(),
        knowledgebase.chunk_count()
    );

    let print_progress = |event: &ProgressEvent| {
        println!("[{:>3}%] {}", event.percent, event.message);
    };
    let result = coordinator
        .process(&bytes, &file_name, &knowledgebase, &print_progress)
        .await;

    println!();
    print_summary(&result);

    if let Some(format) = format.or_else(|| output.as_deref().map(format_from_path)) {
        match output {
            Some(ref path) => {
                export::write_export(&result, format, path).await?;
                println!("[OK] 내보내기 완료: {}", path.display());
            }
            None => println!("{}", format.render(&result)?),
        }
    }

    if result.processing_status == RfpProcessingStatus::Error {
        bail!("RFP 처리 실패: {}", result.error_message);
    }

    Ok(())
}

/// 지식베이스 추가 명령어 (kb add)
async fn cmd_kb_add(
    config: &RagConfig,
    file: Option<PathBuf>,
    dir: Option<PathBuf>,
    skip_pdfs: bool,
) -> Result<()> {
    let collector = FileCollector::new(CollectorConfig {
        skip_pdfs,
        ..Default::default()
    });

    let files = if let Some(ref file_path) = file {
        match collector.collect_file(file_path)? {
            Some(f) => vec![f],
            None => {
                println!("[!] 지원하지 않는 파일 형식: {:?}", file_path);
                return Ok(());
            }
        }
    } else if let Some(ref dir_path) = dir {
        collector.collect_directory(dir_path)?
    } else {
        bail!("--file 또는 --dir를 지정해야 합니다");
    };

    if files.is_empty() {
        println!("[!] 추가할 파일이 없습니다.");
        return Ok(());
    }

    let stats = CollectionStats::from_files(&files);
    println!("[*] 추가 대상: {} 파일", stats.total_files);
    println!("    텍스트: {}, PDF: {}", stats.text_files, stats.pdf_files);
    println!("    총 크기: {}", format_bytes(stats.total_size as usize));
    println!();

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(create_embedder(&config.openai)?);
    let ingestor = KnowledgeIngestor::new(sentence_chunker(config.chunk_size), embedder);

    let store = JsonKnowledgeStore::open(&config.knowledgebase_path());
    let mut knowledgebase = store.load().await.context("지식베이스 로드 실패")?;

    let mut success_count = 0;
    let mut error_count = 0;

    for (i, collected_file) in files.iter().enumerate() {
        let file_name = collected_file.file_name();
        let type_str = match collected_file.file_type {
            FileType::Text => "TXT",
            FileType::Pdf => "PDF",
        };

        print!("[{}/{}] [{}] {}... ", i + 1, files.len(), type_str, file_name);

        let text = match extract_file(&collected_file.path).await {
            Ok(t) if !t.trim().is_empty() => t,
            Ok(_) => {
                println!("건너뜀: 추출된 텍스트 없음");
                error_count += 1;
                continue;
            }
            Err(e) => {
                println!("실패: {:#}", e);
                error_count += 1;
                continue;
            }
        };

        let item = match ingestor.ingest(&file_name, &text).await {
            Ok(item) => item,
            Err(e) => {
                println!("실패: {:#}", e);
                error_count += 1;
                continue;
            }
        };

        if let Err(e) = check_dimensions(&knowledgebase, &item) {
            println!("실패: {}", e);
            error_count += 1;
            continue;
        }

        println!("완료 ({} 청크)", item.chunks.len());
        knowledgebase.upsert_by_file_name(item);
        success_count += 1;
    }

    if success_count > 0 {
        store
            .save(&mut knowledgebase)
            .await
            .context("지식베이스 저장 실패")?;
    }

    println!();
    println!("[OK] 완료: 성공 {}, 실패 {}", success_count, error_count);

    Ok(())
}

/// 목록 명령어 (kb list)
async fn cmd_kb_list(config: &RagConfig, limit: usize) -> Result<()> {
    let store = JsonKnowledgeStore::open(&config.knowledgebase_path());
    let knowledgebase = store.load().await.context("지식베이스 로드 실패")?;

    if knowledgebase.is_empty() {
        println!("[!] 저장된 문서가 없습니다.");
        return Ok(());
    }

    println!(
        "[OK] 저장된 문서 ({} 건):\n",
        knowledgebase.items.len()
    );

    for item in knowledgebase.items.iter().take(limit) {
        println!("  {}", truncate_text(&item.file_name, 60));
        println!("        ID: {}", item.id);
        println!(
            "        {} | {} chunks | {} chars",
            item.created_at.format("%Y-%m-%d %H:%M"),
            item.chunks.len(),
            item.original_text.chars().count()
        );
        println!();
    }

    if knowledgebase.items.len() > limit {
        println!("  ... 외 {} 건", knowledgebase.items.len() - limit);
    }

    Ok(())
}

/// 삭제 명령어 (kb remove)
async fn cmd_kb_remove(config: &RagConfig, id: &str) -> Result<()> {
    let store = JsonKnowledgeStore::open(&config.knowledgebase_path());

    if store.remove_by_id(id).await.context("문서 삭제 실패")? {
        println!("[OK] 문서 {} 삭제됨", id);
    } else {
        bail!("ID {}인 문서를 찾을 수 없습니다", id);
    }

    Ok(())
}

/// 전체 삭제 명령어 (kb clear)
async fn cmd_kb_clear(config: &RagConfig) -> Result<()> {
    let store = JsonKnowledgeStore::open(&config.knowledgebase_path());
    store.clear().await.context("지식베이스 삭제 실패")?;
    println!("[OK] 지식베이스를 비웠습니다: {}", store.path().display());
    Ok(())
}

/// 상태 명령어 (status)
async fn cmd_status(config: &RagConfig) -> Result<()> {
    println!("rfp-rag v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 데이터 디렉토리: {}", config.data_dir.display());

    if config.openai.has_api_key() {
        println!("[OK] API 키: 설정됨 ({})", config.openai.base_url);
    } else {
        println!("[!] API 키: 미설정");
        println!("    설정: export OPENAI_API_KEY=your-key");
    }

    let store = JsonKnowledgeStore::open(&config.knowledgebase_path());
    match store.load().await {
        Ok(knowledgebase) => {
            let stats = StoreStats::from_knowledgebase(&knowledgebase);
            println!("[OK] 저장된 문서: {} 건", stats.item_count);
            println!("     청크: {} 개", stats.chunk_count);
            println!("     총 텍스트: {} 자", stats.total_text_chars);
        }
        Err(e) => {
            println!("[!] 지식베이스 로드 실패: {:#}", e);
        }
    }

    println!();
    println!(
        "[*] 모델: chat={}, embedding={}",
        config.openai.chat_model, config.openai.embedding_model
    );
    println!(
        "[*] 검색: topK={}, minSimilarity={}, maxPassages={}, chunkSize={}",
        config.retrieval.top_k,
        config.retrieval.min_similarity,
        config.max_passages,
        config.chunk_size
    );
    println!(
        "[*] 신뢰도 가중치: top={}, average={}, perPassage={}",
        config.confidence.top_similarity,
        config.confidence.average_similarity,
        config.confidence.per_passage
    );

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 질문별 결과 요약 출력
fn print_summary(result: &RfpProcessingResult) {
    match result.processing_status {
        RfpProcessingStatus::Completed => println!(
            "[OK] 처리 완료: 질문 {} 개, 답변 {} 개",
            result.questions.len(),
            result.answered_count()
        ),
        _ => println!("[!] {}: {}", result.current_step, result.error_message),
    }

    if let Some(average) = result.average_confidence() {
        println!("     평균 신뢰도: {:.0}%", average * 100.0);
    }
    println!();

    for (i, question) in result.questions.iter().enumerate() {
        println!("{}. {}", i + 1, question.text);
        if question.answer.is_empty() {
            println!("   (답변 없음)");
        } else {
            println!(
                "   [신뢰도 {:.0}%] {}",
                question.confidence * 100.0,
                truncate_text(&question.answer, 200)
            );
        }
        println!();
    }
}

/// 경로에서 파일명 추출
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// 출력 파일 확장자로 형식 결정 (기본 JSON)
fn format_from_path(path: &Path) -> ExportFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
        _ => ExportFormat::Json,
    }
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
