//! 문서 수집 모듈
//!
//! 지식베이스에 넣을 문서를 단일 파일 또는 폴더 단위로 모읍니다.
//! 폴더는 재귀 탐색하며 .gitignore 패턴과 숨김 파일 규칙을 따릅니다.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;

// ============================================================================
// Document Types
// ============================================================================

/// 지원하는 문서 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// UTF-8 텍스트 문서 (txt, md, csv 등)
    Text,
    /// PDF 문서
    Pdf,
}

impl FileType {
    /// 확장자로 문서 타입 결정 (대소문자 무시)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "md" | "markdown" | "rst" | "text" | "csv" | "tsv" | "json" | "yaml"
            | "yml" | "xml" | "html" | "htm" | "log" => Some(FileType::Text),
            "pdf" => Some(FileType::Pdf),
            _ => None,
        }
    }

    /// 파일 경로에서 타입 결정
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

// ============================================================================
// Collected Document
// ============================================================================

/// 수집된 문서
#[derive(Debug, Clone)]
pub struct CollectedFile {
    pub path: PathBuf,
    pub file_type: FileType,
    /// 바이트 크기
    pub size: u64,
}

impl CollectedFile {
    /// 지원하지 않는 확장자거나 일반 파일이 아니면 `None`
    pub fn from_path(path: PathBuf) -> Result<Option<Self>> {
        let Some(file_type) = FileType::from_path(&path) else {
            return Ok(None);
        };

        let metadata = std::fs::metadata(&path)
            .with_context(|| format!("Failed to read metadata: {:?}", path))?;
        if !metadata.is_file() {
            return Ok(None);
        }

        Ok(Some(Self {
            path,
            file_type,
            size: metadata.len(),
        }))
    }

    /// 지식베이스에 기록할 파일명
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

// ============================================================================
// File Collector
// ============================================================================

/// 수집기 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub respect_gitignore: bool,
    pub include_hidden: bool,
    /// 최대 파일 크기 (0이면 제한 없음)
    pub max_file_size: u64,
    /// 허용 확장자 (비어있으면 지원 확장자 전체)
    pub extensions: Vec<String>,
    pub skip_pdfs: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            respect_gitignore: true,
            include_hidden: false,
            max_file_size: 25 * 1024 * 1024,
            extensions: vec![],
            skip_pdfs: false,
        }
    }
}

/// 문서 수집기
pub struct FileCollector {
    config: CollectorConfig,
}

impl FileCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(CollectorConfig::default())
    }

    /// 단일 파일 수집
    ///
    /// 파일이 없으면 에러, 필터에 걸리거나 지원하지 않는 형식이면 `None`.
    pub fn collect_file(&self, path: &Path) -> Result<Option<CollectedFile>> {
        let abs_path = absolute(path)?;

        if !abs_path.is_file() {
            anyhow::bail!("File not found: {:?}", abs_path);
        }

        Ok(CollectedFile::from_path(abs_path)?.filter(|file| self.should_include(file)))
    }

    /// 폴더 재귀 수집 (경로 순 정렬)
    pub fn collect_directory(&self, path: &Path) -> Result<Vec<CollectedFile>> {
        let abs_path = absolute(path)?;

        if !abs_path.is_dir() {
            anyhow::bail!("Directory not found: {:?}", abs_path);
        }

        let walker = WalkBuilder::new(&abs_path)
            .hidden(!self.config.include_hidden)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .require_git(false)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            match CollectedFile::from_path(entry.path().to_path_buf()) {
                Ok(Some(file)) if self.should_include(&file) => files.push(file),
                Ok(_) => {}
                Err(e) => tracing::warn!("Failed to collect file: {}", e),
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::info!("Collected {} documents from {:?}", files.len(), abs_path);
        Ok(files)
    }

    fn should_include(&self, file: &CollectedFile) -> bool {
        if self.config.max_file_size > 0 && file.size > self.config.max_file_size {
            tracing::debug!("Skipping large file: {:?} ({} bytes)", file.path, file.size);
            return false;
        }

        if self.config.skip_pdfs && file.file_type == FileType::Pdf {
            return false;
        }

        if self.config.extensions.is_empty() {
            return true;
        }

        file.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.config
                    .extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("Failed to resolve current directory")?
            .join(path))
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// 수집 통계
#[derive(Debug, Default)]
pub struct CollectionStats {
    pub total_files: usize,
    pub text_files: usize,
    pub pdf_files: usize,
    pub total_size: u64,
}

impl CollectionStats {
    pub fn from_files(files: &[CollectedFile]) -> Self {
        let mut stats = Self::default();
        for file in files {
            stats.total_files += 1;
            stats.total_size += file.size;
            match file.file_type {
                FileType::Text => stats.text_files += 1,
                FileType::Pdf => stats.pdf_files += 1,
            }
        }
        stats
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(FileType::from_extension("md"), Some(FileType::Text));
        assert_eq!(FileType::from_extension("TXT"), Some(FileType::Text));
        assert_eq!(FileType::from_extension("PDF"), Some(FileType::Pdf));
        assert_eq!(FileType::from_extension("png"), None);
        assert_eq!(FileType::from_extension("exe"), None);
    }

    #[test]
    fn test_collect_directory_recursive_sorted() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.txt", "beta");
        write(dir.path(), "nested/a.md", "alpha");
        write(dir.path(), "image.png", "not a document");
        write(dir.path(), ".hidden.txt", "secret");

        let files = FileCollector::with_defaults()
            .collect_directory(dir.path())
            .unwrap();
        let names: Vec<String> = files.iter().map(|f| f.file_name()).collect();

        assert_eq!(names, vec!["b.txt".to_string(), "a.md".to_string()]);

        let stats = CollectionStats::from_files(&files);
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.text_files, 2);
        assert_eq!(stats.total_size, 9);
    }

    #[test]
    fn test_collect_directory_honors_gitignore() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", "drafts/\n");
        write(dir.path(), "keep.txt", "keep");
        write(dir.path(), "drafts/skip.txt", "skip");

        let files = FileCollector::with_defaults()
            .collect_directory(dir.path())
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name(), "keep.txt");
    }

    #[test]
    fn test_collect_file_filters() {
        let dir = TempDir::new().unwrap();
        let txt = write(dir.path(), "notes.txt", "hello world");
        let png = write(dir.path(), "logo.png", "png");

        let collector = FileCollector::with_defaults();
        assert!(collector.collect_file(&txt).unwrap().is_some());
        assert!(collector.collect_file(&png).unwrap().is_none());
        assert!(collector
            .collect_file(&dir.path().join("missing.txt"))
            .is_err());

        let limited = FileCollector::new(CollectorConfig {
            max_file_size: 4,
            ..CollectorConfig::default()
        });
        assert!(limited.collect_file(&txt).unwrap().is_none());

        let only_md = FileCollector::new(CollectorConfig {
            extensions: vec!["md".to_string()],
            ..CollectorConfig::default()
        });
        assert!(only_md.collect_file(&txt).unwrap().is_none());
    }
}
