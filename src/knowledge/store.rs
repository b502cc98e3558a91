//! Knowledge Store - 지식베이스 영속화
//!
//! 저장 포맷은 버전이 있는 JSON 문서입니다: `{version, items: [...], lastUpdated}`.
//! 저장 위치: ~/.rfp-rag/knowledgebase.json

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::models::{Knowledgebase, KnowledgebaseItem};

// ============================================================================
// Types
// ============================================================================

/// 저장소 통계
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub item_count: usize,
    pub chunk_count: usize,
    pub total_text_chars: usize,
}

impl StoreStats {
    pub fn from_knowledgebase(knowledgebase: &Knowledgebase) -> Self {
        Self {
            item_count: knowledgebase.items.len(),
            chunk_count: knowledgebase.chunk_count(),
            total_text_chars: knowledgebase
                .items
                .iter()
                .map(|i| i.original_text.chars().count())
                .sum(),
        }
    }
}

// ============================================================================
// KnowledgeStore Trait
// ============================================================================

/// KnowledgeStore 트레이트 (async)
///
/// 지식베이스 저장소의 공통 인터페이스입니다.
/// 부분 갱신 연산은 load → 수정 → save로 기본 구현됩니다.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// 지식베이스 로드 (없으면 빈 지식베이스)
    async fn load(&self) -> Result<Knowledgebase>;

    /// 지식베이스 저장 (`last_updated` 갱신)
    async fn save(&self, knowledgebase: &mut Knowledgebase) -> Result<()>;

    /// 전체 삭제
    async fn clear(&self) -> Result<()>;

    /// 문서 추가 (같은 파일명은 대소문자 무시하고 교체)
    async fn upsert_by_file_name(&self, item: KnowledgebaseItem) -> Result<()> {
        let mut knowledgebase = self.load().await?;
        knowledgebase.upsert_by_file_name(item);
        self.save(&mut knowledgebase).await
    }

    /// ID로 문서 삭제
    async fn remove_by_id(&self, id: &str) -> Result<bool> {
        let mut knowledgebase = self.load().await?;
        if !knowledgebase.remove_by_id(id) {
            return Ok(false);
        }
        self.save(&mut knowledgebase).await?;
        Ok(true)
    }
}

// ============================================================================
// JsonKnowledgeStore
// ============================================================================

/// JSON 파일 기반 저장소
pub struct JsonKnowledgeStore {
    path: PathBuf,
}

impl JsonKnowledgeStore {
    /// 저장소 열기 (파일은 첫 저장 시 생성)
    pub fn open(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// 파일 경로 반환
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KnowledgeStore for JsonKnowledgeStore {
    async fn load(&self) -> Result<Knowledgebase> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .with_context(|| format!("Failed to access knowledgebase: {:?}", self.path))?;
        if !exists {
            tracing::debug!("No knowledgebase at {:?}, starting empty", self.path);
            return Ok(Knowledgebase::default());
        }

        let json = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read knowledgebase: {:?}", self.path))?;

        if json.trim().is_empty() {
            return Ok(Knowledgebase::default());
        }

        let knowledgebase: Knowledgebase = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse knowledgebase: {:?}", self.path))?;

        tracing::debug!(
            "Loaded knowledgebase v{} ({} items)",
            knowledgebase.version,
            knowledgebase.items.len()
        );
        Ok(knowledgebase)
    }

    async fn save(&self, knowledgebase: &mut Knowledgebase) -> Result<()> {
        // 부모 디렉토리 생성
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create data directory")?;
            }
        }

        knowledgebase.last_updated = Utc::now();
        let json =
            serde_json::to_string_pretty(knowledgebase).context("Failed to serialize knowledgebase")?;

        // 임시 파일에 쓴 뒤 교체
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json)
            .await
            .with_context(|| format!("Failed to write knowledgebase: {:?}", tmp_path))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace knowledgebase: {:?}", self.path))?;

        tracing::info!(
            "Saved knowledgebase ({} items) to {:?}",
            knowledgebase.items.len(),
            self.path
        );
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!("Cleared knowledgebase at {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to clear knowledgebase"),
        }
    }
}

// ============================================================================
// MemoryKnowledgeStore
// ============================================================================

/// 메모리 저장소 (테스트 및 임시 실행용)
#[derive(Default)]
pub struct MemoryKnowledgeStore {
    inner: Mutex<Option<Knowledgebase>>,
}

impl MemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KnowledgeStore for MemoryKnowledgeStore {
    async fn load(&self) -> Result<Knowledgebase> {
        Ok(self.inner.lock().await.clone().unwrap_or_default())
    }

    async fn save(&self, knowledgebase: &mut Knowledgebase) -> Result<()> {
        knowledgebase.last_updated = Utc::now();
        *self.inner.lock().await = Some(knowledgebase.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.inner.lock().await = None;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TextChunk;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, JsonKnowledgeStore) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("knowledgebase.json");
        let store = JsonKnowledgeStore::open(&path);
        (dir, store)
    }

    fn item_with_chunks(file_name: &str, texts: &[&str]) -> KnowledgebaseItem {
        let mut item = KnowledgebaseItem::new(file_name, texts.join(" "));
        let mut offset = 0;
        for (i, text) in texts.iter().enumerate() {
            let len = text.chars().count();
            let mut chunk = TextChunk::new(text.to_string(), offset, offset + len);
            chunk.embedding = vec![i as f32, 1.0];
            item.chunks.push(chunk);
            offset += len;
        }
        item
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let (_dir, store) = create_test_store();
        let kb = store.load().await.unwrap();
        assert!(kb.items.is_empty());
        assert_eq!(kb.version, "1.0");
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let (_dir, store) = create_test_store();

        let mut kb = Knowledgebase::default();
        kb.upsert_by_file_name(item_with_chunks("a.txt", &["One.", "Two.", "Three."]));
        kb.upsert_by_file_name(item_with_chunks("b.pdf", &["Only."]));
        store.save(&mut kb).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, kb);

        let texts: Vec<&str> = loaded.items[0]
            .chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(texts, vec!["One.", "Two.", "Three."]);
    }

    #[tokio::test]
    async fn test_persisted_form_is_camel_case() {
        let (_dir, store) = create_test_store();
        store
            .upsert_by_file_name(item_with_chunks("a.txt", &["One."]))
            .await
            .unwrap();

        let json = std::fs::read_to_string(store.path()).unwrap();
        assert!(json.contains("\"lastUpdated\""));
        assert!(json.contains("\"fileName\""));
        assert!(json.contains("\"startIndex\""));
        assert!(json.contains("\"originalTextEmbedding\""));
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_file_name() {
        let (_dir, store) = create_test_store();
        store
            .upsert_by_file_name(item_with_chunks("Guide.md", &["Old."]))
            .await
            .unwrap();
        store
            .upsert_by_file_name(item_with_chunks("guide.MD", &["New."]))
            .await
            .unwrap();

        let kb = store.load().await.unwrap();
        assert_eq!(kb.items.len(), 1);
        assert_eq!(kb.items[0].chunks[0].text, "New.");
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let (_dir, store) = create_test_store();
        let item = item_with_chunks("a.txt", &["One."]);
        let id = item.id.clone();
        store.upsert_by_file_name(item).await.unwrap();

        assert!(!store.remove_by_id("missing").await.unwrap());
        assert!(store.remove_by_id(&id).await.unwrap());
        assert!(store.load().await.unwrap().items.is_empty());

        store
            .upsert_by_file_name(item_with_chunks("b.txt", &["Two."]))
            .await
            .unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().items.is_empty());

        // 이미 비어있어도 성공
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let (_dir, store) = create_test_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().await.is_err());
    }

    #[tokio::test]
    async fn test_unreadable_location_is_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let store = JsonKnowledgeStore::open(&blocker.join("knowledgebase.json"));
        assert!(store.load().await.is_err());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryKnowledgeStore::new();
        store
            .upsert_by_file_name(item_with_chunks("a.txt", &["One.", "Two."]))
            .await
            .unwrap();

        let kb = store.load().await.unwrap();
        let stats = StoreStats::from_knowledgebase(&kb);
        assert_eq!(stats.item_count, 1);
        assert_eq!(stats.chunk_count, 2);
        assert_eq!(stats.total_text_chars, 9);

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }
}
