use async_trait::async_trait;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;
use yui_core::{Error, Result, Topic, TopicDraft, TopicStatus, TopicStore};
use crate::ledger::TopicLedger;

pub const DEFAULT_PATH: &str = "data/questions.json";

/// Store persisted as one pretty-printed JSON array.
///
/// Every mutation rewrites the whole file through a temp file and a rename;
/// the in-memory ledger is only updated once the rename succeeded.
pub struct JsonFileStorage {
    path: PathBuf,
    ledger: RwLock<TopicLedger>,
}

impl std::fmt::Debug for JsonFileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStorage")
            .field("path", &self.path)
            .finish()
    }
}

impl JsonFileStorage {
    /// Open the store at `path`. A missing or blank file is an empty store;
    /// anything unreadable is [`Error::Corrupt`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let topics = load_topics(&path)?;
        debug!("Loaded {} topics from {}", topics.len(), path.display());
        Ok(Self {
            ledger: RwLock::new(TopicLedger::from_topics(topics)?),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize `topics` and replace the file on the blocking pool.
    async fn persist(&self, topics: &[Topic]) -> Result<()> {
        let json = serde_json::to_string_pretty(topics)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &json))
            .await
            .map_err(|e| Error::Storage(format!("Store write task failed: {}", e)))?
    }
}

/// Temp file in the same directory, fsync, then rename over `path`.
fn write_atomic(path: &Path, json: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Storage(format!("Invalid store path: {}", path.display())))?;
    let tmp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

    let result = (|| -> std::io::Result<()> {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(json.as_bytes())?;
        tmp.sync_all()?;
        drop(tmp);
        fs::rename(&tmp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::Io(e));
    }
    Ok(())
}

fn load_topics(path: &Path) -> Result<Vec<Topic>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Corrupt(format!("Failed to read {}: {}", path.display(), e)))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content)
        .map_err(|e| Error::Corrupt(format!("Failed to parse {}: {}", path.display(), e)))
}

#[async_trait]
impl TopicStore for JsonFileStorage {
    async fn commit(&self, draft: TopicDraft) -> Result<Topic> {
        let mut ledger = self.ledger.write().await;
        let topic = ledger.prepare_commit(draft)?;
        self.persist(&ledger.snapshot_with(&topic)).await?;
        ledger.insert(topic.clone());
        Ok(topic)
    }

    async fn all(&self) -> Result<Vec<Topic>> {
        Ok(self.ledger.read().await.topics().to_vec())
    }

    async fn recent(&self, n: usize) -> Result<Vec<Topic>> {
        Ok(self.ledger.read().await.recent(n))
    }

    async fn has_fingerprint(&self, fingerprint: &str) -> Result<bool> {
        Ok(self.ledger.read().await.has_fingerprint(fingerprint))
    }

    async fn has_slug(&self, slug: &str) -> Result<bool> {
        Ok(self.ledger.read().await.has_slug(slug))
    }

    async fn next_pending(&self) -> Result<Option<Topic>> {
        Ok(self.ledger.read().await.next_pending())
    }

    async fn update_status(&self, id: u64, status: TopicStatus, article_attempts: u32) -> Result<Topic> {
        let mut ledger = self.ledger.write().await;
        let topic = ledger.prepare_status(id, status, article_attempts)?;
        self.persist(&ledger.snapshot_with(&topic)).await?;
        ledger.replace(topic.clone());
        Ok(topic)
    }
}
