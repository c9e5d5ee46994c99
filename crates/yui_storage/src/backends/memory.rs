use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use yui_core::{Result, Topic, TopicDraft, TopicStatus, TopicStore};
use crate::ledger::TopicLedger;

/// Non-persistent store, used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    ledger: Arc<RwLock<TopicLedger>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topics(topics: Vec<Topic>) -> Result<Self> {
        Ok(Self {
            ledger: Arc::new(RwLock::new(TopicLedger::from_topics(topics)?)),
        })
    }
}

#[async_trait]
impl TopicStore for MemoryStorage {
    async fn commit(&self, draft: TopicDraft) -> Result<Topic> {
        let mut ledger = self.ledger.write().await;
        let topic = ledger.prepare_commit(draft)?;
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
        ledger.replace(topic.clone());
        Ok(topic)
    }
}
