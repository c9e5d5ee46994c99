use async_trait::async_trait;
use crate::types::{Topic, TopicDraft, TopicStatus};
use crate::Result;

/// Append-only collection of accepted topics.
#[async_trait]
pub trait TopicStore: Send + Sync {
    /// Commit a draft. Fails with [`crate::Error::Conflict`] when its
    /// fingerprint or slug is already present; nothing is written then.
    async fn commit(&self, draft: TopicDraft) -> Result<Topic>;

    /// All topics in insertion order.
    async fn all(&self) -> Result<Vec<Topic>>;

    /// The last `n` topics in insertion order (oldest first).
    async fn recent(&self, n: usize) -> Result<Vec<Topic>>;

    async fn has_fingerprint(&self, fingerprint: &str) -> Result<bool>;

    async fn has_slug(&self, slug: &str) -> Result<bool>;

    /// Oldest topic still waiting for an article.
    async fn next_pending(&self) -> Result<Option<Topic>>;

    /// Update article bookkeeping. Content fields are left untouched.
    async fn update_status(&self, id: u64, status: TopicStatus, article_attempts: u32) -> Result<Topic>;
}
