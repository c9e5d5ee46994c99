use chrono::Utc;
use std::collections::HashSet;
use yui_core::{fingerprint, resolve_slug, slugify, Category, Conflict, Error, Result, Topic, TopicDraft, TopicStatus};

/// Rows plus the uniqueness indexes shared by every backend.
///
/// Mutation is split in two steps: `prepare_*` computes the new row and
/// checks the invariants without touching `self`, and `insert`/`replace`
/// applies it. Backends persist between the two so a failed write leaves
/// the ledger untouched.
#[derive(Debug, Default, Clone)]
pub struct TopicLedger {
    topics: Vec<Topic>,
    fingerprints: HashSet<String>,
    slugs: HashSet<String>,
}

impl TopicLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted rows, refusing data that already breaks the invariants.
    pub fn from_topics(topics: Vec<Topic>) -> Result<Self> {
        let mut ledger = Self::new();
        for topic in topics {
            if ledger.fingerprints.contains(&topic.fingerprint) {
                return Err(Error::Corrupt(format!("duplicate fingerprint for topic {}", topic.id)));
            }
            if ledger.slugs.contains(&topic.slug) {
                return Err(Error::Corrupt(format!("duplicate slug '{}'", topic.slug)));
            }
            ledger.insert(topic);
        }
        Ok(ledger)
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn has_fingerprint(&self, fingerprint: &str) -> bool {
        self.fingerprints.contains(fingerprint)
    }

    pub fn has_slug(&self, slug: &str) -> bool {
        self.slugs.contains(slug)
    }

    pub fn recent(&self, n: usize) -> Vec<Topic> {
        let start = self.topics.len().saturating_sub(n);
        self.topics[start..].to_vec()
    }

    pub fn next_pending(&self) -> Option<Topic> {
        self.topics
            .iter()
            .find(|t| t.status == TopicStatus::Pending)
            .cloned()
    }

    fn next_id(&self) -> u64 {
        self.topics.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    /// Build the row a commit of `draft` would append.
    ///
    /// The fingerprint is always recomputed from the content. A caller's slug
    /// is kept only when it is the slugified title, optionally with a `-N`
    /// suffix; a caller's url only when it points at that slug's page.
    pub fn prepare_commit(&self, draft: TopicDraft) -> Result<Topic> {
        let fingerprint = fingerprint(&draft.title, &draft.body);
        if self.has_fingerprint(&fingerprint) {
            return Err(Error::Conflict(Conflict::Fingerprint));
        }

        let base = slugify(&draft.title);
        let slug = match draft.slug {
            Some(slug) if is_slug_of(&slug, &base) => slug,
            _ => resolve_slug(&base, |s| self.has_slug(s)),
        };
        if self.has_slug(&slug) {
            return Err(Error::Conflict(Conflict::Slug));
        }

        let page = format!("posts/{}.html", slug);
        let url = match draft.url {
            Some(url) if url == page || url.ends_with(&format!("/{}", page)) => url,
            _ => page,
        };
        Ok(Topic {
            id: self.next_id(),
            title: draft.title,
            slug,
            body: draft.body,
            category: draft.category.unwrap_or(Category::Other),
            fingerprint,
            created_at: Utc::now(),
            url,
            status: TopicStatus::Pending,
            article_attempts: 0,
        })
    }

    /// Build the updated row for a status change.
    pub fn prepare_status(&self, id: u64, status: TopicStatus, article_attempts: u32) -> Result<Topic> {
        let mut topic = self
            .topics
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| Error::Storage(format!("No topic with id {}", id)))?;
        topic.status = status;
        topic.article_attempts = article_attempts;
        Ok(topic)
    }

    pub fn insert(&mut self, topic: Topic) {
        self.fingerprints.insert(topic.fingerprint.clone());
        self.slugs.insert(topic.slug.clone());
        self.topics.push(topic);
    }

    /// Swap in an updated row with the same id. Keys are not re-indexed
    /// because only status fields may differ.
    pub fn replace(&mut self, topic: Topic) {
        if let Some(existing) = self.topics.iter_mut().find(|t| t.id == topic.id) {
            *existing = topic;
        }
    }

    /// The rows as they would look after `topic` is inserted or replaced.
    pub fn snapshot_with(&self, topic: &Topic) -> Vec<Topic> {
        let mut rows = self.topics.clone();
        match rows.iter_mut().find(|t| t.id == topic.id) {
            Some(existing) => *existing = topic.clone(),
            None => rows.push(topic.clone()),
        }
        rows
    }
}

/// `slug` is `base` or `base-N` for some N >= 2.
fn is_slug_of(slug: &str, base: &str) -> bool {
    match slug.strip_prefix(base) {
        Some("") => true,
        Some(rest) => match rest.strip_prefix('-') {
            Some(n) if !n.starts_with('0') && n.bytes().all(|b| b.is_ascii_digit()) => {
                n.parse::<u64>().map_or(false, |n| n >= 2)
            }
            _ => false,
        },
        None => false,
    }
}
