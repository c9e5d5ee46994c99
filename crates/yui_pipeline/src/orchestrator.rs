use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use yui_core::{
    fingerprint, resolve_slug, slugify, Article, Error, GenerationOracle, Result, Topic, TopicDraft,
    TopicStatus, TopicStore,
};
use yui_inference::category::Categorizer;
use yui_inference::decode::{parse_article, parse_topic};
use yui_inference::equivalence::EquivalenceChecker;
use yui_inference::prompts::{article_prompt, topic_prompt};
use crate::config::PipelineConfig;
use crate::rotation::RotationGuard;
use crate::validator::{ArticleValidator, TopicValidator};
use crate::Rejection;

/// Where a topic run currently is. Any rejection goes back to `Generating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Generating,
    Validating,
    DedupChecking,
    RotationChecking,
    Committing,
    Done,
    Exhausted,
}

#[derive(Debug, Clone)]
pub enum TopicOutcome {
    Done(Topic),
    /// The budget ran out without an accepted topic. Not an error.
    Exhausted { attempts: u32, rejections: Vec<Rejection> },
}

impl TopicOutcome {
    pub fn stage(&self) -> Stage {
        match self {
            TopicOutcome::Done(_) => Stage::Done,
            TopicOutcome::Exhausted { .. } => Stage::Exhausted,
        }
    }

    pub fn topic(&self) -> Option<&Topic> {
        match self {
            TopicOutcome::Done(topic) => Some(topic),
            TopicOutcome::Exhausted { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ArticleOutcome {
    Done { topic: Topic, article: Article },
    /// No valid article this run; `topic` carries the updated status.
    Exhausted { topic: Topic, attempts: u32 },
    NoPendingTopic,
}

/// Drives generate → validate → dedup → rotation → commit with a bounded
/// number of sequential retries.
///
/// Oracle, store and config are injected; the pipeline holds no other state
/// between runs.
pub struct Pipeline {
    oracle: Arc<dyn GenerationOracle>,
    store: Arc<dyn TopicStore>,
    equivalence: EquivalenceChecker,
    categorizer: Categorizer,
    topic_validator: TopicValidator,
    article_validator: ArticleValidator,
    rotation: RotationGuard,
    config: PipelineConfig,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("oracle", &self.oracle.name())
            .field("store", &"<dyn TopicStore>")
            .field("config", &self.config)
            .finish()
    }
}

impl Pipeline {
    pub fn new(oracle: Arc<dyn GenerationOracle>, store: Arc<dyn TopicStore>, config: PipelineConfig) -> Self {
        let timeout = config.oracle_timeout();
        Self {
            equivalence: EquivalenceChecker::new(oracle.clone(), config.similarity_threshold).with_timeout(timeout),
            categorizer: Categorizer::new(oracle.clone()).with_timeout(timeout),
            topic_validator: TopicValidator::new(config.min_title_chars, config.min_body_chars),
            article_validator: ArticleValidator::new(config.article.clone()),
            rotation: RotationGuard::new(config.rotation_k),
            oracle,
            store,
            config,
        }
    }

    /// Use a separate oracle for duplicate judgments and categorization.
    pub fn with_judge(mut self, judge: Arc<dyn GenerationOracle>) -> Self {
        let timeout = self.config.oracle_timeout();
        self.equivalence = EquivalenceChecker::new(judge.clone(), self.config.similarity_threshold).with_timeout(timeout);
        self.categorizer = Categorizer::new(judge).with_timeout(timeout);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn enter(stage: &mut Stage, next: Stage) {
        debug!("{:?} -> {:?}", stage, next);
        *stage = next;
    }

    async fn ask(&self, prompt: &str) -> std::result::Result<String, Rejection> {
        let timeout = self.config.oracle_timeout();
        match tokio::time::timeout(timeout, self.oracle.complete(prompt)).await {
            Ok(Ok(text)) if text.trim().is_empty() => Err(Rejection::Oracle("empty output".to_string())),
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(Rejection::Oracle(e.to_string())),
            Err(_) => Err(Rejection::Oracle(format!("timed out after {:?}", timeout))),
        }
    }

    /// Produce at most one committed topic.
    ///
    /// Returns `Err` only when the store itself fails; every other problem
    /// is a rejection that consumes one attempt.
    pub async fn run_topic(&self) -> Result<TopicOutcome> {
        let mut stage = Stage::Start;
        let mut rejections = Vec::new();
        let prompt = topic_prompt(self.config.min_title_chars, self.config.min_body_chars);

        for attempt in 1..=self.config.max_attempts {
            debug!("🤖 Topic attempt {}/{}", attempt, self.config.max_attempts);
            match self.attempt_topic(&prompt, &mut stage).await? {
                Ok(topic) => {
                    Self::enter(&mut stage, Stage::Done);
                    info!("✅ Committed topic #{} '{}' ({})", topic.id, topic.title, topic.category);
                    return Ok(TopicOutcome::Done(topic));
                }
                Err(rejection) => {
                    warn!("⚠️ Attempt {}/{} rejected: {}", attempt, self.config.max_attempts, rejection);
                    rejections.push(rejection);
                }
            }
        }

        Self::enter(&mut stage, Stage::Exhausted);
        info!("💤 No topic produced after {} attempts", self.config.max_attempts);
        Ok(TopicOutcome::Exhausted {
            attempts: self.config.max_attempts,
            rejections,
        })
    }

    async fn attempt_topic(&self, prompt: &str, stage: &mut Stage) -> Result<std::result::Result<Topic, Rejection>> {
        Self::enter(stage, Stage::Generating);
        let text = match self.ask(prompt).await {
            Ok(text) => text,
            Err(rejection) => return Ok(Err(rejection)),
        };
        let mut draft = match parse_topic(&text) {
            Ok(draft) => draft,
            Err(e) => return Ok(Err(Rejection::Oracle(e.to_string()))),
        };

        Self::enter(stage, Stage::Validating);
        if let Err(e) = self.topic_validator.validate(&draft, prompt) {
            return Ok(Err(Rejection::Structural(e)));
        }

        Self::enter(stage, Stage::DedupChecking);
        let hash = fingerprint(&draft.title, &draft.body);
        if self.store.has_fingerprint(&hash).await? {
            return Ok(Err(Rejection::ExactDuplicate));
        }
        draft.fingerprint = Some(hash);
        let recent = self.store.recent(self.config.recency_window).await?;
        let verdict = self.equivalence.judge(&draft, &recent).await;
        if verdict.is_duplicate() {
            return Ok(Err(Rejection::SemanticDuplicate(format!("{:?}", verdict))));
        }

        Self::enter(stage, Stage::RotationChecking);
        let category = self.categorizer.categorize(&draft).await;
        let recent_categories: Vec<_> = self
            .store
            .recent(self.config.rotation_k)
            .await?
            .iter()
            .map(|t| t.category)
            .collect();
        if let Err(rejection) = self.rotation.check(category, &recent_categories) {
            return Ok(Err(rejection));
        }
        draft.category = Some(category);

        Self::enter(stage, Stage::Committing);
        let taken: HashSet<String> = self.store.all().await?.into_iter().map(|t| t.slug).collect();
        let slug = resolve_slug(&slugify(&draft.title), |s| taken.contains(s));
        draft.url = Some(self.config.topic_url(&slug));
        draft.slug = Some(slug);

        match self.store.commit(draft).await {
            Ok(topic) => Ok(Ok(topic)),
            Err(Error::Conflict(conflict)) => Ok(Err(Rejection::StoreConflict(conflict))),
            Err(e) => Err(e),
        }
    }

    /// Run [`Pipeline::run_topic`] up to `count` times, stopping at the first
    /// exhausted run.
    pub async fn run_batch(&self, count: usize) -> Result<Vec<Topic>> {
        let mut committed = Vec::with_capacity(count);
        for _ in 0..count {
            match self.run_topic().await? {
                TopicOutcome::Done(topic) => committed.push(topic),
                TopicOutcome::Exhausted { .. } => break,
            }
        }
        info!("📰 Batch produced {}/{} topics", committed.len(), count);
        Ok(committed)
    }

    /// Generate the article for the oldest pending topic.
    ///
    /// A run that fails every attempt bumps the topic's `article_attempts`;
    /// after `max_article_runs` such runs the topic is marked exhausted and
    /// is no longer picked.
    pub async fn run_article(&self) -> Result<ArticleOutcome> {
        let topic = match self.store.next_pending().await? {
            Some(topic) => topic,
            None => {
                info!("📭 No pending topic");
                return Ok(ArticleOutcome::NoPendingTopic);
            }
        };
        info!("📝 Writing article for topic #{} '{}'", topic.id, topic.title);
        let prompt = article_prompt(&topic);

        for attempt in 1..=self.config.max_attempts {
            let result = match self.ask(&prompt).await {
                Ok(text) => parse_article(&text).map_err(|e| Rejection::Oracle(e.to_string())),
                Err(rejection) => Err(rejection),
            };
            let result = result.and_then(|article| {
                self.article_validator
                    .validate(&article)
                    .map(|_| article)
                    .map_err(Rejection::Structural)
            });

            match result {
                Ok(article) => {
                    let topic = self
                        .store
                        .update_status(topic.id, TopicStatus::Done, topic.article_attempts)
                        .await?;
                    info!("✅ Article accepted for topic #{}", topic.id);
                    return Ok(ArticleOutcome::Done { topic, article });
                }
                Err(rejection) => {
                    warn!("⚠️ Article attempt {}/{} rejected: {}", attempt, self.config.max_attempts, rejection);
                }
            }
        }

        let failed_runs = topic.article_attempts + 1;
        let status = if failed_runs >= self.config.max_article_runs {
            TopicStatus::Exhausted
        } else {
            TopicStatus::Pending
        };
        let topic = self.store.update_status(topic.id, status, failed_runs).await?;
        info!(
            "💤 No article for topic #{} ({} failed runs, now {:?})",
            topic.id, failed_runs, topic.status
        );
        Ok(ArticleOutcome::Exhausted {
            topic,
            attempts: self.config.max_attempts,
        })
    }
}
