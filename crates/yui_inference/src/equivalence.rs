use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use yui_core::{GenerationOracle, Topic, TopicDraft};
use crate::prompts::equivalence_prompt;
use crate::similarity::text_similarity;

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.85;

/// Outcome of comparing a candidate with recently accepted topics.
#[derive(Debug, Clone, PartialEq)]
pub enum Equivalence {
    Distinct,
    /// The text measure alone was close enough.
    Similar { slug: String, score: f32 },
    /// The oracle judged it the same situation.
    Paraphrase { slug: Option<String> },
    /// No usable judgment. Counts as a duplicate.
    Undecided(String),
}

impl Equivalence {
    pub fn is_duplicate(&self) -> bool {
        !matches!(self, Equivalence::Distinct)
    }
}

/// Meaning-level duplicate check against a window of recent topics.
pub struct EquivalenceChecker {
    oracle: Arc<dyn GenerationOracle>,
    threshold: f32,
    timeout: Duration,
}

impl fmt::Debug for EquivalenceChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EquivalenceChecker")
            .field("oracle", &self.oracle.name())
            .field("threshold", &self.threshold)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl EquivalenceChecker {
    pub fn new(oracle: Arc<dyn GenerationOracle>, threshold: f32) -> Self {
        Self {
            oracle,
            threshold,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn is_duplicate(&self, candidate: &TopicDraft, recent: &[Topic]) -> bool {
        self.judge(candidate, recent).await.is_duplicate()
    }

    pub async fn judge(&self, candidate: &TopicDraft, recent: &[Topic]) -> Equivalence {
        if recent.is_empty() {
            return Equivalence::Distinct;
        }

        let closest = recent
            .iter()
            .map(|t| (t, text_similarity(&candidate.title, &candidate.body, &t.title, &t.body)))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((topic, score)) = closest {
            debug!("Closest recent topic '{}' scored {:.2}", topic.slug, score);
            if score >= self.threshold {
                return Equivalence::Similar {
                    slug: topic.slug.clone(),
                    score,
                };
            }
        }

        let prompt = equivalence_prompt(candidate, recent);
        let reply = match tokio::time::timeout(self.timeout, self.oracle.complete(&prompt)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                warn!("Equivalence judgment failed: {}", e);
                return Equivalence::Undecided(e.to_string());
            }
            Err(_) => {
                warn!("Equivalence judgment timed out after {:?}", self.timeout);
                return Equivalence::Undecided("timeout".to_string());
            }
        };
        parse_verdict(&reply, recent)
    }
}

/// Read a `SAME [n]` / `DIFFERENT` reply. Anything else is undecided.
pub fn parse_verdict(reply: &str, recent: &[Topic]) -> Equivalence {
    let upper = reply.trim().to_uppercase();
    let same = upper.contains("SAME");
    let different = upper.contains("DIFFERENT");
    match (same, different) {
        (false, true) => Equivalence::Distinct,
        (true, false) => {
            let slug = upper
                .split(|c: char| !c.is_ascii_digit())
                .find_map(|n| n.parse::<usize>().ok())
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| recent.get(i))
                .map(|t| t.slug.clone());
            Equivalence::Paraphrase { slug }
        }
        _ => Equivalence::Undecided(format!("unrecognised verdict: {}", reply.trim())),
    }
}
