use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use yui_core::{Error, Result};

/// Minimum sizes for each article section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleLimits {
    pub lead: usize,
    pub summary_answer: usize,
    pub psychology: usize,
    pub misunderstanding: usize,
    pub conclusion: usize,
    pub min_actions: usize,
    pub min_avoid: usize,
}

impl Default for ArticleLimits {
    fn default() -> Self {
        Self {
            lead: 30,
            summary_answer: 30,
            psychology: 50,
            misunderstanding: 30,
            conclusion: 30,
            min_actions: 3,
            min_avoid: 2,
        }
    }
}

impl ArticleLimits {
    pub fn min_chars(&self, section: &str) -> usize {
        match section {
            "lead" => self.lead,
            "summary_answer" => self.summary_answer,
            "psychology" => self.psychology,
            "misunderstanding" => self.misunderstanding,
            "conclusion" => self.conclusion,
            _ => 1,
        }
    }

    pub fn min_items(&self, section: &str) -> usize {
        match section {
            "actions" => self.min_actions,
            "avoid" => self.min_avoid,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Oracle calls allowed per run before giving up.
    pub max_attempts: u32,
    pub min_title_chars: usize,
    pub min_body_chars: usize,
    /// How many recent topics the semantic check compares against.
    pub recency_window: usize,
    /// A category may not repeat within this many recent topics. 0 disables.
    pub rotation_k: usize,
    pub similarity_threshold: f32,
    pub oracle_timeout_secs: u64,
    /// Failed article runs before a topic is marked exhausted.
    pub max_article_runs: u32,
    pub site_url: String,
    pub article: ArticleLimits,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            min_title_chars: 20,
            min_body_chars: 120,
            recency_window: 5,
            rotation_k: 3,
            similarity_threshold: 0.85,
            oracle_timeout_secs: 120,
            max_article_runs: 3,
            site_url: "https://yui-love.vercel.app".to_string(),
            article: ArticleLimits::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    pub fn topic_url(&self, slug: &str) -> String {
        format!("{}/posts/{}.html", self.site_url.trim_end_matches('/'), slug)
    }
}
