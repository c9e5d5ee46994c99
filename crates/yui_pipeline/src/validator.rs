//! Structural checks on oracle output. Pure: nothing here mutates a candidate.

use thiserror::Error;
use yui_core::fingerprint::normalize;
use yui_core::{Article, TopicDraft};
use yui_inference::prompts::{BODY_MARKER, TITLE_MARKER};
use crate::config::ArticleLimits;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is empty or missing")]
    Missing(&'static str),

    #[error("{field} has {actual} characters, needs at least {min}")]
    TooShort {
        field: &'static str,
        min: usize,
        actual: usize,
    },

    #[error("{0} echoes the prompt")]
    EchoedPrompt(&'static str),

    #[error("{field} has {actual} items, needs at least {min}")]
    TooFewItems {
        field: &'static str,
        min: usize,
        actual: usize,
    },

    #[error("{0} contains a blank item")]
    BlankItem(&'static str),
}

fn check_len(field: &'static str, text: &str, min: usize) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    let actual = trimmed.chars().count();
    if actual < min {
        return Err(ValidationError::TooShort { field, min, actual });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct TopicValidator {
    min_title_chars: usize,
    min_body_chars: usize,
}

impl TopicValidator {
    pub fn new(min_title_chars: usize, min_body_chars: usize) -> Self {
        Self {
            min_title_chars,
            min_body_chars,
        }
    }

    /// Accepts `draft` only if both fields meet their minimum length and
    /// neither is a copy of `prompt`.
    pub fn validate(&self, draft: &TopicDraft, prompt: &str) -> Result<(), ValidationError> {
        check_len("title", &draft.title, self.min_title_chars)?;
        check_len("body", &draft.body, self.min_body_chars)?;

        let prompt = normalize(prompt);
        if prompt.contains(&normalize(&draft.title)) {
            return Err(ValidationError::EchoedPrompt("title"));
        }
        if prompt.contains(&normalize(&draft.body))
            || draft.body.contains(TITLE_MARKER)
            || draft.body.contains(BODY_MARKER)
        {
            return Err(ValidationError::EchoedPrompt("body"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArticleValidator {
    limits: ArticleLimits,
}

impl ArticleValidator {
    pub fn new(limits: ArticleLimits) -> Self {
        Self { limits }
    }

    /// All sections must pass; the first failure rejects the whole article.
    pub fn validate(&self, article: &Article) -> Result<(), ValidationError> {
        for (name, text) in article.text_sections() {
            check_len(name, text, self.limits.min_chars(name))?;
        }
        for (name, items) in article.list_sections() {
            let min = self.limits.min_items(name);
            if items.is_empty() {
                return Err(ValidationError::Missing(name));
            }
            if items.len() < min {
                return Err(ValidationError::TooFewItems {
                    field: name,
                    min,
                    actual: items.len(),
                });
            }
            if items.iter().any(|item| item.trim().is_empty()) {
                return Err(ValidationError::BlankItem(name));
            }
        }
        Ok(())
    }
}
