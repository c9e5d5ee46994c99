use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse consultation category, assigned after a topic is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    UnrequitedLove,
    Breakup,
    Infidelity,
    DatingApp,
    Office,
    AgeGap,
    Marriage,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::UnrequitedLove,
        Category::Breakup,
        Category::Infidelity,
        Category::DatingApp,
        Category::Office,
        Category::AgeGap,
        Category::Marriage,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::UnrequitedLove => "unrequited-love",
            Category::Breakup => "breakup",
            Category::Infidelity => "infidelity",
            Category::DatingApp => "dating-app",
            Category::Office => "office",
            Category::AgeGap => "age-gap",
            Category::Marriage => "marriage",
            Category::Other => "other",
        }
    }

    /// Japanese gloss shown to the oracle next to the label.
    pub fn gloss(&self) -> &'static str {
        match self {
            Category::UnrequitedLove => "片思い",
            Category::Breakup => "別れ・復縁",
            Category::Infidelity => "浮気・不倫",
            Category::DatingApp => "マッチングアプリ",
            Category::Office => "職場恋愛",
            Category::AgeGap => "年の差",
            Category::Marriage => "結婚",
            Category::Other => "その他",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', ' '], "-");
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.label() == wanted)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Article generation state of a committed topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicStatus {
    #[default]
    Pending,
    Done,
    Exhausted,
}

/// A committed consultation topic. Content fields never change after commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: u64,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub category: Category,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
    #[serde(default)]
    pub status: TopicStatus,
    #[serde(default)]
    pub article_attempts: u32,
}

/// A generated topic on its way through the pipeline.
///
/// The annotation fields are filled in by the pipeline stages; a draft with
/// missing annotations can still be committed, the store derives them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicDraft {
    pub title: String,
    pub body: String,
    pub category: Option<Category>,
    pub fingerprint: Option<String>,
    pub slug: Option<String>,
    pub url: Option<String>,
}

impl TopicDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }
}

/// Structured answer generated for a topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    pub lead: String,
    pub summary_answer: String,
    pub psychology: String,
    pub actions: Vec<String>,
    pub avoid: Vec<String>,
    /// A common misreading of the situation, corrected.
    pub misunderstanding: String,
    pub conclusion: String,
}

impl Article {
    pub fn text_sections(&self) -> [(&'static str, &str); 5] {
        [
            ("lead", self.lead.as_str()),
            ("summary_answer", self.summary_answer.as_str()),
            ("psychology", self.psychology.as_str()),
            ("misunderstanding", self.misunderstanding.as_str()),
            ("conclusion", self.conclusion.as_str()),
        ]
    }

    pub fn list_sections(&self) -> [(&'static str, &[String]); 2] {
        [("actions", self.actions.as_slice()), ("avoid", self.avoid.as_slice())]
    }
}
