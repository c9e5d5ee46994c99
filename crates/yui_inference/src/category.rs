use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use yui_core::{Category, GenerationOracle, TopicDraft};
use crate::prompts::category_prompt;

/// Checked in order, most specific first. Bare 夫/妻 are left out because
/// they occur inside everyday words (大丈夫, 稲妻).
const KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Infidelity, &["浮気", "不倫", "二股", "cheat", "affair"]),
    (Category::Breakup, &["別れ", "復縁", "元彼", "元カレ", "元カノ", "breakup"]),
    (Category::DatingApp, &["アプリ", "マッチング", "dating app"]),
    (Category::UnrequitedLove, &["片思い", "片想い", "告白", "unrequited"]),
    (Category::AgeGap, &["年の差", "年上", "年下", "age gap"]),
    (Category::Marriage, &["結婚", "婚約", "夫婦", "旦那", "既婚", "嫁", "marriage"]),
    (Category::Office, &["職場", "会社", "同僚", "上司", "部署", "office"]),
];

/// Assigns a category to an accepted-so-far draft. Never fails: the oracle
/// is asked first, then keyword heuristics, then [`Category::Other`].
pub struct Categorizer {
    oracle: Arc<dyn GenerationOracle>,
    timeout: Duration,
}

impl std::fmt::Debug for Categorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Categorizer")
            .field("oracle", &self.oracle.name())
            .finish()
    }
}

impl Categorizer {
    pub fn new(oracle: Arc<dyn GenerationOracle>) -> Self {
        Self {
            oracle,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn categorize(&self, draft: &TopicDraft) -> Category {
        let prompt = category_prompt(draft);
        match tokio::time::timeout(self.timeout, self.oracle.complete(&prompt)).await {
            Ok(Ok(reply)) => {
                if let Some(category) = parse_category(&reply) {
                    return category;
                }
                debug!("No category label in reply '{}', using keywords", reply.trim());
            }
            Ok(Err(e)) => warn!("Categorization failed, using keywords: {}", e),
            Err(_) => warn!("Categorization timed out, using keywords"),
        }
        keyword_category(draft)
    }
}

/// The single label mentioned in `reply`, if exactly one is.
pub fn parse_category(reply: &str) -> Option<Category> {
    let reply = reply.to_lowercase().replace('_', "-");
    let mut found = Category::ALL
        .iter()
        .copied()
        .filter(|c| reply.contains(c.label()));
    match (found.next(), found.next()) {
        (Some(category), None) => Some(category),
        _ => None,
    }
}

pub fn keyword_category(draft: &TopicDraft) -> Category {
    let text = format!("{}\n{}", draft.title, draft.body).to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}
