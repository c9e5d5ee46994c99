use std::time::Duration;

pub mod category;
pub mod decode;
pub mod equivalence;
pub mod models;
pub mod prompts;
pub mod similarity;

/// Which oracle to build and how to reach it.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub model: String,
    pub model_url: Option<String>,
    pub model_name: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: "ollama".to_string(),
            model_url: None,
            model_name: None,
            api_key: None,
            timeout: Duration::from_secs(120),
        }
    }
}

pub mod prelude {
    pub use super::category::Categorizer;
    pub use super::equivalence::{Equivalence, EquivalenceChecker};
    pub use super::models::create_model;
    pub use super::prompts::PromptKind;
    pub use super::OracleConfig;
    pub use yui_core::{Error, GenerationOracle, Result};
}

pub use models::create_model;
