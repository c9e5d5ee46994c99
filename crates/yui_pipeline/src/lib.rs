use thiserror::Error;
use yui_core::{Category, Conflict};

pub mod config;
pub mod orchestrator;
pub mod rotation;
pub mod validator;

pub use config::{ArticleLimits, PipelineConfig};
pub use orchestrator::{ArticleOutcome, Pipeline, Stage, TopicOutcome};
pub use rotation::RotationGuard;
pub use validator::{ArticleValidator, TopicValidator, ValidationError};

/// Why one candidate was discarded. Every variant sends the pipeline back to
/// generation; none of them is fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("oracle failure: {0}")]
    Oracle(String),

    #[error("structural: {0}")]
    Structural(#[from] ValidationError),

    #[error("exact duplicate of a stored topic")]
    ExactDuplicate,

    #[error("semantic duplicate: {0}")]
    SemanticDuplicate(String),

    #[error("category {0} used too recently")]
    Rotation(Category),

    #[error("store conflict on {0}")]
    StoreConflict(Conflict),
}

pub mod prelude {
    pub use super::{ArticleOutcome, Pipeline, PipelineConfig, Rejection, Stage, TopicOutcome};
    pub use yui_core::{Article, Error, Result, Topic, TopicStore};
}
