pub mod error;
pub mod fingerprint;
pub mod models;
pub mod slug;
pub mod storage;
pub mod types;

pub use error::{Conflict, Error, Result};
pub use fingerprint::fingerprint;
pub use models::GenerationOracle;
pub use slug::{resolve_slug, slugify};
pub use storage::TopicStore;
pub use types::{Article, Category, Topic, TopicDraft, TopicStatus};
