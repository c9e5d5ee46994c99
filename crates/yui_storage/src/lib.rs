use std::path::Path;
use std::sync::Arc;
use yui_core::{Error, Result, TopicStore};

pub mod backends;
pub mod ledger;

pub use backends::*;
pub use ledger::TopicLedger;

/// Build a store from its CLI name (`memory` or `json`).
pub fn create_storage(kind: &str, path: Option<&Path>) -> Result<Arc<dyn TopicStore>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        "json" => {
            let path = path.unwrap_or_else(|| Path::new(backends::json::DEFAULT_PATH));
            Ok(Arc::new(JsonFileStorage::open(path)?))
        }
        other => Err(Error::Config(format!("Unknown storage backend: {}", other))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_storage;
    pub use yui_core::TopicStore;
}
