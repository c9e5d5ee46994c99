use std::sync::Arc;
use yui_core::{Error, GenerationOracle, Result};
use crate::OracleConfig;

pub mod deepseek;
pub mod dummy;
pub mod ollama;

pub use deepseek::DeepSeekModel;
pub use dummy::DummyModel;
pub use ollama::OllamaModel;

/// Build the oracle named by `config.model` (`ollama`, `deepseek` or `dummy`).
pub fn create_model(config: &OracleConfig) -> Result<Arc<dyn GenerationOracle>> {
    let model: Arc<dyn GenerationOracle> = match config.model.as_str() {
        "ollama" => Arc::new(OllamaModel::new(config)?),
        "deepseek" => Arc::new(DeepSeekModel::new(config)?),
        "dummy" => Arc::new(DummyModel::canned()),
        other => {
            return Err(Error::Config(format!(
                "Unknown model '{}'. Available models: ollama, deepseek, dummy",
                other
            )))
        }
    };
    tracing::debug!("Created {} oracle", model.name());
    Ok(model)
}
