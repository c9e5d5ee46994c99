use async_trait::async_trait;
use std::fmt;
use crate::Result;

/// A text-generation capability. Output is untrusted: it may be empty,
/// truncated, or in the wrong shape, and callers validate it.
#[async_trait]
pub trait GenerationOracle: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Send a free-text instruction and return the raw completion.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
