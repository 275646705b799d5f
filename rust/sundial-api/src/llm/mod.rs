//! Generation backend abstraction.
//!
//! The Execution Engine talks to the generation backend through the
//! [`GenerationClient`] trait: a prompt goes in, text or an error comes
//! out. That outcome alone determines a run's status.

pub mod openai;

pub use openai::ChatCompletionsClient;

use async_trait::async_trait;

/// Narrow interface over the generation backend.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a response for the given prompt.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
