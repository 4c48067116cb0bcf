//! The external text-generation collaborator. The rest of the application
//! only needs "given a prompt, return a response string, possibly failing",
//! so everything hides behind [Oracle].

pub mod ollama;

use async_trait::async_trait;

use crate::error::Result;

/// Contract for the text-generation service used for categorization and
/// query translation. Tests substitute a deterministic stand-in.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Oracle: Sync + Send {
    async fn query(&self, prompt: &str) -> Result<String>;
}
