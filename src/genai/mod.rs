//! Capabilities of the external generative-language service.

pub mod gemini;
pub mod retry;

use async_trait::async_trait;

use crate::error::ServiceError;

/// A single opaque text-generation call.
///
/// `Ok(None)` means the service answered without any text (for example a
/// blocked or empty candidate); callers decide how to render that.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    async fn generate_content(&self, prompt: &str) -> Result<Option<String>, ServiceError>;
}
