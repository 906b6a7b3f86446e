/*!
 * Provider implementations for the remote completion service.
 *
 * - Ollama: local or remote Ollama server (`/api/generate`)
 * - Mock: deterministic in-process provider used by the test suite
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all completion providers
///
/// A provider is a plain `prompt -> text` capability. It makes exactly one
/// attempt per call; retries, timeouts and rate limiting are applied by
/// [`crate::translation::TranslationService`].
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Send a prompt and return the generated text
    ///
    /// # Arguments
    /// * `prompt` - The full prompt to complete
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The generated text or an error
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - A short description of the server on success
    async fn test_connection(&self) -> Result<String, ProviderError>;
}

pub mod mock;
pub mod ollama;
