/*!
 * Mock provider implementation for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds with translated text
 * - `MockProvider::failing()` - Always fails with a transient error
 * - `MockProvider::fail_times(n)` - Fails transiently n times, then succeeds
 * - `MockProvider::rejecting()` - Fails with a non-retryable client error
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Always fails with a connection error
    Failing,
    /// Fails with a connection error for the first `failures` calls
    FailTimes { failures: usize },
    /// Always fails with a 400 response
    Rejecting,
}

/// One recorded call
#[derive(Debug, Clone)]
pub struct MockCall {
    /// When the call started
    pub at: Instant,
    /// The prompt received
    pub prompt: String,
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared by clones
    request_count: Arc<AtomicUsize>,
    /// Every call received, shared by clones
    calls: Arc<Mutex<Vec<MockCall>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&str) -> String>,
    /// Per-prompt latency in milliseconds (optional)
    latency: Option<fn(&str) -> u64>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
            latency: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a provider that fails `failures` times before succeeding
    pub fn fail_times(failures: usize) -> Self {
        Self::new(MockBehavior::FailTimes { failures })
    }

    /// Create a provider that rejects every request with a client error
    pub fn rejecting() -> Self {
        Self::new(MockBehavior::Rejecting)
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Delay each response by a prompt-dependent number of milliseconds
    pub fn with_latency(mut self, latency: fn(&str) -> u64) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of calls received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Snapshot of every call received so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(MockCall {
            at: Instant::now(),
            prompt: prompt.to_string(),
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(Duration::from_millis(latency(prompt))).await;
        }

        let transient = || ProviderError::ConnectionError(format!("Simulated failure (request #{})", count + 1));

        match self.behavior {
            MockBehavior::Failing => return Err(transient()),
            MockBehavior::FailTimes { failures } if count < failures => return Err(transient()),
            MockBehavior::Rejecting => {
                return Err(ProviderError::ApiError {
                    status_code: 400,
                    message: "Simulated bad request".to_string(),
                });
            }
            _ => {}
        }

        Ok(match self.custom_response {
            Some(generator) => generator(prompt),
            None => format!("[TRANSLATED] {}", prompt),
        })
    }

    async fn test_connection(&self) -> Result<String, ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated outage".to_string())),
            _ => Ok("mock provider".to_string()),
        }
    }
}
