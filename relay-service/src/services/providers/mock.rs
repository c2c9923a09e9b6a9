//! Mock provider implementation for testing.

use super::{FinishReason, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

enum Behavior {
    Echo,
    Reply(String),
    Fail(String),
}

/// Scripted text provider.
///
/// Echoes the prompt by default; can be fixed to a reply or to a failure.
/// Every prompt it receives is recorded.
pub struct MockTextProvider {
    behavior: Behavior,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl Default for MockTextProvider {
    fn default() -> Self {
        Self::with_behavior(Behavior::Echo)
    }
}

impl MockTextProvider {
    pub fn echo() -> Self {
        Self::default()
    }

    /// Always answer with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Reply(reply.into()))
    }

    /// Always fail with an API error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Fail(message.into()))
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of `generate` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let text = match &self.behavior {
            Behavior::Echo => format!("Mock response for: {}", prompt),
            Behavior::Reply(reply) => reply.clone(),
            Behavior::Fail(message) => return Err(ProviderError::ApiError(message.clone())),
        };

        Ok(ProviderResponse {
            text,
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: 10,
            finish_reason: FinishReason::Complete,
        })
    }

    fn model(&self) -> &str {
        "mock"
    }
}
