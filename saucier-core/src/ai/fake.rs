//! Fake generation client for testing.
//!
//! This client returns deterministic responses based on prompt matching,
//! allowing tests to run without network access or API costs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::client::{AiClient, AiError};
use super::types::{ChatRequest, ChatResponse, GeneratedImage, ImageRequest, Usage};

/// Scripted outcome for one kind of call.
#[derive(Debug, Clone)]
enum Scripted {
    Respond(String),
    Fail(String),
}

/// Scripted outcome for image generation.
#[derive(Debug, Clone)]
enum ScriptedImage {
    Url(String),
    NoImage,
    Fail(String),
}

#[derive(Debug, Default)]
struct FakeState {
    /// Ordered (prompt substring, outcome) pairs; first match wins.
    responses: Vec<(String, Scripted)>,
    default_response: Option<Scripted>,
    image: Option<ScriptedImage>,
    calls: HashMap<String, usize>,
    prompts: Vec<String>,
    delay: Option<Duration>,
}

/// A fake generation client for testing.
///
/// Text responses are matched by checking if the prompt contains a registered
/// substring (case-insensitive). If no match is found, the default response is
/// used, or the call fails.
#[derive(Debug)]
pub struct FakeAiClient {
    state: Mutex<FakeState>,
    has_credential: bool,
}

impl Default for FakeAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeAiClient {
    /// Create a new fake with no registered responses and no image.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            has_credential: true,
        }
    }

    /// Create a fake that returns a specific response for prompts containing a substring.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let fake = Self::new();
        fake.add_response(prompt_contains, response);
        fake
    }

    /// Add a response for prompts containing a specific substring.
    pub fn add_response(&self, prompt_contains: &str, response: &str) {
        self.set(prompt_contains, Scripted::Respond(response.to_string()));
    }

    /// Make prompts containing a specific substring fail with a request error.
    pub fn add_failure(&self, prompt_contains: &str, message: &str) {
        self.set(prompt_contains, Scripted::Fail(message.to_string()));
    }

    /// Set the default response when no pattern matches.
    pub fn with_default_response(self, response: &str) -> Self {
        self.lock().default_response = Some(Scripted::Respond(response.to_string()));
        self
    }

    /// Return this URL from image generation.
    pub fn with_image_url(self, url: &str) -> Self {
        self.set_image_url(url);
        self
    }

    pub fn set_image_url(&self, url: &str) {
        self.lock().image = Some(ScriptedImage::Url(url.to_string()));
    }

    /// Make image generation fail.
    pub fn with_image_failure(self, message: &str) -> Self {
        self.lock().image = Some(ScriptedImage::Fail(message.to_string()));
        self
    }

    /// Make image generation succeed with no image entry.
    pub fn without_image(self) -> Self {
        self.lock().image = Some(ScriptedImage::NoImage);
        self
    }

    /// Report no configured credential.
    pub fn without_credential(mut self) -> Self {
        self.has_credential = false;
        self
    }

    /// Sleep before answering each call.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.lock().delay = Some(delay);
        self
    }

    /// Number of calls made under a prompt name.
    pub fn call_count(&self, prompt_name: &str) -> usize {
        self.lock().calls.get(prompt_name).copied().unwrap_or(0)
    }

    /// Total number of calls across all prompt names.
    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Every prompt received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    fn set(&self, prompt_contains: &str, outcome: Scripted) {
        let mut state = self.lock();
        let key = prompt_contains.to_lowercase();
        match state.responses.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = outcome,
            None => state.responses.push((key, outcome)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        // A panicking test thread must not poison the fake for the others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call and return the configured delay.
    fn record(&self, prompt_name: &str, prompt: &str) -> Option<Duration> {
        let mut state = self.lock();
        *state.calls.entry(prompt_name.to_string()).or_default() += 1;
        state.prompts.push(prompt.to_string());
        state.delay
    }
}

#[async_trait]
impl AiClient for FakeAiClient {
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError> {
        let prompt = request.prompt;
        if let Some(delay) = self.record(prompt_name, &prompt) {
            tokio::time::sleep(delay).await;
        }

        let outcome = {
            let state = self.lock();
            let prompt_lower = prompt.to_lowercase();
            state
                .responses
                .iter()
                .find(|(pattern, _)| prompt_lower.contains(pattern.as_str()))
                .map(|(_, outcome)| outcome.clone())
                .or_else(|| state.default_response.clone())
        };

        match outcome {
            Some(Scripted::Respond(content)) if content.trim().is_empty() => {
                Err(AiError::EmptyResponse)
            }
            Some(Scripted::Respond(content)) => Ok(ChatResponse {
                content,
                usage: Usage::default(),
            }),
            Some(Scripted::Fail(message)) => Err(AiError::Request(message)),
            None => Err(AiError::Request(format!(
                "FakeAiClient: No response configured for prompt (first 100 chars): {}",
                prompt.chars().take(100).collect::<String>()
            ))),
        }
    }

    async fn generate_image(
        &self,
        prompt_name: &str,
        request: ImageRequest,
    ) -> Result<Option<GeneratedImage>, AiError> {
        if let Some(delay) = self.record(prompt_name, &request.prompt) {
            tokio::time::sleep(delay).await;
        }

        let image = self.lock().image.clone();
        match image {
            Some(ScriptedImage::Url(url)) => Ok(Some(GeneratedImage {
                url,
                revised_prompt: None,
            })),
            Some(ScriptedImage::NoImage) | None => Ok(None),
            Some(ScriptedImage::Fail(message)) => Err(AiError::Request(message)),
        }
    }

    fn has_credential(&self) -> bool {
        self.has_credential
    }
}
