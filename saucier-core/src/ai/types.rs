//! Generation request and response types.

use serde::{Deserialize, Serialize};

/// Request for a chat completion, sent as a single user message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatRequest {
    pub prompt: String,
    /// If true, request JSON response format.
    pub json_response: bool,
}

impl ChatRequest {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            json_response: false,
        }
    }

    /// Same prompt, asking the model for a JSON object.
    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            json_response: true,
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from a chat completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    /// The generated content. Never empty; empty completions are an error.
    pub content: String,
    pub usage: Usage,
}

/// Request for an image generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    /// Number of images to generate. The workflows always ask for one.
    pub count: u8,
}

impl ImageRequest {
    pub fn single(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            count: 1,
        }
    }
}

/// A generated image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    /// Prompt as rewritten by the image model, when the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

/// Which capability of the service a prompt is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Free-form text completion.
    Text,
    /// Text completion constrained to a JSON object.
    Json,
    /// A single image.
    Image,
}

/// Result of [`AiClient::generate`](super::AiClient::generate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Text(ChatResponse),
    /// `None` when the service returned no image entry.
    Image(Option<GeneratedImage>),
}

impl Generation {
    /// The completion text, for text and JSON modes.
    pub fn into_text(self) -> Option<String> {
        match self {
            Generation::Text(response) => Some(response.content),
            Generation::Image(_) => None,
        }
    }

    /// The image, for image mode.
    pub fn into_image(self) -> Option<GeneratedImage> {
        match self {
            Generation::Image(image) => image,
            Generation::Text(_) => None,
        }
    }
}
