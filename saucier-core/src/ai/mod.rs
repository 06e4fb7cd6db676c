//! Generation client module for an OpenAI-compatible API.
//!
//! This module provides:
//! - `AiClient` trait for abstracting the text and image generation service
//! - `OpenAiClient` implementation using async-openai, with optional rate limiting
//! - `FakeAiClient` for deterministic tests
//! - Configuration via environment variables
//! - Prompt templates for recipes, recipe photos and wine pairings
//!
//! # Configuration
//!
//! Set these environment variables:
//!
//! - `OPENAI_API_KEY`: Your API key. Missing keys are reported when a request
//!   needs one, not at startup.
//! - `SAUCIER_AI_BASE_URL` (optional): API base URL
//! - `SAUCIER_CHAT_MODEL` (optional): Text model, e.g. "gpt-4o-mini"
//! - `SAUCIER_IMAGE_MODEL` (optional): Image model, e.g. "dall-e-3"
//! - `SAUCIER_IMAGE_SIZE` (optional): Image resolution, e.g. "1024x1024"
//! - `SAUCIER_AI_RATE_LIMIT_MS` (optional): Delay between requests in ms
//! - `SAUCIER_AI_TIMEOUT_SECS` (optional): Per-request timeout
//!
//! # Example
//!
//! ```ignore
//! use saucier_core::ai::{AiClient, ChatRequest, OpenAiClient};
//!
//! let client = OpenAiClient::from_env()?;
//! let response = client
//!     .complete("greeting", ChatRequest::from_prompt("Hello!"))
//!     .await?;
//! println!("Response: {}", response.content);
//! ```

mod client;
mod config;
mod fake;
pub mod prompts;
mod types;

pub use client::{AiClient, AiError, OpenAiClient};
pub use config::{AiConfig, ConfigError};
pub use fake::FakeAiClient;
pub use types::{
    ChatRequest, ChatResponse, GeneratedImage, Generation, GenerationMode, ImageRequest, Usage,
};
