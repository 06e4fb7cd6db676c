//! Generation client for an OpenAI-compatible API.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateImageRequest,
        CreateImageRequestArgs, Image, ImageModel, ImageSize, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::config::{AiConfig, ConfigError};
use super::types::{
    ChatRequest, ChatResponse, GeneratedImage, Generation, GenerationMode, ImageRequest, Usage,
};

#[derive(Error, Debug)]
pub enum AiError {
    #[error("API error: {0}")]
    Api(String),

    #[error("API request failed: {0}")]
    Request(String),

    #[error("API response carried no content")]
    EmptyResponse,

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Trait for generation clients.
///
/// Text completions and image generations are the two modes of the remote
/// service. Neither retries internally.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Complete a chat request and return the model's text.
    ///
    /// The `prompt_name` identifies the request in logs. An empty completion is
    /// reported as [`AiError::EmptyResponse`].
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError>;

    /// Generate an image. `Ok(None)` means the service returned no image entry.
    async fn generate_image(
        &self,
        prompt_name: &str,
        request: ImageRequest,
    ) -> Result<Option<GeneratedImage>, AiError>;

    /// Whether the client has a credential to call the service with.
    fn has_credential(&self) -> bool;

    /// Send a prompt in the given mode.
    async fn generate(
        &self,
        prompt_name: &str,
        prompt: &str,
        mode: GenerationMode,
    ) -> Result<Generation, AiError> {
        match mode {
            GenerationMode::Text => self
                .complete(prompt_name, ChatRequest::from_prompt(prompt))
                .await
                .map(Generation::Text),
            GenerationMode::Json => self
                .complete(prompt_name, ChatRequest::json(prompt))
                .await
                .map(Generation::Text),
            GenerationMode::Image => self
                .generate_image(prompt_name, ImageRequest::single(prompt))
                .await
                .map(Generation::Image),
        }
    }
}

/// Client for the OpenAI chat completion and image generation endpoints.
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    config: AiConfig,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.config.base_url)
            .field("chat_model", &self.config.chat_model)
            .field("image_model", &self.config.image_model)
            .field("has_credential", &self.config.has_credential())
            .finish()
    }
}

impl OpenAiClient {
    /// Create a new client from environment configuration.
    pub fn from_env() -> Result<Self, AiError> {
        Self::new(AiConfig::from_env())
    }

    /// Create a new client with the given configuration.
    pub fn new(config: AiConfig) -> Result<Self, AiError> {
        let mut http = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            http = http.timeout(timeout);
        }
        let http = http
            .build()
            .map_err(|e| AiError::Request(format!("Failed to build HTTP client: {}", e)))?;

        if !config.has_credential() {
            tracing::warn!("No API key configured; generation requests will fail");
        }

        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key.clone().unwrap_or_default())
            .with_api_base(&config.base_url);

        let client = Client::with_config(openai_config).with_http_client(http);

        Ok(Self {
            client,
            config,
            last_request: Arc::new(Mutex::new(None)),
        })
    }

    /// Apply rate limiting between requests.
    async fn rate_limit(&self) {
        if self.config.rate_limit_ms == 0 {
            return;
        }

        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            let min_interval = Duration::from_millis(self.config.rate_limit_ms);

            if elapsed < min_interval {
                tokio::time::sleep(min_interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[async_trait]
impl AiClient for OpenAiClient {
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError> {
        self.config.require_api_key()?;

        let openai_request = chat_completion_request(&self.config.chat_model, &request)?;

        self.rate_limit().await;

        tracing::debug!(
            prompt_name = prompt_name,
            model = %self.config.chat_model,
            "Calling chat completion API"
        );

        let response = self
            .client
            .chat()
            .create(openai_request)
            .await
            .map_err(map_openai_error)?;

        let content = non_empty_content(
            response
                .choices
                .first()
                .and_then(|c| c.message.content.clone()),
        )?;

        let usage = response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        tracing::debug!(
            prompt_name = prompt_name,
            total_tokens = usage.total_tokens,
            "Chat completion received"
        );

        Ok(ChatResponse { content, usage })
    }

    async fn generate_image(
        &self,
        prompt_name: &str,
        request: ImageRequest,
    ) -> Result<Option<GeneratedImage>, AiError> {
        self.config.require_api_key()?;

        let openai_request = image_request(&self.config, &request)?;

        self.rate_limit().await;

        tracing::debug!(
            prompt_name = prompt_name,
            model = %self.config.image_model,
            size = %self.config.image_size,
            "Calling image generation API"
        );

        let response = self
            .client
            .images()
            .create(openai_request)
            .await
            .map_err(map_openai_error)?;

        let image = first_image(&response.data);
        if image.is_none() {
            tracing::info!(prompt_name = prompt_name, "No image URL in the response");
        }

        Ok(image)
    }

    fn has_credential(&self) -> bool {
        self.config.has_credential()
    }
}

/// Build a single-user-message chat request.
fn chat_completion_request(
    model: &str,
    request: &ChatRequest,
) -> Result<CreateChatCompletionRequest, AiError> {
    let message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
        .content(request.prompt.clone())
        .build()
        .map_err(|e| AiError::Request(format!("Failed to build user message: {}", e)))?
        .into();

    let mut builder = CreateChatCompletionRequestArgs::default();
    builder.model(model).messages(vec![message]);

    if request.json_response {
        builder.response_format(ResponseFormat::JsonObject);
    }

    builder.build().map_err(|e| AiError::Request(e.to_string()))
}

fn image_request(config: &AiConfig, request: &ImageRequest) -> Result<CreateImageRequest, AiError> {
    CreateImageRequestArgs::default()
        .prompt(request.prompt.clone())
        .model(image_model(&config.image_model))
        .n(request.count)
        .size(image_size(&config.image_size)?)
        .build()
        .map_err(|e| AiError::Request(e.to_string()))
}

fn image_model(name: &str) -> ImageModel {
    match name {
        "dall-e-2" => ImageModel::DallE2,
        "dall-e-3" => ImageModel::DallE3,
        other => ImageModel::Other(other.to_string()),
    }
}

fn image_size(size: &str) -> Result<ImageSize, ConfigError> {
    match size {
        "256x256" => Ok(ImageSize::S256x256),
        "512x512" => Ok(ImageSize::S512x512),
        "1024x1024" => Ok(ImageSize::S1024x1024),
        "1792x1024" => Ok(ImageSize::S1792x1024),
        "1024x1792" => Ok(ImageSize::S1024x1792),
        other => Err(ConfigError::InvalidValue {
            name: "SAUCIER_IMAGE_SIZE".to_string(),
            value: other.to_string(),
        }),
    }
}

fn non_empty_content(content: Option<String>) -> Result<String, AiError> {
    content
        .filter(|c| !c.trim().is_empty())
        .ok_or(AiError::EmptyResponse)
}

/// The first entry, if it carries a URL. Base64 payloads are not requested.
fn first_image(data: &[Arc<Image>]) -> Option<GeneratedImage> {
    match data.first()?.as_ref() {
        Image::Url {
            url,
            revised_prompt,
        } if !url.is_empty() => Some(GeneratedImage {
            url: url.clone(),
            revised_prompt: revised_prompt.clone(),
        }),
        _ => None,
    }
}

fn map_openai_error(err: OpenAIError) -> AiError {
    match err {
        OpenAIError::ApiError(api) => AiError::Api(api.message),
        OpenAIError::JSONDeserialize { .. } => AiError::ParseError(err.to_string()),
        other => AiError::Request(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::error::ApiError;
    use serde_json::json;

    #[test]
    fn test_chat_request_shape() {
        let request =
            chat_completion_request("gpt-3.5-turbo", &ChatRequest::json("Generate a recipe"))
                .unwrap();
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "gpt-3.5-turbo");
        assert_eq!(value["messages"].as_array().unwrap().len(), 1);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "Generate a recipe");
        assert_eq!(value["response_format"], json!({"type": "json_object"}));
    }

    #[test]
    fn test_plain_chat_request_has_no_response_format() {
        let request =
            chat_completion_request("gpt-3.5-turbo", &ChatRequest::from_prompt("hi")).unwrap();
        let value = serde_json::to_value(&request).unwrap();

        assert!(value["response_format"].is_null());
    }

    #[test]
    fn test_image_request_shape() {
        let request = image_request(&AiConfig::default(), &ImageRequest::single("A plated dish"))
            .unwrap();
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["prompt"], "A plated dish");
        assert_eq!(value["model"], "dall-e-3");
        assert_eq!(value["n"], 1);
        assert_eq!(value["size"], "1024x1024");
    }

    #[test]
    fn test_unsupported_image_size_is_config_error() {
        let config = AiConfig::default().with_image_size("640x480");
        let err = image_request(&config, &ImageRequest::single("A plated dish")).unwrap_err();

        assert!(matches!(
            err,
            AiError::Config(ConfigError::InvalidValue { value, .. }) if value == "640x480"
        ));
    }

    #[test]
    fn test_empty_content_is_error() {
        assert!(matches!(
            non_empty_content(Some("  \n".to_string())),
            Err(AiError::EmptyResponse)
        ));
        assert!(matches!(non_empty_content(None), Err(AiError::EmptyResponse)));
        assert_eq!(
            non_empty_content(Some("{\"a\":1}".to_string())).unwrap(),
            "{\"a\":1}"
        );
    }

    #[test]
    fn test_first_image_url() {
        let data = vec![
            Arc::new(Image::Url {
                url: "https://images.example/1.png".to_string(),
                revised_prompt: Some("a dish".to_string()),
            }),
            Arc::new(Image::Url {
                url: "https://images.example/2.png".to_string(),
                revised_prompt: None,
            }),
        ];

        let image = first_image(&data).unwrap();
        assert_eq!(image.url, "https://images.example/1.png");
        assert_eq!(image.revised_prompt.as_deref(), Some("a dish"));
    }

    #[test]
    fn test_no_usable_image() {
        assert_eq!(first_image(&[]), None);

        let blank = vec![Arc::new(Image::Url {
            url: String::new(),
            revised_prompt: None,
        })];
        assert_eq!(first_image(&blank), None);

        let encoded = vec![Arc::new(Image::B64Json {
            b64_json: Arc::new("aGVsbG8=".to_string()),
            revised_prompt: None,
        })];
        assert_eq!(first_image(&encoded), None);
    }

    #[test]
    fn test_api_error_uses_provider_message() {
        let api: ApiError = serde_json::from_value(json!({
            "message": "Incorrect API key provided",
            "type": "invalid_request_error"
        }))
        .unwrap();

        match map_openai_error(OpenAIError::ApiError(api)) {
            AiError::Api(message) => assert_eq!(message, "Incorrect API key provided"),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = map_openai_error(OpenAIError::InvalidArgument("bad".to_string()));
        assert!(matches!(err, AiError::Request(_)));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_network() {
        // Port 9 (discard) would fail to connect; the credential check must win.
        let config = AiConfig::default().with_base_url("http://127.0.0.1:9");
        let client = OpenAiClient::new(config).unwrap();

        assert!(!client.has_credential());
        let err = client
            .complete("recipe", ChatRequest::from_prompt("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Config(ConfigError::MissingEnvVar(_))));

        let err = client
            .generate_image("recipe_image", ImageRequest::single("a dish"))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Config(ConfigError::MissingEnvVar(_))));
    }
}
