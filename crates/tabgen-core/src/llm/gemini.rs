use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GroundedModel, GroundingMetadata, LLMError, ModelRequest, ModelResponse};
use crate::config::{LLMConfig, DEFAULT_GEMINI_MODEL, DEFAULT_GEMINI_URL};

/// Gemini (Generative Language API) client.
///
/// Sends plain-text prompts to `models/{model}:generateContent`. When
/// grounding is requested the Google Search tool is declared; response
/// schemas are never requested because structured output cannot be combined
/// with the search tool.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

impl GeminiClient {
    /// Creates a new client with the given API key and default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            client: Client::new(),
        }
    }

    /// Creates a client from `LLMConfig`, resolving the key from the environment
    /// if the config does not carry one.
    pub fn from_config(config: &LLMConfig) -> Result<Self, LLMError> {
        let key = config.api_key_or_env().ok_or(LLMError::MissingApiKey)?;
        Ok(Self::new(key)
            .with_model(config.model_or_default())
            .with_base_url(config.base_url_or_default()))
    }

    /// Creates a client from environment variables only.
    pub fn from_env() -> Result<Self, LLMError> {
        Self::from_config(&LLMConfig::default())
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API base URL (for proxies or test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn send_request(&self, request: &GenerateContentRequest) -> Result<ModelResponse, LLMError> {
        let url = self.endpoint();
        debug!(model = %self.model, %url, "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();

        if status == 429 {
            return Err(LLMError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LLMError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        Ok(body.into_model_response())
    }
}

#[async_trait]
impl GroundedModel for GeminiClient {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, LLMError> {
        let body = GenerateContentRequest::from_model_request(request);
        self.send_request(&body).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

impl GenerateContentRequest {
    fn from_model_request(request: &ModelRequest) -> Self {
        let tools = if request.search_grounding {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt.clone()),
                }],
            }],
            tools,
        }
    }
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

impl GenerateContentResponse {
    fn into_model_response(self) -> ModelResponse {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return ModelResponse::default();
        };

        // Text parts are concatenated; non-text parts are skipped.
        let text = candidate.content.and_then(|content| {
            let texts: Vec<String> = content.parts.into_iter().filter_map(|p| p.text).collect();
            if texts.is_empty() {
                None
            } else {
                Some(texts.concat())
            }
        });

        ModelResponse {
            text,
            grounding: candidate.grounding_metadata,
        }
    }
}
