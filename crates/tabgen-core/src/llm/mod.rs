mod error;
mod gemini;

pub use error::LLMError;
pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single request to a search-grounded model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    /// The full prompt text.
    pub prompt: String,
    /// Declare the web-search grounding tool on the request.
    pub search_grounding: bool,
}

impl ModelRequest {
    /// Creates a grounded request for the given prompt.
    pub fn grounded(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            search_grounding: true,
        }
    }
}

/// What the model returned: free-form text plus optional citation metadata.
#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    /// Response text. `None` when the model produced no text part.
    pub text: Option<String>,
    /// Web sources the model reports having used.
    pub grounding: Option<GroundingMetadata>,
}

impl ModelResponse {
    /// A text-only response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            grounding: None,
        }
    }

    /// Attaches grounding chunks built from the given URIs.
    pub fn with_sources<I, S>(mut self, uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chunks = uris
            .into_iter()
            .map(|uri| GroundingChunk {
                web: Some(WebSource {
                    uri: Some(uri.into()),
                    title: None,
                }),
            })
            .collect();
        self.grounding = Some(GroundingMetadata {
            grounding_chunks: chunks,
        });
        self
    }
}

/// Citation metadata attached to a grounded response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

impl GroundingMetadata {
    /// Every non-empty web URI, in the order reported.
    pub fn web_uris(&self) -> impl Iterator<Item = &str> {
        self.grounding_chunks
            .iter()
            .filter_map(|chunk| chunk.web.as_ref())
            .filter_map(|web| web.uri.as_deref())
            .filter(|uri| !uri.trim().is_empty())
    }
}

/// One cited source. Only web chunks carry a URI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Trait for generative models that can ground answers in web search.
///
/// The batch generator depends only on this seam; transport, authentication
/// and retry policy belong to the implementation.
///
/// # Example
///
/// ```ignore
/// use tabgen_core::llm::{GeminiClient, GroundedModel, ModelRequest};
///
/// let model = GeminiClient::from_env()?;
/// let response = model.generate(&ModelRequest::grounded("List three rivers")).await?;
/// ```
#[async_trait]
pub trait GroundedModel: Send + Sync {
    /// Issue one request and return the raw response.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, LLMError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Blanket implementation for boxed trait objects.
#[async_trait]
impl GroundedModel for Box<dyn GroundedModel> {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, LLMError> {
        (**self).generate(request).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
