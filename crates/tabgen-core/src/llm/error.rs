use thiserror::Error;

/// Errors that can occur while talking to the model collaborator.
#[derive(Debug, Error)]
pub enum LLMError {
    #[error("Missing API key. Set TABGEN_API_KEY or GEMINI_API_KEY.")]
    MissingApiKey,

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited. Try again later.")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        LLMError::Network(err.to_string())
    }
}
