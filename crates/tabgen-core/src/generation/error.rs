use thiserror::Error;

use crate::llm::LLMError;

/// No JSON value could be recovered from the model text by any strategy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not parse dataset from response")]
pub struct ParseError;

/// Errors that can occur while generating a batch.
///
/// Model and parse failures keep their original message.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Model(#[from] LLMError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The text parsed as JSON but not as a list of row objects.
    #[error("{0}")]
    Shape(String),
}
