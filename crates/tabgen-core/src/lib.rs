pub mod config;
pub mod dataset;
pub mod generation;
pub mod llm;
pub mod state;

pub use config::{Config, ConfigError, ExportConfig, GenerationConfig, LLMConfig};
pub use dataset::{
    accumulate, export_file_name, render_preview, to_csv, write_csv, BatchResult, Column, Dataset,
    DatasetSpec, ExportError, GeneratorConfig, Row,
};
pub use generation::{build_prompt, BatchGenerator, GenerationError, ParseError};
pub use llm::{GeminiClient, GroundedModel, LLMError, ModelRequest, ModelResponse};
pub use state::{Action, AppState, Status};
