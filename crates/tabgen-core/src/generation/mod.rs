mod error;
mod extract;
pub mod prompts;
mod runner;

pub use error::{GenerationError, ParseError};
pub use extract::{extract_json, extract_rows, rows_from_value};
pub use prompts::build_prompt;
pub use runner::BatchGenerator;
