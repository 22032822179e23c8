//! Default values for tabgen configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// LLM Defaults
// ============================================================================

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Search grounding is on unless explicitly disabled.
pub const DEFAULT_SEARCH_GROUNDING: bool = true;

// ============================================================================
// Generation Defaults
// ============================================================================

/// Rows requested per batch when neither the schema nor the CLI sets it.
pub const DEFAULT_ROW_COUNT: u32 = 10;

/// Number of batches run by a single `generate` invocation.
pub const DEFAULT_BATCHES: u32 = 1;

/// How many trailing rows are quoted back to the model to discourage duplicates.
pub const DEFAULT_DUPLICATE_SAMPLE_SIZE: usize = 5;

/// Rows shown in the terminal preview.
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

// ============================================================================
// Export Defaults
// ============================================================================

/// Directory CSV files are written to when no explicit path is given.
pub const DEFAULT_OUTPUT_DIR: &str = ".";

/// File name used when the topic yields no usable slug.
pub const DEFAULT_EXPORT_FILE: &str = "dataset.csv";

/// Word limit for deriving an export file name from the topic.
pub const DEFAULT_FILE_NAME_WORDS: usize = 5;

/// Placeholder shown for absent or null cells.
pub const EMPTY_CELL_PLACEHOLDER: &str = "-";

// ============================================================================
// Starter Schema
// ============================================================================

/// Topic pre-filled into a fresh session.
pub const STARTER_TOPIC: &str = "Top Tech Companies 2024";

/// Columns pre-filled into a fresh session as `(name, description)`.
pub const STARTER_COLUMNS: &[(&str, &str)] = &[
    ("Company", "Legal or trading name"),
    ("Revenue", "Annual revenue in USD"),
    ("CEO", "Current chief executive"),
];
