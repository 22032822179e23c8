use std::collections::BTreeSet;

use tracing::{debug, info};

use super::error::GenerationError;
use super::extract::extract_rows;
use super::prompts::build_prompt_with_sample;
use crate::config::{DEFAULT_DUPLICATE_SAMPLE_SIZE, DEFAULT_SEARCH_GROUNDING};
use crate::dataset::{BatchResult, GeneratorConfig, Row};
use crate::llm::{GroundedModel, GroundingMetadata, ModelRequest};

/// Text assumed when the model returns an empty or absent body.
const EMPTY_RESPONSE: &str = "[]";

/// Generates one batch of rows per call against a grounded model.
///
/// Each call is a single request: no retries, no partial salvage. A failure
/// leaves the caller's accumulated data alone because nothing is returned.
pub struct BatchGenerator<M: GroundedModel> {
    model: M,
    search_grounding: bool,
    duplicate_sample_size: usize,
}

impl<M: GroundedModel> BatchGenerator<M> {
    /// Creates a generator with grounding on and the default sample size.
    pub fn new(model: M) -> Self {
        Self {
            model,
            search_grounding: DEFAULT_SEARCH_GROUNDING,
            duplicate_sample_size: DEFAULT_DUPLICATE_SAMPLE_SIZE,
        }
    }

    /// Enables or disables the search-grounding tool on requests.
    pub fn with_search_grounding(mut self, enabled: bool) -> Self {
        self.search_grounding = enabled;
        self
    }

    /// Sets how many trailing rows are quoted back as duplicates to avoid.
    pub fn with_duplicate_sample_size(mut self, size: usize) -> Self {
        self.duplicate_sample_size = size;
        self
    }

    /// The underlying model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Requests `config.row_count` new rows, given the rows gathered so far.
    pub async fn generate_batch(
        &self,
        config: &GeneratorConfig,
        existing_rows: &[Row],
    ) -> Result<BatchResult, GenerationError> {
        // 1. Build prompt
        let prompt = build_prompt_with_sample(config, existing_rows, self.duplicate_sample_size);

        // 2. Call the model
        let request = ModelRequest {
            prompt,
            search_grounding: self.search_grounding,
        };
        let response = self.model.generate(&request).await.map_err(|e| {
            debug!(model = self.model.model_name(), error = %e, "generation request failed");
            GenerationError::from(e)
        })?;

        // 3. Parse rows
        let text = response
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(EMPTY_RESPONSE);
        let rows = extract_rows(text).map_err(|e| {
            debug!(error = %e, "could not read rows from response");
            e
        })?;

        // 4. Collect sources
        let sources = collect_sources(response.grounding.as_ref());

        info!(
            model = self.model.model_name(),
            rows = rows.len(),
            sources = sources.len(),
            "batch generated"
        );

        Ok(BatchResult::new(rows, sources))
    }
}

/// Deduplicated, non-empty web URIs from grounding metadata.
fn collect_sources(grounding: Option<&GroundingMetadata>) -> BTreeSet<String> {
    grounding
        .map(|g| g.web_uris().map(str::to_string).collect())
        .unwrap_or_default()
}
