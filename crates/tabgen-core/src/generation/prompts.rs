use serde_json::Value;

use crate::config::DEFAULT_DUPLICATE_SAMPLE_SIZE;
use crate::dataset::{GeneratorConfig, Row};

/// Builds the generation prompt with the default duplicate-sample size.
pub fn build_prompt(config: &GeneratorConfig, existing_rows: &[Row]) -> String {
    build_prompt_with_sample(config, existing_rows, DEFAULT_DUPLICATE_SAMPLE_SIZE)
}

/// Builds the generation prompt.
///
/// When rows already exist, the first column's value from the last
/// `sample_size` rows is quoted back as a hint to avoid repeats. This only
/// discourages duplicates; nothing downstream removes them.
pub fn build_prompt_with_sample(
    config: &GeneratorConfig,
    existing_rows: &[Row],
    sample_size: usize,
) -> String {
    let mut prompt = format!(
        "Generate a dataset about \"{topic}\".\n",
        topic = config.topic
    );

    if let Some(context) = &config.context {
        prompt.push_str(&format!("Context: {context}\n"));
    }

    // Each name appears once; a description rides along in parentheses.
    let columns = config
        .columns
        .iter()
        .map(|c| match c.description.as_deref() {
            Some(description) => format!("{} ({description})", c.name),
            None => c.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    prompt.push_str(&format!("\nRequired columns: {columns}\n"));

    prompt.push_str(
        "\nUse Google Search to find real-time, accurate information. \
         Every value must be grounded in verifiable facts.\n",
    );
    prompt.push_str(&format!(
        "Generate exactly {count} NEW rows.\n",
        count = config.row_count
    ));

    if let Some(sample) = duplicate_sample(config, existing_rows, sample_size) {
        prompt.push_str(&format!(
            "Do not repeat these existing entries: {sample}\n"
        ));
    }

    prompt.push_str(
        "\nOutput format: respond with a raw JSON array of objects only. \
         Each object's keys must match the column names exactly. \
         Do not wrap the JSON in markdown code fences and add no commentary.",
    );

    prompt
}

/// JSON-encoded first-column values of the last `sample_size` rows.
fn duplicate_sample(
    config: &GeneratorConfig,
    existing_rows: &[Row],
    sample_size: usize,
) -> Option<String> {
    if existing_rows.is_empty() || sample_size == 0 {
        return None;
    }

    let key = config.columns.first().map(|c| c.name.as_str());
    let start = existing_rows.len().saturating_sub(sample_size);
    let sample: Vec<Value> = existing_rows[start..]
        .iter()
        .map(|row| {
            key.and_then(|k| row.get(k))
                .cloned()
                .unwrap_or(Value::Null)
        })
        .collect();

    serde_json::to_string(&sample).ok()
}
