//! Recovers JSON from free-form model output.
//!
//! Strategies are tried in order and the first that yields valid JSON wins:
//!
//! 1. the whole text;
//! 2. the body of a fenced code block (optionally tagged `json`);
//! 3. the slice from the first `[` to the last `]`.
//!
//! The bracket slice can over-capture when the text holds several unrelated
//! arrays. That heuristic is kept as-is.

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::error::{GenerationError, ParseError};
use crate::dataset::Row;

type Strategy = fn(&str) -> Option<Value>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("direct", parse_direct),
    ("fenced", parse_fenced),
    ("bracket", parse_bracket_slice),
];

/// A fenced block with an optional `json` tag. Group 1 is the body.
const FENCE_PATTERN: &str = r"```(?:json)?\s*([\s\S]*?)\s*```";

fn parse_candidate(tier: &str, candidate: &str) -> Option<Value> {
    match serde_json::from_str(candidate) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(tier, error = %e, "candidate is not valid JSON");
            None
        }
    }
}

fn parse_direct(text: &str) -> Option<Value> {
    parse_candidate("direct", text)
}

fn parse_fenced(text: &str) -> Option<Value> {
    let re = match Regex::new(FENCE_PATTERN) {
        Ok(r) => r,
        Err(_) => return None,
    };

    let Some(captures) = re.captures(text) else {
        debug!(tier = "fenced", "no fenced block found");
        return None;
    };
    parse_candidate("fenced", captures.get(1)?.as_str())
}

fn parse_bracket_slice(text: &str) -> Option<Value> {
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => {
            parse_candidate("bracket", &text[start..=end])
        }
        _ => {
            debug!(tier = "bracket", "no bracketed span found");
            None
        }
    }
}

/// Parses the first JSON value any strategy can recover from `text`.
pub fn extract_json(text: &str) -> Result<Value, ParseError> {
    STRATEGIES
        .iter()
        .find_map(|(name, strategy)| {
            let value = strategy(text)?;
            debug!(tier = name, "recovered JSON from response");
            Some(value)
        })
        .ok_or(ParseError)
}

/// Converts a parsed value into rows.
///
/// The value must be an array, and every element must be an object.
pub fn rows_from_value(value: Value) -> Result<Vec<Row>, GenerationError> {
    let Value::Array(items) = value else {
        return Err(GenerationError::Shape(
            "Response was not a JSON array".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(row) => Ok(row),
            _ => Err(GenerationError::Shape(format!(
                "Response item {index} was not a JSON object"
            ))),
        })
        .collect()
}

/// Extracts rows from model text: [`extract_json`] then [`rows_from_value`].
pub fn extract_rows(text: &str) -> Result<Vec<Row>, GenerationError> {
    let value = extract_json(text)?;
    rows_from_value(value)
}
