//! CSV export and terminal preview of a dataset.

use std::path::{Path, PathBuf};

use comfy_table::{presets::UTF8_FULL, Cell, Table};
use serde_json::Value;
use thiserror::Error;

use super::model::{Column, Row};
use crate::config::{DEFAULT_EXPORT_FILE, DEFAULT_FILE_NAME_WORDS, EMPTY_CELL_PLACEHOLDER};

/// Errors that can occur while exporting a dataset.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV output was not valid UTF-8")]
    Encoding,
}

impl ExportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Text written into a CSV field. Absent and null cells are empty.
fn csv_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Text shown in the terminal preview. Absent and null cells use the placeholder.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => EMPTY_CELL_PLACEHOLDER.to_string(),
        Some(Value::String(s)) if s.is_empty() => EMPTY_CELL_PLACEHOLDER.to_string(),
        Some(other) => csv_field(Some(other)),
    }
}

fn write_records<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    columns: &[Column],
    rows: &[Row],
) -> Result<(), ExportError> {
    writer.write_record(columns.iter().map(|c| c.name.as_str()))?;
    for row in rows {
        let record: Vec<String> = columns.iter().map(|c| csv_field(row.get(&c.name))).collect();
        writer.write_record(&record)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Renders rows as CSV text: a header of column names, then one record per
/// row in column order. Fields with commas, quotes or newlines are quoted and
/// embedded quotes doubled.
pub fn to_csv(columns: &[Column], rows: &[Row]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_records(&mut writer, columns, rows)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    String::from_utf8(bytes).map_err(|_| ExportError::Encoding)
}

/// Writes the CSV rendering of `rows` to `path`.
pub fn write_csv(path: impl AsRef<Path>, columns: &[Column], rows: &[Row]) -> Result<(), ExportError> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut writer = csv::Writer::from_writer(std::io::BufWriter::new(file));
    write_records(&mut writer, columns, rows)
}

/// Derives an export file name from the topic.
///
/// Takes the first few words and converts to kebab-case.
pub fn export_file_name(topic: &str) -> String {
    let slug = topic
        .split_whitespace()
        .take(DEFAULT_FILE_NAME_WORDS)
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        DEFAULT_EXPORT_FILE.to_string()
    } else {
        format!("{slug}.csv")
    }
}

/// Renders up to `max_rows` rows as a terminal table, followed by a count of
/// the rows left out.
pub fn render_preview(columns: &[Column], rows: &[Row], max_rows: usize) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(columns.iter().map(|c| Cell::new(&c.name)));

    for row in rows.iter().take(max_rows) {
        table.add_row(
            columns
                .iter()
                .map(|c| Cell::new(display_value(row.get(&c.name)))),
        );
    }

    let mut out = table.to_string();
    out.push('\n');
    if rows.len() > max_rows {
        out.push_str(&format!("... {} more rows\n", rows.len() - max_rows));
    }
    out
}
