mod accumulate;
mod export;
mod model;

pub use accumulate::{accumulate, Dataset};
pub use export::{display_value, export_file_name, render_preview, to_csv, write_csv, ExportError};
pub use model::{BatchResult, Column, DatasetSpec, GeneratorConfig, Row};
