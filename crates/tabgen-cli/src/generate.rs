//! The `generate` command: runs batches through the reducer and exports.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use color_eyre::eyre::{bail, eyre, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use tabgen_core::{
    export_file_name, render_preview, write_csv, Action, AppState, BatchGenerator, Column, Config,
    DatasetSpec, GeminiClient, GroundedModel, Row,
};

use crate::GenerateArgs;

#[derive(Serialize)]
struct JsonOutput<'a> {
    topic: &'a str,
    columns: &'a [Column],
    rows: &'a [Row],
    sources: &'a BTreeSet<String>,
}

pub async fn run(args: GenerateArgs, config: &Config) -> Result<()> {
    let state = initial_state(&args, config)?;
    if !state.can_generate() {
        bail!("A topic and at least one column are required (use --topic/--column or --schema)");
    }
    if state.row_count == 0 {
        bail!("--rows must be at least 1");
    }

    let mut llm_config = config.llm.clone();
    if let Some(model) = &args.model {
        llm_config.model = Some(model.clone());
    }
    let generator = BatchGenerator::new(GeminiClient::from_config(&llm_config)?)
        .with_search_grounding(llm_config.search_grounding)
        .with_duplicate_sample_size(config.generation.duplicate_sample_size);

    let batches = args.batches.unwrap_or(config.generation.default_batches).max(1);
    let state = run_batches(&generator, state, batches).await;

    if state.dataset.is_empty() {
        if let Some(message) = state.error() {
            bail!("{}", message);
        }
    }

    let columns = output_columns(&state);

    if args.json {
        let output = JsonOutput {
            topic: &state.topic,
            columns: &columns,
            rows: &state.dataset.rows,
            sources: &state.dataset.sources,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&state, &columns, config.generation.preview_rows);
        if !state.dataset.is_empty() {
            let path = output_path(&args, config, &state.topic);
            write_csv(&path, &columns, &state.dataset.rows)?;
            println!("\nWrote {} rows to {}", state.dataset.len(), path.display());
            if args.open {
                open::that(&path).map_err(|e| eyre!("Could not open {}: {}", path.display(), e))?;
            }
        }
    }

    if let Some(message) = state.error() {
        bail!("{}", message);
    }
    Ok(())
}

/// Builds the form state: schema file first, then command-line overrides.
/// With neither, the starter schema is used.
fn initial_state(args: &GenerateArgs, config: &Config) -> Result<AppState> {
    let default_rows = config.generation.default_row_count;

    let mut state = match &args.schema {
        Some(path) => AppState::from_spec(&DatasetSpec::from_file(path)?, default_rows),
        None if args.topic.is_none() && args.columns.is_empty() => AppState::default(),
        None => AppState::empty().reduce(Action::SetRowCount(default_rows)),
    };

    if let Some(topic) = &args.topic {
        state = state.reduce(Action::SetTopic(topic.clone()));
    }
    if !args.columns.is_empty() {
        let columns = args
            .columns
            .iter()
            .map(|spec| Column::parse(spec).ok_or_else(|| eyre!("Invalid column: {:?}", spec)))
            .collect::<Result<Vec<_>>>()?;
        state = state.reduce(Action::SetColumns(columns));
    }
    if let Some(rows) = args.rows {
        state = state.reduce(Action::SetRowCount(rows));
    }
    if let Some(context) = &args.context {
        state = state.reduce(Action::SetContext(context.clone()));
    }

    Ok(state)
}

/// Runs up to `batches` requests, folding each result into the state.
/// Stops at the first failure; rows gathered before it are kept.
async fn run_batches<M: GroundedModel>(
    generator: &BatchGenerator<M>,
    mut state: AppState,
    batches: u32,
) -> AppState {
    for batch in 1..=batches {
        state = state.reduce(Action::GenerationStarted);
        if !state.is_generating() {
            break;
        }

        let spinner = spinner(format!(
            "Generating batch {batch}/{batches} ({} rows requested)...",
            state.row_count
        ));
        let config = state.generator_config();
        let result = generator.generate_batch(&config, &state.dataset.rows).await;
        spinner.finish_and_clear();

        state = match result {
            Ok(result) => {
                info!(batch, rows = result.rows.len(), "batch added");
                state.reduce(Action::GenerationSucceeded(result))
            }
            Err(e) => {
                warn!(batch, error = %e, "batch failed; keeping rows generated so far");
                state.reduce(Action::GenerationFailed(e.to_string()))
            }
        };

        if state.error().is_some() {
            break;
        }
    }
    state
}

/// Columns shown and exported. Blank-named columns were never requested.
fn output_columns(state: &AppState) -> Vec<Column> {
    state.generator_config().columns
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn print_summary(state: &AppState, columns: &[Column], preview_rows: usize) {
    println!("{} ({} rows)\n", state.topic, state.dataset.len());
    print!(
        "{}",
        render_preview(columns, &state.dataset.rows, preview_rows)
    );

    if !state.dataset.sources.is_empty() {
        println!("\nSources:");
        for source in &state.dataset.sources {
            println!("  - {source}");
        }
    }
}

/// Explicit `--output`, else a topic-derived name in the configured output
/// directory. An existing file is never overwritten implicitly.
fn output_path(args: &GenerateArgs, config: &Config, topic: &str) -> PathBuf {
    if let Some(path) = &args.output {
        return path.clone();
    }

    let path = config.export.output_path(&export_file_name(topic));
    if !path.exists() {
        return path;
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "dataset".to_string());
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    path.with_file_name(format!("{stem}-{stamp}.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use tabgen_core::llm::{LLMError, ModelRequest, ModelResponse};
    use tempfile::TempDir;

    struct ScriptedModel {
        responses: Mutex<VecDeque<Result<ModelResponse, LLMError>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Result<ModelResponse, LLMError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl GroundedModel for ScriptedModel {
        async fn generate(&self, _request: &ModelRequest) -> Result<ModelResponse, LLMError> {
            *self.calls.lock().unwrap() += 1;
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ModelResponse::text("[]")))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn rivers_state() -> AppState {
        AppState::empty()
            .reduce(Action::SetTopic("Rivers".to_string()))
            .reduce(Action::AddColumn(Column::new("River")))
    }

    #[tokio::test]
    async fn test_run_batches_stops_after_failure_and_keeps_rows() {
        let generator = BatchGenerator::new(ScriptedModel::new(vec![
            Ok(ModelResponse::text(r#"[{"River":"Nile"}]"#).with_sources(["https://a.com"])),
            Err(LLMError::RateLimited),
            Ok(ModelResponse::text(r#"[{"River":"Congo"}]"#)),
        ]));

        let state = run_batches(&generator, rivers_state(), 3).await;

        assert_eq!(generator.model().calls(), 2);
        assert_eq!(state.dataset.len(), 1);
        assert_eq!(state.dataset.rows[0]["River"], json!("Nile"));
        assert!(state.dataset.sources.contains("https://a.com"));
        assert_eq!(state.error(), Some("Rate limited. Try again later."));
    }

    #[tokio::test]
    async fn test_run_batches_accumulates_in_order() {
        let generator = BatchGenerator::new(ScriptedModel::new(vec![
            Ok(ModelResponse::text(r#"[{"River":"Nile"}]"#)),
            Ok(ModelResponse::text(r#"[{"River":"Congo"}]"#)),
        ]));

        let state = run_batches(&generator, rivers_state(), 2).await;

        let names: Vec<_> = state.dataset.rows.iter().map(|r| r["River"].clone()).collect();
        assert_eq!(names, vec![json!("Nile"), json!("Congo")]);
        assert_eq!(state.error(), None);
        assert!(!state.is_generating());
    }

    #[tokio::test]
    async fn test_run_batches_refuses_incomplete_form() {
        let generator = BatchGenerator::new(ScriptedModel::new(Vec::new()));

        let state = run_batches(&generator, AppState::empty(), 2).await;

        assert_eq!(generator.model().calls(), 0);
        assert!(state.dataset.is_empty());
    }

    #[tokio::test]
    async fn test_blank_columns_left_out_of_export() {
        let generator = BatchGenerator::new(ScriptedModel::new(vec![Ok(ModelResponse::text(
            r#"[{"River":"Nile","":"stray"}]"#,
        ))]));
        let state = rivers_state().reduce(Action::AddColumn(Column::new("  ")));

        let state = run_batches(&generator, state, 1).await;
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rivers.csv");
        write_csv(&path, &output_columns(&state), &state.dataset.rows).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "River\nNile\n");
    }

    #[test]
    fn test_initial_state_defaults_to_starter() {
        let state = initial_state(&GenerateArgs::default(), &Config::default()).unwrap();
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn test_initial_state_flags_override_schema() {
        let temp_dir = TempDir::new().unwrap();
        let schema = temp_dir.path().join("lakes.toml");
        std::fs::write(
            &schema,
            "topic = \"Lakes\"\nrow_count = 4\ncontext = \"Europe only\"\n\n[[columns]]\nname = \"Lake\"\n",
        )
        .unwrap();

        let args = GenerateArgs {
            schema: Some(schema),
            topic: Some("Large lakes".to_string()),
            rows: Some(7),
            ..GenerateArgs::default()
        };
        let state = initial_state(&args, &Config::default()).unwrap();

        assert_eq!(state.topic, "Large lakes");
        assert_eq!(state.row_count, 7);
        assert_eq!(state.context, "Europe only");
        assert_eq!(state.generator_config().column_names(), vec!["Lake"]);

        let args = GenerateArgs {
            schema: args.schema.clone(),
            columns: vec!["Name".to_string(), "Depth:metres".to_string()],
            ..GenerateArgs::default()
        };
        let state = initial_state(&args, &Config::default()).unwrap();
        assert_eq!(state.topic, "Lakes");
        assert_eq!(state.row_count, 4);
        assert_eq!(state.generator_config().column_names(), vec!["Name", "Depth"]);
    }

    #[test]
    fn test_initial_state_inline_starts_empty() {
        let args = GenerateArgs {
            topic: Some("Moons".to_string()),
            ..GenerateArgs::default()
        };
        let state = initial_state(&args, &Config::default()).unwrap();

        assert_eq!(state.topic, "Moons");
        assert!(state.columns.is_empty());
        assert!(!state.can_generate());
    }

    #[test]
    fn test_output_path_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.export.output_dir = temp_dir.path().to_string_lossy().to_string();

        let first = output_path(&GenerateArgs::default(), &config, "Largest lakes");
        assert_eq!(first, temp_dir.path().join("largest-lakes.csv"));

        std::fs::write(&first, "Lake\n").unwrap();
        let second = output_path(&GenerateArgs::default(), &config, "Largest lakes");
        assert_ne!(second, first);
        assert!(!second.exists());
        assert_eq!(second.parent(), first.parent());
    }

    #[test]
    fn test_output_path_explicit() {
        let args = GenerateArgs {
            output: Some(PathBuf::from("mine.csv")),
            ..GenerateArgs::default()
        };
        assert_eq!(
            output_path(&args, &Config::default(), "Anything"),
            PathBuf::from("mine.csv")
        );
    }
}
