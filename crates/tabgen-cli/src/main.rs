use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{bail, Result};
use tabgen_core::config::PROJECT_CONFIG_FILE;
use tabgen_core::Config;

mod generate;

#[derive(Parser)]
#[command(name = "tabgen")]
#[command(about = "Generate search-grounded tabular datasets with Gemini", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate rows for a dataset and export them
    Generate(GenerateArgs),
    /// Print the effective configuration as TOML
    Config,
    /// Write a default tabgen.toml in the current directory
    Init,
}

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Dataset description file (TOML or YAML)
    #[arg(short, long)]
    pub schema: Option<PathBuf>,

    /// What the dataset is about
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Column as NAME or NAME:DESCRIPTION (repeatable)
    #[arg(short, long = "column")]
    pub columns: Vec<String>,

    /// Rows requested per batch
    #[arg(short, long)]
    pub rows: Option<u32>,

    /// Extra instructions passed to the model
    #[arg(long)]
    pub context: Option<String>,

    /// Number of batches to run back to back
    #[arg(short, long)]
    pub batches: Option<u32>,

    /// CSV output path (defaults to a name derived from the topic)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print rows and sources as JSON instead of writing CSV
    #[arg(long)]
    pub json: bool,

    /// Open the exported file when done
    #[arg(long)]
    pub open: bool,

    /// Override the Gemini model
    #[arg(short, long)]
    pub model: Option<String>,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::prelude::*;

    let default_filter = if verbose {
        "tabgen=debug,tabgen_core=debug,tabgen_cli=debug,warn"
    } else {
        "tabgen=info,tabgen_core=info,tabgen_cli=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_filter(filter),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate(args) => {
            let config = Config::load()?;
            generate::run(args, &config).await
        }
        Commands::Config => {
            let config = Config::load()?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Commands::Init => init_config(Path::new(PROJECT_CONFIG_FILE)),
    }
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    std::fs::write(path, Config::default_config_string())?;
    println!("Wrote {}", path.display());
    Ok(())
}
