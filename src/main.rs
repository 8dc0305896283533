mod commands;

use clap::{ArgAction, Parser, Subcommand};
use docqa_core::Settings;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "docqa.toml";

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Ask questions of a reference document", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Settings file (defaults to docqa.toml in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and chunk a document without indexing it
    Chunk {
        /// Plain-text document
        input: PathBuf,

        /// Print the chunks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build and save a vector index for a document
    Build {
        /// Plain-text document
        input: PathBuf,

        /// Where to save the index (defaults to <data-dir>/index)
        #[arg(long)]
        index_dir: Option<PathBuf>,

        /// Used when the index directory cannot be written
        #[arg(long)]
        fallback_dir: Option<PathBuf>,
    },

    /// Retrieve the chunks most relevant to a question
    Search {
        /// Question text
        query: String,

        /// Maximum number of results
        #[arg(long)]
        top_k: Option<usize>,

        /// Minimum cosine similarity
        #[arg(long, allow_negative_numbers = true)]
        min_score: Option<f32>,

        /// Index to search (defaults to <data-dir>/index)
        #[arg(long)]
        index_dir: Option<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show index statistics
    Stats {
        /// Index to inspect (defaults to <data-dir>/index)
        #[arg(long)]
        index_dir: Option<PathBuf>,
    },
}

fn get_data_dir(cli_path: Option<PathBuf>) -> PathBuf {
    cli_path.unwrap_or_else(|| {
        dirs::data_dir()
            .map(|p| p.join("docqa"))
            .unwrap_or_else(|| PathBuf::from(".docqa"))
    })
}

fn load_settings(config: Option<&Path>, data_dir: &Path) -> anyhow::Result<Settings> {
    let default_path = data_dir.join(CONFIG_FILE);
    let path = match config {
        Some(path) => Some(path),
        None if default_path.is_file() => Some(default_path.as_path()),
        None => None,
    };
    Ok(Settings::load_or_default(path)?)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let data_dir = get_data_dir(cli.data_dir);

    // Ensure data directory exists
    std::fs::create_dir_all(&data_dir)?;

    let settings = load_settings(cli.config.as_deref(), &data_dir)?;
    let default_index = data_dir.join("index");

    match cli.command {
        Commands::Chunk { input, json } => {
            commands::chunk::run(&input, json, &settings)?;
        }
        Commands::Build {
            input,
            index_dir,
            fallback_dir,
        } => {
            let index_dir = index_dir.unwrap_or(default_index);
            let fallback_dir = fallback_dir.unwrap_or_else(|| data_dir.join("index_fallback"));
            commands::build::run(&input, &index_dir, &fallback_dir, &settings)?;
        }
        Commands::Search {
            query,
            top_k,
            min_score,
            index_dir,
            json,
        } => {
            let top_k = top_k.unwrap_or(settings.retrieval.top_k);
            let min_score = min_score.unwrap_or(settings.retrieval.min_score);
            let index_dir = index_dir.unwrap_or(default_index);
            commands::search::run(&query, top_k, min_score, json, &index_dir, &settings)?;
        }
        Commands::Stats { index_dir } => {
            commands::stats::run(&index_dir.unwrap_or(default_index))?;
        }
    }

    Ok(())
}
