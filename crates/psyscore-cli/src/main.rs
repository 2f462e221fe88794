//! Command-line interface for scoring questionnaires.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "psyscore",
    version,
    about = "Score psychometric questionnaires and match archetypes"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score an answer set
    Score {
        /// Instrument id (see `psyscore list`)
        #[arg(long)]
        instrument: String,

        /// JSON file of {"question_id": value} pairs
        #[arg(long)]
        answers: PathBuf,

        /// Reference value for remapped scores (e.g. actual age)
        #[arg(long)]
        reference: Option<f64>,

        /// Archetype matches to show
        #[arg(long)]
        top_k: Option<usize>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Instrument catalog directory
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Classify a raw score against an instrument's ranges
    Classify {
        /// Instrument id
        #[arg(long)]
        instrument: String,

        /// Score to classify
        #[arg(long, allow_hyphen_values = true)]
        score: f64,

        /// Instrument catalog directory
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Validate instrument TOML files
    Validate {
        /// Instrument file or catalog directory
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// List instruments and formulas
    List {
        /// Instrument catalog directory
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Create a starter config and example instrument
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("psyscore=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Score {
            instrument,
            answers,
            reference,
            top_k,
            format,
            catalog,
        } => commands::score::execute(
            config, catalog, instrument, answers, reference, top_k, format,
        ),
        Commands::Classify {
            instrument,
            score,
            catalog,
        } => commands::classify::execute(config, catalog, instrument, score),
        Commands::Validate { catalog } => commands::validate::execute(config, catalog),
        Commands::List { catalog } => commands::list::execute(config, catalog),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
