mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::underwriting::{ScoreArgs, Stage, UnderwritingArgs};

/// Credit underwriting from financial parameters and projections
#[derive(Parser)]
#[command(
    name = "finsight",
    version,
    about = "Credit underwriting from financial parameters and projections",
    long_about = "Computes the debt picture, coverage ratios (DSCR, ICR, leverage), covenant \
                  sanity checks, underwriting rationale, covenant conditions and a composite \
                  credit score from a deal's parameters and multi-year projection."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Underwriting thresholds file (YAML or JSON)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log pipeline stages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full underwriting assessment
    Assess(UnderwritingArgs),
    /// Resolve the debt picture and blended rate
    Debt(UnderwritingArgs),
    /// Extract DSCR / ICR / leverage statistics from the projection
    CreditStats(UnderwritingArgs),
    /// Run covenant sanity checks
    SanityCheck(UnderwritingArgs),
    /// Build rationale bullets and covenant conditions
    Rationale(UnderwritingArgs),
    /// Score credit statistics directly
    Score(ScoreArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Assess(args) => commands::underwriting::run(args, config, Stage::Assess),
        Commands::Debt(args) => commands::underwriting::run(args, config, Stage::Debt),
        Commands::CreditStats(args) => commands::underwriting::run(args, config, Stage::CreditStats),
        Commands::SanityCheck(args) => commands::underwriting::run(args, config, Stage::SanityCheck),
        Commands::Rationale(args) => commands::underwriting::run(args, config, Stage::Rationale),
        Commands::Score(args) => commands::underwriting::run_score(args, config),
        Commands::Version => {
            println!("finsight {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

/// Logs go to stderr so stdout stays parseable. `RUST_LOG` applies unless
/// `--verbose` is set.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
