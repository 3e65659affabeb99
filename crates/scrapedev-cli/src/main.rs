//! scrapedev: entry point.

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use scrapedev_cli::cli::collect_cmd::CollectArgs;
use scrapedev_cli::cli::output::{print_error, Output};
use scrapedev_cli::cli::{collect_cmd, doctor, report_cmd};
use scrapedev_cli::logging;

#[derive(Parser)]
#[command(
    name = "scrapedev",
    about = "Collect reviews, products and testimonials from web-scraping.dev",
    version
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
struct ConfigFlags {
    /// JSON config file (defaults to $SCRAPEDEV_CONFIG or ./scrapedev.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target site root
    #[arg(long)]
    base_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Chromium binary to launch
    #[arg(long)]
    chromium: Option<PathBuf>,

    /// Abort the run on the first card that fails to extract
    #[arg(long)]
    strict: bool,
}

impl ConfigFlags {
    fn into_args(self, output: PathBuf) -> CollectArgs {
        CollectArgs {
            output,
            config: self.config,
            base_url: self.base_url,
            headful: self.headful,
            chromium: self.chromium,
            strict: self.strict,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Collect all three record kinds and write them to a JSON file
    Collect {
        /// Where to write the dataset
        #[arg(long, short, default_value = "combined_data.json")]
        output: PathBuf,

        #[command(flatten)]
        flags: ConfigFlags,
    },
    /// Summarize a dataset written by `collect`
    Report {
        /// Dataset to read
        #[arg(long, short, default_value = "combined_data.json")]
        input: PathBuf,
        /// Calendar year for the monthly review histogram
        #[arg(long, default_value_t = 2023)]
        year: i32,
        /// List the reviews of one month (e.g. "May", "5")
        #[arg(long)]
        month: Option<String>,
    },
    /// Check environment and configuration
    Doctor {
        #[command(flatten)]
        flags: ConfigFlags,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_json);

    let output = Output {
        json: cli.json,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Collect {
            output: path,
            flags,
        } => collect_cmd::run(flags.into_args(path), output).await,
        Commands::Report { input, year, month } => {
            report_cmd::run(&input, year, month.as_deref(), output).await
        }
        Commands::Doctor { flags } => doctor::run(&flags.into_args(PathBuf::new())).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "scrapedev", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        tracing::debug!("command failed: {e:?}");
        print_error(output, e);
        std::process::exit(1);
    }

    result
}
