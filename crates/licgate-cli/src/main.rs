mod cmd;
mod locate;
mod output;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, throttle::ThrottleSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "licgate",
    about = "Admit, delay, or reject batch jobs by software license availability",
    version,
    propagate_version = true
)]
struct Cli {
    /// Hook configuration file (default: nearest licgate.yaml, then /etc/licgate/config.yaml)
    #[arg(long, global = true, env = "LICGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log each alternative and license quote to stderr
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a pending job may start now
    Evaluate {
        /// Job descriptor (YAML or JSON)
        #[arg(long)]
        job: PathBuf,

        /// Snapshot of the scheduler's jobs (YAML or JSON list)
        #[arg(long)]
        running: Option<PathBuf>,
    },

    /// Parse a license requirement expression and show its alternatives
    Parse { expression: String },

    /// Query current availability of a single license feature
    Query {
        feature: String,

        /// License server address (e.g. 27000@lic01)
        #[arg(long, env = "SLBSLS_LICENSE_FILE")]
        server: String,
    },

    /// Validate the hook configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Inspect the license-check throttle
    Throttle {
        #[command(subcommand)]
        subcommand: ThrottleSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    // RUST_LOG, when set, replaces the default level entirely.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = locate::resolve_config(cli.config.as_deref());

    let result = match cli.command {
        Commands::Evaluate { job, running } => {
            cmd::evaluate::run(&config_path, &job, running.as_deref(), cli.json)
        }
        Commands::Parse { expression } => cmd::parse::run(&expression, cli.json),
        Commands::Query { feature, server } => {
            cmd::query::run(&config_path, &feature, &server, cli.json)
        }
        Commands::Config { subcommand } => cmd::config::run(&config_path, subcommand, cli.json),
        Commands::Throttle { subcommand } => {
            cmd::throttle::run(&config_path, subcommand, cli.json)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
