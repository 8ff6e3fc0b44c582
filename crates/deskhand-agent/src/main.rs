mod channel;
mod cmd;
mod context;
mod output;
mod screenshot;
mod worker;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use cmd::exec::BackendKind;
use deskhand_core::config::DEFAULT_CONFIG_FILE;
use deskhand_core::Key;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "deskhand",
    about = "Desktop agent: replays input actions and captures screenshots for a remote coordinator",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (YAML or JSON)
    #[arg(long, global = true, env = "DESKHAND_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the coordinator and serve requests until interrupted
    Run {
        /// Coordinator URL (overrides server_url)
        #[arg(long, env = "DESKHAND_SERVER")]
        server: Option<String>,

        /// Identity announced after each connect (overrides agent_id)
        #[arg(long, env = "DESKHAND_AGENT_ID")]
        agent_id: Option<String>,
    },

    /// Execute a JSON action batch on this machine
    Exec {
        /// Batch file: an action array or an execute_actions payload ('-' for stdin)
        file: PathBuf,

        /// Input backend (overrides input.type)
        #[arg(long, value_enum)]
        backend: Option<BackendKind>,
    },

    /// Capture the screen once and write it as PNG
    Screenshot {
        /// Output file
        #[arg(long, short = 'o')]
        out: PathBuf,
    },

    /// List the key names accepted by key and key_combination actions
    Keys {
        /// Key names to resolve instead of listing them all
        names: Vec<Key>,
    },

    /// Validate or print the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run { server, agent_id } => cmd::run::run(&cli.config, server, agent_id),
        Commands::Exec { file, backend } => cmd::exec::run(&cli.config, &file, backend, cli.json),
        Commands::Screenshot { out } => cmd::screenshot::run(&cli.config, &out, cli.json),
        Commands::Keys { names } => cmd::keys::run(&names, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&cli.config, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
