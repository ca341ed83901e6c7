use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focus-overlay", version, about = "Focus Overlay CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a page headlessly and report what the blocker decided
    Visit {
        /// Page URL
        url: String,
    },
    /// Unlock a blocked host for a number of minutes
    Grant {
        /// Hostname, exactly as listed in the blocklist
        host: String,
        /// One of the configured durations
        minutes: u64,
    },
    /// Show blocked hosts and active unlocks
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove the unlock for a host
    Revoke {
        /// Hostname
        host: String,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Task source credentials
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Fetch up to three open tasks from Notion
    Tasks {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("FOCUS_OVERLAY_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Visit { url } => commands::visit::run(&url),
        Commands::Grant { host, minutes } => commands::grant::grant(&host, minutes),
        Commands::Status { json } => commands::grant::status(json),
        Commands::Revoke { host } => commands::grant::revoke(&host),
        Commands::Config { action } => commands::config::run(action),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Tasks { json } => commands::tasks::run(json),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
