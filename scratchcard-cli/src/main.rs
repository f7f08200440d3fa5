mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::CliConfig;
use scratchcard_core::ScratchError;
use scratchcard_game::PlayError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scratchcard")]
#[command(about = "Scratch card kiosk and operator tool")]
#[command(version)]
struct Cli {
    /// Data directory for the local store
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Store slug, or a store URL to derive it from
    #[arg(short, long, global = true)]
    store: Option<String>,

    /// Remote store base URL (API key comes from SCRATCH_REMOTE_KEY)
    #[arg(long, global = true)]
    remote_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scratch card play
    Play(commands::PlayArgs),

    /// Check whether an identity may play today
    Check {
        /// CPF, formatted or digits only
        identity: String,
    },

    /// Winner ledger commands
    #[command(subcommand)]
    Winners(commands::WinnerCommands),

    /// Prize pool commands
    #[command(subcommand)]
    Prizes(commands::PrizeCommands),

    /// Store configuration commands
    #[command(subcommand)]
    Store(commands::StoreCommands),

    /// Shareable link commands
    #[command(subcommand)]
    Share(commands::ShareCommands),

    /// Remote sync commands
    #[command(subcommand)]
    Sync(commands::SyncCommands),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "scratchcard={0},scratchcard_core={0},scratchcard_game={0}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CliConfig::resolve(cli.data_dir, cli.verbose, cli.store, cli.remote_url);

    // Ensure data directory exists
    tokio::fs::create_dir_all(&config.data_dir).await?;

    let sync = scratchcard_core::open_store(&config.data_dir, &config.sync).await?;

    // Execute command
    let result = match cli.command {
        Commands::Play(args) => commands::handle_play(args, &sync, &config).await,
        Commands::Check { identity } => commands::handle_check(&identity, &sync).await,
        Commands::Winners(cmd) => commands::handle_winner_command(cmd, &sync).await,
        Commands::Prizes(cmd) => commands::handle_prize_command(cmd, &sync).await,
        Commands::Store(cmd) => commands::handle_store_command(cmd, &sync).await,
        Commands::Share(cmd) => commands::handle_share_command(cmd, &sync).await,
        Commands::Sync(cmd) => commands::handle_sync_command(cmd, &sync).await,
    };

    if let Err(e) = result {
        if let Some(play_error) = e.downcast_ref::<PlayError>() {
            match play_error {
                PlayError::AlreadyPlayedToday { identity } => {
                    eprintln!("Error: {} has already played today", identity);
                    eprintln!("Each identity may play once per calendar day");
                }
                PlayError::InvalidClaim(reason) => {
                    eprintln!("Error: Invalid claim: {}", reason);
                    eprintln!("Provide a name and a valid CPF");
                }
                _ => eprintln!("Error: {:#}", e),
            }
        } else if let Some(ScratchError::RemoteUnavailable) = e.downcast_ref::<ScratchError>() {
            eprintln!("Error: No remote store configured");
            eprintln!("Set SCRATCH_REMOTE_URL and SCRATCH_REMOTE_KEY, or pass --remote-url");
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}
