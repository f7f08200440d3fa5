use anyhow::{bail, Result};
use clap::Subcommand;
use scratchcard_core::share::{lead_link, resolve_initial_state, share_link};
use scratchcard_core::PersistenceSync;
use std::sync::Arc;

#[derive(Subcommand)]
pub enum ShareCommands {
    /// Print a client link carrying the store branding and prize pool
    Link {
        /// Address the widget is served from
        #[arg(short, long, default_value = "https://raspadinha.app/")]
        base_url: String,
    },
    /// Read a client link and show the state it carries
    Import {
        /// Full link or bare payload
        link: String,
        /// Save the carried state into the local store
        #[arg(long)]
        apply: bool,
    },
    /// Print the "I want my own scratch card" contact link
    Lead,
}

pub async fn handle_share_command(cmd: ShareCommands, sync: &Arc<PersistenceSync>) -> Result<()> {
    match cmd {
        ShareCommands::Link { base_url } => {
            let snapshot = sync.load().await;
            let link = share_link(&base_url, &snapshot.config, &snapshot.prizes)?;
            println!("{}", link);
        }

        ShareCommands::Import { link, apply } => {
            let snapshot = sync.snapshot();
            let state = resolve_initial_state(Some(&link), &snapshot.config, &snapshot.prizes);

            if !state.from_link {
                bail!("Link carries no readable store state");
            }

            println!("Store: {}", state.config.name);
            println!("  Logo: {}", state.config.logo_url);
            println!("  Color: {}", state.config.primary_color);
            println!("  WhatsApp: {}", state.config.whatsapp_number);
            println!("Prizes:");
            for prize in &state.prizes {
                let marker = if prize.is_winning { "+" } else { "-" };
                println!("  {} {}", marker, prize.name);
            }

            if apply {
                sync.set_local_config(state.config).await?;
                sync.set_local_prizes(state.prizes).await?;
                println!("Shared state saved locally.");
            }
        }

        ShareCommands::Lead => {
            let config = sync.load().await.config;
            println!("{}", lead_link(&config)?);
        }
    }

    Ok(())
}
