use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use scratchcard_core::{Collection, PersistenceSync, ScratchError, StoreSnapshot, SyncStatus};
use std::sync::Arc;

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Reload all collections from the remote store
    Pull,
    /// Publish the local store configuration and prize pool
    Push {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Show what the local store holds
    Status,
    /// Follow remote changes until interrupted
    Watch,
}

pub async fn handle_sync_command(cmd: SyncCommands, sync: &Arc<PersistenceSync>) -> Result<()> {
    match cmd {
        SyncCommands::Pull => {
            if sync.is_local_only() {
                return Err(ScratchError::RemoteUnavailable.into());
            }

            println!("Loading from remote store...");
            let snapshot = sync.load().await;
            print_status(&sync.current_status());
            print_counts(&snapshot);
        }

        SyncCommands::Push { force } => {
            if sync.is_local_only() {
                return Err(ScratchError::RemoteUnavailable.into());
            }

            if !force {
                let confirm = Confirm::new()
                    .with_prompt("Replace the remote configuration and prize pool with the local copy?")
                    .default(false)
                    .interact()?;

                if !confirm {
                    println!("Push cancelled.");
                    return Ok(());
                }
            }

            sync.publish().await.context("Publishing failed")?;
            println!("Store configuration and prize pool published.");
        }

        SyncCommands::Status => {
            let snapshot = sync.snapshot();
            if sync.is_local_only() {
                println!("Mode: local only");
            } else {
                println!("Mode: remote");
            }
            print_counts(&snapshot);
        }

        SyncCommands::Watch => {
            let initial = sync.load().await;
            print_counts(&initial);

            let handle = sync
                .subscribe(|snapshot| {
                    println!(
                        "Change received: {} prizes, {} ledger records",
                        snapshot.prizes.len(),
                        snapshot.winners.len()
                    );
                })
                .ok_or(ScratchError::RemoteUnavailable)?;

            println!("Watching for changes, press Ctrl+C to stop.");
            tokio::signal::ctrl_c().await?;
            handle.abort();
        }
    }

    Ok(())
}

fn print_status(status: &SyncStatus) {
    match status {
        SyncStatus::Loaded => println!("All collections loaded."),
        SyncStatus::ReadDegraded { failed } => {
            let names: Vec<String> = failed.iter().map(Collection::to_string).collect();
            println!("Served from cache: {}", names.join(", "));
        }
        other => println!("Status: {:?}", other),
    }
}

fn print_counts(snapshot: &StoreSnapshot) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Collection", "Contents"]);
    table.add_row(vec![Collection::Config.to_string(), snapshot.config.name.clone()]);
    table.add_row(vec![
        Collection::Prizes.to_string(),
        snapshot.prizes.len().to_string(),
    ]);
    table.add_row(vec![
        Collection::Winners.to_string(),
        snapshot.winners.len().to_string(),
    ]);
    println!("{}", table);
}
