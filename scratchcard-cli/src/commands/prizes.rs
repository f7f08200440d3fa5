use anyhow::{bail, Result};
use chrono::Utc;
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use scratchcard_core::types::default_prizes;
use scratchcard_core::{PersistenceSync, Prize};
use std::sync::Arc;

#[derive(Subcommand)]
pub enum PrizeCommands {
    /// List the prize pool
    List,
    /// Add a prize to the local pool
    Add {
        /// Prize name
        name: String,
        /// Short description shown on reveal
        #[arg(short = 'D', long, default_value = "")]
        description: String,
        /// Mark as a losing outcome
        #[arg(long)]
        losing: bool,
    },
    /// Remove a prize from the local pool
    Remove {
        /// Prize id
        id: String,
    },
    /// Restore the default pool locally
    Reset,
}

pub async fn handle_prize_command(cmd: PrizeCommands, sync: &Arc<PersistenceSync>) -> Result<()> {
    match cmd {
        PrizeCommands::List => {
            let snapshot = sync.load().await;

            if snapshot.prizes.is_empty() {
                println!("Prize pool is empty, plays draw from the default pool.");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["ID", "Name", "Description", "Winning"]);

            for prize in &snapshot.prizes {
                table.add_row(vec![
                    prize.id.as_str(),
                    prize.name.as_str(),
                    prize.description.as_str(),
                    if prize.is_winning { "yes" } else { "no" },
                ]);
            }

            println!("{}", table);
        }

        PrizeCommands::Add {
            name,
            description,
            losing,
        } => {
            if name.trim().is_empty() {
                bail!("Prize name cannot be empty");
            }

            let mut prizes = sync.prizes();
            let prize = Prize::new(
                Utc::now().timestamp_millis().to_string(),
                name.trim(),
                description,
                !losing,
            );
            println!("Added prize '{}' ({})", prize.name, prize.id);
            prizes.push(prize);
            sync.set_local_prizes(prizes).await?;
            print_publish_hint(sync);
        }

        PrizeCommands::Remove { id } => {
            let mut prizes = sync.prizes();
            let before = prizes.len();
            prizes.retain(|p| p.id != id);

            if prizes.len() == before {
                bail!("No prize with id '{}'", id);
            }

            sync.set_local_prizes(prizes).await?;
            println!("Removed prize {}", id);
            print_publish_hint(sync);
        }

        PrizeCommands::Reset => {
            sync.set_local_prizes(default_prizes()).await?;
            println!("Prize pool restored to defaults");
            print_publish_hint(sync);
        }
    }

    Ok(())
}

fn print_publish_hint(sync: &PersistenceSync) {
    if !sync.is_local_only() {
        println!("Run 'scratchcard sync push' to publish the change");
    }
}
