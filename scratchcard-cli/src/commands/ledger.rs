use anyhow::Result;
use chrono::Local;
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use scratchcard_core::identity::normalize_identity;
use scratchcard_core::types::ledger_date;
use scratchcard_core::PersistenceSync;
use scratchcard_game::{may_play, validate_identity};
use std::sync::Arc;

#[derive(Subcommand)]
pub enum WinnerCommands {
    /// List ledger records
    List {
        /// Only records for this CPF
        #[arg(short, long)]
        identity: Option<String>,
        /// Only records from today
        #[arg(long)]
        today: bool,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_winner_command(cmd: WinnerCommands, sync: &Arc<PersistenceSync>) -> Result<()> {
    match cmd {
        WinnerCommands::List {
            identity,
            today,
            json,
        } => {
            let snapshot = sync.load().await;
            let identity = identity.map(|i| normalize_identity(&i));
            let today = today.then(|| ledger_date(Local::now().naive_local()));

            let records: Vec<_> = snapshot
                .winners
                .iter()
                .rev()
                .filter(|w| {
                    identity
                        .as_ref()
                        .map_or(true, |i| normalize_identity(&w.user_identity) == *i)
                })
                .filter(|w| {
                    today
                        .as_deref()
                        .map_or(true, |day| w.date_portion() == Some(day))
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }

            if records.is_empty() {
                println!("No records found.");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Date", "Name", "CPF", "Prize", "Code"]);

            for record in &records {
                table.add_row(vec![
                    &record.timestamp,
                    &record.user_name,
                    &record.user_identity,
                    &record.prize_name,
                    &record.prize_code,
                ]);
            }

            println!("{}", table);
            println!("{} record(s)", records.len());
        }
    }

    Ok(())
}

pub async fn handle_check(identity: &str, sync: &Arc<PersistenceSync>) -> Result<()> {
    let snapshot = sync.load().await;
    let identity = validate_identity(identity)?;

    if may_play(&identity, &snapshot.winners, Local::now().naive_local()) {
        println!("{} may play today", identity);
    } else {
        println!("{} has already played today", identity);
    }

    Ok(())
}
