use crate::config::CliConfig;
use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use dialoguer::Input;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scratchcard_core::share::redemption_link;
use scratchcard_core::{PersistenceSync, SyncStatus};
use scratchcard_game::{
    ClaimRequest, PlaySettings, PointerInput, RevealStateMachine, RevealStep,
};
use std::sync::Arc;
use std::time::Duration;

/// Strokes attempted before falling back to a forced reveal.
const MAX_STROKES: usize = 200;
const STROKE_STEP: f64 = 12.0;

#[derive(Args)]
pub struct PlayArgs {
    /// Customer name (will prompt if not provided)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Customer CPF (will prompt if not provided)
    #[arg(short, long)]
    pub identity: Option<String>,

    /// Reveal right away instead of scratching
    #[arg(long)]
    pub force: bool,

    /// Seconds to hold the reveal before committing the result
    #[arg(long)]
    pub validation_delay: Option<u64>,

    /// Seed for the simulated scratch strokes
    #[arg(long)]
    pub seed: Option<u64>,
}

pub async fn handle_play(
    args: PlayArgs,
    sync: &Arc<PersistenceSync>,
    config: &CliConfig,
) -> Result<()> {
    let snapshot = sync.load().await;
    if let SyncStatus::ReadDegraded { failed } = sync.current_status() {
        println!("Warning: using cached data for {:?}", failed);
    }

    let name = match args.name {
        Some(name) => name,
        None => Input::<String>::new().with_prompt("Name").interact_text()?,
    };
    let identity = match args.identity {
        Some(identity) => identity,
        None => Input::<String>::new().with_prompt("CPF").interact_text()?,
    };

    let settings = PlaySettings {
        validation_delay: args.validation_delay.map(Duration::from_secs),
        ..PlaySettings::default()
    };
    let mut machine = RevealStateMachine::new(sync.clone(), settings);

    machine.claim(&ClaimRequest::new(name, identity))?;
    println!("{} - scratch to reveal your prize...", snapshot.config.name);

    let step = if args.force {
        machine.force_reveal()
    } else {
        scratch(&mut machine, args.seed, config.verbose)
    };

    match step {
        Some(RevealStep::Revealed(_)) => {}
        Some(RevealStep::Validating(delay)) => {
            println!("Validating result ({}s)...", delay.as_secs());
            machine
                .validate()
                .await
                .ok_or_else(|| anyhow!("Play left validation without a result"))?;
        }
        None => bail!("Surface never revealed"),
    }

    let attempt = machine
        .attempt()
        .cloned()
        .ok_or_else(|| anyhow!("Revealed play has no attempt"))?;

    println!();
    println!("Prize: {}", attempt.prize.name);
    if !attempt.prize.description.is_empty() {
        println!("  {}", attempt.prize.description);
    }

    if machine.can_redeem() {
        println!("  Code: {}", attempt.code);
        let config = sync.config();
        match redemption_link(
            &config,
            &attempt.user_name,
            &attempt.identity,
            &attempt.prize.name,
            &attempt.code,
        ) {
            Ok(link) => println!("  Redeem: {}", link),
            Err(e) => println!("  Redemption link unavailable: {}", e),
        }
    } else {
        println!("  Better luck tomorrow!");
    }

    let record = machine
        .commit_outcome()
        .await
        .ok_or_else(|| anyhow!("Revealed play has no ledger append"))?
        .context("Result was shown but could not be saved")?;

    println!();
    match sync.current_status() {
        SyncStatus::LocalOnly => println!("Saved locally (record {})", record.id),
        _ => println!("Saved (record {})", record.id),
    }

    Ok(())
}

/// Random horizontal strokes across the surface until it reveals.
fn scratch(machine: &mut RevealStateMachine, seed: Option<u64>, verbose: bool) -> Option<RevealStep> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let (width, height) = {
        let settings = machine.settings();
        (settings.surface_width as f64, settings.surface_height as f64)
    };

    for stroke in 0..MAX_STROKES {
        let y = rng.gen_range(0.0..height);
        let (start, end) = if rng.gen_bool(0.5) {
            (0.0, width)
        } else {
            (width, 0.0)
        };

        if let Some(step) = machine.pointer(PointerInput::Down { x: start, y }) {
            return Some(step);
        }

        let steps = (width / STROKE_STEP).ceil() as usize;
        for i in 1..=steps {
            let x = start + (end - start) * (i as f64 / steps as f64);
            let y = (y + rng.gen_range(-4.0..4.0)).clamp(0.0, height);
            if let Some(step) = machine.pointer(PointerInput::Move { x, y }) {
                return Some(step);
            }
        }

        let _ = machine.pointer(PointerInput::Up);

        if verbose {
            if let Some(surface) = machine.surface() {
                println!("  stroke {}: {:.1}% scratched", stroke + 1, surface.percent_revealed());
            }
        }
    }

    tracing::debug!("No reveal after {} strokes, forcing", MAX_STROKES);
    machine.force_reveal()
}
