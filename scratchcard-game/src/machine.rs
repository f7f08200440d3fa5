use crate::allocator::allocate;
use crate::eligibility::{check_eligibility, validate_identity};
use crate::surface::{PointerInput, RevealCause, ScratchSurface, SurfaceSettings};
use crate::{PlayError, Result};
use chrono::{Local, NaiveDateTime};
use scratchcard_core::types::ledger_timestamp;
use scratchcard_core::{PersistenceSync, Prize, Winner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaySettings {
    pub surface: SurfaceSettings,
    pub surface_width: u32,
    pub surface_height: u32,
    /// Pause between the reveal and the commit. `None` commits immediately.
    pub validation_delay: Option<Duration>,
}

impl Default for PlaySettings {
    fn default() -> Self {
        Self {
            surface: SurfaceSettings::default(),
            surface_width: 480,
            surface_height: 270,
            validation_delay: None,
        }
    }
}

/// Name and identity submitted to start a play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub name: String,
    pub identity: String,
}

impl ClaimRequest {
    pub fn new(name: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity: identity.into(),
        }
    }

    /// Trimmed name and digits-only identity.
    pub fn validate(&self) -> Result<(String, String)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(PlayError::invalid_claim("name is required"));
        }

        let identity = validate_identity(&self.identity)?;
        Ok((name.to_string(), identity))
    }
}

/// The play in progress: who claimed it and what they drew.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub user_name: String,
    pub identity: String,
    pub prize: Prize,
    pub code: String,
}

impl Attempt {
    fn to_record(&self, at: NaiveDateTime) -> Winner {
        Winner {
            id: Uuid::now_v7().to_string(),
            user_name: self.user_name.clone(),
            user_identity: self.identity.clone(),
            prize_name: self.prize.name.clone(),
            prize_code: self.code.clone(),
            timestamp: ledger_timestamp(at),
        }
    }
}

#[derive(Debug)]
pub enum PlayState {
    Idle,
    Allocated {
        attempt: Attempt,
    },
    Scratching {
        attempt: Attempt,
        surface: ScratchSurface,
    },
    Syncing {
        attempt: Attempt,
        surface: ScratchSurface,
        cause: RevealCause,
    },
    Revealed {
        attempt: Attempt,
        surface: ScratchSurface,
        record: Winner,
        cause: RevealCause,
        /// Ledger append started on entry; taken by `commit_outcome`.
        commit: Option<JoinHandle<Result<Winner>>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayPhase {
    Idle,
    Allocated,
    Scratching,
    Syncing,
    Revealed,
}

/// What a reveal asks the caller to do next.
#[derive(Debug)]
pub enum RevealStep {
    /// Wait this long, then call `complete_validation` (or `validate`).
    Validating(Duration),
    /// The record whose ledger append is already under way.
    Revealed(Winner),
}

/// Lifecycle of one play: idle -> allocated -> scratching -> (syncing) ->
/// revealed, with `reset` back to idle from anywhere.
///
/// Entering `revealed` spawns the ledger append onto the Tokio runtime, so
/// reveal-triggering calls must run inside one.
pub struct RevealStateMachine {
    sync: Arc<PersistenceSync>,
    settings: PlaySettings,
    state: PlayState,
    clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl RevealStateMachine {
    pub fn new(sync: Arc<PersistenceSync>, settings: PlaySettings) -> Self {
        Self {
            sync,
            settings,
            state: PlayState::Idle,
            clock: local_now,
        }
    }

    /// Replace the wall clock used for eligibility and record timestamps.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &PlaySettings {
        &self.settings
    }

    pub fn state(&self) -> &PlayState {
        &self.state
    }

    pub fn phase(&self) -> PlayPhase {
        match self.state {
            PlayState::Idle => PlayPhase::Idle,
            PlayState::Allocated { .. } => PlayPhase::Allocated,
            PlayState::Scratching { .. } => PlayPhase::Scratching,
            PlayState::Syncing { .. } => PlayPhase::Syncing,
            PlayState::Revealed { .. } => PlayPhase::Revealed,
        }
    }

    pub fn attempt(&self) -> Option<&Attempt> {
        match &self.state {
            PlayState::Idle => None,
            PlayState::Allocated { attempt }
            | PlayState::Scratching { attempt, .. }
            | PlayState::Syncing { attempt, .. }
            | PlayState::Revealed { attempt, .. } => Some(attempt),
        }
    }

    pub fn surface(&self) -> Option<&ScratchSurface> {
        match &self.state {
            PlayState::Scratching { surface, .. }
            | PlayState::Syncing { surface, .. }
            | PlayState::Revealed { surface, .. } => Some(surface),
            _ => None,
        }
    }

    pub fn record(&self) -> Option<&Winner> {
        match &self.state {
            PlayState::Revealed { record, .. } => Some(record),
            _ => None,
        }
    }

    /// The claim form is locked while any play is active.
    pub fn is_scratching_active(&self) -> bool {
        !matches!(self.state, PlayState::Idle)
    }

    pub fn is_syncing(&self) -> bool {
        matches!(self.state, PlayState::Syncing { .. })
    }

    pub fn is_revealed(&self) -> bool {
        matches!(self.state, PlayState::Revealed { .. })
    }

    pub fn can_redeem(&self) -> bool {
        match &self.state {
            PlayState::Revealed { attempt, .. } => attempt.prize.is_winning,
            _ => false,
        }
    }

    pub fn can_force_reveal(&self) -> bool {
        matches!(self.state, PlayState::Scratching { .. })
    }

    /// Validate, check eligibility against the cached ledger, draw a prize
    /// and start scratching.
    pub fn claim(&mut self, request: &ClaimRequest) -> Result<Attempt> {
        if !matches!(self.state, PlayState::Idle) {
            return Err(PlayError::invalid_state("a play is already in progress"));
        }

        let (user_name, identity) = request.validate()?;
        let now = (self.clock)();
        check_eligibility(&identity, &self.sync.winners(), now)?;

        let allocation = allocate(&self.sync.prizes());
        let attempt = Attempt {
            user_name,
            identity,
            prize: allocation.prize,
            code: allocation.code,
        };

        tracing::info!(
            "Allocated '{}' (code {}) to identity {}",
            attempt.prize.name,
            attempt.code,
            attempt.identity
        );
        self.state = PlayState::Allocated {
            attempt: attempt.clone(),
        };
        self.start_scratching();

        Ok(attempt)
    }

    fn start_scratching(&mut self) {
        let PlayState::Allocated { attempt } = std::mem::replace(&mut self.state, PlayState::Idle)
        else {
            return;
        };

        let surface = ScratchSurface::new(
            self.settings.surface_width,
            self.settings.surface_height,
            self.settings.surface,
        );
        tracing::debug!("Scratching started on {:?}", surface.size());
        self.state = PlayState::Scratching { attempt, surface };
    }

    /// Feed pointer input to the surface.
    pub fn pointer(&mut self, input: PointerInput) -> Option<RevealStep> {
        let PlayState::Scratching { surface, .. } = &mut self.state else {
            return None;
        };
        let cause = surface.handle(input)?;
        self.on_reveal(cause)
    }

    /// Operator "show now" control.
    pub fn force_reveal(&mut self) -> Option<RevealStep> {
        let PlayState::Scratching { surface, .. } = &mut self.state else {
            return None;
        };
        let cause = surface.force_reveal()?;
        self.on_reveal(cause)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        match &mut self.state {
            PlayState::Scratching { surface, .. }
            | PlayState::Syncing { surface, .. }
            | PlayState::Revealed { surface, .. } => surface.resize(width, height),
            _ => {}
        }
    }

    fn on_reveal(&mut self, cause: RevealCause) -> Option<RevealStep> {
        let PlayState::Scratching { attempt, surface } =
            std::mem::replace(&mut self.state, PlayState::Idle)
        else {
            return None;
        };
        self.state = PlayState::Syncing {
            attempt,
            surface,
            cause,
        };

        match self.settings.validation_delay {
            Some(delay) if !delay.is_zero() => {
                tracing::debug!("Validating reveal for {:?}", delay);
                Some(RevealStep::Validating(delay))
            }
            _ => self.enter_revealed().map(RevealStep::Revealed),
        }
    }

    /// syncing -> revealed.
    pub fn complete_validation(&mut self) -> Option<Winner> {
        if !self.is_syncing() {
            return None;
        }
        self.enter_revealed()
    }

    /// Sleep for the configured validation delay, then reveal.
    pub async fn validate(&mut self) -> Option<Winner> {
        if !self.is_syncing() {
            return None;
        }
        if let Some(delay) = self.settings.validation_delay {
            tokio::time::sleep(delay).await;
        }
        self.complete_validation()
    }

    /// The only place a ledger record is built and appended. Any state other
    /// than syncing leaves the machine untouched.
    fn enter_revealed(&mut self) -> Option<Winner> {
        let (attempt, surface, cause) = match std::mem::replace(&mut self.state, PlayState::Idle) {
            PlayState::Syncing {
                attempt,
                surface,
                cause,
            } => (attempt, surface, cause),
            other => {
                self.state = other;
                return None;
            }
        };

        let record = attempt.to_record((self.clock)());
        tracing::info!(
            "Revealed '{}' for identity {} ({:?}), committing record {}",
            attempt.prize.name,
            attempt.identity,
            cause,
            record.id
        );

        let sync = self.sync.clone();
        let pending = record.clone();
        let commit = tokio::spawn(async move {
            sync.append(pending.clone()).await?;
            Ok(pending)
        });

        self.state = PlayState::Revealed {
            attempt,
            surface,
            record: record.clone(),
            cause,
            commit: Some(commit),
        };

        Some(record)
    }

    /// Wait for the ledger append started by the reveal. Returns `None`
    /// before a reveal or once the outcome was already taken. A failed
    /// append is also reported through the sync status; it is not retried.
    pub async fn commit_outcome(&mut self) -> Option<Result<Winner>> {
        let PlayState::Revealed { commit, .. } = &mut self.state else {
            return None;
        };
        let handle = commit.take()?;

        Some(match handle.await {
            Ok(result) => result,
            Err(e) => Err(PlayError::Internal(e.to_string())),
        })
    }

    /// Back to idle. An append already started by a reveal keeps running.
    pub fn reset(&mut self) {
        if let Some(attempt) = self.attempt() {
            tracing::info!("Play for identity {} cleared", attempt.identity);
        }
        self.state = PlayState::Idle;
    }
}
