//! Scratch card play flow
//!
//! Decides who may play, draws a prize, runs the erasable surface and
//! drives one play from claim to a committed ledger record.

pub mod allocator;
pub mod eligibility;
pub mod error;
pub mod machine;
pub mod surface;

pub use allocator::{allocate, allocate_with, Allocation};
pub use eligibility::{check_eligibility, may_play, validate_identity};
pub use error::{PlayError, Result};
pub use machine::{
    Attempt, ClaimRequest, PlayPhase, PlaySettings, PlayState, RevealStateMachine, RevealStep,
};
pub use surface::{PointerInput, RevealCause, ScratchSurface, SurfaceSettings, SurfaceState};
