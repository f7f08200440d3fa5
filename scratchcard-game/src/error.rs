use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlayError>;

#[derive(Error, Debug)]
pub enum PlayError {
    #[error("Scratch core error: {0}")]
    Core(#[from] scratchcard_core::ScratchError),

    #[error("Invalid claim: {0}")]
    InvalidClaim(String),

    #[error("Identity {identity} already played today")]
    AlreadyPlayedToday { identity: String },

    #[error("Invalid play state: {0}")]
    InvalidState(String),

    #[error("Commit task failed: {0}")]
    Internal(String),
}

impl PlayError {
    pub fn invalid_claim(msg: impl Into<String>) -> Self {
        Self::InvalidClaim(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}
