use crate::models::MatchStatus;

/// Errors surfaced by engine operations. Eligibility variants are rendered
/// to the initiating user as-is; `Storage` means the operation did not
/// happen and the caller should be told to retry.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("You have opted out of matchmaking")]
    OptedOut,

    #[error("Please wait {retry_after_secs} seconds before requesting another match")]
    CooldownActive { retry_after_secs: i64 },

    #[error("You already have {active} of {limit} allowed matches; unmatch one first")]
    LimitReached { active: u32, limit: u32 },

    #[error("Match request not found")]
    MatchNotFound,

    #[error("This match request was not sent to you")]
    NotYourMatch,

    #[error("This match request was already resolved as {status:?}")]
    AlreadyResolved { status: MatchStatus },

    #[error("This match request has expired")]
    MatchExpired,

    #[error("No active match with that user")]
    NoActiveMatch,

    #[error("Invalid matching configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl MatchError {
    /// True for errors caused by the request itself rather than the system
    pub fn is_eligibility(&self) -> bool {
        !matches!(self, MatchError::Storage(_) | MatchError::InvalidConfig(_))
    }
}
