// Error taxonomy for game operations.

use thiserror::Error;

/// Failures surfaced by the game engine.
///
/// `AlreadyGrownToday` is deliberately not here: it is a normal outcome of
/// the daily growth action and lives in `engine::GrowOutcome`.
#[derive(Debug, Error)]
pub enum GameError {
    /// The user has no pig record where one was required.
    #[error("no pig record found")]
    NoRecordFound,

    /// A duel participant's record could not be established.
    #[error("opponent record could not be established")]
    NoOpponentRecord,

    /// The persistence layer failed.
    #[error("store operation failed: {0}")]
    Store(#[from] sqlx::Error),

    /// A store operation exceeded its time budget.
    #[error("store operation timed out after {0}ms")]
    StoreTimeout(u64),

    /// Internal invariant broke. Reported to operators, never to users.
    #[error("invariant violation: {0}")]
    Invariant(String),
}

impl GameError {
    /// Metric label for the error class.
    pub fn class(&self) -> &'static str {
        match self {
            GameError::NoRecordFound => "no_record",
            GameError::NoOpponentRecord => "no_opponent",
            GameError::Store(_) => "store",
            GameError::StoreTimeout(_) => "store_timeout",
            GameError::Invariant(_) => "invariant",
        }
    }

    /// True for errors that describe the user's situation rather than a
    /// system fault (no error logging, specific reply text).
    pub fn is_user_facing(&self) -> bool {
        matches!(self, GameError::NoRecordFound | GameError::NoOpponentRecord)
    }
}
