//! # sprout-engine
//!
//! The mission assignment and progression core:
//!
//! - [`assignment`] decides which catalog templates a user gets for a
//!   day or week, biased by their preference history.
//! - [`tracker`] owns the instance lifecycle (fetch-or-assign, accept,
//!   check-in, complete, skip).
//! - [`ledger`] applies a completion to XP, coins, streak, rank and
//!   badges as one transactional unit.
//! - [`refresh`] is the paid reroll of the unaccepted daily pool.
//!
//! Time comes from an injected [`calendar::Calendar`] and randomness
//! from an injected [`rand::Rng`], so every selection is reproducible
//! under test.

pub mod assignment;
pub mod calendar;
pub mod ledger;
pub mod refresh;
pub mod tracker;

use sprout_db::DbError;
use sprout_types::UserId;

/// Engine error types.
///
/// `NotFound` deliberately conflates "absent", "wrong owner" and
/// "wrong state" so callers cannot probe other users' instances.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("mission not found")]
    NotFound,

    #[error("action not valid for the mission's current state")]
    InvalidState,

    #[error("already done today")]
    AlreadyDone,

    #[error("insufficient coins: need {required}, have {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("no progression profile for user {0}")]
    ProfileNotFound(UserId),

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
