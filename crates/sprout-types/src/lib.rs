//! # sprout-types
//!
//! Shared domain types used across the sprout workspace: the mission
//! catalog, per-user mission instances, progression state, and badges.
//! All timestamps are Unix epoch seconds; calendar keys (pool dates,
//! check-in dates, activity dates) are plain local dates.

pub mod badge;
pub mod catalog;
pub mod mission;
pub mod progression;

/// Common id aliases.
pub type UserId = i64;
pub type TemplateId = i64;
pub type InstanceId = i64;
pub type BadgeId = i64;

/// Target size of the optional daily mission pool.
pub const DAILY_POOL_SIZE: usize = 3;

/// Coin cost of rerolling the unaccepted daily pool.
pub const POOL_REFRESH_COST: i64 = 20;

/// Users below this many completions always receive easy missions.
pub const NEW_USER_COMPLETION_THRESHOLD: i64 = 5;

/// Recency exclusion window for the mandatory daily slot, in days.
pub const MANDATORY_LOOKBACK_DAYS: i64 = 3;

/// Recency exclusion window for the optional daily pool, in days.
pub const POOL_LOOKBACK_DAYS: i64 = 7;

/// Recency exclusion window for weekly missions, in days.
pub const WEEKLY_LOOKBACK_DAYS: i64 = 30;
