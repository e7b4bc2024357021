//! Progression state: XP, levels, coins, streaks, ranks, preferences,
//! and the outcome structs the completion ledger returns.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::badge::Badge;
use crate::catalog::{Category, Difficulty};
use crate::mission::AssignedMission;
use crate::UserId;

/// Per-user rolling assignment statistics. Created lazily with zero
/// defaults on first access; never deleted while the user exists.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserPreference {
    pub user_id: UserId,
    pub total_assigned: i64,
    pub total_completed: i64,
    /// total_completed / total_assigned, zero-guarded. Always in [0, 1].
    pub completion_rate: f64,
    pub energy_completed: i64,
    pub water_completed: i64,
    pub transport_completed: i64,
    pub food_completed: i64,
    pub waste_completed: i64,
    /// Stored but not currently derived.
    pub preferred_difficulty: Difficulty,
    pub last_assigned_category: Option<Category>,
}

impl UserPreference {
    /// Completion count for one category.
    pub fn completed_in(&self, category: Category) -> i64 {
        match category {
            Category::Energy => self.energy_completed,
            Category::Water => self.water_completed,
            Category::Transport => self.transport_completed,
            Category::Food => self.food_completed,
            Category::Waste => self.waste_completed,
        }
    }
}

/// The progression slice of a user profile. Mutated only by the ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Progression {
    pub user_id: UserId,
    pub level: i64,
    pub experience: i64,
    pub coins: i64,
    pub rank: String,
    pub rank_icon: String,
    pub total_missions_completed: i64,
    pub streak_days: i64,
    pub last_activity_date: Option<NaiveDate>,
}

/// A configured level threshold.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelTier {
    pub level: i64,
    pub experience_required: i64,
    /// Coins granted on reaching this level. Zero for level 1.
    pub coins_reward: i64,
}

/// A cosmetic rank tier derived from (level, total completions).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RankTier {
    pub name: String,
    pub icon: String,
    pub min_level: i64,
    pub min_missions: i64,
    pub color: String,
    pub description: String,
}

/// Result of an XP grant.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct XpGrant {
    pub new_experience: i64,
    pub new_level: i64,
    pub leveled_up: bool,
}

/// Everything a single completion produced, computed in one
/// transactional unit so the caller can render one coherent event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletionRewards {
    pub xp: i64,
    pub coins: i64,
    pub co2_saved: f64,
    pub leveled_up: bool,
    pub new_level: i64,
    pub new_streak: i64,
    pub new_rank: RankTier,
    pub new_badges: Vec<Badge>,
}

/// Result of a check-in: either progress toward the target, or the
/// completion rewards when the target was reached.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckInOutcome {
    pub progress: i64,
    pub target: i64,
    pub completed: bool,
    pub rewards: Option<CompletionRewards>,
}

/// Result of a paid daily pool reroll.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshOutcome {
    pub pool: Vec<AssignedMission>,
    pub new_balance: i64,
}

/// Why a reward ledger entry exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Xp,
    Coins,
}

impl RewardKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RewardKind::Xp => "xp",
            RewardKind::Coins => "coins",
        }
    }
}

/// One append-only reward ledger row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RewardEntry {
    pub kind: RewardKind,
    pub source: String,
    pub amount: i64,
    pub description: String,
    pub created_at: i64,
}

/// One append-only mission completion record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub template_id: crate::TemplateId,
    pub title: String,
    pub completed_at: i64,
    pub xp_earned: i64,
    pub coins_earned: i64,
    pub co2_saved: f64,
}
