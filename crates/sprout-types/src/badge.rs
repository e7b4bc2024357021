//! Badges: one-time unlockable achievements with bonus rewards.

use serde::{Deserialize, Serialize};

use crate::BadgeId;

/// A badge unlock condition. Stored in the catalog as single-key JSON
/// (`{"missions_completed": 10}`); the external serde tagging of this
/// enum maps to that encoding directly, so adding a condition kind is a
/// compiler-checked change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockCondition {
    MissionsCompleted(i64),
    Level(i64),
    StreakDays(i64),
    QuestionnaireCompleted(i64),
}

/// Stats snapshot a condition is evaluated against.
#[derive(Clone, Copy, Debug, Default)]
pub struct BadgeStats {
    pub missions_completed: i64,
    pub level: i64,
    pub streak_days: i64,
    pub questionnaires_completed: i64,
}

impl UnlockCondition {
    /// Whether the condition holds for the given stats.
    pub fn is_met(self, stats: &BadgeStats) -> bool {
        match self {
            UnlockCondition::MissionsCompleted(n) => stats.missions_completed >= n,
            UnlockCondition::Level(n) => stats.level >= n,
            UnlockCondition::StreakDays(n) => stats.streak_days >= n,
            UnlockCondition::QuestionnaireCompleted(n) => stats.questionnaires_completed >= n,
        }
    }
}

/// A badge catalog entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Badge {
    pub id: BadgeId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: String,
    pub condition: UnlockCondition,
    pub xp_bonus: i64,
    pub coins_bonus: i64,
    pub rarity: String,
    pub is_active: bool,
}

/// A per-user unlock record, unique per (user, badge).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnlockedBadge {
    pub badge: Badge,
    pub unlocked_at: i64,
    pub is_equipped: bool,
}
