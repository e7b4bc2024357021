//! Per-user mission instances and the board views built from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{Cadence, MissionTemplate};
use crate::{InstanceId, TemplateId, UserId};

/// Lifecycle state of a mission instance. `Completed` and `Skipped`
/// are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Active,
    Completed,
    Skipped,
}

impl MissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MissionStatus::Active => "active",
            MissionStatus::Completed => "completed",
            MissionStatus::Skipped => "skipped",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(MissionStatus::Active),
            "completed" => Some(MissionStatus::Completed),
            "skipped" => Some(MissionStatus::Skipped),
            _ => None,
        }
    }
}

/// A concrete (user, template) pairing with its own progress and state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MissionInstance {
    pub id: InstanceId,
    pub user_id: UserId,
    pub template_id: TemplateId,
    pub cadence: Cadence,
    pub is_mandatory: bool,
    /// Calendar key the assignment batch belongs to: today for daily,
    /// the week's Sunday for weekly.
    pub pool_date: NaiveDate,
    pub status: MissionStatus,
    pub progress: i64,
    pub max_progress: i64,
    pub assigned_at: i64,
    /// Set when the user opts into an optional mission. Mandatory
    /// missions never need acceptance.
    pub accepted_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub expires_at: i64,
    /// Gates check-ins to one per calendar day.
    pub last_check_in: Option<NaiveDate>,
    /// Rewards actually granted, snapshotted at completion.
    pub xp_earned: i64,
    pub coins_earned: i64,
}

impl MissionInstance {
    /// Whether the user has opted into this instance (always true for
    /// the mandatory slot).
    pub fn is_accepted(&self) -> bool {
        self.is_mandatory || self.accepted_at.is_some()
    }
}

/// An instance joined with its catalog template, as served to clients.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssignedMission {
    pub instance: MissionInstance,
    pub template: MissionTemplate,
}

/// Today's missions: the mandatory slot plus the optional pool.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DailyBoard {
    pub mandatory: Option<AssignedMission>,
    pub pool: Vec<AssignedMission>,
    pub expires_at: i64,
    pub hours_remaining: i64,
}

/// This week's missions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeeklyBoard {
    pub pool: Vec<AssignedMission>,
    pub expires_at: i64,
    pub days_remaining: i64,
}
