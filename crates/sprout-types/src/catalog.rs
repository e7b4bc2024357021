//! Mission catalog structures: the seeded, read-only templates that the
//! assignment engine instantiates per user.

use serde::{Deserialize, Serialize};

use crate::TemplateId;

/// Eco-action category. Fixed set; preference counters and the catalog
/// both key on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Energy,
    Water,
    Transport,
    Food,
    Waste,
}

impl Category {
    /// All categories, in canonical order.
    pub const ALL: [Category; 5] = [
        Category::Energy,
        Category::Water,
        Category::Transport,
        Category::Food,
        Category::Waste,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Energy => "energy",
            Category::Water => "water",
            Category::Transport => "transport",
            Category::Food => "food",
            Category::Waste => "waste",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "energy" => Some(Category::Energy),
            "water" => Some(Category::Water),
            "transport" => Some(Category::Transport),
            "food" => Some(Category::Food),
            "waste" => Some(Category::Waste),
            _ => None,
        }
    }
}

/// Mission difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Whether a mission is a concrete action or reading material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    RealAction,
    Educational,
}

impl MissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MissionKind::RealAction => "real_action",
            MissionKind::Educational => "educational",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "real_action" => Some(MissionKind::RealAction),
            "educational" => Some(MissionKind::Educational),
            _ => None,
        }
    }
}

/// Assignment cadence: part of the daily board or the weekly slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Daily,
    Weekly,
}

impl Cadence {
    pub fn as_str(self) -> &'static str {
        match self {
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Cadence::Daily),
            "weekly" => Some(Cadence::Weekly),
            _ => None,
        }
    }
}

/// A catalog entry. Immutable after creation except for `is_active`
/// (soft delete); the engine never writes these.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MissionTemplate {
    pub id: TemplateId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub kind: MissionKind,
    pub difficulty: Difficulty,
    /// Days the mission runs; weekly check-in missions use 7.
    pub duration_days: i64,
    pub cadence: Cadence,
    pub xp_reward: i64,
    pub coins_reward: i64,
    /// Kilograms of CO2e avoided. Informational only.
    pub co2_impact: f64,
    pub is_active: bool,
}
