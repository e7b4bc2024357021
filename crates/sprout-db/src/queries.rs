//! Database query functions organized by domain.

pub mod badges;
pub mod catalog;
pub mod history;
pub mod missions;
pub mod preferences;
pub mod profile;
pub mod rewards;

use chrono::NaiveDate;
use rusqlite::types::Type;

use sprout_types::catalog::{Cadence, Category, Difficulty, MissionKind};
use sprout_types::mission::MissionStatus;

/// Conversion failure for an enum-like TEXT column.
pub(crate) fn bad_text(idx: usize, what: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("unknown {what}: {value}").into(),
    )
}

pub(crate) fn parse_category(idx: usize, s: &str) -> rusqlite::Result<Category> {
    Category::from_str(s).ok_or_else(|| bad_text(idx, "category", s))
}

pub(crate) fn parse_difficulty(idx: usize, s: &str) -> rusqlite::Result<Difficulty> {
    Difficulty::from_str(s).ok_or_else(|| bad_text(idx, "difficulty", s))
}

pub(crate) fn parse_kind(idx: usize, s: &str) -> rusqlite::Result<MissionKind> {
    MissionKind::from_str(s).ok_or_else(|| bad_text(idx, "mission kind", s))
}

pub(crate) fn parse_cadence(idx: usize, s: &str) -> rusqlite::Result<Cadence> {
    Cadence::from_str(s).ok_or_else(|| bad_text(idx, "cadence", s))
}

pub(crate) fn parse_status(idx: usize, s: &str) -> rusqlite::Result<MissionStatus> {
    MissionStatus::from_str(s).ok_or_else(|| bad_text(idx, "status", s))
}

pub(crate) fn parse_date(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    s.parse::<NaiveDate>().map_err(|_| bad_text(idx, "date", s))
}

pub(crate) fn parse_date_opt(
    idx: usize,
    s: Option<String>,
) -> rusqlite::Result<Option<NaiveDate>> {
    s.map(|s| parse_date(idx, &s)).transpose()
}
