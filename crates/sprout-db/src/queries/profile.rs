//! User profile and progression query functions, plus the level and
//! rank configuration tables.
//!
//! Coin and experience writes are relative adjustments, never blind
//! overwrites, so concurrent grants cannot lose updates.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};

use sprout_types::progression::{LevelTier, Progression, RankTier};
use sprout_types::UserId;

use crate::{DbError, Result};

/// Create a user with their profile and preference rows.
pub fn create_user(conn: &Connection, display_name: &str, now: i64) -> Result<UserId> {
    conn.execute(
        "INSERT INTO users (display_name, created_at) VALUES (?1, ?2)",
        rusqlite::params![display_name, now],
    )?;
    let user_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO user_profile (user_id, created_at, updated_at) VALUES (?1, ?2, ?2)",
        rusqlite::params![user_id, now],
    )?;
    conn.execute(
        "INSERT INTO user_mission_preferences (user_id, updated_at) VALUES (?1, ?2)",
        rusqlite::params![user_id, now],
    )?;
    Ok(user_id)
}

/// Fetch the progression slice of a profile.
pub fn get_progression(conn: &Connection, user_id: UserId) -> Result<Option<Progression>> {
    let progression = conn
        .query_row(
            "SELECT user_id, level, experience, coins, rank, rank_icon,
                    total_missions_completed, streak_days, last_activity_date
             FROM user_profile WHERE user_id = ?1",
            [user_id],
            |row| {
                Ok(Progression {
                    user_id: row.get(0)?,
                    level: row.get(1)?,
                    experience: row.get(2)?,
                    coins: row.get(3)?,
                    rank: row.get(4)?,
                    rank_icon: row.get(5)?,
                    total_missions_completed: row.get(6)?,
                    streak_days: row.get(7)?,
                    last_activity_date: super::parse_date_opt(8, row.get(8)?)?,
                })
            },
        )
        .optional()?;
    Ok(progression)
}

/// Current coin balance.
pub fn coins(conn: &Connection, user_id: UserId) -> Result<i64> {
    conn.query_row(
        "SELECT coins FROM user_profile WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| DbError::NotFound(format!("profile for user {user_id}")))
}

/// Apply a relative coin adjustment and return the new balance.
pub fn adjust_coins(conn: &Connection, user_id: UserId, delta: i64, now: i64) -> Result<i64> {
    let updated = conn.execute(
        "UPDATE user_profile SET coins = coins + ?1, updated_at = ?2 WHERE user_id = ?3",
        rusqlite::params![delta, now, user_id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("profile for user {user_id}")));
    }
    coins(conn, user_id)
}

/// Store a recomputed (experience, level) pair.
pub fn set_level_experience(
    conn: &Connection,
    user_id: UserId,
    level: i64,
    experience: i64,
    now: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE user_profile SET level = ?1, experience = ?2, updated_at = ?3
         WHERE user_id = ?4",
        rusqlite::params![level, experience, now, user_id],
    )?;
    Ok(())
}

/// Bump the lifetime completion counter.
pub fn increment_missions_completed(conn: &Connection, user_id: UserId, now: i64) -> Result<()> {
    conn.execute(
        "UPDATE user_profile
         SET total_missions_completed = total_missions_completed + 1, updated_at = ?1
         WHERE user_id = ?2",
        rusqlite::params![now, user_id],
    )?;
    Ok(())
}

/// Store a recomputed streak and its activity date.
pub fn set_streak(
    conn: &Connection,
    user_id: UserId,
    streak_days: i64,
    activity_date: NaiveDate,
    now: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE user_profile
         SET streak_days = ?1, last_activity_date = ?2, updated_at = ?3
         WHERE user_id = ?4",
        rusqlite::params![streak_days, activity_date.to_string(), now, user_id],
    )?;
    Ok(())
}

/// Persist the recomputed rank name and icon.
pub fn set_rank(conn: &Connection, user_id: UserId, rank: &RankTier, now: i64) -> Result<()> {
    conn.execute(
        "UPDATE user_profile SET rank = ?1, rank_icon = ?2, updated_at = ?3
         WHERE user_id = ?4",
        rusqlite::params![rank.name, rank.icon, now, user_id],
    )?;
    Ok(())
}

/// Largest configured level whose threshold is at or below the given
/// experience. A profile below every threshold is level 1.
pub fn level_for_experience(conn: &Connection, experience: i64) -> Result<i64> {
    let level = conn
        .query_row(
            "SELECT level FROM levels WHERE experience_required <= ?1
             ORDER BY level DESC LIMIT 1",
            [experience],
            |row| row.get(0),
        )
        .optional()?;
    Ok(level.unwrap_or(1))
}

fn level_tier_from_row(row: &rusqlite::Row) -> rusqlite::Result<LevelTier> {
    Ok(LevelTier {
        level: row.get(0)?,
        experience_required: row.get(1)?,
        coins_reward: row.get(2)?,
    })
}

/// The configuration row for one level, if configured.
pub fn level_tier(conn: &Connection, level: i64) -> Result<Option<LevelTier>> {
    let tier = conn
        .query_row(
            "SELECT level, experience_required, coins_reward FROM levels WHERE level = ?1",
            [level],
            level_tier_from_row,
        )
        .optional()?;
    Ok(tier)
}

/// The next configured level above the given one.
pub fn next_level(conn: &Connection, level: i64) -> Result<Option<LevelTier>> {
    let tier = conn
        .query_row(
            "SELECT level, experience_required, coins_reward FROM levels
             WHERE level > ?1 ORDER BY level ASC LIMIT 1",
            [level],
            level_tier_from_row,
        )
        .optional()?;
    Ok(tier)
}

/// Best matching rank for (level, missions completed): the tier with
/// the highest satisfied requirements.
pub fn best_rank(conn: &Connection, level: i64, missions_completed: i64) -> Result<RankTier> {
    let rank = conn
        .query_row(
            "SELECT name, icon, min_level, min_missions, color, description FROM ranks
             WHERE min_level <= ?1 AND min_missions <= ?2
             ORDER BY min_level DESC, min_missions DESC LIMIT 1",
            rusqlite::params![level, missions_completed],
            |row| {
                Ok(RankTier {
                    name: row.get(0)?,
                    icon: row.get(1)?,
                    min_level: row.get(2)?,
                    min_missions: row.get(3)?,
                    color: row.get(4)?,
                    description: row.get(5)?,
                })
            },
        )
        .optional()?;

    // The seeded entry tier matches any profile, but an empty ranks
    // table should still leave the user presentable.
    Ok(rank.unwrap_or_else(|| RankTier {
        name: "Seed".into(),
        icon: "🌱".into(),
        min_level: 1,
        min_missions: 0,
        color: "#8BC34A".into(),
        description: "Your eco journey is just beginning".into(),
    }))
}
