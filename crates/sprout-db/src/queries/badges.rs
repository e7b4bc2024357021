//! Badge catalog and per-user unlock records.

use rusqlite::{Connection, Row};

use sprout_types::badge::{Badge, UnlockCondition, UnlockedBadge};
use sprout_types::{BadgeId, UserId};

use crate::Result;

const BADGE_COLUMNS: &str =
    "b.id, name, description, icon, category, unlock_condition, xp_bonus, coins_bonus, rarity, is_active";

fn badge_from_row(row: &Row) -> rusqlite::Result<Badge> {
    let condition_json: String = row.get(5)?;
    let condition: UnlockCondition = serde_json::from_str(&condition_json)
        .map_err(|e| super::bad_text(5, "unlock condition", &format!("{condition_json} ({e})")))?;
    Ok(Badge {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        icon: row.get(3)?,
        category: row.get(4)?,
        condition,
        xp_bonus: row.get(6)?,
        coins_bonus: row.get(7)?,
        rarity: row.get(8)?,
        is_active: row.get(9)?,
    })
}

/// Insert a badge into the catalog.
pub fn insert(
    conn: &Connection,
    name: &str,
    description: &str,
    icon: &str,
    category: &str,
    condition: UnlockCondition,
    xp_bonus: i64,
    coins_bonus: i64,
    rarity: &str,
) -> Result<BadgeId> {
    let condition_json = serde_json::to_string(&condition)
        .map_err(|e| crate::DbError::Serialization(e.to_string()))?;
    conn.execute(
        "INSERT INTO badges
         (name, description, icon, category, unlock_condition, xp_bonus, coins_bonus, rarity)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            name,
            description,
            icon,
            category,
            condition_json,
            xp_bonus,
            coins_bonus,
            rarity
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Active badges the user has not unlocked yet — the badge evaluation
/// candidate set.
pub fn locked_active(conn: &Connection, user_id: UserId) -> Result<Vec<Badge>> {
    let sql = format!(
        "SELECT {BADGE_COLUMNS} FROM badges b
         WHERE b.is_active = 1
           AND NOT EXISTS (
               SELECT 1 FROM user_badges ub
               WHERE ub.user_id = ?1 AND ub.badge_id = b.id)
         ORDER BY b.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], badge_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Record an unlock. The UNIQUE(user_id, badge_id) constraint plus
/// OR IGNORE makes this exactly-once: returns false if already held.
pub fn unlock(conn: &Connection, user_id: UserId, badge_id: BadgeId, now: i64) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO user_badges (user_id, badge_id, unlocked_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![user_id, badge_id, now],
    )?;
    Ok(inserted == 1)
}

/// All badges unlocked by the user, newest first.
pub fn unlocked(conn: &Connection, user_id: UserId) -> Result<Vec<UnlockedBadge>> {
    let sql = format!(
        "SELECT {BADGE_COLUMNS}, ub.unlocked_at, ub.is_equipped
         FROM badges b
         JOIN user_badges ub ON ub.badge_id = b.id
         WHERE ub.user_id = ?1
         ORDER BY ub.unlocked_at DESC, b.id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], |row| {
            Ok(UnlockedBadge {
                badge: badge_from_row(row)?,
                unlocked_at: row.get(10)?,
                is_equipped: row.get(11)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Equip one badge, unequipping any other. Returns false when the user
/// does not hold the badge.
pub fn equip(conn: &Connection, user_id: UserId, badge_id: BadgeId) -> Result<bool> {
    conn.execute(
        "UPDATE user_badges SET is_equipped = 0 WHERE user_id = ?1",
        [user_id],
    )?;
    let updated = conn.execute(
        "UPDATE user_badges SET is_equipped = 1 WHERE user_id = ?1 AND badge_id = ?2",
        rusqlite::params![user_id, badge_id],
    )?;
    Ok(updated == 1)
}
