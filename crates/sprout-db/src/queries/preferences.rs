//! Per-user rolling assignment statistics.

use rusqlite::Connection;

use sprout_types::catalog::{Category, Difficulty};
use sprout_types::progression::UserPreference;
use sprout_types::UserId;

use crate::Result;

/// Category counter column, closed over [`Category`] so the
/// interpolation below can never receive attacker-controlled text.
fn category_column(category: Category) -> &'static str {
    match category {
        Category::Energy => "energy_completed",
        Category::Water => "water_completed",
        Category::Transport => "transport_completed",
        Category::Food => "food_completed",
        Category::Waste => "waste_completed",
    }
}

/// Fetch the preference row, creating a zeroed one if absent.
///
/// `INSERT OR IGNORE` makes concurrent first access race-tolerant:
/// both racers end up reading the same row.
pub fn get_or_create(conn: &Connection, user_id: UserId, now: i64) -> Result<UserPreference> {
    conn.execute(
        "INSERT OR IGNORE INTO user_mission_preferences (user_id, updated_at)
         VALUES (?1, ?2)",
        rusqlite::params![user_id, now],
    )?;

    let prefs = conn.query_row(
        "SELECT user_id, total_assigned, total_completed, completion_rate,
                energy_completed, water_completed, transport_completed,
                food_completed, waste_completed,
                preferred_difficulty, last_assigned_category
         FROM user_mission_preferences WHERE user_id = ?1",
        [user_id],
        |row| {
            Ok(UserPreference {
                user_id: row.get(0)?,
                total_assigned: row.get(1)?,
                total_completed: row.get(2)?,
                completion_rate: row.get(3)?,
                energy_completed: row.get(4)?,
                water_completed: row.get(5)?,
                transport_completed: row.get(6)?,
                food_completed: row.get(7)?,
                waste_completed: row.get(8)?,
                preferred_difficulty: super::parse_difficulty(9, &row.get::<_, String>(9)?)?,
                last_assigned_category: row
                    .get::<_, Option<String>>(10)?
                    .map(|s| super::parse_category(10, &s))
                    .transpose()?,
            })
        },
    )?;
    Ok(prefs)
}

/// Count newly assigned missions. Called once per assignment batch.
pub fn record_assignment(
    conn: &Connection,
    user_id: UserId,
    count: i64,
    now: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE user_mission_preferences
         SET total_assigned = total_assigned + ?1, updated_at = ?2
         WHERE user_id = ?3",
        rusqlite::params![count, now, user_id],
    )?;
    Ok(())
}

/// Count a completion against its category and refresh the completion
/// rate. The MAX(total_assigned, 1) guard keeps the division defined
/// even for a row that never saw an assignment.
pub fn record_completion(
    conn: &Connection,
    user_id: UserId,
    category: Category,
    now: i64,
) -> Result<()> {
    let column = category_column(category);
    let sql = format!(
        "UPDATE user_mission_preferences
         SET {column} = {column} + 1,
             total_completed = total_completed + 1,
             completion_rate = CAST(total_completed + 1 AS REAL)
                 / CAST(MAX(total_assigned, 1) AS REAL),
             updated_at = ?1
         WHERE user_id = ?2"
    );
    conn.execute(&sql, rusqlite::params![now, user_id])?;
    Ok(())
}

/// Remember what the mandatory slot was drawn from.
pub fn set_last_assigned(
    conn: &Connection,
    user_id: UserId,
    category: Category,
    difficulty: Difficulty,
    now: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE user_mission_preferences
         SET last_assigned_category = ?1, preferred_difficulty = ?2, updated_at = ?3
         WHERE user_id = ?4",
        rusqlite::params![category.as_str(), difficulty.as_str(), now, user_id],
    )?;
    Ok(())
}
