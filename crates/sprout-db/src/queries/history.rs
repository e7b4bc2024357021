//! Append-only completion log and questionnaire results.
//!
//! `mission_history` rows are write-once; streaks, heatmaps, and
//! leaderboards derive from them.

use rusqlite::Connection;

use sprout_types::progression::HistoryEntry;
use sprout_types::{TemplateId, UserId};

use crate::Result;

/// Append a completion record.
pub fn append(
    conn: &Connection,
    user_id: UserId,
    template_id: TemplateId,
    completed_at: i64,
    xp_earned: i64,
    coins_earned: i64,
    co2_saved: f64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO mission_history
         (user_id, challenge_id, completed_at, xp_earned, coins_earned, co2_saved)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![user_id, template_id, completed_at, xp_earned, coins_earned, co2_saved],
    )?;
    Ok(())
}

/// Recent completions, newest first.
pub fn recent(conn: &Connection, user_id: UserId, limit: u32) -> Result<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT mh.challenge_id, c.title, mh.completed_at,
                mh.xp_earned, mh.coins_earned, mh.co2_saved
         FROM mission_history mh
         JOIN challenges c ON mh.challenge_id = c.id
         WHERE mh.user_id = ?1
         ORDER BY mh.completed_at DESC, mh.id DESC
         LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![user_id, limit], |row| {
            Ok(HistoryEntry {
                template_id: row.get(0)?,
                title: row.get(1)?,
                completed_at: row.get(2)?,
                xp_earned: row.get(3)?,
                coins_earned: row.get(4)?,
                co2_saved: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Total completions recorded for a user.
pub fn completion_count(conn: &Connection, user_id: UserId) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM mission_history WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Record a finished footprint questionnaire. The score arithmetic
/// lives elsewhere; only the count matters to badge evaluation.
pub fn record_questionnaire(
    conn: &Connection,
    user_id: UserId,
    total_footprint: f64,
    now: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO questionnaire_results (user_id, total_footprint, created_at)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![user_id, total_footprint, now],
    )?;
    Ok(())
}

/// Number of questionnaires the user has completed.
pub fn questionnaire_count(conn: &Connection, user_id: UserId) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM questionnaire_results WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{catalog, profile};
    use sprout_types::catalog::{Cadence, Category, Difficulty, MissionKind};

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_append_and_recent_ordering() {
        let conn = test_db();
        let user_id = profile::create_user(&conn, "noa", 100).expect("user");
        let template_id = catalog::insert(
            &conn,
            &catalog::NewTemplate {
                title: "Meat-free day".into(),
                description: "Eat vegetarian today".into(),
                category: Category::Food,
                kind: MissionKind::RealAction,
                difficulty: Difficulty::Medium,
                duration_days: 1,
                cadence: Cadence::Daily,
                xp_reward: 20,
                coins_reward: 15,
                co2_impact: 2.5,
            },
            100,
        )
        .expect("template");

        append(&conn, user_id, template_id, 1000, 20, 15, 2.5).expect("first");
        append(&conn, user_id, template_id, 2000, 20, 15, 2.5).expect("second");

        let entries = recent(&conn, user_id, 10).expect("recent");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].completed_at, 2000); // Newest first
        assert_eq!(entries[0].title, "Meat-free day");
        assert_eq!(completion_count(&conn, user_id).expect("count"), 2);
    }

    #[test]
    fn test_questionnaire_count() {
        let conn = test_db();
        let user_id = profile::create_user(&conn, "noa", 100).expect("user");
        assert_eq!(questionnaire_count(&conn, user_id).expect("empty"), 0);

        record_questionnaire(&conn, user_id, 4200.0, 150).expect("record");
        assert_eq!(questionnaire_count(&conn, user_id).expect("one"), 1);
    }
}
