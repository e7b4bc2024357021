//! Append-only reward ledger.

use rusqlite::Connection;

use sprout_types::progression::{RewardEntry, RewardKind};
use sprout_types::UserId;

use crate::Result;

/// Append one ledger row. Never updates; balances live on the profile.
pub fn append(
    conn: &Connection,
    user_id: UserId,
    kind: RewardKind,
    source: &str,
    amount: i64,
    description: &str,
    now: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO rewards_history
         (user_id, reward_type, reward_source, amount, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![user_id, kind.as_str(), source, amount, description, now],
    )?;
    Ok(())
}

/// Recent ledger rows, newest first.
pub fn recent(conn: &Connection, user_id: UserId, limit: u32) -> Result<Vec<RewardEntry>> {
    let mut stmt = conn.prepare(
        "SELECT reward_type, reward_source, amount, description, created_at
         FROM rewards_history
         WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![user_id, limit], |row| {
            let kind_text: String = row.get(0)?;
            let kind = match kind_text.as_str() {
                "xp" => RewardKind::Xp,
                "coins" => RewardKind::Coins,
                other => return Err(super::bad_text(0, "reward kind", other)),
            };
            Ok(RewardEntry {
                kind,
                source: row.get(1)?,
                amount: row.get(2)?,
                description: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::profile;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_append_and_recent() {
        let conn = test_db();
        let user_id = profile::create_user(&conn, "ada", 100).expect("user");

        append(&conn, user_id, RewardKind::Xp, "mission_completed", 20, "Meat-free day", 150)
            .expect("xp row");
        append(&conn, user_id, RewardKind::Coins, "level_up", 50, "Reached level 2", 160)
            .expect("coins row");
        append(&conn, user_id, RewardKind::Coins, "pool_refresh", -20, "Daily pool refresh", 170)
            .expect("debit row");

        let rows = recent(&conn, user_id, 2).expect("recent");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, RewardKind::Coins);
        assert_eq!(rows[0].amount, -20);
        assert_eq!(rows[1].source, "level_up");
    }
}
