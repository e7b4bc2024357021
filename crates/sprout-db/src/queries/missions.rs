//! Mission instance query functions: inserts, pool lookups, and the
//! guarded state transitions of the instance lifecycle.
//!
//! Every transition is a conditional UPDATE that only succeeds from the
//! expected prior state, so concurrent racers on the same instance
//! resolve to exactly one winner.

use chrono::NaiveDate;
use rusqlite::{Connection, Row};

use sprout_types::catalog::{Cadence, MissionTemplate};
use sprout_types::mission::{AssignedMission, MissionInstance};
use sprout_types::{InstanceId, TemplateId, UserId};

use crate::Result;

/// A mission instance to insert.
#[derive(Clone, Debug)]
pub struct NewInstance {
    pub user_id: UserId,
    pub template_id: TemplateId,
    pub cadence: Cadence,
    pub is_mandatory: bool,
    pub pool_date: NaiveDate,
    pub max_progress: i64,
    pub assigned_at: i64,
    pub expires_at: i64,
}

const JOINED_COLUMNS: &str = "um.id, um.user_id, um.challenge_id, um.cadence, um.is_mandatory, \
     um.pool_date, um.status, um.progress, um.max_progress, um.assigned_at, \
     um.accepted_at, um.completed_at, um.expires_at, um.last_check_in, \
     um.xp_earned, um.coins_earned, \
     c.id, c.title, c.description, c.category, c.kind, c.difficulty, \
     c.duration_days, c.cadence, c.xp_reward, c.coins_reward, c.co2_impact, c.is_active";

fn assigned_from_row(row: &Row) -> rusqlite::Result<AssignedMission> {
    let instance = MissionInstance {
        id: row.get(0)?,
        user_id: row.get(1)?,
        template_id: row.get(2)?,
        cadence: super::parse_cadence(3, &row.get::<_, String>(3)?)?,
        is_mandatory: row.get(4)?,
        pool_date: super::parse_date(5, &row.get::<_, String>(5)?)?,
        status: super::parse_status(6, &row.get::<_, String>(6)?)?,
        progress: row.get(7)?,
        max_progress: row.get(8)?,
        assigned_at: row.get(9)?,
        accepted_at: row.get(10)?,
        completed_at: row.get(11)?,
        expires_at: row.get(12)?,
        last_check_in: super::parse_date_opt(13, row.get(13)?)?,
        xp_earned: row.get(14)?,
        coins_earned: row.get(15)?,
    };
    let template = MissionTemplate {
        id: row.get(16)?,
        title: row.get(17)?,
        description: row.get(18)?,
        category: super::parse_category(19, &row.get::<_, String>(19)?)?,
        kind: super::parse_kind(20, &row.get::<_, String>(20)?)?,
        difficulty: super::parse_difficulty(21, &row.get::<_, String>(21)?)?,
        duration_days: row.get(22)?,
        cadence: super::parse_cadence(23, &row.get::<_, String>(23)?)?,
        xp_reward: row.get(24)?,
        coins_reward: row.get(25)?,
        co2_impact: row.get(26)?,
        is_active: row.get(27)?,
    };
    Ok(AssignedMission { instance, template })
}

/// Insert a mission instance.
///
/// Returns `None` if the insert was suppressed by the one-mandatory-
/// per-day unique index (a concurrent assignment already won).
pub fn insert(conn: &Connection, instance: &NewInstance) -> Result<Option<InstanceId>> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO user_missions
         (user_id, challenge_id, cadence, is_mandatory, pool_date,
          max_progress, assigned_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            instance.user_id,
            instance.template_id,
            instance.cadence.as_str(),
            instance.is_mandatory,
            instance.pool_date.to_string(),
            instance.max_progress,
            instance.assigned_at,
            instance.expires_at,
        ],
    )?;
    if inserted == 0 {
        return Ok(None);
    }
    Ok(Some(conn.last_insert_rowid()))
}

/// All instances for a (user, pool date, cadence), joined with their
/// templates. Mandatory first, then by instance id.
pub fn for_pool_date(
    conn: &Connection,
    user_id: UserId,
    pool_date: NaiveDate,
    cadence: Cadence,
) -> Result<Vec<AssignedMission>> {
    let sql = format!(
        "SELECT {JOINED_COLUMNS}
         FROM user_missions um
         JOIN challenges c ON um.challenge_id = c.id
         WHERE um.user_id = ?1 AND um.pool_date = ?2 AND um.cadence = ?3
         ORDER BY um.is_mandatory DESC, um.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            rusqlite::params![user_id, pool_date.to_string(), cadence.as_str()],
            assigned_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// How many instances exist for a (user, pool date, cadence). The
/// assignment idempotency pre-check.
pub fn count_for_pool_date(
    conn: &Connection,
    user_id: UserId,
    pool_date: NaiveDate,
    cadence: Cadence,
) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM user_missions
         WHERE user_id = ?1 AND pool_date = ?2 AND cadence = ?3",
        rusqlite::params![user_id, pool_date.to_string(), cadence.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Fetch an active instance owned by the caller, joined with its
/// template. Absent, foreign, and non-active instances all come back
/// as `None` so callers cannot tell them apart.
pub fn get_active_owned(
    conn: &Connection,
    user_id: UserId,
    instance_id: InstanceId,
) -> Result<Option<AssignedMission>> {
    let sql = format!(
        "SELECT {JOINED_COLUMNS}
         FROM user_missions um
         JOIN challenges c ON um.challenge_id = c.id
         WHERE um.id = ?1 AND um.user_id = ?2 AND um.status = 'active'"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(rusqlite::params![instance_id, user_id], assigned_from_row)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// Fetch an instance owned by the caller in any state. Absent and
/// foreign instances both come back as `None`.
pub fn get_owned(
    conn: &Connection,
    user_id: UserId,
    instance_id: InstanceId,
) -> Result<Option<AssignedMission>> {
    let sql = format!(
        "SELECT {JOINED_COLUMNS}
         FROM user_missions um
         JOIN challenges c ON um.challenge_id = c.id
         WHERE um.id = ?1 AND um.user_id = ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(rusqlite::params![instance_id, user_id], assigned_from_row)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// Distinct template ids assigned to the user on or after `since`.
/// Feeds the recency exclusion windows.
pub fn recent_template_ids(
    conn: &Connection,
    user_id: UserId,
    since: NaiveDate,
) -> Result<Vec<TemplateId>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT challenge_id FROM user_missions
         WHERE user_id = ?1 AND pool_date >= ?2",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![user_id, since.to_string()], |row| {
            row.get(0)
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Mark an optional pool instance accepted. Succeeds only for an
/// active, non-mandatory, not-yet-accepted instance owned by the user.
pub fn accept(
    conn: &Connection,
    user_id: UserId,
    instance_id: InstanceId,
    now: i64,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE user_missions SET accepted_at = ?1
         WHERE id = ?2 AND user_id = ?3 AND status = 'active'
           AND is_mandatory = 0 AND accepted_at IS NULL",
        rusqlite::params![now, instance_id, user_id],
    )?;
    Ok(updated == 1)
}

/// Record a daily check-in: bump progress and stamp the check-in date.
/// Succeeds only from `active` with a different (or absent) last
/// check-in date.
pub fn record_check_in(
    conn: &Connection,
    instance_id: InstanceId,
    day: NaiveDate,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE user_missions
         SET progress = progress + 1, last_check_in = ?1
         WHERE id = ?2 AND status = 'active'
           AND (last_check_in IS NULL OR last_check_in != ?1)",
        rusqlite::params![day.to_string(), instance_id],
    )?;
    Ok(updated == 1)
}

/// Transition `active` -> `completed`, snapshotting the rewards
/// actually granted. Returns false if a racer already left `active`.
pub fn mark_completed(
    conn: &Connection,
    instance_id: InstanceId,
    now: i64,
    xp_earned: i64,
    coins_earned: i64,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE user_missions
         SET status = 'completed', completed_at = ?1, xp_earned = ?2, coins_earned = ?3
         WHERE id = ?4 AND status = 'active'",
        rusqlite::params![now, xp_earned, coins_earned, instance_id],
    )?;
    Ok(updated == 1)
}

/// Transition `active` -> `skipped`. No rewards, no history entry.
pub fn mark_skipped(
    conn: &Connection,
    user_id: UserId,
    instance_id: InstanceId,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE user_missions SET status = 'skipped'
         WHERE id = ?1 AND user_id = ?2 AND status = 'active'",
        rusqlite::params![instance_id, user_id],
    )?;
    Ok(updated == 1)
}

/// Delete today's active, unaccepted, non-mandatory daily instances.
/// The only hard delete in the instance lifecycle (pool refresh).
pub fn delete_unaccepted_pool(
    conn: &Connection,
    user_id: UserId,
    pool_date: NaiveDate,
) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM user_missions
         WHERE user_id = ?1 AND cadence = 'daily' AND is_mandatory = 0
           AND pool_date = ?2 AND status = 'active' AND accepted_at IS NULL",
        rusqlite::params![user_id, pool_date.to_string()],
    )?;
    Ok(deleted)
}

/// The unaccepted optional pool for a day, joined with templates.
pub fn unaccepted_pool(
    conn: &Connection,
    user_id: UserId,
    pool_date: NaiveDate,
) -> Result<Vec<AssignedMission>> {
    let sql = format!(
        "SELECT {JOINED_COLUMNS}
         FROM user_missions um
         JOIN challenges c ON um.challenge_id = c.id
         WHERE um.user_id = ?1 AND um.cadence = 'daily' AND um.is_mandatory = 0
           AND um.pool_date = ?2 AND um.status = 'active' AND um.accepted_at IS NULL
         ORDER BY um.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            rusqlite::params![user_id, pool_date.to_string()],
            assigned_from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{catalog, profile};
    use sprout_types::catalog::{Category, Difficulty, MissionKind};

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn setup(conn: &Connection) -> (UserId, TemplateId) {
        let user_id = profile::create_user(conn, "casey", 100).expect("user");
        let template_id = catalog::insert(
            conn,
            &catalog::NewTemplate {
                title: "Lights off".into(),
                description: "Switch off unused lights".into(),
                category: Category::Energy,
                kind: MissionKind::RealAction,
                difficulty: Difficulty::Easy,
                duration_days: 1,
                cadence: Cadence::Daily,
                xp_reward: 10,
                coins_reward: 5,
                co2_impact: 0.15,
            },
            100,
        )
        .expect("template");
        (user_id, template_id)
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().expect("date literal")
    }

    fn new_instance(user_id: UserId, template_id: TemplateId, mandatory: bool) -> NewInstance {
        NewInstance {
            user_id,
            template_id,
            cadence: Cadence::Daily,
            is_mandatory: mandatory,
            pool_date: day("2025-03-10"),
            max_progress: 1,
            assigned_at: 1000,
            expires_at: 2000,
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let conn = test_db();
        let (user_id, template_id) = setup(&conn);

        insert(&conn, &new_instance(user_id, template_id, true)).expect("insert");
        let missions =
            for_pool_date(&conn, user_id, day("2025-03-10"), Cadence::Daily).expect("lookup");
        assert_eq!(missions.len(), 1);
        assert!(missions[0].instance.is_mandatory);
        assert_eq!(missions[0].template.title, "Lights off");
    }

    #[test]
    fn test_duplicate_mandatory_suppressed() {
        let conn = test_db();
        let (user_id, template_id) = setup(&conn);

        let first = insert(&conn, &new_instance(user_id, template_id, true)).expect("first");
        assert!(first.is_some());
        let second = insert(&conn, &new_instance(user_id, template_id, true)).expect("second");
        assert!(second.is_none(), "unique index should suppress the racer");

        let count =
            count_for_pool_date(&conn, user_id, day("2025-03-10"), Cadence::Daily).expect("count");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_accept_requires_optional_active_unaccepted() {
        let conn = test_db();
        let (user_id, template_id) = setup(&conn);

        let mandatory = insert(&conn, &new_instance(user_id, template_id, true))
            .expect("mandatory")
            .expect("id");
        assert!(!accept(&conn, user_id, mandatory, 1500).expect("mandatory rejected"));

        let optional = insert(&conn, &new_instance(user_id, template_id, false))
            .expect("optional")
            .expect("id");
        assert!(accept(&conn, user_id, optional, 1500).expect("accept"));
        assert!(!accept(&conn, user_id, optional, 1600).expect("second accept rejected"));
    }

    #[test]
    fn test_check_in_gated_per_day() {
        let conn = test_db();
        let (user_id, template_id) = setup(&conn);
        let id = insert(&conn, &new_instance(user_id, template_id, false))
            .expect("insert")
            .expect("id");

        assert!(record_check_in(&conn, id, day("2025-03-10")).expect("first"));
        assert!(!record_check_in(&conn, id, day("2025-03-10")).expect("same day blocked"));
        assert!(record_check_in(&conn, id, day("2025-03-11")).expect("next day"));

        let mission = get_active_owned(&conn, user_id, id)
            .expect("get")
            .expect("present");
        assert_eq!(mission.instance.progress, 2);
    }

    #[test]
    fn test_complete_only_once() {
        let conn = test_db();
        let (user_id, template_id) = setup(&conn);
        let id = insert(&conn, &new_instance(user_id, template_id, true))
            .expect("insert")
            .expect("id");

        assert!(mark_completed(&conn, id, 1500, 10, 5).expect("first"));
        assert!(!mark_completed(&conn, id, 1600, 10, 5).expect("second rejected"));
        assert!(get_active_owned(&conn, user_id, id)
            .expect("get")
            .is_none());
    }

    #[test]
    fn test_refresh_delete_spares_accepted_and_mandatory() {
        let conn = test_db();
        let (user_id, template_id) = setup(&conn);

        insert(&conn, &new_instance(user_id, template_id, true)).expect("mandatory");
        let accepted = insert(&conn, &new_instance(user_id, template_id, false))
            .expect("accepted")
            .expect("id");
        accept(&conn, user_id, accepted, 1500).expect("accept");
        insert(&conn, &new_instance(user_id, template_id, false)).expect("unaccepted");

        let deleted = delete_unaccepted_pool(&conn, user_id, day("2025-03-10")).expect("delete");
        assert_eq!(deleted, 1);

        let remaining =
            for_pool_date(&conn, user_id, day("2025-03-10"), Cadence::Daily).expect("lookup");
        assert_eq!(remaining.len(), 2);
    }
}
