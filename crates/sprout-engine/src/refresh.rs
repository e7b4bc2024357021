//! Paid reroll of the unaccepted daily pool.

use rand::Rng;
use rusqlite::Connection;
use tracing::info;

use sprout_db::queries::{missions, preferences, profile, rewards};
use sprout_db::DbError;
use sprout_types::progression::{RefreshOutcome, RewardKind};
use sprout_types::{UserId, POOL_REFRESH_COST};

use crate::calendar::Calendar;
use crate::{assignment, EngineError, Result};

/// Debit the refresh cost, discard today's unaccepted optional
/// instances, and regenerate the pool — one transaction, so a failed
/// regeneration rolls the debit back too. Mandatory and accepted
/// missions are untouched.
pub fn refresh_daily_pool(
    conn: &mut Connection,
    user_id: UserId,
    cal: &impl Calendar,
    rng: &mut impl Rng,
) -> Result<RefreshOutcome> {
    let tx = conn.transaction().map_err(DbError::from)?;
    let now = cal.now();
    let today = cal.today();

    let available = profile::coins(&tx, user_id).map_err(|e| match e {
        DbError::NotFound(_) => EngineError::ProfileNotFound(user_id),
        other => EngineError::Db(other),
    })?;
    if available < POOL_REFRESH_COST {
        return Err(EngineError::InsufficientFunds {
            required: POOL_REFRESH_COST,
            available,
        });
    }

    let new_balance = profile::adjust_coins(&tx, user_id, -POOL_REFRESH_COST, now)?;
    rewards::append(
        &tx,
        user_id,
        RewardKind::Coins,
        "pool_refresh",
        -POOL_REFRESH_COST,
        "Daily pool refresh",
        now,
    )?;

    let discarded = missions::delete_unaccepted_pool(&tx, user_id, today)?;
    let added = assignment::fill_daily_pool(&tx, user_id, cal, rng)?;
    if added > 0 {
        preferences::record_assignment(&tx, user_id, added as i64, now)?;
    }

    let pool = missions::unaccepted_pool(&tx, user_id, today)?;
    tx.commit().map_err(DbError::from)?;

    info!(
        user = user_id,
        discarded,
        added,
        balance = new_balance,
        "daily pool refreshed"
    );
    Ok(RefreshOutcome { pool, new_balance })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sprout_db::seed;
    use sprout_types::DAILY_POOL_SIZE;

    use crate::calendar::FixedCalendar;
    use crate::tracker;

    fn day(s: &str) -> NaiveDate {
        s.parse().expect("date literal")
    }

    fn setup() -> (Connection, UserId, FixedCalendar) {
        let conn = sprout_db::open_memory().expect("open");
        seed::install_defaults(&conn, 100).expect("seed");
        let user_id = profile::create_user(&conn, "remy", 100).expect("user");
        (conn, user_id, FixedCalendar::at(day("2025-03-12")))
    }

    #[test]
    fn test_refresh_debits_and_replaces_pool() {
        let (mut conn, user_id, cal) = setup();
        let mut rng = StdRng::seed_from_u64(1);

        profile::adjust_coins(&conn, user_id, 25, 100).expect("fund");
        let board = tracker::today_board(&mut conn, user_id, &cal, &mut rng).expect("board");
        let old_ids: Vec<_> = board.pool.iter().map(|m| m.instance.id).collect();
        let mandatory_id = board.mandatory.expect("mandatory").instance.id;

        let outcome = refresh_daily_pool(&mut conn, user_id, &cal, &mut rng).expect("refresh");
        assert_eq!(outcome.new_balance, 5);
        assert_eq!(outcome.pool.len(), DAILY_POOL_SIZE);
        for mission in &outcome.pool {
            assert!(!old_ids.contains(&mission.instance.id));
        }

        // The mandatory slot survives the reroll.
        let after = tracker::today_board(&mut conn, user_id, &cal, &mut rng).expect("after");
        assert_eq!(after.mandatory.expect("mandatory").instance.id, mandatory_id);
    }

    #[test]
    fn test_refresh_requires_balance() {
        let (mut conn, user_id, cal) = setup();
        let mut rng = StdRng::seed_from_u64(2);

        profile::adjust_coins(&conn, user_id, 19, 100).expect("fund");
        tracker::today_board(&mut conn, user_id, &cal, &mut rng).expect("board");

        let before = missions::unaccepted_pool(&conn, user_id, cal.today()).expect("pool");
        assert!(matches!(
            refresh_daily_pool(&mut conn, user_id, &cal, &mut rng),
            Err(EngineError::InsufficientFunds {
                required: POOL_REFRESH_COST,
                available: 19,
            })
        ));
        // Nothing changed: same pool, same balance.
        assert_eq!(profile::coins(&conn, user_id).expect("coins"), 19);
        let after = missions::unaccepted_pool(&conn, user_id, cal.today()).expect("pool");
        assert_eq!(
            before.iter().map(|m| m.instance.id).collect::<Vec<_>>(),
            after.iter().map(|m| m.instance.id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_refresh_spares_accepted_missions() {
        let (mut conn, user_id, cal) = setup();
        let mut rng = StdRng::seed_from_u64(3);

        profile::adjust_coins(&conn, user_id, 100, 100).expect("fund");
        let board = tracker::today_board(&mut conn, user_id, &cal, &mut rng).expect("board");
        let kept = board.pool[0].instance.id;
        tracker::accept(&conn, user_id, kept, &cal).expect("accept");

        let outcome = refresh_daily_pool(&mut conn, user_id, &cal, &mut rng).expect("refresh");
        // Accepted instance still counts toward the pool target, so
        // only the open slots are refilled.
        assert_eq!(outcome.pool.len(), DAILY_POOL_SIZE - 1);

        let after = tracker::today_board(&mut conn, user_id, &cal, &mut rng).expect("after");
        assert!(after.pool.iter().any(|m| m.instance.id == kept));
    }

    #[test]
    fn test_missing_profile() {
        let (mut conn, _, cal) = setup();
        let mut rng = StdRng::seed_from_u64(4);
        assert!(matches!(
            refresh_daily_pool(&mut conn, 999, &cal, &mut rng),
            Err(EngineError::ProfileNotFound(999))
        ));
    }
}
