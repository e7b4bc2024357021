//! Mission instance tracker: board views and lifecycle transitions.
//!
//! Boards are fetch-or-assign: reading today's missions lazily runs
//! the assignment engine when no instances exist for the current
//! period. All mutating transitions lean on the conditional UPDATEs in
//! the query layer, so a losing racer surfaces as a domain error, not
//! a double effect.

use rand::Rng;
use rusqlite::Connection;

use sprout_db::queries::{missions, profile};
use sprout_types::catalog::Cadence;
use sprout_types::mission::{DailyBoard, MissionStatus, WeeklyBoard};
use sprout_types::progression::{CheckInOutcome, CompletionRewards};
use sprout_types::{InstanceId, UserId};

use crate::calendar::Calendar;
use crate::{assignment, ledger, EngineError, Result};

fn require_profile(conn: &Connection, user_id: UserId) -> Result<()> {
    if profile::get_progression(conn, user_id)?.is_none() {
        return Err(EngineError::ProfileNotFound(user_id));
    }
    Ok(())
}

/// Today's board, assigning it first if it does not exist yet.
pub fn today_board(
    conn: &mut Connection,
    user_id: UserId,
    cal: &impl Calendar,
    rng: &mut impl Rng,
) -> Result<DailyBoard> {
    require_profile(conn, user_id)?;

    let tx = conn.transaction().map_err(sprout_db::DbError::from)?;
    assignment::ensure_daily(&tx, user_id, cal, rng)?;
    tx.commit().map_err(sprout_db::DbError::from)?;

    let board = missions::for_pool_date(conn, user_id, cal.today(), Cadence::Daily)?;
    let (mandatory, pool): (Vec<_>, Vec<_>) =
        board.into_iter().partition(|m| m.instance.is_mandatory);

    let expires_at = cal.day_end();
    Ok(DailyBoard {
        mandatory: mandatory.into_iter().next(),
        pool,
        expires_at,
        hours_remaining: (expires_at - cal.now()).max(0) / 3600,
    })
}

/// This week's board, assigning it first if it does not exist yet.
pub fn weekly_board(
    conn: &mut Connection,
    user_id: UserId,
    cal: &impl Calendar,
    rng: &mut impl Rng,
) -> Result<WeeklyBoard> {
    require_profile(conn, user_id)?;

    let tx = conn.transaction().map_err(sprout_db::DbError::from)?;
    assignment::ensure_weekly(&tx, user_id, cal, rng)?;
    tx.commit().map_err(sprout_db::DbError::from)?;

    let pool = missions::for_pool_date(conn, user_id, cal.week_start(), Cadence::Weekly)?;
    let expires_at = cal.week_end();
    Ok(WeeklyBoard {
        pool,
        expires_at,
        days_remaining: (expires_at - cal.now()).max(0) / 86_400,
    })
}

/// Opt into an optional pool mission.
pub fn accept(
    conn: &Connection,
    user_id: UserId,
    instance_id: InstanceId,
    cal: &impl Calendar,
) -> Result<()> {
    if missions::accept(conn, user_id, instance_id, cal.now())? {
        Ok(())
    } else {
        Err(EngineError::NotFound)
    }
}

/// One daily progress increment on a multi-day mission. Reaching the
/// target completes the mission in the same transaction and returns
/// the rewards.
pub fn check_in(
    conn: &mut Connection,
    user_id: UserId,
    instance_id: InstanceId,
    cal: &impl Calendar,
) -> Result<CheckInOutcome> {
    let tx = conn.transaction().map_err(sprout_db::DbError::from)?;

    let Some(mission) = missions::get_owned(&tx, user_id, instance_id)? else {
        return Err(EngineError::NotFound);
    };
    if mission.instance.status != MissionStatus::Active {
        return Err(EngineError::InvalidState);
    }
    let today = cal.today();
    if mission.instance.last_check_in == Some(today) {
        return Err(EngineError::AlreadyDone);
    }
    if !missions::record_check_in(&tx, instance_id, today)? {
        // A racer stamped today first.
        return Err(EngineError::AlreadyDone);
    }

    let progress = mission.instance.progress + 1;
    let target = mission.instance.max_progress;
    let rewards = if progress >= target {
        Some(ledger::apply_completion(&tx, user_id, &mission, cal)?)
    } else {
        None
    };
    tx.commit().map_err(sprout_db::DbError::from)?;

    Ok(CheckInOutcome {
        progress,
        target,
        completed: rewards.is_some(),
        rewards,
    })
}

/// Manual one-shot completion, regardless of progress.
pub fn complete(
    conn: &mut Connection,
    user_id: UserId,
    instance_id: InstanceId,
    cal: &impl Calendar,
) -> Result<CompletionRewards> {
    let tx = conn.transaction().map_err(sprout_db::DbError::from)?;
    let Some(mission) = missions::get_active_owned(&tx, user_id, instance_id)? else {
        return Err(EngineError::NotFound);
    };
    let rewards = ledger::apply_completion(&tx, user_id, &mission, cal)?;
    tx.commit().map_err(sprout_db::DbError::from)?;
    Ok(rewards)
}

/// Skip an active mission. No rewards, no history entry.
pub fn skip(conn: &Connection, user_id: UserId, instance_id: InstanceId) -> Result<()> {
    if missions::mark_skipped(conn, user_id, instance_id)? {
        Ok(())
    } else {
        Err(EngineError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sprout_db::queries::catalog;
    use sprout_db::seed;
    use sprout_types::catalog::{Category, Difficulty, MissionKind};
    use sprout_types::DAILY_POOL_SIZE;

    use crate::calendar::FixedCalendar;

    fn day(s: &str) -> NaiveDate {
        s.parse().expect("date literal")
    }

    fn setup() -> (Connection, UserId, FixedCalendar) {
        let conn = sprout_db::open_memory().expect("open");
        seed::install_defaults(&conn, 100).expect("seed");
        let user_id = profile::create_user(&conn, "juno", 100).expect("user");
        (conn, user_id, FixedCalendar::at(day("2025-03-12")))
    }

    #[test]
    fn test_today_board_assigns_lazily() {
        let (mut conn, user_id, cal) = setup();
        let mut rng = StdRng::seed_from_u64(1);

        let board = today_board(&mut conn, user_id, &cal, &mut rng).expect("board");
        assert!(board.mandatory.is_some());
        assert_eq!(board.pool.len(), DAILY_POOL_SIZE);
        assert_eq!(board.hours_remaining, 12);

        let again = today_board(&mut conn, user_id, &cal, &mut rng).expect("again");
        assert_eq!(
            again.mandatory.map(|m| m.instance.id),
            board.mandatory.map(|m| m.instance.id)
        );
    }

    #[test]
    fn test_board_requires_profile() {
        let (mut conn, _, cal) = setup();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            today_board(&mut conn, 999, &cal, &mut rng),
            Err(EngineError::ProfileNotFound(999))
        ));
    }

    #[test]
    fn test_accept_then_complete() {
        let (mut conn, user_id, cal) = setup();
        let mut rng = StdRng::seed_from_u64(2);

        let board = today_board(&mut conn, user_id, &cal, &mut rng).expect("board");
        let optional = board.pool[0].instance.id;

        accept(&conn, user_id, optional, &cal).expect("accept");
        assert!(matches!(
            accept(&conn, user_id, optional, &cal),
            Err(EngineError::NotFound)
        ));

        let rewards = complete(&mut conn, user_id, optional, &cal).expect("complete");
        assert!(rewards.xp > 0);
        assert!(matches!(
            complete(&mut conn, user_id, optional, &cal),
            Err(EngineError::NotFound)
        ));
    }

    #[test]
    fn test_foreign_instance_is_not_found() {
        let (mut conn, user_id, cal) = setup();
        let mut rng = StdRng::seed_from_u64(3);
        let other = profile::create_user(&conn, "rook", 100).expect("other user");

        let board = today_board(&mut conn, user_id, &cal, &mut rng).expect("board");
        let mission = board.pool[0].instance.id;

        assert!(matches!(
            accept(&conn, other, mission, &cal),
            Err(EngineError::NotFound)
        ));
        assert!(matches!(
            complete(&mut conn, other, mission, &cal),
            Err(EngineError::NotFound)
        ));
        assert!(matches!(skip(&conn, other, mission), Err(EngineError::NotFound)));
    }

    #[test]
    fn test_skip_grants_nothing() {
        let (mut conn, user_id, cal) = setup();
        let mut rng = StdRng::seed_from_u64(4);

        let board = today_board(&mut conn, user_id, &cal, &mut rng).expect("board");
        let mission = board.pool[0].instance.id;

        skip(&conn, user_id, mission).expect("skip");
        assert_eq!(profile::coins(&conn, user_id).expect("coins"), 0);
        assert_eq!(
            sprout_db::queries::history::completion_count(&conn, user_id).expect("history"),
            0
        );
        assert!(matches!(skip(&conn, user_id, mission), Err(EngineError::NotFound)));
    }

    fn weekly_instance(conn: &Connection, user_id: UserId, cal: &FixedCalendar) -> InstanceId {
        let template_id = catalog::insert(
            conn,
            &catalog::NewTemplate {
                title: "Bike week".into(),
                description: "Cycle every day".into(),
                category: Category::Transport,
                kind: MissionKind::RealAction,
                difficulty: Difficulty::Hard,
                duration_days: 7,
                cadence: Cadence::Weekly,
                xp_reward: 150,
                coins_reward: 80,
                co2_impact: 15.0,
            },
            100,
        )
        .expect("template");
        missions::insert(
            conn,
            &missions::NewInstance {
                user_id,
                template_id,
                cadence: Cadence::Weekly,
                is_mandatory: false,
                pool_date: cal.week_start(),
                max_progress: 7,
                assigned_at: cal.now(),
                expires_at: cal.week_end(),
            },
        )
        .expect("insert")
        .expect("id")
    }

    #[test]
    fn test_check_in_gated_per_calendar_day() {
        let (mut conn, user_id, cal) = setup();
        let instance = weekly_instance(&conn, user_id, &cal);

        let outcome = check_in(&mut conn, user_id, instance, &cal).expect("first");
        assert_eq!(outcome.progress, 1);
        assert_eq!(outcome.target, 7);
        assert!(!outcome.completed);

        assert!(matches!(
            check_in(&mut conn, user_id, instance, &cal),
            Err(EngineError::AlreadyDone)
        ));

        let mut next_day = cal;
        next_day.advance_days(1);
        let outcome = check_in(&mut conn, user_id, instance, &next_day).expect("next day");
        assert_eq!(outcome.progress, 2);
    }

    #[test]
    fn test_final_check_in_completes_with_rewards() {
        let (mut conn, user_id, cal) = setup();
        let instance = weekly_instance(&conn, user_id, &cal);

        let mut clock = cal;
        for expected in 1..=6 {
            let outcome = check_in(&mut conn, user_id, instance, &clock).expect("check-in");
            assert_eq!(outcome.progress, expected);
            assert!(!outcome.completed);
            clock.advance_days(1);
        }

        let outcome = check_in(&mut conn, user_id, instance, &clock).expect("final");
        assert_eq!(outcome.progress, 7);
        assert!(outcome.completed);
        let rewards = outcome.rewards.expect("rewards");
        assert_eq!(rewards.xp, 150);
        assert_eq!(rewards.coins, 80);
        assert_eq!(
            sprout_db::queries::history::completion_count(&conn, user_id).expect("history"),
            1
        );

        assert!(matches!(
            check_in(&mut conn, user_id, instance, &clock),
            Err(EngineError::InvalidState)
        ));
    }
}
