//! Progression ledger: the single authoritative completion routine.
//!
//! Every mission completion flows through [`apply_completion`] inside
//! one SQLite transaction, so XP, coins, streak, rank, badges, history
//! and preference counters can never drift apart. The conditional
//! `active -> completed` transition at the top doubles as the
//! at-most-one-completion guard: a racer that loses it sees the whole
//! routine abort with `NotFound` and no partial effects.

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::{debug, info};

use sprout_db::queries::{badges, history, missions, preferences, profile, rewards};
use sprout_types::badge::{Badge, BadgeStats};
use sprout_types::mission::AssignedMission;
use sprout_types::progression::{CompletionRewards, Progression, RewardKind, XpGrant};
use sprout_types::UserId;

use crate::calendar::Calendar;
use crate::{EngineError, Result};

fn progression(conn: &Connection, user_id: UserId) -> Result<Progression> {
    profile::get_progression(conn, user_id)?.ok_or(EngineError::ProfileNotFound(user_id))
}

/// Grant XP, recompute the level, and append a ledger entry. A level
/// increase also pays out the reached level's coin bonus.
pub(crate) fn grant_xp(
    conn: &Connection,
    user_id: UserId,
    amount: i64,
    source: &str,
    description: &str,
    now: i64,
) -> Result<XpGrant> {
    let prog = progression(conn, user_id)?;
    let new_experience = prog.experience + amount;
    // Level never decreases, whatever the configured thresholds say.
    let new_level = profile::level_for_experience(conn, new_experience)?.max(prog.level);
    profile::set_level_experience(conn, user_id, new_level, new_experience, now)?;
    rewards::append(conn, user_id, RewardKind::Xp, source, amount, description, now)?;

    let leveled_up = new_level > prog.level;
    if leveled_up {
        info!(user = user_id, level = new_level, "level up");
        if let Some(tier) = profile::level_tier(conn, new_level)? {
            if tier.coins_reward > 0 {
                grant_coins(
                    conn,
                    user_id,
                    tier.coins_reward,
                    "level_up",
                    &format!("Reached level {new_level}"),
                    now,
                )?;
            }
        }
    }
    Ok(XpGrant {
        new_experience,
        new_level,
        leveled_up,
    })
}

/// Credit coins and append a ledger entry. Returns the new balance.
pub(crate) fn grant_coins(
    conn: &Connection,
    user_id: UserId,
    amount: i64,
    source: &str,
    description: &str,
    now: i64,
) -> Result<i64> {
    let balance = profile::adjust_coins(conn, user_id, amount, now)?;
    rewards::append(conn, user_id, RewardKind::Coins, source, amount, description, now)?;
    Ok(balance)
}

/// Evaluate every active badge the user has not unlocked yet and
/// unlock the satisfied ones, paying their bonuses. Bonus grants do
/// not re-trigger evaluation; callers wanting another look run a
/// second pass explicitly.
pub(crate) fn evaluate_badges(
    conn: &Connection,
    user_id: UserId,
    now: i64,
) -> Result<Vec<Badge>> {
    let prog = progression(conn, user_id)?;
    let stats = BadgeStats {
        missions_completed: prog.total_missions_completed,
        level: prog.level,
        streak_days: prog.streak_days,
        questionnaires_completed: history::questionnaire_count(conn, user_id)?,
    };

    let mut unlocked = Vec::new();
    for badge in badges::locked_active(conn, user_id)? {
        if !badge.condition.is_met(&stats) {
            continue;
        }
        // The UNIQUE row is the exactly-once guard; a false here means
        // a racer beat us and already paid the bonus.
        if !badges::unlock(conn, user_id, badge.id, now)? {
            continue;
        }
        debug!(user = user_id, badge = %badge.name, "badge unlocked");
        if badge.xp_bonus > 0 {
            grant_xp(conn, user_id, badge.xp_bonus, "badge_unlocked", &badge.name, now)?;
        }
        if badge.coins_bonus > 0 {
            grant_coins(conn, user_id, badge.coins_bonus, "badge_unlocked", &badge.name, now)?;
        }
        unlocked.push(badge);
    }
    Ok(unlocked)
}

/// Apply the streak law for an activity on `today` and return the new
/// streak: unset starts at 1, same day is unchanged, the next day
/// increments, a gap resets to 1.
pub(crate) fn update_streak(
    conn: &Connection,
    user_id: UserId,
    today: NaiveDate,
    now: i64,
) -> Result<i64> {
    let prog = progression(conn, user_id)?;
    let streak = match prog.last_activity_date {
        Some(last) if last == today => return Ok(prog.streak_days),
        Some(last) if (today - last).num_days() == 1 => prog.streak_days + 1,
        Some(_) => 1,
        None => 1,
    };
    profile::set_streak(conn, user_id, streak, today, now)?;
    Ok(streak)
}

/// The completion routine. Must run inside the caller's transaction;
/// takes the instance as fetched within that same transaction.
pub(crate) fn apply_completion(
    conn: &Connection,
    user_id: UserId,
    mission: &AssignedMission,
    cal: &impl Calendar,
) -> Result<CompletionRewards> {
    let now = cal.now();
    let today = cal.today();
    let template = &mission.template;

    if !missions::mark_completed(
        conn,
        mission.instance.id,
        now,
        template.xp_reward,
        template.coins_reward,
    )? {
        return Err(EngineError::NotFound);
    }

    history::append(
        conn,
        user_id,
        template.id,
        now,
        template.xp_reward,
        template.coins_reward,
        template.co2_impact,
    )?;
    profile::increment_missions_completed(conn, user_id, now)?;
    preferences::record_completion(conn, user_id, template.category, now)?;

    let grant = grant_xp(
        conn,
        user_id,
        template.xp_reward,
        "mission_completed",
        &template.title,
        now,
    )?;
    grant_coins(
        conn,
        user_id,
        template.coins_reward,
        "mission_completed",
        &template.title,
        now,
    )?;

    let mut new_badges = evaluate_badges(conn, user_id, now)?;
    let new_streak = update_streak(conn, user_id, today, now)?;
    // Streak movement can satisfy streak badges; one extra pass only.
    new_badges.extend(evaluate_badges(conn, user_id, now)?);

    let prog = progression(conn, user_id)?;
    let new_rank = profile::best_rank(conn, prog.level, prog.total_missions_completed)?;
    profile::set_rank(conn, user_id, &new_rank, now)?;

    info!(
        user = user_id,
        template = template.id,
        xp = template.xp_reward,
        coins = template.coins_reward,
        badges = new_badges.len(),
        "mission completed"
    );

    Ok(CompletionRewards {
        xp: template.xp_reward,
        coins: template.coins_reward,
        co2_saved: template.co2_impact,
        leveled_up: grant.leveled_up,
        new_level: grant.new_level,
        new_streak,
        new_rank,
        new_badges,
    })
}

/// Record a finished footprint questionnaire and run a badge pass, as
/// one transaction.
pub fn record_questionnaire(
    conn: &mut Connection,
    user_id: UserId,
    total_footprint: f64,
    cal: &impl Calendar,
) -> Result<Vec<Badge>> {
    let tx = conn.transaction().map_err(sprout_db::DbError::from)?;
    progression(&tx, user_id)?;
    history::record_questionnaire(&tx, user_id, total_footprint, cal.now())?;
    let unlocked = evaluate_badges(&tx, user_id, cal.now())?;
    tx.commit().map_err(sprout_db::DbError::from)?;
    Ok(unlocked)
}
