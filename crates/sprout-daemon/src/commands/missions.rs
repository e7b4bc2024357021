//! Mission board and lifecycle command handlers.

use std::sync::Arc;

use serde_json::Value;
use sprout_engine::{refresh, tracker};
use sprout_types::progression::CompletionRewards;

use crate::events::Event;
use crate::DaemonState;

use super::{instance_id, new_rng, to_value, user_id, Result};

fn now_secs(state: &DaemonState) -> u64 {
    use sprout_engine::calendar::Calendar;
    state.calendar.now().max(0) as u64
}

/// Emit the progression events a completion produced.
fn emit_completion_events(state: &DaemonState, user_id: i64, rewards: &CompletionRewards) {
    let timestamp = now_secs(state);
    state.event_bus.emit(Event {
        event_type: "MissionCompleted".to_string(),
        timestamp,
        payload: serde_json::json!({
            "user_id": user_id,
            "xp": rewards.xp,
            "coins": rewards.coins,
            "co2_saved": rewards.co2_saved,
        }),
    });
    if rewards.leveled_up {
        state.event_bus.emit(Event {
            event_type: "LevelUp".to_string(),
            timestamp,
            payload: serde_json::json!({
                "user_id": user_id,
                "level": rewards.new_level,
            }),
        });
    }
    for badge in &rewards.new_badges {
        state.event_bus.emit(Event {
            event_type: "BadgeUnlocked".to_string(),
            timestamp,
            payload: serde_json::json!({
                "user_id": user_id,
                "badge_id": badge.id,
                "name": badge.name,
            }),
        });
    }
}

/// Get today's mission board, assigning it if needed.
pub async fn get_today_missions(state: &Arc<DaemonState>, params: &Value) -> Result {
    let uid = user_id(params)?;
    let mut rng = new_rng();
    let mut db = state.db.lock().await;
    let board = tracker::today_board(&mut db, uid, &state.calendar, &mut rng)?;
    to_value(&board)
}

/// Get this week's mission board, assigning it if needed.
pub async fn get_weekly_missions(state: &Arc<DaemonState>, params: &Value) -> Result {
    let uid = user_id(params)?;
    let mut rng = new_rng();
    let mut db = state.db.lock().await;
    let board = tracker::weekly_board(&mut db, uid, &state.calendar, &mut rng)?;
    to_value(&board)
}

/// Opt into an optional pool mission.
pub async fn accept_mission(state: &Arc<DaemonState>, params: &Value) -> Result {
    let uid = user_id(params)?;
    let iid = instance_id(params)?;
    let db = state.db.lock().await;
    tracker::accept(&db, uid, iid, &state.calendar)?;
    Ok(serde_json::json!({"accepted": true}))
}

/// Daily progress increment; completes the mission when the target is
/// reached.
pub async fn check_in(state: &Arc<DaemonState>, params: &Value) -> Result {
    let uid = user_id(params)?;
    let iid = instance_id(params)?;
    let outcome = {
        let mut db = state.db.lock().await;
        tracker::check_in(&mut db, uid, iid, &state.calendar)?
    };
    if let Some(rewards) = &outcome.rewards {
        emit_completion_events(state, uid, rewards);
    }
    to_value(&outcome)
}

/// Manual one-shot completion.
pub async fn complete_mission(state: &Arc<DaemonState>, params: &Value) -> Result {
    let uid = user_id(params)?;
    let iid = instance_id(params)?;
    let rewards = {
        let mut db = state.db.lock().await;
        tracker::complete(&mut db, uid, iid, &state.calendar)?
    };
    emit_completion_events(state, uid, &rewards);
    to_value(&rewards)
}

/// Skip an active mission.
pub async fn skip_mission(state: &Arc<DaemonState>, params: &Value) -> Result {
    let uid = user_id(params)?;
    let iid = instance_id(params)?;
    let db = state.db.lock().await;
    tracker::skip(&db, uid, iid)?;
    Ok(serde_json::json!({"skipped": true}))
}

/// Paid reroll of the unaccepted daily pool.
pub async fn refresh_daily_pool(state: &Arc<DaemonState>, params: &Value) -> Result {
    let uid = user_id(params)?;
    let outcome = {
        let mut rng = new_rng();
        let mut db = state.db.lock().await;
        refresh::refresh_daily_pool(&mut db, uid, &state.calendar, &mut rng)?
    };
    state.event_bus.emit(Event {
        event_type: "PoolRefreshed".to_string(),
        timestamp: now_secs(state),
        payload: serde_json::json!({
            "user_id": uid,
            "new_balance": outcome.new_balance,
        }),
    });
    to_value(&outcome)
}
