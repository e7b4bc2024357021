//! Badge and questionnaire command handlers.

use std::sync::Arc;

use serde_json::Value;
use sprout_db::queries::badges;
use sprout_engine::calendar::Calendar;
use sprout_engine::ledger;

use crate::events::Event;
use crate::rpc::RpcError;
use crate::DaemonState;

use super::{to_value, user_id, Result};

/// Badges the user has unlocked, newest first.
pub async fn get_badges(state: &Arc<DaemonState>, params: &Value) -> Result {
    let uid = user_id(params)?;
    let db = state.db.lock().await;
    let unlocked = badges::unlocked(&db, uid)
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;
    to_value(&unlocked)
}

/// Equip one badge, unequipping any other.
pub async fn equip_badge(state: &Arc<DaemonState>, params: &Value) -> Result {
    let uid = user_id(params)?;
    let badge_id = params
        .get("badge_id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| RpcError::invalid_params("badge_id required"))?;

    let db = state.db.lock().await;
    let equipped = badges::equip(&db, uid, badge_id)
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;
    if !equipped {
        return Err(RpcError::not_found());
    }
    Ok(serde_json::json!({"equipped": true}))
}

/// Record a finished footprint questionnaire and run a badge pass.
pub async fn record_questionnaire(state: &Arc<DaemonState>, params: &Value) -> Result {
    let uid = user_id(params)?;
    let total_footprint = params
        .get("total_footprint")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| RpcError::invalid_params("total_footprint required"))?;

    let unlocked = {
        let mut db = state.db.lock().await;
        ledger::record_questionnaire(&mut db, uid, total_footprint, &state.calendar)?
    };
    for badge in &unlocked {
        state.event_bus.emit(Event {
            event_type: "BadgeUnlocked".to_string(),
            timestamp: state.calendar.now().max(0) as u64,
            payload: serde_json::json!({
                "user_id": uid,
                "badge_id": badge.id,
                "name": badge.name,
            }),
        });
    }
    to_value(&unlocked)
}
