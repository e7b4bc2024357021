//! User profile and progression command handlers.

use std::sync::Arc;

use serde_json::Value;
use sprout_db::queries::{history, preferences, profile};
use sprout_engine::calendar::Calendar;

use crate::rpc::RpcError;
use crate::DaemonState;

use super::{to_value, user_id, Result};

/// Create a user with an empty profile and preference row.
pub async fn create_user(state: &Arc<DaemonState>, params: &Value) -> Result {
    let display_name = params
        .get("display_name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("display_name required"))?;

    let db = state.db.lock().await;
    let id = profile::create_user(&db, display_name, state.calendar.now())
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;
    Ok(serde_json::json!({"user_id": id}))
}

/// Progression snapshot plus rank and next-level details.
pub async fn get_profile(state: &Arc<DaemonState>, params: &Value) -> Result {
    let uid = user_id(params)?;
    let db = state.db.lock().await;

    let progression = profile::get_progression(&db, uid)
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?
        .ok_or_else(|| RpcError::profile_not_found(uid))?;
    let next_level = profile::next_level(&db, progression.level)
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;

    let mut value = to_value(&progression)?;
    if let Value::Object(map) = &mut value {
        map.insert(
            "next_level".to_string(),
            serde_json::to_value(&next_level)
                .map_err(|e| RpcError::internal_error(&format!("encode: {e}")))?,
        );
    }
    Ok(value)
}

/// Preference snapshot.
pub async fn get_preferences(state: &Arc<DaemonState>, params: &Value) -> Result {
    let uid = user_id(params)?;
    let db = state.db.lock().await;
    let prefs = preferences::get_or_create(&db, uid, state.calendar.now())
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;
    to_value(&prefs)
}

/// Recent completion log, newest first.
pub async fn get_mission_history(state: &Arc<DaemonState>, params: &Value) -> Result {
    let uid = user_id(params)?;
    let limit = params
        .get("limit")
        .and_then(|v| v.as_u64())
        .unwrap_or(50)
        .min(500) as u32;

    let db = state.db.lock().await;
    let entries = history::recent(&db, uid, limit)
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;
    to_value(&entries)
}
