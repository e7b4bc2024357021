//! Event subscription and daemon status handlers.
//!
//! Subscriptions are pull-based over the request/response socket: a
//! client subscribes with an optional filter, then polls for the events
//! buffered since its last poll.

use std::sync::Arc;

use rand::Rng;
use serde_json::Value;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::warn;

use crate::events::{EventFilter, EventSubscription};
use crate::rpc::RpcError;
use crate::DaemonState;

use super::{new_rng, Result};

/// Register an event subscription. Events emitted from now on are
/// buffered for it until polled or unsubscribed.
pub async fn subscribe_events(state: &Arc<DaemonState>, params: &Value) -> Result {
    let filter = match params.get("filter") {
        Some(v) => serde_json::from_value::<EventFilter>(v.clone())
            .map_err(|e| RpcError::invalid_params(&format!("filter: {e}")))?,
        None => EventFilter::default(),
    };

    let subscription_id = format!("{:032x}", new_rng().gen::<u128>());
    let subscription = EventSubscription {
        filter,
        receiver: state.event_bus.subscribe(),
    };
    state
        .subscriptions
        .lock()
        .await
        .insert(subscription_id.clone(), subscription);

    Ok(serde_json::json!({"subscription_id": subscription_id}))
}

/// Drain the events buffered for a subscription, filtered.
pub async fn poll_events(state: &Arc<DaemonState>, params: &Value) -> Result {
    let subscription_id = params
        .get("subscription_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("subscription_id required"))?;

    let mut subscriptions = state.subscriptions.lock().await;
    let subscription = subscriptions
        .get_mut(subscription_id)
        .ok_or_else(RpcError::not_found)?;

    let mut events = Vec::new();
    loop {
        match subscription.receiver.try_recv() {
            Ok(event) => {
                if subscription.filter.matches(&event) {
                    events.push(event);
                }
            }
            Err(TryRecvError::Lagged(missed)) => {
                warn!(subscription_id, missed, "event subscription lagged");
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }

    super::to_value(&events)
}

/// Drop an event subscription.
pub async fn unsubscribe_events(state: &Arc<DaemonState>, params: &Value) -> Result {
    let subscription_id = params
        .get("subscription_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("subscription_id required"))?;

    let removed = state
        .subscriptions
        .lock()
        .await
        .remove(subscription_id)
        .is_some();
    Ok(serde_json::json!({"unsubscribed": removed}))
}

/// Daemon liveness and version snapshot.
pub async fn get_status(state: &Arc<DaemonState>, _params: &Value) -> Result {
    Ok(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "events_emitted": state.event_bus.sequence(),
    }))
}
