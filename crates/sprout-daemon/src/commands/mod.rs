//! IPC command handlers.
//!
//! Each submodule implements the commands for one RPC category.

pub mod gamification;
pub mod missions;
pub mod profile;
pub mod system;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;

use crate::rpc::RpcError;

type Result = std::result::Result<Value, RpcError>;

/// Extract the required `user_id` parameter.
fn user_id(params: &Value) -> std::result::Result<i64, RpcError> {
    params
        .get("user_id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| RpcError::invalid_params("user_id required"))
}

/// Extract the required `instance_id` parameter.
fn instance_id(params: &Value) -> std::result::Result<i64, RpcError> {
    params
        .get("instance_id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| RpcError::invalid_params("instance_id required"))
}

/// Serialize a handler result into a JSON value.
fn to_value<T: serde::Serialize>(value: &T) -> Result {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&format!("encode: {e}")))
}

/// A fresh OS-seeded RNG. `ThreadRng` is not `Send`, so handlers that
/// cross an await point use this instead.
fn new_rng() -> StdRng {
    StdRng::from_entropy()
}
