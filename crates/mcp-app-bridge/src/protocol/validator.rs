//! Params decoding for dispatched methods.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::types::{BridgeError, BridgeResult};

/// Decode `params` into the method's params type.
///
/// Missing params are treated as `{}` so all-optional param types decode.
/// Any mismatch is an invalid-params error naming the method.
pub fn decode_params<T: DeserializeOwned>(method: &str, params: Option<Value>) -> BridgeResult<T> {
    let params = match params {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(value) => value,
    };
    serde_json::from_value(params).map_err(|e| BridgeError::InvalidParams(format!("{method}: {e}")))
}
