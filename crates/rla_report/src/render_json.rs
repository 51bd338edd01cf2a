//! render_json.rs: machine-readable summary.
//!
//! The model is converted to a `serde_json::Value` (non-finite floats become
//! `null`), stamped with `result_sha256` over the canonical bytes of the
//! unstamped value, and emitted as canonical JSON (sorted keys, compact).

use rla_io::canonical_json::to_canonical_json_bytes;
use rla_io::hasher::sha256_canonical;
use serde_json::Value;

use crate::{ReportError, RunModel};

/// Model → JSON value including its own digest.
pub fn render_json(model: &RunModel) -> Result<Value, ReportError> {
    let mut value = serde_json::to_value(model).map_err(|e| ReportError::Json(e.to_string()))?;
    let digest = sha256_canonical(&value).map_err(|e| ReportError::Hash(e.to_string()))?;
    if let Value::Object(map) = &mut value {
        map.insert("result_sha256".to_string(), Value::String(digest));
    }
    Ok(value)
}

/// Canonical bytes of `render_json`.
pub fn render_json_bytes(model: &RunModel) -> Result<Vec<u8>, ReportError> {
    Ok(to_canonical_json_bytes(&render_json(model)?))
}
