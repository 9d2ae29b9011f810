use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use serde_json::{Map, Value};

// Canonical form used for audit hashing:
// - keys sorted lexicographically at every depth
// - compact separators
// - integers only; money travels as integer cents
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> CoreResult<Vec<u8>> {
    let canonical = canonicalize(serde_json::to_value(value)?)?;
    Ok(serde_json::to_string(&canonical)?.into_bytes())
}

fn canonicalize(v: Value) -> CoreResult<Value> {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut out = Map::new();
            for (k, vv) in entries {
                out.insert(k, canonicalize(vv)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .into_iter()
            .map(canonicalize)
            .collect::<CoreResult<Vec<_>>>()
            .map(Value::Array),
        Value::Number(n) if !(n.is_i64() || n.is_u64()) => Err(CoreError::DeterminismViolation(
            format!("canonical JSON forbids non-integer number {}", n),
        )),
        other => Ok(other),
    }
}

/// Dollar amount as integer cents, for canonical payloads.
pub fn cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}
