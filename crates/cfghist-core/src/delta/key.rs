//! Key derivation.
//!
//! An item's key is the canonical JSON text of `{"dn": .., "info": ..}`:
//! object members sorted by name, `null` members omitted, no whitespace.
//! Structurally equal `dn`/`info` pairs always produce the same string.

use serde_json::{Map, Value};

use crate::errors::{HistError, Result};

/// Deepest nesting accepted in a keyed payload.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Derive the matching key for an item.
///
/// # Errors
///
/// - `NonCanonicalInfo`: `info` holds a non-finite number
/// - `NestingTooDeep`: `info` nests deeper than [`MAX_NESTING_DEPTH`]
pub fn derive_key(dn: &str, info: &Value) -> Result<String> {
    let mut key_info = Map::new();
    key_info.insert("dn".to_string(), Value::String(dn.to_string()));
    key_info.insert("info".to_string(), info.clone());

    let mut out = String::new();
    write_canonical(&Value::Object(key_info), 0, &mut out).map_err(|fault| fault.for_dn(dn))?;
    Ok(out)
}

/// Canonical JSON text for any value (used for table rows).
///
/// # Errors
///
/// Same conditions as [`derive_key`], reported against an empty `dn`.
pub fn canonical_json(value: &Value) -> Result<String> {
    let mut out = String::new();
    write_canonical(value, 0, &mut out).map_err(|fault| fault.for_dn(""))?;
    Ok(out)
}

enum Fault {
    NonFinite,
    TooDeep,
    Serialize(String),
}

impl Fault {
    fn for_dn(self, dn: &str) -> HistError {
        match self {
            Fault::NonFinite => HistError::NonCanonicalInfo {
                dn: dn.to_string(),
                reason: "non-finite number".to_string(),
            },
            Fault::TooDeep => HistError::NestingTooDeep {
                dn: dn.to_string(),
                limit: MAX_NESTING_DEPTH,
            },
            Fault::Serialize(message) => HistError::Serialization { message },
        }
    }
}

fn write_canonical(value: &Value, depth: usize, out: &mut String) -> std::result::Result<(), Fault> {
    if depth > MAX_NESTING_DEPTH {
        return Err(Fault::TooDeep);
    }
    match value {
        Value::Null | Value::Bool(_) => out.push_str(&value.to_string()),
        Value::Number(n) => {
            if n.as_f64().is_some_and(|f| !f.is_finite()) {
                return Err(Fault::NonFinite);
            }
            out.push_str(&n.to_string());
        }
        Value::String(s) => write_string(s, out)?,
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, depth + 1, out)?;
            }
            out.push(']');
        }
        Value::Object(members) => {
            let mut entries: Vec<(&String, &Value)> =
                members.iter().filter(|(_, v)| !v.is_null()).collect();
            // Map iteration is only sorted while serde_json's `preserve_order`
            // feature is off, and any crate in the graph can turn it on.
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (name, member)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(name, out)?;
                out.push(':');
                write_canonical(member, depth + 1, out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn write_string(s: &str, out: &mut String) -> std::result::Result<(), Fault> {
    let quoted = serde_json::to_string(s).map_err(|e| Fault::Serialize(e.to_string()))?;
    out.push_str(&quoted);
    Ok(())
}
