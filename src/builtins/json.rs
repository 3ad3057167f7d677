/*
 * ==========================================================================
 * VaultScript — Sandboxed Embedded Scripting Runtime
 * ==========================================================================
 *
 * This file is part of the VaultScript runtime.
 *
 * VaultScript is dual-licensed under the terms of:
 *   - The MIT License
 *   - The Apache License, Version 2.0
 *
 * You may choose either license to govern your use of this software.
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under these licenses is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * ==========================================================================
 */

//! `JSON.parse`/`JSON.stringify` — spec.md §4.8 "JSON library". Payloads
//! are capped at 1 MiB in either direction; `stringify` rejects cyclic
//! value graphs rather than hanging or overflowing the stack.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ScriptError, ScriptResult};
use crate::span::Span;
use crate::value::{Builtin, Value};

const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

pub fn namespace() -> Value {
    let mut map = HashMap::new();
    map.insert(
        "parse".to_string(),
        Value::Builtin(Arc::new(Builtin::new("JSON.parse", Arc::new(|call| {
            let span = call.span;
            let text = match call.arg(0) {
                Some(Value::Str(s)) => s.to_string(),
                Some(other) => {
                    return Err(ScriptError::type_error(
                        format!("JSON.parse expected string, got {}", other.type_name()),
                        span,
                    ))
                }
                None => return Err(ScriptError::arity("missing argument text for JSON.parse", span)),
            };
            if text.len() > MAX_PAYLOAD_BYTES {
                return Err(ScriptError::resource("JSON payload exceeds 1 MiB limit", span));
            }
            let mut de = serde_json::Deserializer::from_str(&text);
            let parsed: serde_json::Value = serde::de::Deserialize::deserialize(&mut de)
                .map_err(|e| ScriptError::type_error(format!("invalid JSON: {e}"), span))?;
            de.end()
                .map_err(|e| ScriptError::type_error(format!("trailing data after JSON value: {e}"), span))?;
            Ok(from_json(&parsed))
        }))))),
    );
    map.insert(
        "stringify".to_string(),
        Value::Builtin(Arc::new(Builtin::new("JSON.stringify", Arc::new(|call| {
            let span = call.span;
            let value = call
                .arg(0)
                .cloned()
                .ok_or_else(|| ScriptError::arity("missing argument value for JSON.stringify", span))?;
            let mut seen = std::collections::HashSet::new();
            let json = to_json(&value, &mut seen, span)?;
            let text = serde_json::to_string(&json)
                .map_err(|e| ScriptError::type_error(format!("cannot serialize to JSON: {e}"), span))?;
            if text.len() > MAX_PAYLOAD_BYTES {
                return Err(ScriptError::resource("JSON payload exceeds 1 MiB limit", span));
            }
            Ok(Value::string(text))
        }))))),
    );
    Value::object(map)
}

fn from_json(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Value::string(s.clone()),
        serde_json::Value::Array(items) => Value::array(items.iter().map(from_json).collect()),
        serde_json::Value::Object(map) => {
            let mut out = HashMap::new();
            for (k, v) in map {
                out.insert(k.clone(), from_json(v));
            }
            Value::hash(out)
        }
    }
}

/// Converts a script value to JSON, tracking container identities in
/// `seen` so a self-referential array/hash fails with a resource error
/// instead of recursing forever.
fn to_json(value: &Value, seen: &mut std::collections::HashSet<usize>, span: Span) -> ScriptResult<serde_json::Value> {
    match value {
        Value::Nil => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Int(n) => Ok(serde_json::Value::Number((*n).into())),
        Value::Float(f) => Ok(serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)),
        Value::Str(s) => Ok(serde_json::Value::String(s.to_string())),
        Value::Symbol(s) => Ok(serde_json::Value::String(s.to_string())),
        Value::Array(arr) => {
            let ptr = Arc::as_ptr(arr) as usize;
            if !seen.insert(ptr) {
                return Err(ScriptError::resource("JSON.stringify: cyclic value", span));
            }
            let items = arr.lock().unwrap().clone();
            let out: ScriptResult<Vec<serde_json::Value>> = items.iter().map(|v| to_json(v, seen, span)).collect();
            seen.remove(&ptr);
            Ok(serde_json::Value::Array(out?))
        }
        Value::Hash(map) | Value::Object(map) => {
            let ptr = Arc::as_ptr(map) as usize;
            if !seen.insert(ptr) {
                return Err(ScriptError::resource("JSON.stringify: cyclic value", span));
            }
            let guard = map.lock().unwrap().clone();
            let mut out = serde_json::Map::new();
            for key in Value::sorted_keys(&guard) {
                let v = guard.get(&key).expect("sorted key exists");
                out.insert(key, to_json(v, seen, span)?);
            }
            seen.remove(&ptr);
            Ok(serde_json::Value::Object(out))
        }
        other => Err(ScriptError::type_error(
            format!("cannot serialize {} to JSON", other.type_name()),
            span,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_converts_whole_numbers_to_int() {
        let parsed: serde_json::Value = serde_json::from_str("42").unwrap();
        assert!(matches!(from_json(&parsed), Value::Int(42)));
    }

    #[test]
    fn to_json_detects_cycles() {
        let arr = Value::array(vec![Value::Int(1)]);
        if let Value::Array(inner) = &arr {
            inner.lock().unwrap().push(arr.clone());
        }
        let mut seen = std::collections::HashSet::new();
        assert!(to_json(&arr, &mut seen, Span::UNKNOWN).is_err());
    }
}
