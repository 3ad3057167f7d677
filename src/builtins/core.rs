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

//! Global free functions installed into every fresh root environment —
//! spec.md §4.8 "Core library": `assert`, `money`/`money_cents`, `now`,
//! `uuid`, `random_id`, `to_int`/`to_float` — plus the `JSON`/`Regex`/
//! `Time`/`Duration` namespace objects this module assembles from the
//! sibling builtin modules.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ScriptError, ScriptResult};
use crate::value::{Builtin, Money, TimeValue, Value};

/// Every global binding `engine.rs` defines into a fresh root environment
/// before running user code.
pub fn global_bindings() -> HashMap<String, Value> {
    let mut globals = HashMap::new();
    globals.insert("assert".to_string(), simple_builtin("assert", assert_fn));
    globals.insert("money".to_string(), simple_builtin("money", money_fn));
    globals.insert("money_cents".to_string(), simple_builtin("money_cents", money_cents_fn));
    globals.insert("to_int".to_string(), simple_builtin("to_int", to_int_fn));
    globals.insert("to_float".to_string(), simple_builtin("to_float", to_float_fn));
    globals.insert(
        "random_id".to_string(),
        simple_builtin("random_id", random_id_fn),
    );
    globals.insert(
        "now".to_string(),
        Value::Builtin(Arc::new(Builtin::auto_invoke("now", Arc::new(|_call| {
            Ok(Value::Time(TimeValue::now_utc()))
        })))),
    );
    globals.insert(
        "uuid".to_string(),
        Value::Builtin(Arc::new(Builtin::auto_invoke("uuid", Arc::new(|call| {
            let mut bytes = [0u8; 16];
            call.host.random_bytes(&mut bytes);
            Ok(Value::string(format_uuid_v4(bytes)))
        })))),
    );
    globals.insert("JSON".to_string(), crate::builtins::json::namespace());
    globals.insert("Regex".to_string(), crate::builtins::regexp::namespace());
    globals.insert("Time".to_string(), time_namespace());
    globals.insert("Duration".to_string(), duration_namespace());
    globals
}

fn simple_builtin(
    name: &str,
    f: impl Fn(crate::value::BuiltinCall) -> ScriptResult<Value> + Send + Sync + 'static,
) -> Value {
    Value::Builtin(Arc::new(Builtin::new(name, Arc::new(f))))
}

fn assert_fn(call: crate::value::BuiltinCall<'_>) -> ScriptResult<Value> {
    let span = call.span;
    let condition = call
        .arg(0)
        .ok_or_else(|| ScriptError::arity("missing argument condition for assert", span))?;
    if !condition.is_truthy() {
        let message = match call.arg(1) {
            Some(Value::Str(s)) => format!("assertion failed: {s}"),
            _ => "assertion failed".to_string(),
        };
        return Err(ScriptError::assertion(message, span));
    }
    Ok(Value::Nil)
}

/// `money(amount, currency)` takes a major-unit amount (e.g. dollars) and
/// converts to integer minor units by multiplying by 100 and rounding to
/// the nearest whole cent.
fn money_fn(call: crate::value::BuiltinCall<'_>) -> ScriptResult<Value> {
    let span = call.span;
    let amount = match call.arg(0) {
        Some(Value::Int(n)) => *n as f64,
        Some(Value::Float(f)) => *f,
        Some(other) => {
            return Err(ScriptError::type_error(
                format!("money amount expected int or float, got {}", other.type_name()),
                span,
            ))
        }
        None => return Err(ScriptError::arity("missing argument amount for money", span)),
    };
    let currency = currency_arg(&call, 1, span)?;
    let minor_units = (amount * 100.0).round() as i64;
    Ok(Value::Money(Money::new(minor_units, &currency)))
}

/// `money_cents(cents, currency)` takes the minor-unit count directly.
fn money_cents_fn(call: crate::value::BuiltinCall<'_>) -> ScriptResult<Value> {
    let span = call.span;
    let cents = match call.arg(0) {
        Some(Value::Int(n)) => *n,
        Some(other) => {
            return Err(ScriptError::type_error(
                format!("money_cents amount expected int, got {}", other.type_name()),
                span,
            ))
        }
        None => return Err(ScriptError::arity("missing argument cents for money_cents", span)),
    };
    let currency = currency_arg(&call, 1, span)?;
    Ok(Value::Money(Money::new(cents, &currency)))
}

fn currency_arg(call: &crate::value::BuiltinCall<'_>, index: usize, span: crate::span::Span) -> ScriptResult<String> {
    match call.arg(index) {
        Some(Value::Str(s)) if s.len() == 3 => Ok(s.to_string()),
        Some(Value::Str(_)) => Err(ScriptError::type_error("currency must be a 3-letter code", span)),
        Some(other) => Err(ScriptError::type_error(
            format!("currency expected string, got {}", other.type_name()),
            span,
        )),
        None => Err(ScriptError::arity("missing argument currency", span)),
    }
}

fn to_int_fn(call: crate::value::BuiltinCall<'_>) -> ScriptResult<Value> {
    let span = call.span;
    match call.arg(0) {
        Some(Value::Int(n)) => Ok(Value::Int(*n)),
        Some(Value::Float(f)) => Ok(Value::Int(*f as i64)),
        Some(Value::Str(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ScriptError::type_error(format!("cannot convert {s:?} to int"), span)),
        Some(other) => Err(ScriptError::type_error(
            format!("to_int expected int, float, or string, got {}", other.type_name()),
            span,
        )),
        None => Err(ScriptError::arity("missing argument value for to_int", span)),
    }
}

fn to_float_fn(call: crate::value::BuiltinCall<'_>) -> ScriptResult<Value> {
    let span = call.span;
    match call.arg(0) {
        Some(Value::Float(f)) => Ok(Value::Float(*f)),
        Some(Value::Int(n)) => Ok(Value::Float(*n as f64)),
        Some(Value::Str(s)) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| ScriptError::type_error(format!("cannot convert {s:?} to float"), span)),
        Some(other) => Err(ScriptError::type_error(
            format!("to_float expected int, float, or string, got {}", other.type_name()),
            span,
        )),
        None => Err(ScriptError::arity("missing argument value for to_float", span)),
    }
}

/// `random_id(length=16)`: a lowercase hex string drawn from the engine's
/// guarded random source.
fn random_id_fn(call: crate::value::BuiltinCall<'_>) -> ScriptResult<Value> {
    let span = call.span;
    let length = match call.arg(0) {
        Some(Value::Int(n)) if *n > 0 => *n as usize,
        Some(Value::Int(_)) => return Err(ScriptError::type_error("random_id length must be positive", span)),
        Some(other) => {
            return Err(ScriptError::type_error(
                format!("random_id length expected int, got {}", other.type_name()),
                span,
            ))
        }
        None => 16,
    };
    let mut bytes = vec![0u8; length.div_ceil(2)];
    call.host.random_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    Ok(Value::string(hex[..length].to_string()))
}

fn format_uuid_v4(mut bytes: [u8; 16]) -> String {
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        bytes[6], bytes[7],
        bytes[8], bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
    )
}

fn time_namespace() -> Value {
    let mut map = HashMap::new();
    map.insert(
        "now".to_string(),
        Value::Builtin(Arc::new(Builtin::auto_invoke("Time.now", Arc::new(|_call| {
            Ok(Value::Time(TimeValue::now_utc()))
        })))),
    );
    map.insert(
        "from_unix".to_string(),
        simple_builtin("Time.from_unix", |call| {
            let span = call.span;
            match call.arg(0) {
                Some(Value::Int(secs)) => Ok(Value::Time(TimeValue::from_unix(*secs))),
                Some(other) => Err(ScriptError::type_error(
                    format!("Time.from_unix expected int, got {}", other.type_name()),
                    span,
                )),
                None => Err(ScriptError::arity("missing argument seconds for Time.from_unix", span)),
            }
        }),
    );
    Value::object(map)
}

fn duration_namespace() -> Value {
    let mut map = HashMap::new();
    map.insert("seconds".to_string(), simple_builtin("Duration.seconds", |call| {
        duration_from_unit(&call, 1, call.span)
    }));
    map.insert("minutes".to_string(), simple_builtin("Duration.minutes", |call| {
        duration_from_unit(&call, 60, call.span)
    }));
    map.insert("hours".to_string(), simple_builtin("Duration.hours", |call| {
        duration_from_unit(&call, 3600, call.span)
    }));
    map.insert("days".to_string(), simple_builtin("Duration.days", |call| {
        duration_from_unit(&call, 86_400, call.span)
    }));
    Value::object(map)
}

fn duration_from_unit(call: &crate::value::BuiltinCall<'_>, unit_seconds: i64, span: crate::span::Span) -> ScriptResult<Value> {
    match call.arg(0) {
        Some(Value::Int(n)) => Ok(Value::Duration(crate::value::DurationValue::new(n * unit_seconds))),
        Some(other) => Err(ScriptError::type_error(
            format!("Duration constructor expected int, got {}", other.type_name()),
            span,
        )),
        None => Err(ScriptError::arity("missing argument count for Duration constructor", span)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_v4_has_version_and_variant_nibbles() {
        let formatted = format_uuid_v4([0u8; 16]);
        assert_eq!(&formatted[14..15], "4");
        assert!(formatted.len() == 36);
    }
}
