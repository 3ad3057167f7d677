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

//! `time` member methods — spec.md §4.7/§4.8 "Time library".

use crate::error::{ScriptError, ScriptResult};
use crate::span::Span;
use crate::value::{DurationValue, TimeValue, Value};

pub fn dispatch(t: &TimeValue, name: &str, args: Vec<Value>, span: Span) -> ScriptResult<Value> {
    match name {
        "to_i" => Ok(Value::Int(t.to_unix())),
        "year" => Ok(Value::Int(t.year() as i64)),
        "strftime" => {
            let fmt = match args.first() {
                Some(Value::Str(s)) => s.to_string(),
                Some(other) => {
                    return Err(ScriptError::type_error(
                        format!("strftime format expected string, got {}", other.type_name()),
                        span,
                    ))
                }
                None => return Err(ScriptError::arity("missing argument format for strftime", span)),
            };
            Ok(Value::string(t.strftime(&fmt)))
        }
        "with_offset_minutes" => {
            let offset = match args.first() {
                Some(Value::Int(n)) => *n as i32,
                Some(other) => {
                    return Err(ScriptError::type_error(
                        format!("with_offset_minutes expected int, got {}", other.type_name()),
                        span,
                    ))
                }
                None => return Err(ScriptError::arity("missing argument offset for with_offset_minutes", span)),
            };
            Ok(Value::Time(t.with_offset_minutes(offset)))
        }
        "round" => Ok(Value::Time(t.round_to_second())),
        "floor" => Ok(Value::Time(t.floor_to_second())),
        "ceil" => Ok(Value::Time(t.ceil_to_second())),
        "add" => {
            let d = duration_arg(&args, "add", span)?;
            Ok(Value::Time(t.add_duration(&d)))
        }
        "sub" => match args.first() {
            Some(Value::Duration(d)) => Ok(Value::Time(t.sub_duration(d))),
            Some(Value::Time(other)) => Ok(Value::Duration(t.diff(other))),
            Some(other) => Err(ScriptError::type_error(
                format!("sub expected duration or time, got {}", other.type_name()),
                span,
            )),
            None => Err(ScriptError::arity("missing argument value for sub", span)),
        },
        "diff" => {
            let other = match args.first() {
                Some(Value::Time(other)) => *other,
                Some(other) => {
                    return Err(ScriptError::type_error(
                        format!("diff expected time, got {}", other.type_name()),
                        span,
                    ))
                }
                None => return Err(ScriptError::arity("missing argument value for diff", span)),
            };
            Ok(Value::Duration(t.diff(&other)))
        }
        _ => Err(ScriptError::name(
            format!("unknown method {name} for time"),
            span,
        )),
    }
}

fn duration_arg(args: &[Value], method: &str, span: Span) -> ScriptResult<DurationValue> {
    match args.first() {
        Some(Value::Duration(d)) => Ok(*d),
        Some(other) => Err(ScriptError::type_error(
            format!("{method} expected duration, got {}", other.type_name()),
            span,
        )),
        None => Err(ScriptError::arity(format!("missing argument value for {method}"), span)),
    }
}
