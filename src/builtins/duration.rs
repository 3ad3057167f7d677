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

//! `duration` member methods — spec.md §4.7/§4.8 "Duration library".

use crate::error::{ScriptError, ScriptResult};
use crate::span::Span;
use crate::value::{DurationValue, Value};

pub fn dispatch(d: &DurationValue, name: &str, args: Vec<Value>, span: Span) -> ScriptResult<Value> {
    match name {
        "to_i" | "seconds" => Ok(Value::Int(d.seconds)),
        "minutes" => Ok(Value::Float(d.seconds as f64 / 60.0)),
        "hours" => Ok(Value::Float(d.seconds as f64 / 3600.0)),
        "days" => Ok(Value::Float(d.seconds as f64 / 86_400.0)),
        "add" => Ok(Value::Duration(d.add(&duration_arg(&args, "add", span)?))),
        "sub" => Ok(Value::Duration(d.sub(&duration_arg(&args, "sub", span)?))),
        "mul" => {
            let n = int_arg(&args, "mul", span)?;
            Ok(Value::Duration(d.mul_int(n)))
        }
        "div" => Ok(Value::Float(d.div_duration(&duration_arg(&args, "div", span)?, span)?)),
        "rem" => Ok(Value::Duration(d.rem_duration(&duration_arg(&args, "rem", span)?, span)?)),
        _ => Err(ScriptError::name(
            format!("unknown method {name} for duration"),
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

fn int_arg(args: &[Value], method: &str, span: Span) -> ScriptResult<i64> {
    match args.first() {
        Some(Value::Int(n)) => Ok(*n),
        Some(other) => Err(ScriptError::type_error(
            format!("{method} expected int, got {}", other.type_name()),
            span,
        )),
        None => Err(ScriptError::arity(format!("missing argument value for {method}"), span)),
    }
}
