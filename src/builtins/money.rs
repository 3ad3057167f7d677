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

//! `money` member methods — spec.md §4.7/§4.8 "Money library".

use crate::error::{ScriptError, ScriptResult};
use crate::span::Span;
use crate::value::{Money, Value};

pub fn dispatch(m: &Money, name: &str, args: Vec<Value>, span: Span) -> ScriptResult<Value> {
    match name {
        "cents" | "minor_units" => Ok(Value::Int(m.minor_units)),
        "currency" => Ok(Value::string(m.currency())),
        "to_f" => Ok(Value::Float(m.minor_units as f64 / 100.0)),
        "add" => Ok(Value::Money(m.add(&money_arg(&args, "add", span)?, span)?)),
        "sub" => Ok(Value::Money(m.sub(&money_arg(&args, "sub", span)?, span)?)),
        "mul" => Ok(Value::Money(m.mul_int(int_arg(&args, "mul", span)?))),
        "div" => Ok(Value::Money(m.div_int(int_arg(&args, "div", span)?, span)?)),
        _ => Err(ScriptError::name(
            format!("unknown method {name} for money"),
            span,
        )),
    }
}

fn money_arg(args: &[Value], method: &str, span: Span) -> ScriptResult<Money> {
    match args.first() {
        Some(Value::Money(m)) => Ok(*m),
        Some(other) => Err(ScriptError::type_error(
            format!("{method} expected money, got {}", other.type_name()),
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
