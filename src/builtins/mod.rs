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

//! The core-registered method table for every non-instance value kind
//! (spec.md §4.7 "Member resolution on built-in types") plus the global
//! data builtins and namespace objects `engine.rs` installs into a fresh
//! root environment (spec.md §9).

pub mod array;
pub mod core;
pub mod duration;
pub mod hash;
pub mod json;
pub mod money;
pub mod regexp;
pub mod string;
pub mod time;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ScriptError, ScriptResult};
use crate::interpreter::{display, Ctx};
use crate::span::Span;
use crate::value::{Block, Value};

/// The single fallback `classes::dispatch_method` routes every non-Instance,
/// non-Class receiver through.
pub fn dispatch_method(
    ctx: &Ctx,
    receiver: Value,
    name: &str,
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    block: Option<Arc<Block>>,
    span: Span,
) -> ScriptResult<Value> {
    if name == "to_s" && args.is_empty() && kwargs.is_empty() {
        return Ok(Value::string(display::display(&receiver)));
    }

    match &receiver {
        Value::Array(arr) => array::dispatch(ctx, arr, name, args, kwargs, block, span),
        Value::Hash(map) => hash::dispatch(ctx, map, true, name, args, kwargs, block, span),
        Value::Object(map) => hash::dispatch(ctx, map, false, name, args, kwargs, block, span),
        Value::Str(s) => string::dispatch(ctx, s, name, args, kwargs, block, span),
        Value::Time(t) => time::dispatch(t, name, args, span),
        Value::Duration(d) => duration::dispatch(d, name, args, span),
        Value::Money(m) => money::dispatch(m, name, args, span),
        Value::Range(r) => range_dispatch(ctx, r, name, args, block, span),
        other => Err(ScriptError::type_error(
            format!("unknown method {name} for {}", other.type_name()),
            span,
        )),
    }
}

fn range_dispatch(
    ctx: &Ctx,
    range: &crate::value::RangeValue,
    name: &str,
    args: Vec<Value>,
    block: Option<Arc<Block>>,
    span: Span,
) -> ScriptResult<Value> {
    match name {
        "to_a" => Ok(Value::array(range.iter().map(Value::Int).collect())),
        "length" | "len" => Ok(Value::Int(range.len() as i64)),
        "each" => {
            let b = require_block(&block, "each", span)?;
            for i in range.iter() {
                crate::interpreter::calls::call_block_value(ctx, b, vec![Value::Int(i)], HashMap::new(), span)?;
            }
            Ok(Value::Range(*range))
        }
        "include?" => match args.first() {
            Some(Value::Int(n)) => {
                let (lo, hi) = if range.start <= range.end {
                    (range.start, range.end)
                } else {
                    (range.end, range.start)
                };
                Ok(Value::Bool(*n >= lo && *n <= hi))
            }
            Some(other) => Err(ScriptError::type_error(
                format!("include? expected int, got {}", other.type_name()),
                span,
            )),
            None => Err(ScriptError::arity("missing argument value for include?", span)),
        },
        _ => Err(ScriptError::name(
            format!("unknown method {name} for range"),
            span,
        )),
    }
}

/// Shared "this method needs a block" check (spec.md's canonical
/// `"requires a block"` substring), used by every block-taking builtin
/// across `array`/`hash`.
pub fn require_block<'a>(block: &'a Option<Arc<Block>>, method: &str, span: Span) -> ScriptResult<&'a Arc<Block>> {
    block
        .as_ref()
        .ok_or_else(|| ScriptError::arity(format!("{method} requires a block"), span))
}
