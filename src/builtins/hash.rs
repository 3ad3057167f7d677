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

//! Hash/object member methods — spec.md §4.7. `Object` receivers are also
//! routed here: they back the `Time`/`Duration`/`JSON`/`Regex` namespace
//! values, whose fields are themselves builtins, so a call like
//! `Time.from_unix(1000)` resolves as a hash-field lookup that happens to
//! find something callable instead of a stored data value.

use std::collections::HashMap;
use std::sync::Arc;

use crate::builtins::require_block;
use crate::error::{ScriptError, ScriptResult};
use crate::interpreter::{calls, Ctx};
use crate::span::Span;
use crate::value::{Block, Shared, Value};

pub fn dispatch(
    ctx: &Ctx,
    map: &Shared<HashMap<String, Value>>,
    is_hash: bool,
    name: &str,
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    block: Option<Arc<Block>>,
    span: Span,
) -> ScriptResult<Value> {
    if let Some(field) = map.lock().unwrap().get(name).cloned() {
        match field {
            Value::Builtin(b) => return calls::call_builtin(ctx, &b, None, args, kwargs, block, span),
            Value::Function(f) => return calls::call_function(ctx, &f, None, args, kwargs, block, span),
            Value::Block(b) => return calls::call_block_value(ctx, &b, args, kwargs, span),
            other if args.is_empty() && kwargs.is_empty() && block.is_none() => return Ok(other),
            _ => {}
        }
    }

    let wrap = |m: HashMap<String, Value>| if is_hash { Value::hash(m) } else { Value::object(m) };

    match name {
        "keys" => {
            let guard = map.lock().unwrap();
            Ok(Value::array(Value::sorted_keys(&guard).into_iter().map(Value::string).collect()))
        }
        "values" => {
            let guard = map.lock().unwrap();
            let keys = Value::sorted_keys(&guard);
            Ok(Value::array(keys.iter().map(|k| guard.get(k).cloned().unwrap_or(Value::Nil)).collect()))
        }
        "each" => {
            let b = require_block(&block, "each", span)?;
            let guard = map.lock().unwrap().clone();
            for key in Value::sorted_keys(&guard) {
                let value = guard.get(&key).cloned().unwrap_or(Value::Nil);
                calls::call_block_value(ctx, b, vec![Value::string(key), value], HashMap::new(), span)?;
            }
            Ok(Value::Bool(true))
        }
        "fetch" => {
            let key = string_arg(&args, 0, "fetch", span)?;
            let guard = map.lock().unwrap();
            match guard.get(&key) {
                Some(v) => Ok(v.clone()),
                None => match args.get(1) {
                    Some(default) => Ok(default.clone()),
                    None => Err(ScriptError::name(format!("unknown key {key}"), span)),
                },
            }
        }
        "dig" => {
            let mut current = Value::Hash(Arc::clone(map));
            for arg in &args {
                let key = match arg {
                    Value::Str(s) => s.to_string(),
                    other => {
                        return Err(ScriptError::type_error(
                            format!("dig key expected string, got {}", other.type_name()),
                            span,
                        ))
                    }
                };
                current = match &current {
                    Value::Hash(m) | Value::Object(m) => m.lock().unwrap().get(&key).cloned().unwrap_or(Value::Nil),
                    _ => Value::Nil,
                };
            }
            Ok(current)
        }
        "merge" => {
            let other = hash_arg(&args, 0, "merge", span)?;
            let mut out = map.lock().unwrap().clone();
            for (k, v) in other.lock().unwrap().iter() {
                out.insert(k.clone(), v.clone());
            }
            Ok(wrap(out))
        }
        "transform_values" => {
            let b = require_block(&block, "transform_values", span)?;
            let guard = map.lock().unwrap().clone();
            let mut out = HashMap::new();
            for key in Value::sorted_keys(&guard) {
                let value = guard.get(&key).cloned().unwrap_or(Value::Nil);
                out.insert(key, calls::call_block_value(ctx, b, vec![value], HashMap::new(), span)?);
            }
            Ok(wrap(out))
        }
        "transform_keys" => {
            let b = require_block(&block, "transform_keys", span)?;
            let guard = map.lock().unwrap().clone();
            let mut out = HashMap::new();
            for key in Value::sorted_keys(&guard) {
                let value = guard.get(&key).cloned().unwrap_or(Value::Nil);
                let new_key = calls::call_block_value(ctx, b, vec![Value::string(key)], HashMap::new(), span)?;
                match new_key {
                    Value::Str(s) => out.insert(s.to_string(), value),
                    other => {
                        return Err(ScriptError::type_error(
                            format!("transform_keys block expected string, got {}", other.type_name()),
                            span,
                        ))
                    }
                };
            }
            Ok(wrap(out))
        }
        "compact" => {
            let guard = map.lock().unwrap().clone();
            let out: HashMap<String, Value> = guard
                .into_iter()
                .filter(|(_, v)| !matches!(v, Value::Nil))
                .collect();
            Ok(wrap(out))
        }
        "slice" => {
            let keys = string_list_args(&args, "slice", span)?;
            let guard = map.lock().unwrap();
            let out: HashMap<String, Value> = keys
                .into_iter()
                .filter_map(|k| guard.get(&k).cloned().map(|v| (k, v)))
                .collect();
            Ok(wrap(out))
        }
        "except" => {
            let keys = string_list_args(&args, "except", span)?;
            let guard = map.lock().unwrap().clone();
            let out: HashMap<String, Value> = guard.into_iter().filter(|(k, _)| !keys.contains(k)).collect();
            Ok(wrap(out))
        }
        "length" | "len" => Ok(Value::Int(map.lock().unwrap().len() as i64)),
        _ => Err(ScriptError::name(
            format!("unknown method {name} for {}", if is_hash { "hash" } else { "object" }),
            span,
        )),
    }
}

fn string_arg(args: &[Value], index: usize, method: &str, span: Span) -> ScriptResult<String> {
    match args.get(index) {
        Some(Value::Str(s)) => Ok(s.to_string()),
        Some(other) => Err(ScriptError::type_error(
            format!("{method} key expected string, got {}", other.type_name()),
            span,
        )),
        None => Err(ScriptError::arity(format!("missing argument key for {method}"), span)),
    }
}

fn hash_arg(args: &[Value], index: usize, method: &str, span: Span) -> ScriptResult<Shared<HashMap<String, Value>>> {
    match args.get(index) {
        Some(Value::Hash(m)) | Some(Value::Object(m)) => Ok(Arc::clone(m)),
        Some(other) => Err(ScriptError::type_error(
            format!("{method} argument expected hash, got {}", other.type_name()),
            span,
        )),
        None => Err(ScriptError::arity(format!("missing argument value for {method}"), span)),
    }
}

fn string_list_args(args: &[Value], method: &str, span: Span) -> ScriptResult<Vec<String>> {
    args.iter()
        .map(|v| match v {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(ScriptError::type_error(
                format!("{method} expected string keys, got {}", other.type_name()),
                span,
            )),
        })
        .collect()
}
