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

//! Array member methods — spec.md §4.7 "Member resolution on built-in
//! types".

use std::collections::HashMap;
use std::sync::Arc;

use crate::builtins::require_block;
use crate::error::{ScriptError, ScriptResult};
use crate::interpreter::{calls, display, Ctx};
use crate::span::Span;
use crate::value::{Block, Shared, Value};

pub fn dispatch(
    ctx: &Ctx,
    arr: &Shared<Vec<Value>>,
    name: &str,
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    block: Option<Arc<Block>>,
    span: Span,
) -> ScriptResult<Value> {
    match name {
        "length" | "len" => Ok(Value::Int(arr.lock().unwrap().len() as i64)),
        "first" => Ok(arr.lock().unwrap().first().cloned().unwrap_or(Value::Nil)),
        "last" => Ok(arr.lock().unwrap().last().cloned().unwrap_or(Value::Nil)),
        "reverse" => {
            let mut items = arr.lock().unwrap().clone();
            items.reverse();
            Ok(Value::array(items))
        }
        "push!" => {
            let value = args.into_iter().next().ok_or_else(|| {
                ScriptError::arity("missing argument value for push!", span)
            })?;
            arr.lock().unwrap().push(value);
            Ok(Value::Array(Arc::clone(arr)))
        }
        "pop!" => Ok(arr.lock().unwrap().pop().unwrap_or(Value::Nil)),
        "include?" => {
            let needle = args.into_iter().next().ok_or_else(|| {
                ScriptError::arity("missing argument value for include?", span)
            })?;
            let found = arr.lock().unwrap().iter().any(|v| Value::equals(v, &needle));
            Ok(Value::Bool(found))
        }
        "join" => {
            let sep = match args.first() {
                Some(Value::Str(s)) => s.to_string(),
                Some(other) => {
                    return Err(ScriptError::type_error(
                        format!("join separator expected string, got {}", other.type_name()),
                        span,
                    ))
                }
                None => String::new(),
            };
            let parts: Vec<String> = arr.lock().unwrap().iter().map(display::display).collect();
            Ok(Value::string(parts.join(&sep)))
        }
        "uniq" => {
            let items = arr.lock().unwrap();
            let mut out: Vec<Value> = Vec::new();
            for item in items.iter() {
                if !out.iter().any(|v| Value::equals(v, item)) {
                    out.push(item.clone());
                }
            }
            Ok(Value::array(out))
        }
        "flatten" => {
            let depth = match args.first() {
                Some(Value::Int(n)) => *n,
                Some(other) => {
                    return Err(ScriptError::type_error(
                        format!("flatten depth expected int, got {}", other.type_name()),
                        span,
                    ))
                }
                None => i64::MAX,
            };
            let items = arr.lock().unwrap().clone();
            let mut out = Vec::new();
            flatten_into(&items, depth, &mut out);
            Ok(Value::array(out))
        }
        "tally" => {
            let items = arr.lock().unwrap().clone();
            let mut counts: Vec<(String, i64)> = Vec::new();
            for item in &items {
                let key = display::repr(item);
                match counts.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((key, 1)),
                }
            }
            let mut map = HashMap::new();
            for (k, n) in counts {
                map.insert(k, Value::Int(n));
            }
            Ok(Value::hash(map))
        }
        "chunk" => {
            let n = positive_size_arg(&args, "chunk", span)?;
            let items = arr.lock().unwrap().clone();
            let chunks: Vec<Value> = items.chunks(n).map(|c| Value::array(c.to_vec())).collect();
            Ok(Value::array(chunks))
        }
        "window" => {
            let n = positive_size_arg(&args, "window", span)?;
            let items = arr.lock().unwrap().clone();
            if items.len() < n {
                return Ok(Value::array(vec![]));
            }
            let windows: Vec<Value> = items.windows(n).map(|w| Value::array(w.to_vec())).collect();
            Ok(Value::array(windows))
        }
        "each" => {
            let b = require_block(&block, "each", span)?;
            let items = arr.lock().unwrap().clone();
            for item in items {
                calls::call_block_value(ctx, b, vec![item], HashMap::new(), span)?;
            }
            Ok(Value::Array(Arc::clone(arr)))
        }
        "map" => {
            let b = require_block(&block, "map", span)?;
            let items = arr.lock().unwrap().clone();
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(calls::call_block_value(ctx, b, vec![item], HashMap::new(), span)?);
            }
            Ok(Value::array(out))
        }
        "select" | "filter" => {
            let b = require_block(&block, name, span)?;
            let items = arr.lock().unwrap().clone();
            let mut out = Vec::new();
            for item in items {
                if calls::call_block_value(ctx, b, vec![item.clone()], HashMap::new(), span)?.is_truthy() {
                    out.push(item);
                }
            }
            Ok(Value::array(out))
        }
        "reject" => {
            let b = require_block(&block, "reject", span)?;
            let items = arr.lock().unwrap().clone();
            let mut out = Vec::new();
            for item in items {
                if !calls::call_block_value(ctx, b, vec![item.clone()], HashMap::new(), span)?.is_truthy() {
                    out.push(item);
                }
            }
            Ok(Value::array(out))
        }
        "partition" => {
            let b = require_block(&block, "partition", span)?;
            let items = arr.lock().unwrap().clone();
            let mut yes = Vec::new();
            let mut no = Vec::new();
            for item in items {
                if calls::call_block_value(ctx, b, vec![item.clone()], HashMap::new(), span)?.is_truthy() {
                    yes.push(item);
                } else {
                    no.push(item);
                }
            }
            Ok(Value::array(vec![Value::array(yes), Value::array(no)]))
        }
        "reduce" | "inject" => {
            let b = require_block(&block, name, span)?;
            let items = arr.lock().unwrap().clone();
            let mut iter = items.into_iter();
            let mut acc = match args.into_iter().next() {
                Some(initial) => initial,
                None => iter
                    .next()
                    .ok_or_else(|| ScriptError::arity(format!("{name} requires an initial value"), span))?,
            };
            for item in iter {
                acc = calls::call_block_value(ctx, b, vec![acc, item], HashMap::new(), span)?;
            }
            Ok(acc)
        }
        "sort" => {
            let mut items = arr.lock().unwrap().clone();
            match &block {
                Some(b) => {
                    let mut err = None;
                    items.sort_by(|a, b2| {
                        if err.is_some() {
                            return std::cmp::Ordering::Equal;
                        }
                        match calls::call_block_value(ctx, b, vec![a.clone(), b2.clone()], HashMap::new(), span) {
                            Ok(Value::Int(n)) => n.cmp(&0),
                            Ok(other) => {
                                err = Some(ScriptError::type_error(
                                    format!("sort comparator expected int, got {}", other.type_name()),
                                    span,
                                ));
                                std::cmp::Ordering::Equal
                            }
                            Err(e) => {
                                err = Some(e);
                                std::cmp::Ordering::Equal
                            }
                        }
                    });
                    if let Some(e) = err {
                        return Err(e);
                    }
                }
                None => {
                    let mut err = None;
                    items.sort_by(|a, b2| match default_compare(a, b2, span) {
                        Ok(o) => o,
                        Err(e) => {
                            err = Some(e);
                            std::cmp::Ordering::Equal
                        }
                    });
                    if let Some(e) = err {
                        return Err(e);
                    }
                }
            }
            Ok(Value::array(items))
        }
        "sort_by" => {
            let b = require_block(&block, "sort_by", span)?;
            let items = arr.lock().unwrap().clone();
            let mut keyed: Vec<(Value, Value)> = Vec::with_capacity(items.len());
            for item in items {
                let key = calls::call_block_value(ctx, b, vec![item.clone()], HashMap::new(), span)?;
                keyed.push((key, item));
            }
            let mut err = None;
            keyed.sort_by(|a, b2| match default_compare(&a.0, &b2.0, span) {
                Ok(o) => o,
                Err(e) => {
                    err = Some(e);
                    std::cmp::Ordering::Equal
                }
            });
            if let Some(e) = err {
                return Err(e);
            }
            Ok(Value::array(keyed.into_iter().map(|(_, v)| v).collect()))
        }
        "group_by" => {
            let b = require_block(&block, "group_by", span)?;
            let items = arr.lock().unwrap().clone();
            let mut groups: HashMap<String, Vec<Value>> = HashMap::new();
            for item in items {
                let key = calls::call_block_value(ctx, b, vec![item.clone()], HashMap::new(), span)?;
                groups.entry(display::repr(&key)).or_default().push(item);
            }
            let mut map = HashMap::new();
            for (k, v) in groups {
                map.insert(k, Value::array(v));
            }
            Ok(Value::hash(map))
        }
        "group_by_stable" => {
            let b = require_block(&block, "group_by_stable", span)?;
            let items = arr.lock().unwrap().clone();
            let mut order: Vec<String> = Vec::new();
            let mut groups: HashMap<String, Vec<Value>> = HashMap::new();
            for item in items {
                let key = calls::call_block_value(ctx, b, vec![item.clone()], HashMap::new(), span)?;
                let key_repr = display::repr(&key);
                if !groups.contains_key(&key_repr) {
                    order.push(key_repr.clone());
                }
                groups.entry(key_repr).or_default().push(item);
            }
            let pairs: Vec<Value> = order
                .into_iter()
                .map(|k| {
                    let items = groups.remove(&k).unwrap_or_default();
                    Value::array(vec![Value::string(k), Value::array(items)])
                })
                .collect();
            Ok(Value::array(pairs))
        }
        _ => Err(ScriptError::name(
            format!("unknown method {name} for array"),
            span,
        )),
    }
}

fn flatten_into(items: &[Value], depth: i64, out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::Array(inner) if depth > 0 => {
                let inner_items = inner.lock().unwrap().clone();
                flatten_into(&inner_items, depth - 1, out);
            }
            other => out.push(other.clone()),
        }
    }
}

fn positive_size_arg(args: &[Value], method: &str, span: Span) -> ScriptResult<usize> {
    match args.first() {
        Some(Value::Int(n)) if *n > 0 => Ok(*n as usize),
        Some(Value::Int(_)) => Err(ScriptError::type_error(
            format!("{method} size must be positive"),
            span,
        )),
        Some(other) => Err(ScriptError::type_error(
            format!("{method} size expected int, got {}", other.type_name()),
            span,
        )),
        None => Err(ScriptError::arity(format!("missing argument size for {method}"), span)),
    }
}

/// Default ordering used by `sort`/`sort_by` when no comparator block is
/// given: numeric, string, duration, and time values order naturally;
/// mismatched or non-orderable kinds are a type error.
fn default_compare(a: &Value, b: &Value, span: Span) -> ScriptResult<std::cmp::Ordering> {
    let ordering = match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.partial_cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Str(x), Value::Str(y)) => Some(x.as_ref().cmp(y.as_ref())),
        (Value::Duration(x), Value::Duration(y)) => x.seconds.partial_cmp(&y.seconds),
        (Value::Time(x), Value::Time(y)) => x.instant.partial_cmp(&y.instant),
        _ => None,
    };
    ordering.ok_or_else(|| {
        ScriptError::type_error(
            format!("cannot order {} and {}", a.type_name(), b.type_name()),
            span,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::shared;

    #[test]
    fn default_sort_orders_ints_ascending() {
        let arr = shared(vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
        let result = default_compare(&Value::Int(1), &Value::Int(2), Span::UNKNOWN).unwrap();
        assert_eq!(result, std::cmp::Ordering::Less);
        drop(arr);
    }

    #[test]
    fn flatten_respects_depth() {
        let nested = Value::array(vec![Value::array(vec![Value::Int(1)]), Value::Int(2)]);
        if let Value::Array(inner) = nested {
            let items = inner.lock().unwrap().clone();
            let mut out = Vec::new();
            flatten_into(&items, i64::MAX, &mut out);
            assert_eq!(out.len(), 2);
        }
    }
}
