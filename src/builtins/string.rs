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

//! String member methods — spec.md §4.7/§4.8 "String library".

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use crate::error::{ScriptError, ScriptResult};
use crate::interpreter::{display, Ctx};
use crate::span::Span;
use crate::value::{Block, Value};

const MAX_PATTERN_BYTES: usize = 16 * 1024;

pub fn dispatch(
    _ctx: &Ctx,
    s: &Arc<str>,
    name: &str,
    args: Vec<Value>,
    _kwargs: HashMap<String, Value>,
    _block: Option<Arc<Block>>,
    span: Span,
) -> ScriptResult<Value> {
    match name {
        "length" | "len" => Ok(Value::Int(s.chars().count() as i64)),
        "upcase" => Ok(Value::string(s.to_uppercase())),
        "downcase" => Ok(Value::string(s.to_lowercase())),
        "strip" | "trim" => Ok(Value::string(s.trim().to_string())),
        "chomp" => Ok(Value::string(s.trim_end_matches(['\n', '\r']).to_string())),
        "squish" => {
            let squished = s.split_whitespace().collect::<Vec<_>>().join(" ");
            Ok(Value::string(squished))
        }
        "reverse" => Ok(Value::string(s.chars().rev().collect::<String>())),
        "to_i" => Ok(Value::Int(s.trim().parse::<i64>().unwrap_or(0))),
        "to_f" => Ok(Value::Float(s.trim().parse::<f64>().unwrap_or(0.0))),
        "empty?" => Ok(Value::Bool(s.is_empty())),
        "starts_with?" => {
            let prefix = string_arg(&args, 0, "starts_with?", span)?;
            Ok(Value::Bool(s.starts_with(&prefix)))
        }
        "ends_with?" => {
            let suffix = string_arg(&args, 0, "ends_with?", span)?;
            Ok(Value::Bool(s.ends_with(&suffix)))
        }
        "include?" => {
            let needle = string_arg(&args, 0, "include?", span)?;
            Ok(Value::Bool(s.contains(&needle)))
        }
        "split" => {
            let sep = match args.first() {
                Some(Value::Str(sep)) => sep.to_string(),
                Some(other) => {
                    return Err(ScriptError::type_error(
                        format!("split separator expected string, got {}", other.type_name()),
                        span,
                    ))
                }
                None => " ".to_string(),
            };
            let parts: Vec<Value> = if sep.is_empty() {
                s.chars().map(|c| Value::string(c.to_string())).collect()
            } else {
                s.split(sep.as_str()).map(Value::string).collect()
            };
            Ok(Value::array(parts))
        }
        "sub" => substitute(s, &args, span, false),
        "gsub" => substitute(s, &args, span, true),
        "template" => template(s, &args, span),
        _ => Err(ScriptError::name(
            format!("unknown method {name} for string"),
            span,
        )),
    }
}

fn string_arg(args: &[Value], index: usize, method: &str, span: Span) -> ScriptResult<String> {
    match args.get(index) {
        Some(Value::Str(s)) => Ok(s.to_string()),
        Some(other) => Err(ScriptError::type_error(
            format!("{method} argument expected string, got {}", other.type_name()),
            span,
        )),
        None => Err(ScriptError::arity(format!("missing argument value for {method}"), span)),
    }
}

fn keyword_is_regex(args: &[Value], span: Span) -> ScriptResult<bool> {
    match args.get(2) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(ScriptError::type_error(
            format!("regex flag expected bool, got {}", other.type_name()),
            span,
        )),
        None => Ok(false),
    }
}

/// `string.sub(pattern, replacement, regex: bool?)` / `.gsub(...)`
/// (spec.md §4.7). Plain substring replace unless `regex` is true, in which
/// case `pattern` is compiled with the size cap shared with the `Regex`
/// namespace.
fn substitute(s: &Arc<str>, args: &[Value], span: Span, all: bool) -> ScriptResult<Value> {
    let pattern = string_arg(args, 0, "sub/gsub", span)?;
    let replacement = string_arg(args, 1, "sub/gsub", span)?;
    let is_regex = keyword_is_regex(args, span)?;

    if !is_regex {
        let result = if all {
            s.replace(pattern.as_str(), &replacement)
        } else {
            s.replacen(pattern.as_str(), &replacement, 1)
        };
        return Ok(Value::string(result));
    }

    if pattern.len() > MAX_PATTERN_BYTES {
        return Err(ScriptError::resource("regex pattern too large", span));
    }
    let re = Regex::new(&pattern).map_err(|e| ScriptError::type_error(format!("invalid regex: {e}"), span))?;
    let result = if all {
        re.replace_all(s, replacement.as_str()).into_owned()
    } else {
        re.replace(s, replacement.as_str()).into_owned()
    };
    Ok(Value::string(result))
}

/// `"{{a.b}}".template({a: {b: "X"}}, strict: bool?)` (spec.md §4.8).
/// `{{path}}` segments are looked up by dotted-path traversal through
/// nested hashes; missing paths render as empty string unless `strict` is
/// true, in which case they are a name error.
fn template(s: &Arc<str>, args: &[Value], span: Span) -> ScriptResult<Value> {
    let data = match args.first() {
        Some(Value::Hash(m)) | Some(Value::Object(m)) => m.lock().unwrap().clone(),
        Some(other) => {
            return Err(ScriptError::type_error(
                format!("template data expected hash, got {}", other.type_name()),
                span,
            ))
        }
        None => return Err(ScriptError::arity("missing argument data for template", span)),
    };
    let strict = match args.get(1) {
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(ScriptError::type_error(
                format!("strict flag expected bool, got {}", other.type_name()),
                span,
            ))
        }
        None => false,
    };

    let mut out = String::new();
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"{{") {
            if let Some(end) = s[i..].find("}}") {
                let path = s[i + 2..i + end].trim();
                let resolved = resolve_path(&data, path);
                match resolved {
                    Some(value) => out.push_str(&display::display(&value)),
                    None if strict => {
                        return Err(ScriptError::name(format!("unknown template key {path}"), span))
                    }
                    None => {}
                }
                i += end + 2;
                continue;
            }
        }
        let ch = s[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    Ok(Value::string(out))
}

fn resolve_path(data: &HashMap<String, Value>, path: &str) -> Option<Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = data.get(first).cloned()?;
    for segment in segments {
        current = match &current {
            Value::Hash(m) | Value::Object(m) => m.lock().unwrap().get(segment).cloned()?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_path_walks_nested_hashes() {
        let mut inner = HashMap::new();
        inner.insert("b".to_string(), Value::string("X"));
        let mut outer = HashMap::new();
        outer.insert("a".to_string(), Value::hash(inner));
        let resolved = resolve_path(&outer, "a.b").unwrap();
        assert_eq!(display::display(&resolved), "X");
    }

    #[test]
    fn resolve_path_missing_key_is_none() {
        let outer = HashMap::new();
        assert!(resolve_path(&outer, "missing").is_none());
    }
}
