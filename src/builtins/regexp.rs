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

//! `Regex.match`/`Regex.replace`/`Regex.replace_all` — spec.md §4.8 "Regex
//! library". Patterns are capped at 16 KiB, inputs and outputs at 1 MiB,
//! to keep a pathological pattern or haystack from turning an untrusted
//! script into a resource-exhaustion vector.
//!
//! `replace_all` on a pattern that can match the empty string advances one
//! byte past each empty match before resuming, matching the behavior the
//! underlying `regex` crate's `replace_all` already gives us — documented
//! here since a host integrating against this library will want to know
//! it rather than discover it.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use crate::error::{ScriptError, ScriptResult};
use crate::span::Span;
use crate::value::{Builtin, Value};

const MAX_PATTERN_BYTES: usize = 16 * 1024;
const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

pub fn namespace() -> Value {
    let mut map = HashMap::new();
    map.insert("match".to_string(), builtin("Regex.match", do_match));
    map.insert("replace".to_string(), builtin("Regex.replace", |pattern, input, args, span| {
        do_replace(pattern, input, args, span, false)
    }));
    map.insert("replace_all".to_string(), builtin("Regex.replace_all", |pattern, input, args, span| {
        do_replace(pattern, input, args, span, true)
    }));
    Value::object(map)
}

fn builtin(
    name: &str,
    f: impl Fn(&str, &str, &[Value], Span) -> ScriptResult<Value> + Send + Sync + 'static,
) -> Value {
    Value::Builtin(Arc::new(Builtin::new(name, Arc::new(move |call| {
        let span = call.span;
        let pattern = string_at(&call.args, 0, span)?;
        let input = string_at(&call.args, 1, span)?;
        check_sizes(&pattern, &input, span)?;
        f(&pattern, &input, &call.args, span)
    }))))
}

fn string_at(args: &[Value], index: usize, span: Span) -> ScriptResult<String> {
    match args.get(index) {
        Some(Value::Str(s)) => Ok(s.to_string()),
        Some(other) => Err(ScriptError::type_error(
            format!("Regex argument expected string, got {}", other.type_name()),
            span,
        )),
        None => Err(ScriptError::arity("missing argument for Regex method", span)),
    }
}

fn check_sizes(pattern: &str, input: &str, span: Span) -> ScriptResult<()> {
    if pattern.len() > MAX_PATTERN_BYTES {
        return Err(ScriptError::resource("regex pattern exceeds 16 KiB limit", span));
    }
    if input.len() > MAX_PAYLOAD_BYTES {
        return Err(ScriptError::resource("regex input exceeds 1 MiB limit", span));
    }
    Ok(())
}

fn compile(pattern: &str, span: Span) -> ScriptResult<Regex> {
    Regex::new(pattern).map_err(|e| ScriptError::type_error(format!("invalid regex: {e}"), span))
}

fn do_match(pattern: &str, input: &str, _args: &[Value], span: Span) -> ScriptResult<Value> {
    let re = compile(pattern, span)?;
    match re.captures(input) {
        Some(caps) => {
            let groups: Vec<Value> = caps
                .iter()
                .map(|g| g.map(|m| Value::string(m.as_str())).unwrap_or(Value::Nil))
                .collect();
            Ok(Value::array(groups))
        }
        None => Ok(Value::Nil),
    }
}

fn do_replace(pattern: &str, input: &str, args: &[Value], span: Span, all: bool) -> ScriptResult<Value> {
    let replacement = string_at(args, 2, span)?;
    let re = compile(pattern, span)?;
    let out = if all {
        re.replace_all(input, replacement.as_str()).into_owned()
    } else {
        re.replace(input, replacement.as_str()).into_owned()
    };
    if out.len() > MAX_PAYLOAD_BYTES {
        return Err(ScriptError::resource("regex output exceeds 1 MiB limit", span));
    }
    Ok(Value::string(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_all_advances_past_empty_matches() {
        let re = compile("a*", Span::UNKNOWN).unwrap();
        let result = re.replace_all("baa", "X");
        assert_eq!(result, "XbX");
    }
}
