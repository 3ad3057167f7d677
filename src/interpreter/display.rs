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

//! Value-to-string formatting used by the `string` builtins (`to_s`,
//! `.template()` interpolation) — spec.md §4.8 "String library".

use crate::value::Value;

/// Top-level, human-facing rendering: bare strings print without quotes.
/// Used for `to_s` and for each `{name}` substitution inside
/// `.template()`.
pub fn display(value: &Value) -> String {
    match value {
        Value::Str(s) => s.to_string(),
        other => repr(other),
    }
}

/// Rendering used recursively inside arrays/hashes, where a nested string
/// element needs its quotes so the structure stays unambiguous.
pub fn repr(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Str(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        Value::Symbol(s) => format!(":{s}"),
        Value::Array(arr) => {
            let items = arr.lock().unwrap();
            let parts: Vec<String> = items.iter().map(repr).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Hash(map) | Value::Object(map) => {
            let guard = map.lock().unwrap();
            let keys = Value::sorted_keys(&guard);
            let parts: Vec<String> = keys
                .iter()
                .map(|k| format!("{k}: {}", repr(guard.get(k).expect("sorted key exists"))))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        Value::Money(m) => {
            let whole = m.minor_units as f64 / 100.0;
            format!("{:.2} {}", whole, m.currency())
        }
        Value::Duration(d) => format!("{}s", d.seconds),
        Value::Time(t) => t.strftime("%Y-%m-%dT%H:%M:%S%z"),
        Value::Range(r) => format!("{}..{}", r.start, r.end),
        Value::Function(f) => format!("<function {}>", f.name),
        Value::Builtin(b) => format!("<builtin {}>", b.name),
        Value::Block(_) => "<block>".to_string(),
        Value::Class(c) => format!("<class {}>", c.name),
        Value::Instance(i) => format!("<instance {}>", i.class.name),
    }
}

/// Trims a trailing `.0` the way most scripting languages print whole
/// floats, while leaving genuine fractional values alone.
fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn display_prints_bare_strings_without_quotes() {
        assert_eq!(display(&Value::string("hi")), "hi");
    }

    #[test]
    fn repr_quotes_nested_strings_inside_arrays() {
        let arr = Value::array(vec![Value::string("a"), Value::Int(1)]);
        assert_eq!(repr(&arr), "[\"a\", 1]");
    }

    #[test]
    fn repr_sorts_hash_keys() {
        let mut map = HashMap::new();
        map.insert("b".to_string(), Value::Int(2));
        map.insert("a".to_string(), Value::Int(1));
        assert_eq!(repr(&Value::hash(map)), "{a: 1, b: 2}");
    }

    #[test]
    fn whole_floats_print_with_one_decimal() {
        assert_eq!(repr(&Value::Float(3.0)), "3.0");
        assert_eq!(repr(&Value::Float(3.5)), "3.5");
    }
}
