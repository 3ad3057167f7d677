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

//! The "data-only" cycle-safe scan shared by strict-effects mode
//! (spec.md §4.5) and capability contracts' callable-forbidding policy
//! (spec.md §4.4).

use std::collections::HashSet;
use std::sync::Arc;

use crate::value::Value;

/// True if `value`, or anything reachable from it through arrays/hashes/
/// objects, is a function, builtin, block, class, or instance.
pub fn contains_callable(value: &Value) -> bool {
    let mut seen = HashSet::new();
    scan(value, &mut seen)
}

fn scan(value: &Value, seen: &mut HashSet<usize>) -> bool {
    match value {
        Value::Function(_) | Value::Builtin(_) | Value::Block(_) | Value::Class(_) | Value::Instance(_) => {
            true
        }
        Value::Array(arr) => {
            let id = Arc::as_ptr(arr) as *const () as usize;
            if !seen.insert(id) {
                return false;
            }
            arr.lock().unwrap().iter().any(|v| scan(v, seen))
        }
        Value::Hash(map) | Value::Object(map) => {
            let id = Arc::as_ptr(map) as *const () as usize;
            if !seen.insert(id) {
                return false;
            }
            map.lock().unwrap().values().any(|v| scan(v, seen))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{shared, Value};
    use std::collections::HashMap;

    #[test]
    fn scalar_and_data_containers_are_data_only() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), Value::Int(1));
        assert!(!contains_callable(&Value::hash(map)));
        assert!(!contains_callable(&Value::array(vec![Value::string("x")])));
    }

    #[test]
    fn nested_builtin_is_detected() {
        let inner = Value::array(vec![Value::Builtin(Arc::new(crate::value::Builtin::new(
            "f",
            Arc::new(|_| Ok(Value::Nil)),
        )))]);
        let outer = Value::array(vec![inner]);
        assert!(contains_callable(&outer));
    }

    #[test]
    fn cyclic_array_terminates() {
        let arr = shared(vec![Value::Int(1)]);
        let value = Value::Array(Arc::clone(&arr));
        arr.lock().unwrap().push(value.clone());
        assert!(!contains_callable(&value));
    }
}
