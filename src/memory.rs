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

//! Run-time size approximation of a live value graph — Component 4 of the
//! core. Not a tracing GC: a one-shot walker re-run at the checkpoints
//! `spec.md` §4.3 names, with seen-sets keyed by pointer identity so
//! aliased containers are only counted once.

use std::collections::HashSet;
use std::sync::Arc;

use crate::environment::{env_identity, Environment};
use crate::error::ScriptError;
use crate::span::Span;
use crate::value::Value;

const ENV_OVERHEAD: usize = 64;
const SCALAR_OVERHEAD: usize = 16;
const MAP_ENTRY_OVERHEAD: usize = 56;
const ARRAY_ELEM_OVERHEAD: usize = 8;
const STRING_BASE_OVERHEAD: usize = 24;
const CALLABLE_OVERHEAD: usize = 96;

/// Walks a value/environment graph once, returning a byte estimate while
/// deduplicating anything already visited in this walk via pointer
/// identity.
#[derive(Default)]
pub struct MemoryEstimator {
    seen_envs: HashSet<usize>,
    seen_containers: HashSet<usize>,
    seen_strings: HashSet<(usize, usize)>,
    seen_callables: HashSet<usize>,
}

impl MemoryEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn estimate_env(&mut self, env: &Arc<Environment>) -> usize {
        let id = env_identity(env);
        if !self.seen_envs.insert(id) {
            return 0;
        }
        let mut total = ENV_OVERHEAD;
        for (key, value) in env.own_bindings() {
            total += STRING_BASE_OVERHEAD + key.len();
            total += self.estimate_value(&value);
        }
        if let Some(parent) = &env.parent {
            total += self.estimate_env(parent);
        }
        total
    }

    pub fn estimate_value(&mut self, value: &Value) -> usize {
        match value {
            Value::Nil | Value::Bool(_) => SCALAR_OVERHEAD,
            Value::Int(_) | Value::Float(_) => SCALAR_OVERHEAD,
            Value::Money(_) | Value::Duration(_) | Value::Time(_) | Value::Range(_) => {
                SCALAR_OVERHEAD
            }
            Value::Str(s) | Value::Symbol(s) => {
                let ptr = Arc::as_ptr(s) as *const () as usize;
                if self.seen_strings.insert((ptr, s.len())) {
                    STRING_BASE_OVERHEAD + s.len()
                } else {
                    0
                }
            }
            Value::Array(arr) => {
                let id = Arc::as_ptr(arr) as *const () as usize;
                if !self.seen_containers.insert(id) {
                    return 0;
                }
                let items = arr.lock().unwrap();
                let mut total = ARRAY_ELEM_OVERHEAD * items.len();
                for item in items.iter() {
                    total += self.estimate_value(item);
                }
                total
            }
            Value::Hash(map) | Value::Object(map) => {
                let id = Arc::as_ptr(map) as *const () as usize;
                if !self.seen_containers.insert(id) {
                    return 0;
                }
                let entries = map.lock().unwrap();
                let mut total = 0;
                for (key, val) in entries.iter() {
                    total += MAP_ENTRY_OVERHEAD + key.len();
                    total += self.estimate_value(val);
                }
                total
            }
            Value::Function(f) => {
                let id = Arc::as_ptr(f) as *const () as usize;
                if !self.seen_callables.insert(id) {
                    return 0;
                }
                CALLABLE_OVERHEAD + self.estimate_env(&f.env)
            }
            Value::Block(b) => {
                let id = Arc::as_ptr(b) as *const () as usize;
                if !self.seen_callables.insert(id) {
                    return 0;
                }
                CALLABLE_OVERHEAD + self.estimate_env(&b.env)
            }
            Value::Builtin(b) => {
                let id = Arc::as_ptr(b) as *const () as usize;
                if !self.seen_callables.insert(id) {
                    return 0;
                }
                CALLABLE_OVERHEAD
            }
            Value::Class(c) => {
                let id = Arc::as_ptr(c) as *const () as usize;
                if !self.seen_callables.insert(id) {
                    return 0;
                }
                let mut total = CALLABLE_OVERHEAD;
                for var in c.class_vars.lock().unwrap().values() {
                    total += self.estimate_value(var);
                }
                total
            }
            Value::Instance(inst) => {
                let id = Arc::as_ptr(inst) as *const () as usize;
                if !self.seen_callables.insert(id) {
                    return 0;
                }
                let mut total = CALLABLE_OVERHEAD;
                for var in inst.ivars.lock().unwrap().values() {
                    total += self.estimate_value(var);
                }
                total += self.estimate_value(&Value::Class(Arc::clone(&inst.class)));
                total
            }
        }
    }
}

/// Checks the root env plus any extra in-flight values (call arguments
/// being bound, default-expression results) against `budget`, returning a
/// resource-kind error naming the configured byte budget on overflow.
pub fn check_memory_budget(
    root_env: &Arc<Environment>,
    extra: &[Value],
    budget_bytes: usize,
    span: Span,
) -> Result<(), ScriptError> {
    let mut estimator = MemoryEstimator::new();
    let mut total = estimator.estimate_env(root_env);
    for value in extra {
        total += estimator.estimate_value(value);
    }
    if total > budget_bytes {
        return Err(ScriptError::resource(
            format!("memory quota exceeded: used ~{total} bytes, budget {budget_bytes} bytes"),
            span,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliased_array_counted_once() {
        let mut est = MemoryEstimator::new();
        let shared_arr = Value::array(vec![Value::Int(1), Value::Int(2)]);
        let pair = Value::array(vec![shared_arr.clone(), shared_arr]);
        let size_pair = est.estimate_value(&pair);

        let mut est2 = MemoryEstimator::new();
        let solo = Value::array(vec![Value::Int(1), Value::Int(2)]);
        let size_solo = est2.estimate_value(&solo);

        // The pair holds the same backing array twice, so the marginal
        // cost over holding it once is just the two array-slot overheads,
        // not a second full copy of the inner array's contents.
        assert!(size_pair < size_solo * 2);
    }

    #[test]
    fn quota_exceeded_message_contains_canonical_substring() {
        let root = crate::environment::Environment::root();
        root.define("big", Value::array(vec![Value::Int(0); 1000]));
        let err = check_memory_budget(&root, &[], 10, Span::UNKNOWN).unwrap_err();
        assert!(err.to_string().contains("memory quota exceeded"));
    }
}
