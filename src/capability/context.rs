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

//! The `Context` capability specialization: exposes a host-resolved hash
//! that is deep-cloned before the script sees it, so mutating it can never
//! reach back into host-owned state (spec.md §4.4).

use std::collections::HashMap;
use std::sync::Arc;

use super::{CapabilityAdapter, CapabilityBinding};
use crate::error::ScriptResult;
use crate::value::{shared, Value};

pub struct ContextCapability {
    pub global_name: String,
    pub resolver: Arc<dyn Fn(&CapabilityBinding) -> ScriptResult<HashMap<String, Value>> + Send + Sync>,
}

impl ContextCapability {
    pub fn new(
        global_name: impl Into<String>,
        resolver: Arc<dyn Fn(&CapabilityBinding) -> ScriptResult<HashMap<String, Value>> + Send + Sync>,
    ) -> Self {
        Self {
            global_name: global_name.into(),
            resolver,
        }
    }
}

impl CapabilityAdapter for ContextCapability {
    fn bind(&self, binding: &CapabilityBinding) -> ScriptResult<HashMap<String, Value>> {
        let data = (self.resolver)(binding)?;
        let cloned = deep_clone(&Value::hash(data));
        let mut out = HashMap::new();
        out.insert(self.global_name.clone(), cloned);
        Ok(out)
    }
}

/// Cycle-safe deep clone of arrays/hashes/objects into fresh backing
/// storage. Scalars and callables are returned as-is — cloning a
/// `Function`/`Instance` would not make sense (and is not the point: the
/// goal is breaking the *mutable container* link back to host state).
pub fn deep_clone(value: &Value) -> Value {
    let mut memo: HashMap<usize, Value> = HashMap::new();
    deep_clone_inner(value, &mut memo)
}

fn deep_clone_inner(value: &Value, memo: &mut HashMap<usize, Value>) -> Value {
    match value {
        Value::Array(arr) => {
            let id = Arc::as_ptr(arr) as *const () as usize;
            if let Some(existing) = memo.get(&id) {
                return existing.clone();
            }
            let new_backing = shared(Vec::new());
            let placeholder = Value::Array(Arc::clone(&new_backing));
            memo.insert(id, placeholder.clone());
            let items: Vec<Value> = arr
                .lock()
                .unwrap()
                .iter()
                .map(|v| deep_clone_inner(v, memo))
                .collect();
            *new_backing.lock().unwrap() = items;
            placeholder
        }
        Value::Hash(map) => clone_map(map, memo, true),
        Value::Object(map) => clone_map(map, memo, false),
        other => other.clone(),
    }
}

fn clone_map(
    map: &crate::value::Shared<HashMap<String, Value>>,
    memo: &mut HashMap<usize, Value>,
    is_hash: bool,
) -> Value {
    let id = Arc::as_ptr(map) as *const () as usize;
    if let Some(existing) = memo.get(&id) {
        return existing.clone();
    }
    let new_backing = shared(HashMap::new());
    let placeholder = if is_hash {
        Value::Hash(Arc::clone(&new_backing))
    } else {
        Value::Object(Arc::clone(&new_backing))
    };
    memo.insert(id, placeholder.clone());
    let entries: HashMap<String, Value> = map
        .lock()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), deep_clone_inner(v, memo)))
        .collect();
    *new_backing.lock().unwrap() = entries;
    placeholder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_clone_breaks_aliasing() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), Value::Int(1));
        let original = Value::hash(map);
        let cloned = deep_clone(&original);

        if let (Value::Hash(orig_backing), Value::Hash(clone_backing)) = (&original, &cloned) {
            assert!(!Arc::ptr_eq(orig_backing, clone_backing));
        } else {
            panic!("expected hashes");
        }

        if let Value::Hash(orig_backing) = &original {
            orig_backing
                .lock()
                .unwrap()
                .insert("a".to_string(), Value::Int(999));
        }
        if let Value::Hash(clone_backing) = &cloned {
            assert!(matches!(clone_backing.lock().unwrap().get("a"), Some(Value::Int(1))));
        }
    }

    #[test]
    fn deep_clone_handles_cycles() {
        let arr = shared(vec![Value::Int(1)]);
        let value = Value::Array(Arc::clone(&arr));
        arr.lock().unwrap().push(value.clone());
        let cloned = deep_clone(&value);
        assert!(matches!(cloned, Value::Array(_)));
    }
}
