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

//! Lexically nested variable frames — Component 2 of the core.
//!
//! Grounded on the teacher's `src/environment.rs` (parent-chain
//! `define`/`get`/`assign`), generalized from `Rc<RefCell<_>>` to
//! `Arc<Mutex<_>>` for the same reason as [`crate::value`]: an `Environment`
//! can be reached through a captured closure that outlives the call that
//! created it (module-level functions, rebound globals), so its handle type
//! has to match the rest of the `Send + Sync` value graph.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::value::Value;

pub struct Environment {
    values: Mutex<HashMap<String, Value>>,
    pub parent: Option<Arc<Environment>>,
}

impl Environment {
    pub fn root() -> Arc<Environment> {
        Arc::new(Environment {
            values: Mutex::new(HashMap::new()),
            parent: None,
        })
    }

    pub fn new_child(parent: &Arc<Environment>) -> Arc<Environment> {
        Arc::new(Environment {
            values: Mutex::new(HashMap::new()),
            parent: Some(Arc::clone(parent)),
        })
    }

    pub fn new_with_capacity(parent: Option<&Arc<Environment>>, capacity: usize) -> Arc<Environment> {
        Arc::new(Environment {
            values: Mutex::new(HashMap::with_capacity(capacity)),
            parent: parent.map(Arc::clone),
        })
    }

    /// Always writes in this frame, shadowing an outer binding of the same
    /// name if one exists.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.values.lock().unwrap().insert(name.into(), value);
    }

    /// Walks the parent chain; `None` means unbound anywhere.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.values.lock().unwrap().get(name) {
            return Some(v.clone());
        }
        match &self.parent {
            Some(p) => p.get(name),
            None => None,
        }
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.values.lock().unwrap().contains_key(name)
    }

    /// Updates the nearest enclosing frame that already defines `name`;
    /// if none does, defines it in this (the innermost) frame.
    pub fn set(&self, name: &str, value: Value) {
        if !self.try_assign(name, &value) {
            self.define(name.to_string(), value);
        }
    }

    fn try_assign(&self, name: &str, value: &Value) -> bool {
        {
            let mut guard = self.values.lock().unwrap();
            if guard.contains_key(name) {
                guard.insert(name.to_string(), value.clone());
                return true;
            }
        }
        match &self.parent {
            Some(p) => p.try_assign(name, value),
            None => false,
        }
    }

    /// Snapshot of this frame's own bindings (not ancestors') — used to
    /// harvest a `pride`-style block-as-object result or a module's
    /// exported-name set.
    pub fn own_bindings(&self) -> HashMap<String, Value> {
        self.values.lock().unwrap().clone()
    }
}

/// Pointer identity for seen-set traversals (memory estimator, call
/// rebinder). Two `Arc<Environment>` handles compare equal here iff they
/// point at the same frame.
pub fn env_identity(env: &Arc<Environment>) -> usize {
    Arc::as_ptr(env) as usize
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Environment(own={}, has_parent={})",
            self.values.lock().unwrap().len(),
            self.parent.is_some()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_walks_parent_chain() {
        let root = Environment::root();
        root.define("x", Value::Int(1));
        let child = Environment::new_child(&root);
        assert_eq!(child.get("x").map(|v| matches!(v, Value::Int(1))), Some(true));
    }

    #[test]
    fn set_updates_enclosing_frame_not_child() {
        let root = Environment::root();
        root.define("x", Value::Int(1));
        let child = Environment::new_child(&root);
        child.set("x", Value::Int(2));
        assert!(!child.has_own("x"));
        assert!(matches!(root.get("x"), Some(Value::Int(2))));
    }

    #[test]
    fn set_defines_in_current_frame_when_unbound() {
        let root = Environment::root();
        let child = Environment::new_child(&root);
        child.set("y", Value::Int(5));
        assert!(child.has_own("y"));
        assert!(root.get("y").is_none());
    }

    #[test]
    fn define_always_shadows_in_current_frame() {
        let root = Environment::root();
        root.define("x", Value::Int(1));
        let child = Environment::new_child(&root);
        child.define("x", Value::Int(9));
        assert!(matches!(child.get("x"), Some(Value::Int(9))));
        assert!(matches!(root.get("x"), Some(Value::Int(1))));
    }
}
