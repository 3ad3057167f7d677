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

//! Rebinds functions/blocks/classes/instances crossing a call boundary to
//! a fresh per-call root environment — Component 9 of the core.
//!
//! A function's captured env is replaced wholesale by the new root, not
//! merged into it; the new root is already populated with this call's
//! globals and capabilities by the time rebinding runs. The traversal only
//! needs to be cycle-safe against the *argument graph* (an array holding
//! itself, an instance whose ivar holds a block that closed over that same
//! instance) — it never walks an environment's own bindings, so the
//! "captured env transitively contains the function itself" cycle the
//! design notes call out never actually reaches this code.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::environment::Environment;
use crate::value::{shared, ClassDef, Instance, Value};

pub struct Rebinder {
    new_root: Arc<Environment>,
    memo: Mutex<HashMap<usize, Value>>,
}

impl Rebinder {
    pub fn new(new_root: Arc<Environment>) -> Self {
        Self {
            new_root,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn rebind(&self, value: &Value) -> Value {
        match value {
            Value::Array(arr) => {
                let id = Arc::as_ptr(arr) as *const () as usize;
                if let Some(existing) = self.memo_get(id) {
                    return existing;
                }
                let backing = shared(Vec::new());
                let placeholder = Value::Array(Arc::clone(&backing));
                self.memo_set(id, placeholder.clone());
                let items: Vec<Value> = arr.lock().unwrap().iter().map(|v| self.rebind(v)).collect();
                *backing.lock().unwrap() = items;
                placeholder
            }
            Value::Hash(map) => self.rebind_map(map, true),
            Value::Object(map) => self.rebind_map(map, false),
            Value::Function(f) => {
                let id = Arc::as_ptr(f) as *const () as usize;
                if let Some(existing) = self.memo_get(id) {
                    return existing;
                }
                let rebound = Value::Function(Arc::new(f.rebind(Arc::clone(&self.new_root))));
                self.memo_set(id, rebound.clone());
                rebound
            }
            Value::Block(b) => {
                let id = Arc::as_ptr(b) as *const () as usize;
                if let Some(existing) = self.memo_get(id) {
                    return existing;
                }
                let rebound = Value::Block(Arc::new(b.rebind(Arc::clone(&self.new_root))));
                self.memo_set(id, rebound.clone());
                rebound
            }
            Value::Class(c) => {
                let id = Arc::as_ptr(c) as *const () as usize;
                if let Some(existing) = self.memo_get(id) {
                    return existing;
                }
                let rebound_methods: HashMap<String, Arc<crate::value::ScriptFunction>> = c
                    .methods
                    .iter()
                    .map(|(k, v)| (k.clone(), Arc::new(v.rebind(Arc::clone(&self.new_root)))))
                    .collect();
                let rebound_class_methods: HashMap<String, Arc<crate::value::ScriptFunction>> = c
                    .class_methods
                    .iter()
                    .map(|(k, v)| (k.clone(), Arc::new(v.rebind(Arc::clone(&self.new_root)))))
                    .collect();
                let new_class = Arc::new(ClassDef {
                    name: c.name.clone(),
                    methods: rebound_methods,
                    class_methods: rebound_class_methods,
                    class_vars: Mutex::new(HashMap::new()),
                    class_body: c.class_body.clone(),
                    module_key: c.module_key.clone(),
                });
                let placeholder = Value::Class(Arc::clone(&new_class));
                self.memo_set(id, placeholder.clone());
                let rebound_vars: HashMap<String, Value> = c
                    .class_vars
                    .lock()
                    .unwrap()
                    .iter()
                    .map(|(k, v)| (k.clone(), self.rebind(v)))
                    .collect();
                *new_class.class_vars.lock().unwrap() = rebound_vars;
                placeholder
            }
            Value::Instance(inst) => {
                let id = Arc::as_ptr(inst) as *const () as usize;
                if let Some(existing) = self.memo_get(id) {
                    return existing;
                }
                let rebound_class = match self.rebind(&Value::Class(Arc::clone(&inst.class))) {
                    Value::Class(c) => c,
                    _ => unreachable!("rebinding a Class value always yields a Class value"),
                };
                let new_instance = Arc::new(Instance::new(rebound_class));
                let placeholder = Value::Instance(Arc::clone(&new_instance));
                self.memo_set(id, placeholder.clone());
                let rebound_ivars: HashMap<String, Value> = inst
                    .ivars
                    .lock()
                    .unwrap()
                    .iter()
                    .map(|(k, v)| (k.clone(), self.rebind(v)))
                    .collect();
                *new_instance.ivars.lock().unwrap() = rebound_ivars;
                placeholder
            }
            other => other.clone(),
        }
    }

    fn rebind_map(&self, map: &crate::value::Shared<HashMap<String, Value>>, is_hash: bool) -> Value {
        let id = Arc::as_ptr(map) as *const () as usize;
        if let Some(existing) = self.memo_get(id) {
            return existing;
        }
        let backing = shared(HashMap::new());
        let placeholder = if is_hash {
            Value::Hash(Arc::clone(&backing))
        } else {
            Value::Object(Arc::clone(&backing))
        };
        self.memo_set(id, placeholder.clone());
        let entries: HashMap<String, Value> = map
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), self.rebind(v)))
            .collect();
        *backing.lock().unwrap() = entries;
        placeholder
    }

    fn memo_get(&self, id: usize) -> Option<Value> {
        self.memo.lock().unwrap().get(&id).cloned()
    }

    fn memo_set(&self, id: usize, value: Value) {
        self.memo.lock().unwrap().insert(id, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Param;
    use crate::value::ScriptFunction;

    fn make_function(env: Arc<Environment>) -> Arc<ScriptFunction> {
        Arc::new(ScriptFunction {
            name: "f".to_string(),
            params: Vec::<Param>::new(),
            return_type: None,
            body: Vec::new(),
            module_key: "main".to_string(),
            is_private: false,
            is_class_method: false,
            env,
        })
    }

    #[test]
    fn rebinds_captured_env_to_new_root() {
        let old_root = Environment::root();
        let new_root = Environment::root();
        let func = Value::Function(make_function(old_root));
        let rebinder = Rebinder::new(Arc::clone(&new_root));
        let rebound = rebinder.rebind(&func);
        if let Value::Function(f) = rebound {
            assert!(Arc::ptr_eq(&f.env, &new_root));
        } else {
            panic!("expected function");
        }
    }

    #[test]
    fn same_function_rebound_once_across_shared_references() {
        let old_root = Environment::root();
        let new_root = Environment::root();
        let func = Value::Function(make_function(old_root));
        let array = Value::array(vec![func.clone(), func]);
        let rebinder = Rebinder::new(new_root);
        let rebound = rebinder.rebind(&array);
        if let Value::Array(items) = rebound {
            let items = items.lock().unwrap();
            match (&items[0], &items[1]) {
                (Value::Function(a), Value::Function(b)) => assert!(Arc::ptr_eq(a, b)),
                _ => panic!("expected two function values"),
            }
        } else {
            panic!("expected array");
        }
    }

    #[test]
    fn self_referential_array_terminates() {
        let arr = shared(vec![Value::Int(1)]);
        let value = Value::Array(Arc::clone(&arr));
        arr.lock().unwrap().push(value.clone());
        let rebinder = Rebinder::new(Environment::root());
        let rebound = rebinder.rebind(&value);
        assert!(matches!(rebound, Value::Array(_)));
    }
}
