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

//! Callable value kinds: user functions, blocks, classes, instances, and
//! host-registered builtins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::ast::{Param, Stmt, TypeExpr};
use crate::error::ScriptResult;
use crate::span::Span;
use crate::value::Value;
use crate::environment::Environment;

/// A user-defined function or method.
///
/// `env` is the lexical scope captured at definition time. When a function
/// value crosses a call boundary (stored in a global, passed as an
/// argument, reached through a capability binding) the Call Rebinder
/// produces a fresh `ScriptFunction` whose `env` points at the new per-call
/// root instead — the body, params, and metadata are shared (`Arc`), only
/// the captured environment changes.
#[derive(Debug)]
pub struct ScriptFunction {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: Vec<Stmt>,
    pub module_key: String,
    pub is_private: bool,
    pub is_class_method: bool,
    pub env: Arc<Environment>,
}

impl ScriptFunction {
    /// Clone of `self` with `env` replaced — used by the Call Rebinder.
    pub fn rebind(&self, env: Arc<Environment>) -> ScriptFunction {
        ScriptFunction {
            name: self.name.clone(),
            params: self.params.clone(),
            return_type: self.return_type.clone(),
            body: self.body.clone(),
            module_key: self.module_key.clone(),
            is_private: self.is_private,
            is_class_method: self.is_class_method,
            env,
        }
    }
}

/// A closure value produced by a `do |params| … end` block literal.
///
/// Unlike functions, arity mismatches on block calls are tolerant: extra
/// arguments are dropped, missing ones bind to `nil` or their default.
#[derive(Debug)]
pub struct Block {
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub env: Arc<Environment>,
    pub module_key: String,
}

impl Block {
    pub fn rebind(&self, env: Arc<Environment>) -> Block {
        Block {
            params: self.params.clone(),
            body: self.body.clone(),
            env,
            module_key: self.module_key.clone(),
        }
    }
}

/// A class definition: methods, class-methods, and a class-variable hash
/// populated once by evaluating `class_body` at module-load time.
#[derive(Debug)]
pub struct ClassDef {
    pub name: String,
    pub methods: HashMap<String, Arc<ScriptFunction>>,
    pub class_methods: HashMap<String, Arc<ScriptFunction>>,
    pub class_vars: Mutex<HashMap<String, Value>>,
    pub class_body: Vec<Stmt>,
    pub module_key: String,
}

impl ClassDef {
    pub fn method(&self, name: &str) -> Option<Arc<ScriptFunction>> {
        self.methods.get(name).cloned()
    }

    pub fn class_method(&self, name: &str) -> Option<Arc<ScriptFunction>> {
        self.class_methods.get(name).cloned()
    }

    pub fn get_class_var(&self, name: &str) -> Option<Value> {
        self.class_vars.lock().unwrap().get(name).cloned()
    }

    pub fn set_class_var(&self, name: String, value: Value) {
        self.class_vars.lock().unwrap().insert(name, value);
    }
}

/// An instantiated object: a class pointer plus an instance-variable hash
/// keyed by ivar name without the `@` sigil.
#[derive(Debug)]
pub struct Instance {
    pub class: Arc<ClassDef>,
    pub ivars: Mutex<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Arc<ClassDef>) -> Self {
        Self {
            class,
            ivars: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_ivar(&self, name: &str) -> Option<Value> {
        self.ivars.lock().unwrap().get(name).cloned()
    }

    pub fn set_ivar(&self, name: String, value: Value) {
        self.ivars.lock().unwrap().insert(name, value);
    }
}

/// Everything a host-registered builtin or block-taking array/hash method
/// needs beyond its own `args`: the ability to invoke a block value and
/// reach the engine's guarded random source. Implemented by the evaluator's
/// execution state so that `value.rs` does not need to depend on it.
pub trait Host {
    fn call_block(&self, block: &Arc<Block>, args: Vec<Value>) -> ScriptResult<Value>;
    fn random_bytes(&self, out: &mut [u8]);
}

/// The arguments passed to a native function, matching the evaluator's
/// `(receiver, args, kwargs, block)` call shape (spec.md §4.7).
pub struct BuiltinCall<'a> {
    pub receiver: Option<Value>,
    pub args: Vec<Value>,
    pub kwargs: HashMap<String, Value>,
    pub block: Option<Arc<Block>>,
    pub span: Span,
    pub host: &'a dyn Host,
}

impl<'a> BuiltinCall<'a> {
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }
}

pub type BuiltinFn = Arc<dyn Fn(BuiltinCall) -> ScriptResult<Value> + Send + Sync>;

/// A host- or core-registered native callable.
///
/// `auto_invoke` marks builtins that run immediately when referenced bare
/// (`now`, `uuid`, and any builtin a host registers via
/// `register_zero_arg_builtin`).
pub struct Builtin {
    pub name: String,
    pub auto_invoke: bool,
    pub func: BuiltinFn,
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("auto_invoke", &self.auto_invoke)
            .finish()
    }
}

impl Builtin {
    pub fn new(name: impl Into<String>, func: BuiltinFn) -> Self {
        Self {
            name: name.into(),
            auto_invoke: false,
            func,
        }
    }

    pub fn auto_invoke(name: impl Into<String>, func: BuiltinFn) -> Self {
        Self {
            name: name.into(),
            auto_invoke: true,
            func,
        }
    }
}
