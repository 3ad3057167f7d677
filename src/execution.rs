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

//! The per-call object carrying every budget, stack, and cache the
//! evaluator consults — Component 6 of the core.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::cancellation::CancellationHandle;
use crate::capability::ContractTable;
use crate::environment::Environment;
use crate::error::ScriptError;
use crate::memory::check_memory_budget;
use crate::module_registry::ModuleRegistry;
use crate::span::Span;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct CallFrame {
    pub name: String,
    pub span: Span,
}

/// Everything one call to `Script::call` needs, constructed fresh each
/// call and discarded when it returns (only the module registry outlives
/// it, owned by the `Engine`).
pub struct ExecutionState {
    pub cancel: CancellationHandle,
    pub step_budget: u64,
    step_counter: AtomicU64,
    pub memory_budget_bytes: usize,
    pub recursion_limit: usize,
    call_stack: Mutex<Vec<CallFrame>>,
    receiver_stack: Mutex<Vec<Value>>,
    env_stack: Mutex<Vec<Arc<Environment>>>,
    pub module_registry: Arc<ModuleRegistry>,
    loading: Mutex<HashSet<String>>,
    load_stack: Mutex<Vec<String>>,
    module_context_stack: Mutex<Vec<PathBuf>>,
    pub contracts: ContractTable,
    pub strict_effects: bool,
    pub allow_require: bool,
    random: Mutex<rand::rngs::StdRng>,
}

impl ExecutionState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        root_env: Arc<Environment>,
        cancel: CancellationHandle,
        step_budget: u64,
        memory_budget_bytes: usize,
        recursion_limit: usize,
        module_registry: Arc<ModuleRegistry>,
        module_root: PathBuf,
        contracts: ContractTable,
        strict_effects: bool,
        random_seed: [u8; 32],
    ) -> Self {
        Self::with_require_policy(
            root_env,
            cancel,
            step_budget,
            memory_budget_bytes,
            recursion_limit,
            module_registry,
            module_root,
            contracts,
            strict_effects,
            random_seed,
            true,
        )
    }

    /// Same as [`ExecutionState::new`] but lets the caller disable
    /// `require` for this call (`script.call`'s `allow_require: false`).
    #[allow(clippy::too_many_arguments)]
    pub fn with_require_policy(
        root_env: Arc<Environment>,
        cancel: CancellationHandle,
        step_budget: u64,
        memory_budget_bytes: usize,
        recursion_limit: usize,
        module_registry: Arc<ModuleRegistry>,
        module_root: PathBuf,
        contracts: ContractTable,
        strict_effects: bool,
        random_seed: [u8; 32],
        allow_require: bool,
    ) -> Self {
        use rand::SeedableRng;
        ExecutionState {
            cancel,
            step_budget,
            step_counter: AtomicU64::new(0),
            memory_budget_bytes,
            recursion_limit,
            call_stack: Mutex::new(Vec::new()),
            receiver_stack: Mutex::new(Vec::new()),
            env_stack: Mutex::new(vec![root_env]),
            module_registry,
            loading: Mutex::new(HashSet::new()),
            load_stack: Mutex::new(Vec::new()),
            module_context_stack: Mutex::new(vec![module_root]),
            contracts,
            strict_effects,
            allow_require,
            random: Mutex::new(rand::rngs::StdRng::from_seed(random_seed)),
        }
    }

    pub fn root_env(&self) -> Arc<Environment> {
        self.env_stack.lock().unwrap()[0].clone()
    }

    pub fn current_env(&self) -> Arc<Environment> {
        self.env_stack
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("env stack is never empty")
    }

    pub fn push_env(&self, env: Arc<Environment>) {
        self.env_stack.lock().unwrap().push(env);
    }

    pub fn pop_env(&self) {
        let mut stack = self.env_stack.lock().unwrap();
        if stack.len() > 1 {
            stack.pop();
        }
    }

    /// Increments the per-statement/per-expression step counter, failing
    /// once `step_budget` is exceeded.
    pub fn check_step(&self, span: Span) -> Result<(), ScriptError> {
        let count = self.step_counter.fetch_add(1, Ordering::Relaxed) + 1;
        if count > self.step_budget {
            return Err(ScriptError::resource(
                format!("step quota exceeded: budget {}", self.step_budget),
                span,
            ));
        }
        Ok(())
    }

    pub fn check_cancelled(&self, span: Span) -> Result<(), ScriptError> {
        if self.cancel.is_cancelled() {
            return Err(ScriptError::cancellation("context cancelled", span));
        }
        Ok(())
    }

    pub fn check_memory(&self, extra: &[Value], span: Span) -> Result<(), ScriptError> {
        check_memory_budget(&self.current_env(), extra, self.memory_budget_bytes, span)
    }

    pub fn push_call(&self, name: impl Into<String>, span: Span) -> Result<(), ScriptError> {
        let mut stack = self.call_stack.lock().unwrap();
        if stack.len() >= self.recursion_limit {
            return Err(ScriptError::resource(
                format!("recursion limit exceeded: limit {}", self.recursion_limit),
                span,
            ));
        }
        stack.push(CallFrame {
            name: name.into(),
            span,
        });
        Ok(())
    }

    pub fn pop_call(&self) {
        self.call_stack.lock().unwrap().pop();
    }

    pub fn call_stack_snapshot(&self) -> Vec<CallFrame> {
        self.call_stack.lock().unwrap().clone()
    }

    pub fn push_receiver(&self, value: Value) {
        self.receiver_stack.lock().unwrap().push(value);
    }

    pub fn pop_receiver(&self) {
        self.receiver_stack.lock().unwrap().pop();
    }

    pub fn current_receiver(&self) -> Option<Value> {
        self.receiver_stack.lock().unwrap().last().cloned()
    }

    pub fn module_root(&self) -> PathBuf {
        self.module_context_stack
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }

    pub fn push_module_root(&self, root: PathBuf) {
        self.module_context_stack.lock().unwrap().push(root);
    }

    pub fn pop_module_root(&self) {
        let mut stack = self.module_context_stack.lock().unwrap();
        if stack.len() > 1 {
            stack.pop();
        }
    }

    /// Begins loading `key`, failing with a cycle error if it is already on
    /// the load stack.
    pub fn begin_loading(&self, key: &str, span: Span) -> Result<(), ScriptError> {
        let mut stack = self.load_stack.lock().unwrap();
        if stack.iter().any(|k| k == key) {
            let chain = stack.join(" -> ");
            warn!(module = key, chain, "module require cycle detected");
            return Err(ScriptError::module(
                format!("module cycle detected: {chain} -> {key}"),
                span,
            ));
        }
        stack.push(key.to_string());
        self.loading.lock().unwrap().insert(key.to_string());
        Ok(())
    }

    pub fn end_loading(&self, key: &str) {
        self.load_stack.lock().unwrap().retain(|k| k != key);
        self.loading.lock().unwrap().remove(key);
    }

    pub fn fill_random(&self, out: &mut [u8]) {
        use rand::RngCore;
        self.random.lock().unwrap().fill_bytes(out);
    }
}
