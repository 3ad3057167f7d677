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

//! The recursive tree-walking evaluator — Component 7 of the core.
//!
//! All actual evaluation is delegated to the following submodules:
//!
//!  - `statements.rs`  → statement execution (`exec_stmts`)
//!  - `expressions.rs` → expression evaluation (`eval_expr`)
//!  - `operators.rs`   → binary/unary/comparison semantics
//!  - `calls.rs`       → function/block/builtin/constructor dispatch, `require`
//!  - `classes.rs`     → class definition and method resolution
//!  - `helpers.rs`     → parameter binding shared by function and block calls
//!  - `display.rs`     → value-to-string formatting used by string builtins

pub mod calls;
pub mod classes;
pub mod display;
pub mod expressions;
pub mod helpers;
pub mod operators;
pub mod statements;

use std::sync::Arc;

use crate::engine::Frontend;
use crate::environment::Environment;
use crate::execution::ExecutionState;
use crate::span::Span;
use crate::value::Value;

/// Threaded through every evaluation function: the per-call state plus the
/// frontend a `require` needs to compile newly-loaded source text.
pub struct Ctx<'a> {
    pub state: &'a ExecutionState,
    pub frontend: &'a dyn Frontend,
}

impl<'a> Ctx<'a> {
    pub fn new(state: &'a ExecutionState, frontend: &'a dyn Frontend) -> Self {
        Self { state, frontend }
    }
}

/// The result of executing a statement list: either it ran to completion
/// (carrying the last expression's value, Ruby-style implicit return) or it
/// hit an explicit `return` (carrying that value and short-circuiting every
/// enclosing block up to the function boundary).
#[derive(Debug, Clone)]
pub enum Flow {
    Normal(Value),
    Returned(Value),
}

impl Flow {
    /// Unwraps either variant — used once a function/method/block call has
    /// reached its own boundary and `return`'s short-circuit no longer
    /// needs to propagate any further.
    pub fn into_value(self) -> Value {
        match self {
            Flow::Normal(v) | Flow::Returned(v) => v,
        }
    }

    pub fn is_returned(&self) -> bool {
        matches!(self, Flow::Returned(_))
    }
}

/// Pushes a new lexical frame onto the execution state's env stack (for the
/// memory estimator's benefit) and pops it on drop — so every early return
/// via `?` still leaves the stack balanced.
pub struct EnvGuard<'a> {
    state: &'a ExecutionState,
}

impl<'a> EnvGuard<'a> {
    pub fn enter(state: &'a ExecutionState, env: Arc<Environment>) -> Self {
        state.push_env(env);
        Self { state }
    }
}

impl<'a> Drop for EnvGuard<'a> {
    fn drop(&mut self) {
        self.state.pop_env();
    }
}

/// Pushes a call-stack frame (recursion accounting) and pops it on drop.
pub struct CallGuard<'a> {
    state: &'a ExecutionState,
}

impl<'a> CallGuard<'a> {
    pub fn enter(state: &'a ExecutionState, name: impl Into<String>, span: Span) -> ScriptResultUnit<Self> {
        state.push_call(name, span)?;
        Ok(Self { state })
    }
}

impl<'a> Drop for CallGuard<'a> {
    fn drop(&mut self) {
        self.state.pop_call();
    }
}

/// Pushes the method-dispatch receiver (for `self`/ivar lookups nested
/// calls may need) and pops it on drop.
pub struct ReceiverGuard<'a> {
    state: &'a ExecutionState,
}

impl<'a> ReceiverGuard<'a> {
    pub fn enter(state: &'a ExecutionState, value: Value) -> Self {
        state.push_receiver(value);
        Self { state }
    }
}

impl<'a> Drop for ReceiverGuard<'a> {
    fn drop(&mut self) {
        self.state.pop_receiver();
    }
}

type ScriptResultUnit<T> = Result<T, crate::error::ScriptError>;
