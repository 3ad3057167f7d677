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

//! A sandboxed, embeddable tree-walking interpreter for VaultScript, a
//! small dynamically-typed language meant to run untrusted
//! business-policy scripts under hard resource bounds.
//!
//! Start with [`Engine`] and [`EngineConfig`]: construct an engine,
//! optionally register capability adapters and host builtins, compile
//! source text through a host-supplied [`Frontend`] into a [`Script`],
//! then call a named function with [`Script::call`]. Every call runs
//! under its own step/memory/recursion budget and a fresh execution
//! state — nothing is shared across calls except the engine's module
//! cache.
//!
//! Module map:
//! - [`value`] — the runtime value model (Component 1).
//! - [`environment`] — lexically nested variable frames (Component 2).
//! - [`module_registry`] — `require` resolution and caching (Component 3).
//! - [`memory`] — the memory estimator (Component 4).
//! - [`capability`] — host-bound globals and per-method contracts (Component 5).
//! - [`execution`] — per-call budgets, stacks, and caches (Component 6).
//! - [`interpreter`] — the recursive evaluator (Component 7).
//! - [`engine`] — the script entry point (Component 8).
//! - [`rebinder`] — call-boundary closure rebinding (Component 9).
//! - [`dataonly`] — the data-only scan shared by strict-effects mode and
//!   capability contracts.
//! - [`typecheck`] — gradual `TypeExpr` ↔ `Value` matching.
//! - [`error`] — the shared error taxonomy.

pub mod ast;
pub mod builtins;
pub mod cancellation;
pub mod capability;
pub mod dataonly;
pub mod engine;
pub mod environment;
pub mod error;
pub mod execution;
pub mod interpreter;
pub mod memory;
pub mod module_registry;
pub mod rebinder;
pub mod span;
pub mod typecheck;
pub mod value;

pub use engine::{CallOptions, Engine, EngineConfig, Frontend, RandomSource, Script};
pub use error::{ErrorKind, ScriptError, ScriptResult};
pub use value::Value;
