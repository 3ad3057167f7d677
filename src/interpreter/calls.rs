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

//! Function/block/builtin/constructor dispatch and the `require`
//! orchestration deliberately kept out of `execution.rs` (spec.md §4.2,
//! §4.7 "Function / method dispatch").

use std::collections::HashMap;
use std::sync::Arc;

use crate::environment::Environment;
use crate::error::{ScriptError, ScriptResult};
use crate::interpreter::helpers::bind_params;
use crate::interpreter::statements::exec_stmts;
use crate::interpreter::{CallGuard, Ctx, EnvGuard, Flow, ReceiverGuard};
use crate::module_registry::ModuleEntry;
use crate::span::Span;
use crate::typecheck::type_matches;
use crate::value::{Block, Builtin, BuiltinCall, ClassDef, Host, Instance, ScriptFunction, Value};

/// Implements [`Host`] for builtins invoked outside of any running call
/// (unit tests for capability adapters). `call_block` always fails since
/// there is no evaluator behind it; that is the point — a real call never
/// uses this.
pub struct NullHost;

impl Host for NullHost {
    fn call_block(&self, _block: &Arc<Block>, _args: Vec<Value>) -> ScriptResult<Value> {
        Err(ScriptError::capability(
            "blocks cannot be invoked outside of a running call",
            Span::UNKNOWN,
        ))
    }

    fn random_bytes(&self, out: &mut [u8]) {
        out.fill(0);
    }
}

/// Implements [`Host`] over a live [`Ctx`] so native builtins can call a
/// block argument or reach the engine's guarded random source without
/// `value.rs` depending on the evaluator.
pub struct EvalHost<'a, 'b> {
    pub ctx: &'a Ctx<'b>,
}

impl<'a, 'b> Host for EvalHost<'a, 'b> {
    fn call_block(&self, block: &Arc<Block>, args: Vec<Value>) -> ScriptResult<Value> {
        call_block_value(self.ctx, block, args, HashMap::new(), Span::UNKNOWN)
    }

    fn random_bytes(&self, out: &mut [u8]) {
        self.ctx.state.fill_random(out)
    }
}

/// Calls a user function, binding `receiver` as `self` when dispatched as a
/// method.
pub fn call_function(
    ctx: &Ctx,
    func: &Arc<ScriptFunction>,
    receiver: Option<Value>,
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    block: Option<Arc<Block>>,
    span: Span,
) -> ScriptResult<Value> {
    ctx.state.check_cancelled(span)?;
    ctx.state.check_memory(&args, span)?;
    let _call_guard = CallGuard::enter(ctx.state, func.name.clone(), span)?;

    let call_env = Environment::new_child(&func.env);
    let _env_guard = EnvGuard::enter(ctx.state, call_env.clone());

    let self_instance = match &receiver {
        Some(Value::Instance(i)) => Some(i.clone()),
        _ => None,
    };
    let _receiver_guard = receiver.clone().map(|r| ReceiverGuard::enter(ctx.state, r));
    if let Some(r) = &receiver {
        call_env.define("self", r.clone());
    }
    if let Some(b) = &block {
        call_env.define("__block__", Value::Block(Arc::clone(b)));
    }

    bind_params(
        ctx,
        &call_env,
        &func.params,
        args,
        &kwargs,
        false,
        self_instance.as_ref(),
        &func.name,
        span,
    )?;

    let flow = exec_stmts(ctx, &call_env, &func.body)?;
    let value = flow.into_value();

    if let Some(rt) = &func.return_type {
        if !type_matches(rt, &value) {
            return Err(ScriptError::type_error(
                format!(
                    "return value for {} expected {}, got {}",
                    func.name,
                    rt.describe(),
                    value.type_name()
                ),
                span,
            ));
        }
    }

    Ok(value)
}

/// Calls a block value: tolerant arity/kwarg binding, no recursion-stack
/// frame of its own name (blocks don't appear in stack traces as distinct
/// frames from the function they were passed into) but still checked
/// against the recursion limit since they can recurse arbitrarily via
/// `yield`/`call`.
pub fn call_block_value(
    ctx: &Ctx,
    block: &Arc<Block>,
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    span: Span,
) -> ScriptResult<Value> {
    ctx.state.check_cancelled(span)?;
    ctx.state.check_memory(&args, span)?;
    let _call_guard = CallGuard::enter(ctx.state, "<block>", span)?;

    let call_env = Environment::new_child(&block.env);
    let _env_guard = EnvGuard::enter(ctx.state, call_env.clone());

    bind_params(ctx, &call_env, &block.params, args, &kwargs, true, None, "<block>", span)?;

    let flow = exec_stmts(ctx, &call_env, &block.body)?;
    Ok(flow.into_value())
}

/// Calls a native builtin, bracketing it with its attached contract (if
/// any) as spec.md §4.4 requires.
pub fn call_builtin(
    ctx: &Ctx,
    builtin: &Arc<Builtin>,
    receiver: Option<Value>,
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    block: Option<Arc<Block>>,
    span: Span,
) -> ScriptResult<Value> {
    ctx.state.check_cancelled(span)?;

    let contract = ctx.state.contracts.lookup(builtin).cloned();
    if let Some(contract) = &contract {
        (contract.validate_args)(&args, &kwargs, block.as_ref(), span)?;
    }

    let host = EvalHost { ctx };
    let call = BuiltinCall {
        receiver,
        args,
        kwargs,
        block,
        span,
        host: &host,
    };
    let result = (builtin.func)(call)?;

    if let Some(contract) = &contract {
        (contract.validate_return)(&result, span)?;
    }

    Ok(result)
}

/// `Class.new(args…)`: an empty-ivar instance, then `initialize` if the
/// class defines one.
pub fn construct_instance(
    ctx: &Ctx,
    class: &Arc<ClassDef>,
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    span: Span,
) -> ScriptResult<Value> {
    let instance = Arc::new(Instance::new(Arc::clone(class)));
    if let Some(init) = class.method("initialize") {
        call_function(
            ctx,
            &init,
            Some(Value::Instance(Arc::clone(&instance))),
            args,
            kwargs,
            None,
            span,
        )?;
    }
    Ok(Value::Instance(instance))
}

/// Generic call dispatch once the callee has already been resolved to a
/// `Value` (used for calls through a plain identifier/expression, as
/// opposed to `object.method(...)` which resolves member access first —
/// see `expressions::dispatch_method_call`).
pub fn call_value(
    ctx: &Ctx,
    callee: Value,
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    block: Option<Arc<Block>>,
    span: Span,
) -> ScriptResult<Value> {
    match callee {
        Value::Function(f) => call_function(ctx, &f, None, args, kwargs, block, span),
        Value::Builtin(b) => call_builtin(ctx, &b, None, args, kwargs, block, span),
        Value::Block(b) => call_block_value(ctx, &b, args, kwargs, span),
        Value::Class(c) => construct_instance(ctx, &c, args, kwargs, span),
        other => Err(ScriptError::type_error(
            format!("{} is not callable", other.type_name()),
            span,
        )),
    }
}

/// `require(rel_path, as: alias?)`. Resolves and (on cache miss) compiles
/// and evaluates the target file's top-level statements in a fresh module
/// environment, then either aliases the module value or merges its
/// exports into `caller_env` without overwriting existing bindings
/// (spec.md §4.2).
pub fn require_module(
    ctx: &Ctx,
    caller_env: &Arc<Environment>,
    rel_path: &str,
    alias: Option<&str>,
    span: Span,
) -> ScriptResult<()> {
    if !ctx.state.allow_require {
        return Err(ScriptError::capability(
            "require is disabled for this call (allow_require: false)",
            span,
        ));
    }
    let registry = Arc::clone(&ctx.state.module_registry);
    let requiring_root = ctx.state.module_root();
    let (resolved_path, root) = registry.resolve(&requiring_root, rel_path, span)?;
    let key = crate::module_registry::ModuleRegistry::cache_key(&resolved_path);

    let entry = match registry.get_cached(&key) {
        Some(entry) => entry,
        None => {
            ctx.state.begin_loading(&key, span)?;
            let load_result = (|| -> ScriptResult<ModuleEntry> {
                let source = std::fs::read_to_string(&resolved_path).map_err(|e| {
                    ScriptError::module(format!("module not found: {rel_path} ({e})"), span)
                })?;
                let module = ctx.frontend.parse(&source)?;

                let module_env = Environment::root();
                ctx.state.push_module_root(root.clone());
                let exec_result = (|| -> ScriptResult<()> {
                    let _env_guard = EnvGuard::enter(ctx.state, Arc::clone(&module_env));
                    exec_stmts(ctx, &module_env, &module.statements)?;
                    Ok(())
                })();
                ctx.state.pop_module_root();
                exec_result?;

                let mut export_names = Vec::new();
                let mut exports = std::collections::HashMap::new();
                for (name, value) in module_env.own_bindings() {
                    if is_public_export(&module.statements, &name) {
                        export_names.push(name.clone());
                        exports.insert(name, value);
                    }
                }
                export_names.sort();
                Ok(ModuleEntry {
                    value: Value::hash(exports),
                    export_names,
                })
            })();
            ctx.state.end_loading(&key);
            let entry = load_result?;
            registry.insert(key.clone(), entry.clone());
            entry
        }
    };

    if let Some(alias) = alias {
        if caller_env.has_own(alias) {
            match caller_env.get(alias) {
                Some(existing) if Value::equals(&existing, &entry.value) => {}
                _ => {
                    return Err(ScriptError::module(
                        format!("require alias {alias} conflicts with an existing binding"),
                        span,
                    ))
                }
            }
        }
        caller_env.define(alias.to_string(), entry.value);
    } else if let Value::Hash(map) = &entry.value {
        let exports = map.lock().unwrap().clone();
        for name in &entry.export_names {
            if !caller_env.has_own(name) {
                if let Some(value) = exports.get(name) {
                    caller_env.define(name.clone(), value.clone());
                }
            }
        }
    }

    Ok(())
}

/// A name is exported from a module if it is a non-private top-level
/// function or class definition.
fn is_public_export(statements: &[crate::ast::Stmt], name: &str) -> bool {
    use crate::ast::Stmt;
    statements.iter().any(|stmt| match stmt {
        Stmt::FunctionDef { name: n, is_private, .. } => n == name && !is_private,
        Stmt::ClassDef { name: n, is_private, .. } => n == name && !is_private,
        _ => false,
    })
}
