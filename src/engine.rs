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

//! The crate's entry surface: [`Frontend`], [`EngineConfig`], [`Engine`],
//! and [`Script`] — Component 8 ("Script Entry Point") of the core, plus
//! the configuration knobs spec.md §6 enumerates under `Engine::new`.
//!
//! A host embeds this crate by implementing [`Frontend`] (turning source
//! text into an [`crate::ast::Module`] — parsing itself is out of scope
//! here), constructing an [`Engine`] with whatever capability adapters and
//! host builtins it needs, compiling scripts, and calling named functions
//! inside them. Each [`Script::call`] builds an entirely fresh
//! [`ExecutionState`] and root [`Environment`] — nothing carries over
//! between calls except the `Engine`'s module cache.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info_span, warn};

use crate::ast::Module;
use crate::builtins;
use crate::cancellation::CancellationHandle;
use crate::capability::{attach_contracts, bind_capabilities, CapabilityAdapter, CapabilityBinding};
use crate::dataonly;
use crate::environment::Environment;
use crate::error::{ScriptError, ScriptResult};
use crate::execution::ExecutionState;
use crate::interpreter::calls::call_value;
use crate::interpreter::Ctx;
use crate::module_registry::ModuleRegistry;
use crate::rebinder::Rebinder;
use crate::span::Span;
use crate::value::{Builtin, BuiltinCall, Value};

/// A host-supplied source-to-AST compiler. The lexer/parser/grammar are a
/// host collaborator out of scope for this crate (spec.md §6 "Source file
/// format"); this crate only walks the tree a `Frontend` produces.
pub trait Frontend: Send + Sync {
    fn parse(&self, source: &str) -> ScriptResult<Module>;
}

/// Supplies the 32-byte seed each call's guarded random source (`uuid`,
/// `random_id`, a host's own builtins reaching `BuiltinCall::host`) is
/// drawn from. The default is an OS-backed CSPRNG; hosts that need
/// deterministic replay in tests can supply their own.
pub trait RandomSource: Send + Sync {
    fn seed(&self) -> [u8; 32];
}

/// Seeds from the OS's secure random source on every call.
pub struct OsRandomSource;

impl RandomSource for OsRandomSource {
    fn seed(&self) -> [u8; 32] {
        use rand::RngCore;
        let mut seed = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut seed);
        seed
    }
}

/// Engine construction options (spec.md §6 `Engine::new(config)`).
pub struct EngineConfig {
    pub step_quota: u64,
    pub memory_quota_bytes: usize,
    pub recursion_limit: usize,
    pub strict_effects: bool,
    pub module_paths: Vec<PathBuf>,
    pub module_allow_list: Vec<String>,
    pub module_deny_list: Vec<String>,
    pub max_cached_modules: usize,
    pub random_reader: Arc<dyn RandomSource>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_quota: 50_000,
            memory_quota_bytes: 64 * 1024,
            recursion_limit: 64,
            strict_effects: false,
            module_paths: Vec::new(),
            module_allow_list: Vec::new(),
            module_deny_list: Vec::new(),
            max_cached_modules: 1000,
            random_reader: Arc::new(OsRandomSource),
        }
    }
}

/// A compiled module, bound to nothing until `Script::call` names a
/// function inside it and supplies a fresh execution context.
pub struct Script {
    module: Module,
}

impl Script {
    /// Resolves and calls a top-level function by name, per spec.md §6
    /// `script.call(ctx, name, args, opts)`.
    ///
    /// Builds a fresh root environment, installs (in order) the core
    /// library globals, this engine's host-registered builtins, and
    /// `opts.globals` (after the strict-effects data-only check, if
    /// enabled); runs the module's top-level statements once to populate
    /// function/class definitions; binds `opts.capabilities` and attaches
    /// their contracts; then invokes `name` with `args`/`opts.keywords`.
    #[allow(clippy::too_many_arguments)]
    pub fn call(
        &self,
        engine: &Engine,
        frontend: &dyn Frontend,
        name: &str,
        args: Vec<Value>,
        opts: CallOptions,
        cancel: CancellationHandle,
    ) -> ScriptResult<Value> {
        let span = Span::UNKNOWN;
        let _guard = info_span!("script_call", function = name).entered();

        if engine.config.strict_effects {
            if let Some(bad) = first_non_data_global(&opts.globals) {
                return Err(ScriptError::capability(
                    format!("strict effects: global {bad} must be data-only"),
                    span,
                ));
            }
        }

        let root_env = Environment::root();
        for (key, value) in builtins::core::global_bindings() {
            root_env.define(key, value);
        }
        for (key, value) in &engine.host_builtins {
            root_env.define(key.clone(), value.clone());
        }

        let binding = CapabilityBinding { cancel: cancel.clone() };
        let (capability_globals, contracts_by_name) =
            bind_capabilities(&opts.capabilities, &binding, span)?;
        for (key, value) in &capability_globals {
            root_env.define(key.clone(), value.clone());
        }

        // Caller-supplied globals are rebound onto this call's fresh root
        // so any closures they carry see this call's bindings, not
        // whatever environment produced them.
        let rebinder = Rebinder::new(Arc::clone(&root_env));
        for (key, value) in &opts.globals {
            root_env.define(key.clone(), rebinder.rebind(value));
        }

        let contracts = attach_contracts(&capability_globals, &contracts_by_name);

        let random_seed = engine.config.random_reader.seed();
        let state = ExecutionState::with_require_policy(
            Arc::clone(&root_env),
            cancel,
            engine.config.step_quota,
            engine.config.memory_quota_bytes,
            engine.config.recursion_limit,
            Arc::clone(&engine.module_registry),
            engine.module_registry.roots().first().cloned().unwrap_or_default(),
            contracts,
            engine.config.strict_effects,
            random_seed,
            opts.allow_require,
        );
        let ctx = Ctx::new(&state, frontend);

        crate::interpreter::statements::exec_stmts(&ctx, &root_env, &self.module.statements)?;

        let target = root_env.get(name).ok_or_else(|| {
            ScriptError::name(format!("unknown function {name}"), span)
        })?;

        call_value(&ctx, target, args, opts.keywords, None, span)
    }
}

/// Per-call options (spec.md §6 `script.call(ctx, name, args, opts)`).
#[derive(Default)]
pub struct CallOptions {
    pub globals: HashMap<String, Value>,
    pub keywords: HashMap<String, Value>,
    pub capabilities: Vec<Arc<dyn CapabilityAdapter>>,
    pub allow_require: bool,
}

/// First (lexically smallest) global name carrying a callable value,
/// deterministic across runs so the error message doesn't depend on
/// `HashMap` iteration order.
fn first_non_data_global(globals: &HashMap<String, Value>) -> Option<&str> {
    let mut names: Vec<&str> = globals.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
        .into_iter()
        .find(|name| dataonly::contains_callable(globals.get(*name).expect("name came from this map")))
}

/// The long-lived host object: owns the module cache (the only state a
/// `Script::call` does not rebuild from scratch) and the configuration
/// every call is run under.
pub struct Engine {
    config: EngineConfig,
    module_registry: Arc<ModuleRegistry>,
    host_builtins: HashMap<String, Value>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let module_registry = Arc::new(ModuleRegistry::new(
            config.module_paths.clone(),
            config.module_allow_list.clone(),
            config.module_deny_list.clone(),
            config.max_cached_modules,
        ));
        Self {
            config,
            module_registry,
            host_builtins: HashMap::new(),
        }
    }

    pub fn compile(&self, frontend: &dyn Frontend, source: &str) -> ScriptResult<Script> {
        let module = frontend.parse(source)?;
        Ok(Script { module })
    }

    /// Registers a named native function, callable from script code like
    /// any other global builtin.
    pub fn register_builtin(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(BuiltinCall) -> ScriptResult<Value> + Send + Sync + 'static,
    ) {
        let name = name.into();
        let builtin = Value::Builtin(Arc::new(Builtin::new(name.clone(), Arc::new(f))));
        if self.host_builtins.insert(name.clone(), builtin).is_some() {
            warn!(global = name, "register_builtin overwrote an existing host builtin");
        }
    }

    /// Same as [`Engine::register_builtin`] but the builtin runs
    /// immediately on bare reference, with no arguments (spec.md §6
    /// `register_zero_arg_builtin`).
    pub fn register_zero_arg_builtin(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(BuiltinCall) -> ScriptResult<Value> + Send + Sync + 'static,
    ) {
        let name = name.into();
        let builtin = Value::Builtin(Arc::new(Builtin::auto_invoke(name.clone(), Arc::new(f))));
        if self.host_builtins.insert(name.clone(), builtin).is_some() {
            warn!(global = name, "register_zero_arg_builtin overwrote an existing host builtin");
        }
    }

    pub fn clear_module_cache(&self) -> usize {
        self.module_registry.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;
    use crate::ast::{Param, Stmt, TypeExpr};

    struct NullFrontend;
    impl Frontend for NullFrontend {
        fn parse(&self, _source: &str) -> ScriptResult<Module> {
            Ok(Module::default())
        }
    }

    fn sort_script() -> Script {
        Script {
            module: Module {
                statements: vec![Stmt::FunctionDef {
                    name: "run".to_string(),
                    params: vec![],
                    return_type: None,
                    body: vec![build::expr_stmt(build::array_literal(vec![
                        build::int(3),
                        build::int(1),
                        build::int(2),
                    ]))],
                    is_private: false,
                    span: Span::UNKNOWN,
                }],
            },
        }
    }

    #[test]
    fn calls_a_defined_top_level_function() {
        let engine = Engine::new(EngineConfig::default());
        let frontend = NullFrontend;
        let script = sort_script();
        let result = script
            .call(
                &engine,
                &frontend,
                "run",
                vec![],
                CallOptions::default(),
                CancellationHandle::new(),
            )
            .unwrap();
        assert!(matches!(result, Value::Array(_)));
    }

    #[test]
    fn unknown_function_name_is_a_name_error() {
        let engine = Engine::new(EngineConfig::default());
        let frontend = NullFrontend;
        let script = sort_script();
        let err = script
            .call(
                &engine,
                &frontend,
                "missing",
                vec![],
                CallOptions::default(),
                CancellationHandle::new(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn strict_effects_rejects_callable_global() {
        let mut config = EngineConfig::default();
        config.strict_effects = true;
        let engine = Engine::new(config);
        let frontend = NullFrontend;
        let script = sort_script();

        let mut globals = HashMap::new();
        globals.insert(
            "db".to_string(),
            Value::Builtin(Arc::new(Builtin::new("save", Arc::new(|_| Ok(Value::Nil))))),
        );
        let opts = CallOptions {
            globals,
            ..Default::default()
        };
        let err = script
            .call(&engine, &frontend, "run", vec![], opts, CancellationHandle::new())
            .unwrap_err();
        assert!(err.to_string().contains("strict effects: global db must be data-only"));
    }

    #[test]
    fn require_disabled_per_call_fails_require_statement() {
        let engine = Engine::new(EngineConfig::default());
        let frontend = NullFrontend;
        let script = Script {
            module: Module {
                statements: vec![Stmt::FunctionDef {
                    name: "run".to_string(),
                    params: vec![],
                    return_type: None,
                    body: vec![Stmt::Require {
                        path: build::string("lib/util.vs"),
                        alias: None,
                        span: Span::UNKNOWN,
                    }],
                    is_private: false,
                    span: Span::UNKNOWN,
                }],
            },
        };
        let opts = CallOptions {
            allow_require: false,
            ..Default::default()
        };
        let err = script
            .call(&engine, &frontend, "run", vec![], opts, CancellationHandle::new())
            .unwrap_err();
        assert!(err.to_string().contains("require is disabled"));
    }

    #[test]
    fn type_mismatch_on_typed_parameter_reports_argument_name() {
        let engine = Engine::new(EngineConfig::default());
        let frontend = NullFrontend;
        let script = Script {
            module: Module {
                statements: vec![Stmt::FunctionDef {
                    name: "add".to_string(),
                    params: vec![
                        Param::typed("a", TypeExpr::Int),
                        Param::typed("b", TypeExpr::Int),
                    ],
                    return_type: Some(TypeExpr::Int),
                    body: vec![build::expr_stmt(build::binary(
                        build::ident("a"),
                        crate::ast::BinaryOp::Add,
                        build::ident("b"),
                    ))],
                    is_private: false,
                    span: Span::UNKNOWN,
                }],
            },
        };
        let err = script
            .call(
                &engine,
                &frontend,
                "add",
                vec![Value::Int(2), Value::string("x")],
                CallOptions::default(),
                CancellationHandle::new(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("argument b expected int, got string"));
    }
}
