//! End-to-end scenarios run through `Script::call`, building each script's
//! AST directly via `vaultscript::ast::build` (no parser is shipped; see
//! `vaultscript::Frontend`). Scenarios 1, 2, and 6 are covered in miniature
//! by `engine.rs`'s own colocated test module; this file covers the
//! remaining ones plus a couple of resource-bound checks end to end.

use std::collections::HashMap;
use std::sync::Arc;

use vaultscript::ast::{self, build, BinaryOp, Param, Stmt, TypeExpr};
use vaultscript::cancellation::CancellationHandle;
use vaultscript::{CallOptions, Engine, EngineConfig, Frontend, Value};

struct NullFrontend;

impl Frontend for NullFrontend {
    fn parse(&self, _source: &str) -> vaultscript::ScriptResult<ast::Module> {
        Ok(ast::Module::default())
    }
}

fn function(name: &str, params: Vec<Param>, body: Vec<Stmt>) -> ast::Module {
    ast::Module {
        statements: vec![Stmt::FunctionDef {
            name: name.to_string(),
            params,
            return_type: None,
            body,
            is_private: false,
            span: vaultscript::span::Span::UNKNOWN,
        }],
    }
}

/// Scenario 3: `def run(); 10/0; end` → error containing "division by zero".
#[test]
fn division_by_zero_reports_canonical_message() {
    let engine = Engine::new(EngineConfig::default());
    let frontend = NullFrontend;

    let module = function(
        "run",
        vec![],
        vec![build::expr_stmt(build::binary(
            build::int(10),
            BinaryOp::Div,
            build::int(0),
        ))],
    );
    let script = unsafe_script_from_module(&engine, module);

    let err = script
        .call(
            &engine,
            &frontend,
            "run",
            vec![],
            CallOptions::default(),
            CancellationHandle::new(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("division by zero"));
}

/// Scenario 4: a million-iteration loop under a 10_000 step quota fails
/// with "step quota exceeded" well before it completes.
#[test]
fn step_quota_exceeded_on_long_loop() {
    let mut config = EngineConfig::default();
    config.step_quota = 10_000;
    let engine = Engine::new(config);
    let frontend = NullFrontend;

    let module = function(
        "slow",
        vec![],
        vec![
            build::expr_stmt(build::assign("total", build::int(0))),
            Stmt::For {
                var: "i".to_string(),
                iterable: ast::Expr::RangeLiteral {
                    start: Box::new(build::int(1)),
                    end: Box::new(build::int(1_000_000)),
                    span: vaultscript::span::Span::UNKNOWN,
                },
                body: vec![build::expr_stmt(build::assign(
                    "total",
                    build::binary(build::ident("total"), BinaryOp::Add, build::ident("i")),
                ))],
                span: vaultscript::span::Span::UNKNOWN,
            },
            build::return_stmt(Some(build::ident("total"))),
        ],
    );
    let script = unsafe_script_from_module(&engine, module);

    let err = script
        .call(
            &engine,
            &frontend,
            "slow",
            vec![],
            CallOptions::default(),
            CancellationHandle::new(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("step quota exceeded"));
}

/// Scenario 5: `"{{a.b}}".template({a:{b:"X"}})` → "X".
#[test]
fn string_template_resolves_nested_hash_path() {
    let engine = Engine::new(EngineConfig::default());
    let frontend = NullFrontend;

    let inner = ast::Expr::HashLiteral(
        vec![(build::string("b"), build::string("X"))],
        vaultscript::span::Span::UNKNOWN,
    );
    let data = ast::Expr::HashLiteral(
        vec![(build::string("a"), inner)],
        vaultscript::span::Span::UNKNOWN,
    );
    let template_call = build::call(build::member(build::string("{{a.b}}"), "template"), vec![data]);

    let module = function("run", vec![], vec![build::expr_stmt(template_call)]);
    let script = unsafe_script_from_module(&engine, module);

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
    match result {
        Value::Str(s) => assert_eq!(&*s, "X"),
        other => panic!("expected a string, got a {}", other.type_name()),
    }
}

/// A host-registered builtin is reachable from script code like any other
/// global, and runs with the call's guarded host plumbing behind it.
#[test]
fn host_registered_builtin_is_callable_from_script() {
    let mut engine = Engine::new(EngineConfig::default());
    engine.register_builtin("double", |call| {
        let span = call.span;
        match call.arg(0) {
            Some(Value::Int(n)) => Ok(Value::Int(*n * 2)),
            _ => Err(vaultscript::ScriptError::type_error("double expects an int", span)),
        }
    });
    let frontend = NullFrontend;

    let module = function(
        "run",
        vec![],
        vec![build::expr_stmt(build::call(build::ident("double"), vec![build::int(21)]))],
    );
    let script = unsafe_script_from_module(&engine, module);

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
    assert!(matches!(result, Value::Int(42)));
}

/// A caller-supplied global carrying a captured closure still works once
/// rebound onto the call's fresh root (spec.md §9 "Captured environments").
#[test]
fn caller_supplied_global_closure_is_callable() {
    let engine = Engine::new(EngineConfig::default());
    let frontend = NullFrontend;

    let module = function(
        "run",
        vec![],
        vec![build::expr_stmt(build::call(build::ident("helper"), vec![build::int(4)]))],
    );
    let script = unsafe_script_from_module(&engine, module);

    let helper_env = vaultscript::environment::Environment::root();
    let helper = Value::Function(Arc::new(vaultscript::value::ScriptFunction {
        name: "helper".to_string(),
        params: vec![Param::required("n")],
        return_type: None,
        body: vec![build::expr_stmt(build::binary(
            build::ident("n"),
            BinaryOp::Mul,
            build::int(10),
        ))],
        module_key: String::new(),
        is_private: false,
        is_class_method: false,
        env: helper_env,
    }));

    let mut globals = HashMap::new();
    globals.insert("helper".to_string(), helper);
    let opts = CallOptions {
        globals,
        ..Default::default()
    };

    let result = script
        .call(&engine, &frontend, "run", vec![], opts, CancellationHandle::new())
        .unwrap();
    assert!(matches!(result, Value::Int(40)));
}

/// Typed parameters accept an int argument where a float annotation is
/// declared (gradual typing, DESIGN.md Open Question #4).
#[test]
fn int_argument_satisfies_float_annotated_parameter() {
    let engine = Engine::new(EngineConfig::default());
    let frontend = NullFrontend;

    let module = function(
        "run",
        vec![Param::typed("x", TypeExpr::Float)],
        vec![build::return_stmt(Some(build::ident("x")))],
    );
    let script = unsafe_script_from_module(&engine, module);

    let result = script
        .call(
            &engine,
            &frontend,
            "run",
            vec![Value::Int(3)],
            CallOptions::default(),
            CancellationHandle::new(),
        )
        .unwrap();
    assert!(matches!(result, Value::Int(3)));
}

/// `Script` has no public constructor outside `Engine::compile`, which in
/// turn requires a `Frontend` that actually parses source text. Since this
/// crate ships no parser, tests build the `ast::Module` directly and need a
/// way to wrap it in a `Script` the same way `Engine::compile` would for a
/// frontend that produced this exact tree.
fn unsafe_script_from_module(engine: &Engine, module: ast::Module) -> vaultscript::Script {
    struct FixedFrontend(std::sync::Mutex<Option<ast::Module>>);
    impl Frontend for FixedFrontend {
        fn parse(&self, _source: &str) -> vaultscript::ScriptResult<ast::Module> {
            Ok(self.0.lock().unwrap().take().unwrap_or_default())
        }
    }
    let fixed = FixedFrontend(std::sync::Mutex::new(Some(module)));
    engine.compile(&fixed, "").unwrap()
}
