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

//! Statement execution — spec.md §4.7 "Statement execution" and
//! "Control flow".

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::ast::{ClassMember, RescueClause, Stmt};
use crate::environment::Environment;
use crate::error::{ScriptError, ScriptResult};
use crate::interpreter::expressions::eval_expr;
use crate::interpreter::{calls, Ctx, EnvGuard, Flow};
use crate::span::Span;
use crate::value::{ClassDef, RangeValue, ScriptFunction, Value};

/// Runs a statement list to completion or to its first `return`, yielding
/// the implicit value of the last statement (Ruby-style) when no explicit
/// `return` fires.
pub fn exec_stmts(ctx: &Ctx, env: &Arc<Environment>, stmts: &[Stmt]) -> ScriptResult<Flow> {
    let mut last = Flow::Normal(Value::Nil);
    for stmt in stmts {
        last = exec_stmt(ctx, env, stmt)?;
        if last.is_returned() {
            return Ok(last);
        }
    }
    Ok(last)
}

fn error_value(err: &ScriptError) -> Value {
    let mut fields = HashMap::new();
    fields.insert("class".to_string(), Value::string(err.kind.class_name()));
    fields.insert("message".to_string(), Value::string(err.message.clone()));
    Value::object(fields)
}

pub fn exec_stmt(ctx: &Ctx, env: &Arc<Environment>, stmt: &Stmt) -> ScriptResult<Flow> {
    ctx.state.check_step(stmt.span())?;
    ctx.state.check_cancelled(stmt.span())?;

    let flow = match stmt {
        Stmt::Expression(expr) => Flow::Normal(eval_expr(ctx, env, expr)?),

        Stmt::If {
            branches,
            else_body,
            span: _,
        } => {
            let mut taken: Option<&[Stmt]> = None;
            for (cond, body) in branches {
                if eval_expr(ctx, env, cond)?.is_truthy() {
                    taken = Some(body);
                    break;
                }
            }
            match taken.or(else_body.as_deref()) {
                Some(body) => run_block(ctx, env, body)?,
                None => Flow::Normal(Value::Nil),
            }
        }

        Stmt::While { cond, body, span: _ } => {
            let mut result = Flow::Normal(Value::Nil);
            while eval_expr(ctx, env, cond)?.is_truthy() {
                ctx.state.check_step(stmt.span())?;
                let flow = run_block(ctx, env, body)?;
                if flow.is_returned() {
                    result = flow;
                    break;
                }
            }
            result
        }

        Stmt::Until { cond, body, span: _ } => {
            let mut result = Flow::Normal(Value::Nil);
            while !eval_expr(ctx, env, cond)?.is_truthy() {
                ctx.state.check_step(stmt.span())?;
                let flow = run_block(ctx, env, body)?;
                if flow.is_returned() {
                    result = flow;
                    break;
                }
            }
            result
        }

        Stmt::For {
            var,
            iterable,
            body,
            span,
        } => {
            let iterable = eval_expr(ctx, env, iterable)?;
            let items: Vec<Value> = match &iterable {
                Value::Range(RangeValue { start, end }) => {
                    RangeValue::new(*start, *end).iter().map(Value::Int).collect()
                }
                Value::Array(arr) => arr.lock().unwrap().clone(),
                other => {
                    return Err(ScriptError::type_error(
                        format!("cannot iterate over {}", other.type_name()),
                        *span,
                    ))
                }
            };
            let mut result = Flow::Normal(Value::Nil);
            for item in items {
                ctx.state.check_step(*span)?;
                let loop_env = Environment::new_child(env);
                loop_env.define(var.clone(), item);
                let _guard = EnvGuard::enter(ctx.state, loop_env.clone());
                let flow = exec_stmts(ctx, &loop_env, body)?;
                if flow.is_returned() {
                    result = flow;
                    break;
                }
            }
            result
        }

        Stmt::FunctionDef {
            name,
            params,
            return_type,
            body,
            is_private,
            span: _,
        } => {
            let func = ScriptFunction {
                name: name.clone(),
                params: params.clone(),
                return_type: return_type.clone(),
                body: body.clone(),
                module_key: ctx.state.module_root().to_string_lossy().into_owned(),
                is_private: *is_private,
                is_class_method: false,
                env: Arc::clone(env),
            };
            env.define(name.clone(), Value::Function(Arc::new(func)));
            Flow::Normal(Value::Nil)
        }

        Stmt::ClassDef {
            name,
            class_body,
            members,
            is_private: _,
            span: _,
        } => {
            let class_env = Environment::new_child(env);
            let _guard = EnvGuard::enter(ctx.state, class_env.clone());
            exec_stmts(ctx, &class_env, class_body)?;

            let mut methods = HashMap::new();
            let mut class_methods = HashMap::new();
            for member in members {
                let ClassMember::Method(m) = member;
                let func = Arc::new(ScriptFunction {
                    name: m.name.clone(),
                    params: m.params.clone(),
                    return_type: m.return_type.clone(),
                    body: m.body.clone(),
                    module_key: ctx.state.module_root().to_string_lossy().into_owned(),
                    is_private: m.is_private,
                    is_class_method: m.is_class_method,
                    env: Arc::clone(&class_env),
                });
                if m.is_class_method {
                    class_methods.insert(m.name.clone(), func);
                } else {
                    methods.insert(m.name.clone(), func);
                }
            }

            let class_vars: HashMap<String, Value> = class_env.own_bindings();
            let class = ClassDef {
                name: name.clone(),
                methods,
                class_methods,
                class_vars: Mutex::new(class_vars),
                class_body: class_body.clone(),
                module_key: ctx.state.module_root().to_string_lossy().into_owned(),
            };
            env.define(name.clone(), Value::Class(Arc::new(class)));
            Flow::Normal(Value::Nil)
        }

        Stmt::Return(expr, span) => {
            let value = match expr {
                Some(e) => eval_expr(ctx, env, e)?,
                None => Value::Nil,
            };
            let _ = span;
            Flow::Returned(value)
        }

        Stmt::BeginRescue {
            body,
            rescues,
            ensure,
            span: _,
        } => {
            let body_result = run_block(ctx, env, body);
            let outcome = match body_result {
                Ok(flow) => Ok(flow),
                Err(err) => match find_rescue(rescues, &err) {
                    Some(clause) => {
                        let rescue_env = Environment::new_child(env);
                        if let Some(binding) = &clause.binding {
                            rescue_env.define(binding.clone(), error_value(&err));
                        }
                        let _guard = EnvGuard::enter(ctx.state, rescue_env.clone());
                        exec_stmts(ctx, &rescue_env, &clause.body)
                    }
                    None => Err(err),
                },
            };

            if let Some(ensure_body) = ensure {
                let ensure_flow = run_block(ctx, env, ensure_body)?;
                if ensure_flow.is_returned() {
                    return Ok(ensure_flow);
                }
            }

            outcome?
        }

        Stmt::Require { path, alias, span } => {
            let path_value = eval_expr(ctx, env, path)?;
            let rel_path = match &path_value {
                Value::Str(s) => s.to_string(),
                other => {
                    return Err(ScriptError::type_error(
                        format!("require path expected string, got {}", other.type_name()),
                        *span,
                    ))
                }
            };
            calls::require_module(ctx, env, &rel_path, alias.as_deref(), *span)?;
            Flow::Normal(Value::Nil)
        }
    };

    ctx.state.check_memory(&[], stmt.span())?;
    Ok(flow)
}

/// Runs `body` in a fresh child environment, returning its `Flow`.
fn run_block(ctx: &Ctx, env: &Arc<Environment>, body: &[Stmt]) -> ScriptResult<Flow> {
    let block_env = Environment::new_child(env);
    let _guard = EnvGuard::enter(ctx.state, block_env.clone());
    exec_stmts(ctx, &block_env, body)
}

fn find_rescue<'a>(rescues: &'a [RescueClause], err: &ScriptError) -> Option<&'a RescueClause> {
    rescues
        .iter()
        .find(|clause| match &clause.class_name {
            None => true,
            Some(name) => err.matches_class(name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;
    use crate::ast::BinaryOp;
    use crate::engine::Frontend;
    use crate::execution::ExecutionState;

    struct NullFrontend;
    impl Frontend for NullFrontend {
        fn parse(&self, _source: &str) -> ScriptResult<crate::ast::Module> {
            Ok(crate::ast::Module::default())
        }
    }

    fn state() -> ExecutionState {
        ExecutionState::new(
            Environment::root(),
            crate::cancellation::CancellationHandle::new(),
            10_000,
            1 << 20,
            64,
            Arc::new(crate::module_registry::ModuleRegistry::new(vec![], vec![], vec![], 10)),
            std::path::PathBuf::new(),
            crate::capability::ContractTable::default(),
            false,
            [0u8; 32],
        )
    }

    #[test]
    fn implicit_last_expression_is_returned_without_return_statement() {
        let st = state();
        let fe = NullFrontend;
        let ctx = Ctx::new(&st, &fe);
        let env = Environment::root();
        let stmts = vec![
            build::expr_stmt(build::assign("x", build::int(1))),
            build::expr_stmt(build::binary(build::ident("x"), BinaryOp::Add, build::int(2))),
        ];
        let flow = exec_stmts(&ctx, &env, &stmts).unwrap();
        assert!(!flow.is_returned());
        assert!(matches!(flow.into_value(), Value::Int(3)));
    }

    #[test]
    fn explicit_return_short_circuits_remaining_statements() {
        let st = state();
        let fe = NullFrontend;
        let ctx = Ctx::new(&st, &fe);
        let env = Environment::root();
        let stmts = vec![
            build::return_stmt(Some(build::int(7))),
            build::expr_stmt(build::int(999)),
        ];
        let flow = exec_stmts(&ctx, &env, &stmts).unwrap();
        assert!(flow.is_returned());
        assert!(matches!(flow.into_value(), Value::Int(7)));
    }

    #[test]
    fn for_loop_over_range_binds_variable_each_iteration() {
        let st = state();
        let fe = NullFrontend;
        let ctx = Ctx::new(&st, &fe);
        let env = Environment::root();
        env.define("total", Value::Int(0));
        let stmt = Stmt::For {
            var: "i".to_string(),
            iterable: range_literal(1, 3),
            body: vec![build::expr_stmt(build::assign(
                "total",
                build::binary(build::ident("total"), BinaryOp::Add, build::ident("i")),
            ))],
            span: Span::UNKNOWN,
        };
        exec_stmt(&ctx, &env, &stmt).unwrap();
        assert!(matches!(env.get("total"), Some(Value::Int(6))));
    }

    fn range_literal(start: i64, end: i64) -> crate::ast::Expr {
        crate::ast::Expr::Literal(Value::Range(RangeValue::new(start, end)), Span::UNKNOWN)
    }
}
