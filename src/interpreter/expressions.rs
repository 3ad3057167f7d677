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

//! Expression evaluation — spec.md §4.7 "Expression evaluation".
//!
//! `Expr::Member` is deliberately narrow: it only resolves ivar/class-var/
//! hash-key access. A method call written `obj.method(...)` never goes
//! through `eval_expr` on its `Member` callee directly — `Expr::Call`
//! recognizes a `Member` callee and routes to `classes::dispatch_method`
//! with the receiver bound, so builtin-type methods (`array.sort`) and
//! user-class methods share one dispatch path.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::{AssignTarget, Expr, LogicalOp};
use crate::environment::Environment;
use crate::error::{ScriptError, ScriptResult};
use crate::interpreter::helpers::coerce_hash_key;
use crate::interpreter::{calls, classes, operators, Ctx};
use crate::span::Span;
use crate::value::{Block, RangeValue, Value};

pub fn eval_expr(ctx: &Ctx, env: &Arc<Environment>, expr: &Expr) -> ScriptResult<Value> {
    ctx.state.check_step(expr.span())?;

    match expr {
        Expr::Literal(value, _) => Ok(value.clone()),

        Expr::Identifier(name, span) => {
            let value = env
                .get(name)
                .ok_or_else(|| ScriptError::name(format!("unknown identifier {name}"), *span))?;
            match &value {
                Value::Builtin(b) if b.auto_invoke => {
                    calls::call_builtin(ctx, b, None, vec![], HashMap::new(), None, *span)
                }
                _ => Ok(value),
            }
        }

        Expr::Ivar(name, span) => match ctx.state.current_receiver() {
            Some(Value::Instance(instance)) => Ok(instance.get_ivar(name).unwrap_or(Value::Nil)),
            _ => Err(ScriptError::name(
                format!("@{name} used outside of a method"),
                *span,
            )),
        },

        Expr::SelfExpr(span) => ctx
            .state
            .current_receiver()
            .ok_or_else(|| ScriptError::name("self used outside of a method", *span)),

        Expr::Unary { op, operand, span } => {
            let value = eval_expr(ctx, env, operand)?;
            operators::eval_unary(*op, value, *span)
        }

        Expr::Binary { left, op, right, span } => {
            let l = eval_expr(ctx, env, left)?;
            let r = eval_expr(ctx, env, right)?;
            operators::eval_binary(*op, l, r, *span)
        }

        Expr::Logical { left, op, right, span: _ } => {
            let l = eval_expr(ctx, env, left)?;
            match op {
                LogicalOp::And if !l.is_truthy() => Ok(l),
                LogicalOp::And => eval_expr(ctx, env, right),
                LogicalOp::Or if l.is_truthy() => Ok(l),
                LogicalOp::Or => eval_expr(ctx, env, right),
            }
        }

        Expr::Assign { target, value, span } => {
            let v = eval_expr(ctx, env, value)?;
            eval_assign(ctx, env, target, v.clone(), *span)?;
            Ok(v)
        }

        Expr::Index { object, index, span } => {
            let obj = eval_expr(ctx, env, object)?;
            let idx = eval_expr(ctx, env, index)?;
            eval_index(&obj, &idx, *span)
        }

        Expr::Member { object, name, span } => {
            let obj = eval_expr(ctx, env, object)?;
            eval_member_read(ctx, &obj, name, *span)
        }

        Expr::ArrayLiteral(items, _) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(eval_expr(ctx, env, item)?);
            }
            Ok(Value::array(values))
        }

        Expr::HashLiteral(pairs, span) => {
            let mut map = HashMap::new();
            for (key_expr, value_expr) in pairs {
                let key_value = eval_expr(ctx, env, key_expr)?;
                let key = coerce_hash_key(&key_value, *span)?;
                let value = eval_expr(ctx, env, value_expr)?;
                map.insert(key, value);
            }
            Ok(Value::hash(map))
        }

        Expr::RangeLiteral { start, end, span } => {
            let s = eval_expr(ctx, env, start)?;
            let e = eval_expr(ctx, env, end)?;
            match (s, e) {
                (Value::Int(s), Value::Int(e)) => Ok(Value::Range(RangeValue::new(s, e))),
                (s, e) => Err(ScriptError::type_error(
                    format!(
                        "range bounds expected int, got {} and {}",
                        s.type_name(),
                        e.type_name()
                    ),
                    *span,
                )),
            }
        }

        Expr::Call {
            callee,
            args,
            kwargs,
            block,
            span,
        } => {
            let arg_values = eval_all(ctx, env, args)?;
            let kwarg_values = eval_kwargs(ctx, env, kwargs)?;
            let block_value = block
                .as_ref()
                .map(|lit| {
                    Arc::new(Block {
                        params: lit.params.clone(),
                        body: lit.body.clone(),
                        env: Arc::clone(env),
                        module_key: ctx.state.module_root().to_string_lossy().into_owned(),
                    })
                });

            if let Expr::Member { object, name, .. } = callee.as_ref() {
                let receiver = eval_expr(ctx, env, object)?;
                return classes::dispatch_method(
                    ctx,
                    receiver,
                    name,
                    arg_values,
                    kwarg_values,
                    block_value,
                    *span,
                );
            }

            let callee_value = eval_expr(ctx, env, callee)?;
            calls::call_value(ctx, callee_value, arg_values, kwarg_values, block_value, *span)
        }

        Expr::Yield { args, span } => {
            let arg_values = eval_all(ctx, env, args)?;
            match env.get("__block__") {
                Some(Value::Block(block)) => {
                    calls::call_block_value(ctx, &block, arg_values, HashMap::new(), *span)
                }
                _ => Err(ScriptError::name("no block given", *span)),
            }
        }

        Expr::New {
            class_name,
            args,
            kwargs,
            span,
        } => {
            let class = match env.get(class_name) {
                Some(Value::Class(c)) => c,
                Some(_) => {
                    return Err(ScriptError::type_error(
                        format!("{class_name} is not a class"),
                        *span,
                    ))
                }
                None => return Err(ScriptError::name(format!("unknown class {class_name}"), *span)),
            };
            let arg_values = eval_all(ctx, env, args)?;
            let kwarg_values = eval_kwargs(ctx, env, kwargs)?;
            calls::construct_instance(ctx, &class, arg_values, kwarg_values, *span)
        }
    }
}

fn eval_all(ctx: &Ctx, env: &Arc<Environment>, exprs: &[Expr]) -> ScriptResult<Vec<Value>> {
    exprs.iter().map(|e| eval_expr(ctx, env, e)).collect()
}

fn eval_kwargs(
    ctx: &Ctx,
    env: &Arc<Environment>,
    pairs: &[(String, Expr)],
) -> ScriptResult<HashMap<String, Value>> {
    let mut out = HashMap::new();
    for (name, expr) in pairs {
        out.insert(name.clone(), eval_expr(ctx, env, expr)?);
    }
    Ok(out)
}

fn eval_index(obj: &Value, idx: &Value, span: Span) -> ScriptResult<Value> {
    match obj {
        Value::Array(arr) => {
            let items = arr.lock().unwrap();
            let i = match idx {
                Value::Int(n) => *n,
                other => {
                    return Err(ScriptError::type_error(
                        format!("array index expected int, got {}", other.type_name()),
                        span,
                    ))
                }
            };
            let resolved = resolve_index(i, items.len());
            items
                .get(resolved)
                .cloned()
                .ok_or_else(|| ScriptError::bounds(format!("index {i} out of bounds"), span))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let i = match idx {
                Value::Int(n) => *n,
                other => {
                    return Err(ScriptError::type_error(
                        format!("string index expected int, got {}", other.type_name()),
                        span,
                    ))
                }
            };
            let resolved = resolve_index(i, chars.len());
            chars
                .get(resolved)
                .map(|c| Value::string(c.to_string()))
                .ok_or_else(|| ScriptError::bounds(format!("index {i} out of bounds"), span))
        }
        Value::Hash(map) | Value::Object(map) => {
            let key = coerce_hash_key(idx, span)?;
            Ok(map.lock().unwrap().get(&key).cloned().unwrap_or(Value::Nil))
        }
        other => Err(ScriptError::type_error(
            format!("cannot index into {}", other.type_name()),
            span,
        )),
    }
}

fn resolve_index(i: i64, len: usize) -> usize {
    if i < 0 {
        (len as i64 + i).max(-1) as usize
    } else {
        i as usize
    }
}

/// Resolves `obj.name` to a raw value, then applies the same auto-invoke
/// rule bare identifiers get: a member that resolves to an `auto_invoke`
/// builtin (e.g. the `now` member of the `Time` namespace object) is called
/// immediately with no arguments rather than handed back as a callable.
fn eval_member_read(ctx: &Ctx, obj: &Value, name: &str, span: Span) -> ScriptResult<Value> {
    let raw = match obj {
        Value::Instance(instance) => instance
            .get_ivar(name)
            .ok_or_else(|| ScriptError::name(format!("unknown ivar {name}"), span))?,
        Value::Class(class) => class
            .get_class_var(name)
            .ok_or_else(|| ScriptError::name(format!("unknown class variable {name}"), span))?,
        Value::Hash(map) | Value::Object(map) => {
            map.lock().unwrap().get(name).cloned().unwrap_or(Value::Nil)
        }
        other => {
            return Err(ScriptError::type_error(
                format!("cannot read property {name} on {}", other.type_name()),
                span,
            ))
        }
    };
    match &raw {
        Value::Builtin(b) if b.auto_invoke => {
            calls::call_builtin(ctx, b, None, vec![], HashMap::new(), None, span)
        }
        _ => Ok(raw),
    }
}

fn eval_assign(
    ctx: &Ctx,
    env: &Arc<Environment>,
    target: &AssignTarget,
    value: Value,
    span: Span,
) -> ScriptResult<()> {
    match target {
        AssignTarget::Identifier(name) => {
            env.set(name, value);
            Ok(())
        }
        AssignTarget::Ivar(name) => match ctx.state.current_receiver() {
            Some(Value::Instance(instance)) => {
                instance.set_ivar(name.clone(), value);
                Ok(())
            }
            _ => Err(ScriptError::name(
                format!("@{name} assigned outside of a method"),
                span,
            )),
        },
        AssignTarget::Index { object, index } => {
            let obj = eval_expr(ctx, env, object)?;
            let idx = eval_expr(ctx, env, index)?;
            assign_index(&obj, &idx, value, span)
        }
        AssignTarget::Member { object, name } => {
            let obj = eval_expr(ctx, env, object)?;
            assign_member(&obj, name, value, span)
        }
    }
}

fn assign_index(obj: &Value, idx: &Value, value: Value, span: Span) -> ScriptResult<()> {
    match obj {
        Value::Array(arr) => {
            let i = match idx {
                Value::Int(n) => *n,
                other => {
                    return Err(ScriptError::type_error(
                        format!("array index expected int, got {}", other.type_name()),
                        span,
                    ))
                }
            };
            let mut items = arr.lock().unwrap();
            let resolved = resolve_index(i, items.len());
            match items.get_mut(resolved) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(ScriptError::bounds(format!("index {i} out of bounds"), span)),
            }
        }
        Value::Hash(map) | Value::Object(map) => {
            let key = coerce_hash_key(idx, span)?;
            map.lock().unwrap().insert(key, value);
            Ok(())
        }
        other => Err(ScriptError::type_error(
            format!("cannot index-assign into {}", other.type_name()),
            span,
        )),
    }
}

fn assign_member(obj: &Value, name: &str, value: Value, span: Span) -> ScriptResult<()> {
    match obj {
        Value::Instance(instance) => {
            if instance.class.method(name).is_some() || instance.class.class_method(name).is_some() {
                return Err(ScriptError::name(
                    format!("cannot assign to read-only property {name}"),
                    span,
                ));
            }
            instance.set_ivar(name.to_string(), value);
            Ok(())
        }
        Value::Hash(map) | Value::Object(map) => {
            map.lock().unwrap().insert(name.to_string(), value);
            Ok(())
        }
        Value::Class(class) => {
            class.set_class_var(name.to_string(), value);
            Ok(())
        }
        other => Err(ScriptError::type_error(
            format!("cannot assign property {name} on {}", other.type_name()),
            span,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;
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
    fn undefined_identifier_reports_name_error() {
        let st = state();
        let fe = NullFrontend;
        let ctx = Ctx::new(&st, &fe);
        let env = Environment::root();
        let err = eval_expr(&ctx, &env, &build::ident("nope")).unwrap_err();
        assert!(err.to_string().contains("unknown identifier nope"));
    }

    #[test]
    fn negative_array_index_reads_from_the_end() {
        let st = state();
        let fe = NullFrontend;
        let ctx = Ctx::new(&st, &fe);
        let env = Environment::root();
        let arr = build::array_literal(vec![build::int(1), build::int(2), build::int(3)]);
        let arr_value = eval_expr(&ctx, &env, &arr).unwrap();
        let idx_expr = Expr::Index {
            object: Box::new(Expr::Literal(arr_value, Span::UNKNOWN)),
            index: Box::new(build::int(-1)),
            span: Span::UNKNOWN,
        };
        let result = eval_expr(&ctx, &env, &idx_expr).unwrap();
        assert!(matches!(result, Value::Int(3)));
    }

    #[test]
    fn logical_and_short_circuits_without_evaluating_right() {
        let st = state();
        let fe = NullFrontend;
        let ctx = Ctx::new(&st, &fe);
        let env = Environment::root();
        let expr = Expr::Logical {
            left: Box::new(build::nil()),
            op: LogicalOp::And,
            right: Box::new(build::ident("does_not_exist")),
            span: Span::UNKNOWN,
        };
        let result = eval_expr(&ctx, &env, &expr).unwrap();
        assert!(matches!(result, Value::Nil));
    }
}
