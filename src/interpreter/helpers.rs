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

//! Parameter binding shared by user function calls (strict) and block
//! calls (tolerant) — spec.md §4.7 "Function / method dispatch".

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::ast::Param;
use crate::environment::Environment;
use crate::error::{ScriptError, ScriptResult};
use crate::interpreter::expressions::eval_expr;
use crate::interpreter::Ctx;
use crate::span::Span;
use crate::typecheck::type_matches;
use crate::value::{Instance, Value};

/// Binds `args`/`kwargs` onto `call_env` per `params`, in source order.
///
/// Positional arguments fill parameters left to right; any parameter not
/// filled positionally is looked up by name in `kwargs`; anything still
/// unfilled falls back to its default expression (evaluated in `call_env`,
/// so later defaults can see earlier parameters); anything past that is
/// unbound.
///
/// `tolerant` selects block semantics (extra args dropped, missing ones
/// bind to `Nil`/default, no arity/kwarg errors) versus function semantics
/// (every mismatch is an error). `self_instance` is `Some` only for method
/// dispatch, so `@foo`-named parameters can also write the ivar.
#[allow(clippy::too_many_arguments)]
pub fn bind_params(
    ctx: &Ctx,
    call_env: &Arc<Environment>,
    params: &[Param],
    args: Vec<Value>,
    kwargs: &HashMap<String, Value>,
    tolerant: bool,
    self_instance: Option<&Arc<Instance>>,
    context_name: &str,
    span: Span,
) -> ScriptResult<()> {
    let mut positional = args.into_iter();
    let mut used_kwargs: HashSet<&str> = HashSet::new();
    let mut extra_positional = 0usize;

    for param in params {
        let provided = match positional.next() {
            Some(v) => Some(v),
            None => kwargs.get(param.name.as_str()).map(|v| {
                used_kwargs.insert(param.name.as_str());
                v.clone()
            }),
        };

        let value = match provided {
            Some(v) => v,
            None => match &param.default {
                Some(default_expr) => eval_expr(ctx, call_env, default_expr)?,
                None => {
                    if tolerant {
                        Value::Nil
                    } else {
                        return Err(ScriptError::arity(
                            format!("missing argument {} for {context_name}", param.name),
                            span,
                        ));
                    }
                }
            },
        };

        if let Some(ty) = &param.type_annotation {
            if !type_matches(ty, &value) {
                return Err(ScriptError::type_error(
                    format!(
                        "argument {} expected {}, got {}",
                        param.name,
                        ty.describe(),
                        value.type_name()
                    ),
                    span,
                ));
            }
        }

        if param.ivar {
            if let Some(instance) = self_instance {
                instance.set_ivar(param.name.clone(), value.clone());
            }
        }

        call_env.define(param.name.clone(), value);
    }

    for _ in positional {
        extra_positional += 1;
    }
    if extra_positional > 0 && !tolerant {
        return Err(ScriptError::arity(
            format!("extra positional argument for {context_name}"),
            span,
        ));
    }

    if !tolerant {
        for key in kwargs.keys() {
            if !used_kwargs.contains(key.as_str()) {
                return Err(ScriptError::arity(
                    format!("unexpected keyword argument {key} for {context_name}"),
                    span,
                ));
            }
        }
    }

    Ok(())
}

/// Hash/object index coercion: only strings and symbols name a key.
pub fn coerce_hash_key(value: &Value, span: Span) -> ScriptResult<String> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        Value::Symbol(s) => Ok(s.to_string()),
        other => Err(ScriptError::type_error(
            format!("hash key must be a string or symbol, got {}", other.type_name()),
            span,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeExpr;
    use crate::engine::Frontend;
    use crate::error::ScriptResult as SR;
    use crate::execution::ExecutionState;

    struct NullFrontend;
    impl Frontend for NullFrontend {
        fn parse(&self, _source: &str) -> SR<crate::ast::Module> {
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
    fn missing_required_argument_fails_strict() {
        let st = state();
        let fe = NullFrontend;
        let ctx = Ctx::new(&st, &fe);
        let env = Environment::root();
        let params = vec![Param::required("a")];
        let err = bind_params(&ctx, &env, &params, vec![], &HashMap::new(), false, None, "f", Span::UNKNOWN)
            .unwrap_err();
        assert!(err.to_string().contains("missing argument"));
    }

    #[test]
    fn block_binding_tolerates_missing_and_extra() {
        let st = state();
        let fe = NullFrontend;
        let ctx = Ctx::new(&st, &fe);
        let env = Environment::root();
        let params = vec![Param::required("a")];
        let args = vec![Value::Int(1), Value::Int(2)];
        bind_params(&ctx, &env, &params, args, &HashMap::new(), true, None, "block", Span::UNKNOWN).unwrap();
        assert!(matches!(env.get("a"), Some(Value::Int(1))));
    }

    #[test]
    fn type_mismatch_names_the_parameter() {
        let st = state();
        let fe = NullFrontend;
        let ctx = Ctx::new(&st, &fe);
        let env = Environment::root();
        let params = vec![Param::typed("b", TypeExpr::Int)];
        let err = bind_params(
            &ctx,
            &env,
            &params,
            vec![Value::string("x")],
            &HashMap::new(),
            false,
            None,
            "add",
            Span::UNKNOWN,
        )
        .unwrap_err();
        assert!(err.to_string().contains("argument b expected int, got string"));
    }
}
