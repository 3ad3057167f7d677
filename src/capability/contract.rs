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

//! A contract pairs `validate_args`/`validate_return` hooks bracketing a
//! capability builtin's invocation (spec.md §4.4).

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::TypeExpr;
use crate::dataonly::contains_callable;
use crate::error::{ScriptError, ScriptResult};
use crate::span::Span;
use crate::value::{Block, Value};

type ArgsValidator =
    Arc<dyn Fn(&[Value], &HashMap<String, Value>, Option<&Arc<Block>>, Span) -> ScriptResult<()> + Send + Sync>;
type ReturnValidator = Arc<dyn Fn(&Value, Span) -> ScriptResult<()> + Send + Sync>;

#[derive(Clone)]
pub struct Contract {
    pub validate_args: ArgsValidator,
    pub validate_return: ReturnValidator,
}

impl Contract {
    pub fn new(validate_args: ArgsValidator, validate_return: ReturnValidator) -> Self {
        Self {
            validate_args,
            validate_return,
        }
    }

    /// A contract checking positional argument types by position, with no
    /// return check (`Any`).
    pub fn typed_args(method: impl Into<String>, types: Vec<TypeExpr>) -> Self {
        let method = method.into();
        let validate_args: ArgsValidator = Arc::new(move |args, _kwargs, _block, span| {
            for (i, ty) in types.iter().enumerate() {
                match args.get(i) {
                    Some(v) if crate::typecheck::type_matches(ty, v) => {}
                    Some(v) => {
                        return Err(ScriptError::type_error(
                            format!(
                                "argument {} expected {}, got {}",
                                i + 1,
                                ty.describe(),
                                v.type_name()
                            ),
                            span,
                        ))
                    }
                    None => {
                        return Err(ScriptError::arity(
                            format!("missing argument {} for {method}", i + 1),
                            span,
                        ))
                    }
                }
            }
            Ok(())
        });
        Self::new(validate_args, Arc::new(|_, _| Ok(())))
    }

    /// A contract forbidding any callable value in args, kwargs, or the
    /// returned value — the data-only host-boundary policy.
    pub fn data_only() -> Self {
        let validate_args: ArgsValidator = Arc::new(|args, kwargs, _block, span| {
            if args.iter().any(contains_callable) || kwargs.values().any(contains_callable) {
                return Err(ScriptError::capability(
                    "capability call argument must be data-only",
                    span,
                ));
            }
            Ok(())
        });
        let validate_return: ReturnValidator = Arc::new(|value, span| {
            if contains_callable(value) {
                return Err(ScriptError::capability(
                    "capability call return value must be data-only",
                    span,
                ));
            }
            Ok(())
        });
        Self::new(validate_args, validate_return)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_args_rejects_wrong_kind() {
        let contract = Contract::typed_args("save", vec![TypeExpr::Int]);
        let err = (contract.validate_args)(&[Value::string("x")], &HashMap::new(), None, Span::UNKNOWN)
            .unwrap_err();
        assert!(err.to_string().contains("argument 1 expected int, got string"));
    }

    #[test]
    fn data_only_rejects_callable_argument() {
        let contract = Contract::data_only();
        let builtin = Value::Builtin(Arc::new(crate::value::Builtin::new(
            "f",
            Arc::new(|_| Ok(Value::Nil)),
        )));
        let err = (contract.validate_args)(&[builtin], &HashMap::new(), None, Span::UNKNOWN).unwrap_err();
        assert!(err.to_string().contains("data-only"));
    }
}
