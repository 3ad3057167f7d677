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

//! Method dispatch on a receiver — the half of `Expr::Call` handling that
//! needs to know about instances, classes, and private-method access,
//! kept out of `expressions.rs` for the same reason parameter binding was
//! split into `helpers.rs`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ScriptError, ScriptResult};
use crate::interpreter::{calls, Ctx};
use crate::span::Span;
use crate::value::{Block, Value};

/// Resolves and invokes `name` on `receiver`. Instances and classes use
/// their own method tables (with a private-method check against the
/// currently active receiver); every other value kind delegates to the
/// builtin method table for its own type.
pub fn dispatch_method(
    ctx: &Ctx,
    receiver: Value,
    name: &str,
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    block: Option<Arc<Block>>,
    span: Span,
) -> ScriptResult<Value> {
    match &receiver {
        Value::Instance(instance) => {
            if let Some(method) = instance.class.method(name) {
                if method.is_private && !called_from_own_instance(ctx, instance) {
                    return Err(ScriptError::name(format!("private method {name}"), span));
                }
                return calls::call_function(ctx, &method, Some(receiver.clone()), args, kwargs, block, span);
            }
            Err(ScriptError::name(
                format!("unknown method {name} for {}", instance.class.name),
                span,
            ))
        }

        Value::Class(class) => {
            if name == "new" {
                return calls::construct_instance(ctx, class, args, kwargs, span);
            }
            if let Some(method) = class.class_method(name) {
                return calls::call_function(ctx, &method, Some(receiver.clone()), args, kwargs, block, span);
            }
            Err(ScriptError::name(
                format!("unknown class method {name} for {}", class.name),
                span,
            ))
        }

        _ => crate::builtins::dispatch_method(ctx, receiver, name, args, kwargs, block, span),
    }
}

fn called_from_own_instance(ctx: &Ctx, instance: &Arc<crate::value::Instance>) -> bool {
    match ctx.state.current_receiver() {
        Some(Value::Instance(active)) => Arc::ptr_eq(&active, instance),
        _ => false,
    }
}
