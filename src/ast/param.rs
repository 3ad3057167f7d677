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

use super::{Expr, Stmt, TypeExpr};

/// A single function/method/block parameter.
///
/// `ivar` marks a parameter whose source name began with `@` — on method
/// dispatch it both binds a local and writes `self`'s instance-variable
/// hash (spec "Instance variable parameters"). Outside a method this is a
/// frontend-time error, not something the evaluator needs to guard.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
    pub type_annotation: Option<TypeExpr>,
    pub ivar: bool,
}

impl Param {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            type_annotation: None,
            ivar: false,
        }
    }

    pub fn typed(name: impl Into<String>, type_annotation: TypeExpr) -> Self {
        Self {
            name: name.into(),
            default: None,
            type_annotation: Some(type_annotation),
            ivar: false,
        }
    }

    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }

    pub fn as_ivar(mut self) -> Self {
        self.ivar = true;
        self
    }
}

/// A `do |params| … end` block literal attached to a call.
#[derive(Debug, Clone)]
pub struct BlockLiteral {
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}
