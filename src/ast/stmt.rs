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

use super::{Expr, Param, TypeExpr};
use crate::span::Span;

/// A single method or a class-method inside a `class` body.
#[derive(Debug, Clone)]
pub struct MethodMember {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: Vec<Stmt>,
    pub is_private: bool,
    pub is_class_method: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ClassMember {
    Method(MethodMember),
}

#[derive(Debug, Clone)]
pub struct RescueClause {
    /// `None` matches any error (a bare `rescue`).
    pub class_name: Option<String>,
    /// `rescue(Type) => e` binds the caught error value to this name.
    pub binding: Option<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression(Expr),
    If {
        /// `(condition, body)` pairs for `if`/`elsif` in source order.
        branches: Vec<(Expr, Vec<Stmt>)>,
        else_body: Option<Vec<Stmt>>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    Until {
        cond: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    For {
        var: String,
        iterable: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    FunctionDef {
        name: String,
        params: Vec<Param>,
        return_type: Option<TypeExpr>,
        body: Vec<Stmt>,
        is_private: bool,
        span: Span,
    },
    ClassDef {
        name: String,
        /// Statements run once, at module-load time, in the class's own
        /// scope to populate the class-variable hash.
        class_body: Vec<Stmt>,
        members: Vec<ClassMember>,
        is_private: bool,
        span: Span,
    },
    Return(Option<Expr>, Span),
    BeginRescue {
        body: Vec<Stmt>,
        rescues: Vec<RescueClause>,
        ensure: Option<Vec<Stmt>>,
        span: Span,
    },
    Require {
        path: Expr,
        alias: Option<String>,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expression(e) => e.span(),
            Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Until { span, .. }
            | Stmt::For { span, .. }
            | Stmt::FunctionDef { span, .. }
            | Stmt::ClassDef { span, .. }
            | Stmt::Return(_, span)
            | Stmt::BeginRescue { span, .. }
            | Stmt::Require { span, .. } => *span,
        }
    }
}
