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

//! Small builder helpers for constructing AST trees directly.
//!
//! There is no parser in this crate (see [`crate::Frontend`]); these
//! free functions exist so the crate's own test suite — and a host with no
//! interest in the concrete grammar — can build a [`super::Module`] by hand
//! without fighting `Span`/`Box` boilerplate at every call site. Spans
//! default to [`crate::span::Span::UNKNOWN`]; callers needing real
//! positions build nodes directly instead.

use super::expr::{AssignTarget, BinaryOp};
use super::{Expr, Stmt};
use crate::span::Span;
use crate::value::Value;

pub fn int(n: i64) -> Expr {
    Expr::Literal(Value::Int(n), Span::UNKNOWN)
}

pub fn float(n: f64) -> Expr {
    Expr::Literal(Value::Float(n), Span::UNKNOWN)
}

pub fn string(s: impl Into<std::sync::Arc<str>>) -> Expr {
    Expr::Literal(Value::string(s), Span::UNKNOWN)
}

pub fn nil() -> Expr {
    Expr::Literal(Value::Nil, Span::UNKNOWN)
}

pub fn ident(name: impl Into<String>) -> Expr {
    Expr::Identifier(name.into(), Span::UNKNOWN)
}

pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
        span: Span::UNKNOWN,
    }
}

pub fn assign(name: impl Into<String>, value: Expr) -> Expr {
    Expr::Assign {
        target: Box::new(AssignTarget::Identifier(name.into())),
        value: Box::new(value),
        span: Span::UNKNOWN,
    }
}

pub fn array_literal(items: Vec<Expr>) -> Expr {
    Expr::ArrayLiteral(items, Span::UNKNOWN)
}

pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call {
        callee: Box::new(callee),
        args,
        kwargs: Vec::new(),
        block: None,
        span: Span::UNKNOWN,
    }
}

pub fn member(object: Expr, name: impl Into<String>) -> Expr {
    Expr::Member {
        object: Box::new(object),
        name: name.into(),
        span: Span::UNKNOWN,
    }
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expression(expr)
}

pub fn return_stmt(expr: Option<Expr>) -> Stmt {
    Stmt::Return(expr, Span::UNKNOWN)
}
