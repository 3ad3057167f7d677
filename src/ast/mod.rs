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

//! The abstract syntax tree the evaluator walks.
//!
//! The grammar and the text-to-tree transformation (lexer/parser) are a
//! host collaborator out of scope for this crate (see [`crate::Frontend`]).
//! What lives here is the tree shape itself: a host-supplied frontend (or,
//! in this crate's own tests, the small builders in `ast::build`) produces
//! these nodes directly.

pub mod build;
mod expr;
mod param;
mod stmt;
mod type_expr;

pub use build::*;
pub use expr::{AssignTarget, BinaryOp, Expr, LogicalOp, UnaryOp};
pub use param::{BlockLiteral, Param};
pub use stmt::{ClassMember, MethodMember, RescueClause, Stmt};
pub use type_expr::TypeExpr;

/// A top-level compiled unit: the statement list a module's source text
/// parses to, handed to the evaluator by [`crate::engine::Script`].
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub statements: Vec<Stmt>,
}
