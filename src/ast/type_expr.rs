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

//! Gradual type annotations on parameters, returns, and capability contracts.

/// A type expression: a primitive kind, `array<T>`, a union, or a
/// structural shape. Shared between parameter/return annotations and
/// capability contract argument checks.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Int,
    Float,
    String,
    Bool,
    Symbol,
    Money,
    Duration,
    Time,
    Any,
    Nil,
    Array(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
    /// Structural hash check; field order is preserved only so error
    /// messages are deterministic, not for matching semantics.
    Shape(Vec<(String, TypeExpr)>),
}

impl TypeExpr {
    /// Human-readable name used in "argument N expected …, got …" messages.
    pub fn describe(&self) -> String {
        match self {
            TypeExpr::Int => "int".to_string(),
            TypeExpr::Float => "float".to_string(),
            TypeExpr::String => "string".to_string(),
            TypeExpr::Bool => "bool".to_string(),
            TypeExpr::Symbol => "symbol".to_string(),
            TypeExpr::Money => "money".to_string(),
            TypeExpr::Duration => "duration".to_string(),
            TypeExpr::Time => "time".to_string(),
            TypeExpr::Any => "any".to_string(),
            TypeExpr::Nil => "nil".to_string(),
            TypeExpr::Array(inner) => format!("array<{}>", inner.describe()),
            TypeExpr::Union(members) => members
                .iter()
                .map(TypeExpr::describe)
                .collect::<Vec<_>>()
                .join(" | "),
            TypeExpr::Shape(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(name, ty)| format!("{name}: {}", ty.describe()))
                    .collect();
                format!("shape{{{}}}", parts.join(", "))
            }
        }
    }
}
