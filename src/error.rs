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

//! The error taxonomy shared across every core component.
//!
//! Every fallible operation in this crate returns `Result<T, ScriptError>`.
//! `ScriptError` carries a stable `ErrorKind` (used for `rescue` class-name
//! matching), a human-readable message (carrying the canonical substrings
//! the host's test suite depends on), and the source position where the
//! error was detected.

use std::fmt;

use crate::span::Span;

/// Taxonomy of error kinds, matching the list in the design notes exactly.
/// This is not a type hierarchy scripts can subclass — `rescue` matches by
/// comparing a clause's declared name against [`ErrorKind::class_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown kwarg, extra positional, missing required positional, block
    /// required or forbidden.
    Arity,
    /// Argument, return, parameter, operator-operand, hash-key coercion,
    /// composite/shape mismatch.
    Type,
    /// Division/modulo by zero, currency mismatch, float-to-int overflow.
    Arithmetic,
    /// Array/string index out of bounds.
    Bounds,
    /// Unknown identifier/method/class/ivar, private method access.
    Name,
    /// `assert` condition was falsey.
    Assertion,
    /// Step/memory/recursion quota, JSON/regex size limits.
    Resource,
    /// Contract failure, duplicate contract, strict-effects violation.
    Capability,
    /// Cycle, not-found, escape-root, policy-denied, alias conflict.
    Module,
    /// Context was cancelled.
    Cancellation,
}

impl ErrorKind {
    /// The name a `rescue(Name)` clause matches against.
    pub fn class_name(self) -> &'static str {
        match self {
            ErrorKind::Arity => "ArityError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Arithmetic => "ArithmeticError",
            ErrorKind::Bounds => "BoundsError",
            ErrorKind::Name => "NameError",
            ErrorKind::Assertion => "AssertionError",
            ErrorKind::Resource => "ResourceError",
            ErrorKind::Capability => "CapabilityError",
            ErrorKind::Module => "ModuleError",
            ErrorKind::Cancellation => "CancellationError",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
    pub help: Option<String>,
}

impl ScriptError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn arity(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Arity, message, span)
    }

    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Type, message, span)
    }

    pub fn arithmetic(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Arithmetic, message, span)
    }

    pub fn bounds(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Bounds, message, span)
    }

    pub fn name(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Name, message, span)
    }

    pub fn assertion(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Assertion, message, span)
    }

    pub fn resource(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Resource, message, span)
    }

    pub fn capability(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Capability, message, span)
    }

    pub fn module(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Module, message, span)
    }

    pub fn cancellation(message: impl Into<String>, span: Span) -> Self {
        Self::new(
            ErrorKind::Cancellation,
            message,
            span,
        )
    }

    /// Does this clause's declared class name match this error's kind?
    pub fn matches_class(&self, class_name: &str) -> bool {
        self.kind.class_name() == class_name
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)?;
        if let Some(help) = &self.help {
            write!(f, " ({help})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ScriptError {}

pub type ScriptResult<T> = Result<T, ScriptError>;
