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

//! Shared `TypeExpr` ↔ `Value` matching, used both for gradual parameter/
//! return annotations (spec.md §4.7 "function dispatch") and for capability
//! contract argument shape checks (spec.md §4.4).

use crate::ast::TypeExpr;
use crate::value::Value;

/// Does `value` satisfy `ty`? An `int` value satisfies a `float`
/// annotation (the evaluator already widens ints to floats in mixed
/// arithmetic, so gradual typing follows the same rule) but not vice
/// versa.
pub fn type_matches(ty: &TypeExpr, value: &Value) -> bool {
    match ty {
        TypeExpr::Any => true,
        TypeExpr::Nil => matches!(value, Value::Nil),
        TypeExpr::Int => matches!(value, Value::Int(_)),
        TypeExpr::Float => matches!(value, Value::Float(_) | Value::Int(_)),
        TypeExpr::String => matches!(value, Value::Str(_)),
        TypeExpr::Bool => matches!(value, Value::Bool(_)),
        TypeExpr::Symbol => matches!(value, Value::Symbol(_)),
        TypeExpr::Money => matches!(value, Value::Money(_)),
        TypeExpr::Duration => matches!(value, Value::Duration(_)),
        TypeExpr::Time => matches!(value, Value::Time(_)),
        TypeExpr::Array(inner) => match value {
            Value::Array(arr) => arr.lock().unwrap().iter().all(|v| type_matches(inner, v)),
            _ => false,
        },
        TypeExpr::Union(members) => members.iter().any(|m| type_matches(m, value)),
        TypeExpr::Shape(fields) => match value {
            Value::Hash(map) | Value::Object(map) => {
                let guard = map.lock().unwrap();
                fields
                    .iter()
                    .all(|(name, t)| guard.get(name).is_some_and(|v| type_matches(t, v)))
            }
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_satisfies_float_annotation() {
        assert!(type_matches(&TypeExpr::Float, &Value::Int(3)));
    }

    #[test]
    fn string_does_not_satisfy_int_annotation() {
        assert!(!type_matches(&TypeExpr::Int, &Value::string("x")));
    }

    #[test]
    fn union_matches_any_member() {
        let ty = TypeExpr::Union(vec![TypeExpr::Int, TypeExpr::String]);
        assert!(type_matches(&ty, &Value::Int(1)));
        assert!(type_matches(&ty, &Value::string("x")));
        assert!(!type_matches(&ty, &Value::Bool(true)));
    }

    #[test]
    fn shape_requires_all_declared_fields() {
        let ty = TypeExpr::Shape(vec![("a".to_string(), TypeExpr::Int)]);
        let mut map = std::collections::HashMap::new();
        map.insert("a".to_string(), Value::Int(1));
        assert!(type_matches(&ty, &Value::hash(map)));
        assert!(!type_matches(&ty, &Value::hash(std::collections::HashMap::new())));
    }
}
