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

//! Binary/unary/comparison operator semantics — the table in spec.md §4.7.

use crate::ast::{BinaryOp, UnaryOp};
use crate::error::{ScriptError, ScriptResult};
use crate::span::Span;
use crate::value::Value;

pub fn eval_unary(op: UnaryOp, operand: Value, span: Span) -> ScriptResult<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::Neg => match operand {
            Value::Int(n) => Ok(Value::Int(-n)),
            Value::Float(n) => Ok(Value::Float(-n)),
            other => Err(ScriptError::type_error(
                format!("unary - expected int or float, got {}", other.type_name()),
                span,
            )),
        },
    }
}

fn type_error_for_binary(op: BinaryOp, left: &Value, right: &Value, span: Span) -> ScriptError {
    ScriptError::type_error(
        format!(
            "operator {} not defined for {} and {}",
            op_symbol(op),
            left.type_name(),
            right.type_name()
        ),
        span,
    )
}

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
    }
}

pub fn eval_binary(op: BinaryOp, left: Value, right: Value, span: Span) -> ScriptResult<Value> {
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(Value::equals(&left, &right))),
        BinaryOp::NotEq => return Ok(Value::Bool(!Value::equals(&left, &right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            return eval_comparison(op, &left, &right, span)
        }
        _ => {}
    }

    match (op, left, right) {
        (BinaryOp::Add, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
        (BinaryOp::Add, Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (BinaryOp::Add, Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as f64 + b)),
        (BinaryOp::Add, Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + b as f64)),
        (BinaryOp::Add, Value::Money(a), Value::Money(b)) => Ok(Value::Money(a.add(&b, span)?)),
        (BinaryOp::Add, Value::Duration(a), Value::Duration(b)) => Ok(Value::Duration(a.add(&b))),
        (BinaryOp::Add, Value::Time(a), Value::Duration(b)) => Ok(Value::Time(a.add_duration(&b))),
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::string(format!("{a}{b}"))),
        (BinaryOp::Add, Value::Array(a), Value::Array(b)) => {
            let mut items = a.lock().unwrap().clone();
            items.extend(b.lock().unwrap().iter().cloned());
            Ok(Value::array(items))
        }

        (BinaryOp::Sub, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a - b)),
        (BinaryOp::Sub, Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
        (BinaryOp::Sub, Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as f64 - b)),
        (BinaryOp::Sub, Value::Float(a), Value::Int(b)) => Ok(Value::Float(a - b as f64)),
        (BinaryOp::Sub, Value::Money(a), Value::Money(b)) => Ok(Value::Money(a.sub(&b, span)?)),
        (BinaryOp::Sub, Value::Duration(a), Value::Duration(b)) => Ok(Value::Duration(a.sub(&b))),
        (BinaryOp::Sub, Value::Time(a), Value::Time(b)) => Ok(Value::Duration(a.diff(&b))),
        (BinaryOp::Sub, Value::Time(a), Value::Duration(b)) => Ok(Value::Time(a.sub_duration(&b))),
        (BinaryOp::Sub, Value::Array(a), Value::Array(b)) => {
            let excluded = b.lock().unwrap();
            let items: Vec<Value> = a
                .lock()
                .unwrap()
                .iter()
                .filter(|v| !excluded.iter().any(|e| Value::equals(v, e)))
                .cloned()
                .collect();
            Ok(Value::array(items))
        }

        (BinaryOp::Mul, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a * b)),
        (BinaryOp::Mul, Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
        (BinaryOp::Mul, Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as f64 * b)),
        (BinaryOp::Mul, Value::Float(a), Value::Int(b)) => Ok(Value::Float(a * b as f64)),
        (BinaryOp::Mul, Value::Money(a), Value::Int(b)) => Ok(Value::Money(a.mul_int(b))),
        (BinaryOp::Mul, Value::Duration(a), Value::Int(b)) => Ok(Value::Duration(a.mul_int(b))),

        (BinaryOp::Div, Value::Int(a), Value::Int(b)) => {
            if b == 0 {
                return Err(ScriptError::arithmetic("division by zero", span));
            }
            Ok(Value::Float(a as f64 / b as f64))
        }
        (BinaryOp::Div, Value::Float(a), Value::Float(b)) => {
            if b == 0.0 {
                return Err(ScriptError::arithmetic("division by zero", span));
            }
            Ok(Value::Float(a / b))
        }
        (BinaryOp::Div, Value::Int(a), Value::Float(b)) => {
            if b == 0.0 {
                return Err(ScriptError::arithmetic("division by zero", span));
            }
            Ok(Value::Float(a as f64 / b))
        }
        (BinaryOp::Div, Value::Float(a), Value::Int(b)) => {
            if b == 0 {
                return Err(ScriptError::arithmetic("division by zero", span));
            }
            Ok(Value::Float(a / b as f64))
        }
        (BinaryOp::Div, Value::Money(a), Value::Int(b)) => Ok(Value::Money(a.div_int(b, span)?)),
        (BinaryOp::Div, Value::Duration(a), Value::Duration(b)) => Ok(Value::Float(a.div_duration(&b, span)?)),

        (BinaryOp::Mod, Value::Int(a), Value::Int(b)) => {
            if b == 0 {
                return Err(ScriptError::arithmetic("modulo by zero", span));
            }
            Ok(Value::Int(a % b))
        }
        (BinaryOp::Mod, Value::Duration(a), Value::Duration(b)) => {
            Ok(Value::Duration(a.rem_duration(&b, span)?))
        }

        (op, left, right) => Err(type_error_for_binary(op, &left, &right, span)),
    }
}

fn eval_comparison(op: BinaryOp, left: &Value, right: &Value, span: Span) -> ScriptResult<Value> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
        (Value::Str(a), Value::Str(b)) => Some(a.as_ref().cmp(b.as_ref())),
        (Value::Duration(a), Value::Duration(b)) => a.seconds.partial_cmp(&b.seconds),
        (Value::Time(a), Value::Time(b)) => a.instant.partial_cmp(&b.instant),
        (Value::Money(a), Value::Money(b)) => {
            if a.currency() != b.currency() {
                return Err(ScriptError::arithmetic(
                    format!("money currency mismatch: {} vs {}", a.currency(), b.currency()),
                    span,
                ));
            }
            a.minor_units.partial_cmp(&b.minor_units)
        }
        _ => None,
    };

    let ordering = ordering.ok_or_else(|| type_error_for_binary(op, left, right, span))?;
    let result = match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Ge => ordering.is_ge(),
        _ => unreachable!("eval_comparison only called for ordering operators"),
    };
    Ok(Value::Bool(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_division_by_zero_reports_canonical_message() {
        let err = eval_binary(BinaryOp::Div, Value::Int(10), Value::Int(0), Span::UNKNOWN).unwrap_err();
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn int_int_division_widens_to_float() {
        let v = eval_binary(BinaryOp::Div, Value::Int(5), Value::Int(2), Span::UNKNOWN).unwrap();
        assert!(matches!(v, Value::Float(f) if f == 2.5));
    }

    #[test]
    fn array_concat_on_add() {
        let a = Value::array(vec![Value::Int(1)]);
        let b = Value::array(vec![Value::Int(2)]);
        let v = eval_binary(BinaryOp::Add, a, b, Span::UNKNOWN).unwrap();
        if let Value::Array(items) = v {
            assert_eq!(items.lock().unwrap().len(), 2);
        } else {
            panic!("expected array");
        }
    }

    #[test]
    fn money_comparison_requires_matching_currency() {
        use crate::value::Money;
        let a = Value::Money(Money::new(100, "USD"));
        let b = Value::Money(Money::new(50, "EUR"));
        assert!(eval_comparison(BinaryOp::Gt, &a, &b, Span::UNKNOWN).is_err());
    }
}
