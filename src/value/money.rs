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

//! The `money` value kind: integer minor-units plus a 3-letter currency.

use std::fmt;

use crate::error::ScriptError;
use crate::error::ScriptResult;
use crate::span::Span;

/// `minor_units` is the smallest-denomination count (e.g. cents); the
/// currency is stored inline as 3 uppercase ASCII bytes so `Money` stays
/// `Copy` and cheap to carry around in a `Value`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Money {
    pub minor_units: i64,
    currency: [u8; 3],
}

impl Money {
    /// `currency` must be exactly 3 ASCII letters; callers (the `money()`
    /// builtin, literal construction in tests) are expected to validate
    /// this up front since it is a programmer error, not a runtime one.
    pub fn new(minor_units: i64, currency: &str) -> Self {
        let bytes = currency.as_bytes();
        debug_assert_eq!(bytes.len(), 3, "currency code must be 3 letters");
        let mut code = [0u8; 3];
        for (i, b) in bytes.iter().take(3).enumerate() {
            code[i] = b.to_ascii_uppercase();
        }
        Self {
            minor_units,
            currency: code,
        }
    }

    pub fn currency(&self) -> &str {
        std::str::from_utf8(&self.currency).unwrap_or("???")
    }

    fn require_same_currency(&self, other: &Money, span: Span) -> ScriptResult<()> {
        if self.currency != other.currency {
            return Err(ScriptError::arithmetic(
                format!(
                    "money currency mismatch: {} vs {}",
                    self.currency(),
                    other.currency()
                ),
                span,
            ));
        }
        Ok(())
    }

    pub fn add(&self, other: &Money, span: Span) -> ScriptResult<Money> {
        self.require_same_currency(other, span)?;
        Ok(Money {
            minor_units: self.minor_units + other.minor_units,
            currency: self.currency,
        })
    }

    pub fn sub(&self, other: &Money, span: Span) -> ScriptResult<Money> {
        self.require_same_currency(other, span)?;
        Ok(Money {
            minor_units: self.minor_units - other.minor_units,
            currency: self.currency,
        })
    }

    pub fn mul_int(&self, n: i64) -> Money {
        Money {
            minor_units: self.minor_units * n,
            currency: self.currency,
        }
    }

    /// Divide by an integer, rounding the resulting minor-units to the
    /// nearest whole unit using round-half-to-even (spec.md §4.7).
    pub fn div_int(&self, n: i64, span: Span) -> ScriptResult<Money> {
        if n == 0 {
            return Err(ScriptError::arithmetic("division by zero", span));
        }
        let rounded = round_half_to_even_div(self.minor_units as i128, n as i128);
        Ok(Money {
            minor_units: rounded as i64,
            currency: self.currency,
        })
    }
}

/// Round-half-to-even (banker's rounding) integer division.
pub fn round_half_to_even_div(n: i128, d: i128) -> i128 {
    let q = n / d;
    let r = n % d;
    if r == 0 {
        return q;
    }
    let twice_r = r * 2;
    let adjust = match twice_r.abs().cmp(&d.abs()) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => q % 2 != 0,
    };
    if adjust {
        if (n < 0) != (d < 0) {
            q - 1
        } else {
            q + 1
        }
    } else {
        q
    }
}

impl fmt::Debug for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.minor_units, self.currency())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_requires_matching_currency() {
        let a = Money::new(100, "usd");
        let b = Money::new(50, "USD");
        assert_eq!(a.add(&b, Span::UNKNOWN).unwrap().minor_units, 150);

        let c = Money::new(50, "eur");
        assert!(a.add(&c, Span::UNKNOWN).is_err());
    }

    #[test]
    fn div_int_rounds_half_to_even() {
        // 10 / 4 = 2.5 -> rounds to 2 (even)
        assert_eq!(round_half_to_even_div(10, 4), 2);
        // 30 / 4 = 7.5 -> rounds to 8 (even)
        assert_eq!(round_half_to_even_div(30, 4), 8);
        // -10 / 4 = -2.5 -> rounds to -2 (even)
        assert_eq!(round_half_to_even_div(-10, 4), -2);
        // 7 / 2 = 3.5 -> rounds to 4 (even)
        assert_eq!(round_half_to_even_div(7, 2), 4);
    }

    #[test]
    fn div_int_by_zero_fails() {
        let m = Money::new(100, "USD");
        assert!(m.div_int(0, Span::UNKNOWN).is_err());
    }
}
