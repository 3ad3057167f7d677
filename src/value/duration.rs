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

//! The `duration` value kind: a signed count of seconds.

use crate::error::ScriptError;
use crate::error::ScriptResult;
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DurationValue {
    pub seconds: i64,
}

impl DurationValue {
    pub fn new(seconds: i64) -> Self {
        Self { seconds }
    }

    pub fn add(&self, other: &DurationValue) -> DurationValue {
        DurationValue::new(self.seconds + other.seconds)
    }

    pub fn sub(&self, other: &DurationValue) -> DurationValue {
        DurationValue::new(self.seconds - other.seconds)
    }

    pub fn mul_int(&self, n: i64) -> DurationValue {
        DurationValue::new(self.seconds * n)
    }

    /// `duration / duration = float` (ratio of the two durations).
    pub fn div_duration(&self, other: &DurationValue, span: Span) -> ScriptResult<f64> {
        if other.seconds == 0 {
            return Err(ScriptError::arithmetic("division by zero", span));
        }
        Ok(self.seconds as f64 / other.seconds as f64)
    }

    /// `duration % duration = duration`.
    pub fn rem_duration(&self, other: &DurationValue, span: Span) -> ScriptResult<DurationValue> {
        if other.seconds == 0 {
            return Err(ScriptError::arithmetic("modulo by zero", span));
        }
        Ok(DurationValue::new(self.seconds % other.seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_of_two_durations_is_float() {
        let a = DurationValue::new(90);
        let b = DurationValue::new(60);
        assert_eq!(a.div_duration(&b, Span::UNKNOWN).unwrap(), 1.5);
    }

    #[test]
    fn division_by_zero_duration_fails() {
        let a = DurationValue::new(90);
        let zero = DurationValue::new(0);
        assert!(a.div_duration(&zero, Span::UNKNOWN).is_err());
        assert!(a.rem_duration(&zero, Span::UNKNOWN).is_err());
    }
}
