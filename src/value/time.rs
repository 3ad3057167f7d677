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

//! The `time` value kind: an instant plus a UTC-offset "location".
//!
//! Grounded on the teacher's `prototypes/time.rs`, which leans on `chrono`
//! for `now`/`utc`/`local`/`format`; this type keeps that dependency but
//! wraps it in a value-semantic, `Copy` struct instead of the teacher's
//! ad-hoc `Value::Number`-backed timestamps.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, FixedOffset, TimeZone, Timelike, Utc};

use super::DurationValue;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeValue {
    pub instant: DateTime<Utc>,
    pub offset_minutes: i32,
}

impl TimeValue {
    pub fn now_utc() -> Self {
        Self {
            instant: Utc::now(),
            offset_minutes: 0,
        }
    }

    pub fn from_unix(seconds: i64) -> Self {
        Self {
            instant: Utc.timestamp_opt(seconds, 0).single().unwrap_or_else(Utc::now),
            offset_minutes: 0,
        }
    }

    pub fn with_offset_minutes(&self, offset_minutes: i32) -> Self {
        Self {
            instant: self.instant,
            offset_minutes,
        }
    }

    pub fn to_unix(&self) -> i64 {
        self.instant.timestamp()
    }

    /// The local (offset-applied) view used for `strftime`/`round`/`floor`.
    fn local(&self) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(self.offset_minutes * 60).unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
        self.instant.with_timezone(&offset)
    }

    pub fn add_duration(&self, d: &DurationValue) -> TimeValue {
        TimeValue {
            instant: self.instant + ChronoDuration::seconds(d.seconds),
            offset_minutes: self.offset_minutes,
        }
    }

    pub fn sub_duration(&self, d: &DurationValue) -> TimeValue {
        TimeValue {
            instant: self.instant - ChronoDuration::seconds(d.seconds),
            offset_minutes: self.offset_minutes,
        }
    }

    /// `time − time = duration`.
    pub fn diff(&self, other: &TimeValue) -> DurationValue {
        DurationValue::new((self.instant - other.instant).num_seconds())
    }

    pub fn strftime(&self, fmt: &str) -> String {
        self.local().format(fmt).to_string()
    }

    pub fn round_to_second(&self) -> TimeValue {
        let nanos = self.instant.nanosecond();
        let rounded = if nanos >= 500_000_000 {
            self.instant + ChronoDuration::nanoseconds(1_000_000_000 - nanos as i64)
        } else {
            self.instant - ChronoDuration::nanoseconds(nanos as i64)
        };
        TimeValue {
            instant: rounded,
            offset_minutes: self.offset_minutes,
        }
    }

    pub fn floor_to_second(&self) -> TimeValue {
        let nanos = self.instant.nanosecond();
        TimeValue {
            instant: self.instant - ChronoDuration::nanoseconds(nanos as i64),
            offset_minutes: self.offset_minutes,
        }
    }

    pub fn ceil_to_second(&self) -> TimeValue {
        let nanos = self.instant.nanosecond();
        if nanos == 0 {
            return *self;
        }
        TimeValue {
            instant: self.instant + ChronoDuration::nanoseconds(1_000_000_000 - nanos as i64),
            offset_minutes: self.offset_minutes,
        }
    }

    pub fn year(&self) -> i32 {
        self.local().year()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_produces_duration_in_seconds() {
        let a = TimeValue::from_unix(1000);
        let b = TimeValue::from_unix(940);
        assert_eq!(a.diff(&b).seconds, 60);
    }

    #[test]
    fn add_duration_shifts_instant() {
        let a = TimeValue::from_unix(1000);
        let shifted = a.add_duration(&DurationValue::new(60));
        assert_eq!(shifted.to_unix(), 1060);
    }
}
