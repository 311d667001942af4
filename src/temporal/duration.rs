//! Calendar-aware durations used for window sizes, strides and offsets

use std::fmt;
use std::str::FromStr;

use chrono::{Months, NaiveDateTime};

use crate::core::column::TimeUnit;
use crate::core::error::{Error, Result};

const NS_SECOND: i64 = 1_000_000_000;
const NS_DAY: i64 = 86_400 * NS_SECOND;
const NS_WEEK: i64 = 7 * NS_DAY;

/// Domain of an index column, as seen by window arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Plain integers; only `i` durations apply
    Int,
    /// Ticks since the epoch in the given unit
    Temporal(TimeUnit),
}

impl IndexKind {
    fn ticks_per_day(self) -> i64 {
        match self {
            IndexKind::Int => 1,
            IndexKind::Temporal(tu) => NS_DAY / tu.nanos_per_tick(),
        }
    }
}

/// A signed span of months, weeks, days and nanoseconds, or an index count.
///
/// The components are stored as magnitudes with one sign flag, so `-1mo2d`
/// means "back one month and two days".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Duration {
    months: i64,
    weeks: i64,
    days: i64,
    nsecs: i64,
    negative: bool,
    /// Set for `i` durations, where `nsecs` holds the index count
    parsed_int: bool,
}

impl Duration {
    /// Parse a duration string such as `1d12h`, `-3mo` or `10i`
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |msg: &str| Error::InvalidDuration(format!("'{}': {}", s, msg));

        let trimmed = s.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        if body.is_empty() {
            return Err(invalid("empty duration"));
        }

        let mut out = Duration {
            negative,
            ..Default::default()
        };
        let mut saw_time_unit = false;
        let mut chars = body.char_indices().peekable();

        while chars.peek().is_some() {
            let start = chars.peek().map(|(i, _)| *i).unwrap_or(0);
            let mut end = start;
            while let Some((i, c)) = chars.peek().copied() {
                if !c.is_ascii_digit() {
                    break;
                }
                end = i + c.len_utf8();
                chars.next();
            }
            if end == start {
                return Err(invalid("expected an integer before each unit"));
            }
            let n: i64 = body[start..end]
                .parse()
                .map_err(|_| invalid("integer out of range"))?;

            let unit_start = end;
            let mut unit_end = end;
            while let Some((i, c)) = chars.peek().copied() {
                if c.is_ascii_digit() {
                    break;
                }
                unit_end = i + c.len_utf8();
                chars.next();
            }
            let unit = &body[unit_start..unit_end];

            let overflow = || invalid("value out of range");
            let add_ns = |acc: i64, mul: i64| -> Result<i64> {
                n.checked_mul(mul)
                    .and_then(|v| acc.checked_add(v))
                    .ok_or_else(overflow)
            };

            match unit {
                "ns" => out.nsecs = add_ns(out.nsecs, 1)?,
                "us" => out.nsecs = add_ns(out.nsecs, 1_000)?,
                "ms" => out.nsecs = add_ns(out.nsecs, 1_000_000)?,
                "s" => out.nsecs = add_ns(out.nsecs, NS_SECOND)?,
                "m" => out.nsecs = add_ns(out.nsecs, 60 * NS_SECOND)?,
                "h" => out.nsecs = add_ns(out.nsecs, 3_600 * NS_SECOND)?,
                "d" => out.days = out.days.checked_add(n).ok_or_else(overflow)?,
                "w" => out.weeks = out.weeks.checked_add(n).ok_or_else(overflow)?,
                "mo" => out.months = out.months.checked_add(n).ok_or_else(overflow)?,
                "q" => out.months = add_ns(out.months, 3)?,
                "y" => out.months = add_ns(out.months, 12)?,
                "i" => {
                    out.nsecs = out.nsecs.checked_add(n).ok_or_else(overflow)?;
                    out.parsed_int = true;
                }
                "" => return Err(invalid("missing unit")),
                other => return Err(invalid(&format!("unknown unit '{}'", other))),
            }
            if unit != "i" {
                saw_time_unit = true;
            }
        }

        if out.parsed_int && saw_time_unit {
            return Err(invalid("index units cannot be mixed with time units"));
        }
        Ok(out)
    }

    /// An index-count duration for integer index columns
    pub fn from_index_count(n: i64) -> Self {
        Duration {
            nsecs: n.abs(),
            negative: n < 0,
            parsed_int: true,
            ..Default::default()
        }
    }

    pub fn from_months(n: i64) -> Self {
        Duration {
            months: n.abs(),
            negative: n < 0,
            ..Default::default()
        }
    }

    pub fn from_weeks(n: i64) -> Self {
        Duration {
            weeks: n.abs(),
            negative: n < 0,
            ..Default::default()
        }
    }

    pub fn from_days(n: i64) -> Self {
        Duration {
            days: n.abs(),
            negative: n < 0,
            ..Default::default()
        }
    }

    pub fn from_nanos(n: i64) -> Self {
        Duration {
            nsecs: n.abs(),
            negative: n < 0,
            ..Default::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.weeks == 0 && self.days == 0 && self.nsecs == 0
    }

    pub fn is_negative(&self) -> bool {
        self.negative && !self.is_zero()
    }

    /// Strictly positive, the requirement for `period` and `every`
    pub fn is_positive(&self) -> bool {
        !self.negative && !self.is_zero()
    }

    pub fn is_index_count(&self) -> bool {
        self.parsed_int
    }

    /// True when the duration has month or week components
    pub fn is_calendar(&self) -> bool {
        self.months != 0 || self.weeks != 0
    }

    pub fn months(&self) -> i64 {
        self.months
    }

    pub fn weeks(&self) -> i64 {
        self.weeks
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    pub fn nanoseconds(&self) -> i64 {
        self.nsecs
    }

    pub fn negate(&self) -> Self {
        Duration {
            negative: !self.negative,
            ..*self
        }
    }

    /// Scale every component by `k`; month strides stay whole months
    pub fn mul(&self, k: i64) -> Result<Self> {
        let overflow = || Error::InvalidDuration(format!("{} * {} overflows", self, k));
        let mag = k.checked_abs().ok_or_else(overflow)?;
        Ok(Duration {
            months: self.months.checked_mul(mag).ok_or_else(overflow)?,
            weeks: self.weeks.checked_mul(mag).ok_or_else(overflow)?,
            days: self.days.checked_mul(mag).ok_or_else(overflow)?,
            nsecs: self.nsecs.checked_mul(mag).ok_or_else(overflow)?,
            negative: self.negative ^ (k < 0),
            parsed_int: self.parsed_int,
        })
    }

    /// Check that the units make sense for an index of the given kind
    pub fn check_kind(&self, kind: IndexKind, name: &str) -> Result<()> {
        match kind {
            IndexKind::Int if !self.parsed_int && !self.is_zero() => Err(Error::InvalidDuration(
                format!("{} '{}' must use index units ('i') on an integer index", name, self),
            )),
            IndexKind::Temporal(_) if self.parsed_int => Err(Error::InvalidDuration(format!(
                "{} '{}' uses index units on a temporal index",
                name, self
            ))),
            _ => Ok(()),
        }
    }

    /// Length in ticks when the duration has no calendar components
    pub fn fixed_ticks(&self, kind: IndexKind) -> Option<i64> {
        if self.is_calendar() {
            return None;
        }
        let magnitude = match kind {
            IndexKind::Int => self.nsecs,
            IndexKind::Temporal(tu) => {
                self.days * kind.ticks_per_day() + self.nsecs / tu.nanos_per_tick()
            }
        };
        Some(if self.negative { -magnitude } else { magnitude })
    }

    /// Reject a duration that rounds down to zero ticks of the index
    pub fn check_resolution(&self, kind: IndexKind, name: &str) -> Result<()> {
        if !self.is_zero() && self.fixed_ticks(kind) == Some(0) {
            return Err(Error::InvalidDuration(format!(
                "{} '{}' is shorter than one tick of the index",
                name, self
            )));
        }
        Ok(())
    }

    /// `t + self` in the index domain, with calendar months and day clamping
    pub fn add_to(&self, t: i64, kind: IndexKind) -> Result<i64> {
        let overflow = || Error::InvalidDuration(format!("{} + {} overflows", t, self));
        let tu = match kind {
            IndexKind::Int => {
                let delta = if self.negative { -self.nsecs } else { self.nsecs };
                return t.checked_add(delta).ok_or_else(overflow);
            }
            IndexKind::Temporal(tu) => tu,
        };

        let mut t = t;
        if self.months > 0 {
            let dt = ticks_to_datetime(t, tu).ok_or_else(overflow)?;
            let months = Months::new(u32::try_from(self.months).map_err(|_| overflow())?);
            let shifted = if self.negative {
                dt.checked_sub_months(months)
            } else {
                dt.checked_add_months(months)
            }
            .ok_or_else(overflow)?;
            t = datetime_to_ticks(shifted, tu).ok_or_else(overflow)?;
        }

        let tpd = kind.ticks_per_day();
        let fixed = self
            .weeks
            .checked_mul(7 * tpd)
            .and_then(|w| self.days.checked_mul(tpd).and_then(|d| w.checked_add(d)))
            .and_then(|v| v.checked_add(self.nsecs / tu.nanos_per_tick()))
            .ok_or_else(overflow)?;
        let fixed = if self.negative { -fixed } else { fixed };
        t.checked_add(fixed).ok_or_else(overflow)
    }

    /// Round `t` down to a multiple of this duration.
    ///
    /// Months count from 1970-01, weeks start on Monday, and other units are
    /// multiples of their length since the epoch.
    pub fn truncate(&self, t: i64, kind: IndexKind) -> Result<i64> {
        let tu = match kind {
            IndexKind::Int => {
                if self.nsecs == 0 {
                    return Err(Error::InvalidDuration("cannot truncate by zero".into()));
                }
                return Ok(t - t.rem_euclid(self.nsecs));
            }
            IndexKind::Temporal(tu) => tu,
        };

        match (self.months, self.weeks, self.days, self.nsecs) {
            (0, 0, 0, 0) => Err(Error::InvalidDuration("cannot truncate by zero".into())),
            (0, 0, days, nsecs) => {
                let every = days * kind.ticks_per_day() + nsecs / tu.nanos_per_tick();
                if every == 0 {
                    return Err(Error::InvalidDuration(format!(
                        "'{}' is shorter than one {} tick",
                        self, tu
                    )));
                }
                Ok(t - t.rem_euclid(every))
            }
            (0, weeks, 0, 0) => {
                // 1970-01-01 was a Thursday; the previous Monday is 3 days earlier
                let monday = -3 * kind.ticks_per_day();
                let every = weeks * 7 * kind.ticks_per_day();
                Ok(t - (t - monday).rem_euclid(every))
            }
            (months, 0, 0, 0) => {
                use chrono::Datelike;
                let overflow = || Error::InvalidDuration(format!("cannot truncate {}", t));
                let dt = ticks_to_datetime(t, tu).ok_or_else(overflow)?;
                let total = (dt.year() as i64 - 1970) * 12 + dt.month0() as i64;
                let truncated = total - total.rem_euclid(months);
                let year = 1970 + truncated.div_euclid(12);
                let month = truncated.rem_euclid(12) + 1;
                let start = chrono::NaiveDate::from_ymd_opt(year as i32, month as u32, 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .ok_or_else(overflow)?;
                datetime_to_ticks(start, tu).ok_or_else(overflow)
            }
            _ => Err(Error::InvalidDuration(format!(
                "cannot truncate by '{}': months, weeks and shorter units may not be mixed",
                self
            ))),
        }
    }
}

pub(crate) fn ticks_to_datetime(t: i64, tu: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match tu {
        TimeUnit::Milliseconds => chrono::DateTime::from_timestamp_millis(t)?,
        TimeUnit::Microseconds => chrono::DateTime::from_timestamp_micros(t)?,
        TimeUnit::Nanoseconds => chrono::DateTime::from_timestamp_nanos(t),
    };
    Some(dt.naive_utc())
}

pub(crate) fn datetime_to_ticks(dt: NaiveDateTime, tu: TimeUnit) -> Option<i64> {
    let utc = dt.and_utc();
    match tu {
        TimeUnit::Milliseconds => Some(utc.timestamp_millis()),
        TimeUnit::Microseconds => Some(utc.timestamp_micros()),
        TimeUnit::Nanoseconds => utc.timestamp_nanos_opt(),
    }
}

impl FromStr for Duration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Duration::parse(s)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0s");
        }
        if self.negative {
            write!(f, "-")?;
        }
        if self.parsed_int {
            return write!(f, "{}i", self.nsecs);
        }
        if self.months > 0 {
            write!(f, "{}mo", self.months)?;
        }
        if self.weeks > 0 {
            write!(f, "{}w", self.weeks)?;
        }
        if self.days > 0 {
            write!(f, "{}d", self.days)?;
        }
        if self.nsecs > 0 {
            if self.nsecs % NS_SECOND == 0 {
                write!(f, "{}s", self.nsecs / NS_SECOND)?;
            } else {
                write!(f, "{}ns", self.nsecs)?;
            }
        }
        Ok(())
    }
}

impl From<chrono::Duration> for Duration {
    fn from(d: chrono::Duration) -> Self {
        let nanos = d
            .num_nanoseconds()
            .unwrap_or_else(|| d.num_microseconds().unwrap_or(i64::MAX).saturating_mul(1_000));
        let days = nanos / NS_DAY;
        let rest = nanos % NS_DAY;
        Duration {
            days: days.abs(),
            nsecs: rest.abs(),
            negative: nanos < 0,
            ..Default::default()
        }
    }
}

/// Anything accepted where a window duration is expected
pub trait IntoDuration {
    fn into_duration(self) -> Result<Duration>;
}

impl IntoDuration for Duration {
    fn into_duration(self) -> Result<Duration> {
        Ok(self)
    }
}

impl IntoDuration for chrono::Duration {
    fn into_duration(self) -> Result<Duration> {
        Ok(self.into())
    }
}

impl IntoDuration for &str {
    fn into_duration(self) -> Result<Duration> {
        Duration::parse(self)
    }
}

impl IntoDuration for String {
    fn into_duration(self) -> Result<Duration> {
        Duration::parse(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: IndexKind = IndexKind::Temporal(TimeUnit::Milliseconds);
    const DAY_MS: i64 = 86_400_000;

    fn ms(y: i32, m: u32, d: u32) -> i64 {
        chrono::NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    #[test]
    fn test_parse_compound() {
        let d = Duration::parse("1d12h").unwrap();
        assert_eq!(d.days(), 1);
        assert_eq!(d.nanoseconds(), 12 * 3_600 * NS_SECOND);
        assert!(d.is_positive());

        let d = Duration::parse("-2mo").unwrap();
        assert_eq!(d.months(), 2);
        assert!(d.is_negative());

        assert_eq!(Duration::parse("1y2q").unwrap().months(), 18);
        assert!(Duration::parse("3i").unwrap().is_index_count());
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "-", "d", "3", "3x", "1i2d", "1.5h"] {
            assert!(
                matches!(Duration::parse(bad), Err(Error::InvalidDuration(_))),
                "{:?} should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_add_months_clamps_day() {
        let jan31 = ms(2021, 1, 31);
        let feb = Duration::from_months(1).add_to(jan31, MS).unwrap();
        assert_eq!(feb, ms(2021, 2, 28));
        let back = Duration::from_months(-1).add_to(ms(2021, 3, 31), MS).unwrap();
        assert_eq!(back, ms(2021, 2, 28));
    }

    #[test]
    fn test_truncate_rules() {
        let t = ms(2021, 12, 16) + 5 * 3_600_000;
        assert_eq!(Duration::parse("1d").unwrap().truncate(t, MS).unwrap(), ms(2021, 12, 16));
        assert_eq!(Duration::parse("1mo").unwrap().truncate(t, MS).unwrap(), ms(2021, 12, 1));
        assert_eq!(Duration::parse("1q").unwrap().truncate(t, MS).unwrap(), ms(2021, 10, 1));
        // 2021-12-13 is a Monday
        assert_eq!(Duration::parse("1w").unwrap().truncate(t, MS).unwrap(), ms(2021, 12, 13));
        assert_eq!(Duration::from_index_count(5).truncate(-3, IndexKind::Int).unwrap(), -5);
        assert!(Duration::parse("1mo1d").unwrap().truncate(t, MS).is_err());
    }

    #[test]
    fn test_mul_and_fixed_ticks() {
        let d = Duration::parse("2d").unwrap().mul(3).unwrap();
        assert_eq!(d.fixed_ticks(MS), Some(6 * DAY_MS));
        assert_eq!(Duration::from_months(1).fixed_ticks(MS), None);
        assert_eq!(Duration::from(chrono::Duration::hours(-36)).fixed_ticks(MS), Some(-36 * 3_600_000));
    }

    #[test]
    fn test_check_kind() {
        assert!(Duration::parse("2d").unwrap().check_kind(IndexKind::Int, "period").is_err());
        assert!(Duration::parse("2i").unwrap().check_kind(MS, "period").is_err());
        assert!(Duration::default().check_kind(IndexKind::Int, "offset").is_ok());
    }

    #[test]
    fn test_check_resolution() {
        let us = Duration::parse("1us").unwrap();
        assert!(matches!(us.check_resolution(MS, "every"), Err(Error::InvalidDuration(_))));
        assert!(us
            .check_resolution(IndexKind::Temporal(TimeUnit::Microseconds), "every")
            .is_ok());
        assert!(Duration::parse("1ms").unwrap().check_resolution(MS, "every").is_ok());
        assert!(Duration::from_months(1).check_resolution(MS, "every").is_ok());
        assert!(Duration::default().check_resolution(MS, "offset").is_ok());
    }
}
