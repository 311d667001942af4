//! Window boundary computation for rolling and dynamic grouping

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Weekday};

use crate::core::error::{Error, Result};
use crate::temporal::duration::{ticks_to_datetime, Duration, IndexKind};
use crate::IdxSize;

/// Which window endpoints are members of the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowClosed {
    /// `[lower, upper)`
    Left,
    /// `(lower, upper]`
    Right,
    /// `[lower, upper]`
    Both,
    /// `(lower, upper)`
    Neither,
}

impl WindowClosed {
    #[inline]
    fn above_lower(self, t: i64, lower: i64) -> bool {
        match self {
            WindowClosed::Left | WindowClosed::Both => t >= lower,
            WindowClosed::Right | WindowClosed::Neither => t > lower,
        }
    }

    #[inline]
    fn below_upper(self, t: i64, upper: i64) -> bool {
        match self {
            WindowClosed::Right | WindowClosed::Both => t <= upper,
            WindowClosed::Left | WindowClosed::Neither => t < upper,
        }
    }
}

impl FromStr for WindowClosed {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "left" => Ok(WindowClosed::Left),
            "right" => Ok(WindowClosed::Right),
            "both" => Ok(WindowClosed::Both),
            "none" | "neither" => Ok(WindowClosed::Neither),
            other => Err(Error::InvalidValue(format!(
                "closed must be one of left, right, both, none; got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for WindowClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowClosed::Left => write!(f, "left"),
            WindowClosed::Right => write!(f, "right"),
            WindowClosed::Both => write!(f, "both"),
            WindowClosed::Neither => write!(f, "none"),
        }
    }
}

/// How the first dynamic window is anchored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StartBy {
    /// Truncate the first index value to the `every` unit
    #[default]
    WindowBound,
    /// Start exactly at the first index value
    DataPoint,
    /// Midnight of the most recent given weekday on or before the first value
    Weekday(Weekday),
}

impl FromStr for StartBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let weekday = |w| Ok(StartBy::Weekday(w));
        match s.to_lowercase().as_str() {
            "window" => Ok(StartBy::WindowBound),
            "datapoint" => Ok(StartBy::DataPoint),
            "monday" => weekday(Weekday::Mon),
            "tuesday" => weekday(Weekday::Tue),
            "wednesday" => weekday(Weekday::Wed),
            "thursday" => weekday(Weekday::Thu),
            "friday" => weekday(Weekday::Fri),
            "saturday" => weekday(Weekday::Sat),
            "sunday" => weekday(Weekday::Sun),
            _ => Err(Error::InvalidStartBy(s.to_string())),
        }
    }
}

impl fmt::Display for StartBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartBy::WindowBound => write!(f, "window"),
            StartBy::DataPoint => write!(f, "datapoint"),
            StartBy::Weekday(w) => write!(f, "{}", weekday_name(*w)),
        }
    }
}

fn weekday_name(w: Weekday) -> &'static str {
    match w {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// One window over a sorted index slice.
///
/// `first` and `len` address rows of the slice the window was computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub lower: i64,
    pub upper: i64,
    pub first: IdxSize,
    pub len: IdxSize,
}

/// Two-pointer membership scan shared by both window kinds.
///
/// Both bounds must be non-decreasing across successive calls.
struct Sweep<'a> {
    index: &'a [i64],
    closed: WindowClosed,
    lo: usize,
    hi: usize,
}

impl<'a> Sweep<'a> {
    fn new(index: &'a [i64], closed: WindowClosed) -> Self {
        Self {
            index,
            closed,
            lo: 0,
            hi: 0,
        }
    }

    fn advance(&mut self, lower: i64, upper: i64) -> Window {
        while self.lo < self.index.len() && !self.closed.above_lower(self.index[self.lo], lower) {
            self.lo += 1;
        }
        self.hi = self.hi.max(self.lo);
        while self.hi < self.index.len() && self.closed.below_upper(self.index[self.hi], upper) {
            self.hi += 1;
        }
        Window {
            lower,
            upper,
            first: self.lo as IdxSize,
            len: (self.hi - self.lo) as IdxSize,
        }
    }
}

/// One window anchored at every value of a sorted index slice
pub fn rolling_windows(
    index: &[i64],
    period: &Duration,
    offset: &Duration,
    closed: WindowClosed,
    kind: IndexKind,
) -> Result<Vec<Window>> {
    let mut sweep = Sweep::new(index, closed);
    index
        .iter()
        .map(|&t| {
            let lower = offset.add_to(t, kind)?;
            let upper = period.add_to(lower, kind)?;
            Ok(sweep.advance(lower, upper))
        })
        .collect()
}

/// Parameters of a fixed-cadence window sequence
#[derive(Debug, Clone, Copy)]
pub struct DynamicWindowSpec {
    pub every: Duration,
    pub period: Duration,
    pub offset: Duration,
    pub closed: WindowClosed,
    pub start_by: StartBy,
    pub kind: IndexKind,
}

impl DynamicWindowSpec {
    /// Start of the first window for an index whose first value is `first`
    pub fn first_start(&self, first: i64) -> Result<i64> {
        match self.start_by {
            StartBy::DataPoint => Ok(first),
            StartBy::WindowBound => {
                let truncated = self.every.truncate(first, self.kind)?;
                self.offset.add_to(truncated, self.kind)
            }
            StartBy::Weekday(target) => {
                let tu = match self.kind {
                    IndexKind::Temporal(tu) => tu,
                    IndexKind::Int => {
                        return Err(Error::InvalidStartBy(format!(
                            "'{}' requires a temporal index",
                            weekday_name(target)
                        )))
                    }
                };
                let midnight = Duration::from_days(1).truncate(first, self.kind)?;
                let weekday = ticks_to_datetime(midnight, tu)
                    .ok_or_else(|| {
                        Error::InvalidValue(format!("index value {} is out of range", first))
                    })?
                    .weekday();
                let back = (weekday.num_days_from_monday() as i64
                    - target.num_days_from_monday() as i64)
                    .rem_euclid(7);
                let start = Duration::from_days(-back).add_to(midnight, self.kind)?;
                self.offset.add_to(start, self.kind)
            }
        }
    }

    /// All windows from the first start until a start passes the last index value
    pub fn windows(&self, index: &[i64]) -> Result<Vec<Window>> {
        let (first, last) = match (index.first(), index.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Ok(Vec::new()),
        };

        let start = self.first_start(first)?;
        let mut sweep = Sweep::new(index, self.closed);
        let mut windows = Vec::new();
        let mut previous: Option<i64> = None;
        for k in 0i64.. {
            let lower = self.every.mul(k)?.add_to(start, self.kind)?;
            if lower > last {
                break;
            }
            if previous.map_or(false, |p| lower <= p) {
                return Err(Error::InvalidDuration(format!(
                    "every '{}' does not advance the window start",
                    self.every
                )));
            }
            previous = Some(lower);
            let upper = self.period.add_to(lower, self.kind)?;
            windows.push(sweep.advance(lower, upper));
        }
        Ok(windows)
    }
}
