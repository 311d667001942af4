use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime};

use crate::core::column::{DataType, TimeUnit};

pub(crate) const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A single dynamically typed value read out of a column.
///
/// Equality and hashing treat `Null` as equal to `Null` and compare floats by
/// their canonical bit pattern, so every value can serve as a grouping key.
#[derive(Debug, Clone)]
pub enum DataValue {
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    String(String),
    /// Days since 1970-01-01
    Date(i32),
    Datetime(i64, TimeUnit),
    List(Vec<DataValue>),
}

impl DataValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// The logical type of this value, `None` for `Null` and for empty lists
    pub fn dtype(&self) -> Option<DataType> {
        match self {
            DataValue::Null => None,
            DataValue::Boolean(_) => Some(DataType::Boolean),
            DataValue::Int64(_) => Some(DataType::Int64),
            DataValue::Float64(_) => Some(DataType::Float64),
            DataValue::String(_) => Some(DataType::String),
            DataValue::Date(_) => Some(DataType::Date),
            DataValue::Datetime(_, tu) => Some(DataType::Datetime(*tu)),
            DataValue::List(values) => values
                .iter()
                .find_map(|v| v.dtype())
                .map(|inner| DataType::List(Box::new(inner))),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DataValue::Int64(v) => Some(*v),
            DataValue::Boolean(b) => Some(*b as i64),
            DataValue::Date(d) => Some(*d as i64),
            DataValue::Datetime(v, _) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Float64(v) => Some(*v),
            DataValue::Int64(v) => Some(*v as f64),
            DataValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DataValue]> {
        match self {
            DataValue::List(values) => Some(values),
            _ => None,
        }
    }

    /// Interprets a `Date` value as a calendar date
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            DataValue::Date(days) => {
                NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
            }
            _ => None,
        }
    }

    /// Interprets a `Datetime` value as a naive timestamp
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            DataValue::Datetime(v, tu) => {
                let nanos = v.checked_mul(tu.nanos_per_tick())?;
                Some(chrono::DateTime::from_timestamp_nanos(nanos).naive_utc())
            }
            _ => None,
        }
    }

    fn canonical_f64_bits(v: f64) -> u64 {
        if v.is_nan() {
            f64::NAN.to_bits()
        } else if v == 0.0 {
            0.0f64.to_bits()
        } else {
            v.to_bits()
        }
    }

    /// Total order used by min/max/median and sortedness checks.
    /// `Null` sorts first; values of different types are ordered by type.
    pub fn total_cmp(&self, other: &DataValue) -> Ordering {
        use DataValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Less,
            (_, Null) => Ordering::Greater,
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (Int64(a), Int64(b)) => a.cmp(b),
            (Float64(a), Float64(b)) => a.total_cmp(b),
            (Int64(a), Float64(b)) => (*a as f64).total_cmp(b),
            (Float64(a), Int64(b)) => a.total_cmp(&(*b as f64)),
            (String(a), String(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (Datetime(a, _), Datetime(b, _)) => a.cmp(b),
            (List(a), List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.total_cmp(y) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                }
                a.len().cmp(&b.len())
            }
            (a, b) => a.type_rank().cmp(&b.type_rank()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            DataValue::Null => 0,
            DataValue::Boolean(_) => 1,
            DataValue::Int64(_) | DataValue::Float64(_) => 2,
            DataValue::String(_) => 3,
            DataValue::Date(_) => 4,
            DataValue::Datetime(..) => 5,
            DataValue::List(_) => 6,
        }
    }
}

impl PartialEq for DataValue {
    fn eq(&self, other: &Self) -> bool {
        use DataValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Int64(a), Int64(b)) => a == b,
            (Float64(a), Float64(b)) => {
                Self::canonical_f64_bits(*a) == Self::canonical_f64_bits(*b)
            }
            (String(a), String(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Datetime(a, ta), Datetime(b, tb)) => a == b && ta == tb,
            (List(a), List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for DataValue {}

impl Hash for DataValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            DataValue::Null => {}
            DataValue::Boolean(b) => b.hash(state),
            DataValue::Int64(v) => v.hash(state),
            DataValue::Float64(v) => Self::canonical_f64_bits(*v).hash(state),
            DataValue::String(s) => s.hash(state),
            DataValue::Date(d) => d.hash(state),
            DataValue::Datetime(v, tu) => {
                v.hash(state);
                tu.hash(state);
            }
            DataValue::List(values) => values.hash(state),
        }
    }
}

impl Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Null => write!(f, "null"),
            DataValue::Boolean(b) => write!(f, "{}", b),
            DataValue::Int64(v) => write!(f, "{}", v),
            DataValue::Float64(v) => write!(f, "{}", v),
            DataValue::String(s) => write!(f, "{}", s),
            DataValue::Date(_) => match self.as_date() {
                Some(d) => write!(f, "{}", d),
                None => write!(f, "<invalid date>"),
            },
            DataValue::Datetime(..) => match self.as_datetime() {
                Some(dt) => write!(f, "{}", dt),
                None => write!(f, "<invalid datetime>"),
            },
            DataValue::List(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<i64> for DataValue {
    fn from(v: i64) -> Self {
        DataValue::Int64(v)
    }
}

impl From<i32> for DataValue {
    fn from(v: i32) -> Self {
        DataValue::Int64(v as i64)
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        DataValue::Float64(v)
    }
}

impl From<bool> for DataValue {
    fn from(v: bool) -> Self {
        DataValue::Boolean(v)
    }
}

impl From<&str> for DataValue {
    fn from(v: &str) -> Self {
        DataValue::String(v.to_string())
    }
}

impl From<String> for DataValue {
    fn from(v: String) -> Self {
        DataValue::String(v)
    }
}

impl From<NaiveDate> for DataValue {
    fn from(d: NaiveDate) -> Self {
        DataValue::Date(date_to_days(d))
    }
}

impl From<NaiveDateTime> for DataValue {
    fn from(dt: NaiveDateTime) -> Self {
        DataValue::Datetime(dt.and_utc().timestamp_millis(), TimeUnit::Milliseconds)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => DataValue::Null,
        }
    }
}

/// Days since the unix epoch for a calendar date
pub fn date_to_days(d: NaiveDate) -> i32 {
    use chrono::Datelike;
    d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}
