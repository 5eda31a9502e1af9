//! Month-granularity date value
//!
//! A [`MonthYear`] is a calendar month. Internally it holds the first instant of
//! that month in UTC, which is also the persisted form (a `TIMESTAMPTZ` column).
//! On the wire it is the text `MM-YYYY`, e.g. `"07-2025"`.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef},
    Decode, Encode, Postgres, Type, TypeInfo, ValueRef,
};
use thiserror::Error;

/// Body format: two-digit month, dash, four-digit year
pub const WIRE_FORMAT: &str = "MM-YYYY";

/// Query-string format used by the aggregate endpoint
pub const QUERY_FORMAT: &str = "YYYY-MM";

static WIRE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0[1-9]|1[0-2])-(\d{4})$").expect("month-year pattern is valid"));

static QUERY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(0[1-9]|1[0-2])$").expect("query month pattern is valid"));

/// Errors produced when parsing or decoding a [`MonthYear`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonthYearError {
    #[error("invalid month-year '{input}', expected {expected}")]
    InvalidFormat {
        input: String,
        expected: &'static str,
    },

    #[error("month out of range: year={year} month={month}")]
    OutOfRange { year: i32, month: u32 },

    #[error("stored value is not a date-time (found {found})")]
    TypeMismatch { found: String },
}

impl MonthYearError {
    fn invalid(input: &str, expected: &'static str) -> Self {
        Self::InvalidFormat {
            input: input.to_string(),
            expected,
        }
    }
}

/// A calendar month with no day precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear(DateTime<Utc>);

impl MonthYear {
    /// Build from a year (0..=9999) and month (1..=12)
    pub fn from_ym(year: i32, month: u32) -> Result<Self, MonthYearError> {
        if !(0..=9999).contains(&year) {
            return Err(MonthYearError::OutOfRange { year, month });
        }

        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(MonthYearError::OutOfRange { year, month })?
            .and_time(NaiveTime::MIN);

        Ok(Self(Utc.from_utc_datetime(&start)))
    }

    /// Parse `MM-YYYY`. Empty text is "no value" rather than an error.
    pub fn parse(text: &str) -> Result<Option<Self>, MonthYearError> {
        if text.is_empty() {
            return Ok(None);
        }
        text.parse().map(Some)
    }

    /// Parse the `YYYY-MM` form accepted by the aggregate query string
    pub fn parse_query_month(text: &str) -> Result<Self, MonthYearError> {
        let captures = QUERY_PATTERN
            .captures(text)
            .ok_or_else(|| MonthYearError::invalid(text, QUERY_FORMAT))?;

        Self::from_parts(text, &captures[1], &captures[2], QUERY_FORMAT)
    }

    fn from_parts(
        text: &str,
        year: &str,
        month: &str,
        expected: &'static str,
    ) -> Result<Self, MonthYearError> {
        let year = year
            .parse::<i32>()
            .map_err(|_| MonthYearError::invalid(text, expected))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| MonthYearError::invalid(text, expected))?;

        Self::from_ym(year, month)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// First instant of the month, UTC. This is the persisted value.
    pub fn to_storage_value(&self) -> DateTime<Utc> {
        self.0
    }

    /// Collapse any instant to the start of its month
    pub fn from_storage_value(value: DateTime<Utc>) -> Self {
        let date = value.date_naive();
        let first = date.with_day(1).unwrap_or(date);
        Self(Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN)))
    }

    /// Last representable instant of the month (microsecond precision, as stored)
    pub fn end_of_month_instant(&self) -> DateTime<Utc> {
        self.0
            .checked_add_months(Months::new(1))
            .map(|next| next - Duration::microseconds(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Rejects storage column types that do not carry a date
    pub fn check_storage_type(type_name: &str) -> Result<(), MonthYearError> {
        match type_name {
            "TIMESTAMPTZ" | "TIMESTAMP" | "DATE" => Ok(()),
            other => Err(MonthYearError::TypeMismatch {
                found: other.to_string(),
            }),
        }
    }
}

impl FromStr for MonthYear {
    type Err = MonthYearError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let captures = WIRE_PATTERN
            .captures(text)
            .ok_or_else(|| MonthYearError::invalid(text, WIRE_FORMAT))?;

        Self::from_parts(text, &captures[2], &captures[1], WIRE_FORMAT)
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month(), self.year())
    }
}

impl From<MonthYear> for DateTime<Utc> {
    fn from(value: MonthYear) -> Self {
        value.to_storage_value()
    }
}

impl Serialize for MonthYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Serde adapter for `Option<MonthYear>` where `null` and `""` both mean "no value"
pub mod optional {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<MonthYear>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(month) => serializer.collect_str(month),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<MonthYear>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => MonthYear::parse(&text).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

impl Type<Postgres> for MonthYear {
    fn type_info() -> PgTypeInfo {
        <DateTime<Utc> as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        MonthYear::check_storage_type(ty.name()).is_ok()
    }
}

impl Encode<'_, Postgres> for MonthYear {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
        <DateTime<Utc> as Encode<'_, Postgres>>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> Decode<'r, Postgres> for MonthYear {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let type_name = value.type_info().name().to_string();
        MonthYear::check_storage_type(&type_name)?;

        let instant = match type_name.as_str() {
            "TIMESTAMPTZ" => <DateTime<Utc> as Decode<'r, Postgres>>::decode(value)?,
            "TIMESTAMP" => {
                Utc.from_utc_datetime(&<NaiveDateTime as Decode<'r, Postgres>>::decode(value)?)
            }
            _ => {
                let date = <NaiveDate as Decode<'r, Postgres>>::decode(value)?;
                Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
            }
        };

        Ok(MonthYear::from_storage_value(instant))
    }
}
