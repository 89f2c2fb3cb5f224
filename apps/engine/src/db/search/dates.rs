//! Partial date ranges and comparator searches
//!
//! `parse_range` turns `YYYY`, `YYYY-MM`, `YYYY-MM-DD` or a date-time into a
//! closed range. For partial values the end is the start of the next unit minus
//! one second; a date-time with seconds is its own start and end.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

use super::predicate::{CompareOp, DateColumn, FilterPredicate};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date '{0}'")]
pub struct InvalidDate(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Sa,
    Eb,
    Ap,
}

impl Comparator {
    /// Split a recognized two-letter prefix off `value`.
    ///
    /// Without a recognized prefix the comparator is `Eq` and the value is
    /// returned untouched.
    pub fn parse_prefix(value: &str) -> (Self, &str) {
        let candidates = [
            ("eq", Self::Eq),
            ("ne", Self::Ne),
            ("gt", Self::Gt),
            ("lt", Self::Lt),
            ("ge", Self::Ge),
            ("le", Self::Le),
            ("sa", Self::Sa),
            ("eb", Self::Eb),
            ("ap", Self::Ap),
        ];
        for (s, p) in candidates {
            if let Some(rest) = value.strip_prefix(s) {
                return (p, rest);
            }
        }
        (Self::Eq, value)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Ge => "ge",
            Self::Le => "le",
            Self::Sa => "sa",
            Self::Eb => "eb",
            Self::Ap => "ap",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparatorSearch {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub comparator: Comparator,
}

impl ComparatorSearch {
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start,
            end: self.end,
        }
    }
}

pub fn parse_range(value: &str) -> Result<DateRange, InvalidDate> {
    let invalid = || InvalidDate(value.to_string());
    let s = value.trim();

    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = s.parse().map_err(|_| invalid())?;
        let start = utc_date(year, 1, 1).ok_or_else(invalid)?;
        return partial_range(start, Months::new(12)).ok_or_else(invalid);
    }

    if s.len() == 7 && s.as_bytes()[4] == b'-' {
        let year: i32 = s[0..4].parse().map_err(|_| invalid())?;
        let month: u32 = s[5..7].parse().map_err(|_| invalid())?;
        let start = utc_date(year, month, 1).ok_or_else(invalid)?;
        return partial_range(start, Months::new(1)).ok_or_else(invalid);
    }

    if s.len() == 10 && s.as_bytes()[4] == b'-' && s.as_bytes()[7] == b'-' {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| invalid())?;
        let start = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?.and_utc();
        return Ok(DateRange {
            start,
            end: start + Duration::days(1) - Duration::seconds(1),
        });
    }

    let (dt_part, tz_part) = split_datetime_timezone(s);
    let (naive, unit) = parse_datetime_with_precision(dt_part).ok_or_else(invalid)?;
    let offset = parse_tz_offset(tz_part).ok_or_else(invalid)?;
    let start = offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(invalid)?
        .with_timezone(&Utc);
    let end = match unit {
        Some(unit) => start + unit - Duration::seconds(1),
        None => start,
    };
    Ok(DateRange { start, end })
}

/// Strip a comparator prefix (default `eq`) and resolve the remaining date.
pub fn parse_comparator_search(value: &str) -> Result<ComparatorSearch, InvalidDate> {
    let (comparator, rest) = Comparator::parse_prefix(value.trim());
    let range = parse_range(rest).map_err(|_| InvalidDate(value.to_string()))?;
    Ok(ComparatorSearch {
        start: range.start,
        end: range.end,
        comparator,
    })
}

/// Filter `column` by a comparator-prefixed date.
pub fn to_predicate(value: &str, column: DateColumn) -> Result<FilterPredicate, InvalidDate> {
    let search = parse_comparator_search(value)?;
    let compare = |op, value| FilterPredicate::DateCompare { column, op, value };
    Ok(match search.comparator {
        Comparator::Gt | Comparator::Sa => compare(CompareOp::Gt, search.end),
        Comparator::Ge => compare(CompareOp::Ge, search.start),
        Comparator::Lt | Comparator::Eb => compare(CompareOp::Lt, search.start),
        Comparator::Le => compare(CompareOp::Le, search.end),
        Comparator::Ne => FilterPredicate::Or(vec![
            compare(CompareOp::Lt, search.start),
            compare(CompareOp::Gt, search.end),
        ]),
        Comparator::Eq | Comparator::Ap => FilterPredicate::And(vec![
            compare(CompareOp::Ge, search.start),
            compare(CompareOp::Le, search.end),
        ]),
    })
}

fn utc_date(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single()
}

fn partial_range(start: DateTime<Utc>, unit: Months) -> Option<DateRange> {
    let next = start.checked_add_months(unit)?;
    Some(DateRange {
        start,
        end: next - Duration::seconds(1),
    })
}

fn split_datetime_timezone(s: &str) -> (&str, &str) {
    if let Some(rest) = s.strip_suffix('Z') {
        return (rest, "Z");
    }
    if let Some(pos) = s.rfind('+') {
        return (&s[..pos], &s[pos..]);
    }
    if let Some(pos) = s.rfind('-') {
        // Date separators come before the 'T'; an offset looks like -hh:mm.
        if s[..pos].contains('T') && s[pos..].len() >= 6 {
            return (&s[..pos], &s[pos..]);
        }
    }
    (s, "")
}

fn parse_tz_offset(tz: &str) -> Option<FixedOffset> {
    if tz.is_empty() || tz == "Z" {
        return FixedOffset::east_opt(0);
    }
    let (sign, t) = match tz.strip_prefix('+') {
        Some(rest) => (1, rest),
        None => (-1, tz.strip_prefix('-')?),
    };
    let (h, m) = t.split_once(':')?;
    let hours: i32 = h.parse().ok()?;
    let mins: i32 = m.parse().ok()?;
    if !(0..=23).contains(&hours) || !(0..=59).contains(&mins) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + mins * 60))
}

/// Parsed date-time plus the width of its least significant unit, `None` once
/// seconds are present.
fn parse_datetime_with_precision(dt: &str) -> Option<(NaiveDateTime, Option<Duration>)> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(dt, "%Y-%m-%dT%H:%M") {
        return Some((naive, Some(Duration::minutes(1))));
    }
    let base = dt.split_once('.').map(|(base, _)| base).unwrap_or(dt);
    let naive = NaiveDateTime::parse_from_str(base, "%Y-%m-%dT%H:%M:%S").ok()?;
    Some((naive, None))
}
