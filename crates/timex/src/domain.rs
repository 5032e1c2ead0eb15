//! Calendar domains: mapping instants onto a linear integer time index.
//!
//! A [`Domain`] fixes a granularity (and, for [`Domain::Workweek`], a cycle
//! that skips Saturday and Sunday). Every instant representable in the domain
//! has exactly one `i64` index; consecutive indices are consecutive domain
//! units, so "add N" on a point always means "advance N domain units".
//!
//! # Index layout
//!
//! | Domain | Index |
//! |---|---|
//! | `year` | calendar year |
//! | `month` | `year * 12 + (month - 1)` |
//! | `day` | days from the common era (0001-01-01 is 1) |
//! | `workweek` | working days counted from 0001-01-01 (a Monday) |
//! | `hour` … `nanosecond` | ticks since 1970-01-01T00:00:00 |

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimexError};
use crate::granularity::Granularity;
use crate::point::TimePoint;

/// Rule for snapping an instant that the calendar cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjust {
    /// Reject the instant.
    #[default]
    None,
    /// Round forward to the next representable instant.
    Up,
    /// Round back to the previous representable instant.
    Down,
}

/// A calendar domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Year,
    Month,
    /// The daily calendar.
    Day,
    /// Monday to Friday, day granularity.
    Workweek,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl Domain {
    pub const ALL: [Domain; 10] = [
        Domain::Year,
        Domain::Month,
        Domain::Day,
        Domain::Workweek,
        Domain::Hour,
        Domain::Minute,
        Domain::Second,
        Domain::Millisecond,
        Domain::Microsecond,
        Domain::Nanosecond,
    ];

    pub fn granularity(self) -> Granularity {
        match self {
            Domain::Year => Granularity::Year,
            Domain::Month => Granularity::Month,
            Domain::Day | Domain::Workweek => Granularity::Day,
            Domain::Hour => Granularity::Hour,
            Domain::Minute => Granularity::Minute,
            Domain::Second => Granularity::Second,
            Domain::Millisecond => Granularity::Millisecond,
            Domain::Microsecond => Granularity::Microsecond,
            Domain::Nanosecond => Granularity::Nanosecond,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Year => "year",
            Domain::Month => "month",
            Domain::Day => "day",
            Domain::Workweek => "workweek",
            Domain::Hour => "hour",
            Domain::Minute => "minute",
            Domain::Second => "second",
            Domain::Millisecond => "millisecond",
            Domain::Microsecond => "microsecond",
            Domain::Nanosecond => "nanosecond",
        }
    }

    /// Parse literal date/time text into a point of this domain.
    ///
    /// `year`, `month`, `day` and `workweek` accept exactly their own form
    /// (`yyyy`, `yyyy-mm`, `yyyy-mm-dd`). Sub-day domains accept any form from
    /// `yyyy-mm-dd` down to their own precision; missing time fields are zero.
    ///
    /// # Errors
    ///
    /// Returns [`TimexError::InvalidDate`] if the text is not a literal of this
    /// domain, or if `adjust` is [`Adjust::None`] and the instant falls outside
    /// the calendar (a weekend in `workweek`).
    ///
    /// # Examples
    ///
    /// ```
    /// use timex::{Adjust, Domain};
    ///
    /// let friday = Domain::Workweek.parse("2009-11-20", Adjust::None).unwrap();
    /// assert_eq!(friday.to_string(), "2009-11-20");
    ///
    /// // Saturday rounds forward to Monday
    /// let monday = Domain::Workweek.parse("2009-11-21", Adjust::Up).unwrap();
    /// assert_eq!(monday.to_string(), "2009-11-23");
    /// ```
    pub fn parse(self, text: &str, adjust: Adjust) -> Result<TimePoint> {
        let text = text.trim();
        let invalid =
            || TimexError::InvalidDate(format!("'{}' is not a valid {} literal", text, self));

        let instant = match self {
            Domain::Year => parse_year(text).ok_or_else(invalid)?,
            Domain::Month => parse_month(text).ok_or_else(invalid)?,
            Domain::Day | Domain::Workweek => parse_date(text)
                .map(|d| d.and_time(NaiveTime::MIN))
                .ok_or_else(invalid)?,
            _ => {
                let (instant, precision) = parse_datetime(text).ok_or_else(invalid)?;
                if precision > self.granularity() {
                    return Err(TimexError::InvalidDate(format!(
                        "'{}' is more precise than the {} domain",
                        text, self
                    )));
                }
                instant
            }
        };

        self.from_datetime(instant, adjust)
    }

    /// Map an instant into this domain, truncating to the domain's unit.
    pub fn from_datetime(self, instant: NaiveDateTime, adjust: Adjust) -> Result<TimePoint> {
        let index = self.index_of(instant, adjust)?;
        TimePoint::from_index(self, index)
    }

    /// Convert a point from another domain into this one.
    ///
    /// Fine → coarse truncates; coarse → fine lands on the first instant of
    /// the coarse unit. `adjust` decides what happens when that instant is not
    /// representable here. Converting into the point's own domain is identity.
    pub fn convert(self, point: &TimePoint, adjust: Adjust) -> Result<TimePoint> {
        if point.domain() == self {
            return Ok(*point);
        }
        self.from_datetime(point.start()?, adjust)
    }

    /// First instant covered by `index`.
    pub fn start_of(self, index: i64) -> Result<NaiveDateTime> {
        self.try_start_of(index).ok_or_else(|| {
            TimexError::Overflow(format!("index {} is outside the {} domain", index, self))
        })
    }

    /// Smallest and largest representable index.
    pub fn index_bounds(self) -> (i64, i64) {
        let lower = self
            .index_of(NaiveDateTime::MIN, Adjust::Up)
            .unwrap_or(i64::MIN);
        let upper = self
            .index_of(NaiveDateTime::MAX, Adjust::Down)
            .unwrap_or(i64::MAX);
        (lower, upper)
    }

    /// Text form of `index` in this domain.
    pub fn format(self, index: i64) -> String {
        let Some(instant) = self.try_start_of(index) else {
            return format!("#{index}");
        };
        match self {
            Domain::Year => format!("{:04}", instant.year()),
            Domain::Month => format!("{:04}-{:02}", instant.year(), instant.month()),
            Domain::Day | Domain::Workweek => instant.format("%Y-%m-%d").to_string(),
            Domain::Hour => instant.format("%Y-%m-%dT%H").to_string(),
            Domain::Minute => instant.format("%Y-%m-%dT%H:%M").to_string(),
            Domain::Second => instant.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Domain::Millisecond => instant.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            Domain::Microsecond => instant.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            Domain::Nanosecond => instant.format("%Y-%m-%dT%H:%M:%S%.9f").to_string(),
        }
    }

    fn index_of(self, instant: NaiveDateTime, adjust: Adjust) -> Result<i64> {
        let utc = instant.and_utc();
        let index = match self {
            Domain::Year => i64::from(instant.year()),
            Domain::Month => i64::from(instant.year()) * 12 + i64::from(instant.month0()),
            Domain::Day => i64::from(instant.date().num_days_from_ce()),
            Domain::Workweek => {
                let date = snap_to_workday(instant.date(), adjust)?;
                let d0 = i64::from(date.num_days_from_ce()) - 1;
                d0.div_euclid(7) * 5 + d0.rem_euclid(7)
            }
            Domain::Hour => utc.timestamp().div_euclid(3_600),
            Domain::Minute => utc.timestamp().div_euclid(60),
            Domain::Second => utc.timestamp(),
            Domain::Millisecond => utc.timestamp_millis(),
            Domain::Microsecond => utc.timestamp_micros(),
            Domain::Nanosecond => utc.timestamp_nanos_opt().ok_or_else(|| {
                TimexError::Overflow(format!("{} is outside the nanosecond domain", instant))
            })?,
        };
        Ok(index)
    }

    fn try_start_of(self, index: i64) -> Option<NaiveDateTime> {
        let instant = match self {
            Domain::Year => {
                NaiveDate::from_ymd_opt(i32::try_from(index).ok()?, 1, 1)?.and_time(NaiveTime::MIN)
            }
            Domain::Month => {
                let year = i32::try_from(index.div_euclid(12)).ok()?;
                let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
                NaiveDate::from_ymd_opt(year, month, 1)?.and_time(NaiveTime::MIN)
            }
            Domain::Day => NaiveDate::from_num_days_from_ce_opt(i32::try_from(index).ok()?)?
                .and_time(NaiveTime::MIN),
            Domain::Workweek => {
                let d0 = index
                    .div_euclid(5)
                    .checked_mul(7)?
                    .checked_add(index.rem_euclid(5))?;
                let days = i32::try_from(d0.checked_add(1)?).ok()?;
                NaiveDate::from_num_days_from_ce_opt(days)?.and_time(NaiveTime::MIN)
            }
            Domain::Hour => DateTime::from_timestamp(index.checked_mul(3_600)?, 0)?.naive_utc(),
            Domain::Minute => DateTime::from_timestamp(index.checked_mul(60)?, 0)?.naive_utc(),
            Domain::Second => DateTime::from_timestamp(index, 0)?.naive_utc(),
            Domain::Millisecond => DateTime::from_timestamp_millis(index)?.naive_utc(),
            Domain::Microsecond => DateTime::from_timestamp_micros(index)?.naive_utc(),
            Domain::Nanosecond => DateTime::from_timestamp_nanos(index).naive_utc(),
        };
        Some(instant)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = TimexError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str() == lower)
            .ok_or_else(|| TimexError::InvalidDate(format!("unknown domain '{}'", s.trim())))
    }
}

// ── Internal helpers ────────────────────────────────────────────────────────

/// Move a weekend date onto a working day according to `adjust`.
fn snap_to_workday(date: NaiveDate, adjust: Adjust) -> Result<NaiveDate> {
    let (forward, back) = match date.weekday() {
        Weekday::Sat => (2, 1),
        Weekday::Sun => (1, 2),
        _ => return Ok(date),
    };
    let snapped = match adjust {
        Adjust::None => {
            return Err(TimexError::InvalidDate(format!(
                "{} is not a working day",
                date.format("%Y-%m-%d")
            )))
        }
        Adjust::Up => date.checked_add_days(Days::new(forward)),
        Adjust::Down => date.checked_sub_days(Days::new(back)),
    };
    snapped.ok_or_else(|| {
        TimexError::Overflow(format!(
            "no working day next to {} within range",
            date.format("%Y-%m-%d")
        ))
    })
}

/// Cheap shape check before handing text to chrono: ASCII, of an exact
/// length, starting with a year digit (chrono's `%Y` would accept a sign).
fn shaped(s: &str, len: usize) -> bool {
    s.len() == len && s.is_ascii() && s.starts_with(|c: char| c.is_ascii_digit())
}

/// `yyyy`
fn parse_year(s: &str) -> Option<NaiveDateTime> {
    if !shaped(s, 4) {
        return None;
    }
    let date = NaiveDate::parse_from_str(&format!("{s}-01-01"), "%Y-%m-%d").ok()?;
    Some(date.and_time(NaiveTime::MIN))
}

/// `yyyy-mm`
fn parse_month(s: &str) -> Option<NaiveDateTime> {
    if !shaped(s, 7) {
        return None;
    }
    let date = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok()?;
    Some(date.and_time(NaiveTime::MIN))
}

/// `yyyy-mm-dd`, strictly ten characters.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    if !shaped(s, 10) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// `yyyy-mm-dd[Thh[:mm[:ss[.f…]]]]`, returning the instant and the precision
/// the text actually carries.
fn parse_datetime(s: &str) -> Option<(NaiveDateTime, Granularity)> {
    if s.len() < 10 || !s.is_char_boundary(10) {
        return None;
    }
    let (date, rest) = s.split_at(10);
    let date = parse_date(date)?;
    if rest.is_empty() {
        return Some((date.and_time(NaiveTime::MIN), Granularity::Day));
    }
    let time = rest.strip_prefix(['T', ' '])?;
    let (time, precision) = parse_time(time)?;
    Some((date.and_time(time), precision))
}

/// Time-of-day forms; the text length selects the format and its precision.
fn parse_time(s: &str) -> Option<(NaiveTime, Granularity)> {
    let parsed = match s.len() {
        // chrono needs a minute to build a time
        2 => NaiveTime::parse_from_str(&format!("{s}:00"), "%H:%M"),
        5 => NaiveTime::parse_from_str(s, "%H:%M"),
        8 => NaiveTime::parse_from_str(s, "%H:%M:%S"),
        10..=18 if s.as_bytes()[8] == b'.' => NaiveTime::parse_from_str(s, "%H:%M:%S%.f"),
        _ => return None,
    };
    let precision = match s.len() {
        2 => Granularity::Hour,
        5 => Granularity::Minute,
        8 => Granularity::Second,
        10..=12 => Granularity::Millisecond,
        13..=15 => Granularity::Microsecond,
        _ => Granularity::Nanosecond,
    };
    let time = parsed.ok()?;
    // leap seconds have no index in the tick domains
    (time.nanosecond() < 1_000_000_000).then_some((time, precision))
}

// ── Tests ───────────────────────────────────────────────────────────────────
