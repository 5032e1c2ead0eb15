//! Absolute points in time within one calendar domain.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use crate::domain::Domain;
use crate::error::{Result, TimexError};

/// A resolved point in time: an index in a calendar [`Domain`].
///
/// Points are only ordered against points of the same domain;
/// `partial_cmp` returns `None` across domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimePoint {
    domain: Domain,
    index: i64,
}

impl TimePoint {
    /// Build a point from a raw index.
    ///
    /// # Errors
    ///
    /// Returns [`TimexError::Overflow`] if `index` is outside the domain's
    /// representable range.
    pub fn from_index(domain: Domain, index: i64) -> Result<Self> {
        let (lower, upper) = domain.index_bounds();
        if index < lower || index > upper {
            return Err(TimexError::Overflow(format!(
                "index {} is outside the {} domain [{}, {}]",
                index, domain, lower, upper
            )));
        }
        Ok(Self { domain, index })
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn index(&self) -> i64 {
        self.index
    }

    /// First instant covered by this point.
    pub fn start(&self) -> Result<NaiveDateTime> {
        self.domain.start_of(self.index)
    }

    /// Advance by `delta` domain units.
    ///
    /// ```
    /// use timex::{Adjust, Domain};
    ///
    /// let day = Domain::Day.parse("2009-12-31", Adjust::None).unwrap();
    /// assert_eq!(day.checked_add(1).unwrap().to_string(), "2010-01-01");
    /// assert!(day.checked_add(i64::MAX).is_err());
    /// ```
    pub fn checked_add(&self, delta: i64) -> Result<Self> {
        let index = self.index.checked_add(delta).ok_or_else(|| {
            TimexError::Overflow(format!("{} {:+} wraps around", self, delta))
        })?;
        TimePoint::from_index(self.domain, index).map_err(|_| {
            TimexError::Overflow(format!(
                "{} {:+} is outside the {} domain",
                self, delta, self.domain
            ))
        })
    }

    /// Signed number of domain units from `self` to `other`.
    pub fn distance_to(&self, other: &TimePoint) -> Result<i64> {
        if self.domain != other.domain {
            return Err(TimexError::DomainMismatch(format!(
                "{} ({}) vs {} ({})",
                self, self.domain, other, other.domain
            )));
        }
        other.index.checked_sub(self.index).ok_or_else(|| {
            TimexError::Overflow(format!("distance from {} to {}", self, other))
        })
    }
}

impl PartialOrd for TimePoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (self.domain == other.domain).then(|| self.index.cmp(&other.index))
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.domain.format(self.index))
    }
}

impl Serialize for TimePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
