//! Calendar granularity: the smallest unit a domain can represent.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Resolution of a calendar domain, ordered from coarsest to finest.
///
/// The derived ordering is ordinal: `Year < Month < Day < … < Nanosecond`,
/// so a *smaller* value is a *coarser* granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl Granularity {
    /// Whether `self` is as coarse as `other` or coarser (less precise).
    ///
    /// ```
    /// use timex::Granularity;
    ///
    /// assert!(Granularity::Month.is_coarser_or_equal(Granularity::Day));
    /// assert!(Granularity::Day.is_coarser_or_equal(Granularity::Day));
    /// assert!(!Granularity::Hour.is_coarser_or_equal(Granularity::Day));
    /// ```
    pub fn is_coarser_or_equal(self, other: Granularity) -> bool {
        self <= other
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Year => "year",
            Granularity::Month => "month",
            Granularity::Day => "day",
            Granularity::Hour => "hour",
            Granularity::Minute => "minute",
            Granularity::Second => "second",
            Granularity::Millisecond => "millisecond",
            Granularity::Microsecond => "microsecond",
            Granularity::Nanosecond => "nanosecond",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_coarse_to_fine() {
        let all = [
            Granularity::Year,
            Granularity::Month,
            Granularity::Day,
            Granularity::Hour,
            Granularity::Minute,
            Granularity::Second,
            Granularity::Millisecond,
            Granularity::Microsecond,
            Granularity::Nanosecond,
        ];
        for pair in all.windows(2) {
            assert!(pair[0] < pair[1], "{} should be coarser than {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_coarser_than_daily() {
        assert!(Granularity::Year.is_coarser_or_equal(Granularity::Day));
        assert!(Granularity::Month.is_coarser_or_equal(Granularity::Day));
        assert!(!Granularity::Second.is_coarser_or_equal(Granularity::Day));
        assert!(!Granularity::Nanosecond.is_coarser_or_equal(Granularity::Day));
    }
}
