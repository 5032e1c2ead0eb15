//! Bounded ranges: closed intervals of two points in one domain.

use std::fmt;

use crate::domain::Domain;
use crate::error::{Result, TimexError};
use crate::point::TimePoint;

/// A closed interval `[lower, upper]` in a single domain, or an empty marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    domain: Domain,
    bounds: Option<(TimePoint, TimePoint)>,
}

impl TimeRange {
    pub fn empty(domain: Domain) -> Self {
        Self {
            domain,
            bounds: None,
        }
    }

    /// Build a range from two points of the same domain.
    ///
    /// # Errors
    ///
    /// Returns [`TimexError::DomainMismatch`] if the bounds live in different
    /// domains and [`TimexError::InvertedRange`] if `lower > upper`.
    pub fn new(lower: TimePoint, upper: TimePoint) -> Result<Self> {
        if lower.domain() != upper.domain() {
            return Err(TimexError::DomainMismatch(format!(
                "range bounds {} ({}) and {} ({})",
                lower,
                lower.domain(),
                upper,
                upper.domain()
            )));
        }
        if lower > upper {
            return Err(TimexError::InvertedRange(format!("{} > {}", lower, upper)));
        }
        Ok(Self {
            domain: lower.domain(),
            bounds: Some((lower, upper)),
        })
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn lower(&self) -> Option<TimePoint> {
        self.bounds.map(|(lower, _)| lower)
    }

    pub fn upper(&self) -> Option<TimePoint> {
        self.bounds.map(|(_, upper)| upper)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds {
            Some((lower, upper)) => write!(f, "[{}, {}]", lower, upper),
            None => write!(f, "[] ({})", self.domain),
        }
    }
}
