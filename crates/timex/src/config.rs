//! Engine configuration.
//!
//! [`EngineOptions`] is passed to the `_with_options` entry points (and to
//! holders through `with_options`). The defaults reproduce the standard
//! large-increment table and a generous bound on offset chains.

use serde::{Deserialize, Serialize};

use crate::granularity::Granularity;

/// Magnitude of a "large" nudge, per calendar granularity.
///
/// # Examples
///
/// ```
/// use timex::{Granularity, LargeSteps};
///
/// let steps = LargeSteps::default();
/// assert_eq!(steps.step(Granularity::Day), 15);
/// assert_eq!(steps.step(Granularity::Minute), 1440);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LargeSteps {
    pub year: i64,
    pub month: i64,
    pub day: i64,
    pub hour: i64,
    pub minute: i64,
    pub second: i64,
    pub millisecond: i64,
    pub microsecond: i64,
    pub nanosecond: i64,
}

impl Default for LargeSteps {
    fn default() -> Self {
        Self {
            year: 5,
            month: 12,
            day: 15,
            hour: 24,
            minute: 1_440,
            second: 86_400,
            millisecond: 86_400_000,
            microsecond: 86_400_000_000,
            nanosecond: 86_400_000_000_000,
        }
    }
}

impl LargeSteps {
    /// The large step for `granularity`.
    pub fn step(&self, granularity: Granularity) -> i64 {
        match granularity {
            Granularity::Year => self.year,
            Granularity::Month => self.month,
            Granularity::Day => self.day,
            Granularity::Hour => self.hour,
            Granularity::Minute => self.minute,
            Granularity::Second => self.second,
            Granularity::Millisecond => self.millisecond,
            Granularity::Microsecond => self.microsecond,
            Granularity::Nanosecond => self.nanosecond,
        }
    }
}

/// Options shared by expression parsing and the holders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Step table used by `incr_*_step(up, large = true)`.
    pub large_steps: LargeSteps,
    /// Maximum number of `(+|-)integer` terms accepted in one expression.
    pub max_offset_terms: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            large_steps: LargeSteps::default(),
            max_offset_terms: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_large_step_table() {
        let steps = LargeSteps::default();
        let expected = [
            (Granularity::Year, 5),
            (Granularity::Month, 12),
            (Granularity::Day, 15),
            (Granularity::Hour, 24),
            (Granularity::Minute, 1_440),
            (Granularity::Second, 86_400),
            (Granularity::Millisecond, 86_400_000),
            (Granularity::Microsecond, 86_400_000_000),
            (Granularity::Nanosecond, 86_400_000_000_000),
        ];
        for (granularity, step) in expected {
            assert_eq!(steps.step(granularity), step, "{granularity}");
        }
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options: EngineOptions =
            serde_json::from_str(r#"{"large_steps": {"day": 7}}"#).unwrap();
        assert_eq!(options.large_steps.day, 7);
        assert_eq!(options.large_steps.month, 12);
        assert_eq!(options.max_offset_terms, 64);
    }

    #[test]
    fn test_options_serialize_roundtrip() {
        let options = EngineOptions {
            max_offset_terms: 3,
            ..Default::default()
        };
        let json = serde_json::to_string(&options).unwrap();
        let back: EngineOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }
}
