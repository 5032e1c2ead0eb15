//! # timex
//!
//! Symbolic time expressions for date fields and date-range filters.
//!
//! A user types `today-3`, `end-5` or `2009-11-20`; timex keeps that intent
//! symbolic and resolves it on demand against a calendar domain (year, month,
//! day, working day, hour, ... down to nanosecond) or a context range. Begin/end
//! pairs are repaired on every edit so they never resolve inverted.
//!
//! ## Modules
//!
//! - [`expression`] — one symbolic bound: parsing, increments, resolution, pair ordering
//! - [`range_holder`] — begin/end pair with snapshot/rollback edits
//! - [`date_holder`] — single value with an "empty allowed" policy
//! - [`domain`] — calendar domains, adjustment policies and literal text forms
//! - [`granularity`] — ordinal calendar granularities
//! - [`point`] — a point in a domain, with overflow-checked arithmetic
//! - [`range`] — closed ranges of points
//! - [`clock`] — current-instant providers
//! - [`config`] — engine options and the large-step table
//! - [`error`] — Error types

pub mod clock;
pub mod config;
pub mod date_holder;
pub mod domain;
pub mod error;
pub mod expression;
pub mod granularity;
pub mod point;
pub mod range;
pub mod range_holder;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{EngineOptions, LargeSteps};
pub use date_holder::DateHolder;
pub use domain::{Adjust, Domain};
pub use error::{Result, TimexError};
pub use expression::{ExprKind, Expression};
pub use granularity::Granularity;
pub use point::TimePoint;
pub use range::TimeRange;
pub use range_holder::RangeHolder;
