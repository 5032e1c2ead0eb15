//! A begin/end pair of expressions that never resolves inverted.
//!
//! [`RangeHolder`] owns two [`Expression`]s sharing one domain. The begin
//! bound rounds up and the end bound rounds down, so a closed interval typed
//! in a coarser or different calendar snaps *into* the interval.
//!
//! Every mutation runs as a transaction: the pair is snapshotted, the edit is
//! applied, the pair is re-ordered with
//! [`Expression::enforce_valid_range`], and any failure restores the
//! snapshot before the error is returned. The bound being edited is the
//! protected side; the other bound moves to make room.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use timex::{Domain, FixedClock, RangeHolder};
//!
//! let now = NaiveDate::from_ymd_opt(2009, 11, 20).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! let mut holder = RangeHolder::new(Domain::Day).with_clock(Arc::new(FixedClock(now)));
//!
//! holder.set_begin("today").unwrap();
//! holder.set_end("today").unwrap();
//! holder.incr_begin(3).unwrap();
//!
//! // end was pushed along with begin
//! assert_eq!(holder.end_text(), "today+3");
//! let range = holder.get_range(Domain::Day).unwrap();
//! assert_eq!(range.to_string(), "[2009-11-23, 2009-11-23]");
//! ```

use std::fmt;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineOptions;
use crate::domain::{Adjust, Domain};
use crate::error::{Result, TimexError};
use crate::expression::{step_delta, Expression};
use crate::range::TimeRange;

/// Adjustment policy of the begin bound.
pub const BEGIN_ADJUST: Adjust = Adjust::Up;
/// Adjustment policy of the end bound.
pub const END_ADJUST: Adjust = Adjust::Down;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Begin,
    End,
}

/// What an edit closure may read while the pair is borrowed.
struct Scope<'a> {
    domain: Domain,
    options: &'a EngineOptions,
    clock: &'a dyn Clock,
}

/// Owns a begin/end pair of expressions in one domain.
///
/// The pair is either empty or fully set; it is never half-populated.
pub struct RangeHolder {
    domain: Domain,
    bounds: Option<(Expression, Expression)>,
    clock: Arc<dyn Clock>,
    options: EngineOptions,
}

impl RangeHolder {
    /// An empty holder reading the system clock.
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            bounds: None,
            clock: Arc::new(SystemClock),
            options: EngineOptions::default(),
        }
    }

    /// Read "now" from `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `options` for parsing and step sizes.
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Options in effect for this holder.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    /// The begin bound, `None` when the holder is empty.
    pub fn begin(&self) -> Option<&Expression> {
        self.bounds.as_ref().map(|(begin, _)| begin)
    }

    pub fn end(&self) -> Option<&Expression> {
        self.bounds.as_ref().map(|(_, end)| end)
    }

    /// Text of the begin bound, empty when the holder is empty.
    pub fn begin_text(&self) -> String {
        self.begin().map(Expression::text).unwrap_or_default()
    }

    /// Text of the end bound, empty when the holder is empty.
    pub fn end_text(&self) -> String {
        self.end().map(Expression::text).unwrap_or_default()
    }

    /// Drop both bounds.
    pub fn clear(&mut self) {
        self.bounds = None;
    }

    /// True if either bound is a `start`/`end` keyword.
    pub fn need_context(&self) -> bool {
        self.bounds
            .as_ref()
            .is_some_and(|(begin, end)| begin.need_context() || end.need_context())
    }

    /// Parse `text` into the begin bound.
    ///
    /// Empty text clears the whole range. On an empty holder the end bound
    /// starts from the same text. If the new begin lies after the end, the
    /// end is moved up to it.
    ///
    /// # Errors
    ///
    /// Parse errors from [`Expression::set_expression`], or
    /// [`TimexError::RangeInconsistent`] if the pair cannot be ordered. The
    /// holder is unchanged on error.
    pub fn set_begin(&mut self, text: &str) -> Result<()> {
        self.set_bound(Bound::Begin, text)
    }

    /// Parse `text` into the end bound. See [`RangeHolder::set_begin`].
    pub fn set_end(&mut self, text: &str) -> Result<()> {
        self.set_bound(Bound::End, text)
    }

    /// Add `delta` to the begin bound. An empty holder first takes the
    /// current date for both bounds.
    pub fn incr_begin(&mut self, delta: i64) -> Result<()> {
        self.incr_bound(Bound::Begin, delta)
    }

    /// Add `delta` to the end bound. See [`RangeHolder::incr_begin`].
    pub fn incr_end(&mut self, delta: i64) -> Result<()> {
        self.incr_bound(Bound::End, delta)
    }

    /// Nudge the begin bound one unit, or one large step, up or down.
    pub fn incr_begin_step(&mut self, up: bool, large: bool) -> Result<()> {
        let delta = step_delta(&self.options.large_steps, self.domain, self.begin(), up, large)?;
        self.incr_begin(delta)
    }

    /// Nudge the end bound one unit, or one large step, up or down.
    pub fn incr_end_step(&mut self, up: bool, large: bool) -> Result<()> {
        let delta = step_delta(&self.options.large_steps, self.domain, self.end(), up, large)?;
        self.incr_end(delta)
    }

    /// Resolve both bounds against a bare domain.
    ///
    /// # Errors
    ///
    /// [`TimexError::ContextRequired`] if a bound is `start`/`end`.
    pub fn get_range(&self, domain: Domain) -> Result<TimeRange> {
        match &self.bounds {
            None => Ok(TimeRange::empty(domain)),
            Some((begin, end)) => {
                let clock = self.clock.as_ref();
                TimeRange::new(begin.get_date(domain, clock)?, end.get_date(domain, clock)?)
            }
        }
    }

    /// Resolve both bounds against a context range, in its domain.
    ///
    /// Yields an empty range when the holder is empty, when a keyword meets an
    /// empty context, or when keyword bounds invert against the context. An
    /// inversion caused only by calendar rounding collapses onto the end.
    pub fn get_range_in(&self, context: &TimeRange) -> Result<TimeRange> {
        let domain = context.domain();
        let Some((begin, end)) = &self.bounds else {
            return Ok(TimeRange::empty(domain));
        };

        let clock = self.clock.as_ref();
        let (Some(lower), Some(upper)) = (
            begin.get_date_in(context, clock)?,
            end.get_date_in(context, clock)?,
        ) else {
            return Ok(TimeRange::empty(domain));
        };

        if lower > upper {
            if begin.need_context() || end.need_context() {
                return Ok(TimeRange::empty(domain));
            }
            if begin.adjust() == Adjust::Up {
                let mut snapped = begin.clone();
                snapped.set_point(upper);
                let lower = snapped.get_date(domain, clock)?;
                tracing::debug!(
                    begin = %begin,
                    end = %end,
                    %domain,
                    "conversion inverted the range, collapsing onto end"
                );
                return TimeRange::new(lower, upper);
            }
        }

        TimeRange::new(lower, upper)
    }

    /// Switch to `domain`, re-applying both bounds from their text.
    ///
    /// Keywords and offsets carry over unchanged; literals are re-validated
    /// against the new domain. On error the holder keeps its old domain and
    /// bounds.
    pub fn reset(&mut self, domain: Domain) -> Result<()> {
        let texts = self
            .bounds
            .as_ref()
            .map(|(begin, end)| (begin.text(), end.text()));
        let previous_domain = std::mem::replace(&mut self.domain, domain);
        let previous_bounds = self.bounds.take();

        let result = match &texts {
            Some((begin, end)) => self.set_begin(begin).and_then(|()| self.set_end(end)),
            None => Ok(()),
        };

        if let Err(err) = result {
            tracing::debug!(%err, from = %previous_domain, to = %domain, "reset rolled back");
            self.domain = previous_domain;
            self.bounds = previous_bounds;
            return Err(err);
        }
        Ok(())
    }

    // ── Internal helpers ────────────────────────────────────────────────

    fn set_bound(&mut self, bound: Bound, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            self.bounds = None;
            return Ok(());
        }
        self.transact(bound, |target, other, scope| {
            target.set_expression_with_options(scope.domain, text, scope.options)?;
            if !other.is_set() {
                other.set_expression_with_options(scope.domain, text, scope.options)?;
            }
            Ok(())
        })
    }

    fn incr_bound(&mut self, bound: Bound, delta: i64) -> Result<()> {
        self.transact(bound, |target, other, scope| {
            if !target.is_set() {
                set_to_today(target, scope)?;
            }
            if !other.is_set() {
                set_to_today(other, scope)?;
            }
            target.incr(delta)
        })
    }

    /// Run `edit` on (edited bound, other bound), re-order the pair, and
    /// restore the previous state if anything fails.
    fn transact<F>(&mut self, bound: Bound, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Expression, &mut Expression, &Scope<'_>) -> Result<()>,
    {
        let snapshot = self.bounds.clone();
        let scope = Scope {
            domain: self.domain,
            options: &self.options,
            clock: self.clock.as_ref(),
        };

        let (begin, end) = self
            .bounds
            .get_or_insert_with(|| (Expression::new(BEGIN_ADJUST), Expression::new(END_ADJUST)));

        let edited = match bound {
            Bound::Begin => edit(begin, end, &scope),
            Bound::End => edit(end, begin, &scope),
        };
        let outcome = edited
            .and_then(|()| {
                end.enforce_valid_range(scope.domain, begin, bound == Bound::End, scope.clock)
            })
            .and_then(|ordered| {
                if ordered {
                    Ok(())
                } else {
                    Err(TimexError::RangeInconsistent(format!(
                        "begin '{}' and end '{}' cannot be ordered",
                        begin, end
                    )))
                }
            });

        if let Err(err) = &outcome {
            tracing::debug!(%err, ?bound, "range update rolled back");
            self.bounds = snapshot;
        }
        outcome
    }
}

impl fmt::Debug for RangeHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeHolder")
            .field("domain", &self.domain)
            .field("bounds", &self.bounds)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn set_to_today(expr: &mut Expression, scope: &Scope<'_>) -> Result<()> {
    let now = Expression::today(expr.adjust()).get_date(scope.domain, scope.clock)?;
    expr.set_point(now);
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        SetBegin(String),
        SetEnd(String),
        IncrBegin(i64),
        IncrEnd(i64),
    }

    fn text() -> impl Strategy<Value = String> {
        prop_oneof![
            (-30i64..30).prop_map(|n| format!("today{:+}", n)),
            (1u32..=30).prop_map(|d| format!("2009-11-{:02}", d)),
            (1u32..=30, -10i64..10).prop_map(|(d, n)| format!("2009-11-{:02}{:+}", d, n)),
        ]
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            text().prop_map(Op::SetBegin),
            text().prop_map(Op::SetEnd),
            (-40i64..40).prop_map(Op::IncrBegin),
            (-40i64..40).prop_map(Op::IncrEnd),
        ]
    }

    fn domain() -> impl Strategy<Value = Domain> {
        prop_oneof![
            Just(Domain::Day),
            Just(Domain::Workweek),
            Just(Domain::Month),
            Just(Domain::Minute),
        ]
    }

    fn apply(h: &mut RangeHolder, op: &Op) -> Result<()> {
        match op {
            Op::SetBegin(t) => h.set_begin(t),
            Op::SetEnd(t) => h.set_end(t),
            Op::IncrBegin(n) => h.incr_begin(*n),
            Op::IncrEnd(n) => h.incr_end(*n),
        }
    }

    proptest! {
        /// Property: no sequence of edits leaves the pair inverted
        #[test]
        fn test_range_never_inverted(
            domain in domain(),
            saturday in proptest::bool::ANY,
            ops in proptest::collection::vec(op(), 1..20),
        ) {
            let day = if saturday { 21 } else { 20 };
            let now = NaiveDate::from_ymd_opt(2009, 11, day)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap();
            let mut h = RangeHolder::new(domain).with_clock(Arc::new(FixedClock(now)));
            for op in &ops {
                let before = (h.begin().cloned(), h.end().cloned());
                if apply(&mut h, op).is_err() {
                    // a failed edit leaves both bounds exactly as they were
                    prop_assert_eq!((h.begin().cloned(), h.end().cloned()), before);
                }
                let range = h.get_range(domain);
                prop_assert!(range.is_ok(), "{:?} after {:?}: {:?}", h, op, range);
            }
        }
    }
}
