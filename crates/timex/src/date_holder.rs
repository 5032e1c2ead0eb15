//! A single symbolic date with an "empty allowed" policy.
//!
//! [`DateHolder`] is the one-value counterpart of
//! [`RangeHolder`](crate::RangeHolder): the same [`Expression`] rules, rounding
//! down, with no pairing to maintain.

use std::fmt;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineOptions;
use crate::domain::{Adjust, Domain};
use crate::error::{Result, TimexError};
use crate::expression::{step_delta, Expression};
use crate::point::TimePoint;
use crate::range::TimeRange;

/// Adjustment policy of a held date.
pub const DATE_ADJUST: Adjust = Adjust::Down;

/// Owns at most one expression in a domain.
pub struct DateHolder {
    domain: Domain,
    expr: Option<Expression>,
    empty_allowed: bool,
    clock: Arc<dyn Clock>,
    options: EngineOptions,
}

impl DateHolder {
    /// An empty holder reading the system clock.
    pub fn new(domain: Domain, empty_allowed: bool) -> Self {
        Self {
            domain,
            expr: None,
            empty_allowed,
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

    pub fn is_empty(&self) -> bool {
        self.expr.is_none()
    }

    pub fn expression(&self) -> Option<&Expression> {
        self.expr.as_ref()
    }

    /// Text of the held expression, empty when nothing is held.
    pub fn text(&self) -> String {
        self.expr.as_ref().map(Expression::text).unwrap_or_default()
    }

    pub fn empty_allowed(&self) -> bool {
        self.empty_allowed
    }

    /// Change the policy. Does not clear or validate the current value.
    pub fn set_empty_allowed(&mut self, allowed: bool) {
        self.empty_allowed = allowed;
    }

    /// Parse `text` into the held date.
    ///
    /// # Errors
    ///
    /// [`TimexError::MissingValue`] for empty text when empty is not allowed,
    /// otherwise any parse error. The held value is unchanged on error.
    pub fn set_date(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            if !self.empty_allowed {
                return Err(TimexError::MissingValue(format!(
                    "a {} date is required",
                    self.domain
                )));
            }
            self.expr = None;
            return Ok(());
        }

        let expr = Expression::parse_with_options(self.domain, text, DATE_ADJUST, &self.options)?;
        self.expr = Some(expr);
        Ok(())
    }

    /// Add `delta` to the held date, starting from the current date if empty.
    pub fn incr_date(&mut self, delta: i64) -> Result<()> {
        let mut expr = match &self.expr {
            Some(expr) => expr.clone(),
            None => {
                let today = Expression::today(DATE_ADJUST);
                let now = today.get_date(self.domain, self.clock.as_ref())?;
                Expression::literal(now, DATE_ADJUST)
            }
        };
        expr.incr(delta)?;
        self.expr = Some(expr);
        Ok(())
    }

    /// Nudge the held date one unit, or one large step, up or down.
    pub fn incr_date_step(&mut self, up: bool, large: bool) -> Result<()> {
        let delta = step_delta(
            &self.options.large_steps,
            self.domain,
            self.expr.as_ref(),
            up,
            large,
        )?;
        self.incr_date(delta)
    }

    /// Resolve against a bare domain; `None` when nothing is held.
    pub fn get_date(&self, domain: Domain) -> Result<Option<TimePoint>> {
        self.expr
            .as_ref()
            .map(|expr| expr.get_date(domain, self.clock.as_ref()))
            .transpose()
    }

    /// Resolve against a context range; `None` when nothing is held or a
    /// keyword meets an empty range.
    pub fn get_date_in(&self, context: &TimeRange) -> Result<Option<TimePoint>> {
        match &self.expr {
            Some(expr) => expr.get_date_in(context, self.clock.as_ref()),
            None => Ok(None),
        }
    }

    /// True if the held date is a `start`/`end` keyword.
    pub fn need_context(&self) -> bool {
        self.expr.as_ref().is_some_and(Expression::need_context)
    }

    /// Switch to `domain`, re-parsing the held text. Unchanged on error.
    pub fn reset(&mut self, domain: Domain) -> Result<()> {
        let Some(text) = self.expr.as_ref().map(Expression::text) else {
            self.domain = domain;
            return Ok(());
        };
        let expr = Expression::parse_with_options(domain, &text, DATE_ADJUST, &self.options)
            .inspect_err(|err| {
                tracing::debug!(%err, from = %self.domain, to = %domain, "reset rolled back");
            })?;
        self.domain = domain;
        self.expr = Some(expr);
        Ok(())
    }
}

impl fmt::Debug for DateHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateHolder")
            .field("domain", &self.domain)
            .field("expr", &self.expr)
            .field("empty_allowed", &self.empty_allowed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::expression::ExprKind;
    use chrono::NaiveDate;

    fn holder(domain: Domain, empty_allowed: bool) -> DateHolder {
        let now = NaiveDate::from_ymd_opt(2009, 11, 20)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        DateHolder::new(domain, empty_allowed).with_clock(Arc::new(FixedClock(now)))
    }

    fn resolved(h: &DateHolder, domain: Domain) -> String {
        h.get_date(domain).unwrap().unwrap().to_string()
    }

    #[test]
    fn test_set_and_resolve() {
        let mut h = holder(Domain::Day, false);
        h.set_date("today+3").unwrap();
        assert_eq!(h.text(), "today+3");
        assert_eq!(resolved(&h, Domain::Day), "2009-11-23");
        assert_eq!(h.expression().unwrap().adjust(), Adjust::Down);
    }

    #[test]
    fn test_empty_when_allowed() {
        let mut h = holder(Domain::Day, true);
        h.set_date("2009-11-19").unwrap();
        h.set_date("").unwrap();
        assert!(h.is_empty());
        assert_eq!(h.text(), "");
        assert_eq!(h.get_date(Domain::Day).unwrap(), None);
    }

    #[test]
    fn test_empty_when_not_allowed() {
        let mut h = holder(Domain::Day, false);
        h.set_date("2009-11-19").unwrap();
        let err = h.set_date("  ").unwrap_err();
        assert!(matches!(err, TimexError::MissingValue(_)), "got: {err}");
        assert_eq!(h.text(), "2009-11-19");
    }

    #[test]
    fn test_toggle_empty_allowed() {
        let mut h = holder(Domain::Day, false);
        assert!(h.set_date("").is_err());
        h.set_empty_allowed(true);
        assert!(h.empty_allowed());
        assert!(h.set_date("").is_ok());
    }

    #[test]
    fn test_parse_error_keeps_value() {
        let mut h = holder(Domain::Day, false);
        h.set_date("end-1").unwrap();
        assert!(h.set_date("2005-05-15+1--1").is_err());
        assert_eq!(h.text(), "end-1");
        assert_eq!(h.expression().unwrap().kind(), ExprKind::End);
    }

    #[test]
    fn test_incr_on_empty_starts_from_today() {
        let mut h = holder(Domain::Workweek, true);
        h.incr_date(1).unwrap();
        assert_eq!(h.text(), "2009-11-23");
    }

    #[test]
    fn test_incr_keyword_and_step() {
        let mut h = holder(Domain::Hour, false);
        h.set_date("today").unwrap();
        h.incr_date_step(false, true).unwrap();
        assert_eq!(h.text(), "today-15");

        h.set_date("2009-11-20T10").unwrap();
        h.incr_date_step(true, true).unwrap();
        assert_eq!(h.text(), "2009-11-21T10");
        h.incr_date_step(false, false).unwrap();
        assert_eq!(h.text(), "2009-11-21T09");
    }

    #[test]
    fn test_incr_step_with_unnegatable_step_fails() {
        let mut options = EngineOptions::default();
        options.large_steps.day = i64::MIN;
        let mut h = holder(Domain::Day, false).with_options(options);
        h.set_date("today").unwrap();
        let err = h.incr_date_step(false, true).unwrap_err();
        assert!(matches!(err, TimexError::Overflow(_)), "got: {err}");
        assert_eq!(h.text(), "today");
    }

    #[test]
    fn test_incr_overflow_keeps_value() {
        let mut h = holder(Domain::Day, false);
        h.set_date("2009-11-20").unwrap();
        let err = h.incr_date(i64::MAX).unwrap_err();
        assert!(matches!(err, TimexError::Overflow(_)), "got: {err}");
        assert_eq!(h.text(), "2009-11-20");
    }

    #[test]
    fn test_context_resolution() {
        let mut h = holder(Domain::Day, false);
        h.set_date("start+1").unwrap();
        assert!(h.need_context());
        assert!(h.get_date(Domain::Day).is_err());

        let lower = Domain::Day.parse("2009-11-01", Adjust::None).unwrap();
        let upper = Domain::Day.parse("2009-11-30", Adjust::None).unwrap();
        let context = TimeRange::new(lower, upper).unwrap();
        let at = h.get_date_in(&context).unwrap().unwrap();
        assert_eq!(at.to_string(), "2009-11-02");
        assert_eq!(h.get_date_in(&TimeRange::empty(Domain::Day)).unwrap(), None);
    }

    #[test]
    fn test_reset_transfers_keyword() {
        let mut h = holder(Domain::Day, false);
        h.set_date("today-2").unwrap();
        h.reset(Domain::Month).unwrap();
        assert_eq!(h.domain(), Domain::Month);
        assert_eq!(h.text(), "today-2");
        assert_eq!(resolved(&h, Domain::Month), "2009-09");
    }

    #[test]
    fn test_reset_failure_keeps_domain() {
        let mut h = holder(Domain::Minute, false);
        h.set_date("2009-11-20T10:15").unwrap();
        assert!(h.reset(Domain::Day).is_err());
        assert_eq!(h.domain(), Domain::Minute);
        assert_eq!(h.text(), "2009-11-20T10:15");
    }
}
