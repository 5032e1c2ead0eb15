//! Symbolic time expressions.
//!
//! An [`Expression`] holds one bound of a date field in symbolic form: a
//! literal point, the `today` keyword, or the `start`/`end` of a context
//! range, plus a pending integer offset. It stays unresolved until a domain
//! or a [`TimeRange`] is supplied.
//!
//! # Grammar
//!
//! ```text
//! expr   := (today | start | end | literal) offset*
//! offset := ('+' | '-') integer
//! ```
//!
//! Keywords are case-insensitive. Text longer than ten characters is first
//! read as a `yyyy-mm-dd` date in the daily calendar followed by a modifier;
//! if the modifier is not an offset chain, the whole text is retried as one
//! literal of the target domain (so `2009-11-20T13:05` still parses in a
//! minute domain).
//!
//! # Offsets
//!
//! A literal folds its offset into the point immediately. Keywords keep the
//! offset pending until resolution. For `today` in a domain finer than one
//! day the offset counts *days*, so `today-20` means twenty calendar days ago
//! whatever the tick size.

use std::fmt;

use crate::clock::Clock;
use crate::config::{EngineOptions, LargeSteps};
use crate::domain::{Adjust, Domain};
use crate::error::{Result, TimexError};
use crate::granularity::Granularity;
use crate::point::TimePoint;
use crate::range::TimeRange;

/// The active variant of an [`Expression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    /// Constructed but never given a value.
    Unset,
    /// An absolute point.
    Literal(TimePoint),
    /// The current instant.
    Today,
    /// Lower bound of the context range.
    Start,
    /// Upper bound of the context range.
    End,
}

const KEYWORDS: [(&str, ExprKind); 3] = [
    ("today", ExprKind::Today),
    ("start", ExprKind::Start),
    ("end", ExprKind::End),
];

/// Length of the `yyyy-mm-dd` prefix tried on long input.
const DATE_PREFIX_LEN: usize = 10;

/// One symbolic bound: a kind, a pending offset and an adjustment policy.
///
/// Cloning produces an independent value, which is what holders use as a
/// rollback snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    kind: ExprKind,
    offset: i64,
    adjust: Adjust,
}

impl Expression {
    /// An empty expression bound to `adjust`.
    pub fn new(adjust: Adjust) -> Self {
        Self {
            kind: ExprKind::Unset,
            offset: 0,
            adjust,
        }
    }

    /// An expression holding `point`.
    pub fn literal(point: TimePoint, adjust: Adjust) -> Self {
        Self {
            kind: ExprKind::Literal(point),
            offset: 0,
            adjust,
        }
    }

    /// The `today` keyword with no offset.
    pub fn today(adjust: Adjust) -> Self {
        Self {
            kind: ExprKind::Today,
            offset: 0,
            adjust,
        }
    }

    /// Parse `text` for `domain` with default options.
    ///
    /// # Examples
    ///
    /// ```
    /// use timex::{Adjust, Domain, Expression};
    ///
    /// let expr = Expression::parse(Domain::Day, "TODAY+3", Adjust::Down).unwrap();
    /// assert_eq!(expr.text(), "today+3");
    ///
    /// let expr = Expression::parse(Domain::Day, "2005-05-15+1", Adjust::Down).unwrap();
    /// assert_eq!(expr.text(), "2005-05-16");
    /// ```
    pub fn parse(domain: Domain, text: &str, adjust: Adjust) -> Result<Self> {
        Self::parse_with_options(domain, text, adjust, &EngineOptions::default())
    }

    /// Like [`Expression::parse`] with explicit options.
    pub fn parse_with_options(
        domain: Domain,
        text: &str,
        adjust: Adjust,
        options: &EngineOptions,
    ) -> Result<Self> {
        let mut expr = Self::new(adjust);
        expr.set_expression_with_options(domain, text, options)?;
        Ok(expr)
    }

    /// Replace the value of this expression by parsing `text`.
    ///
    /// On error the expression is left unchanged.
    pub fn set_expression(&mut self, domain: Domain, text: &str) -> Result<()> {
        self.set_expression_with_options(domain, text, &EngineOptions::default())
    }

    /// Like [`Expression::set_expression`] with explicit options.
    ///
    /// # Errors
    ///
    /// - [`TimexError::InvalidDate`] if the text is neither a literal nor starts
    ///   with a keyword (the literal parse failure is propagated).
    /// - [`TimexError::InvalidOffset`] if the modifier after the date or keyword
    ///   is not a `(+|-)integer` chain.
    /// - [`TimexError::Overflow`] if folding the offset into a literal leaves
    ///   the domain's range.
    pub fn set_expression_with_options(
        &mut self,
        domain: Domain,
        text: &str,
        options: &EngineOptions,
    ) -> Result<()> {
        let original = text.trim();

        let has_prefix =
            original.len() > DATE_PREFIX_LEN && original.is_char_boundary(DATE_PREFIX_LEN);
        let literal = if has_prefix {
            let (date, rest) = original.split_at(DATE_PREFIX_LEN);
            Domain::Day.parse(date, self.adjust).map(|point| (point, rest))
        } else {
            domain.parse(original, self.adjust).map(|point| (point, ""))
        };

        let (kind, modifier) = match literal {
            Ok((point, rest)) => (ExprKind::Literal(point), rest),
            Err(err) => match match_keyword(original) {
                Some((kind, rest)) => (kind, rest),
                None => return Err(err),
            },
        };

        let (kind, offset) = match parse_offset_chain(modifier, options.max_offset_terms) {
            Ok(offset) => (kind, offset),
            Err(reason) => {
                let whole = match kind {
                    ExprKind::Literal(_) => domain.parse(original, self.adjust).ok(),
                    _ => None,
                };
                match whole {
                    Some(point) => (ExprKind::Literal(point), 0),
                    None => {
                        return Err(TimexError::InvalidOffset(format!(
                            "bad modifier '{}' in '{}': {}",
                            modifier, original, reason
                        )))
                    }
                }
            }
        };

        let mut parsed = Self {
            kind,
            offset,
            adjust: self.adjust,
        };
        parsed.fold_offset()?;

        tracing::debug!(text = original, %domain, expression = %parsed, "parsed expression");
        *self = parsed;
        Ok(())
    }

    /// Install an absolute point, discarding any keyword and offset.
    pub fn set_point(&mut self, point: TimePoint) {
        self.kind = ExprKind::Literal(point);
        self.offset = 0;
    }

    /// The active variant.
    pub fn kind(&self) -> ExprKind {
        self.kind
    }

    /// Pending offset; always zero for literals.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Rounding policy applied when the value is converted between domains.
    pub fn adjust(&self) -> Adjust {
        self.adjust
    }

    /// The stored point of a literal, `None` for keywords.
    pub fn point(&self) -> Option<TimePoint> {
        match self.kind {
            ExprKind::Literal(point) => Some(point),
            _ => None,
        }
    }

    /// False until the expression is parsed or given a point.
    pub fn is_set(&self) -> bool {
        self.kind != ExprKind::Unset
    }

    /// True for `start`/`end`, which only resolve against a range.
    pub fn need_context(&self) -> bool {
        matches!(self.kind, ExprKind::Start | ExprKind::End)
    }

    /// Text form: the literal point, or the lowercase keyword followed by
    /// the pending offset. Empty for an unset expression.
    pub fn text(&self) -> String {
        let base = match self.kind {
            ExprKind::Unset => return String::new(),
            ExprKind::Literal(point) => point.to_string(),
            ExprKind::Today => "today".to_string(),
            ExprKind::Start => "start".to_string(),
            ExprKind::End => "end".to_string(),
        };
        if self.offset == 0 {
            base
        } else {
            format!("{}{:+}", base, self.offset)
        }
    }

    /// Add `delta` to the pending offset.
    ///
    /// A keyword offset that would overflow is left unchanged. A literal
    /// moves its point by `delta` immediately.
    ///
    /// # Errors
    ///
    /// [`TimexError::Unset`] on an unset expression, [`TimexError::Overflow`]
    /// if a literal would leave its domain (the point is then unchanged).
    pub fn incr(&mut self, delta: i64) -> Result<()> {
        match self.kind {
            ExprKind::Unset => Err(TimexError::Unset),
            ExprKind::Literal(point) => {
                self.kind = ExprKind::Literal(point.checked_add(delta)?);
                Ok(())
            }
            ExprKind::Today | ExprKind::Start | ExprKind::End => {
                match self.offset.checked_add(delta) {
                    Some(offset) => self.offset = offset,
                    None => tracing::warn!(
                        expression = %self,
                        delta,
                        "increment refused: offset would overflow"
                    ),
                }
                Ok(())
            }
        }
    }

    /// Resolve against a bare domain.
    ///
    /// # Errors
    ///
    /// [`TimexError::ContextRequired`] for `start`/`end`, [`TimexError::Unset`]
    /// for an unset expression, plus conversion and overflow failures.
    pub fn get_date(&self, domain: Domain, clock: &dyn Clock) -> Result<TimePoint> {
        match self.kind {
            ExprKind::Unset => Err(TimexError::Unset),
            ExprKind::Literal(point) => domain.convert(&point, self.adjust),
            ExprKind::Today => self.resolve_today(domain, clock),
            ExprKind::Start | ExprKind::End => Err(TimexError::ContextRequired(format!(
                "'{}' can only be resolved against a range",
                self
            ))),
        }
    }

    /// Resolve against a bounded range, in the range's domain.
    ///
    /// Returns `Ok(None)` when a `start`/`end` keyword meets an empty range.
    pub fn get_date_in(&self, range: &TimeRange, clock: &dyn Clock) -> Result<Option<TimePoint>> {
        let anchor = match self.kind {
            ExprKind::Unset => return Err(TimexError::Unset),
            ExprKind::Literal(_) | ExprKind::Today => {
                return self.get_date(range.domain(), clock).map(Some)
            }
            ExprKind::Start => range.lower(),
            ExprKind::End => range.upper(),
        };
        anchor.map(|point| point.checked_add(self.offset)).transpose()
    }

    /// Order this expression (the *end*) against `begin`.
    ///
    /// Returns `Ok(false)` without touching anything when either side is
    /// unset. When the pair is inverted, `keep_this` decides which side is
    /// protected: with `true` the end keeps its value and `begin` is moved,
    /// with `false` the end is moved onto `begin`.
    ///
    /// Only combinations of the same kind and `today`/literal mixes are
    /// checked; other mixes (`start` against a literal, `start` against
    /// `end`, …) are accepted as they are.
    pub fn enforce_valid_range(
        &mut self,
        domain: Domain,
        begin: &mut Expression,
        keep_this: bool,
        clock: &dyn Clock,
    ) -> Result<bool> {
        use ExprKind::*;

        match (self.kind, begin.kind) {
            (Unset, _) | (_, Unset) => return Ok(false),

            (Today, Today) | (Start, Start) | (End, End) => {
                if begin.offset > self.offset {
                    if keep_this {
                        begin.offset = self.offset;
                    } else {
                        self.offset = begin.offset;
                    }
                    tracing::debug!(begin = %begin, end = %self, "rebalanced keyword offsets");
                }
            }

            (Literal(_), Literal(_)) => {
                let end_at = self.get_date(domain, clock)?;
                let begin_at = begin.get_date(domain, clock)?;
                if begin_at > end_at {
                    if keep_this {
                        begin.set_point(end_at);
                    } else {
                        self.set_point(begin_at);
                    }
                    tracing::debug!(begin = %begin, end = %self, "rebalanced literal bounds");
                }
            }

            (Literal(_), Today) => {
                let end_at = self.get_date(domain, clock)?;
                let begin_at = begin.get_date(domain, clock)?;
                if begin_at > end_at {
                    if keep_this {
                        begin.retarget_today(&end_at, domain, clock, false)?;
                    } else {
                        self.set_point(begin_at);
                    }
                    tracing::debug!(
                        begin = %begin,
                        end = %self,
                        "rebalanced today against literal"
                    );
                }
            }

            (Today, Literal(_)) => {
                let end_at = self.get_date(domain, clock)?;
                let begin_at = begin.get_date(domain, clock)?;
                if begin_at > end_at {
                    if keep_this {
                        begin.set_point(end_at);
                    } else {
                        self.retarget_today(&begin_at, domain, clock, true)?;
                    }
                    tracing::debug!(
                        begin = %begin,
                        end = %self,
                        "rebalanced literal against today"
                    );
                }
            }

            // Not checked: ordering depends on a context these pairs do not have
            // here, or on mixing a context keyword with an absolute value.
            (Start, End)
            | (End, Start)
            | (Start, Today)
            | (Today, Start)
            | (End, Today)
            | (Today, End)
            | (Start, Literal(_))
            | (Literal(_), Start)
            | (End, Literal(_))
            | (Literal(_), End) => {}
        }

        Ok(true)
    }

    // ── Internal helpers ────────────────────────────────────────────────

    fn fold_offset(&mut self) -> Result<()> {
        if let ExprKind::Literal(point) = self.kind {
            if self.offset != 0 {
                self.kind = ExprKind::Literal(point.checked_add(self.offset)?);
                self.offset = 0;
            }
        }
        Ok(())
    }

    fn resolve_today(&self, domain: Domain, clock: &dyn Clock) -> Result<TimePoint> {
        let now = clock.now();
        let unit = offset_domain(domain);
        let anchor = unit.from_datetime(now, Adjust::Down)?.checked_add(self.offset)?;
        domain.convert(&anchor, self.adjust)
    }

    /// Rewrite a `today` offset so the expression resolves next to `target`:
    /// at or before it, or (with `at_least`) at or after it. Falls back to
    /// the literal `target` if the offset would not fit.
    fn retarget_today(
        &mut self,
        target: &TimePoint,
        domain: Domain,
        clock: &dyn Clock,
        at_least: bool,
    ) -> Result<()> {
        let unit = offset_domain(domain);
        let current = self.resolve_today(unit, clock)?;
        let target_unit = unit.convert(target, Adjust::Down)?;

        let mut offset = current
            .distance_to(&target_unit)
            .ok()
            .and_then(|gap| self.offset.checked_add(gap));

        if at_least {
            if let Some(candidate) = offset {
                let probe = Self {
                    offset: candidate,
                    ..self.clone()
                };
                if probe.get_date(domain, clock)? < *target {
                    offset = candidate.checked_add(1);
                }
            }
        }

        match offset {
            Some(offset) => self.offset = offset,
            None => {
                tracing::debug!(%target, "today offset out of range, pinning literal");
                self.set_point(*target);
            }
        }
        Ok(())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Signed size of one nudge of `current`.
///
/// A small nudge is one unit. A large nudge uses the step table for the
/// domain's granularity, except that a `today` bound always uses the daily
/// step, matching how `today` offsets are counted.
///
/// # Errors
///
/// [`TimexError::Overflow`] if a downward step cannot be negated.
pub(crate) fn step_delta(
    steps: &LargeSteps,
    domain: Domain,
    current: Option<&Expression>,
    up: bool,
    large: bool,
) -> Result<i64> {
    let magnitude = if large {
        let granularity = match current.map(Expression::kind) {
            Some(ExprKind::Today) => Granularity::Day,
            _ => domain.granularity(),
        };
        steps.step(granularity)
    } else {
        1
    };
    if up {
        return Ok(magnitude);
    }
    magnitude.checked_neg().ok_or_else(|| {
        TimexError::Overflow(format!("step {} cannot be taken downwards", magnitude))
    })
}

/// Domain in which a `today` offset is counted.
fn offset_domain(domain: Domain) -> Domain {
    if domain.granularity().is_coarser_or_equal(Granularity::Day) {
        domain
    } else {
        Domain::Day
    }
}

fn match_keyword(text: &str) -> Option<(ExprKind, &str)> {
    KEYWORDS.iter().find_map(|&(word, kind)| {
        let head = text.get(..word.len())?;
        head.eq_ignore_ascii_case(word)
            .then(|| (kind, &text[word.len()..]))
    })
}

/// Sum a `(+|-)integer` chain. Empty input is a zero offset. A term that
/// would overflow the running total is dropped.
fn parse_offset_chain(modifier: &str, max_terms: usize) -> std::result::Result<i64, String> {
    let mut total: i64 = 0;
    let mut rest = modifier;
    let mut terms = 0usize;

    while !rest.is_empty() {
        if !rest.starts_with(['+', '-']) {
            return Err(format!("expected '+' or '-' at '{}'", rest));
        }
        terms += 1;
        if terms > max_terms {
            return Err(format!("more than {} offset terms", max_terms));
        }

        let end = rest[1..].find(['+', '-']).map_or(rest.len(), |i| i + 1);
        let (term, tail) = rest.split_at(end);
        let value: i64 = term
            .parse()
            .map_err(|_| format!("'{}' is not a signed integer", term))?;

        match total.checked_add(value) {
            Some(sum) => total = sum,
            None => tracing::warn!(
                term,
                total,
                "offset term dropped: accumulated offset would overflow"
            ),
        }
        rest = tail;
    }

    Ok(total)
}

// ── Tests ───────────────────────────────────────────────────────────────────


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn clock() -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2009, 11, 20)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
        )
    }

    fn canonical_text() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("today".to_string()),
            Just("start".to_string()),
            Just("end".to_string()),
            (1900i32..2100, 1u32..=12, 1u32..=28)
                .prop_map(|(y, m, d)| format!("{:04}-{:02}-{:02}", y, m, d)),
        ]
    }

    proptest! {
        /// Property: text() reproduces zero-offset input and re-parses to an equal value
        #[test]
        fn test_text_roundtrip(text in canonical_text()) {
            let expr = Expression::parse(Domain::Day, &text, Adjust::Down).unwrap();
            prop_assert_eq!(expr.text(), text.clone());
            let again = Expression::parse(Domain::Day, &expr.text(), Adjust::Down).unwrap();
            prop_assert_eq!(again, expr);
        }

        /// Property: keyword case does not matter, text is lowercase
        #[test]
        fn test_keyword_case_normalized(upper in proptest::bool::ANY, offset in -1000i64..1000) {
            let word = if upper { "ToDaY" } else { "today" };
            let text = format!("{}{:+}", word, offset);
            let expr = Expression::parse(Domain::Day, &text, Adjust::Down).unwrap();
            let expected = if offset == 0 {
                "today".to_string()
            } else {
                format!("today{:+}", offset)
            };
            prop_assert_eq!(expr.text(), expected);
        }

        /// Property: incr(a); incr(b) resolves like incr(a + b)
        #[test]
        fn test_incr_associative(
            a in -5000i64..5000,
            b in -5000i64..5000,
            keyword in proptest::bool::ANY,
        ) {
            let text = if keyword { "today" } else { "2009-11-20" };
            let mut split = Expression::parse(Domain::Day, text, Adjust::Down).unwrap();
            split.incr(a).unwrap();
            split.incr(b).unwrap();
            let mut joined = Expression::parse(Domain::Day, text, Adjust::Down).unwrap();
            joined.incr(a + b).unwrap();
            prop_assert_eq!(
                split.get_date(Domain::Day, &clock()).unwrap(),
                joined.get_date(Domain::Day, &clock()).unwrap()
            );
        }

        /// Property: an overflowing increment leaves the offset unchanged
        #[test]
        fn test_incr_overflow_unchanged(a in 1i64..i64::MAX) {
            let mut expr = Expression::parse(Domain::Day, "end", Adjust::Down).unwrap();
            expr.incr(i64::MAX).unwrap();
            expr.incr(a).unwrap();
            prop_assert_eq!(expr.offset(), i64::MAX);
        }

        /// Property: random input never panics the parser
        #[test]
        fn test_parse_never_panics(text in "[a-zA-Z0-9+\\-:T. ]{0,40}") {
            let _ = Expression::parse(Domain::Minute, &text, Adjust::Up);
        }
    }
}
