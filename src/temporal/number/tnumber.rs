use crate::boxes::tbox::TBox;
use crate::collections::base::span::{Span, SpanElement};
use crate::collections::base::span_set::SpanSet;
use crate::collections::datetime::tstz_span::TsTzSpan;
use crate::collections::datetime::tstz_span_set::TsTzSpanSet;
use crate::errors::{Error, Result};
use crate::temporal::base::{BBox, BaseType, NumberBase};
use crate::temporal::lifting::{lift_binary, lift_unary};
use crate::temporal::temporal::Temporal;
use crate::temporal::tsequence::TSequence;
use crate::utils::timestamp_at_fraction;

/// Interior extremum of the product of two synchronized linear segments.
///
/// With `a(α) = a1 + α·da` and `b(α) = b1 + α·db`, the product's derivative
/// vanishes at `α* = −(a1·db + b1·da) / (2·da·db)`, the midpoint of the two
/// zero-crossing parameters. It exists only when both segments are
/// non-constant. The quotient of two linear segments is monotone (its
/// derivative keeps the sign of `da·b1 − a1·db`), so division deliberately
/// has no counterpart here.
pub(crate) fn mult_turning_point<B: NumberBase>(
    a1: &B,
    a2: &B,
    b1: &B,
    b2: &B,
) -> Option<f64> {
    let (x1, x2) = (a1.to_f64(), a2.to_f64());
    let (x3, x4) = (b1.to_f64(), b2.to_f64());
    let da = x2 - x1;
    let db = x4 - x3;
    if da == 0.0 || db == 0.0 {
        return None;
    }
    let d1 = -x1 / da;
    let d2 = -x3 / db;
    Some((d1 + d2) / 2.0)
}

fn crossing_finder<B: NumberBase>(a1: &B, a2: &B, b1: &B, b2: &B) -> Option<f64> {
    f64::segment_crossing(&a1.to_f64(), &a2.to_f64(), &b1.to_f64(), &b2.to_f64())
}

fn zero_finder<B: NumberBase>(a1: &B, a2: &B) -> Option<f64> {
    f64::segment_at_value(&a1.to_f64(), &a2.to_f64(), &0.0)
}

impl<B: NumberBase + SpanElement> Temporal<B> {
    /// Value×time bounding box.
    pub fn tbox(&self) -> TBox {
        match self.bounding_box() {
            BBox::Numeric(tbox) => tbox,
            _ => unreachable!("temporal numbers carry numeric bounding boxes"),
        }
    }

    // ------------------------- Arithmetic -----------------------------------

    /// Temporal addition over the synchronized domain.
    ///
    /// ## Example
    /// ```
    /// # use tempora::temporal::{tinstant::TInstant, tsequence::TSequence};
    /// # use tempora::temporal::temporal::Temporal;
    /// # use tempora::temporal::interpolation::TInterpolation;
    /// # use chrono::DateTime;
    /// let ts = |secs| DateTime::from_timestamp(secs, 0).unwrap();
    /// let seq = |v1: f64, v2: f64| {
    ///     Temporal::Sequence(TSequence::new(
    ///         vec![TInstant::new(v1, ts(0)), TInstant::new(v2, ts(100))],
    ///         true, true, TInterpolation::Linear, false,
    ///     ).unwrap())
    /// };
    /// // 1→5 plus 4→0 is constant 5
    /// let sum = seq(1.0, 5.0).add(&seq(4.0, 0.0)).unwrap();
    /// assert!(sum.always_eq(&5.0));
    /// ```
    pub fn add(&self, other: &Self) -> Option<Self> {
        lift_binary(self, other, &|a: &B, b: &B| a.add(*b), true, None)
    }

    pub fn sub(&self, other: &Self) -> Option<Self> {
        lift_binary(self, other, &|a: &B, b: &B| a.sub(*b), true, None)
    }

    /// Temporal multiplication; an interior extremum of a segment pair is
    /// materialized as an extra instant.
    pub fn mul(&self, other: &Self) -> Option<Self> {
        lift_binary(
            self,
            other,
            &|a: &B, b: &B| a.mul(*b),
            true,
            Some(&mult_turning_point::<B>),
        )
    }

    /// Temporal division.
    ///
    /// ## Errors
    /// `DivisionByZero` when the denominator is ever exactly zero on the
    /// synchronized domain.
    pub fn div(&self, other: &Self) -> Result<Option<Self>> {
        let Some(shared) = self.time().intersection(&other.time()) else {
            return Ok(None);
        };
        let Some(denominator) = other.at_period_set(&shared) else {
            return Ok(None);
        };
        if denominator.ever_eq(&B::zero()) {
            return Err(Error::DivisionByZero);
        }
        Ok(lift_binary(self, other, &|a: &B, b: &B| a.div(*b), true, None))
    }

    pub fn add_value(&self, value: B) -> Self {
        lift_unary(self, &|x: &B| x.add(value), true, None)
    }

    pub fn sub_value(&self, value: B) -> Self {
        lift_unary(self, &|x: &B| x.sub(value), true, None)
    }

    /// `value - self`.
    pub fn value_sub(value: B, temporal: &Self) -> Self {
        lift_unary(temporal, &|x: &B| value.sub(*x), true, None)
    }

    pub fn mul_value(&self, value: B) -> Self {
        lift_unary(self, &|x: &B| x.mul(value), true, None)
    }

    /// ## Errors
    /// `DivisionByZero` when `value` is zero.
    pub fn div_value(&self, value: B) -> Result<Self> {
        if value == B::zero() {
            return Err(Error::DivisionByZero);
        }
        Ok(lift_unary(self, &|x: &B| x.div(value), true, None))
    }

    /// `value / self`.
    ///
    /// ## Errors
    /// `DivisionByZero` when the temporal denominator is ever zero.
    pub fn value_div(value: B, temporal: &Self) -> Result<Self> {
        if temporal.ever_eq(&B::zero()) {
            return Err(Error::DivisionByZero);
        }
        Ok(lift_unary(temporal, &|x: &B| value.div(*x), true, None))
    }

    pub fn neg(&self) -> Self {
        lift_unary(self, &|x: &B| B::zero().sub(*x), true, None)
    }

    /// Absolute value; linear segments are split at interior zero
    /// crossings so the result stays piecewise linear.
    pub fn abs(&self) -> Self {
        lift_unary(self, &|x: &B| x.abs(), true, Some(&zero_finder::<B>))
    }

    // ------------------------- Distance -------------------------------------

    /// Temporal distance `|self − other|`; the crossing of the two operands
    /// becomes an exact zero instant.
    pub fn distance(&self, other: &Self) -> Option<Self> {
        lift_binary(
            self,
            other,
            &|a: &B, b: &B| a.sub(*b).abs(),
            true,
            Some(&crossing_finder::<B>),
        )
    }

    /// Smallest value the temporal distance takes.
    pub fn nearest_approach_distance(&self, other: &Self) -> Option<B> {
        self.distance(other).map(|d| d.min_value())
    }

    // ------------------------- Value restriction ----------------------------

    /// Restricts to the time where the value falls inside `span`.
    pub fn at_span(&self, span: &Span<B>) -> Option<Self> {
        if let BBox::Numeric(tbox) = self.bounding_box() {
            if let Some(vspan) = tbox.value_span() {
                let probe = Span::new(
                    span.lower().to_f64(),
                    span.upper().to_f64(),
                    span.is_lower_inclusive(),
                    span.is_upper_inclusive(),
                )
                .expect("span bounds are ordered");
                if !vspan.overlaps(&probe) {
                    return None;
                }
            }
        }
        match self {
            Temporal::Instant(i) => span
                .contains_value(i.value())
                .then(|| Temporal::Instant(i.clone())),
            Temporal::InstantSet(s) => {
                let kept: Vec<_> = s
                    .instants()
                    .iter()
                    .filter(|i| span.contains_value(i.value()))
                    .cloned()
                    .collect();
                (!kept.is_empty()).then(|| {
                    Temporal::from(crate::temporal::tinstant_set::TInstantSet::new_unchecked(
                        kept,
                    ))
                })
            }
            Temporal::Sequence(s) => {
                let windows = sequence_span_windows(s, span);
                let set = TsTzSpanSet::new(windows, true).ok()?;
                s.at_period_set(&set).map(Temporal::from)
            }
            Temporal::SequenceSet(s) => {
                let windows: Vec<TsTzSpan> = s
                    .sequences()
                    .iter()
                    .flat_map(|seq| sequence_span_windows(seq, span))
                    .collect();
                let set = TsTzSpanSet::new(windows, true).ok()?;
                s.at_period_set(&set).map(Temporal::from)
            }
        }
    }

    pub fn minus_span(&self, span: &Span<B>) -> Option<Self> {
        match self.at_span(span) {
            None => Some(self.clone()),
            Some(at) => match self.time().minus(&at.time()) {
                None => None,
                Some(rest) => self.at_period_set(&rest),
            },
        }
    }

    pub fn at_span_set(&self, spans: &SpanSet<B>) -> Option<Self> {
        let mut covered: Option<TsTzSpanSet> = None;
        for span in spans.iter() {
            if let Some(at) = self.at_span(span) {
                let time = at.time();
                covered = Some(match covered {
                    None => time,
                    Some(acc) => acc.union(&time),
                });
            }
        }
        self.at_period_set(&covered?)
    }

    pub fn minus_span_set(&self, spans: &SpanSet<B>) -> Option<Self> {
        match self.at_span_set(spans) {
            None => Some(self.clone()),
            Some(at) => match self.time().minus(&at.time()) {
                None => None,
                Some(rest) => self.at_period_set(&rest),
            },
        }
    }

    // ------------------------- Aggregated views -----------------------------

    /// Area under the curve, in value·seconds. Instants carry no area.
    pub fn integral(&self) -> f64 {
        match self {
            Temporal::Instant(_) | Temporal::InstantSet(_) => 0.0,
            Temporal::Sequence(s) => sequence_integral(s),
            Temporal::SequenceSet(s) => s.sequences().iter().map(sequence_integral).sum(),
        }
    }

    /// Time-weighted average; plain mean for discrete subtypes.
    pub fn time_weighted_average(&self) -> f64 {
        match self {
            Temporal::Instant(i) => i.value().to_f64(),
            Temporal::InstantSet(s) => {
                let values = s.values();
                values.iter().map(|v| v.to_f64()).sum::<f64>() / values.len() as f64
            }
            _ => {
                let seconds = self.duration().num_microseconds().unwrap_or(0) as f64 / 1e6;
                if seconds == 0.0 {
                    self.start_value().to_f64()
                } else {
                    self.integral() / seconds
                }
            }
        }
    }
}

fn sequence_integral<B: NumberBase>(seq: &TSequence<B>) -> f64 {
    let mut total = 0.0;
    for pair in seq.instants().windows(2) {
        let dt = (pair[1].timestamp() - pair[0].timestamp())
            .num_microseconds()
            .unwrap_or(0) as f64
            / 1e6;
        let v1 = pair[0].value().to_f64();
        total += if seq.is_linear() {
            let v2 = pair[1].value().to_f64();
            (v1 + v2) / 2.0 * dt
        } else {
            v1 * dt
        };
    }
    total
}

/// Time windows where a sequence's value falls inside `span`. Linear
/// segments map the value range to a parameter interval analytically.
fn sequence_span_windows<B: NumberBase + SpanElement>(
    seq: &TSequence<B>,
    span: &Span<B>,
) -> Vec<TsTzSpan> {
    let mut windows = Vec::new();
    let instants = seq.instants();
    if instants.len() == 1 {
        if span.contains_value(instants[0].value()) {
            windows.push(TsTzSpan::singleton(instants[0].timestamp()));
        }
        return windows;
    }
    let lo = span.lower().to_f64();
    let hi = span.upper().to_f64();
    for pair in instants.windows(2) {
        let (t1, t2) = (pair[0].timestamp(), pair[1].timestamp());
        let v1 = pair[0].value();
        let v2 = pair[1].value();
        if !seq.is_linear() {
            if span.contains_value(v1) {
                windows.push(TsTzSpan::new(t1, t2, true, false).expect("ordered instants"));
            }
            continue;
        }
        let (x1, x2) = (v1.to_f64(), v2.to_f64());
        if x1 == x2 {
            if span.contains_value(v1) {
                windows.push(TsTzSpan::new(t1, t2, true, true).expect("ordered instants"));
            }
            continue;
        }
        // Map the value window onto the segment parameter.
        let rising = x2 > x1;
        let (enter_value, enter_inc, exit_value, exit_inc) = if rising {
            (lo, span.is_lower_inclusive(), hi, span.is_upper_inclusive())
        } else {
            (hi, span.is_upper_inclusive(), lo, span.is_lower_inclusive())
        };
        let fraction_of = |v: f64| (v - x1) / (x2 - x1);
        let (enter, enter_inc) = if (rising && enter_value <= x1) || (!rising && enter_value >= x1)
        {
            (0.0, true)
        } else {
            (fraction_of(enter_value), enter_inc)
        };
        let (exit, exit_inc) = if (rising && exit_value >= x2) || (!rising && exit_value <= x2) {
            (1.0, true)
        } else {
            (fraction_of(exit_value), exit_inc)
        };
        if enter > 1.0 || exit < 0.0 || enter > exit {
            continue;
        }
        let ta = timestamp_at_fraction(t1, t2, enter.clamp(0.0, 1.0));
        let tb = timestamp_at_fraction(t1, t2, exit.clamp(0.0, 1.0));
        if ta == tb {
            if enter_inc && exit_inc {
                windows.push(TsTzSpan::singleton(ta));
            }
        } else {
            windows.push(TsTzSpan::new(ta, tb, enter_inc, exit_inc).expect("ordered fractions"));
        }
    }
    if span.contains_value(seq.end_instant().value()) {
        windows.push(TsTzSpan::singleton(seq.end_instant().timestamp()));
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::interpolation::TInterpolation;
    use crate::temporal::tinstant::TInstant;
    use chrono::DateTime;

    fn ts(secs: i64) -> DateTime<chrono::Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn linear(values: &[(f64, i64)]) -> Temporal<f64> {
        Temporal::Sequence(
            TSequence::new(
                values.iter().map(|&(v, t)| TInstant::new(v, ts(t))).collect(),
                true,
                true,
                TInterpolation::Linear,
                false,
            )
            .unwrap(),
        )
    }

    #[test]
    fn mul_materializes_interior_turning_point() {
        // spec scenario 3: (−1→1) · (1→−1) dips through 0 at the middle.
        let a = linear(&[(-1.0, 0), (1.0, 100)]);
        let b = linear(&[(1.0, 0), (-1.0, 100)]);
        let product = a.mul(&b).unwrap();
        assert_eq!(product.value_at_timestamp(ts(50)), Some(0.0));
        assert_eq!(product.value_at_timestamp(ts(0)), Some(-1.0));
        assert_eq!(product.value_at_timestamp(ts(100)), Some(-1.0));
        assert!(product.timestamps().contains(&ts(50)));
    }

    #[test]
    fn div_rejects_zero_denominator_on_shared_domain() {
        let a = linear(&[(1.0, 0), (1.0, 100)]);
        let through_zero = linear(&[(-1.0, 0), (1.0, 100)]);
        assert_eq!(a.div(&through_zero), Err(Error::DivisionByZero));
        // zero outside the shared domain is fine
        let b = linear(&[(2.0, 0), (1.0, 100)]);
        let q = a.div(&b).unwrap().unwrap();
        assert_eq!(q.value_at_timestamp(ts(0)), Some(0.5));
    }

    #[test]
    fn abs_splits_at_zero() {
        let a = linear(&[(-2.0, 0), (2.0, 100)]);
        let magnitude = a.abs();
        assert_eq!(magnitude.value_at_timestamp(ts(50)), Some(0.0));
        assert_eq!(magnitude.value_at_timestamp(ts(0)), Some(2.0));
        assert_eq!(magnitude.value_at_timestamp(ts(75)), Some(1.0));
    }

    #[test]
    fn at_span_clips_linear_segments() {
        let a = linear(&[(0.0, 0), (10.0, 100)]);
        let inside = a.at_span(&(2.0..=4.0).into()).unwrap();
        assert_eq!(inside.start_timestamp(), ts(20));
        assert_eq!(inside.end_timestamp(), ts(40));
        let outside = a.minus_span(&(2.0..=4.0).into()).unwrap();
        assert!(outside.value_at_timestamp(ts(30)).is_none());
        assert_eq!(outside.value_at_timestamp(ts(10)), Some(1.0));
    }

    #[test]
    fn integral_and_twavg() {
        let a = linear(&[(0.0, 0), (10.0, 100)]);
        assert_eq!(a.integral(), 500.0);
        assert_eq!(a.time_weighted_average(), 5.0);
        let step = Temporal::Sequence(
            TSequence::new(
                vec![
                    TInstant::new(4.0, ts(0)),
                    TInstant::new(8.0, ts(50)),
                    TInstant::new(8.0, ts(100)),
                ],
                true,
                true,
                TInterpolation::Stepwise,
                false,
            )
            .unwrap(),
        );
        assert_eq!(step.integral(), 4.0 * 50.0 + 8.0 * 50.0);
        assert_eq!(step.time_weighted_average(), 6.0);
    }

    #[test]
    fn distance_hits_zero_at_crossing() {
        let a = linear(&[(0.0, 0), (10.0, 100)]);
        let b = linear(&[(10.0, 0), (0.0, 100)]);
        let d = a.distance(&b).unwrap();
        assert_eq!(d.value_at_timestamp(ts(50)), Some(0.0));
        assert_eq!(d.value_at_timestamp(ts(0)), Some(10.0));
        assert_eq!(a.nearest_approach_distance(&b), Some(0.0));
    }
}
