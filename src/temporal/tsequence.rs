use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collections::base::span_set::SpanSet;
use crate::collections::datetime::tstz_span::TsTzSpan;
use crate::collections::datetime::tstz_span_set::TsTzSpanSet;
use crate::collections::datetime::tstz_set::TsTzSet;
use crate::errors::{Error, Result};
use crate::temporal::base::{BBox, BaseType};
use crate::temporal::interpolation::TInterpolation;
use crate::temporal::tinstant::TInstant;
use crate::temporal::tinstant_set::TInstantSet;
use crate::temporal::tsequence_set::TSequenceSet;
use crate::utils::{segment_fraction, timestamp_at_fraction};

/// A temporal sequence: ordered instants over a single period, with an
/// interpolation flag.
///
/// Invariants: timestamps strictly increase; the first/last instant sit
/// exactly on the period bounds; an instantaneous sequence is inclusive on
/// both sides; a stepwise sequence with an exclusive upper bound repeats its
/// held value in the last instant; linear interpolation requires a
/// continuous base type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TSequence<B: BaseType> {
    instants: Vec<TInstant<B>>,
    lower_inc: bool,
    upper_inc: bool,
    interp: TInterpolation,
    bbox: BBox,
}

impl<B: BaseType> TSequence<B> {
    /// Builds a sequence and validates its invariants. With `normalize`,
    /// redundant interior instants (equal held values under stepwise
    /// interpolation, collinear points under linear) are merged away.
    ///
    /// ## Example
    /// ```
    /// # use tempora::temporal::{tinstant::TInstant, tsequence::TSequence};
    /// # use tempora::temporal::interpolation::TInterpolation;
    /// # use chrono::DateTime;
    /// let ts = |secs| DateTime::from_timestamp(secs, 0).unwrap();
    /// let seq = TSequence::new(
    ///     vec![
    ///         TInstant::new(1.0, ts(0)),
    ///         TInstant::new(2.0, ts(10)),
    ///         TInstant::new(3.0, ts(20)),
    ///     ],
    ///     true,
    ///     true,
    ///     TInterpolation::Linear,
    ///     true,
    /// )
    /// .unwrap();
    /// // the middle instant is collinear and normalizes away
    /// assert_eq!(seq.num_instants(), 2);
    /// ```
    pub fn new(
        instants: Vec<TInstant<B>>,
        lower_inc: bool,
        upper_inc: bool,
        interp: TInterpolation,
        normalize: bool,
    ) -> Result<Self> {
        if instants.is_empty() {
            return Err(Error::invalid("a sequence requires at least one instant"));
        }
        for pair in instants.windows(2) {
            if pair[0].timestamp() >= pair[1].timestamp() {
                return Err(Error::invalid(
                    "sequence timestamps must be strictly increasing",
                ));
            }
        }
        if instants.len() == 1 && !(lower_inc && upper_inc) {
            return Err(Error::invalid(
                "an instantaneous sequence must be inclusive on both sides",
            ));
        }
        if interp == TInterpolation::Linear && !B::CONTINUOUS {
            return Err(Error::invalid(
                "linear interpolation requires a continuous base type",
            ));
        }
        if interp == TInterpolation::Stepwise && !upper_inc && instants.len() > 1 {
            let last = instants[instants.len() - 1].value();
            let held = instants[instants.len() - 2].value();
            if last != held {
                return Err(Error::invalid(
                    "a stepwise sequence with an exclusive upper bound must repeat \
                     its held value in the last instant",
                ));
            }
        }
        let instants = if normalize {
            Self::normalized(instants, interp)
        } else {
            instants
        };
        Ok(Self::new_unchecked(instants, lower_inc, upper_inc, interp))
    }

    pub(crate) fn new_unchecked(
        instants: Vec<TInstant<B>>,
        lower_inc: bool,
        upper_inc: bool,
        interp: TInterpolation,
    ) -> Self {
        debug_assert!(!instants.is_empty());
        let mut bbox = instants[0].bounding_box();
        for inst in &instants[1..] {
            bbox.expand(&inst.bounding_box());
        }
        Self { instants, lower_inc, upper_inc, interp, bbox }
    }

    /// Constant sequence over a period.
    pub fn from_value_and_period(
        value: B,
        period: TsTzSpan,
        interp: TInterpolation,
    ) -> Result<Self> {
        let instants = if period.lower() == period.upper() {
            vec![TInstant::new(value, period.lower())]
        } else {
            vec![
                TInstant::new(value.clone(), period.lower()),
                TInstant::new(value, period.upper()),
            ]
        };
        Self::new(
            instants,
            period.is_lower_inclusive(),
            period.is_upper_inclusive(),
            interp,
            false,
        )
    }

    pub(crate) fn normalized(
        instants: Vec<TInstant<B>>,
        interp: TInterpolation,
    ) -> Vec<TInstant<B>> {
        if instants.len() < 3 {
            return instants;
        }
        let mut kept: Vec<TInstant<B>> = Vec::with_capacity(instants.len());
        let last_idx = instants.len() - 1;
        for (i, inst) in instants.into_iter().enumerate() {
            if i == 0 || i == last_idx {
                kept.push(inst);
                continue;
            }
            let prev = &kept[kept.len() - 1];
            let redundant = match interp {
                TInterpolation::Stepwise => inst.value() == prev.value(),
                // A middle instant is redundant when it lies on the segment
                // joining its kept neighbours; dropping it cannot change the
                // interpolated values, so the test against the final
                // neighbour is deferred to the next iteration by keeping
                // provisional points out unless they bend the line.
                TInterpolation::Linear => false,
            };
            if !redundant {
                kept.push(inst);
            }
        }
        if interp == TInterpolation::Linear {
            return Self::normalize_linear(kept);
        }
        kept
    }

    fn normalize_linear(instants: Vec<TInstant<B>>) -> Vec<TInstant<B>> {
        let mut kept: Vec<TInstant<B>> = Vec::with_capacity(instants.len());
        for inst in instants {
            while kept.len() >= 2 {
                let a = &kept[kept.len() - 2];
                let b = &kept[kept.len() - 1];
                let fraction =
                    segment_fraction(a.timestamp(), inst.timestamp(), b.timestamp());
                if B::lerp(a.value(), inst.value(), fraction) == *b.value() {
                    kept.pop();
                } else {
                    break;
                }
            }
            kept.push(inst);
        }
        kept
    }

    // ------------------------- Accessors ------------------------------------

    pub fn num_instants(&self) -> usize {
        self.instants.len()
    }

    pub fn instant_n(&self, n: usize) -> Option<&TInstant<B>> {
        self.instants.get(n)
    }

    pub fn instants(&self) -> &[TInstant<B>] {
        &self.instants
    }

    pub fn start_instant(&self) -> &TInstant<B> {
        &self.instants[0]
    }

    pub fn end_instant(&self) -> &TInstant<B> {
        &self.instants[self.instants.len() - 1]
    }

    pub fn start_value(&self) -> &B {
        self.instants[0].value()
    }

    pub fn end_value(&self) -> &B {
        self.instants[self.instants.len() - 1].value()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.instants.iter().map(TInstant::timestamp).collect()
    }

    pub fn values(&self) -> Vec<B> {
        self.instants.iter().map(|i| i.value().clone()).collect()
    }

    pub fn interpolation(&self) -> TInterpolation {
        self.interp
    }

    pub fn is_linear(&self) -> bool {
        self.interp == TInterpolation::Linear
    }

    pub fn is_lower_inclusive(&self) -> bool {
        self.lower_inc
    }

    pub fn is_upper_inclusive(&self) -> bool {
        self.upper_inc
    }

    pub fn bounding_box(&self) -> &BBox {
        &self.bbox
    }

    /// The period this sequence is defined over.
    pub fn period(&self) -> TsTzSpan {
        TsTzSpan::new(
            self.instants[0].timestamp(),
            self.instants[self.instants.len() - 1].timestamp(),
            self.lower_inc,
            self.upper_inc,
        )
        .expect("sequence instants are ordered")
    }

    pub fn time(&self) -> TsTzSpanSet {
        TsTzSpanSet::from_span(self.period())
    }

    pub fn duration(&self) -> chrono::TimeDelta {
        self.period().duration()
    }

    // ------------------------- Value access ---------------------------------

    /// Value at `t`, bound-exact: at an exclusive period bound the value is
    /// not attained and the result is `None`.
    pub fn value_at_timestamp(&self, t: DateTime<Utc>) -> Option<B> {
        self.period().contains_value(&t).then(|| self.value_at_contained(t))
    }

    /// Value at `t` with both period bounds treated as closed: at an
    /// exclusive bound this returns the bound instant's own value.
    pub fn value_at_timestamp_inclusive(&self, t: DateTime<Utc>) -> Option<B> {
        (self.instants[0].timestamp() <= t
            && t <= self.instants[self.instants.len() - 1].timestamp())
        .then(|| self.value_at_contained(t))
    }

    /// Interpolated value at a timestamp known to fall inside the closed
    /// period hull.
    pub(crate) fn value_at_contained(&self, t: DateTime<Utc>) -> B {
        let idx = self.instants.partition_point(|i| i.timestamp() < t);
        if idx < self.instants.len() && self.instants[idx].timestamp() == t {
            return self.instants[idx].value().clone();
        }
        debug_assert!(idx > 0, "timestamp outside the sequence hull");
        let before = &self.instants[idx - 1];
        match self.interp {
            TInterpolation::Stepwise => before.value().clone(),
            TInterpolation::Linear => {
                let after = &self.instants[idx];
                let fraction =
                    segment_fraction(before.timestamp(), after.timestamp(), t);
                B::lerp(before.value(), after.value(), fraction)
            }
        }
    }

    /// Value held on the open interval just before `t`; `t` must be
    /// strictly inside the hull.
    fn held_value_before(&self, t: DateTime<Utc>) -> B {
        let idx = self.instants.partition_point(|i| i.timestamp() < t);
        debug_assert!(idx > 0);
        match self.interp {
            TInterpolation::Stepwise => self.instants[idx - 1].value().clone(),
            TInterpolation::Linear => self.value_at_contained(t),
        }
    }

    // ------------------------- Restrictions ---------------------------------

    /// Sub-sequence over `inter`, which must be contained in the period.
    pub(crate) fn sub_sequence(&self, inter: &TsTzSpan) -> Self {
        let lower = inter.lower();
        let upper = inter.upper();
        if lower == upper {
            return Self::new_unchecked(
                vec![TInstant::new(self.value_at_contained(lower), lower)],
                true,
                true,
                self.interp,
            );
        }
        let mut out: Vec<TInstant<B>> = Vec::new();
        out.push(TInstant::new(self.value_at_contained(lower), lower));
        let from = self.instants.partition_point(|i| i.timestamp() <= lower);
        let to = self.instants.partition_point(|i| i.timestamp() < upper);
        out.extend_from_slice(&self.instants[from..to]);
        let end_value = if self.interp == TInterpolation::Stepwise
            && !inter.is_upper_inclusive()
        {
            self.held_value_before(upper)
        } else {
            self.value_at_contained(upper)
        };
        out.push(TInstant::new(end_value, upper));
        Self::new_unchecked(
            out,
            inter.is_lower_inclusive(),
            inter.is_upper_inclusive(),
            self.interp,
        )
    }

    pub fn at_period(&self, period: &TsTzSpan) -> Option<Self> {
        let inter = self.period().intersection(period)?;
        Some(self.sub_sequence(&inter))
    }

    pub fn minus_period(&self, period: &TsTzSpan) -> Option<TSequenceSet<B>> {
        let remaining = self.period().minus(period);
        let pieces: Vec<TSequence<B>> =
            remaining.iter().map(|span| self.sub_sequence(span)).collect();
        (!pieces.is_empty()).then(|| TSequenceSet::new_unchecked(pieces))
    }

    pub fn at_timestamp(&self, t: DateTime<Utc>) -> Option<TInstant<B>> {
        self.value_at_timestamp(t).map(|v| TInstant::new(v, t))
    }

    pub fn minus_timestamp(&self, t: DateTime<Utc>) -> Option<TSequenceSet<B>> {
        self.minus_period(&TsTzSpan::singleton(t))
    }

    pub fn at_timestamp_set(&self, set: &TsTzSet) -> Option<TInstantSet<B>> {
        let instants: Vec<TInstant<B>> = set
            .iter()
            .filter_map(|&t| self.at_timestamp(t))
            .collect();
        (!instants.is_empty()).then(|| TInstantSet::new_unchecked(instants))
    }

    pub fn minus_timestamp_set(&self, set: &TsTzSet) -> Option<TSequenceSet<B>> {
        self.minus_period_set(&set.to_span_set())
    }

    pub fn at_period_set(&self, periods: &TsTzSpanSet) -> Option<TSequenceSet<B>> {
        let own = self.period();
        let pieces: Vec<TSequence<B>> = periods
            .iter()
            .filter_map(|span| own.intersection(span))
            .map(|inter| self.sub_sequence(&inter))
            .collect();
        (!pieces.is_empty()).then(|| TSequenceSet::new_unchecked(pieces))
    }

    pub fn minus_period_set(&self, periods: &TsTzSpanSet) -> Option<TSequenceSet<B>> {
        let remaining = SpanSet::from_span(self.period()).minus(periods)?;
        let pieces: Vec<TSequence<B>> =
            remaining.iter().map(|span| self.sub_sequence(span)).collect();
        Some(TSequenceSet::new_unchecked(pieces))
    }

    /// Covered time where the sequence takes exactly `value`. Linear
    /// segments are solved analytically; interior hits become degenerate
    /// periods.
    fn value_spans(&self, value: &B) -> Vec<TsTzSpan> {
        let mut spans = Vec::new();
        if self.instants.len() == 1 {
            if self.instants[0].value() == value {
                spans.push(TsTzSpan::singleton(self.instants[0].timestamp()));
            }
            return spans;
        }
        for pair in self.instants.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            match self.interp {
                TInterpolation::Stepwise => {
                    if a.value() == value {
                        spans.push(
                            TsTzSpan::new(a.timestamp(), b.timestamp(), true, false)
                                .expect("ordered instants"),
                        );
                    }
                }
                TInterpolation::Linear => {
                    if a.value() == b.value() {
                        if a.value() == value {
                            spans.push(
                                TsTzSpan::new(a.timestamp(), b.timestamp(), true, true)
                                    .expect("ordered instants"),
                            );
                        }
                    } else if let Some(fraction) =
                        B::segment_at_value(a.value(), b.value(), value)
                    {
                        let t =
                            timestamp_at_fraction(a.timestamp(), b.timestamp(), fraction);
                        spans.push(TsTzSpan::singleton(t));
                    }
                }
            }
        }
        if self.end_instant().value() == value {
            spans.push(TsTzSpan::singleton(self.end_instant().timestamp()));
        }
        spans
    }

    pub fn at_value(&self, value: &B) -> Option<TSequenceSet<B>> {
        if !B::bbox_may_contain(&self.bbox, value) {
            return None;
        }
        let spans = self.value_spans(value);
        let set = TsTzSpanSet::new(spans, true).ok()?;
        self.at_period_set(&set)
    }

    pub fn minus_value(&self, value: &B) -> Option<TSequenceSet<B>> {
        match self.at_value(value) {
            None => self.at_period_set(&self.time()),
            Some(at) => self.minus_period_set(&at.time()),
        }
    }

    pub fn at_values(&self, values: &[B]) -> Option<TSequenceSet<B>> {
        let spans: Vec<TsTzSpan> =
            values.iter().flat_map(|v| self.value_spans(v)).collect();
        let set = TsTzSpanSet::new(spans, true).ok()?;
        self.at_period_set(&set)
    }

    pub fn minus_values(&self, values: &[B]) -> Option<TSequenceSet<B>> {
        match self.at_values(values) {
            None => self.at_period_set(&self.time()),
            Some(at) => self.minus_period_set(&at.time()),
        }
    }

    // ------------------------- Transformations ------------------------------

    /// Returns a new sequence with all timestamps shifted by `delta`.
    pub fn shift_time(&self, delta: chrono::TimeDelta) -> Self {
        let instants = self
            .instants
            .iter()
            .map(|i| TInstant::new(i.value().clone(), i.timestamp() + delta))
            .collect();
        Self::new_unchecked(instants, self.lower_inc, self.upper_inc, self.interp)
    }

    /// Appends an instant strictly after the current upper bound.
    pub fn append_instant(&self, instant: TInstant<B>) -> Result<Self> {
        if !self.upper_inc {
            return Err(Error::invalid(
                "cannot append to a sequence with an exclusive upper bound",
            ));
        }
        if instant.timestamp() <= self.end_instant().timestamp() {
            return Err(Error::invalid(
                "appended instant must be strictly after the sequence end",
            ));
        }
        let mut instants = self.instants.clone();
        instants.push(instant);
        Ok(Self::new_unchecked(instants, self.lower_inc, true, self.interp))
    }

    /// Stepwise to linear: every step becomes a constant linear segment,
    /// with jumps separating sequences.
    pub fn to_linear(&self) -> TSequenceSet<B> {
        debug_assert!(B::CONTINUOUS, "to_linear requires a continuous base type");
        if self.interp == TInterpolation::Linear {
            return TSequenceSet::new_unchecked(vec![self.clone()]);
        }
        if self.instants.len() == 1 {
            let single = Self::new_unchecked(
                self.instants.clone(),
                true,
                true,
                TInterpolation::Linear,
            );
            return TSequenceSet::new_unchecked(vec![single]);
        }
        let mut sequences = Vec::new();
        let n = self.instants.len();
        for (i, pair) in self.instants.windows(2).enumerate() {
            let (a, b) = (&pair[0], &pair[1]);
            let last = i + 2 == n;
            let closes = last && self.upper_inc && b.value() == a.value();
            sequences.push(Self::new_unchecked(
                vec![
                    TInstant::new(a.value().clone(), a.timestamp()),
                    TInstant::new(a.value().clone(), b.timestamp()),
                ],
                if i == 0 { self.lower_inc } else { true },
                closes,
                TInterpolation::Linear,
            ));
            if last && self.upper_inc && b.value() != a.value() {
                sequences.push(Self::new_unchecked(
                    vec![b.clone()],
                    true,
                    true,
                    TInterpolation::Linear,
                ));
            }
        }
        TSequenceSet::new(sequences, true)
            .expect("step segments are ordered and disjoint")
    }

    pub fn ever_eq(&self, value: &B) -> bool {
        if !B::bbox_may_contain(&self.bbox, value) {
            return false;
        }
        match self.interp {
            TInterpolation::Stepwise => self.instants.iter().any(|i| i.value() == value),
            TInterpolation::Linear => {
                !self.value_spans(value).is_empty() && self.at_value(value).is_some()
            }
        }
    }

    pub fn always_eq(&self, value: &B) -> bool {
        self.instants.iter().all(|i| i.value() == value)
    }
}

impl<B: BaseType + PartialOrd> TSequence<B> {
    /// Greatest lower bound of the attained values and whether it is
    /// attained. Under linear interpolation a bound instant on an exclusive
    /// side only witnesses a limit.
    fn min_spread(&self) -> (&B, bool) {
        self.extremum(|a, b| a < b)
    }

    fn max_spread(&self) -> (&B, bool) {
        self.extremum(|a, b| a > b)
    }

    fn extremum(&self, better: impl Fn(&B, &B) -> bool) -> (&B, bool) {
        let n = self.instants.len();
        let mut best = self.instants[0].value();
        for inst in &self.instants[1..] {
            if better(inst.value(), best) {
                best = inst.value();
            }
        }
        let attained = self.interp == TInterpolation::Stepwise
            || self.instants.iter().enumerate().any(|(i, inst)| {
                inst.value() == best
                    && (i > 0 || self.lower_inc)
                    && (i < n - 1 || self.upper_inc)
            });
        (best, attained)
    }

    pub fn min_value(&self) -> B {
        self.min_spread().0.clone()
    }

    pub fn max_value(&self) -> B {
        self.max_spread().0.clone()
    }

    /// First instant carrying the minimum stored value.
    pub fn min_instant(&self) -> &TInstant<B> {
        self.instants
            .iter()
            .reduce(|best, i| if i.value() < best.value() { i } else { best })
            .expect("sequences are non-empty")
    }

    pub fn max_instant(&self) -> &TInstant<B> {
        self.instants
            .iter()
            .reduce(|best, i| if i.value() > best.value() { i } else { best })
            .expect("sequences are non-empty")
    }

    pub fn at_min(&self) -> Option<TSequenceSet<B>> {
        self.at_value(&self.min_value())
    }

    pub fn at_max(&self) -> Option<TSequenceSet<B>> {
        self.at_value(&self.max_value())
    }

    pub fn ever_lt(&self, value: &B) -> bool {
        self.min_spread().0 < value
    }

    pub fn ever_le(&self, value: &B) -> bool {
        let (inf, attained) = self.min_spread();
        inf < value || (inf == value && attained)
    }

    pub fn always_lt(&self, value: &B) -> bool {
        let (sup, attained) = self.max_spread();
        sup < value || (sup == value && !attained)
    }

    pub fn always_le(&self, value: &B) -> bool {
        self.max_spread().0 <= value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn linear(values: &[(f64, i64)], lower_inc: bool, upper_inc: bool) -> TSequence<f64> {
        TSequence::new(
            values.iter().map(|&(v, t)| TInstant::new(v, ts(t))).collect(),
            lower_inc,
            upper_inc,
            TInterpolation::Linear,
            false,
        )
        .unwrap()
    }

    #[test]
    fn linear_value_at_timestamp_interpolates() {
        let seq = linear(&[(0.0, 0), (10.0, 10)], true, true);
        assert_eq!(seq.value_at_timestamp(ts(4)), Some(4.0));
        assert_eq!(seq.value_at_timestamp(ts(10)), Some(10.0));
        assert_eq!(seq.value_at_timestamp(ts(11)), None);
    }

    #[test]
    fn exclusive_bound_rules() {
        let seq = linear(&[(0.0, 0), (10.0, 10)], true, false);
        assert_eq!(seq.value_at_timestamp(ts(10)), None);
        assert_eq!(seq.value_at_timestamp_inclusive(ts(10)), Some(10.0));
    }

    #[test]
    fn stepwise_holds_value() {
        let seq = TSequence::new(
            vec![
                TInstant::new(1, ts(0)),
                TInstant::new(5, ts(10)),
                TInstant::new(5, ts(20)),
            ],
            true,
            false,
            TInterpolation::Stepwise,
            false,
        )
        .unwrap();
        assert_eq!(seq.value_at_timestamp(ts(9)), Some(1));
        assert_eq!(seq.value_at_timestamp(ts(10)), Some(5));
        let sub = seq.at_period(&(ts(0)..ts(5)).into()).unwrap();
        assert_eq!(sub.end_value(), &1);
    }

    #[test]
    fn stepwise_exclusive_upper_requires_repeated_value() {
        let bad = TSequence::new(
            vec![TInstant::new(1, ts(0)), TInstant::new(5, ts(10))],
            true,
            false,
            TInterpolation::Stepwise,
            false,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn at_value_emits_crossing_singletons() {
        let seq = linear(&[(-1.0, 0), (1.0, 10)], true, true);
        let at = seq.at_value(&0.0).unwrap();
        assert_eq!(at.num_sequences(), 1);
        let inst = at.sequence_n(0).unwrap().start_instant();
        assert_eq!(inst.timestamp(), ts(5));
        assert_eq!(*inst.value(), 0.0);
    }

    #[test]
    fn restriction_round_trip() {
        let seq = linear(&[(0.0, 0), (10.0, 10)], true, true);
        let period: TsTzSpan = (ts(2)..ts(6)).into();
        let at = seq.at_period(&period).unwrap();
        let minus = seq.minus_period(&period).unwrap();
        let mut covered = at.time();
        for span in minus.time().iter() {
            covered = covered.union_span(span);
        }
        assert_eq!(covered, seq.time());
    }

    #[test]
    fn ever_always_respect_exclusive_bounds() {
        let seq = linear(&[(0.0, 0), (10.0, 10)], true, false);
        assert!(seq.always_lt(&10.0));
        assert!(!seq.ever_eq(&10.0));
        assert!(seq.ever_eq(&0.0));
        assert!(seq.ever_le(&0.0));
        assert!(!seq.ever_lt(&0.0));
    }

    #[test]
    fn to_linear_splits_at_jumps() {
        let seq = TSequence::new(
            vec![
                TInstant::new(1.0, ts(0)),
                TInstant::new(2.0, ts(10)),
                TInstant::new(2.0, ts(20)),
            ],
            true,
            true,
            TInterpolation::Stepwise,
            false,
        )
        .unwrap();
        let linearized = seq.to_linear();
        assert_eq!(linearized.num_sequences(), 2);
        assert!(linearized.sequence_n(0).unwrap().always_eq(&1.0));
        assert!(linearized.sequence_n(1).unwrap().always_eq(&2.0));
    }
}
