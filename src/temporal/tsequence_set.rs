use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collections::datetime::tstz_span::TsTzSpan;
use crate::collections::datetime::tstz_span_set::TsTzSpanSet;
use crate::collections::datetime::tstz_set::TsTzSet;
use crate::errors::{Error, Result};
use crate::temporal::base::{BBox, BaseType};
use crate::temporal::interpolation::TInterpolation;
use crate::temporal::tinstant::TInstant;
use crate::temporal::tinstant_set::TInstantSet;
use crate::temporal::tsequence::TSequence;

/// An ordered set of sequences over pairwise disjoint, non-mergeable
/// periods, all sharing one interpolation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TSequenceSet<B: BaseType> {
    sequences: Vec<TSequence<B>>,
    bbox: BBox,
}

impl<B: BaseType> TSequenceSet<B> {
    /// Builds a sequence set. The members must be time-ordered and
    /// disjoint; with `normalize`, members that touch with matching values
    /// are joined.
    pub fn new(sequences: Vec<TSequence<B>>, normalize: bool) -> Result<Self> {
        if sequences.is_empty() {
            return Err(Error::invalid("a sequence set requires at least one sequence"));
        }
        for pair in sequences.windows(2) {
            if !pair[0].period().is_left(&pair[1].period()) {
                return Err(Error::invalid(
                    "sequence set members must be time-ordered and disjoint",
                ));
            }
            if pair[0].interpolation() != pair[1].interpolation() {
                return Err(Error::invalid(
                    "sequence set members must share one interpolation",
                ));
            }
        }
        let sequences = if normalize {
            Self::normalized(sequences)
        } else {
            sequences
        };
        Ok(Self::new_unchecked(sequences))
    }

    pub(crate) fn new_unchecked(sequences: Vec<TSequence<B>>) -> Self {
        debug_assert!(!sequences.is_empty());
        let mut bbox = sequences[0].bounding_box().clone();
        for seq in &sequences[1..] {
            bbox.expand(seq.bounding_box());
        }
        Self { sequences, bbox }
    }

    pub fn from_sequence(sequence: TSequence<B>) -> Self {
        Self::new_unchecked(vec![sequence])
    }

    /// Joins neighbours that touch and agree at the joint.
    pub(crate) fn normalized(sequences: Vec<TSequence<B>>) -> Vec<TSequence<B>> {
        let mut result: Vec<TSequence<B>> = Vec::with_capacity(sequences.len());
        for seq in sequences {
            match result.last() {
                Some(prev) if can_join(prev, &seq) => {
                    let prev = result.pop().expect("just matched");
                    result.push(join(&prev, &seq));
                }
                _ => result.push(seq),
            }
        }
        result
    }

    // ------------------------- Accessors ------------------------------------

    pub fn num_sequences(&self) -> usize {
        self.sequences.len()
    }

    pub fn sequence_n(&self, n: usize) -> Option<&TSequence<B>> {
        self.sequences.get(n)
    }

    pub fn sequences(&self) -> &[TSequence<B>] {
        &self.sequences
    }

    pub fn into_sequences(self) -> Vec<TSequence<B>> {
        self.sequences
    }

    pub fn start_sequence(&self) -> &TSequence<B> {
        &self.sequences[0]
    }

    pub fn end_sequence(&self) -> &TSequence<B> {
        &self.sequences[self.sequences.len() - 1]
    }

    /// Total number of instants across members.
    pub fn num_instants(&self) -> usize {
        self.sequences.iter().map(TSequence::num_instants).sum()
    }

    pub fn instants(&self) -> impl Iterator<Item = &TInstant<B>> {
        self.sequences.iter().flat_map(|s| s.instants().iter())
    }

    pub fn start_instant(&self) -> &TInstant<B> {
        self.start_sequence().start_instant()
    }

    pub fn end_instant(&self) -> &TInstant<B> {
        self.end_sequence().end_instant()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.instants().map(TInstant::timestamp).collect()
    }

    pub fn values(&self) -> Vec<B> {
        self.instants().map(|i| i.value().clone()).collect()
    }

    pub fn interpolation(&self) -> TInterpolation {
        self.sequences[0].interpolation()
    }

    pub fn bounding_box(&self) -> &BBox {
        &self.bbox
    }

    /// Bounding period from the first lower bound to the last upper bound.
    pub fn timespan(&self) -> TsTzSpan {
        let first = self.start_sequence().period();
        let last = self.end_sequence().period();
        TsTzSpan::new(
            first.lower(),
            last.upper(),
            first.is_lower_inclusive(),
            last.is_upper_inclusive(),
        )
        .expect("sequence set members are ordered")
    }

    /// Covered time with gaps.
    pub fn time(&self) -> TsTzSpanSet {
        TsTzSpanSet::new(self.sequences.iter().map(|s| s.period()).collect(), true)
            .expect("sequence sets are non-empty")
    }

    pub fn duration(&self) -> chrono::TimeDelta {
        self.sequences
            .iter()
            .fold(chrono::TimeDelta::zero(), |acc, s| acc + s.duration())
    }

    // ------------------------- Value access ---------------------------------

    fn find_sequence(&self, t: DateTime<Utc>) -> Option<&TSequence<B>> {
        let idx = self
            .sequences
            .partition_point(|s| s.period().is_left(&TsTzSpan::singleton(t)));
        let seq = self.sequences.get(idx)?;
        seq.period().contains_value(&t).then_some(seq)
    }

    /// Bound-exact value access; `None` in gaps and at exclusive bounds.
    pub fn value_at_timestamp(&self, t: DateTime<Utc>) -> Option<B> {
        self.find_sequence(t).map(|s| s.value_at_contained(t))
    }

    /// Closed-bound value access: an exclusive member bound returns the
    /// bound instant's own value.
    pub fn value_at_timestamp_inclusive(&self, t: DateTime<Utc>) -> Option<B> {
        let idx = self
            .sequences
            .partition_point(|s| s.end_instant().timestamp() < t);
        let seq = self.sequences.get(idx)?;
        seq.value_at_timestamp_inclusive(t)
    }

    // ------------------------- Restrictions ---------------------------------

    fn collect(pieces: Vec<TSequence<B>>) -> Option<Self> {
        (!pieces.is_empty()).then(|| Self::new_unchecked(pieces))
    }

    pub fn at_period(&self, period: &TsTzSpan) -> Option<Self> {
        let pieces: Vec<TSequence<B>> = self
            .sequences
            .iter()
            .filter_map(|s| s.at_period(period))
            .collect();
        Self::collect(pieces)
    }

    pub fn minus_period(&self, period: &TsTzSpan) -> Option<Self> {
        let pieces: Vec<TSequence<B>> = self
            .sequences
            .iter()
            .filter_map(|s| s.minus_period(period))
            .flat_map(TSequenceSet::into_sequences)
            .collect();
        Self::collect(pieces)
    }

    pub fn at_period_set(&self, periods: &TsTzSpanSet) -> Option<Self> {
        let pieces: Vec<TSequence<B>> = self
            .sequences
            .iter()
            .filter_map(|s| s.at_period_set(periods))
            .flat_map(TSequenceSet::into_sequences)
            .collect();
        Self::collect(pieces)
    }

    pub fn minus_period_set(&self, periods: &TsTzSpanSet) -> Option<Self> {
        let pieces: Vec<TSequence<B>> = self
            .sequences
            .iter()
            .filter_map(|s| s.minus_period_set(periods))
            .flat_map(TSequenceSet::into_sequences)
            .collect();
        Self::collect(pieces)
    }

    pub fn at_timestamp(&self, t: DateTime<Utc>) -> Option<TInstant<B>> {
        self.value_at_timestamp(t).map(|v| TInstant::new(v, t))
    }

    pub fn minus_timestamp(&self, t: DateTime<Utc>) -> Option<Self> {
        self.minus_period(&TsTzSpan::singleton(t))
    }

    pub fn at_timestamp_set(&self, set: &TsTzSet) -> Option<TInstantSet<B>> {
        let instants: Vec<TInstant<B>> =
            set.iter().filter_map(|&t| self.at_timestamp(t)).collect();
        (!instants.is_empty()).then(|| TInstantSet::new_unchecked(instants))
    }

    pub fn minus_timestamp_set(&self, set: &TsTzSet) -> Option<Self> {
        self.minus_period_set(&set.to_span_set())
    }

    pub fn at_value(&self, value: &B) -> Option<Self> {
        if !B::bbox_may_contain(&self.bbox, value) {
            return None;
        }
        let pieces: Vec<TSequence<B>> = self
            .sequences
            .iter()
            .filter_map(|s| s.at_value(value))
            .flat_map(TSequenceSet::into_sequences)
            .collect();
        Self::collect(pieces)
    }

    pub fn minus_value(&self, value: &B) -> Option<Self> {
        let pieces: Vec<TSequence<B>> = self
            .sequences
            .iter()
            .filter_map(|s| s.minus_value(value))
            .flat_map(TSequenceSet::into_sequences)
            .collect();
        Self::collect(pieces)
    }

    pub fn at_values(&self, values: &[B]) -> Option<Self> {
        let pieces: Vec<TSequence<B>> = self
            .sequences
            .iter()
            .filter_map(|s| s.at_values(values))
            .flat_map(TSequenceSet::into_sequences)
            .collect();
        Self::collect(pieces)
    }

    pub fn minus_values(&self, values: &[B]) -> Option<Self> {
        let pieces: Vec<TSequence<B>> = self
            .sequences
            .iter()
            .filter_map(|s| s.minus_values(values))
            .flat_map(TSequenceSet::into_sequences)
            .collect();
        Self::collect(pieces)
    }

    // ------------------------- Transformations ------------------------------

    pub fn shift_time(&self, delta: chrono::TimeDelta) -> Self {
        Self::new_unchecked(self.sequences.iter().map(|s| s.shift_time(delta)).collect())
    }

    pub fn ever_eq(&self, value: &B) -> bool {
        B::bbox_may_contain(&self.bbox, value)
            && self.sequences.iter().any(|s| s.ever_eq(value))
    }

    pub fn always_eq(&self, value: &B) -> bool {
        self.sequences.iter().all(|s| s.always_eq(value))
    }

    /// Stepwise to linear, member by member.
    pub fn to_linear(&self) -> Self {
        let pieces: Vec<TSequence<B>> = self
            .sequences
            .iter()
            .flat_map(|s| s.to_linear().into_sequences())
            .collect();
        Self::new_unchecked(pieces)
    }
}

impl<B: BaseType + PartialOrd> TSequenceSet<B> {
    pub fn min_value(&self) -> B {
        self.sequences
            .iter()
            .map(TSequence::min_value)
            .reduce(|a, b| if b < a { b } else { a })
            .expect("sequence sets are non-empty")
    }

    pub fn max_value(&self) -> B {
        self.sequences
            .iter()
            .map(TSequence::max_value)
            .reduce(|a, b| if b > a { b } else { a })
            .expect("sequence sets are non-empty")
    }

    pub fn min_instant(&self) -> &TInstant<B> {
        self.sequences
            .iter()
            .map(TSequence::min_instant)
            .reduce(|best, i| if i.value() < best.value() { i } else { best })
            .expect("sequence sets are non-empty")
    }

    pub fn max_instant(&self) -> &TInstant<B> {
        self.sequences
            .iter()
            .map(TSequence::max_instant)
            .reduce(|best, i| if i.value() > best.value() { i } else { best })
            .expect("sequence sets are non-empty")
    }

    pub fn at_min(&self) -> Option<Self> {
        self.at_value(&self.min_value())
    }

    pub fn at_max(&self) -> Option<Self> {
        self.at_value(&self.max_value())
    }

    pub fn ever_lt(&self, value: &B) -> bool {
        self.sequences.iter().any(|s| s.ever_lt(value))
    }

    pub fn ever_le(&self, value: &B) -> bool {
        self.sequences.iter().any(|s| s.ever_le(value))
    }

    pub fn always_lt(&self, value: &B) -> bool {
        self.sequences.iter().all(|s| s.always_lt(value))
    }

    pub fn always_le(&self, value: &B) -> bool {
        self.sequences.iter().all(|s| s.always_le(value))
    }
}

/// Whether two neighbouring sequences can be joined into one.
///
/// They must touch at a single shared bound. Under stepwise interpolation an
/// inclusive right lower bound always joins (jumps are native to steps);
/// otherwise the joint values must agree.
pub(crate) fn can_join<B: BaseType>(prev: &TSequence<B>, next: &TSequence<B>) -> bool {
    if prev.interpolation() != next.interpolation() {
        return false;
    }
    let p = prev.period();
    let n = next.period();
    if p.upper() != n.lower() || !p.is_adjacent(&n) {
        return false;
    }
    match prev.interpolation() {
        TInterpolation::Stepwise if n.is_lower_inclusive() => true,
        _ => prev.end_value() == next.start_value(),
    }
}

/// Joins two joinable sequences; the shared timestamp keeps the right-hand
/// instant, and the seam instants are re-normalized.
pub(crate) fn join<B: BaseType>(prev: &TSequence<B>, next: &TSequence<B>) -> TSequence<B> {
    debug_assert!(can_join(prev, next));
    let mut instants: Vec<TInstant<B>> = prev.instants().to_vec();
    if instants[instants.len() - 1].timestamp() == next.start_instant().timestamp() {
        instants.pop();
    }
    instants.extend_from_slice(next.instants());
    TSequence::new_unchecked(
        TSequence::normalized(instants, prev.interpolation()),
        prev.is_lower_inclusive(),
        next.is_upper_inclusive(),
        prev.interpolation(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn step_seq(values: &[(i32, i64)], lower_inc: bool, upper_inc: bool) -> TSequence<i32> {
        TSequence::new(
            values.iter().map(|&(v, t)| TInstant::new(v, ts(t))).collect(),
            lower_inc,
            upper_inc,
            TInterpolation::Stepwise,
            false,
        )
        .unwrap()
    }

    #[test]
    fn normalization_joins_step_jumps() {
        // [3@0, 3@3) + [4@3, 5@4] joins into [3@0, 4@3, 5@4].
        let a = step_seq(&[(3, 0), (3, 3)], true, false);
        let b = step_seq(&[(4, 3), (5, 4)], true, true);
        let set = TSequenceSet::new(vec![a, b], true).unwrap();
        assert_eq!(set.num_sequences(), 1);
        assert_eq!(set.value_at_timestamp(ts(2)), Some(3));
        assert_eq!(set.value_at_timestamp(ts(3)), Some(4));
        assert_eq!(set.value_at_timestamp(ts(4)), Some(5));
    }

    #[test]
    fn gap_point_blocks_joining() {
        let a = step_seq(&[(3, 0), (3, 3)], true, false);
        let b = step_seq(&[(4, 3), (5, 4)], false, true);
        let set = TSequenceSet::new(vec![a, b], true).unwrap();
        // nothing covers t = 3 itself
        assert_eq!(set.num_sequences(), 2);
        assert_eq!(set.value_at_timestamp(ts(3)), None);
    }

    #[test]
    fn overlap_is_rejected() {
        let a = step_seq(&[(1, 0), (1, 5)], true, true);
        let b = step_seq(&[(2, 5), (2, 9)], true, true);
        assert!(TSequenceSet::new(vec![a, b], false).is_err());
    }

    #[test]
    fn value_access_in_gaps() {
        let a = step_seq(&[(1, 0), (1, 5)], true, false);
        let b = step_seq(&[(2, 10), (2, 15)], true, true);
        let set = TSequenceSet::new(vec![a, b], false).unwrap();
        assert_eq!(set.value_at_timestamp(ts(7)), None);
        assert_eq!(set.value_at_timestamp(ts(5)), None);
        assert_eq!(set.value_at_timestamp_inclusive(ts(5)), Some(1));
        assert_eq!(set.duration(), chrono::TimeDelta::seconds(10));
    }
}
