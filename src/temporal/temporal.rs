use chrono::{DateTime, TimeDelta, Utc};
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
use crate::temporal::tsequence_set::TSequenceSet;

/// Time-structure of a temporal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TSubtype {
    Instant,
    InstantSet,
    Sequence,
    SequenceSet,
}

/// A temporal value of base type `B`: one of the four subtypes behind a
/// single dispatching surface.
///
/// Values are immutable; every operation returns a freshly owned value.
/// Restriction operators return `None` as the explicit empty marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Temporal<B: BaseType> {
    Instant(TInstant<B>),
    InstantSet(TInstantSet<B>),
    Sequence(TSequence<B>),
    SequenceSet(TSequenceSet<B>),
}

impl<B: BaseType> From<TInstant<B>> for Temporal<B> {
    fn from(value: TInstant<B>) -> Self {
        Temporal::Instant(value)
    }
}

impl<B: BaseType> From<TInstantSet<B>> for Temporal<B> {
    fn from(value: TInstantSet<B>) -> Self {
        if value.num_instants() == 1 {
            Temporal::Instant(value.into_instants().swap_remove(0))
        } else {
            Temporal::InstantSet(value)
        }
    }
}

impl<B: BaseType> From<TSequence<B>> for Temporal<B> {
    fn from(value: TSequence<B>) -> Self {
        Temporal::Sequence(value)
    }
}

impl<B: BaseType> From<TSequenceSet<B>> for Temporal<B> {
    fn from(value: TSequenceSet<B>) -> Self {
        if value.num_sequences() == 1 {
            Temporal::Sequence(value.into_sequences().swap_remove(0))
        } else {
            Temporal::SequenceSet(value)
        }
    }
}

impl<B: BaseType> Temporal<B> {
    pub fn subtype(&self) -> TSubtype {
        match self {
            Temporal::Instant(_) => TSubtype::Instant,
            Temporal::InstantSet(_) => TSubtype::InstantSet,
            Temporal::Sequence(_) => TSubtype::Sequence,
            Temporal::SequenceSet(_) => TSubtype::SequenceSet,
        }
    }

    /// An instant is trivially both; the default for its base type is
    /// reported.
    pub fn interpolation(&self) -> TInterpolation {
        match self {
            Temporal::Sequence(seq) => seq.interpolation(),
            Temporal::SequenceSet(set) => set.interpolation(),
            _ => {
                if B::CONTINUOUS {
                    TInterpolation::Linear
                } else {
                    TInterpolation::Stepwise
                }
            }
        }
    }

    pub fn bounding_box(&self) -> BBox {
        match self {
            Temporal::Instant(i) => i.bounding_box(),
            Temporal::InstantSet(s) => s.bounding_box().clone(),
            Temporal::Sequence(s) => s.bounding_box().clone(),
            Temporal::SequenceSet(s) => s.bounding_box().clone(),
        }
    }

    /// Bounding period.
    pub fn timespan(&self) -> TsTzSpan {
        match self {
            Temporal::Instant(i) => i.timespan(),
            Temporal::InstantSet(s) => s.timespan(),
            Temporal::Sequence(s) => s.period(),
            Temporal::SequenceSet(s) => s.timespan(),
        }
    }

    /// Exact covered time.
    pub fn time(&self) -> TsTzSpanSet {
        match self {
            Temporal::Instant(i) => TsTzSpanSet::from_span(i.timespan()),
            Temporal::InstantSet(s) => s.time(),
            Temporal::Sequence(s) => s.time(),
            Temporal::SequenceSet(s) => s.time(),
        }
    }

    /// Covered time without gaps; zero for instants.
    pub fn duration(&self) -> TimeDelta {
        match self {
            Temporal::Instant(_) | Temporal::InstantSet(_) => TimeDelta::zero(),
            Temporal::Sequence(s) => s.duration(),
            Temporal::SequenceSet(s) => s.duration(),
        }
    }

    pub fn num_instants(&self) -> usize {
        match self {
            Temporal::Instant(_) => 1,
            Temporal::InstantSet(s) => s.num_instants(),
            Temporal::Sequence(s) => s.num_instants(),
            Temporal::SequenceSet(s) => s.num_instants(),
        }
    }

    pub fn instants(&self) -> Vec<&TInstant<B>> {
        match self {
            Temporal::Instant(i) => vec![i],
            Temporal::InstantSet(s) => s.instants().iter().collect(),
            Temporal::Sequence(s) => s.instants().iter().collect(),
            Temporal::SequenceSet(s) => s.instants().collect(),
        }
    }

    pub fn instant_n(&self, n: usize) -> Option<&TInstant<B>> {
        self.instants().get(n).copied()
    }

    pub fn start_instant(&self) -> &TInstant<B> {
        match self {
            Temporal::Instant(i) => i,
            Temporal::InstantSet(s) => s.start_instant(),
            Temporal::Sequence(s) => s.start_instant(),
            Temporal::SequenceSet(s) => s.start_instant(),
        }
    }

    pub fn end_instant(&self) -> &TInstant<B> {
        match self {
            Temporal::Instant(i) => i,
            Temporal::InstantSet(s) => s.end_instant(),
            Temporal::Sequence(s) => s.end_instant(),
            Temporal::SequenceSet(s) => s.end_instant(),
        }
    }

    pub fn start_value(&self) -> &B {
        self.start_instant().value()
    }

    pub fn end_value(&self) -> &B {
        self.end_instant().value()
    }

    pub fn start_timestamp(&self) -> DateTime<Utc> {
        self.start_instant().timestamp()
    }

    pub fn end_timestamp(&self) -> DateTime<Utc> {
        self.end_instant().timestamp()
    }

    pub fn num_timestamps(&self) -> usize {
        self.num_instants()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.instants().iter().map(|i| i.timestamp()).collect()
    }

    pub fn timestamp_n(&self, n: usize) -> Option<DateTime<Utc>> {
        self.instants().get(n).map(|i| i.timestamp())
    }

    pub fn values(&self) -> Vec<B> {
        self.instants().iter().map(|i| i.value().clone()).collect()
    }

    /// Distinct values taken, in order of first appearance.
    pub fn distinct_values(&self) -> Vec<B> {
        let mut seen: Vec<B> = Vec::new();
        for inst in self.instants() {
            if !seen.contains(inst.value()) {
                seen.push(inst.value().clone());
            }
        }
        seen
    }

    /// Bound-exact value access: `None` in gaps and at exclusive bounds.
    pub fn value_at_timestamp(&self, t: DateTime<Utc>) -> Option<B> {
        match self {
            Temporal::Instant(i) => (i.timestamp() == t).then(|| i.value().clone()),
            Temporal::InstantSet(s) => s.value_at_timestamp(t),
            Temporal::Sequence(s) => s.value_at_timestamp(t),
            Temporal::SequenceSet(s) => s.value_at_timestamp(t),
        }
    }

    /// Closed-bound value access: an exclusive sequence bound answers with
    /// the bound instant's own value.
    pub fn value_at_timestamp_inclusive(&self, t: DateTime<Utc>) -> Option<B> {
        match self {
            Temporal::Sequence(s) => s.value_at_timestamp_inclusive(t),
            Temporal::SequenceSet(s) => s.value_at_timestamp_inclusive(t),
            _ => self.value_at_timestamp(t),
        }
    }

    // ------------------------- Restrictions ---------------------------------

    pub fn at_value(&self, value: &B) -> Option<Temporal<B>> {
        match self {
            Temporal::Instant(i) => i.at_value(value).map(Temporal::Instant),
            Temporal::InstantSet(s) => s.at_value(value).map(Temporal::from),
            Temporal::Sequence(s) => s.at_value(value).map(Temporal::from),
            Temporal::SequenceSet(s) => s.at_value(value).map(Temporal::from),
        }
    }

    pub fn minus_value(&self, value: &B) -> Option<Temporal<B>> {
        match self {
            Temporal::Instant(i) => i.minus_value(value).map(Temporal::Instant),
            Temporal::InstantSet(s) => s.minus_value(value).map(Temporal::from),
            Temporal::Sequence(s) => s.minus_value(value).map(Temporal::from),
            Temporal::SequenceSet(s) => s.minus_value(value).map(Temporal::from),
        }
    }

    pub fn at_values(&self, values: &[B]) -> Option<Temporal<B>> {
        match self {
            Temporal::Instant(i) => i.at_values(values).map(Temporal::Instant),
            Temporal::InstantSet(s) => s.at_values(values).map(Temporal::from),
            Temporal::Sequence(s) => s.at_values(values).map(Temporal::from),
            Temporal::SequenceSet(s) => s.at_values(values).map(Temporal::from),
        }
    }

    pub fn minus_values(&self, values: &[B]) -> Option<Temporal<B>> {
        match self {
            Temporal::Instant(i) => i.minus_values(values).map(Temporal::Instant),
            Temporal::InstantSet(s) => s.minus_values(values).map(Temporal::from),
            Temporal::Sequence(s) => s.minus_values(values).map(Temporal::from),
            Temporal::SequenceSet(s) => s.minus_values(values).map(Temporal::from),
        }
    }

    pub fn at_timestamp(&self, t: DateTime<Utc>) -> Option<Temporal<B>> {
        match self {
            Temporal::Instant(i) => i.at_timestamp(t).map(Temporal::Instant),
            Temporal::InstantSet(s) => s.at_timestamp(t).map(Temporal::Instant),
            Temporal::Sequence(s) => s.at_timestamp(t).map(Temporal::Instant),
            Temporal::SequenceSet(s) => s.at_timestamp(t).map(Temporal::Instant),
        }
    }

    pub fn minus_timestamp(&self, t: DateTime<Utc>) -> Option<Temporal<B>> {
        match self {
            Temporal::Instant(i) => i.minus_timestamp(t).map(Temporal::Instant),
            Temporal::InstantSet(s) => s.minus_timestamp(t).map(Temporal::from),
            Temporal::Sequence(s) => s.minus_timestamp(t).map(Temporal::from),
            Temporal::SequenceSet(s) => s.minus_timestamp(t).map(Temporal::from),
        }
    }

    pub fn at_timestamp_set(&self, set: &TsTzSet) -> Option<Temporal<B>> {
        match self {
            Temporal::Instant(i) => i.at_timestamp_set(set).map(Temporal::Instant),
            Temporal::InstantSet(s) => s.at_timestamp_set(set).map(Temporal::from),
            Temporal::Sequence(s) => s.at_timestamp_set(set).map(Temporal::from),
            Temporal::SequenceSet(s) => s.at_timestamp_set(set).map(Temporal::from),
        }
    }

    pub fn minus_timestamp_set(&self, set: &TsTzSet) -> Option<Temporal<B>> {
        match self {
            Temporal::Instant(i) => i.minus_timestamp_set(set).map(Temporal::Instant),
            Temporal::InstantSet(s) => s.minus_timestamp_set(set).map(Temporal::from),
            Temporal::Sequence(s) => s.minus_timestamp_set(set).map(Temporal::from),
            Temporal::SequenceSet(s) => s.minus_timestamp_set(set).map(Temporal::from),
        }
    }

    pub fn at_period(&self, period: &TsTzSpan) -> Option<Temporal<B>> {
        match self {
            Temporal::Instant(i) => i.at_period(period).map(Temporal::Instant),
            Temporal::InstantSet(s) => s.at_period(period).map(Temporal::from),
            Temporal::Sequence(s) => s.at_period(period).map(Temporal::from),
            Temporal::SequenceSet(s) => s.at_period(period).map(Temporal::from),
        }
    }

    pub fn minus_period(&self, period: &TsTzSpan) -> Option<Temporal<B>> {
        match self {
            Temporal::Instant(i) => i.minus_period(period).map(Temporal::Instant),
            Temporal::InstantSet(s) => s.minus_period(period).map(Temporal::from),
            Temporal::Sequence(s) => s.minus_period(period).map(Temporal::from),
            Temporal::SequenceSet(s) => s.minus_period(period).map(Temporal::from),
        }
    }

    pub fn at_period_set(&self, periods: &TsTzSpanSet) -> Option<Temporal<B>> {
        match self {
            Temporal::Instant(i) => i.at_period_set(periods).map(Temporal::Instant),
            Temporal::InstantSet(s) => s.at_period_set(periods).map(Temporal::from),
            Temporal::Sequence(s) => s.at_period_set(periods).map(Temporal::from),
            Temporal::SequenceSet(s) => s.at_period_set(periods).map(Temporal::from),
        }
    }

    pub fn minus_period_set(&self, periods: &TsTzSpanSet) -> Option<Temporal<B>> {
        match self {
            Temporal::Instant(i) => i.minus_period_set(periods).map(Temporal::Instant),
            Temporal::InstantSet(s) => s.minus_period_set(periods).map(Temporal::from),
            Temporal::Sequence(s) => s.minus_period_set(periods).map(Temporal::from),
            Temporal::SequenceSet(s) => s.minus_period_set(periods).map(Temporal::from),
        }
    }

    // ------------------------- Transformations ------------------------------

    pub fn shift_time(&self, delta: TimeDelta) -> Temporal<B> {
        match self {
            Temporal::Instant(i) => {
                Temporal::Instant(TInstant::new(i.value().clone(), i.timestamp() + delta))
            }
            Temporal::InstantSet(s) => Temporal::InstantSet(TInstantSet::new_unchecked(
                s.instants()
                    .iter()
                    .map(|i| TInstant::new(i.value().clone(), i.timestamp() + delta))
                    .collect(),
            )),
            Temporal::Sequence(s) => Temporal::Sequence(s.shift_time(delta)),
            Temporal::SequenceSet(s) => Temporal::SequenceSet(s.shift_time(delta)),
        }
    }

    pub fn to_instant(&self) -> Result<TInstant<B>> {
        let instants = self.instants();
        if instants.len() == 1 {
            Ok(instants[0].clone())
        } else {
            Err(Error::invalid("only an instantaneous value converts to an instant"))
        }
    }

    pub fn to_instant_set(&self) -> Result<TInstantSet<B>> {
        match self {
            Temporal::Instant(i) => Ok(TInstantSet::new_unchecked(vec![i.clone()])),
            Temporal::InstantSet(s) => Ok(s.clone()),
            _ => {
                let inst = self.to_instant()?;
                Ok(TInstantSet::new_unchecked(vec![inst]))
            }
        }
    }

    pub fn to_sequence(&self, interp: TInterpolation) -> Result<TSequence<B>> {
        match self {
            Temporal::Instant(i) => {
                TSequence::new(vec![i.clone()], true, true, interp, false)
            }
            Temporal::Sequence(s) => Ok(s.clone()),
            Temporal::SequenceSet(s) if s.num_sequences() == 1 => {
                Ok(s.start_sequence().clone())
            }
            _ => {
                let inst = self.to_instant()?;
                TSequence::new(vec![inst], true, true, interp, false)
            }
        }
    }

    pub fn to_sequence_set(&self, interp: TInterpolation) -> Result<TSequenceSet<B>> {
        match self {
            Temporal::Instant(_) => {
                Ok(TSequenceSet::from_sequence(self.to_sequence(interp)?))
            }
            Temporal::InstantSet(s) => {
                let sequences: Result<Vec<TSequence<B>>> = s
                    .instants()
                    .iter()
                    .map(|i| TSequence::new(vec![i.clone()], true, true, interp, false))
                    .collect();
                TSequenceSet::new(sequences?, false)
            }
            Temporal::Sequence(s) => Ok(TSequenceSet::from_sequence(s.clone())),
            Temporal::SequenceSet(s) => Ok(s.clone()),
        }
    }

    /// Appends an instant strictly after the end of the value.
    pub fn append_instant(&self, instant: TInstant<B>) -> Result<Temporal<B>> {
        match self {
            Temporal::Instant(i) => {
                if instant.timestamp() <= i.timestamp() {
                    return Err(Error::invalid(
                        "appended instant must be strictly after the value end",
                    ));
                }
                Ok(Temporal::InstantSet(TInstantSet::new_unchecked(vec![
                    i.clone(),
                    instant,
                ])))
            }
            Temporal::InstantSet(s) => {
                if instant.timestamp() <= s.end_instant().timestamp() {
                    return Err(Error::invalid(
                        "appended instant must be strictly after the value end",
                    ));
                }
                let mut instants = s.instants().to_vec();
                instants.push(instant);
                Ok(Temporal::InstantSet(TInstantSet::new_unchecked(instants)))
            }
            Temporal::Sequence(s) => Ok(Temporal::Sequence(s.append_instant(instant)?)),
            Temporal::SequenceSet(s) => {
                let mut sequences = s.sequences().to_vec();
                let last = sequences.len() - 1;
                sequences[last] = sequences[last].append_instant(instant)?;
                Ok(Temporal::SequenceSet(TSequenceSet::new_unchecked(sequences)))
            }
        }
    }

    /// Stepwise to linear: every step becomes a constant linear segment,
    /// with jumps separating sequences. Instants are unchanged.
    pub fn to_linear(&self) -> Temporal<B> {
        match self {
            Temporal::Sequence(s) => Temporal::from(s.to_linear()),
            Temporal::SequenceSet(s) => Temporal::from(s.to_linear()),
            other => other.clone(),
        }
    }

    /// Domain-disjoint merge of temporal values into the minimal subtype
    /// covering all parts.
    ///
    /// Parts sharing a timestamp must agree on the value there; overlapping
    /// sequence parts are rejected.
    pub fn merge(&self, other: &Temporal<B>) -> Result<Temporal<B>> {
        Temporal::merge_many(&[self, other])
    }

    pub fn merge_many(parts: &[&Temporal<B>]) -> Result<Temporal<B>> {
        if parts.is_empty() {
            return Err(Error::invalid("merge requires at least one value"));
        }
        let discrete_only = parts
            .iter()
            .all(|p| matches!(p, Temporal::Instant(_) | Temporal::InstantSet(_)));
        if discrete_only {
            let mut instants: Vec<TInstant<B>> = parts
                .iter()
                .flat_map(|p| p.instants().into_iter().cloned())
                .collect();
            instants.sort_by_key(TInstant::timestamp);
            let mut merged: Vec<TInstant<B>> = Vec::with_capacity(instants.len());
            for inst in instants {
                match merged.last() {
                    Some(last) if last.timestamp() == inst.timestamp() => {
                        if last.value() != inst.value() {
                            return Err(Error::invalid(
                                "merge parts disagree at a shared timestamp",
                            ));
                        }
                    }
                    _ => merged.push(inst),
                }
            }
            return Ok(Temporal::from(TInstantSet::new_unchecked(merged)));
        }
        // Promote everything to sequences and let set normalization join
        // the seams.
        let interp = parts
            .iter()
            .find_map(|p| match p {
                Temporal::Sequence(s) => Some(s.interpolation()),
                Temporal::SequenceSet(s) => Some(s.interpolation()),
                _ => None,
            })
            .unwrap_or(TInterpolation::Stepwise);
        let mut sequences: Vec<TSequence<B>> = Vec::new();
        for part in parts {
            sequences.extend(part.to_sequence_set(interp)?.into_sequences());
        }
        sequences.sort_by(|a, b| a.period().compare(&b.period()));
        Ok(Temporal::from(TSequenceSet::new(sequences, true)?))
    }

    pub fn ever_eq(&self, value: &B) -> bool {
        match self {
            Temporal::Instant(i) => i.ever_eq(value),
            Temporal::InstantSet(s) => s.ever_eq(value),
            Temporal::Sequence(s) => s.ever_eq(value),
            Temporal::SequenceSet(s) => s.ever_eq(value),
        }
    }

    pub fn always_eq(&self, value: &B) -> bool {
        match self {
            Temporal::Instant(i) => i.always_eq(value),
            Temporal::InstantSet(s) => s.always_eq(value),
            Temporal::Sequence(s) => s.always_eq(value),
            Temporal::SequenceSet(s) => s.always_eq(value),
        }
    }
}

impl<B: BaseType + PartialOrd> Temporal<B> {
    pub fn min_value(&self) -> B {
        match self {
            Temporal::Instant(i) => i.value().clone(),
            Temporal::InstantSet(s) => s.min_value(),
            Temporal::Sequence(s) => s.min_value(),
            Temporal::SequenceSet(s) => s.min_value(),
        }
    }

    pub fn max_value(&self) -> B {
        match self {
            Temporal::Instant(i) => i.value().clone(),
            Temporal::InstantSet(s) => s.max_value(),
            Temporal::Sequence(s) => s.max_value(),
            Temporal::SequenceSet(s) => s.max_value(),
        }
    }

    pub fn min_instant(&self) -> &TInstant<B> {
        match self {
            Temporal::Instant(i) => i,
            Temporal::InstantSet(s) => s.min_instant(),
            Temporal::Sequence(s) => s.min_instant(),
            Temporal::SequenceSet(s) => s.min_instant(),
        }
    }

    pub fn max_instant(&self) -> &TInstant<B> {
        match self {
            Temporal::Instant(i) => i,
            Temporal::InstantSet(s) => s.max_instant(),
            Temporal::Sequence(s) => s.max_instant(),
            Temporal::SequenceSet(s) => s.max_instant(),
        }
    }

    pub fn at_min(&self) -> Option<Temporal<B>> {
        self.at_value(&self.min_value())
    }

    pub fn at_max(&self) -> Option<Temporal<B>> {
        self.at_value(&self.max_value())
    }

    pub fn ever_lt(&self, value: &B) -> bool {
        match self {
            Temporal::Instant(i) => i.ever_lt(value),
            Temporal::InstantSet(s) => s.ever_lt(value),
            Temporal::Sequence(s) => s.ever_lt(value),
            Temporal::SequenceSet(s) => s.ever_lt(value),
        }
    }

    pub fn ever_le(&self, value: &B) -> bool {
        match self {
            Temporal::Instant(i) => i.ever_le(value),
            Temporal::InstantSet(s) => s.ever_le(value),
            Temporal::Sequence(s) => s.ever_le(value),
            Temporal::SequenceSet(s) => s.ever_le(value),
        }
    }

    pub fn always_lt(&self, value: &B) -> bool {
        match self {
            Temporal::Instant(i) => i.ever_lt(value),
            Temporal::InstantSet(s) => s.always_lt(value),
            Temporal::Sequence(s) => s.always_lt(value),
            Temporal::SequenceSet(s) => s.always_lt(value),
        }
    }

    pub fn always_le(&self, value: &B) -> bool {
        match self {
            Temporal::Instant(i) => i.ever_le(value),
            Temporal::InstantSet(s) => s.always_le(value),
            Temporal::Sequence(s) => s.always_le(value),
            Temporal::SequenceSet(s) => s.always_le(value),
        }
    }
}
