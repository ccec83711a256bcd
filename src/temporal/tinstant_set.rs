use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collections::base::span::Span;
use crate::collections::datetime::tstz_span::TsTzSpan;
use crate::collections::datetime::tstz_span_set::TsTzSpanSet;
use crate::collections::datetime::tstz_set::TsTzSet;
use crate::errors::{Error, Result};
use crate::temporal::base::{BBox, BaseType};
use crate::temporal::tinstant::TInstant;

/// An ordered set of instants at pairwise distinct timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TInstantSet<B: BaseType> {
    instants: Vec<TInstant<B>>,
    bbox: BBox,
}

impl<B: BaseType> TInstantSet<B> {
    /// Builds an instant set. The input must be non-empty with strictly
    /// increasing timestamps.
    pub fn new(instants: Vec<TInstant<B>>) -> Result<Self> {
        if instants.is_empty() {
            return Err(Error::invalid("an instant set requires at least one instant"));
        }
        for pair in instants.windows(2) {
            if pair[0].timestamp() >= pair[1].timestamp() {
                return Err(Error::invalid(
                    "instant set timestamps must be strictly increasing",
                ));
            }
        }
        Ok(Self::new_unchecked(instants))
    }

    pub(crate) fn new_unchecked(instants: Vec<TInstant<B>>) -> Self {
        debug_assert!(!instants.is_empty());
        let mut bbox = instants[0].bounding_box();
        for inst in &instants[1..] {
            bbox.expand(&inst.bounding_box());
        }
        Self { instants, bbox }
    }

    pub fn num_instants(&self) -> usize {
        self.instants.len()
    }

    pub fn instant_n(&self, n: usize) -> Option<&TInstant<B>> {
        self.instants.get(n)
    }

    pub fn instants(&self) -> &[TInstant<B>] {
        &self.instants
    }

    pub fn into_instants(self) -> Vec<TInstant<B>> {
        self.instants
    }

    pub fn start_instant(&self) -> &TInstant<B> {
        &self.instants[0]
    }

    pub fn end_instant(&self) -> &TInstant<B> {
        &self.instants[self.instants.len() - 1]
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.instants.iter().map(TInstant::timestamp).collect()
    }

    pub fn values(&self) -> Vec<B> {
        self.instants.iter().map(|i| i.value().clone()).collect()
    }

    pub fn bounding_box(&self) -> &BBox {
        &self.bbox
    }

    /// Bounding period `[first, last]`, both bounds inclusive.
    pub fn timespan(&self) -> TsTzSpan {
        TsTzSpan::new(
            self.start_instant().timestamp(),
            self.end_instant().timestamp(),
            true,
            true,
        )
        .expect("instant timestamps are ordered")
    }

    /// Covered time: one degenerate period per instant.
    pub fn time(&self) -> TsTzSpanSet {
        TsTzSpanSet::new(
            self.instants.iter().map(|i| Span::singleton(i.timestamp())).collect(),
            false,
        )
        .expect("distinct timestamps yield disjoint singletons")
    }

    /// Value at `t`, defined only exactly at member timestamps.
    pub fn value_at_timestamp(&self, t: DateTime<Utc>) -> Option<B> {
        self.find(t).map(|idx| self.instants[idx].value().clone())
    }

    fn find(&self, t: DateTime<Utc>) -> Option<usize> {
        self.instants
            .binary_search_by(|inst| inst.timestamp().cmp(&t))
            .ok()
    }

    fn filtered(&self, keep: impl Fn(&TInstant<B>) -> bool) -> Option<Self> {
        let kept: Vec<TInstant<B>> =
            self.instants.iter().filter(|i| keep(i)).cloned().collect();
        (!kept.is_empty()).then(|| Self::new_unchecked(kept))
    }

    // ------------------------- Restrictions ---------------------------------

    pub fn at_value(&self, value: &B) -> Option<Self> {
        if !B::bbox_may_contain(&self.bbox, value) {
            return None;
        }
        self.filtered(|i| i.value() == value)
    }

    pub fn minus_value(&self, value: &B) -> Option<Self> {
        self.filtered(|i| i.value() != value)
    }

    pub fn at_values(&self, values: &[B]) -> Option<Self> {
        self.filtered(|i| values.contains(i.value()))
    }

    pub fn minus_values(&self, values: &[B]) -> Option<Self> {
        self.filtered(|i| !values.contains(i.value()))
    }

    pub fn at_timestamp(&self, t: DateTime<Utc>) -> Option<TInstant<B>> {
        self.find(t).map(|idx| self.instants[idx].clone())
    }

    pub fn minus_timestamp(&self, t: DateTime<Utc>) -> Option<Self> {
        self.filtered(|i| i.timestamp() != t)
    }

    pub fn at_timestamp_set(&self, set: &TsTzSet) -> Option<Self> {
        self.filtered(|i| set.contains_value(&i.timestamp()))
    }

    pub fn minus_timestamp_set(&self, set: &TsTzSet) -> Option<Self> {
        self.filtered(|i| !set.contains_value(&i.timestamp()))
    }

    pub fn at_period(&self, period: &TsTzSpan) -> Option<Self> {
        self.filtered(|i| period.contains_value(&i.timestamp()))
    }

    pub fn minus_period(&self, period: &TsTzSpan) -> Option<Self> {
        self.filtered(|i| !period.contains_value(&i.timestamp()))
    }

    pub fn at_period_set(&self, periods: &TsTzSpanSet) -> Option<Self> {
        self.filtered(|i| periods.contains_value(&i.timestamp()))
    }

    pub fn minus_period_set(&self, periods: &TsTzSpanSet) -> Option<Self> {
        self.filtered(|i| !periods.contains_value(&i.timestamp()))
    }

    pub fn ever_eq(&self, value: &B) -> bool {
        B::bbox_may_contain(&self.bbox, value)
            && self.instants.iter().any(|i| i.value() == value)
    }

    pub fn always_eq(&self, value: &B) -> bool {
        self.instants.iter().all(|i| i.value() == value)
    }
}

impl<B: BaseType + PartialOrd> TInstantSet<B> {
    pub fn min_value(&self) -> B {
        self.min_instant().value().clone()
    }

    pub fn max_value(&self) -> B {
        self.max_instant().value().clone()
    }

    /// First instant carrying the minimum value.
    pub fn min_instant(&self) -> &TInstant<B> {
        self.instants
            .iter()
            .reduce(|best, i| if i.value() < best.value() { i } else { best })
            .expect("instant sets are non-empty")
    }

    pub fn max_instant(&self) -> &TInstant<B> {
        self.instants
            .iter()
            .reduce(|best, i| if i.value() > best.value() { i } else { best })
            .expect("instant sets are non-empty")
    }

    pub fn at_min(&self) -> Option<Self> {
        self.at_value(&self.min_value())
    }

    pub fn at_max(&self) -> Option<Self> {
        self.at_value(&self.max_value())
    }

    pub fn ever_lt(&self, value: &B) -> bool {
        self.instants.iter().any(|i| i.value() < value)
    }

    pub fn ever_le(&self, value: &B) -> bool {
        self.instants.iter().any(|i| i.value() <= value)
    }

    pub fn always_lt(&self, value: &B) -> bool {
        self.instants.iter().all(|i| i.value() < value)
    }

    pub fn always_le(&self, value: &B) -> bool {
        self.instants.iter().all(|i| i.value() <= value)
    }
}
