use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::boxes::BoundingBox;
use crate::collections::datetime::tstz_span::TsTzSpan;
use crate::collections::number::float_span::FloatSpan;

/// Bounding box of a temporal number: an optional value range crossed with
/// an optional time period. A missing dimension never constrains a
/// predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TBox {
    value: Option<FloatSpan>,
    time: Option<TsTzSpan>,
}

impl TBox {
    pub fn new(value: Option<FloatSpan>, time: Option<TsTzSpan>) -> Self {
        Self { value, time }
    }

    /// Degenerate box around a single number.
    pub fn from_value(value: f64) -> Self {
        Self { value: Some(FloatSpan::singleton(value)), time: None }
    }

    pub fn from_value_span(value: FloatSpan) -> Self {
        Self { value: Some(value), time: None }
    }

    /// Degenerate box around a single timestamp.
    pub fn from_time(t: DateTime<Utc>) -> Self {
        Self { value: None, time: Some(TsTzSpan::singleton(t)) }
    }

    pub fn from_period(period: TsTzSpan) -> Self {
        Self { value: None, time: Some(period) }
    }

    pub fn value_span(&self) -> Option<&FloatSpan> {
        self.value.as_ref()
    }

    pub fn period(&self) -> Option<&TsTzSpan> {
        self.time.as_ref()
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn has_time(&self) -> bool {
        self.time.is_some()
    }

    /// Intersection, `None` when the boxes are disjoint on a shared
    /// dimension.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let value = match (&self.value, &other.value) {
            (Some(a), Some(b)) => Some(a.intersection(b)?),
            (Some(a), None) | (None, Some(a)) => Some(*a),
            (None, None) => None,
        };
        let time = match (&self.time, &other.time) {
            (Some(a), Some(b)) => Some(a.intersection(b)?),
            (Some(a), None) | (None, Some(a)) => Some(*a),
            (None, None) => None,
        };
        Some(Self { value, time })
    }

    /// Smallest box covering both operands.
    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.expand(other);
        result
    }
}

impl BoundingBox for TBox {
    fn overlaps(&self, other: &Self) -> bool {
        let value_ok = match (&self.value, &other.value) {
            (Some(a), Some(b)) => a.overlaps(b),
            _ => true,
        };
        let time_ok = match (&self.time, &other.time) {
            (Some(a), Some(b)) => a.overlaps(b),
            _ => true,
        };
        value_ok && time_ok
    }

    fn contains(&self, other: &Self) -> bool {
        let value_ok = match (&self.value, &other.value) {
            (Some(a), Some(b)) => a.contains_span(b),
            (None, _) => true,
            (Some(_), None) => false,
        };
        let time_ok = match (&self.time, &other.time) {
            (Some(a), Some(b)) => a.contains_span(b),
            (None, _) => true,
            (Some(_), None) => false,
        };
        value_ok && time_ok
    }

    fn expand(&mut self, other: &Self) {
        self.value = match (&self.value, &other.value) {
            (Some(a), Some(b)) => Some(a.super_union(b)),
            (Some(a), None) | (None, Some(a)) => Some(*a),
            (None, None) => None,
        };
        self.time = match (&self.time, &other.time) {
            (Some(a), Some(b)) => Some(a.super_union(b)),
            (Some(a), None) | (None, Some(a)) => Some(*a),
            (None, None) => None,
        };
    }
}

impl fmt::Display for TBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TBOX(")?;
        if let Some(v) = &self.value {
            write!(f, "{v}")?;
        }
        write!(f, ", ")?;
        if let Some(t) = &self.time {
            write!(f, "{t}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn disjoint_value_dimension_rejects() {
        let a = TBox::new(Some((0.0..1.0).into()), Some((ts(0)..ts(10)).into()));
        let b = TBox::new(Some((2.0..3.0).into()), Some((ts(0)..ts(10)).into()));
        assert!(!a.overlaps(&b));
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn missing_dimension_never_constrains() {
        let a = TBox::from_value(5.0);
        let b = TBox::from_time(ts(100));
        assert!(a.overlaps(&b));
        let u = a.union(&b);
        assert!(u.has_value() && u.has_time());
    }
}
