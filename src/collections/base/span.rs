use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collections::base::collection::{impl_collection, Collection};
use crate::errors::{Error, Result};

/// Element type usable as a span axis. The comparison must be total; floats
/// go through `total_cmp`.
pub trait SpanElement: Copy + PartialEq + fmt::Debug {
    fn cmp_value(&self, other: &Self) -> Ordering;
}

impl SpanElement for chrono::DateTime<chrono::Utc> {
    fn cmp_value(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl SpanElement for i32 {
    fn cmp_value(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl SpanElement for f64 {
    fn cmp_value(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

/// A bounded interval with per-endpoint inclusivity.
///
/// Invariants: `lower <= upper`, and a degenerate span (`lower == upper`)
/// must be inclusive on both sides.
///
/// Spans order by lower bound first (an inclusive lower sorts before an
/// exclusive lower on equal values), then by upper bound (an exclusive upper
/// sorts before an inclusive upper).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span<T: SpanElement> {
    lower: T,
    upper: T,
    lower_inc: bool,
    upper_inc: bool,
}

impl<T: SpanElement> Span<T> {
    /// Creates a new span after validating its invariants.
    ///
    /// ## Errors
    /// `InvalidArgument` when `lower > upper`, or when `lower == upper` with
    /// either bound exclusive.
    ///
    /// ## Example
    /// ```
    /// # use tempora::collections::base::span::Span;
    /// let span = Span::new(23.9, 78.8, true, false).unwrap();
    /// assert!(span.is_lower_inclusive());
    /// assert!(!span.is_upper_inclusive());
    /// assert!(Span::new(78.8, 23.9, true, true).is_err());
    /// ```
    pub fn new(lower: T, upper: T, lower_inc: bool, upper_inc: bool) -> Result<Self> {
        match lower.cmp_value(&upper) {
            Ordering::Greater => Err(Error::invalid(format!(
                "span lower bound {lower:?} is after upper bound {upper:?}"
            ))),
            Ordering::Equal if !(lower_inc && upper_inc) => Err(Error::invalid(
                "a degenerate span must be inclusive on both sides",
            )),
            _ => Ok(Self { lower, upper, lower_inc, upper_inc }),
        }
    }

    /// Degenerate span holding a single value.
    pub fn singleton(value: T) -> Self {
        Self { lower: value, upper: value, lower_inc: true, upper_inc: true }
    }

    pub fn lower(&self) -> T {
        self.lower
    }

    pub fn upper(&self) -> T {
        self.upper
    }

    pub fn is_lower_inclusive(&self) -> bool {
        self.lower_inc
    }

    pub fn is_upper_inclusive(&self) -> bool {
        self.upper_inc
    }

    /// Total order on spans: lower bounds first, then upper bounds.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.lower_cmp(other).then_with(|| self.upper_cmp(other))
    }

    /// Compares the lower bounds of two spans. On equal values an inclusive
    /// lower bound sorts before an exclusive one.
    pub(crate) fn lower_cmp(&self, other: &Self) -> Ordering {
        self.lower.cmp_value(&other.lower).then(match (self.lower_inc, other.lower_inc) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => Ordering::Equal,
        })
    }

    /// Compares the upper bounds of two spans. On equal values an exclusive
    /// upper bound sorts before an inclusive one.
    pub(crate) fn upper_cmp(&self, other: &Self) -> Ordering {
        self.upper.cmp_value(&other.upper).then(match (self.upper_inc, other.upper_inc) {
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            _ => Ordering::Equal,
        })
    }

    /// True when the interval between a lower bound and an upper bound holds
    /// at least one point.
    fn bounds_nonempty(lv: T, lower_inc: bool, uv: T, upper_inc: bool) -> bool {
        match lv.cmp_value(&uv) {
            Ordering::Less => true,
            Ordering::Equal => lower_inc && upper_inc,
            Ordering::Greater => false,
        }
    }

    pub fn contains_value(&self, value: &T) -> bool {
        let after_lower = match self.lower.cmp_value(value) {
            Ordering::Less => true,
            Ordering::Equal => self.lower_inc,
            Ordering::Greater => false,
        };
        let before_upper = match value.cmp_value(&self.upper) {
            Ordering::Less => true,
            Ordering::Equal => self.upper_inc,
            Ordering::Greater => false,
        };
        after_lower && before_upper
    }

    pub fn contains_span(&self, other: &Self) -> bool {
        self.lower_cmp(other) != Ordering::Greater && self.upper_cmp(other) != Ordering::Less
    }

    pub fn is_contained_in(&self, container: &Self) -> bool {
        container.contains_span(self)
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        Self::bounds_nonempty(self.lower, self.lower_inc, other.upper, other.upper_inc)
            && Self::bounds_nonempty(other.lower, other.lower_inc, self.upper, self.upper_inc)
    }

    /// Every point of `self` strictly precedes every point of `other`.
    /// A single shared endpoint still qualifies when at least one side is
    /// exclusive there.
    pub fn is_left(&self, other: &Self) -> bool {
        match self.upper.cmp_value(&other.lower) {
            Ordering::Less => true,
            Ordering::Equal => !(self.upper_inc && other.lower_inc),
            Ordering::Greater => false,
        }
    }

    pub fn is_right(&self, other: &Self) -> bool {
        other.is_left(self)
    }

    /// `self` ends no later than `other` ends.
    pub fn is_over_or_left(&self, other: &Self) -> bool {
        self.upper_cmp(other) != Ordering::Greater
    }

    /// `self` starts no earlier than `other` starts.
    pub fn is_over_or_right(&self, other: &Self) -> bool {
        self.lower_cmp(other) != Ordering::Less
    }

    /// The two spans share exactly one endpoint, inclusive on exactly one
    /// side, and nothing else.
    pub fn is_adjacent(&self, other: &Self) -> bool {
        (self.upper.cmp_value(&other.lower) == Ordering::Equal
            && self.upper_inc != other.lower_inc)
            || (other.upper.cmp_value(&self.lower) == Ordering::Equal
                && other.upper_inc != self.lower_inc)
    }

    /// Smallest span covering both operands, whether or not they touch.
    pub(crate) fn super_union(&self, other: &Self) -> Self {
        let (lower, lower_inc) = if self.lower_cmp(other) != Ordering::Greater {
            (self.lower, self.lower_inc)
        } else {
            (other.lower, other.lower_inc)
        };
        let (upper, upper_inc) = if self.upper_cmp(other) != Ordering::Less {
            (self.upper, self.upper_inc)
        } else {
            (other.upper, other.upper_inc)
        };
        Self { lower, upper, lower_inc, upper_inc }
    }

    /// Union of two spans, `None` when they neither overlap nor touch.
    pub fn union(&self, other: &Self) -> Option<Self> {
        if self.overlaps(other) || self.is_adjacent(other) {
            Some(self.super_union(other))
        } else {
            None
        }
    }

    /// Shared part of two spans, `None` when disjoint.
    ///
    /// ## Example
    /// ```
    /// # use tempora::collections::base::span::Span;
    /// let a = Span::new(0.0, 10.0, true, false).unwrap();
    /// let b = Span::new(5.0, 20.0, true, true).unwrap();
    /// let shared = a.intersection(&b).unwrap();
    /// assert_eq!(shared.lower(), 5.0);
    /// assert_eq!(shared.upper(), 10.0);
    /// assert!(!shared.is_upper_inclusive());
    /// ```
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let (lower, lower_inc) = if self.lower_cmp(other) != Ordering::Less {
            (self.lower, self.lower_inc)
        } else {
            (other.lower, other.lower_inc)
        };
        let (upper, upper_inc) = if self.upper_cmp(other) != Ordering::Greater {
            (self.upper, self.upper_inc)
        } else {
            (other.upper, other.upper_inc)
        };
        Self::bounds_nonempty(lower, lower_inc, upper, upper_inc)
            .then_some(Self { lower, upper, lower_inc, upper_inc })
    }

    /// Part of `self` not covered by `other`: zero, one or two spans, in
    /// order.
    pub fn minus(&self, other: &Self) -> Vec<Self> {
        if !self.overlaps(other) {
            return vec![*self];
        }
        let mut pieces = Vec::with_capacity(2);
        if self.lower_cmp(other) == Ordering::Less {
            pieces.push(Self {
                lower: self.lower,
                lower_inc: self.lower_inc,
                upper: other.lower,
                upper_inc: !other.lower_inc,
            });
        }
        if self.upper_cmp(other) == Ordering::Greater {
            pieces.push(Self {
                lower: other.upper,
                lower_inc: !other.upper_inc,
                upper: self.upper,
                upper_inc: self.upper_inc,
            });
        }
        pieces
    }
}

impl<T: SpanElement> Collection for Span<T> {
    impl_collection!(T);
}

impl<T: SpanElement> PartialOrd for Span<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl<T: SpanElement + fmt::Display> fmt::Display for Span<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}, {}{}",
            if self.lower_inc { '[' } else { '(' },
            self.lower,
            self.upper,
            if self.upper_inc { ']' } else { ')' },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(lower: f64, upper: f64, li: bool, ui: bool) -> Span<f64> {
        Span::new(lower, upper, li, ui).unwrap()
    }

    #[test]
    fn degenerate_span_requires_inclusive_bounds() {
        assert!(Span::new(1.0, 1.0, true, true).is_ok());
        assert!(Span::new(1.0, 1.0, true, false).is_err());
        assert!(Span::new(2.0, 1.0, true, true).is_err());
    }

    #[test]
    fn bound_exact_overlap() {
        let a = span(0.0, 1.0, true, false);
        let b = span(1.0, 2.0, true, true);
        // [0,1) and [1,2] share no point but touch.
        assert!(!a.overlaps(&b));
        assert!(a.is_adjacent(&b));
        assert!(a.is_left(&b));
        let c = span(0.0, 1.0, true, true);
        assert!(c.overlaps(&b));
        assert!(!c.is_adjacent(&b));
    }

    #[test]
    fn minus_splits_in_two() {
        let a = span(0.0, 10.0, true, true);
        let b = span(4.0, 6.0, false, false);
        let pieces = a.minus(&b);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].upper(), 4.0);
        assert!(pieces[0].is_upper_inclusive());
        assert_eq!(pieces[1].lower(), 6.0);
        assert!(pieces[1].is_lower_inclusive());
    }

    #[test]
    fn span_ordering_breaks_ties_on_inclusivity() {
        let a = span(0.0, 5.0, true, true);
        let b = span(0.0, 5.0, false, true);
        let c = span(0.0, 5.0, true, false);
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(c.compare(&a), Ordering::Less);
    }
}
