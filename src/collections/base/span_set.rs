use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collections::base::collection::{impl_collection, Collection};
use crate::collections::base::span::{Span, SpanElement};
use crate::errors::{Error, Result};

/// An ordered set of spans, pairwise disjoint and non-adjacent.
///
/// A span set is always fully normalized: components that overlap or touch
/// with matching inclusivity are coalesced by the constructor, unless the
/// caller vouches for the input with `normalize = false`, in which case a
/// dirty input is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanSet<T: SpanElement> {
    spans: Vec<Span<T>>,
}

impl<T: SpanElement> SpanSet<T> {
    /// Builds a span set from components.
    ///
    /// With `normalize`, the components are sorted and coalesced. Without
    /// it, the input must already be sorted, disjoint and non-adjacent;
    /// anything else is an `InvalidArgument` error, as is an empty input.
    ///
    /// ## Example
    /// ```
    /// # use tempora::collections::base::{span::Span, span_set::SpanSet};
    /// let parts = vec![
    ///     Span::new(5.0, 8.0, true, false).unwrap(),
    ///     Span::new(0.0, 5.0, true, false).unwrap(),
    /// ];
    /// let set = SpanSet::new(parts, true).unwrap();
    /// assert_eq!(set.num_spans(), 1); // touching parts coalesce
    /// ```
    pub fn new(spans: Vec<Span<T>>, normalize: bool) -> Result<Self> {
        if spans.is_empty() {
            return Err(Error::invalid("a span set requires at least one span"));
        }
        if normalize {
            Ok(Self { spans: Self::normalized(spans) })
        } else {
            for pair in spans.windows(2) {
                if !pair[0].is_left(&pair[1]) || pair[0].is_adjacent(&pair[1]) {
                    return Err(Error::invalid(
                        "span set components must be sorted, disjoint and non-adjacent \
                         when normalization is disabled",
                    ));
                }
            }
            Ok(Self { spans })
        }
    }

    pub fn from_span(span: Span<T>) -> Self {
        Self { spans: vec![span] }
    }

    fn normalized(mut spans: Vec<Span<T>>) -> Vec<Span<T>> {
        spans.sort_by(Span::compare);
        let mut result: Vec<Span<T>> = Vec::with_capacity(spans.len());
        for span in spans {
            match result.last_mut() {
                Some(last) if last.overlaps(&span) || last.is_adjacent(&span) => {
                    *last = last.super_union(&span);
                }
                _ => result.push(span),
            }
        }
        result
    }

    pub fn num_spans(&self) -> usize {
        self.spans.len()
    }

    pub fn start_span(&self) -> &Span<T> {
        &self.spans[0]
    }

    pub fn end_span(&self) -> &Span<T> {
        &self.spans[self.spans.len() - 1]
    }

    pub fn span_n(&self, n: usize) -> Option<&Span<T>> {
        self.spans.get(n)
    }

    pub fn spans(&self) -> &[Span<T>] {
        &self.spans
    }

    pub fn iter(&self) -> impl Iterator<Item = &Span<T>> {
        self.spans.iter()
    }

    /// Bounding span: the hull from the first lower bound to the last upper
    /// bound, inclusivities preserved.
    pub fn to_span(&self) -> Span<T> {
        self.start_span().super_union(self.end_span())
    }

    /// Binary search for the component containing `value`: `Ok(index)` when
    /// found, `Err(insertion_point)` otherwise.
    pub fn find_value(&self, value: &T) -> std::result::Result<usize, usize> {
        let idx = self.spans.partition_point(|s| {
            match s.upper().cmp_value(value) {
                Ordering::Less => true,
                Ordering::Equal => !s.is_upper_inclusive(),
                Ordering::Greater => false,
            }
        });
        if idx < self.spans.len() && self.spans[idx].contains_value(value) {
            Ok(idx)
        } else {
            Err(idx)
        }
    }

    /// Index of the first component not strictly before `span`.
    pub(crate) fn lower_index(&self, span: &Span<T>) -> usize {
        self.spans.partition_point(|s| s.is_left(span))
    }

    pub fn contains_value(&self, value: &T) -> bool {
        self.find_value(value).is_ok()
    }

    pub fn contains_span(&self, span: &Span<T>) -> bool {
        let idx = self.lower_index(span);
        idx < self.spans.len() && self.spans[idx].contains_span(span)
    }

    pub fn contains_span_set(&self, other: &Self) -> bool {
        other.spans.iter().all(|s| self.contains_span(s))
    }

    pub fn is_contained_in(&self, container: &Self) -> bool {
        container.contains_span_set(self)
    }

    pub fn is_contained_in_span(&self, span: &Span<T>) -> bool {
        span.contains_span(&self.to_span())
    }

    pub fn overlaps_span(&self, span: &Span<T>) -> bool {
        let idx = self.lower_index(span);
        idx < self.spans.len() && self.spans[idx].overlaps(span)
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.spans.len() && j < other.spans.len() {
            let (a, b) = (&self.spans[i], &other.spans[j]);
            if a.overlaps(b) {
                return true;
            }
            if a.is_left(b) {
                i += 1;
            } else {
                j += 1;
            }
        }
        false
    }

    pub fn is_left(&self, other: &Self) -> bool {
        self.to_span().is_left(&other.to_span())
    }

    pub fn is_right(&self, other: &Self) -> bool {
        other.is_left(self)
    }

    pub fn is_over_or_left(&self, other: &Self) -> bool {
        self.to_span().is_over_or_left(&other.to_span())
    }

    pub fn is_over_or_right(&self, other: &Self) -> bool {
        self.to_span().is_over_or_right(&other.to_span())
    }

    pub fn is_adjacent(&self, other: &Self) -> bool {
        if self.is_left(other) {
            self.end_span().is_adjacent(other.start_span())
        } else if other.is_left(self) {
            other.end_span().is_adjacent(self.start_span())
        } else {
            false
        }
    }

    pub fn is_adjacent_span(&self, span: &Span<T>) -> bool {
        self.is_adjacent(&Self::from_span(*span))
    }

    /// Union of two span sets. Walks both inputs in order, accumulating a
    /// super-span while either side keeps touching it, so the result comes
    /// out normalized.
    pub fn union(&self, other: &Self) -> Self {
        let (n, m) = (self.spans.len(), other.spans.len());
        let mut result: Vec<Span<T>> = Vec::with_capacity(n + m);
        let (mut i, mut j) = (0, 0);
        let absorbs = |q: &Span<T>, s: &Span<T>| q.overlaps(s) || q.is_adjacent(s);
        while i < n && j < m {
            let p1 = self.spans[i];
            let p2 = other.spans[j];
            if !absorbs(&p1, &p2) {
                if p1.compare(&p2) == Ordering::Less {
                    result.push(p1);
                    i += 1;
                } else {
                    result.push(p2);
                    j += 1;
                }
                continue;
            }
            // Grow a super-span until neither side touches it any more.
            let mut q = p1.super_union(&p2);
            i += 1;
            j += 1;
            loop {
                let mut grown = false;
                while i < n && absorbs(&q, &self.spans[i]) {
                    q = q.super_union(&self.spans[i]);
                    i += 1;
                    grown = true;
                }
                while j < m && absorbs(&q, &other.spans[j]) {
                    q = q.super_union(&other.spans[j]);
                    j += 1;
                    grown = true;
                }
                if !grown {
                    break;
                }
            }
            result.push(q);
        }
        result.extend_from_slice(&self.spans[i..]);
        result.extend_from_slice(&other.spans[j..]);
        Self { spans: result }
    }

    pub fn union_span(&self, span: &Span<T>) -> Self {
        self.union(&Self::from_span(*span))
    }

    /// Intersection of two span sets, `None` when they share nothing.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let mut result = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.spans.len() && j < other.spans.len() {
            let (a, b) = (&self.spans[i], &other.spans[j]);
            if let Some(shared) = a.intersection(b) {
                result.push(shared);
            }
            // Advance the side whose span ends first.
            match a.upper_cmp(b) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        (!result.is_empty()).then(|| Self { spans: result })
    }

    pub fn intersection_span(&self, span: &Span<T>) -> Option<Self> {
        self.intersection(&Self::from_span(*span))
    }

    /// Difference `self \ other`, `None` when nothing of `self` survives.
    pub fn minus(&self, other: &Self) -> Option<Self> {
        let mut result = Vec::new();
        let mut j = 0;
        for span in &self.spans {
            while j < other.spans.len() && other.spans[j].is_left(span) {
                j += 1;
            }
            let mut cur = Some(*span);
            let mut jj = j;
            while let Some(c) = cur {
                if jj >= other.spans.len() || c.is_left(&other.spans[jj]) {
                    break;
                }
                let pieces = c.minus(&other.spans[jj]);
                cur = match pieces.len() {
                    0 => None,
                    1 => {
                        let piece = pieces[0];
                        if piece.is_left(&other.spans[jj]) {
                            result.push(piece);
                            None
                        } else {
                            jj += 1;
                            Some(piece)
                        }
                    }
                    _ => {
                        result.push(pieces[0]);
                        jj += 1;
                        Some(pieces[1])
                    }
                };
            }
            if let Some(c) = cur {
                result.push(c);
            }
        }
        (!result.is_empty()).then(|| Self { spans: result })
    }

    pub fn minus_span(&self, span: &Span<T>) -> Option<Self> {
        self.minus(&Self::from_span(*span))
    }
}

impl<T: SpanElement> Collection for SpanSet<T> {
    impl_collection!(T);
}

impl<T: SpanElement> From<Span<T>> for SpanSet<T> {
    fn from(span: Span<T>) -> Self {
        Self::from_span(span)
    }
}

impl<T: SpanElement + fmt::Display> fmt::Display for SpanSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{span}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(lower: f64, upper: f64, li: bool, ui: bool) -> Span<f64> {
        Span::new(lower, upper, li, ui).unwrap()
    }

    fn set(spans: &[Span<f64>]) -> SpanSet<f64> {
        SpanSet::new(spans.to_vec(), true).unwrap()
    }

    #[test]
    fn constructor_rejects_dirty_input_without_normalization() {
        let dirty = vec![span(3.0, 5.0, true, true), span(0.0, 4.0, true, true)];
        assert!(SpanSet::new(dirty.clone(), false).is_err());
        let clean = SpanSet::new(dirty, true).unwrap();
        assert_eq!(clean.num_spans(), 1);
        assert_eq!(clean.to_span(), span(0.0, 5.0, true, true));
    }

    #[test]
    fn union_accumulates_super_spans() {
        let a = set(&[span(0.0, 2.0, true, true), span(6.0, 8.0, true, true)]);
        let b = set(&[span(1.0, 7.0, true, true)]);
        let u = a.union(&b);
        assert_eq!(u.num_spans(), 1);
        assert_eq!(u.to_span(), span(0.0, 8.0, true, true));
    }

    #[test]
    fn minus_emits_gaps() {
        let a = set(&[span(0.0, 10.0, true, true)]);
        let b = set(&[span(2.0, 3.0, true, true), span(5.0, 6.0, false, false)]);
        let d = a.minus(&b).unwrap();
        assert_eq!(d.num_spans(), 3);
        assert!(!d.spans()[0].is_upper_inclusive());
        assert!(d.spans()[1].is_lower_inclusive() == false);
        assert!(d.spans()[2].is_lower_inclusive());
        assert!(d.contains_value(&5.0));
        assert!(!d.contains_value(&5.5));
    }

    #[test]
    fn roundtrip_union_of_intersection_and_minus() {
        let a = set(&[span(0.0, 4.0, true, false), span(5.0, 9.0, true, true)]);
        let b = set(&[span(2.0, 7.0, true, true)]);
        let at = a.intersection(&b).unwrap();
        let minus = a.minus(&b).unwrap();
        assert_eq!(at.union(&minus), a);
    }

    #[test]
    fn binary_search_finds_components() {
        let a = set(&[span(0.0, 2.0, true, false), span(4.0, 6.0, true, true)]);
        assert_eq!(a.find_value(&1.0), Ok(0));
        assert_eq!(a.find_value(&2.0), Err(1));
        assert_eq!(a.find_value(&6.0), Ok(1));
        assert_eq!(a.find_value(&9.0), Err(2));
    }
}
