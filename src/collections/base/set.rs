use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collections::base::collection::{impl_collection, Collection};
use crate::collections::base::span::{Span, SpanElement};
use crate::collections::base::span_set::SpanSet;
use crate::errors::{Error, Result};

/// A finite ordered set of distinct elements on a span axis.
///
/// The constructor sorts its input and drops duplicates; an empty input is
/// rejected. The set carries its bounding span implicitly as
/// `[first, last]`, both bounds inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Set<T: SpanElement> {
    elements: Vec<T>,
}

impl<T: SpanElement> Set<T> {
    pub fn new(mut elements: Vec<T>) -> Result<Self> {
        if elements.is_empty() {
            return Err(Error::invalid("a set requires at least one element"));
        }
        elements.sort_by(T::cmp_value);
        elements.dedup_by(|a, b| a.cmp_value(b) == Ordering::Equal);
        Ok(Self { elements })
    }

    pub fn singleton(value: T) -> Self {
        Self { elements: vec![value] }
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn start_element(&self) -> T {
        self.elements[0]
    }

    pub fn end_element(&self) -> T {
        self.elements[self.elements.len() - 1]
    }

    pub fn element_n(&self, n: usize) -> Option<T> {
        self.elements.get(n).copied()
    }

    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }

    /// Bounding span `[first, last]`, both inclusive.
    pub fn to_span(&self) -> Span<T> {
        Span::singleton(self.start_element()).super_union(&Span::singleton(self.end_element()))
    }

    /// One degenerate span per element.
    pub fn to_span_set(&self) -> SpanSet<T> {
        SpanSet::new(self.elements.iter().map(|e| Span::singleton(*e)).collect(), false)
            .expect("distinct elements yield disjoint singleton spans")
    }

    /// Binary search: `Ok(index)` when present, `Err(insertion_point)`
    /// otherwise.
    pub fn find(&self, value: &T) -> std::result::Result<usize, usize> {
        self.elements.binary_search_by(|e| e.cmp_value(value))
    }

    pub fn contains_value(&self, value: &T) -> bool {
        self.find(value).is_ok()
    }

    pub fn is_contained_in(&self, container: &Self) -> bool {
        self.elements.iter().all(|e| container.contains_value(e))
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.elements.len() && j < other.elements.len() {
            match self.elements[i].cmp_value(&other.elements[j]) {
                Ordering::Equal => return true,
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
            }
        }
        false
    }

    pub fn is_left(&self, other: &Self) -> bool {
        self.end_element().cmp_value(&other.start_element()) == Ordering::Less
    }

    pub fn is_right(&self, other: &Self) -> bool {
        other.is_left(self)
    }

    pub fn is_over_or_left(&self, other: &Self) -> bool {
        self.end_element().cmp_value(&other.end_element()) != Ordering::Greater
    }

    pub fn is_over_or_right(&self, other: &Self) -> bool {
        self.start_element().cmp_value(&other.start_element()) != Ordering::Less
    }

    /// Isolated points are never adjacent on a continuous axis.
    pub fn is_adjacent(&self, _other: &Self) -> bool {
        false
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut merged = self.elements.clone();
        merged.extend_from_slice(&other.elements);
        Self::new(merged).expect("union of non-empty sets is non-empty")
    }

    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let kept: Vec<T> = self
            .elements
            .iter()
            .filter(|e| other.contains_value(e))
            .copied()
            .collect();
        (!kept.is_empty()).then(|| Self { elements: kept })
    }

    pub fn minus(&self, other: &Self) -> Option<Self> {
        let kept: Vec<T> = self
            .elements
            .iter()
            .filter(|e| !other.contains_value(e))
            .copied()
            .collect();
        (!kept.is_empty()).then(|| Self { elements: kept })
    }

    /// Elements falling inside `span`.
    pub fn at_span(&self, span: &Span<T>) -> Option<Self> {
        let kept: Vec<T> = self
            .elements
            .iter()
            .filter(|e| span.contains_value(e))
            .copied()
            .collect();
        (!kept.is_empty()).then(|| Self { elements: kept })
    }

    pub fn minus_span(&self, span: &Span<T>) -> Option<Self> {
        let kept: Vec<T> = self
            .elements
            .iter()
            .filter(|e| !span.contains_value(e))
            .copied()
            .collect();
        (!kept.is_empty()).then(|| Self { elements: kept })
    }

    pub fn at_span_set(&self, spans: &SpanSet<T>) -> Option<Self> {
        let kept: Vec<T> = self
            .elements
            .iter()
            .filter(|e| spans.contains_value(e))
            .copied()
            .collect();
        (!kept.is_empty()).then(|| Self { elements: kept })
    }

    pub fn minus_span_set(&self, spans: &SpanSet<T>) -> Option<Self> {
        let kept: Vec<T> = self
            .elements
            .iter()
            .filter(|e| !spans.contains_value(e))
            .copied()
            .collect();
        (!kept.is_empty()).then(|| Self { elements: kept })
    }
}

impl<T: SpanElement> Collection for Set<T> {
    impl_collection!(T);
}

impl<T: SpanElement + fmt::Display> fmt::Display for Set<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, e) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{e}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_sorts_and_dedups() {
        let set = Set::new(vec![3.0, 1.0, 2.0, 1.0]).unwrap();
        assert_eq!(set.elements(), &[1.0, 2.0, 3.0]);
        assert!(Set::<f64>::new(vec![]).is_err());
    }

    #[test]
    fn span_restriction_is_bound_exact() {
        let set = Set::new(vec![1.0, 2.0, 3.0]).unwrap();
        let span = Span::new(1.0, 3.0, false, false).unwrap();
        let at = set.at_span(&span).unwrap();
        assert_eq!(at.elements(), &[2.0]);
        let minus = set.minus_span(&span).unwrap();
        assert_eq!(minus.elements(), &[1.0, 3.0]);
    }
}
