use std::ops::{Range, RangeInclusive};

use crate::collections::base::span::Span;

/// A value range over integers, used to restrict temporal integers.
pub type IntSpan = Span<i32>;

impl IntSpan {
    pub fn width(&self) -> i32 {
        self.upper() - self.lower()
    }
}

impl From<Range<i32>> for IntSpan {
    fn from(Range { start, end }: Range<i32>) -> Self {
        IntSpan::new(start, end, true, false).expect("range bounds must be ordered")
    }
}

impl From<RangeInclusive<i32>> for IntSpan {
    fn from(range: RangeInclusive<i32>) -> Self {
        let (start, end) = range.into_inner();
        IntSpan::new(start, end, true, true).expect("range bounds must be ordered")
    }
}
