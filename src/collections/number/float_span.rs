use std::ops::{Range, RangeInclusive};

use crate::collections::base::span::Span;

/// A value range over floats, used to restrict temporal numbers and as the
/// value dimension of [`TBox`](crate::boxes::tbox::TBox).
pub type FloatSpan = Span<f64>;

impl FloatSpan {
    /// Width of the range.
    ///
    /// ## Example
    /// ```
    /// # use tempora::collections::number::float_span::FloatSpan;
    /// let span: FloatSpan = (23.5..78.5).into();
    /// assert_eq!(span.width(), 55.0);
    /// ```
    pub fn width(&self) -> f64 {
        self.upper() - self.lower()
    }

    pub fn shift(&self, delta: f64) -> FloatSpan {
        FloatSpan::new(
            self.lower() + delta,
            self.upper() + delta,
            self.is_lower_inclusive(),
            self.is_upper_inclusive(),
        )
        .expect("shifting preserves bound order")
    }
}

impl From<Range<f64>> for FloatSpan {
    fn from(Range { start, end }: Range<f64>) -> Self {
        FloatSpan::new(start, end, true, false).expect("range bounds must be ordered")
    }
}

impl From<RangeInclusive<f64>> for FloatSpan {
    fn from(range: RangeInclusive<f64>) -> Self {
        let (start, end) = range.into_inner();
        FloatSpan::new(start, end, true, true).expect("range bounds must be ordered")
    }
}
