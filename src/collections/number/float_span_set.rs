use crate::collections::base::span_set::SpanSet;

/// A normalized set of float ranges.
pub type FloatSpanSet = SpanSet<f64>;

impl FloatSpanSet {
    /// Total covered width, gaps excluded.
    pub fn width(&self) -> f64 {
        self.iter().map(|s| s.width()).sum()
    }
}
