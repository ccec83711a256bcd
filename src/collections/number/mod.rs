pub mod float_span;
pub use float_span::FloatSpan;

pub mod float_span_set;
pub use float_span_set::FloatSpanSet;

pub mod int_span;
pub use int_span::IntSpan;
