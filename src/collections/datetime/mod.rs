pub mod tstz_span;
pub use tstz_span::TsTzSpan;

pub mod tstz_span_set;
pub use tstz_span_set::TsTzSpanSet;

pub mod tstz_set;
pub use tstz_set::TsTzSet;
