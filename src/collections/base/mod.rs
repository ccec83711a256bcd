mod collection;
pub(crate) use collection::impl_collection;
pub use collection::Collection;

pub mod span;
pub use span::{Span, SpanElement};

pub mod span_set;
pub use span_set::SpanSet;

pub mod set;
pub use set::Set;
