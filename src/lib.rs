//! `tempora` is a typed algebra over values that vary over time.
//!
//! The crate is organized in four layers:
//!
//! - **Time algebra** ([`collections`]): bounded intervals with explicit
//!   bound inclusivity ([`TsTzSpan`]), timestamp sets ([`TsTzSet`]) and
//!   normalized interval sets ([`TsTzSpanSet`]), with the full
//!   containment/position/set-operation matrix across the four kinds.
//! - **Temporal values** ([`temporal`]): four subtypes — instant, instant
//!   set, sequence, sequence set — generic over a base type (int, float,
//!   bool, text, geometric or geographic point), unified by [`Temporal`].
//!   Restriction (`at_…`/`minus_…`), value access, ever/always predicates,
//!   arithmetic, and distance are built on a shared lifting kernel that
//!   synchronizes operands and materializes turning points and crossings.
//! - **Bounding boxes** ([`boxes`]): per-value summaries ([`TBox`],
//!   [`STBox`]) used for fast reject.
//! - **Aggregation** ([`aggregation`]): skiplist-backed transition state
//!   with deterministic splice semantics, the t‐aggregates (min, max, sum,
//!   count, avg, and, or, extent) and their moving-window variants.
//!
//! Restriction operators signal an empty result with `None`; hard failures
//! go through [`errors::Error`].

pub mod errors;
pub use errors::Error;

pub mod utils;

pub mod collections;
pub use collections::base::{Collection, Set, Span, SpanSet};
pub use collections::datetime::{TsTzSet, TsTzSpan, TsTzSpanSet};
pub use collections::number::{FloatSpan, FloatSpanSet, IntSpan};

pub mod boxes;
pub use boxes::{BoundingBox, STBox, TBox};

pub mod temporal;
pub use temporal::point::{GeogPoint, GeomPoint, Point};
pub use temporal::{
    BBox, BaseKind, BaseType, Double2, NumberBase, OrderedBase, TBool, TFloat, TGeogPoint,
    TGeomPoint, TInstant, TInstantSet, TInt, TInterpolation, TSequence, TSequenceSet,
    TSubtype, TText, Temporal,
};

pub mod aggregation;
pub use aggregation::{AggContext, SkipList};

pub use utils::CancelToken;
