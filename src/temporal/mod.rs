pub mod interpolation;
pub use interpolation::TInterpolation;

pub mod base;
pub use base::{BBox, BaseKind, BaseType, Double2, NumberBase, OrderedBase};

pub mod tinstant;
pub use tinstant::TInstant;

pub mod tinstant_set;
pub use tinstant_set::TInstantSet;

pub mod tsequence;
pub use tsequence::TSequence;

pub mod tsequence_set;
pub use tsequence_set::TSequenceSet;

#[allow(clippy::module_inception)]
pub mod temporal;
pub use temporal::{TSubtype, Temporal};

pub mod lifting;

mod number;
pub use number::tfloat::*;
pub use number::tint::*;

pub mod point;
pub use point::tpoint::*;

mod tbool;
pub use tbool::*;

mod ttext;
pub use ttext::*;

// One macro stamps the per-base-type subtype aliases, mirroring the naming
// of the upstream bindings (TFloatInst, TFloatSeq, ...).
macro_rules! impl_temporal_aliases {
    ($name:ident, $base:ty) => {
        paste::paste! {
            pub type [<T $name>] = $crate::temporal::temporal::Temporal<$base>;
            pub type [<T $name Inst>] = $crate::temporal::tinstant::TInstant<$base>;
            pub type [<T $name InstSet>] = $crate::temporal::tinstant_set::TInstantSet<$base>;
            pub type [<T $name Seq>] = $crate::temporal::tsequence::TSequence<$base>;
            pub type [<T $name SeqSet>] = $crate::temporal::tsequence_set::TSequenceSet<$base>;
        }
    };
}

pub(crate) use impl_temporal_aliases;
