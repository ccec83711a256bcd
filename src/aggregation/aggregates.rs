//! Temporal aggregates: for each operator a transition, a combine for
//! partial states, a finalize, and the serialize pair on the state itself.
//!
//! Transitions that receive `None` as input return the state unchanged.
//! Every ingested value is copied into the state; callers keep ownership of
//! their inputs.

use crate::aggregation::skiplist::{Combiner, SkipList};
use crate::aggregation::AggContext;
use crate::boxes::tbox::TBox;
use crate::boxes::BoundingBox as _;
use crate::collections::base::span::SpanElement;
use crate::collections::datetime::tstz_span::TsTzSpan;
use crate::errors::{Error, Result};
use crate::temporal::base::{BaseType, Double2, NumberBase, OrderedBase};
use crate::temporal::interpolation::TInterpolation;
use crate::temporal::lifting::lift_unary;
use crate::temporal::temporal::Temporal;
use crate::temporal::tinstant::TInstant;
use crate::temporal::tinstant_set::TInstantSet;
use crate::temporal::tsequence::TSequence;
use crate::temporal::tsequence_set::TSequenceSet;

// ------------------------- Combiners ----------------------------------------

pub(crate) fn datum_min<B: BaseType + PartialOrd>(a: &B, b: &B) -> B {
    if a < b {
        a.clone()
    } else {
        b.clone()
    }
}

pub(crate) fn datum_max<B: BaseType + PartialOrd>(a: &B, b: &B) -> B {
    if a > b {
        a.clone()
    } else {
        b.clone()
    }
}

pub(crate) fn datum_sum<B: NumberBase>(a: &B, b: &B) -> B {
    a.add(*b)
}

pub(crate) fn datum_and(a: &bool, b: &bool) -> bool {
    *a && *b
}

pub(crate) fn datum_or(a: &bool, b: &bool) -> bool {
    *a || *b
}

pub(crate) fn datum_sum_double2(a: &Double2, b: &Double2) -> Double2 {
    a.sum(b)
}

// ------------------------- Generic machinery --------------------------------

/// Decomposes a temporal value into skiplist elements.
fn batch_of<B: BaseType>(value: &Temporal<B>) -> Vec<Temporal<B>> {
    match value {
        Temporal::Instant(inst) => vec![Temporal::Instant(inst.clone())],
        Temporal::InstantSet(set) => set
            .instants()
            .iter()
            .map(|inst| Temporal::Instant(inst.clone()))
            .collect(),
        Temporal::Sequence(seq) => vec![Temporal::Sequence(seq.clone())],
        Temporal::SequenceSet(set) => set
            .sequences()
            .iter()
            .map(|seq| Temporal::Sequence(seq.clone()))
            .collect(),
    }
}

pub(crate) fn tagg_transition<B: BaseType>(
    ctx: &mut AggContext,
    state: Option<SkipList<B>>,
    value: &Temporal<B>,
    combiner: Combiner<B>,
    crossings: bool,
) -> Result<SkipList<B>> {
    let batch = batch_of(value);
    match state {
        None => SkipList::make(&batch),
        Some(mut list) => {
            if let (Some(Temporal::Sequence(head)), Some(Temporal::Sequence(seq))) =
                (list.head_value(), batch.first())
            {
                if head.interpolation() != seq.interpolation() {
                    return Err(Error::invalid(
                        "cannot aggregate temporal values of different interpolation",
                    ));
                }
            }
            list.splice(ctx, &batch, combiner, crossings)?;
            Ok(list)
        }
    }
}

pub(crate) fn tagg_combine<B: BaseType>(
    ctx: &mut AggContext,
    state1: Option<SkipList<B>>,
    state2: Option<SkipList<B>>,
    combiner: Combiner<B>,
    crossings: bool,
) -> Result<Option<SkipList<B>>> {
    match (state1, state2) {
        (None, other) | (other, None) => Ok(other),
        (Some(a), Some(b)) => {
            // Splice the shorter state into the longer one.
            let (mut target, source) = if a.len() < b.len() { (b, a) } else { (a, b) };
            let batch: Vec<Temporal<B>> =
                source.values().into_iter().cloned().collect();
            target.splice(ctx, &batch, combiner, crossings)?;
            Ok(Some(target))
        }
    }
}

/// Folds the state back into a temporal value.
pub fn tagg_finalize<B: BaseType>(state: Option<&SkipList<B>>) -> Option<Temporal<B>> {
    let values = state?.values();
    if values.is_empty() {
        return None;
    }
    if matches!(values[0], Temporal::Instant(_)) {
        let instants: Vec<TInstant<B>> = values
            .iter()
            .filter_map(|v| match v {
                Temporal::Instant(inst) => Some(inst.clone()),
                _ => None,
            })
            .collect();
        Some(Temporal::from(TInstantSet::new_unchecked(instants)))
    } else {
        let sequences: Vec<TSequence<B>> = values
            .iter()
            .filter_map(|v| match v {
                Temporal::Sequence(seq) => Some(seq.clone()),
                _ => None,
            })
            .collect();
        Some(Temporal::from(TSequenceSet::new_unchecked(
            TSequenceSet::normalized(sequences),
        )))
    }
}

/// Continuous float sums over linear sequences are ill-defined; the guard
/// is shared by every sum-shaped entry point.
pub(crate) fn ensure_summable<B: NumberBase>(value: &Temporal<B>) -> Result<()> {
    let linear = matches!(
        value,
        Temporal::Sequence(_) | Temporal::SequenceSet(_)
    ) && value.interpolation() == TInterpolation::Linear;
    if B::CONTINUOUS && linear {
        return Err(Error::NotSupported(
            "sum of temporal float sequences with linear interpolation",
        ));
    }
    Ok(())
}

// ------------------------- tmin / tmax --------------------------------------

pub fn tmin_transition<B: OrderedBase>(
    ctx: &mut AggContext,
    state: Option<SkipList<B>>,
    value: Option<&Temporal<B>>,
) -> Result<Option<SkipList<B>>> {
    match value {
        None => Ok(state),
        Some(value) => {
            Ok(Some(tagg_transition(ctx, state, value, datum_min::<B>, B::CONTINUOUS)?))
        }
    }
}

pub fn tmin_combine<B: OrderedBase>(
    ctx: &mut AggContext,
    state1: Option<SkipList<B>>,
    state2: Option<SkipList<B>>,
) -> Result<Option<SkipList<B>>> {
    tagg_combine(ctx, state1, state2, datum_min::<B>, B::CONTINUOUS)
}

pub fn tmax_transition<B: OrderedBase>(
    ctx: &mut AggContext,
    state: Option<SkipList<B>>,
    value: Option<&Temporal<B>>,
) -> Result<Option<SkipList<B>>> {
    match value {
        None => Ok(state),
        Some(value) => {
            Ok(Some(tagg_transition(ctx, state, value, datum_max::<B>, B::CONTINUOUS)?))
        }
    }
}

pub fn tmax_combine<B: OrderedBase>(
    ctx: &mut AggContext,
    state1: Option<SkipList<B>>,
    state2: Option<SkipList<B>>,
) -> Result<Option<SkipList<B>>> {
    tagg_combine(ctx, state1, state2, datum_max::<B>, B::CONTINUOUS)
}

// ------------------------- tsum ---------------------------------------------

pub fn tsum_transition<B: NumberBase>(
    ctx: &mut AggContext,
    state: Option<SkipList<B>>,
    value: Option<&Temporal<B>>,
) -> Result<Option<SkipList<B>>> {
    match value {
        None => Ok(state),
        Some(value) => {
            ensure_summable(value)?;
            Ok(Some(tagg_transition(ctx, state, value, datum_sum::<B>, false)?))
        }
    }
}

pub fn tsum_combine<B: NumberBase>(
    ctx: &mut AggContext,
    state1: Option<SkipList<B>>,
    state2: Option<SkipList<B>>,
) -> Result<Option<SkipList<B>>> {
    tagg_combine(ctx, state1, state2, datum_sum::<B>, false)
}

// ------------------------- tcount -------------------------------------------

/// Rewrites any temporal value into an integer "presence" value of the same
/// shape, constant 1.
pub(crate) fn transform_tcount<B: BaseType>(value: &Temporal<B>) -> Temporal<i32> {
    lift_unary(value, &|_: &B| 1, false, None)
}

pub fn tcount_transition<B: BaseType>(
    ctx: &mut AggContext,
    state: Option<SkipList<i32>>,
    value: Option<&Temporal<B>>,
) -> Result<Option<SkipList<i32>>> {
    match value {
        None => Ok(state),
        Some(value) => {
            let ones = transform_tcount(value);
            Ok(Some(tagg_transition(ctx, state, &ones, datum_sum::<i32>, false)?))
        }
    }
}

pub fn tcount_combine(
    ctx: &mut AggContext,
    state1: Option<SkipList<i32>>,
    state2: Option<SkipList<i32>>,
) -> Result<Option<SkipList<i32>>> {
    tagg_combine(ctx, state1, state2, datum_sum::<i32>, false)
}

// ------------------------- tavg ---------------------------------------------

/// Lifts a temporal number to `(value, 1)` pairs; the finalize divides.
pub(crate) fn transform_tavg<B: NumberBase>(value: &Temporal<B>) -> Temporal<Double2> {
    lift_unary(value, &|v: &B| Double2::new(v.to_f64(), 1.0), true, None)
}

pub fn tavg_transition<B: NumberBase>(
    ctx: &mut AggContext,
    state: Option<SkipList<Double2>>,
    value: Option<&Temporal<B>>,
) -> Result<Option<SkipList<Double2>>> {
    match value {
        None => Ok(state),
        Some(value) => {
            let pairs = transform_tavg(value);
            Ok(Some(tagg_transition(ctx, state, &pairs, datum_sum_double2, false)?))
        }
    }
}

pub fn tavg_combine(
    ctx: &mut AggContext,
    state1: Option<SkipList<Double2>>,
    state2: Option<SkipList<Double2>>,
) -> Result<Option<SkipList<Double2>>> {
    tagg_combine(ctx, state1, state2, datum_sum_double2, false)
}

/// Final pass of the avg aggregates: componentwise division of the pair
/// accumulator.
pub fn tavg_finalize(state: Option<&SkipList<Double2>>) -> Option<Temporal<f64>> {
    let folded = tagg_finalize(state)?;
    Some(lift_unary(&folded, &|d: &Double2| d.a / d.b, true, None))
}

// ------------------------- tand / tor ---------------------------------------

pub fn tand_transition(
    ctx: &mut AggContext,
    state: Option<SkipList<bool>>,
    value: Option<&Temporal<bool>>,
) -> Result<Option<SkipList<bool>>> {
    match value {
        None => Ok(state),
        Some(value) => Ok(Some(tagg_transition(ctx, state, value, datum_and, false)?)),
    }
}

pub fn tor_transition(
    ctx: &mut AggContext,
    state: Option<SkipList<bool>>,
    value: Option<&Temporal<bool>>,
) -> Result<Option<SkipList<bool>>> {
    match value {
        None => Ok(state),
        Some(value) => Ok(Some(tagg_transition(ctx, state, value, datum_or, false)?)),
    }
}

pub fn tbool_combine(
    ctx: &mut AggContext,
    state1: Option<SkipList<bool>>,
    state2: Option<SkipList<bool>>,
    conjunction: bool,
) -> Result<Option<SkipList<bool>>> {
    let combiner: Combiner<bool> = if conjunction { datum_and } else { datum_or };
    tagg_combine(ctx, state1, state2, combiner, false)
}

// ------------------------- extent -------------------------------------------

/// Time extent: the bounding period of everything seen.
pub fn extent_time_transition<B: BaseType>(
    state: Option<TsTzSpan>,
    value: Option<&Temporal<B>>,
) -> Option<TsTzSpan> {
    match value {
        None => state,
        Some(value) => {
            let span = value.timespan();
            Some(match state {
                None => span,
                Some(mut acc) => {
                    acc.expand(&span);
                    acc
                }
            })
        }
    }
}

/// Value×time extent of temporal numbers.
pub fn extent_tnumber_transition<B: NumberBase + SpanElement>(
    state: Option<TBox>,
    value: Option<&Temporal<B>>,
) -> Option<TBox> {
    match value {
        None => state,
        Some(value) => {
            let tbox = value.tbox();
            Some(match state {
                None => tbox,
                Some(mut acc) => {
                    acc.expand(&tbox);
                    acc
                }
            })
        }
    }
}
