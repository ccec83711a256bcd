//! Window (moving) aggregates: each input is first rewritten into
//! time-extended sequences that realize the moving window, then fed through
//! the ordinary skiplist aggregation with the matching combiner.

use chrono::TimeDelta;

use crate::aggregation::aggregates::{
    datum_max, datum_min, datum_sum, datum_sum_double2, tagg_transition,
};
use crate::aggregation::skiplist::SkipList;
use crate::aggregation::AggContext;
use crate::errors::{Error, Result};
use crate::temporal::base::{BaseType, Double2, NumberBase, OrderedBase};
use crate::temporal::interpolation::TInterpolation;
use crate::temporal::temporal::Temporal;
use crate::temporal::tinstant::TInstant;
use crate::temporal::tsequence::TSequence;

fn ensure_window(interval: TimeDelta) -> Result<()> {
    if interval <= TimeDelta::zero() {
        return Err(Error::invalid("the window interval must be positive"));
    }
    Ok(())
}

/// Extends one instant into a constant sequence covering its window.
fn instant_extend<B: BaseType>(inst: &TInstant<B>, interval: TimeDelta) -> TSequence<B> {
    let interp = if B::CONTINUOUS {
        TInterpolation::Linear
    } else {
        TInterpolation::Stepwise
    };
    TSequence::new_unchecked(
        vec![
            inst.clone(),
            TInstant::new(inst.value().clone(), inst.timestamp() + interval),
        ],
        true,
        true,
        interp,
    )
}

fn step_sequence_extend<B: BaseType>(
    seq: &TSequence<B>,
    interval: TimeDelta,
) -> Vec<TSequence<B>> {
    let instants = seq.instants();
    if instants.len() == 1 {
        return vec![instant_extend(&instants[0], interval)];
    }
    let mut result = Vec::with_capacity(instants.len() - 1);
    let mut lower_inc = seq.is_lower_inclusive();
    for (i, pair) in instants.windows(2).enumerate() {
        let upper_inc = if i + 2 == instants.len() {
            seq.is_upper_inclusive()
        } else {
            false
        };
        let value = pair[0].value().clone();
        result.push(TSequence::new_unchecked(
            vec![
                pair[0].clone(),
                TInstant::new(value, pair[1].timestamp() + interval),
            ],
            lower_inc,
            upper_inc,
            TInterpolation::Stepwise,
        ));
        lower_inc = true;
    }
    result
}

/// Extends a linear sequence segment by segment, inspecting the trend: a
/// rising segment under `min` (or a falling one under `max`) would lose its
/// extremum if only the end were stretched, so the start value is held for
/// the window instead.
fn linear_sequence_extend<B: BaseType + PartialOrd>(
    seq: &TSequence<B>,
    interval: TimeDelta,
    min: bool,
) -> Vec<TSequence<B>> {
    let instants = seq.instants();
    if instants.len() == 1 {
        return vec![instant_extend(&instants[0], interval)];
    }
    let mut result = Vec::with_capacity(instants.len() - 1);
    let mut lower_inc = seq.is_lower_inclusive();
    for (i, pair) in instants.windows(2).enumerate() {
        let upper_inc = if i + 2 == instants.len() {
            seq.is_upper_inclusive()
        } else {
            false
        };
        let (v1, t1) = (pair[0].value(), pair[0].timestamp());
        let (v2, t2) = (pair[1].value(), pair[1].timestamp());
        let extended = if v1 == v2 {
            TSequence::new_unchecked(
                vec![pair[0].clone(), TInstant::new(v1.clone(), t2 + interval)],
                lower_inc,
                upper_inc,
                TInterpolation::Linear,
            )
        } else if (v1 < v2 && min) || (v1 > v2 && !min) {
            // Hold the segment's extremum at its start for the window.
            TSequence::new_unchecked(
                vec![
                    pair[0].clone(),
                    TInstant::new(v1.clone(), t1 + interval),
                    TInstant::new(v2.clone(), t2 + interval),
                ],
                lower_inc,
                upper_inc,
                TInterpolation::Linear,
            )
        } else {
            TSequence::new_unchecked(
                vec![
                    pair[0].clone(),
                    pair[1].clone(),
                    TInstant::new(v2.clone(), t2 + interval),
                ],
                lower_inc,
                upper_inc,
                TInterpolation::Linear,
            )
        };
        result.push(extended);
        lower_inc = true;
    }
    result
}

/// Rewrites a temporal value into window-extended sequences.
pub(crate) fn temporal_extend<B: BaseType + PartialOrd>(
    value: &Temporal<B>,
    interval: TimeDelta,
    min: bool,
) -> Vec<TSequence<B>> {
    match value {
        Temporal::Instant(inst) => vec![instant_extend(inst, interval)],
        Temporal::InstantSet(set) => set
            .instants()
            .iter()
            .map(|inst| instant_extend(inst, interval))
            .collect(),
        Temporal::Sequence(seq) => {
            if seq.is_linear() {
                linear_sequence_extend(seq, interval, min)
            } else {
                step_sequence_extend(seq, interval)
            }
        }
        Temporal::SequenceSet(set) => set
            .sequences()
            .iter()
            .flat_map(|seq| {
                if seq.is_linear() {
                    linear_sequence_extend(seq, interval, min)
                } else {
                    step_sequence_extend(seq, interval)
                }
            })
            .collect(),
    }
}

/// Rewrites each instant/segment into a stepwise presence sequence of
/// constant value 1 covering its window.
pub(crate) fn transform_wcount<B: BaseType>(
    value: &Temporal<B>,
    interval: TimeDelta,
) -> Vec<TSequence<i32>> {
    let one_span = |t1, t2, lower_inc, upper_inc| {
        TSequence::new_unchecked(
            vec![TInstant::new(1, t1), TInstant::new(1, t2)],
            lower_inc,
            upper_inc,
            TInterpolation::Stepwise,
        )
    };
    match value {
        Temporal::Instant(inst) => {
            vec![one_span(inst.timestamp(), inst.timestamp() + interval, true, true)]
        }
        Temporal::InstantSet(set) => set
            .instants()
            .iter()
            .map(|inst| one_span(inst.timestamp(), inst.timestamp() + interval, true, true))
            .collect(),
        Temporal::Sequence(seq) => sequence_wcount(seq, interval, &one_span),
        Temporal::SequenceSet(set) => set
            .sequences()
            .iter()
            .flat_map(|seq| sequence_wcount(seq, interval, &one_span))
            .collect(),
    }
}

fn sequence_wcount<B: BaseType>(
    seq: &TSequence<B>,
    interval: TimeDelta,
    one_span: &impl Fn(
        chrono::DateTime<chrono::Utc>,
        chrono::DateTime<chrono::Utc>,
        bool,
        bool,
    ) -> TSequence<i32>,
) -> Vec<TSequence<i32>> {
    let instants = seq.instants();
    if instants.len() == 1 {
        let t = instants[0].timestamp();
        return vec![one_span(t, t + interval, true, true)];
    }
    let mut result = Vec::with_capacity(instants.len() - 1);
    let mut lower_inc = seq.is_lower_inclusive();
    for (i, pair) in instants.windows(2).enumerate() {
        let upper_inc = if i + 2 == instants.len() {
            seq.is_upper_inclusive()
        } else {
            false
        };
        result.push(one_span(
            pair[0].timestamp(),
            pair[1].timestamp() + interval,
            lower_inc,
            upper_inc,
        ));
        lower_inc = true;
    }
    result
}

/// Rewrites a temporal number into `(value, 1)` pair sequences extended by
/// the window; the final pass divides componentwise.
pub(crate) fn transform_wavg<B: NumberBase>(
    value: &Temporal<B>,
    interval: TimeDelta,
) -> Result<Vec<TSequence<Double2>>> {
    let pair_span = |value: f64, t1, t2, lower_inc, upper_inc| {
        TSequence::new_unchecked(
            vec![
                TInstant::new(Double2::new(value, 1.0), t1),
                TInstant::new(Double2::new(value, 1.0), t2),
            ],
            lower_inc,
            upper_inc,
            TInterpolation::Linear,
        )
    };
    match value {
        Temporal::Instant(inst) => Ok(vec![pair_span(
            inst.value().to_f64(),
            inst.timestamp(),
            inst.timestamp() + interval,
            true,
            true,
        )]),
        Temporal::InstantSet(set) => Ok(set
            .instants()
            .iter()
            .map(|inst| {
                pair_span(
                    inst.value().to_f64(),
                    inst.timestamp(),
                    inst.timestamp() + interval,
                    true,
                    true,
                )
            })
            .collect()),
        Temporal::Sequence(_) | Temporal::SequenceSet(_) => {
            if B::CONTINUOUS && value.interpolation() == TInterpolation::Linear {
                return Err(Error::NotSupported(
                    "window average of temporal float sequences",
                ));
            }
            let sequences: Vec<&TSequence<B>> = match value {
                Temporal::Sequence(seq) => vec![seq],
                Temporal::SequenceSet(set) => set.sequences().iter().collect(),
                _ => unreachable!(),
            };
            let mut result = Vec::new();
            for seq in sequences {
                let instants = seq.instants();
                if instants.len() == 1 {
                    let t = instants[0].timestamp();
                    result.push(pair_span(
                        instants[0].value().to_f64(),
                        t,
                        t + interval,
                        true,
                        true,
                    ));
                    continue;
                }
                let mut lower_inc = seq.is_lower_inclusive();
                for (i, pair) in instants.windows(2).enumerate() {
                    let upper_inc = if i + 2 == instants.len() {
                        seq.is_upper_inclusive()
                    } else {
                        false
                    };
                    result.push(pair_span(
                        pair[0].value().to_f64(),
                        pair[0].timestamp(),
                        pair[1].timestamp() + interval,
                        lower_inc,
                        upper_inc,
                    ));
                    lower_inc = true;
                }
            }
            Ok(result)
        }
    }
}

fn feed_sequences<B: BaseType>(
    ctx: &mut AggContext,
    mut state: Option<SkipList<B>>,
    sequences: Vec<TSequence<B>>,
    combiner: crate::aggregation::skiplist::Combiner<B>,
    crossings: bool,
) -> Result<Option<SkipList<B>>> {
    for seq in sequences {
        ctx.check_cancelled()?;
        state = Some(tagg_transition(
            ctx,
            state,
            &Temporal::Sequence(seq),
            combiner,
            crossings,
        )?);
    }
    Ok(state)
}

// ------------------------- Transitions --------------------------------------

pub fn wmin_transition<B: OrderedBase>(
    ctx: &mut AggContext,
    state: Option<SkipList<B>>,
    value: Option<&Temporal<B>>,
    interval: TimeDelta,
) -> Result<Option<SkipList<B>>> {
    let Some(value) = value else { return Ok(state) };
    ensure_window(interval)?;
    let sequences = temporal_extend(value, interval, true);
    feed_sequences(ctx, state, sequences, datum_min::<B>, B::CONTINUOUS)
}

pub fn wmax_transition<B: OrderedBase>(
    ctx: &mut AggContext,
    state: Option<SkipList<B>>,
    value: Option<&Temporal<B>>,
    interval: TimeDelta,
) -> Result<Option<SkipList<B>>> {
    let Some(value) = value else { return Ok(state) };
    ensure_window(interval)?;
    let sequences = temporal_extend(value, interval, false);
    feed_sequences(ctx, state, sequences, datum_max::<B>, B::CONTINUOUS)
}

pub fn wsum_transition<B: NumberBase>(
    ctx: &mut AggContext,
    state: Option<SkipList<B>>,
    value: Option<&Temporal<B>>,
    interval: TimeDelta,
) -> Result<Option<SkipList<B>>> {
    let Some(value) = value else { return Ok(state) };
    ensure_window(interval)?;
    crate::aggregation::aggregates::ensure_summable(value)?;
    let sequences = temporal_extend(value, interval, true);
    feed_sequences(ctx, state, sequences, datum_sum::<B>, false)
}

pub fn wcount_transition<B: BaseType>(
    ctx: &mut AggContext,
    state: Option<SkipList<i32>>,
    value: Option<&Temporal<B>>,
    interval: TimeDelta,
) -> Result<Option<SkipList<i32>>> {
    let Some(value) = value else { return Ok(state) };
    ensure_window(interval)?;
    let sequences = transform_wcount(value, interval);
    feed_sequences(ctx, state, sequences, datum_sum::<i32>, false)
}

pub fn wavg_transition<B: NumberBase>(
    ctx: &mut AggContext,
    state: Option<SkipList<Double2>>,
    value: Option<&Temporal<B>>,
    interval: TimeDelta,
) -> Result<Option<SkipList<Double2>>> {
    let Some(value) = value else { return Ok(state) };
    ensure_window(interval)?;
    let sequences = transform_wavg(value, interval)?;
    feed_sequences(ctx, state, sequences, datum_sum_double2, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::aggregates::tagg_finalize;
    use chrono::DateTime;

    fn ts(secs: i64) -> chrono::DateTime<chrono::Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn linear_seq(values: &[(f64, i64)]) -> Temporal<f64> {
        Temporal::Sequence(
            TSequence::new(
                values.iter().map(|&(v, t)| TInstant::new(v, ts(t))).collect(),
                true,
                true,
                TInterpolation::Linear,
                false,
            )
            .unwrap(),
        )
    }

    #[test]
    fn rising_segment_under_min_holds_its_start() {
        let seq = match linear_seq(&[(1.0, 0), (5.0, 100)]) {
            Temporal::Sequence(seq) => seq,
            _ => unreachable!(),
        };
        let extended = linear_sequence_extend(&seq, TimeDelta::seconds(20), true);
        assert_eq!(extended.len(), 1);
        let instants = extended[0].instants();
        assert_eq!(instants.len(), 3);
        assert_eq!(*instants[1].value(), 1.0);
        assert_eq!(instants[1].timestamp(), ts(20));
        assert_eq!(instants[2].timestamp(), ts(120));
    }

    #[test]
    fn wmin_keeps_window_minimum() {
        let mut ctx = AggContext::with_seed(9);
        let value = linear_seq(&[(5.0, 0), (1.0, 100)]);
        let state =
            wmin_transition(&mut ctx, None, Some(&value), TimeDelta::seconds(50)).unwrap();
        let out = tagg_finalize(state.as_ref()).unwrap();
        // the minimum keeps decreasing, and the tail extends the final value
        assert_eq!(out.value_at_timestamp(ts(100)), Some(1.0));
        assert_eq!(out.value_at_timestamp(ts(150)), Some(1.0));
    }

    #[test]
    fn wcount_follows_the_window() {
        // spec scenario 4: two sequences half overlapping, window one day
        let day = TimeDelta::days(1);
        let half = TimeDelta::hours(12);
        let t0 = ts(0);
        let seq_a = Temporal::Sequence(TSequence::<f64>::new(
            vec![TInstant::new(0.0, t0), TInstant::new(0.0, t0 + day)],
            true,
            true,
            TInterpolation::Linear,
            false,
        )
        .unwrap());
        let seq_b = Temporal::Sequence(TSequence::<f64>::new(
            vec![TInstant::new(0.0, t0 + half), TInstant::new(0.0, t0 + day + half)],
            true,
            true,
            TInterpolation::Linear,
            false,
        )
        .unwrap());
        let mut ctx = AggContext::with_seed(4);
        let state = wcount_transition(&mut ctx, None, Some(&seq_a), day).unwrap();
        let state = wcount_transition(&mut ctx, state, Some(&seq_b), day).unwrap();
        let out = tagg_finalize(state.as_ref()).unwrap();
        assert_eq!(out.value_at_timestamp(t0), Some(1));
        assert_eq!(out.value_at_timestamp(t0 + half), Some(2));
        assert_eq!(out.value_at_timestamp(t0 + day + day), Some(2));
        assert_eq!(
            out.value_at_timestamp(t0 + day + day + TimeDelta::hours(6)),
            Some(1)
        );
        assert_eq!(out.value_at_timestamp(t0 + day + day + half), Some(1));
    }

    #[test]
    fn wsum_rejects_float_sequences() {
        let mut ctx = AggContext::with_seed(5);
        let value = linear_seq(&[(1.0, 0), (2.0, 100)]);
        let result = wsum_transition(&mut ctx, None, Some(&value), TimeDelta::seconds(10));
        assert!(matches!(result, Err(Error::NotSupported(_))));
    }

    #[test]
    fn wavg_pairs_and_divides() {
        let mut ctx = AggContext::with_seed(6);
        let a = Temporal::Instant(TInstant::new(10, ts(0)));
        let b = Temporal::Instant(TInstant::new(20, ts(50)));
        let state =
            wavg_transition(&mut ctx, None, Some(&a), TimeDelta::seconds(100)).unwrap();
        let state =
            wavg_transition(&mut ctx, state, Some(&b), TimeDelta::seconds(100)).unwrap();
        let out = crate::aggregation::aggregates::tavg_finalize(state.as_ref()).unwrap();
        assert_eq!(out.value_at_timestamp(ts(25)), Some(10.0));
        assert_eq!(out.value_at_timestamp(ts(75)), Some(15.0));
        assert_eq!(out.value_at_timestamp(ts(120)), Some(20.0));
    }
}
