//! Lifting kernel: extends scalar functions to temporal operands.
//!
//! Binary lifting synchronizes the operands over their shared time, walks
//! paired segments, and optionally inserts interior instants — turning
//! points of continuous combinations, or crossings of discontinuous ones —
//! before applying the scalar function. Unary lifting is the one-operand
//! special case.

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::temporal::base::BaseType;
use crate::temporal::interpolation::TInterpolation;
use crate::temporal::temporal::Temporal;
use crate::temporal::tinstant::TInstant;
use crate::temporal::tinstant_set::TInstantSet;
use crate::temporal::tsequence::TSequence;
use crate::temporal::tsequence_set::TSequenceSet;
use crate::utils::{segment_fraction, timestamp_at_fraction, FRACTION_EPSILON};

/// Finder for an interior instant of a synchronized segment pair: returns
/// the fraction in `(0, 1)` where the lifted result needs an extra instant
/// (an extremum of a continuous combination, or the crossing of a
/// discontinuous one).
pub(crate) type InteriorFinder<'a, A, B> = Option<&'a dyn Fn(&A, &A, &B, &B) -> Option<f64>>;

/// Applies `f` pointwise over the synchronized domain of `a` and `b`.
///
/// `res_linear` states whether the result varies linearly when both inputs
/// do; a discontinuous result (predicates) passes `false` and the output
/// degrades to stepwise interpolation with exact flip instants supplied by
/// `interior`.
pub(crate) fn lift_binary<A, B, C, F>(
    a: &Temporal<A>,
    b: &Temporal<B>,
    f: &F,
    res_linear: bool,
    interior: InteriorFinder<'_, A, B>,
) -> Option<Temporal<C>>
where
    A: BaseType,
    B: BaseType,
    C: BaseType,
    F: Fn(&A, &B) -> C,
{
    match (a, b) {
        (Temporal::Instant(ai), _) => {
            let bv = b.value_at_timestamp(ai.timestamp())?;
            Some(Temporal::Instant(TInstant::new(
                f(ai.value(), &bv),
                ai.timestamp(),
            )))
        }
        (_, Temporal::Instant(bi)) => {
            let av = a.value_at_timestamp(bi.timestamp())?;
            Some(Temporal::Instant(TInstant::new(
                f(&av, bi.value()),
                bi.timestamp(),
            )))
        }
        (Temporal::InstantSet(ai), Temporal::InstantSet(bi)) => {
            let mut out = Vec::new();
            let (mut i, mut j) = (0, 0);
            let (xs, ys) = (ai.instants(), bi.instants());
            while i < xs.len() && j < ys.len() {
                match xs[i].timestamp().cmp(&ys[j].timestamp()) {
                    std::cmp::Ordering::Equal => {
                        out.push(TInstant::new(
                            f(xs[i].value(), ys[j].value()),
                            xs[i].timestamp(),
                        ));
                        i += 1;
                        j += 1;
                    }
                    std::cmp::Ordering::Less => i += 1,
                    std::cmp::Ordering::Greater => j += 1,
                }
            }
            (!out.is_empty()).then(|| Temporal::from(TInstantSet::new_unchecked(out)))
        }
        (Temporal::InstantSet(ai), _) => {
            let out: Vec<TInstant<C>> = ai
                .instants()
                .iter()
                .filter_map(|inst| {
                    let bv = b.value_at_timestamp(inst.timestamp())?;
                    Some(TInstant::new(f(inst.value(), &bv), inst.timestamp()))
                })
                .collect();
            (!out.is_empty()).then(|| Temporal::from(TInstantSet::new_unchecked(out)))
        }
        (_, Temporal::InstantSet(bi)) => {
            let out: Vec<TInstant<C>> = bi
                .instants()
                .iter()
                .filter_map(|inst| {
                    let av = a.value_at_timestamp(inst.timestamp())?;
                    Some(TInstant::new(f(&av, inst.value()), inst.timestamp()))
                })
                .collect();
            (!out.is_empty()).then(|| Temporal::from(TInstantSet::new_unchecked(out)))
        }
        (Temporal::Sequence(sa), Temporal::Sequence(sb)) => {
            lift_sequences(sa, sb, f, res_linear, interior).map(Temporal::from)
        }
        (Temporal::Sequence(sa), Temporal::SequenceSet(sbs)) => {
            let pieces: Vec<TSequence<C>> = sbs
                .sequences()
                .iter()
                .filter_map(|sb| lift_sequences(sa, sb, f, res_linear, interior))
                .collect();
            collect_pieces(pieces)
        }
        (Temporal::SequenceSet(sas), Temporal::Sequence(sb)) => {
            let pieces: Vec<TSequence<C>> = sas
                .sequences()
                .iter()
                .filter_map(|sa| lift_sequences(sa, sb, f, res_linear, interior))
                .collect();
            collect_pieces(pieces)
        }
        (Temporal::SequenceSet(sas), Temporal::SequenceSet(sbs)) => {
            let mut pieces = Vec::new();
            let (mut i, mut j) = (0, 0);
            let (xs, ys) = (sas.sequences(), sbs.sequences());
            while i < xs.len() && j < ys.len() {
                if let Some(piece) = lift_sequences(&xs[i], &ys[j], f, res_linear, interior)
                {
                    pieces.push(piece);
                }
                match xs[i].period().upper_cmp(&ys[j].period()) {
                    std::cmp::Ordering::Less => i += 1,
                    std::cmp::Ordering::Greater => j += 1,
                    std::cmp::Ordering::Equal => {
                        i += 1;
                        j += 1;
                    }
                }
            }
            collect_pieces(pieces)
        }
    }
}

fn collect_pieces<C: BaseType>(pieces: Vec<TSequence<C>>) -> Option<Temporal<C>> {
    (!pieces.is_empty()).then(|| Temporal::from(TSequenceSet::new_unchecked(pieces)))
}

/// Sequence × sequence kernel: restrict both to the shared period, walk the
/// merged breakpoints, insert interior instants, apply `f`.
pub(crate) fn lift_sequences<A, B, C, F>(
    a: &TSequence<A>,
    b: &TSequence<B>,
    f: &F,
    res_linear: bool,
    interior: InteriorFinder<'_, A, B>,
) -> Option<TSequence<C>>
where
    A: BaseType,
    B: BaseType,
    C: BaseType,
    F: Fn(&A, &B) -> C,
{
    let inter = a.period().intersection(&b.period())?;
    let sa = a.sub_sequence(&inter);
    let sb = b.sub_sequence(&inter);

    // Merged breakpoints of both synchronized inputs.
    let mut times: Vec<DateTime<Utc>> =
        Vec::with_capacity(sa.num_instants() + sb.num_instants());
    let (mut i, mut j) = (0, 0);
    let (xs, ys) = (sa.instants(), sb.instants());
    while i < xs.len() || j < ys.len() {
        let next = match (xs.get(i), ys.get(j)) {
            (Some(x), Some(y)) => {
                let (tx, ty) = (x.timestamp(), y.timestamp());
                if tx <= ty {
                    i += 1;
                    if tx == ty {
                        j += 1;
                    }
                    tx
                } else {
                    j += 1;
                    ty
                }
            }
            (Some(x), None) => {
                i += 1;
                x.timestamp()
            }
            (None, Some(y)) => {
                j += 1;
                y.timestamp()
            }
            (None, None) => break,
        };
        times.push(next);
    }

    let pairs: Vec<(DateTime<Utc>, A, B)> = times
        .into_iter()
        .map(|t| (t, sa.value_at_contained(t), sb.value_at_contained(t)))
        .collect();

    let both_linear = sa.is_linear() && sb.is_linear();
    let out_linear = C::CONTINUOUS && res_linear && both_linear;
    let mut out: Vec<TInstant<C>> = Vec::with_capacity(pairs.len());
    for k in 0..pairs.len() {
        if k > 0 && both_linear {
            if let Some(finder) = interior {
                let (t1, a1, b1) = &pairs[k - 1];
                let (t2, a2, b2) = &pairs[k];
                if let Some(fraction) = finder(a1, a2, b1, b2) {
                    if fraction > FRACTION_EPSILON && fraction < 1.0 - FRACTION_EPSILON {
                        let tm = timestamp_at_fraction(*t1, *t2, fraction);
                        if *t1 < tm && tm < *t2 {
                            // Re-derive the fraction from the emitted
                            // timestamp so the instant is exact at
                            // microsecond resolution.
                            let emitted = segment_fraction(*t1, *t2, tm);
                            let am = A::lerp(a1, a2, emitted);
                            let bm = B::lerp(b1, b2, emitted);
                            out.push(TInstant::new(f(&am, &bm), tm));
                        }
                    }
                }
            }
        }
        let (t, av, bv) = &pairs[k];
        out.push(TInstant::new(f(av, bv), *t));
    }

    let interp = if out_linear {
        TInterpolation::Linear
    } else {
        TInterpolation::Stepwise
    };
    // A stepwise result with an exclusive upper bound reports its held
    // value in the final instant.
    if interp == TInterpolation::Stepwise && !inter.is_upper_inclusive() && out.len() > 1 {
        let held = out[out.len() - 2].value().clone();
        let t = out[out.len() - 1].timestamp();
        let last = out.len() - 1;
        out[last] = TInstant::new(held, t);
    }
    trace!(
        instants = out.len(),
        linear = out_linear,
        "lifted a synchronized sequence pair"
    );
    Some(TSequence::new_unchecked(
        out,
        inter.is_lower_inclusive(),
        inter.is_upper_inclusive(),
        interp,
    ))
}

/// Applies `f` to every value of `a`. `interior` may split linear segments
/// (e.g. at zero crossings for `abs`).
pub(crate) fn lift_unary<A, C, F>(
    a: &Temporal<A>,
    f: &F,
    res_linear: bool,
    interior: Option<&dyn Fn(&A, &A) -> Option<f64>>,
) -> Temporal<C>
where
    A: BaseType,
    C: BaseType,
    F: Fn(&A) -> C,
{
    match a {
        Temporal::Instant(i) => {
            Temporal::Instant(TInstant::new(f(i.value()), i.timestamp()))
        }
        Temporal::InstantSet(s) => Temporal::from(TInstantSet::new_unchecked(
            s.instants()
                .iter()
                .map(|i| TInstant::new(f(i.value()), i.timestamp()))
                .collect(),
        )),
        Temporal::Sequence(s) => Temporal::from(lift_unary_sequence(s, f, res_linear, interior)),
        Temporal::SequenceSet(s) => Temporal::from(TSequenceSet::new_unchecked(
            s.sequences()
                .iter()
                .map(|seq| lift_unary_sequence(seq, f, res_linear, interior))
                .collect(),
        )),
    }
}

fn lift_unary_sequence<A, C, F>(
    a: &TSequence<A>,
    f: &F,
    res_linear: bool,
    interior: Option<&dyn Fn(&A, &A) -> Option<f64>>,
) -> TSequence<C>
where
    A: BaseType,
    C: BaseType,
    F: Fn(&A) -> C,
{
    let mut out: Vec<TInstant<C>> = Vec::with_capacity(a.num_instants());
    let instants = a.instants();
    for k in 0..instants.len() {
        if k > 0 && a.is_linear() {
            if let Some(finder) = interior {
                let (prev, cur) = (&instants[k - 1], &instants[k]);
                if let Some(fraction) = finder(prev.value(), cur.value()) {
                    if fraction > FRACTION_EPSILON && fraction < 1.0 - FRACTION_EPSILON {
                        let tm = timestamp_at_fraction(
                            prev.timestamp(),
                            cur.timestamp(),
                            fraction,
                        );
                        if prev.timestamp() < tm && tm < cur.timestamp() {
                            let emitted =
                                segment_fraction(prev.timestamp(), cur.timestamp(), tm);
                            let vm = A::lerp(prev.value(), cur.value(), emitted);
                            out.push(TInstant::new(f(&vm), tm));
                        }
                    }
                }
            }
        }
        out.push(TInstant::new(f(instants[k].value()), instants[k].timestamp()));
    }
    let interp = if C::CONTINUOUS && res_linear && a.is_linear() {
        TInterpolation::Linear
    } else {
        TInterpolation::Stepwise
    };
    if interp == TInterpolation::Stepwise && !a.is_upper_inclusive() && out.len() > 1 {
        let held = out[out.len() - 2].value().clone();
        let t = out[out.len() - 1].timestamp();
        let last = out.len() - 1;
        out[last] = TInstant::new(held, t);
    }
    TSequence::new_unchecked(
        out,
        a.is_lower_inclusive(),
        a.is_upper_inclusive(),
        interp,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn linear(values: &[(f64, i64)]) -> Temporal<f64> {
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
    fn pointwise_law_for_addition() {
        let a = linear(&[(1.0, 0), (5.0, 100)]);
        let b = linear(&[(4.0, 0), (0.0, 100)]);
        let sum: Temporal<f64> =
            lift_binary(&a, &b, &|x: &f64, y: &f64| x + y, true, None).unwrap();
        for secs in [0, 25, 50, 99, 100] {
            let t = ts(secs);
            let expected = a.value_at_timestamp(t).unwrap() + b.value_at_timestamp(t).unwrap();
            assert_eq!(sum.value_at_timestamp(t), Some(expected));
        }
    }

    #[test]
    fn instant_meets_sequence_only_inside() {
        let a = Temporal::Instant(TInstant::new(2.0, ts(50)));
        let b = linear(&[(0.0, 0), (10.0, 100)]);
        let out: Temporal<f64> =
            lift_binary(&a, &b, &|x: &f64, y: &f64| x * y, true, None).unwrap();
        assert_eq!(out.value_at_timestamp(ts(50)), Some(10.0));
        let outside = Temporal::Instant(TInstant::new(2.0, ts(500)));
        assert!(
            lift_binary::<_, _, f64, _>(&outside, &b, &|x: &f64, y: &f64| x * y, true, None)
                .is_none()
        );
    }

    #[test]
    fn interior_finder_inserts_crossing() {
        let a = linear(&[(0.0, 0), (10.0, 100)]);
        let b = linear(&[(10.0, 0), (0.0, 100)]);
        let crossing = |a1: &f64, a2: &f64, b1: &f64, b2: &f64| {
            f64::segment_crossing(a1, a2, b1, b2)
        };
        let min: Temporal<f64> = lift_binary(
            &a,
            &b,
            &|x: &f64, y: &f64| if x < y { *x } else { *y },
            true,
            Some(&crossing),
        )
        .unwrap();
        // min(a, b) peaks at the crossing t = 50, value 5
        assert_eq!(min.value_at_timestamp(ts(50)), Some(5.0));
        assert_eq!(min.value_at_timestamp(ts(25)), Some(2.5));
        assert_eq!(min.value_at_timestamp(ts(75)), Some(2.5));
    }
}
