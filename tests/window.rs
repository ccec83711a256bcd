//! Moving-window aggregates: extension rewrites and end-to-end windows.

use chrono::{DateTime, TimeDelta, Utc};
use tempora::aggregation::aggregates::{tagg_finalize, tavg_finalize};
use tempora::aggregation::window::{
    wavg_transition, wcount_transition, wmax_transition, wmin_transition, wsum_transition,
};
use tempora::{AggContext, TInstant, TInterpolation, TSequence, Temporal};

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

fn step(values: &[(i32, i64)]) -> Temporal<i32> {
    Temporal::Sequence(
        TSequence::new(
            values.iter().map(|&(v, t)| TInstant::new(v, ts(t))).collect(),
            true,
            true,
            TInterpolation::Stepwise,
            false,
        )
        .unwrap(),
    )
}

#[test]
fn wcount_over_two_half_overlapping_sequences() {
    // spec scenario 4: Δ = 1 day, inputs over [t0, t0+1d] and
    // [t0+12h, t0+36h]: count 1, then 2, then 1 again
    let day = TimeDelta::days(1);
    let h = |hours: i64| ts(hours * 3600);
    let a = linear(&[(0.0, 0), (0.0, 24 * 3600)]);
    let b = linear(&[(0.0, 12 * 3600), (0.0, 36 * 3600)]);
    let mut ctx = AggContext::with_seed(2);
    let state = wcount_transition(&mut ctx, None, Some(&a), day).unwrap();
    let state = wcount_transition(&mut ctx, state, Some(&b), day).unwrap();
    let count = tagg_finalize(state.as_ref()).unwrap();

    assert_eq!(count.value_at_timestamp(h(0)), Some(1));
    assert_eq!(count.value_at_timestamp(h(11)), Some(1));
    assert_eq!(count.value_at_timestamp(h(12)), Some(2));
    assert_eq!(count.value_at_timestamp(h(30)), Some(2));
    assert_eq!(count.value_at_timestamp(h(48)), Some(2));
    assert_eq!(count.value_at_timestamp(h(49)), Some(1));
    assert_eq!(count.value_at_timestamp(h(60)), Some(1));
    assert_eq!(count.value_at_timestamp(h(61)), None);

    // the window law: the count at t is the number of extended input
    // periods containing t
    let extended = [
        (h(0), h(48)),
        (h(12), h(60)),
    ];
    for hour in 0..=61 {
        let t = h(hour);
        let expected: i32 = extended
            .iter()
            .filter(|&&(lo, hi)| lo <= t && t <= hi)
            .count() as i32;
        let actual = count.value_at_timestamp(t).unwrap_or(0);
        assert_eq!(actual, expected, "at hour {hour}");
    }
}

#[test]
fn wmin_preserves_the_minimum_through_rising_segments() {
    // a rising segment would lose its start minimum if only the end were
    // extended
    let value = linear(&[(1.0, 0), (5.0, 100)]);
    let mut ctx = AggContext::with_seed(3);
    let state =
        wmin_transition(&mut ctx, None, Some(&value), TimeDelta::seconds(50)).unwrap();
    let out = tagg_finalize(state.as_ref()).unwrap();
    // the start value 1 survives for the whole window length
    assert_eq!(out.value_at_timestamp(ts(0)), Some(1.0));
    assert_eq!(out.value_at_timestamp(ts(50)), Some(1.0));
    // afterwards the minimum trails the rising input by the window
    assert_eq!(out.value_at_timestamp(ts(150)), Some(5.0));
}

#[test]
fn wmax_mirrors_wmin() {
    let value = linear(&[(5.0, 0), (1.0, 100)]);
    let mut ctx = AggContext::with_seed(4);
    let state =
        wmax_transition(&mut ctx, None, Some(&value), TimeDelta::seconds(50)).unwrap();
    let out = tagg_finalize(state.as_ref()).unwrap();
    assert_eq!(out.value_at_timestamp(ts(0)), Some(5.0));
    assert_eq!(out.value_at_timestamp(ts(50)), Some(5.0));
    assert_eq!(out.value_at_timestamp(ts(150)), Some(1.0));
}

#[test]
fn wsum_over_integer_steps() {
    let a = step(&[(1, 0), (1, 100)]);
    let b = step(&[(2, 50), (2, 150)]);
    let mut ctx = AggContext::with_seed(5);
    let state = wsum_transition(&mut ctx, None, Some(&a), TimeDelta::seconds(25)).unwrap();
    let state = wsum_transition(&mut ctx, state, Some(&b), TimeDelta::seconds(25)).unwrap();
    let out = tagg_finalize(state.as_ref()).unwrap();
    assert_eq!(out.value_at_timestamp(ts(25)), Some(1));
    assert_eq!(out.value_at_timestamp(ts(75)), Some(3));
    assert_eq!(out.value_at_timestamp(ts(110)), Some(3));
    assert_eq!(out.value_at_timestamp(ts(130)), Some(2));
    assert_eq!(out.value_at_timestamp(ts(170)), Some(2));
    assert_eq!(out.value_at_timestamp(ts(176)), None);
}

#[test]
fn wsum_rejects_float_sequences_wavg_rejects_too() {
    let mut ctx = AggContext::with_seed(6);
    let float_seq = linear(&[(1.0, 0), (2.0, 100)]);
    assert!(matches!(
        wsum_transition(&mut ctx, None, Some(&float_seq), TimeDelta::seconds(10)),
        Err(tempora::Error::NotSupported(_))
    ));
    assert!(matches!(
        wavg_transition(&mut ctx, None, Some(&float_seq), TimeDelta::seconds(10)),
        Err(tempora::Error::NotSupported(_))
    ));
    // float instants are fine for both
    let inst = Temporal::Instant(TInstant::new(1.5, ts(0)));
    assert!(wsum_transition(&mut ctx, None, Some(&inst), TimeDelta::seconds(10)).is_ok());
    assert!(wavg_transition(&mut ctx, None, Some(&inst), TimeDelta::seconds(10)).is_ok());
}

#[test]
fn wavg_windows_integer_inputs() {
    let mut ctx = AggContext::with_seed(7);
    let a = Temporal::Instant(TInstant::new(10, ts(0)));
    let b = Temporal::Instant(TInstant::new(30, ts(60)));
    let window = TimeDelta::seconds(100);
    let state = wavg_transition(&mut ctx, None, Some(&a), window).unwrap();
    let state = wavg_transition(&mut ctx, state, Some(&b), window).unwrap();
    let avg = tavg_finalize(state.as_ref()).unwrap();
    assert_eq!(avg.value_at_timestamp(ts(30)), Some(10.0));
    assert_eq!(avg.value_at_timestamp(ts(80)), Some(20.0));
    assert_eq!(avg.value_at_timestamp(ts(120)), Some(30.0));
}

#[test]
fn invalid_window_is_rejected() {
    let mut ctx = AggContext::with_seed(8);
    let a = step(&[(1, 0), (1, 100)]);
    assert!(wmin_transition(&mut ctx, None, Some(&a), TimeDelta::zero()).is_err());
    assert!(wcount_transition(&mut ctx, None, Some(&a), TimeDelta::seconds(-5)).is_err());
}
