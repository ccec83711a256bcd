//! Aggregation over the skiplist state: commutativity, splice idempotence,
//! partial-state combine, and the serialize pair.

use chrono::{DateTime, Utc};
use tempora::aggregation::aggregates::{
    extent_time_transition, tagg_finalize, tavg_finalize, tavg_transition, tcount_transition,
    tmax_transition, tmin_combine, tmin_transition, tor_transition, tsum_transition,
};
use tempora::{
    AggContext, CancelToken, SkipList, TInstant, TInterpolation, TSequence, Temporal,
};

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
fn tmin_inserts_crossings_between_linear_inputs() {
    let mut ctx = AggContext::with_seed(1);
    let a = linear(&[(0.0, 0), (10.0, 100)]);
    let b = linear(&[(10.0, 0), (0.0, 100)]);
    let state = tmin_transition(&mut ctx, None, Some(&a)).unwrap();
    let state = tmin_transition(&mut ctx, state, Some(&b)).unwrap();
    let min = tagg_finalize(state.as_ref()).unwrap();
    assert_eq!(min.value_at_timestamp(ts(50)), Some(5.0));
    assert_eq!(min.value_at_timestamp(ts(25)), Some(2.5));
    assert_eq!(min.value_at_timestamp(ts(75)), Some(2.5));
    assert!(min.timestamps().contains(&ts(50)));
}

#[test]
fn aggregation_commutes_over_input_permutations() {
    let inputs = [
        step(&[(1, 0), (1, 100)]),
        step(&[(2, 40), (2, 140)]),
        step(&[(5, 20), (5, 60)]),
        step(&[(3, 130), (3, 200)]),
    ];
    let orders: [[usize; 4]; 4] = [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1], [1, 3, 0, 2]];
    let mut results = Vec::new();
    for order in orders {
        let mut ctx = AggContext::with_seed(99);
        let mut state = None;
        for idx in order {
            state = tsum_transition(&mut ctx, state, Some(&inputs[idx])).unwrap();
        }
        results.push(tagg_finalize(state.as_ref()).unwrap());
    }
    for secs in [0, 10, 20, 30, 50, 70, 90, 110, 135, 150, 199, 200] {
        let expected = results[0].value_at_timestamp(ts(secs));
        for other in &results[1..] {
            assert_eq!(other.value_at_timestamp(ts(secs)), expected, "at {secs}s");
        }
    }
}

#[test]
fn splice_idempotence_with_min() {
    // spec scenario 5: ingesting the same batch twice leaves the state as
    // after one ingestion
    let value = linear(&[(4.0, 0), (8.0, 100)]);
    let mut ctx = AggContext::with_seed(17);
    let state = tmin_transition(&mut ctx, None, Some(&value)).unwrap();
    let once = tagg_finalize(state.as_ref()).unwrap();
    let state = tmin_transition(&mut ctx, state, Some(&value)).unwrap();
    let twice = tagg_finalize(state.as_ref()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn combine_merges_partial_states() {
    let mut ctx = AggContext::with_seed(23);
    let a = step(&[(1, 0), (1, 100)]);
    let b = step(&[(7, 50), (7, 150)]);
    let state_a = tmin_transition(&mut ctx, None, Some(&a)).unwrap();
    let state_b = tmin_transition(&mut ctx, None, Some(&b)).unwrap();
    let combined = tmin_combine(&mut ctx, state_a, state_b).unwrap();
    let out = tagg_finalize(combined.as_ref()).unwrap();
    assert_eq!(out.value_at_timestamp(ts(25)), Some(1));
    assert_eq!(out.value_at_timestamp(ts(75)), Some(1));
    assert_eq!(out.value_at_timestamp(ts(125)), Some(7));
}

#[test]
fn tmax_and_tor_and_tcount() {
    let mut ctx = AggContext::with_seed(31);
    let a = step(&[(1, 0), (1, 100)]);
    let b = step(&[(7, 50), (7, 150)]);
    let state = tmax_transition(&mut ctx, None, Some(&a)).unwrap();
    let state = tmax_transition(&mut ctx, state, Some(&b)).unwrap();
    let max = tagg_finalize(state.as_ref()).unwrap();
    assert_eq!(max.value_at_timestamp(ts(75)), Some(7));

    let state = tcount_transition(&mut ctx, None, Some(&a)).unwrap();
    let state = tcount_transition(&mut ctx, state, Some(&b)).unwrap();
    let count = tagg_finalize(state.as_ref()).unwrap();
    assert_eq!(count.value_at_timestamp(ts(25)), Some(1));
    assert_eq!(count.value_at_timestamp(ts(75)), Some(2));
    assert_eq!(count.value_at_timestamp(ts(125)), Some(1));

    let flips = Temporal::Sequence(
        TSequence::new(
            vec![
                TInstant::new(false, ts(0)),
                TInstant::new(true, ts(50)),
                TInstant::new(true, ts(100)),
            ],
            true,
            true,
            TInterpolation::Stepwise,
            false,
        )
        .unwrap(),
    );
    let always_false = Temporal::Sequence(
        TSequence::new(
            vec![TInstant::new(false, ts(0)), TInstant::new(false, ts(100))],
            true,
            true,
            TInterpolation::Stepwise,
            false,
        )
        .unwrap(),
    );
    let state = tor_transition(&mut ctx, None, Some(&flips)).unwrap();
    let state = tor_transition(&mut ctx, state, Some(&always_false)).unwrap();
    let any = tagg_finalize(state.as_ref()).unwrap();
    assert_eq!(any.value_at_timestamp(ts(25)), Some(false));
    assert_eq!(any.value_at_timestamp(ts(75)), Some(true));
}

#[test]
fn tavg_over_instants_and_sequences() {
    let mut ctx = AggContext::with_seed(41);
    let a = step(&[(10, 0), (10, 100)]);
    let b = step(&[(20, 0), (20, 100)]);
    let state = tavg_transition(&mut ctx, None, Some(&a)).unwrap();
    let state = tavg_transition(&mut ctx, state, Some(&b)).unwrap();
    let avg = tavg_finalize(state.as_ref()).unwrap();
    assert_eq!(avg.value_at_timestamp(ts(50)), Some(15.0));
}

#[test]
fn state_serialization_round_trips() {
    let mut ctx = AggContext::with_seed(53);
    let a = step(&[(10, 0), (10, 100)]);
    let b = step(&[(20, 50), (20, 150)]);
    let state = tsum_transition(&mut ctx, None, Some(&a)).unwrap();
    let state = tsum_transition(&mut ctx, state, Some(&b)).unwrap().unwrap();
    let mut state = state;
    state.set_extra(vec![1, 2, 3]);
    let bytes = state.serialize();
    let restored: SkipList<i32> = SkipList::deserialize(&bytes).unwrap();
    assert_eq!(restored.extra(), &[1, 2, 3]);
    assert_eq!(
        tagg_finalize(Some(&restored)),
        tagg_finalize(Some(&state))
    );
}

#[test]
fn cancellation_surfaces_and_poisons_the_state() {
    let token = CancelToken::new();
    let mut ctx = AggContext::with_seed(61).with_cancel_token(token.clone());
    let a = step(&[(1, 0), (1, 100)]);
    let state = tsum_transition(&mut ctx, None, Some(&a)).unwrap();
    token.cancel();
    let b = step(&[(2, 50), (2, 150)]);
    let result = tsum_transition(&mut ctx, state, Some(&b));
    assert!(matches!(result, Err(tempora::Error::Cancelled)));
}

#[test]
fn extent_aggregates_expand_monotonically() {
    let a = step(&[(1, 0), (1, 100)]);
    let b = step(&[(9, 500), (9, 600)]);
    let extent = extent_time_transition(None, Some(&a));
    let extent = extent_time_transition(extent, Some(&b)).unwrap();
    assert_eq!(extent.lower(), ts(0));
    assert_eq!(extent.upper(), ts(600));
    // empty input leaves the extent unchanged
    let unchanged = extent_time_transition::<i32>(Some(extent.clone()), None).unwrap();
    assert_eq!(unchanged, extent);
}
