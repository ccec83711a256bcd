//! Restriction round trips and idempotence: `at(X, p) ∪ minus(X, p) = X`
//! and `at(at(X, p), p) = at(X, p)` for every operand kind.

use chrono::{DateTime, Utc};
use tempora::{
    IntSpan, TInstant, TInterpolation, TSequence, TSequenceSet, Temporal, TsTzSet, TsTzSpan,
    TsTzSpanSet,
};

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn step_value() -> Temporal<i32> {
    let first = TSequence::new(
        vec![
            TInstant::new(1, ts(0)),
            TInstant::new(2, ts(10)),
            TInstant::new(2, ts(30)),
        ],
        true,
        true,
        TInterpolation::Stepwise,
        false,
    )
    .unwrap();
    let second = TSequence::new(
        vec![TInstant::new(5, ts(50)), TInstant::new(5, ts(70))],
        true,
        true,
        TInterpolation::Stepwise,
        false,
    )
    .unwrap();
    Temporal::SequenceSet(TSequenceSet::new(vec![first, second], false).unwrap())
}

/// Checks `at ∪ minus = X` by domain-disjoint merge.
fn assert_round_trip(
    x: &Temporal<i32>,
    at: Option<Temporal<i32>>,
    minus: Option<Temporal<i32>>,
) {
    let merged = match (&at, &minus) {
        (Some(a), Some(m)) => a.merge(m).unwrap(),
        (Some(a), None) => a.clone(),
        (None, Some(m)) => m.clone(),
        (None, None) => panic!("both restrictions empty"),
    };
    // merge yields the minimal subtype, so compare through a common shape
    assert_eq!(merged.time(), x.time(), "covered time differs");
    for t in x.timestamps() {
        assert_eq!(merged.value_at_timestamp(t), x.value_at_timestamp(t));
    }
    for probe in [5, 15, 25, 35, 55, 65] {
        assert_eq!(
            merged.value_at_timestamp(ts(probe)),
            x.value_at_timestamp(ts(probe))
        );
    }
}

#[test]
fn round_trip_value() {
    let x = step_value();
    assert_round_trip(&x, x.at_value(&2), x.minus_value(&2));
    // a value never taken restricts to nothing
    assert!(x.at_value(&9).is_none());
    assert_round_trip(&x, x.at_value(&9), x.minus_value(&9));
}

#[test]
fn round_trip_values() {
    let x = step_value();
    let values = [1, 5];
    assert_round_trip(&x, x.at_values(&values), x.minus_values(&values));
}

#[test]
fn round_trip_span() {
    let x = step_value();
    let span: IntSpan = (2..=4).into();
    assert_round_trip(&x, x.at_span(&span), x.minus_span(&span));
}

#[test]
fn round_trip_timestamp() {
    let x = step_value();
    for secs in [0, 10, 15, 40, 70] {
        assert_round_trip(&x, x.at_timestamp(ts(secs)), x.minus_timestamp(ts(secs)));
    }
}

#[test]
fn round_trip_timestamp_set() {
    let x = step_value();
    let set = TsTzSet::new(vec![ts(5), ts(10), ts(40), ts(60)]).unwrap();
    assert_round_trip(&x, x.at_timestamp_set(&set), x.minus_timestamp_set(&set));
}

#[test]
fn round_trip_period() {
    let x = step_value();
    for period in [
        TsTzSpan::new(ts(5), ts(25), true, false).unwrap(),
        TsTzSpan::new(ts(0), ts(70), true, true).unwrap(),
        TsTzSpan::new(ts(35), ts(45), true, true).unwrap(),
    ] {
        assert_round_trip(&x, x.at_period(&period), x.minus_period(&period));
    }
}

#[test]
fn round_trip_period_set() {
    let x = step_value();
    let periods = TsTzSpanSet::new(
        vec![
            TsTzSpan::new(ts(5), ts(15), true, false).unwrap(),
            TsTzSpan::new(ts(55), ts(65), true, true).unwrap(),
        ],
        false,
    )
    .unwrap();
    assert_round_trip(&x, x.at_period_set(&periods), x.minus_period_set(&periods));
}

#[test]
fn restriction_is_idempotent() {
    let x = step_value();
    let period = TsTzSpan::new(ts(5), ts(25), true, false).unwrap();
    let once = x.at_period(&period).unwrap();
    let twice = once.at_period(&period).unwrap();
    assert_eq!(once, twice);

    let none_once = x.minus_period(&TsTzSpan::new(ts(0), ts(100), true, true).unwrap());
    assert!(none_once.is_none());

    let at_two = x.at_value(&2).unwrap();
    assert_eq!(at_two.at_value(&2).unwrap(), at_two);
    assert!(at_two.minus_value(&2).is_none());
}

#[test]
fn linear_round_trip_is_pointwise_exact() {
    let x: Temporal<f64> = Temporal::Sequence(
        TSequence::new(
            vec![TInstant::new(0.0, ts(0)), TInstant::new(10.0, ts(100))],
            true,
            true,
            TInterpolation::Linear,
            false,
        )
        .unwrap(),
    );
    let period = TsTzSpan::new(ts(20), ts(60), true, false).unwrap();
    let at = x.at_period(&period).unwrap();
    let minus = x.minus_period(&period).unwrap();
    let merged = at.merge(&minus).unwrap();
    assert_eq!(merged.time(), x.time());
    for secs in [0, 10, 20, 40, 59, 60, 80, 100] {
        let got = merged.value_at_timestamp(ts(secs)).unwrap();
        let want = x.value_at_timestamp(ts(secs)).unwrap();
        assert!((got - want).abs() < 1e-9, "at {secs}s: {got} vs {want}");
    }
}

#[test]
fn value_at_timestamp_bound_rules() {
    let x: Temporal<f64> = Temporal::Sequence(
        TSequence::new(
            vec![TInstant::new(0.0, ts(0)), TInstant::new(10.0, ts(100))],
            false,
            false,
            TInterpolation::Linear,
            false,
        )
        .unwrap(),
    );
    // bound-exact access answers nothing at exclusive bounds
    assert_eq!(x.value_at_timestamp(ts(0)), None);
    assert_eq!(x.value_at_timestamp(ts(100)), None);
    assert_eq!(x.value_at_timestamp(ts(50)), Some(5.0));
    // the inclusive variant answers with the bound instant's own value
    assert_eq!(x.value_at_timestamp_inclusive(ts(0)), Some(0.0));
    assert_eq!(x.value_at_timestamp_inclusive(ts(100)), Some(10.0));
}

#[test]
fn at_value_on_linear_sequence_emits_crossings() {
    let x: Temporal<f64> = Temporal::Sequence(
        TSequence::new(
            vec![
                TInstant::new(0.0, ts(0)),
                TInstant::new(10.0, ts(100)),
                TInstant::new(0.0, ts(200)),
            ],
            true,
            true,
            TInterpolation::Linear,
            false,
        )
        .unwrap(),
    );
    let at = x.at_value(&5.0).unwrap();
    let stamps = at.timestamps();
    assert_eq!(stamps, vec![ts(50), ts(150)]);
    for t in stamps {
        assert_eq!(at.value_at_timestamp(t), Some(5.0));
    }
}

#[test]
fn ever_always_predicates() {
    let x = step_value();
    assert!(x.ever_eq(&5));
    assert!(!x.ever_eq(&3));
    assert!(x.ever_lt(&2));
    assert!(x.always_lt(&6));
    assert!(!x.always_lt(&5));
    assert!(x.always_le(&5));
    assert!(x.ever_le(&1));
}
