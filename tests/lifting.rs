//! Lifting laws: pointwise semantics, synchronization, turning points, and
//! bounding-box fast reject.

use chrono::{DateTime, Utc};
use tempora::boxes::BoundingBox;
use tempora::{TInstant, TInstantSet, TInterpolation, TSequence, Temporal};

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
            true,
        )
        .unwrap(),
    )
}

#[test]
fn addition_of_opposite_slopes_is_constant() {
    // spec scenario 2: 1→5 plus 4→0 gives the constant 5
    let a = linear(&[(1.0, 0), (5.0, 200)]);
    let b = linear(&[(4.0, 0), (0.0, 200)]);
    let sum = a.add(&b).unwrap();
    assert!(sum.always_eq(&5.0));
    assert_eq!(sum.start_timestamp(), ts(0));
    assert_eq!(sum.end_timestamp(), ts(200));
}

#[test]
fn multiplication_has_interior_turning_point() {
    // spec scenario 3: (−1→1)·(1→−1): value 0 at the midpoint, −1 at both
    // ends
    let a = linear(&[(-1.0, 0), (1.0, 100)]);
    let b = linear(&[(1.0, 0), (-1.0, 100)]);
    let product = a.mul(&b).unwrap();
    assert_eq!(product.value_at_timestamp(ts(0)), Some(-1.0));
    assert_eq!(product.value_at_timestamp(ts(100)), Some(-1.0));
    assert_eq!(product.value_at_timestamp(ts(50)), Some(0.0));
    assert!(product.timestamps().contains(&ts(50)));
}

#[test]
fn pointwise_law_over_synchronized_domain() {
    let a = linear(&[(2.0, 0), (8.0, 60), (4.0, 120)]);
    let b = linear(&[(1.0, 30), (5.0, 150)]);
    let sum = a.add(&b).unwrap();
    // addition is linear, so the law holds at every shared timestamp
    for secs in [30, 45, 60, 90, 119, 120] {
        let t = ts(secs);
        let (av, bv) = (
            a.value_at_timestamp(t).unwrap(),
            b.value_at_timestamp(t).unwrap(),
        );
        let sv = sum.value_at_timestamp(t).unwrap();
        assert!((sv - (av + bv)).abs() < 1e-9, "sum law broken at {secs}s");
    }
    // the product interpolates between its instants, so the law is exact
    // at every materialized instant (breakpoints and turning points)
    let product = a.mul(&b).unwrap();
    for t in product.timestamps() {
        let (av, bv) = (
            a.value_at_timestamp_inclusive(t).unwrap(),
            b.value_at_timestamp_inclusive(t).unwrap(),
        );
        let pv = product.value_at_timestamp_inclusive(t).unwrap();
        assert!((pv - av * bv).abs() < 1e-9);
    }
    // outside the shared domain both lifts are undefined
    assert_eq!(sum.value_at_timestamp(ts(10)), None);
    assert_eq!(sum.value_at_timestamp(ts(130)), None);
}

#[test]
fn instant_operand_samples_the_other_side() {
    let a = Temporal::Instant(TInstant::new(3.0, ts(50)));
    let b = linear(&[(0.0, 0), (10.0, 100)]);
    let sum = a.add(&b).unwrap();
    assert_eq!(sum.value_at_timestamp(ts(50)), Some(8.0));
    assert_eq!(sum.num_instants(), 1);
    // no shared instant, no result
    let outside = Temporal::Instant(TInstant::new(3.0, ts(500)));
    assert!(outside.add(&b).is_none());
}

#[test]
fn instant_sets_meet_at_shared_timestamps() {
    let a: Temporal<i32> = Temporal::InstantSet(
        TInstantSet::new(vec![
            TInstant::new(1, ts(0)),
            TInstant::new(2, ts(10)),
            TInstant::new(3, ts(20)),
        ])
        .unwrap(),
    );
    let b: Temporal<i32> = Temporal::InstantSet(
        TInstantSet::new(vec![TInstant::new(10, ts(10)), TInstant::new(10, ts(30))])
            .unwrap(),
    );
    let sum = a.add(&b).unwrap();
    assert_eq!(sum.num_instants(), 1);
    assert_eq!(sum.value_at_timestamp(ts(10)), Some(12));
}

#[test]
fn stepwise_operand_degrades_result_to_stepwise() {
    let a = linear(&[(0.0, 0), (10.0, 100)]);
    let b: Temporal<f64> = Temporal::Sequence(
        TSequence::new(
            vec![TInstant::new(1.0, ts(0)), TInstant::new(1.0, ts(100))],
            true,
            true,
            TInterpolation::Stepwise,
            false,
        )
        .unwrap(),
    );
    let sum = a.add(&b).unwrap();
    assert_eq!(sum.interpolation(), TInterpolation::Stepwise);
}

#[test]
fn division_by_zero_detection_is_domain_exact() {
    let numerator = linear(&[(1.0, 0), (1.0, 100)]);
    // the denominator crosses zero inside the shared domain
    let crossing = linear(&[(-1.0, 0), (1.0, 100)]);
    assert!(numerator.div(&crossing).is_err());
    // a zero outside the shared domain does not fail
    let late_zero = linear(&[(2.0, 50), (0.0, 300)]);
    let shared = numerator.div(&late_zero).unwrap().unwrap();
    assert_eq!(shared.end_timestamp(), ts(100));
    let denominator_at_end = late_zero.value_at_timestamp(ts(100)).unwrap();
    assert_eq!(
        shared.value_at_timestamp(ts(100)),
        Some(1.0 / denominator_at_end)
    );
}

#[test]
fn bounding_boxes_reject_disjoint_operands() {
    let a = linear(&[(0.0, 0), (1.0, 100)]);
    let b = linear(&[(5.0, 200), (6.0, 300)]);
    // disjoint in time: no lifted result, boxes do not overlap
    assert!(a.add(&b).is_none());
    assert!(!a.bounding_box().overlaps(&b.bounding_box()));
    assert!(!a.tbox().overlaps(&b.tbox()));
    // disjoint in value only: time boxes overlap, value boxes reject
    let c = linear(&[(5.0, 0), (6.0, 100)]);
    assert!(!a.tbox().value_span().unwrap().overlaps(c.tbox().value_span().unwrap()));
    assert!(!a.ever_eq(&5.5));
    assert!(a.at_value(&5.5).is_none());
}

#[test]
fn boolean_lifting() {
    let t_true = Temporal::Sequence(
        TSequence::new(
            vec![TInstant::new(true, ts(0)), TInstant::new(true, ts(100))],
            true,
            true,
            TInterpolation::Stepwise,
            false,
        )
        .unwrap(),
    );
    let flipping = Temporal::Sequence(
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
    let conj = t_true.tand(&flipping).unwrap();
    assert_eq!(conj.value_at_timestamp(ts(25)), Some(false));
    assert_eq!(conj.value_at_timestamp(ts(75)), Some(true));
    let spans = conj.when_true().unwrap();
    assert!(spans.contains_value(&ts(50)));
    assert!(!spans.contains_value(&ts(49)));
}
