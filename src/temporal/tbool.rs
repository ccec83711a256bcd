use crate::collections::datetime::tstz_span_set::TsTzSpanSet;
use crate::temporal::impl_temporal_aliases;
use crate::temporal::lifting::{lift_binary, lift_unary};

impl_temporal_aliases!(Bool, bool);

impl TBool {
    /// Pointwise conjunction over the synchronized domain.
    pub fn tand(&self, other: &TBool) -> Option<TBool> {
        lift_binary(self, other, &|a: &bool, b: &bool| *a && *b, false, None)
    }

    /// Pointwise disjunction over the synchronized domain.
    pub fn tor(&self, other: &TBool) -> Option<TBool> {
        lift_binary(self, other, &|a: &bool, b: &bool| *a || *b, false, None)
    }

    pub fn tnot(&self) -> TBool {
        lift_unary(self, &|v: &bool| !v, false, None)
    }

    /// The time during which the value is true.
    pub fn when_true(&self) -> Option<TsTzSpanSet> {
        self.at_value(&true).map(|at| at.time())
    }

    pub fn ever_true(&self) -> bool {
        self.ever_eq(&true)
    }

    pub fn always_true(&self) -> bool {
        self.always_eq(&true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::interpolation::TInterpolation;
    use crate::temporal::temporal::Temporal;
    use crate::temporal::tinstant::TInstant;
    use crate::temporal::tsequence::TSequence;
    use chrono::DateTime;

    fn ts(secs: i64) -> chrono::DateTime<chrono::Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn step(values: &[(bool, i64)]) -> TBool {
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
    fn boolean_algebra_is_pointwise() {
        let a = step(&[(true, 0), (false, 10), (false, 20)]);
        let b = step(&[(true, 0), (true, 20)]);
        let both = a.tand(&b).unwrap();
        assert_eq!(both.value_at_timestamp(ts(5)), Some(true));
        assert_eq!(both.value_at_timestamp(ts(15)), Some(false));
        let either = a.tor(&b).unwrap();
        assert!(either.always_true());
        assert!(a.tnot().ever_true());
    }

    #[test]
    fn when_true_returns_covered_time() {
        let a = step(&[(true, 0), (false, 10), (false, 20)]);
        let spans = a.when_true().unwrap();
        assert!(spans.contains_value(&ts(9)));
        assert!(!spans.contains_value(&ts(10)));
    }
}
