use crate::temporal::impl_temporal_aliases;
use crate::temporal::lifting::lift_unary;
use crate::temporal::number::tfloat::TFloat;

impl_temporal_aliases!(Int, i32);

impl TInt {
    /// Widens to a temporal float; the stepwise shape is preserved.
    pub fn to_tfloat(&self) -> TFloat {
        lift_unary(self, &|v: &i32| *v as f64, false, None)
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

    #[test]
    fn widening_preserves_step_shape() {
        let ts = |secs| DateTime::from_timestamp(secs, 0).unwrap();
        let seq = Temporal::Sequence(
            TSequence::new(
                vec![TInstant::new(1, ts(0)), TInstant::new(2, ts(10))],
                true,
                true,
                TInterpolation::Stepwise,
                false,
            )
            .unwrap(),
        );
        let widened = seq.to_tfloat();
        assert_eq!(widened.interpolation(), TInterpolation::Stepwise);
        assert_eq!(widened.value_at_timestamp(ts(5)), Some(1.0));
    }
}
