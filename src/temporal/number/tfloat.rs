use crate::temporal::impl_temporal_aliases;
use crate::temporal::lifting::lift_unary;

impl_temporal_aliases!(Float, f64);

impl TFloat {
    /// Rounds every value to `decimals` decimal places.
    pub fn round(&self, decimals: u32) -> TFloat {
        let factor = 10f64.powi(decimals as i32);
        lift_unary(self, &|v: &f64| (v * factor).round() / factor, true, None)
    }

    /// Converts radians to degrees.
    pub fn degrees(&self) -> TFloat {
        lift_unary(self, &|v: &f64| v.to_degrees(), true, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::temporal::Temporal;
    use crate::temporal::tinstant::TInstant;
    use chrono::DateTime;

    #[test]
    fn round_applies_per_instant() {
        let t = DateTime::from_timestamp(0, 0).unwrap();
        let inst = Temporal::Instant(TInstant::new(1.23456, t));
        assert_eq!(inst.round(2).value_at_timestamp(t), Some(1.23));
    }
}
