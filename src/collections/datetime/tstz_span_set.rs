use chrono::{DateTime, TimeDelta, Utc};

use crate::collections::base::span_set::SpanSet;
use crate::collections::datetime::tstz_span::TsTzSpan;

/// A *period set*: ordered, disjoint, non-adjacent periods.
pub type TsTzSpanSet = SpanSet<DateTime<Utc>>;

impl TsTzSpanSet {
    /// Total covered time, gaps excluded.
    pub fn duration(&self) -> TimeDelta {
        self.iter()
            .fold(TimeDelta::zero(), |acc, s| acc + s.duration())
    }

    /// Elapsed time from first lower bound to last upper bound, gaps
    /// included.
    pub fn duration_with_gaps(&self) -> TimeDelta {
        self.to_span().duration()
    }

    /// Returns a new span set with every component shifted by `delta`.
    pub fn shift(&self, delta: TimeDelta) -> TsTzSpanSet {
        TsTzSpanSet::new(self.iter().map(|s| s.shift(delta)).collect(), false)
            .expect("shifting preserves order and gaps")
    }

    /// Returns a new span set rescaled so the hull duration is `width`;
    /// components and gaps scale proportionally.
    pub fn scale(&self, width: TimeDelta) -> TsTzSpanSet {
        self.shift_scale(None, Some(width))
    }

    pub fn shift_scale(&self, delta: Option<TimeDelta>, width: Option<TimeDelta>) -> TsTzSpanSet {
        let hull = self.to_span();
        let old_width = hull.duration().num_microseconds().unwrap_or(i64::MAX) as f64;
        let new_width = width
            .unwrap_or_else(|| hull.duration())
            .num_microseconds()
            .unwrap_or(i64::MAX) as f64;
        let origin = hull.lower() + delta.unwrap_or_else(TimeDelta::zero);
        let rescale = |t: chrono::DateTime<Utc>| {
            if old_width == 0.0 {
                origin
            } else {
                let offset = (t - hull.lower()).num_microseconds().unwrap_or(0) as f64;
                origin + TimeDelta::microseconds((offset / old_width * new_width) as i64)
            }
        };
        TsTzSpanSet::new(
            self.iter()
                .map(|s| {
                    let (lower, upper) = (rescale(s.lower()), rescale(s.upper()));
                    if lower == upper {
                        TsTzSpan::singleton(lower)
                    } else {
                        TsTzSpan::new(
                            lower,
                            upper,
                            s.is_lower_inclusive(),
                            s.is_upper_inclusive(),
                        )
                        .expect("rescaling preserves bound order")
                    }
                })
                .collect(),
            true,
        )
        .expect("rescaling keeps at least one span")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::datetime::tstz_span::TsTzSpan;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn durations_skip_and_include_gaps() {
        let set = TsTzSpanSet::new(
            vec![(ts(0)..ts(10)).into(), (ts(20)..ts(30)).into()],
            false,
        )
        .unwrap();
        assert_eq!(set.duration(), TimeDelta::seconds(20));
        assert_eq!(set.duration_with_gaps(), TimeDelta::seconds(30));
    }

    #[test]
    fn shift_preserves_gaps() {
        let set = TsTzSpanSet::new(
            vec![(ts(0)..ts(10)).into(), (ts(20)..ts(30)).into()],
            false,
        )
        .unwrap();
        let shifted = set.shift(TimeDelta::seconds(5));
        let expected: TsTzSpan = (ts(25)..ts(35)).into();
        assert_eq!(*shifted.end_span(), expected);
    }
}
