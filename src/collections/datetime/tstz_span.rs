use std::cmp;
use std::ops::{BitAnd, Range, RangeInclusive};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::collections::base::span::Span;

/// A *period*: a bounded time interval with per-endpoint inclusivity.
///
/// This is the time axis instance of [`Span`] and doubles as the time
/// bounding box of every temporal value.
pub type TsTzSpan = Span<DateTime<Utc>>;

impl TsTzSpan {
    /// Elapsed time between the two bounds.
    ///
    /// ## Example
    /// ```
    /// # use tempora::collections::datetime::tstz_span::TsTzSpan;
    /// # use chrono::{NaiveDate, TimeDelta};
    /// let from_ymd = |y, m, d| NaiveDate::from_ymd_opt(y, m, d)
    ///     .unwrap().and_hms_opt(0, 0, 0).unwrap().and_utc();
    ///
    /// let span: TsTzSpan = (from_ymd(2023, 1, 1)..from_ymd(2023, 1, 15)).into();
    /// assert_eq!(span.duration(), TimeDelta::days(14));
    /// ```
    pub fn duration(&self) -> TimeDelta {
        self.upper() - self.lower()
    }

    /// Returns a new span with both bounds shifted by `delta`.
    pub fn shift(&self, delta: TimeDelta) -> TsTzSpan {
        self.shift_scale(Some(delta), None)
    }

    /// Returns a new span rescaled so that its duration is `width`.
    pub fn scale(&self, width: TimeDelta) -> TsTzSpan {
        self.shift_scale(None, Some(width))
    }

    /// Returns a new span shifted by `delta` and rescaled to duration
    /// `width`, keeping the bound inclusivities.
    pub fn shift_scale(&self, delta: Option<TimeDelta>, width: Option<TimeDelta>) -> TsTzSpan {
        let lower = self.lower() + delta.unwrap_or_else(TimeDelta::zero);
        let upper = match width {
            Some(w) => lower + w,
            None => self.upper() + delta.unwrap_or_else(TimeDelta::zero),
        };
        TsTzSpan::new(lower, upper, self.is_lower_inclusive(), self.is_upper_inclusive())
            .expect("shifting and scaling preserve bound order")
    }

    /// Time separating the span from a timestamp; zero when contained.
    pub fn distance_to_value(&self, value: &DateTime<Utc>) -> TimeDelta {
        if *value < self.lower() {
            self.lower() - *value
        } else if *value > self.upper() {
            *value - self.upper()
        } else {
            TimeDelta::zero()
        }
    }

    /// Time separating two spans; zero when they overlap or touch.
    pub fn distance_to_span(&self, other: &Self) -> TimeDelta {
        if self.upper() < other.lower() {
            other.lower() - self.upper()
        } else if other.upper() < self.lower() {
            self.lower() - other.upper()
        } else {
            TimeDelta::zero()
        }
    }
}

impl Eq for TsTzSpan {}

impl Ord for TsTzSpan {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.compare(other)
    }
}

impl<Tz: TimeZone> From<Range<DateTime<Tz>>> for TsTzSpan {
    /// Builds the half-open period `[start, end)`.
    fn from(Range { start, end }: Range<DateTime<Tz>>) -> Self {
        TsTzSpan::new(start.with_timezone(&Utc), end.with_timezone(&Utc), true, false)
            .expect("range bounds must be ordered")
    }
}

impl<Tz: TimeZone> From<RangeInclusive<DateTime<Tz>>> for TsTzSpan {
    /// Builds the closed period `[start, end]`.
    fn from(range: RangeInclusive<DateTime<Tz>>) -> Self {
        let (start, end) = range.into_inner();
        TsTzSpan::new(start.with_timezone(&Utc), end.with_timezone(&Utc), true, true)
            .expect("range bounds must be ordered")
    }
}

impl BitAnd for TsTzSpan {
    type Output = Option<TsTzSpan>;

    /// Intersection sugar.
    ///
    /// ## Example
    /// ```
    /// # use tempora::collections::datetime::tstz_span::TsTzSpan;
    /// # use chrono::NaiveDate;
    /// let from_ymd = |y, m, d| NaiveDate::from_ymd_opt(y, m, d)
    ///     .unwrap().and_hms_opt(0, 0, 0).unwrap().and_utc();
    ///
    /// let a: TsTzSpan = (from_ymd(2023, 1, 1)..from_ymd(2023, 1, 11)).into();
    /// let b: TsTzSpan = (from_ymd(2023, 1, 9)..from_ymd(2023, 2, 11)).into();
    /// let shared = (a & b).unwrap();
    /// assert_eq!(shared, (from_ymd(2023, 1, 9)..from_ymd(2023, 1, 11)).into());
    /// ```
    fn bitand(self, other: Self) -> Self::Output {
        self.intersection(&other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn contains_respects_exclusive_upper() {
        // spec scenario 1: [2024-01-01, 2024-01-02) does not contain its
        // upper bound, the closed variant does.
        let half_open: TsTzSpan = (ts(1_704_067_200)..ts(1_704_153_600)).into();
        assert!(!half_open.contains_value(&ts(1_704_153_600)));
        let closed: TsTzSpan = (ts(1_704_067_200)..=ts(1_704_153_600)).into();
        assert!(closed.contains_value(&ts(1_704_153_600)));
    }

    #[test]
    fn shift_scale_moves_and_stretches() {
        let span: TsTzSpan = (ts(0)..ts(100)).into();
        let shifted = span.shift(TimeDelta::seconds(50));
        assert_eq!(shifted.lower(), ts(50));
        assert_eq!(shifted.upper(), ts(150));
        let scaled = span.scale(TimeDelta::seconds(10));
        assert_eq!(scaled.upper(), ts(10));
        assert_eq!(span.duration(), TimeDelta::seconds(100));
    }

    #[test]
    fn distances() {
        let a: TsTzSpan = (ts(0)..ts(100)).into();
        let b: TsTzSpan = (ts(300)..ts(400)).into();
        assert_eq!(a.distance_to_span(&b), TimeDelta::seconds(200));
        assert_eq!(a.distance_to_value(&ts(50)), TimeDelta::zero());
        assert_eq!(a.distance_to_value(&ts(150)), TimeDelta::seconds(50));
    }
}
