use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collections::datetime::tstz_span::TsTzSpan;
use crate::collections::datetime::tstz_span_set::TsTzSpanSet;
use crate::collections::datetime::tstz_set::TsTzSet;
use crate::errors::Result;
use crate::temporal::base::{wire, BBox, BaseType};

/// A temporal instant: one value at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TInstant<B: BaseType> {
    value: B,
    t: DateTime<Utc>,
}

impl<B: BaseType> TInstant<B> {
    /// ## Example
    /// ```
    /// # use tempora::temporal::tinstant::TInstant;
    /// # use chrono::{DateTime, Utc};
    /// let t = DateTime::from_timestamp(1_000, 0).unwrap();
    /// let inst = TInstant::new(42.0, t);
    /// assert_eq!(*inst.value(), 42.0);
    /// assert_eq!(inst.timestamp(), t);
    /// ```
    pub fn new(value: B, t: DateTime<Utc>) -> Self {
        Self { value, t }
    }

    pub fn value(&self) -> &B {
        &self.value
    }

    pub fn into_value(self) -> B {
        self.value
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.t
    }

    /// Degenerate period `[t, t]`.
    pub fn timespan(&self) -> TsTzSpan {
        TsTzSpan::singleton(self.t)
    }

    pub fn bounding_box(&self) -> BBox {
        B::instant_bbox(&self.value, self.t)
    }

    // ------------------------- Restrictions ---------------------------------

    pub fn at_value(&self, value: &B) -> Option<Self> {
        (self.value == *value).then(|| self.clone())
    }

    pub fn minus_value(&self, value: &B) -> Option<Self> {
        (self.value != *value).then(|| self.clone())
    }

    pub fn at_values(&self, values: &[B]) -> Option<Self> {
        values.contains(&self.value).then(|| self.clone())
    }

    pub fn minus_values(&self, values: &[B]) -> Option<Self> {
        (!values.contains(&self.value)).then(|| self.clone())
    }

    pub fn at_timestamp(&self, t: DateTime<Utc>) -> Option<Self> {
        (self.t == t).then(|| self.clone())
    }

    pub fn minus_timestamp(&self, t: DateTime<Utc>) -> Option<Self> {
        (self.t != t).then(|| self.clone())
    }

    pub fn at_timestamp_set(&self, set: &TsTzSet) -> Option<Self> {
        set.contains_value(&self.t).then(|| self.clone())
    }

    pub fn minus_timestamp_set(&self, set: &TsTzSet) -> Option<Self> {
        (!set.contains_value(&self.t)).then(|| self.clone())
    }

    pub fn at_period(&self, period: &TsTzSpan) -> Option<Self> {
        period.contains_value(&self.t).then(|| self.clone())
    }

    pub fn minus_period(&self, period: &TsTzSpan) -> Option<Self> {
        (!period.contains_value(&self.t)).then(|| self.clone())
    }

    pub fn at_period_set(&self, periods: &TsTzSpanSet) -> Option<Self> {
        periods.contains_value(&self.t).then(|| self.clone())
    }

    pub fn minus_period_set(&self, periods: &TsTzSpanSet) -> Option<Self> {
        (!periods.contains_value(&self.t)).then(|| self.clone())
    }

    pub fn ever_eq(&self, value: &B) -> bool {
        self.value == *value
    }

    pub fn always_eq(&self, value: &B) -> bool {
        self.value == *value
    }

    // ------------------------- Wire format ----------------------------------

    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) {
        wire::put_i64(buf, crate::utils::to_engine_timestamp(&self.t));
        self.value.write_to(buf);
    }

    pub(crate) fn read_from(cursor: &mut &[u8]) -> Result<Self> {
        let t = crate::utils::from_engine_timestamp(wire::take_i64(cursor)?)?;
        let value = B::read_from(cursor)?;
        Ok(Self { value, t })
    }
}

impl<B: BaseType + PartialOrd> TInstant<B> {
    pub fn ever_lt(&self, value: &B) -> bool {
        self.value < *value
    }

    pub fn ever_le(&self, value: &B) -> bool {
        self.value <= *value
    }
}
