use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::boxes::tbox::TBox;
use crate::boxes::BoundingBox as _;
use crate::collections::datetime::tstz_span::TsTzSpan;
use crate::errors::{Error, Result};

/// Discriminant of a base type, also used as the element tag of the
/// aggregate-state wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum BaseKind {
    Int = 0,
    Float = 1,
    Bool = 2,
    Text = 3,
    GeomPoint = 4,
    GeogPoint = 5,
    Double2 = 6,
}

impl BaseKind {
    pub(crate) fn from_tag(tag: u8) -> Result<Self> {
        Ok(match tag {
            0 => BaseKind::Int,
            1 => BaseKind::Float,
            2 => BaseKind::Bool,
            3 => BaseKind::Text,
            4 => BaseKind::GeomPoint,
            5 => BaseKind::GeogPoint,
            6 => BaseKind::Double2,
            _ => return Err(Error::invalid(format!("unknown base kind tag {tag}"))),
        })
    }
}

/// Bounding box of a temporal value. The variant is implied by the base
/// type: plain period for discrete scalars, value×time box for numbers,
/// space×time box for points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BBox {
    Period(TsTzSpan),
    Numeric(TBox),
    Spatial(crate::boxes::stbox::STBox),
}

impl BBox {
    /// Grows `self` to cover `other`. Mixing variants is an internal error
    /// caught in debug builds; release builds keep `self`.
    pub fn expand(&mut self, other: &BBox) {
        match (self, other) {
            (BBox::Period(a), BBox::Period(b)) => a.expand(b),
            (BBox::Numeric(a), BBox::Numeric(b)) => a.expand(b),
            (BBox::Spatial(a), BBox::Spatial(b)) => a.expand(b),
            _ => debug_assert!(false, "bounding boxes of mixed variants"),
        }
    }

    /// Fast-reject test: `false` guarantees the owners share nothing.
    pub fn overlaps(&self, other: &BBox) -> bool {
        match (self, other) {
            (BBox::Period(a), BBox::Period(b)) => a.overlaps(b),
            (BBox::Numeric(a), BBox::Numeric(b)) => a.overlaps(b),
            (BBox::Spatial(a), BBox::Spatial(b)) => a.overlaps(b),
            _ => false,
        }
    }

    pub fn period(&self) -> Option<&TsTzSpan> {
        match self {
            BBox::Period(p) => Some(p),
            BBox::Numeric(b) => b.period(),
            BBox::Spatial(b) => b.period(),
        }
    }
}

/// Capability surface of a scalar type a temporal value can vary over.
///
/// The interpolation hooks have stepwise defaults so that discrete types
/// only implement equality and the wire format; continuous types override
/// them.
pub trait BaseType: Clone + PartialEq + Debug + 'static {
    /// Whether values vary continuously between instants, i.e. whether
    /// linear interpolation is meaningful.
    const CONTINUOUS: bool;

    const KIND: BaseKind;

    /// Value at `fraction` of the way along the segment `a -> b`.
    /// Discrete types hold the left value.
    fn lerp(a: &Self, b: &Self, fraction: f64) -> Self {
        let _ = (b, fraction);
        a.clone()
    }

    /// Fraction strictly inside `(0, 1)` at which two synchronized linear
    /// segments take the same value, if any.
    fn segment_crossing(a1: &Self, a2: &Self, b1: &Self, b2: &Self) -> Option<f64> {
        let _ = (a1, a2, b1, b2);
        None
    }

    /// Fraction in `[0, 1]` at which the non-constant segment `a1 -> a2`
    /// passes through `value`. Constant segments are the caller's case.
    fn segment_at_value(a1: &Self, a2: &Self, value: &Self) -> Option<f64> {
        let _ = (a1, a2, value);
        None
    }

    /// Bounding box of a single instant of this type.
    fn instant_bbox(value: &Self, t: DateTime<Utc>) -> BBox {
        let _ = value;
        BBox::Period(TsTzSpan::singleton(t))
    }

    /// Bounding-box pre-check for equality restriction and predicates:
    /// `false` guarantees the owner never takes `value`.
    fn bbox_may_contain(bbox: &BBox, value: &Self) -> bool {
        let _ = (bbox, value);
        true
    }

    fn write_to(&self, buf: &mut Vec<u8>);

    fn read_from(cursor: &mut &[u8]) -> Result<Self>;
}

/// Base types with a total order: min/max accessors and aggregates,
/// ordering predicates.
pub trait OrderedBase: BaseType + PartialOrd {}

impl<T: BaseType + PartialOrd> OrderedBase for T {}

/// Numeric base types: arithmetic lifting, value-range restriction, TBox
/// summaries, integral and averages.
pub trait NumberBase: BaseType + PartialOrd + Copy {
    fn zero() -> Self;

    fn to_f64(self) -> f64;

    fn from_f64(value: f64) -> Self;

    fn add(self, other: Self) -> Self;

    fn sub(self, other: Self) -> Self;

    fn mul(self, other: Self) -> Self;

    /// Division; the lifting layer guarantees a non-zero denominator.
    fn div(self, other: Self) -> Self;

    fn abs(self) -> Self;
}

impl BaseType for i32 {
    const CONTINUOUS: bool = false;
    const KIND: BaseKind = BaseKind::Int;

    fn instant_bbox(value: &Self, t: DateTime<Utc>) -> BBox {
        let mut tbox = TBox::from_value(*value as f64);
        tbox.expand(&TBox::from_time(t));
        BBox::Numeric(tbox)
    }

    fn bbox_may_contain(bbox: &BBox, value: &Self) -> bool {
        match bbox {
            BBox::Numeric(tbox) => tbox
                .value_span()
                .is_none_or_contains(&(*value as f64)),
            _ => true,
        }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_le_bytes());
    }

    fn read_from(cursor: &mut &[u8]) -> Result<Self> {
        Ok(i32::from_le_bytes(wire::take_array(cursor)?))
    }
}

impl NumberBase for i32 {
    fn zero() -> Self {
        0
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value as i32
    }

    fn add(self, other: Self) -> Self {
        self + other
    }

    fn sub(self, other: Self) -> Self {
        self - other
    }

    fn mul(self, other: Self) -> Self {
        self * other
    }

    fn div(self, other: Self) -> Self {
        self / other
    }

    fn abs(self) -> Self {
        i32::abs(self)
    }
}

impl BaseType for f64 {
    const CONTINUOUS: bool = true;
    const KIND: BaseKind = BaseKind::Float;

    fn lerp(a: &Self, b: &Self, fraction: f64) -> Self {
        a + (b - a) * fraction
    }

    fn segment_crossing(a1: &Self, a2: &Self, b1: &Self, b2: &Self) -> Option<f64> {
        let d1 = a1 - b1;
        let d2 = a2 - b2;
        if d1 == 0.0 || d2 == 0.0 || (d1 > 0.0) == (d2 > 0.0) {
            return None;
        }
        Some(d1 / (d1 - d2))
    }

    fn segment_at_value(a1: &Self, a2: &Self, value: &Self) -> Option<f64> {
        if a1 == a2 {
            return None;
        }
        let fraction = (value - a1) / (a2 - a1);
        (0.0..=1.0).contains(&fraction).then_some(fraction)
    }

    fn instant_bbox(value: &Self, t: DateTime<Utc>) -> BBox {
        let mut tbox = TBox::from_value(*value);
        tbox.expand(&TBox::from_time(t));
        BBox::Numeric(tbox)
    }

    fn bbox_may_contain(bbox: &BBox, value: &Self) -> bool {
        match bbox {
            BBox::Numeric(tbox) => tbox.value_span().is_none_or_contains(value),
            _ => true,
        }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_le_bytes());
    }

    fn read_from(cursor: &mut &[u8]) -> Result<Self> {
        Ok(f64::from_le_bytes(wire::take_array(cursor)?))
    }
}

impl NumberBase for f64 {
    fn zero() -> Self {
        0.0
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }

    fn add(self, other: Self) -> Self {
        self + other
    }

    fn sub(self, other: Self) -> Self {
        self - other
    }

    fn mul(self, other: Self) -> Self {
        self * other
    }

    fn div(self, other: Self) -> Self {
        self / other
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }
}

impl BaseType for bool {
    const CONTINUOUS: bool = false;
    const KIND: BaseKind = BaseKind::Bool;

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(*self as u8);
    }

    fn read_from(cursor: &mut &[u8]) -> Result<Self> {
        Ok(wire::take_u8(cursor)? != 0)
    }
}

impl BaseType for String {
    const CONTINUOUS: bool = false;
    const KIND: BaseKind = BaseKind::Text;

    fn write_to(&self, buf: &mut Vec<u8>) {
        wire::put_u32(buf, self.len() as u32);
        buf.extend_from_slice(self.as_bytes());
    }

    fn read_from(cursor: &mut &[u8]) -> Result<Self> {
        let len = wire::take_u32(cursor)? as usize;
        let bytes = wire::take(cursor, len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::invalid("malformed utf-8 in serialized text"))
    }
}

/// Pair accumulator `(sum, count)` backing the avg aggregates. The final
/// pass divides componentwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Double2 {
    pub a: f64,
    pub b: f64,
}

impl Double2 {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    /// Componentwise sum, the combiner of avg aggregation.
    pub fn sum(&self, other: &Self) -> Self {
        Self { a: self.a + other.a, b: self.b + other.b }
    }
}

impl BaseType for Double2 {
    const CONTINUOUS: bool = true;
    const KIND: BaseKind = BaseKind::Double2;

    fn lerp(a: &Self, b: &Self, fraction: f64) -> Self {
        Self {
            a: f64::lerp(&a.a, &b.a, fraction),
            b: f64::lerp(&a.b, &b.b, fraction),
        }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        self.a.write_to(buf);
        self.b.write_to(buf);
    }

    fn read_from(cursor: &mut &[u8]) -> Result<Self> {
        Ok(Self { a: f64::read_from(cursor)?, b: f64::read_from(cursor)? })
    }
}

/// Helper extending `Option<&FloatSpan>` for bbox pre-checks.
trait SpanContains {
    fn is_none_or_contains(&self, value: &f64) -> bool;
}

impl SpanContains for Option<&crate::collections::number::float_span::FloatSpan> {
    fn is_none_or_contains(&self, value: &f64) -> bool {
        self.map_or(true, |span| span.contains_value(value))
    }
}

/// Little-endian primitives of the aggregate-state wire format.
pub(crate) mod wire {
    use crate::errors::{Error, Result};

    pub fn take<'a>(cursor: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
        if cursor.len() < n {
            return Err(Error::invalid("truncated aggregate state"));
        }
        let (head, tail) = cursor.split_at(n);
        *cursor = tail;
        Ok(head)
    }

    pub fn take_array<const N: usize>(cursor: &mut &[u8]) -> Result<[u8; N]> {
        let bytes = take(cursor, N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }

    pub fn take_u8(cursor: &mut &[u8]) -> Result<u8> {
        Ok(take_array::<1>(cursor)?[0])
    }

    pub fn take_u32(cursor: &mut &[u8]) -> Result<u32> {
        Ok(u32::from_le_bytes(take_array(cursor)?))
    }

    pub fn take_u64(cursor: &mut &[u8]) -> Result<u64> {
        Ok(u64::from_le_bytes(take_array(cursor)?))
    }

    pub fn take_i64(cursor: &mut &[u8]) -> Result<i64> {
        Ok(i64::from_le_bytes(take_array(cursor)?))
    }

    pub fn put_u32(buf: &mut Vec<u8>, value: u32) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u64(buf: &mut Vec<u8>, value: u64) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_i64(buf: &mut Vec<u8>, value: i64) {
        buf.extend_from_slice(&value.to_le_bytes());
    }
}
