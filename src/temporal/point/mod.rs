use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::boxes::stbox::STBox;
use crate::errors::{Error, Result};
use crate::temporal::base::{wire, BBox, BaseKind, BaseType};

pub mod tpoint;

/// Mean Earth radius in meters, used by geodetic distances.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A 2D or 3D point. The geodetic interpretation (x = longitude degrees,
/// y = latitude degrees) is carried by the wrapping base type, not by the
/// point itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    pub fn has_z(&self) -> bool {
        self.z.is_some()
    }

    pub fn dims_match(&self, other: &Point) -> bool {
        self.has_z() == other.has_z()
    }

    pub(crate) fn lerp(a: &Point, b: &Point, fraction: f64) -> Point {
        Point {
            x: a.x + (b.x - a.x) * fraction,
            y: a.y + (b.y - a.y) * fraction,
            z: match (a.z, b.z) {
                (Some(az), Some(bz)) => Some(az + (bz - az) * fraction),
                _ => None,
            },
        }
    }

    fn delta(&self, other: &Point) -> (f64, f64, f64) {
        (
            self.x - other.x,
            self.y - other.y,
            self.z.unwrap_or(0.0) - other.z.unwrap_or(0.0),
        )
    }

    pub fn euclidean_distance(&self, other: &Point) -> f64 {
        let (dx, dy, dz) = self.delta(other);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Great-circle distance in meters; x/y are read as degrees.
    pub fn haversine_distance(&self, other: &Point) -> f64 {
        let (lon1, lat1) = (self.x.to_radians(), self.y.to_radians());
        let (lon2, lat2) = (other.x.to_radians(), other.y.to_radians());
        let dlat = lat2 - lat1;
        let dlon = lon2 - lon1;
        let h = (dlat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * h.sqrt().asin()
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        self.x.write_to(buf);
        self.y.write_to(buf);
        buf.push(self.z.is_some() as u8);
        if let Some(z) = self.z {
            z.write_to(buf);
        }
    }

    fn read_from(cursor: &mut &[u8]) -> Result<Self> {
        let x = f64::read_from(cursor)?;
        let y = f64::read_from(cursor)?;
        let z = if wire::take_u8(cursor)? != 0 {
            Some(f64::read_from(cursor)?)
        } else {
            None
        };
        Ok(Self { x, y, z })
    }
}

/// Fraction of the segment parameter at which two moving points are
/// closest: the minimum of `|Δ0 + α·Δv|²`, at `α* = −(Δ0·Δv)/|Δv|²`.
/// `None` when the relative motion vanishes.
pub(crate) fn closest_approach_fraction(
    a1: &Point,
    a2: &Point,
    b1: &Point,
    b2: &Point,
) -> Option<f64> {
    let (d0x, d0y, d0z) = a1.delta(b1);
    let (vx, vy, vz) = (
        (a2.x - a1.x) - (b2.x - b1.x),
        (a2.y - a1.y) - (b2.y - b1.y),
        (a2.z.unwrap_or(0.0) - a1.z.unwrap_or(0.0)) - (b2.z.unwrap_or(0.0) - b1.z.unwrap_or(0.0)),
    );
    let denom = vx * vx + vy * vy + vz * vz;
    if denom == 0.0 {
        return None;
    }
    Some(-(d0x * vx + d0y * vy + d0z * vz) / denom)
}

/// Fraction where a single moving point passes closest to a fixed one.
pub(crate) fn closest_approach_to_fixed(a1: &Point, a2: &Point, fixed: &Point) -> Option<f64> {
    closest_approach_fraction(a1, a2, fixed, fixed)
}

/// Fraction where all axes of two moving points coincide, if consistent.
fn point_segment_crossing(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> Option<f64> {
    const EPS: f64 = 1e-9;
    let mut fraction: Option<f64> = None;
    let axes = [
        (a1.x, a2.x, b1.x, b2.x),
        (a1.y, a2.y, b1.y, b2.y),
        (
            a1.z.unwrap_or(0.0),
            a2.z.unwrap_or(0.0),
            b1.z.unwrap_or(0.0),
            b2.z.unwrap_or(0.0),
        ),
    ];
    for (x1, x2, y1, y2) in axes {
        let offset = x1 - y1;
        let motion = (x2 - x1) - (y2 - y1);
        if motion.abs() < EPS {
            if offset.abs() > EPS {
                return None;
            }
            continue;
        }
        let candidate = -offset / motion;
        match fraction {
            None => fraction = Some(candidate),
            Some(existing) if (existing - candidate).abs() > EPS => return None,
            _ => {}
        }
    }
    fraction.filter(|f| (0.0..=1.0).contains(f))
}

fn point_segment_at_value(a1: &Point, a2: &Point, target: &Point) -> Option<f64> {
    point_segment_crossing(a1, a2, target, target)
}

macro_rules! impl_point_base {
    ($type:ident, $kind:ident, $geodetic:expr) => {
        paste::paste! {
            /// Point base type; see [`Point`] for the coordinate layout.
            #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
            pub struct $type {
                pub point: Point,
                pub srid: i32,
            }

            impl $type {
                pub fn new(point: Point, srid: i32) -> Self {
                    Self { point, srid }
                }
            }

            impl BaseType for $type {
                const CONTINUOUS: bool = true;
                const KIND: BaseKind = BaseKind::$kind;

                fn lerp(a: &Self, b: &Self, fraction: f64) -> Self {
                    Self { point: Point::lerp(&a.point, &b.point, fraction), srid: a.srid }
                }

                fn segment_crossing(
                    a1: &Self,
                    a2: &Self,
                    b1: &Self,
                    b2: &Self,
                ) -> Option<f64> {
                    point_segment_crossing(&a1.point, &a2.point, &b1.point, &b2.point)
                }

                fn segment_at_value(a1: &Self, a2: &Self, value: &Self) -> Option<f64> {
                    point_segment_at_value(&a1.point, &a2.point, &value.point)
                }

                fn instant_bbox(value: &Self, t: DateTime<Utc>) -> BBox {
                    BBox::Spatial(STBox::from_point_and_time(
                        &value.point,
                        t,
                        value.srid,
                        $geodetic,
                    ))
                }

                fn bbox_may_contain(bbox: &BBox, value: &Self) -> bool {
                    match bbox {
                        BBox::Spatial(stbox) => {
                            stbox.x_span().contains_value(&value.point.x)
                                && stbox.y_span().contains_value(&value.point.y)
                                && match (stbox.z_span(), value.point.z) {
                                    (Some(span), Some(z)) => span.contains_value(&z),
                                    (None, None) => true,
                                    _ => false,
                                }
                        }
                        _ => true,
                    }
                }

                fn write_to(&self, buf: &mut Vec<u8>) {
                    self.point.write_to(buf);
                    buf.extend_from_slice(&self.srid.to_le_bytes());
                }

                fn read_from(cursor: &mut &[u8]) -> Result<Self> {
                    let point = Point::read_from(cursor)?;
                    let srid = i32::from_le_bytes(wire::take_array(cursor)?);
                    Ok(Self { point, srid })
                }
            }
        }
    };
}

impl_point_base!(GeomPoint, GeomPoint, false);
impl_point_base!(GeogPoint, GeogPoint, true);

/// Shared surface of the two point base types.
pub trait PointBase: BaseType + Copy {
    const GEODETIC: bool;

    fn point(&self) -> &Point;

    fn srid(&self) -> i32;

    fn distance(&self, other: &Self) -> f64;
}

impl PointBase for GeomPoint {
    const GEODETIC: bool = false;

    fn point(&self) -> &Point {
        &self.point
    }

    fn srid(&self) -> i32 {
        self.srid
    }

    fn distance(&self, other: &Self) -> f64 {
        self.point.euclidean_distance(&other.point)
    }
}

impl PointBase for GeogPoint {
    const GEODETIC: bool = true;

    fn point(&self) -> &Point {
        &self.point
    }

    fn srid(&self) -> i32 {
        self.srid
    }

    fn distance(&self, other: &Self) -> f64 {
        self.point.haversine_distance(&other.point)
    }
}

/// Checks that two point operands live in the same frame.
pub(crate) fn ensure_compatible<P: PointBase>(a: &P, b: &P) -> Result<()> {
    if a.srid() != b.srid() {
        return Err(Error::invalid(format!(
            "mismatched SRID: {} vs {}",
            a.srid(),
            b.srid()
        )));
    }
    if !a.point().dims_match(b.point()) {
        return Err(Error::invalid("mismatched point dimensionality"));
    }
    Ok(())
}
