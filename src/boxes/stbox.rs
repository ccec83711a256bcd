use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::boxes::BoundingBox;
use crate::collections::datetime::tstz_span::TsTzSpan;
use crate::collections::number::float_span::FloatSpan;
use crate::temporal::point::Point;

/// Bounding box of a temporal point: per-axis spatial extents crossed with
/// an optional time period, plus the geodetic flag and SRID of the owner.
///
/// The z extent is present iff the owner has a z coordinate; boxes of
/// different dimensionality or geodetic-ness never overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct STBox {
    x: FloatSpan,
    y: FloatSpan,
    z: Option<FloatSpan>,
    time: Option<TsTzSpan>,
    geodetic: bool,
    srid: i32,
}

impl STBox {
    pub fn from_point(point: &Point, srid: i32, geodetic: bool) -> Self {
        Self {
            x: FloatSpan::singleton(point.x),
            y: FloatSpan::singleton(point.y),
            z: point.z.map(FloatSpan::singleton),
            time: None,
            geodetic,
            srid,
        }
    }

    pub fn from_point_and_time(
        point: &Point,
        t: DateTime<Utc>,
        srid: i32,
        geodetic: bool,
    ) -> Self {
        let mut result = Self::from_point(point, srid, geodetic);
        result.time = Some(TsTzSpan::singleton(t));
        result
    }

    pub fn x_span(&self) -> &FloatSpan {
        &self.x
    }

    pub fn y_span(&self) -> &FloatSpan {
        &self.y
    }

    pub fn z_span(&self) -> Option<&FloatSpan> {
        self.z.as_ref()
    }

    pub fn period(&self) -> Option<&TsTzSpan> {
        self.time.as_ref()
    }

    pub fn is_geodetic(&self) -> bool {
        self.geodetic
    }

    pub fn srid(&self) -> i32 {
        self.srid
    }

    pub fn has_z(&self) -> bool {
        self.z.is_some()
    }

    fn frames_comparable(&self, other: &Self) -> bool {
        self.geodetic == other.geodetic && self.srid == other.srid
    }

    /// Smallest separation between the two boxes, 0 when they overlap.
    /// Used as a lower bound for nearest-approach distances.
    pub fn nearest_approach_distance(&self, other: &Self) -> f64 {
        let gap = |a: &FloatSpan, b: &FloatSpan| -> f64 {
            if a.overlaps(b) {
                0.0
            } else if a.upper() < b.lower() {
                b.lower() - a.upper()
            } else {
                a.lower() - b.upper()
            }
        };
        let dx = gap(&self.x, &other.x);
        let dy = gap(&self.y, &other.y);
        let dz = match (&self.z, &other.z) {
            (Some(a), Some(b)) => gap(a, b),
            _ => 0.0,
        };
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl BoundingBox for STBox {
    fn overlaps(&self, other: &Self) -> bool {
        if !self.frames_comparable(other) || self.has_z() != other.has_z() {
            return false;
        }
        let z_ok = match (&self.z, &other.z) {
            (Some(a), Some(b)) => a.overlaps(b),
            _ => true,
        };
        let time_ok = match (&self.time, &other.time) {
            (Some(a), Some(b)) => a.overlaps(b),
            _ => true,
        };
        self.x.overlaps(&other.x) && self.y.overlaps(&other.y) && z_ok && time_ok
    }

    fn contains(&self, other: &Self) -> bool {
        if !self.frames_comparable(other) || self.has_z() != other.has_z() {
            return false;
        }
        let z_ok = match (&self.z, &other.z) {
            (Some(a), Some(b)) => a.contains_span(b),
            _ => true,
        };
        let time_ok = match (&self.time, &other.time) {
            (Some(a), Some(b)) => a.contains_span(b),
            (None, _) => true,
            (Some(_), None) => false,
        };
        self.x.contains_span(&other.x) && self.y.contains_span(&other.y) && z_ok && time_ok
    }

    fn expand(&mut self, other: &Self) {
        self.x = self.x.super_union(&other.x);
        self.y = self.y.super_union(&other.y);
        self.z = match (&self.z, &other.z) {
            (Some(a), Some(b)) => Some(a.super_union(b)),
            (Some(a), None) | (None, Some(a)) => Some(*a),
            (None, None) => None,
        };
        self.time = match (&self.time, &other.time) {
            (Some(a), Some(b)) => Some(a.super_union(b)),
            (Some(a), None) | (None, Some(a)) => Some(*a),
            (None, None) => None,
        };
    }
}

impl fmt::Display for STBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.geodetic { "GEODSTBOX" } else { "STBOX" };
        write!(f, "{tag}(x={}, y={}", self.x, self.y)?;
        if let Some(z) = &self.z {
            write!(f, ", z={z}")?;
        }
        if let Some(t) = &self.time {
            write!(f, ", t={t}")?;
        }
        write!(f, ")")
    }
}
