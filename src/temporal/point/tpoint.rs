use crate::boxes::stbox::STBox;
use crate::errors::Result;
use crate::temporal::base::BBox;
use crate::temporal::impl_temporal_aliases;
use crate::temporal::lifting::{lift_binary, lift_unary};
use crate::temporal::number::tfloat::TFloat;
use crate::temporal::point::{
    closest_approach_fraction, closest_approach_to_fixed, ensure_compatible, GeogPoint,
    GeomPoint, Point, PointBase,
};
use crate::temporal::temporal::Temporal;
use crate::temporal::tinstant::TInstant;

impl_temporal_aliases!(GeomPoint, GeomPoint);
impl_temporal_aliases!(GeogPoint, GeogPoint);

impl<P: PointBase> Temporal<P> {
    /// Space×time bounding box.
    pub fn stbox(&self) -> STBox {
        match self.bounding_box() {
            BBox::Spatial(stbox) => stbox,
            _ => unreachable!("temporal points carry spatial bounding boxes"),
        }
    }

    /// Temporal distance between two moving points over their synchronized
    /// domain. The closest-approach instant inside a segment pair is
    /// materialized exactly.
    ///
    /// ## Errors
    /// `InvalidArgument` on mismatched SRID or dimensionality.
    pub fn distance(&self, other: &Self) -> Result<Option<TFloat>> {
        ensure_compatible(self.start_value(), other.start_value())?;
        let finder =
            |a1: &P, a2: &P, b1: &P, b2: &P| -> Option<f64> {
                closest_approach_fraction(a1.point(), a2.point(), b1.point(), b2.point())
            };
        Ok(lift_binary(
            self,
            other,
            &|a: &P, b: &P| a.distance(b),
            true,
            Some(&finder),
        ))
    }

    /// Temporal distance to a fixed point.
    pub fn distance_to_point(&self, geo: &P) -> Result<TFloat> {
        ensure_compatible(self.start_value(), geo)?;
        let target = *geo;
        let finder = move |a1: &P, a2: &P| -> Option<f64> {
            closest_approach_to_fixed(a1.point(), a2.point(), target.point())
        };
        Ok(lift_unary(self, &|a: &P| a.distance(&target), true, Some(&finder)))
    }

    /// Nearest-approach instant: the instant of `self` at which the
    /// distance to `other` is minimal (the earliest such instant).
    pub fn nearest_approach_instant(&self, other: &Self) -> Result<Option<TInstant<P>>> {
        let Some(distance) = self.distance(other)? else {
            return Ok(None);
        };
        let closest = distance.min_instant();
        let t = closest.timestamp();
        Ok(self
            .value_at_timestamp_inclusive(t)
            .map(|value| TInstant::new(value, t)))
    }

    /// Nearest-approach instant against a fixed point.
    pub fn nearest_approach_instant_point(&self, geo: &P) -> Result<TInstant<P>> {
        let distance = self.distance_to_point(geo)?;
        let closest = distance.min_instant();
        let t = closest.timestamp();
        let value = self
            .value_at_timestamp_inclusive(t)
            .expect("distance is defined on the value's own domain");
        Ok(TInstant::new(value, t))
    }

    /// Smallest distance ever reached between the two operands.
    pub fn nearest_approach_distance(&self, other: &Self) -> Result<Option<f64>> {
        Ok(self.distance(other)?.map(|d| d.min_value()))
    }

    pub fn nearest_approach_distance_point(&self, geo: &P) -> Result<f64> {
        Ok(self.distance_to_point(geo)?.min_value())
    }

    /// Lower bound of the distance to another box-summarized value.
    pub fn nearest_approach_distance_stbox(&self, stbox: &STBox) -> f64 {
        self.stbox().nearest_approach_distance(stbox)
    }

    /// The segment joining the two operands where they are closest.
    pub fn shortest_line(&self, other: &Self) -> Result<Option<(Point, Point)>> {
        let Some(distance) = self.distance(other)? else {
            return Ok(None);
        };
        let t = distance.min_instant().timestamp();
        let from = self.value_at_timestamp_inclusive(t);
        let to = other.value_at_timestamp_inclusive(t);
        Ok(from.zip(to).map(|(a, b)| (*a.point(), *b.point())))
    }

    pub fn shortest_line_point(&self, geo: &P) -> Result<(Point, Point)> {
        let distance = self.distance_to_point(geo)?;
        let t = distance.min_instant().timestamp();
        let from = self
            .value_at_timestamp_inclusive(t)
            .expect("distance is defined on the value's own domain");
        Ok((*from.point(), *geo.point()))
    }
}
