//! Coordinate transformations for listing locations.
//!
//! Converts geographic coordinates to a local polar system centred on a
//! fixed reference point. Offsets are computed with an equirectangular
//! (planar) approximation: longitude distance is scaled by the cosine of the
//! midpoint latitude, latitude distance is taken as a plain arc length.
//! This is not a great-circle distance, and downstream consumers depend on
//! these exact values.

use crate::config::LocationConfig;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Pole of the polar system plus the Earth radius used for scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoint {
    pub origin: GeoPoint,
    pub earth_radius_m: f64,
}

impl ReferencePoint {
    pub fn new(origin: GeoPoint, earth_radius_m: f64) -> Self {
        Self {
            origin,
            earth_radius_m,
        }
    }

    pub fn from_config(config: &LocationConfig) -> Self {
        Self::new(
            GeoPoint::new(config.reference_latitude, config.reference_longitude),
            config.earth_radius_m,
        )
    }

    /// Planar offset of `point` from the origin in meters, as `(x, y)`
    /// with x pointing east and y north.
    pub fn planar_offset(&self, point: GeoPoint) -> (f64, f64) {
        let lat = point.latitude.to_radians();
        let lon = point.longitude.to_radians();
        let ref_lat = self.origin.latitude.to_radians();
        let ref_lon = self.origin.longitude.to_radians();

        let dlat = lat - ref_lat;
        let dlon = lon - ref_lon;

        let x = self.earth_radius_m * dlon * ((lat + ref_lat) / 2.0).cos();
        let y = self.earth_radius_m * dlat;

        (x, y)
    }

    /// Polar coordinate of `point` relative to the origin.
    ///
    /// At the origin itself `r` is 0 and `theta` is `atan2(0, 0)`, which is 0.
    pub fn to_polar(&self, point: GeoPoint) -> PolarCoordinate {
        let (x, y) = self.planar_offset(point);
        PolarCoordinate::from_cartesian(x, y)
    }
}

/// Radius in meters and bearing angle in radians, counter-clockwise from east.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarCoordinate {
    pub r: f64,
    pub theta: f64,
}

impl PolarCoordinate {
    pub fn from_cartesian(x: f64, y: f64) -> Self {
        Self {
            r: (x * x + y * y).sqrt(),
            theta: y.atan2(x),
        }
    }
}

/// Convert a batch of optional coordinates.
///
/// Rows missing either coordinate map to `None`.
pub fn coordinates_to_polar(
    reference: &ReferencePoint,
    points: &[Option<GeoPoint>],
) -> Vec<Option<PolarCoordinate>> {
    points
        .iter()
        .map(|point| point.map(|p| reference.to_polar(p)))
        .collect()
}
