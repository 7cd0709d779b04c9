//! Spherical-to-Cartesian mapping used by every object placed on the globe.
//!
//! Latitude is measured from the north pole (`phi = 90° - lat`) and longitude is
//! offset by 180° so that the 0° meridian lands on the texture seam of an
//! equirectangular earth map. Y is up.

use std::fmt;

use glam::{DVec3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A point on the sphere in world units. Derived on demand, never shared mutably.
pub type SurfaceVector = Vec3;

/// A geographic location in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees. Range: \[-90, 90\]. Positive = north.
    pub lat: f64,
    /// Longitude in degrees. Range: \[-180, 180\]. Positive = east.
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new geographic point.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// The surface point of this location on a sphere of `radius`.
    pub fn to_surface(&self, radius: f32) -> SurfaceVector {
        to_surface_point(self.lat, self.lon, radius)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat_dir = if self.lat >= 0.0 { "N" } else { "S" };
        let lon_dir = if self.lon >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "{:.2}\u{00B0}{}, {:.2}\u{00B0}{}",
            self.lat.abs(),
            lat_dir,
            self.lon.abs(),
            lon_dir,
        )
    }
}

/// Convert `(lat, lon)` in degrees to a point on a sphere of `radius`.
///
/// ```
/// let p = atmos_geo::to_surface_point(90.0, 42.0, 2.0);
/// assert!((p - glam::Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);
/// ```
pub fn to_surface_point(lat: f64, lon: f64, radius: f32) -> SurfaceVector {
    let phi = (90.0 - lat).to_radians();
    let theta = (lon + 180.0).to_radians();
    let r = f64::from(radius);

    let (sin_phi, cos_phi) = phi.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();

    let p = DVec3::new(
        -(r * sin_phi * cos_theta),
        r * cos_phi,
        r * sin_phi * sin_theta,
    );
    p.as_vec3()
}

/// Inverse of [`to_surface_point`]. Returns the location and the distance from
/// the sphere center. The origin maps to `(0, 0)` with radius 0.
pub fn surface_to_geo(point: SurfaceVector) -> (GeoPoint, f32) {
    let p = point.as_dvec3();
    let r = p.length();
    if r < 1e-12 {
        return (GeoPoint::new(0.0, 0.0), 0.0);
    }
    let dir = p / r;
    let lat = 90.0 - dir.y.clamp(-1.0, 1.0).acos().to_degrees();
    // x = -sinφ·cosθ, z = sinφ·sinθ
    let mut lon = dir.z.atan2(-dir.x).to_degrees() - 180.0;
    if lon < -180.0 {
        lon += 360.0;
    }
    (GeoPoint::new(lat, lon), r as f32)
}

/// Rotation that maps the canonical up axis (+Y) onto the direction of `point`,
/// so that an object modelled along +Y sits flush on the surface.
///
/// A zero-length point yields the identity.
pub fn surface_orientation(point: SurfaceVector) -> Quat {
    let Some(dir) = point.try_normalize() else {
        return Quat::IDENTITY;
    };
    Quat::from_rotation_arc(Vec3::Y, dir)
}
