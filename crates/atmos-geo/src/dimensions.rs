//! Globe size and orbit limits, optionally chosen from the viewport width.

use serde::{Deserialize, Serialize};

/// Sphere radius plus the camera distances that go with it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobeDimensions {
    /// Globe radius in world units.
    pub radius: f32,
    /// Closest the orbit camera may get to the globe center.
    pub orbit_min: f32,
    /// Farthest the orbit camera may get from the globe center.
    pub orbit_max: f32,
    /// Camera offset above a focused surface point.
    pub zoom_distance: f32,
}

impl Default for GlobeDimensions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            orbit_min: 2.1,
            orbit_max: 3.8,
            zoom_distance: 0.5,
        }
    }
}

/// `(max_width_exclusive, radius, orbit_min, orbit_max, zoom_distance)`.
const BREAKPOINTS: [(f64, f32, f32, f32, f32); 5] = [
    (420.0, 1.0, 2.1, 3.8, 0.5),
    (640.0, 1.15, 2.25, 4.1, 0.6),
    (768.0, 1.3, 2.4, 4.5, 0.7),
    (1024.0, 1.4, 2.6, 5.0, 0.75),
    (1440.0, 1.5, 3.0, 5.5, 0.8),
];

impl GlobeDimensions {
    /// Pick dimensions for a viewport `logical_width` pixels wide. Wider
    /// viewports get a larger globe and a farther orbit.
    pub fn for_viewport_width(logical_width: f64) -> Self {
        for (max_width, radius, orbit_min, orbit_max, zoom_distance) in BREAKPOINTS {
            if logical_width < max_width {
                return Self {
                    radius,
                    orbit_min,
                    orbit_max,
                    zoom_distance,
                };
            }
        }
        Self {
            radius: 1.65,
            orbit_min: 3.2,
            orbit_max: 6.2,
            zoom_distance: 0.9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_narrowest_breakpoint() {
        assert_eq!(
            GlobeDimensions::default(),
            GlobeDimensions::for_viewport_width(320.0),
            "phones use the default globe"
        );
    }

    #[test]
    fn test_desktop_breakpoint() {
        let d = GlobeDimensions::for_viewport_width(1280.0);
        assert_eq!(d.radius, 1.5);
        assert_eq!(d.orbit_min, 3.0);
        assert_eq!(d.orbit_max, 5.5);
        assert_eq!(d.zoom_distance, 0.8);
    }

    #[test]
    fn test_radius_grows_with_width() {
        let mut last = 0.0;
        for w in [300.0, 500.0, 700.0, 900.0, 1200.0, 2560.0] {
            let d = GlobeDimensions::for_viewport_width(w);
            assert!(d.radius > last, "radius should grow at width {w}");
            assert!(d.orbit_min > d.radius, "orbit must stay outside the globe");
            assert!(d.orbit_max > d.orbit_min);
            last = d.radius;
        }
    }
}
