//! Geographic coordinates on the globe: latitude/longitude to surface points,
//! surface-flush orientations, and viewport-dependent globe dimensions.

mod coords;
mod dimensions;

pub use coords::{GeoPoint, SurfaceVector, surface_orientation, surface_to_geo, to_surface_point};
pub use dimensions::GlobeDimensions;
