//! Scene composition.
//!
//! [`SceneState`] owns every per-frame system and is advanced once per tick
//! by [`SceneState::update`]. Inputs from the surrounding application
//! (focus location, weather condition, sun times, control lock) are handed
//! over as a [`SceneInputs`] value; everything else is derived.

mod clouds;
mod debounce;
mod globe;
mod instance;
mod marker;
mod stars;
mod state;
mod weather;

pub use clouds::{PUFF_COUNT, Puff, StormClouds, cloud_seed};
pub use debounce::EffectDebouncer;
pub use globe::{
    ATMOSPHERE_COLOR, ATMOSPHERE_OPACITY, ATMOSPHERE_SCALE, FALLBACK_COLOR, GlobeSurface,
    status_label,
};
pub use instance::{MeshInstance, MeshKind};
pub use marker::{LocationMarker, MARKER_LIGHT_INTENSITY, MARKER_LIGHT_RANGE};
pub use stars::{MAX_STARS, Star, Starfield, StarfieldConfig};
pub use state::{SceneInputs, SceneSettings, SceneState};
pub use weather::{WeatherCondition, WeatherEffectConfig};
