//! Scene illumination: the day/night brightness model, damped ambient and
//! directional intensities, the stochastic lightning flash, and the uniform
//! layouts the renderer uploads each frame.

mod day_night;
mod dynamic;
mod lightning;
mod uniforms;

pub use day_night::{DAY_MS, DayNight, compute_day_night};
pub use dynamic::{DynamicLighting, LightingTarget, WeatherDimming, lighting_target};
pub use lightning::{LIGHTNING_COLOR, LIGHTNING_POSITION, LIGHTNING_RANGE, LightningFlash, OVERLAY_COLOR};
pub use uniforms::{LightingUniform, MAX_POINT_LIGHTS, PointLight, PointLightGpu, srgb_hex};
