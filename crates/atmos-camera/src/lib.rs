//! Globe camera: a user-driven orbit control plus a controller that animates
//! between free orbit and a focused view of a location on the surface.

mod controller;
mod orbit;
mod pose;

pub use controller::{
    AnimationState, CameraController, CameraEvent, CameraPhase, DEFAULT_ANIMATION_SPEED,
};
pub use orbit::OrbitControls;
pub use pose::{CameraPose, Projection};
