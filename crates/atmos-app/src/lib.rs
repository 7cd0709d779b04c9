//! Weather globe viewer.
//!
//! Owns the winit window, advances the scene on a fixed timestep, and turns
//! mouse input into orbit control.

pub mod game_loop;
pub mod wiring;
pub mod window;
