//! Drag-to-rotate, scroll-to-zoom orbit around a target point.
//!
//! Input accumulates into pending spherical deltas; each tick applies a
//! `damping` fraction of what is pending, which gives the control its inertia.

use std::f32::consts::PI;

use glam::Vec3;

use crate::pose::CameraPose;

const MIN_POLAR: f32 = 1e-3;
const SETTLE_EPSILON: f32 = 1e-6;

/// User orbit control. Disabled while the camera is animated programmatically
/// or while an external lock is held.
#[derive(Clone, Debug)]
pub struct OrbitControls {
    /// Whether user input is accepted and applied.
    pub enabled: bool,
    /// Point the camera orbits around and looks at.
    pub target: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Fraction of the pending motion applied per tick.
    pub damping: f32,
    /// Radians per pixel of drag.
    pub rotate_speed: f32,
    /// Zoom exponent per scroll line.
    pub zoom_speed: f32,
    pending_azimuth: f32,
    pending_polar: f32,
    pending_zoom: f32,
}

impl OrbitControls {
    pub fn new(target: Vec3, min_distance: f32, max_distance: f32) -> Self {
        Self {
            enabled: true,
            target,
            min_distance,
            max_distance,
            damping: 0.05,
            rotate_speed: 0.005,
            zoom_speed: 0.5,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_zoom: 1.0,
        }
    }

    /// Queue a drag of `(dx, dy)` pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        if !self.enabled {
            return;
        }
        self.pending_azimuth -= dx * self.rotate_speed;
        self.pending_polar -= dy * self.rotate_speed;
    }

    /// Queue a scroll of `lines`; positive moves closer.
    pub fn zoom(&mut self, lines: f32) {
        if !self.enabled {
            return;
        }
        self.pending_zoom *= 0.95f32.powf(self.zoom_speed * lines);
    }

    /// Drop any queued motion.
    pub fn stop(&mut self) {
        self.pending_azimuth = 0.0;
        self.pending_polar = 0.0;
        self.pending_zoom = 1.0;
    }

    /// True if queued motion remains.
    pub fn is_moving(&self) -> bool {
        self.pending_azimuth.abs() > SETTLE_EPSILON
            || self.pending_polar.abs() > SETTLE_EPSILON
            || (self.pending_zoom - 1.0).abs() > SETTLE_EPSILON
    }

    /// Apply one tick of queued motion to `pose`. Returns true if it moved.
    pub fn update(&mut self, pose: &mut CameraPose) -> bool {
        if !self.enabled {
            self.stop();
            return false;
        }
        if !self.is_moving() {
            self.stop();
            return false;
        }

        let offset = pose.position - self.target;
        let mut radius = offset.length();
        if radius < SETTLE_EPSILON {
            self.stop();
            return false;
        }

        let mut azimuth = offset.x.atan2(offset.z);
        let mut polar = (offset.y / radius).clamp(-1.0, 1.0).acos();

        azimuth += self.pending_azimuth * self.damping;
        polar = (polar + self.pending_polar * self.damping).clamp(MIN_POLAR, PI - MIN_POLAR);
        self.pending_azimuth *= 1.0 - self.damping;
        self.pending_polar *= 1.0 - self.damping;

        if (self.pending_zoom - 1.0).abs() > SETTLE_EPSILON {
            radius = (radius * self.pending_zoom).clamp(self.min_distance, self.max_distance);
            self.pending_zoom = 1.0;
        }

        let (sin_polar, cos_polar) = polar.sin_cos();
        let (sin_azimuth, cos_azimuth) = azimuth.sin_cos();
        let offset = Vec3::new(
            radius * sin_polar * sin_azimuth,
            radius * cos_polar,
            radius * sin_polar * cos_azimuth,
        );
        pose.position = self.target + offset;
        pose.look_at = self.target;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls() -> OrbitControls {
        OrbitControls::new(Vec3::ZERO, 2.1, 3.8)
    }

    #[test]
    fn test_idle_controls_do_not_move_camera() {
        let mut c = controls();
        let mut pose = CameraPose::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO);
        assert!(!c.update(&mut pose));
        assert_eq!(pose.position, Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn test_drag_rotates_at_constant_distance() {
        let mut c = controls();
        let mut pose = CameraPose::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO);
        c.rotate(200.0, 0.0);
        for _ in 0..600 {
            c.update(&mut pose);
        }
        assert!((pose.position.length() - 3.0).abs() < 1e-4, "distance kept");
        assert!(pose.position.x.abs() > 0.5, "camera should have swung around");
        assert!(!c.is_moving(), "inertia should die out");
    }

    #[test]
    fn test_total_rotation_matches_drag() {
        let mut c = controls();
        let mut pose = CameraPose::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO);
        c.rotate(-100.0, 0.0);
        for _ in 0..2000 {
            c.update(&mut pose);
        }
        let azimuth = pose.position.x.atan2(pose.position.z);
        assert!((azimuth - 0.5).abs() < 1e-3, "expected 0.5 rad, got {azimuth}");
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut c = controls();
        let mut pose = CameraPose::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO);
        c.zoom(500.0);
        c.update(&mut pose);
        assert!((pose.distance() - 2.1).abs() < 1e-4, "clamped to min");

        c.zoom(-500.0);
        c.update(&mut pose);
        assert!((pose.distance() - 3.8).abs() < 1e-4, "clamped to max");
    }

    #[test]
    fn test_polar_angle_never_flips_over_pole() {
        let mut c = controls();
        let mut pose = CameraPose::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO);
        c.rotate(0.0, 10_000.0);
        for _ in 0..500 {
            c.update(&mut pose);
        }
        assert!(pose.position.y.abs() < 3.0, "must stop just short of the pole");
        assert!(pose.position.is_finite());
    }

    #[test]
    fn test_disabled_controls_ignore_input() {
        let mut c = controls();
        c.enabled = false;
        let mut pose = CameraPose::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO);
        c.rotate(50.0, 50.0);
        c.zoom(3.0);
        assert!(!c.is_moving());
        assert!(!c.update(&mut pose));
        assert_eq!(pose.position, Vec3::new(0.0, 0.0, 3.0));
    }
}
