//! Camera position/look-at pair and the projection used to draw it.

use glam::{Mat4, Vec3};

/// Where the camera is and what it looks at. Y is always up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

impl CameraPose {
    pub fn new(position: Vec3, look_at: Vec3) -> Self {
        Self { position, look_at }
    }

    /// Component-wise linear blend of position and look-at.
    pub fn lerp(&self, other: &CameraPose, t: f32) -> CameraPose {
        CameraPose {
            position: self.position.lerp(other.position, t),
            look_at: self.look_at.lerp(other.look_at, t),
        }
    }

    /// Right-handed view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        let forward = self.look_at - self.position;
        // Looking straight along Y needs a different up reference.
        let up = if forward.normalize_or_zero().abs().y > 0.999 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        Mat4::look_at_rh(self.position, self.look_at, up)
    }

    /// Distance between the camera and its look-at point.
    pub fn distance(&self) -> f32 {
        self.position.distance(self.look_at)
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO)
    }
}

/// Perspective projection with reverse-Z depth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    /// Reverse-Z: the near plane maps to depth 1 and the far plane to 0.
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
    }

    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect_ratio = width / height;
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y: 45f32.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 0.01,
            far: 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pose_looks_at_origin_from_plus_z() {
        let pose = CameraPose::default();
        let view = pose.view_matrix();
        let origin_in_view = view.transform_point3(Vec3::ZERO);
        assert!(
            (origin_in_view - Vec3::new(0.0, 0.0, -5.0)).length() < 1e-5,
            "origin should be 5 units down -Z, got {origin_in_view}"
        );
    }

    #[test]
    fn test_view_matrix_straight_down_is_finite() {
        let pose = CameraPose::new(Vec3::new(0.0, 4.0, 0.0), Vec3::ZERO);
        assert!(pose.view_matrix().is_finite());
    }

    #[test]
    fn test_reverse_z_depth() {
        let proj = Projection::default();
        let m = proj.matrix();
        let near = m.project_point3(Vec3::new(0.0, 0.0, -proj.near));
        let far = m.project_point3(Vec3::new(0.0, 0.0, -proj.far));
        assert!((near.z - 1.0).abs() < 1e-4, "near plane depth {}", near.z);
        assert!(far.z.abs() < 1e-4, "far plane depth {}", far.z);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = CameraPose::default();
        let b = CameraPose::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ONE);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
    }
}
