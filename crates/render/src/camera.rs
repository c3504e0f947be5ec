//! Tracking camera used by the software renderers.

use glam::{Mat4, Vec3, Vec4Swizzles};

/// Perspective camera that follows a target point from a fixed offset.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Offset from the target to the eye, world frame.
    pub offset: Vec3,
    /// Up vector of the camera.
    pub up: Vec3,
    /// Render target aspect ratio.
    pub aspect: f32,
    /// Field of view in radians.
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    /// Three-quarter view from behind and to the side of the target, z up.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn tracking(width: u32, height: u32) -> Self {
        Self {
            offset: Vec3::new(-2.5, -2.5, 1.5),
            up: Vec3::Z,
            aspect: width as f32 / height as f32,
            fovy: 45.0f32.to_radians(),
            znear: 0.05,
            zfar: 100.0,
        }
    }

    /// Combined view projection matrix looking at `target`.
    #[must_use]
    pub fn build_view_projection_matrix(&self, target: Vec3) -> Mat4 {
        let view = Mat4::look_at_rh(target + self.offset, target, self.up);
        let proj = Mat4::perspective_rh(self.fovy, self.aspect, self.znear, self.zfar);
        proj * view
    }

    /// Projects `point` to pixel coordinates, `None` when it is behind the
    /// camera or outside the clip volume.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn project(view_proj: &Mat4, point: Vec3, width: u32, height: u32) -> Option<(f32, f32)> {
        let clip = *view_proj * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        // perspective_rh maps depth to [0, 1]
        if !(0.0..=1.0).contains(&ndc.z) {
            return None;
        }
        let x = (ndc.x + 1.0) * 0.5 * width as f32;
        let y = (1.0 - ndc.y) * 0.5 * height as f32;
        Some((x, y))
    }
}
