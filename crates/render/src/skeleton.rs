//! Line-drawing renderer for articulated bodies.

use crate::camera::Camera;
use crate::error::RenderError;
use crate::scene::{RenderSettings, Skeleton};
use crate::Renderer;
use envs::Snapshot;
use glam::{Mat4, Quat, Vec3};
use image::{Rgb, RgbImage};

const SKY: Rgb<u8> = Rgb([200, 215, 230]);
const GRID: Rgb<u8> = Rgb([150, 160, 170]);
const BODY: Rgb<u8> = Rgb([40, 60, 90]);
const LIMB: Rgb<u8> = Rgb([210, 110, 40]);
const MOCAP: Rgb<u8> = Rgb([30, 160, 60]);
const FORCE: Rgb<u8> = Rgb([220, 30, 30]);
const GRID_EXTENT: i32 = 6;
const FORCE_SCALE: f32 = 0.01;

/// Draws the base, its limbs and a ground grid that scrolls with the base.
pub struct SkeletonRenderer {
    skeleton: Skeleton,
}

impl SkeletonRenderer {
    #[must_use]
    pub fn new(skeleton: Skeleton) -> Self {
        Self { skeleton }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn draw(&self, snapshot: &Snapshot, settings: &RenderSettings, camera: &Camera) -> RgbImage {
        let (w, h) = (settings.width, settings.height);
        let mut frame = RgbImage::from_pixel(w, h, SKY);
        let q = &snapshot.qpos;
        let base = Vec3::new(q[0] as f32, q[1] as f32, q[2] as f32);
        let orientation = Quat::from_xyzw(q[4] as f32, q[5] as f32, q[6] as f32, q[3] as f32).normalize();
        let view_proj = camera.build_view_projection_matrix(base);

        let cx = base.x.round() as i32;
        let cy = base.y.round() as i32;
        for i in -GRID_EXTENT..=GRID_EXTENT {
            let (a, b) = ((cx + i) as f32, (cy + i) as f32);
            let (lo_x, hi_x) = ((cx - GRID_EXTENT) as f32, (cx + GRID_EXTENT) as f32);
            let (lo_y, hi_y) = ((cy - GRID_EXTENT) as f32, (cy + GRID_EXTENT) as f32);
            segment(&mut frame, &view_proj, Vec3::new(a, lo_y, 0.0), Vec3::new(a, hi_y, 0.0), GRID);
            segment(&mut frame, &view_proj, Vec3::new(lo_x, b, 0.0), Vec3::new(hi_x, b, 0.0), GRID);
        }

        let torso_top = base + orientation * Vec3::new(0.0, 0.0, 0.35);
        let torso_bottom = base + orientation * Vec3::new(0.0, 0.0, -0.1);
        let body = if settings.scene.transparent { blend(BODY, SKY) } else { BODY };
        thick_segment(&mut frame, &view_proj, torso_bottom, torso_top, body);

        for chain in &self.skeleton.chains {
            let mut joint = base + orientation * Vec3::from(chain.anchor);
            let mut bend = 0.0f32;
            for &idx in &chain.joints {
                bend += q[idx] as f32;
                let dir = orientation * (Quat::from_rotation_y(bend) * Vec3::NEG_Z);
                let next = joint + dir * self.skeleton.segment_length;
                segment(&mut frame, &view_proj, joint, next, LIMB);
                joint = next;
            }
        }

        for pos in &snapshot.mocap_pos {
            let p = Vec3::new(pos[0] as f32, pos[1] as f32, pos[2] as f32);
            marker(&mut frame, &view_proj, p, MOCAP);
        }

        if settings.scene.perturbation_forces {
            if let Some(wrench) = snapshot.xfrc_applied.first() {
                let force = Vec3::new(wrench[0] as f32, wrench[1] as f32, wrench[2] as f32);
                if force.length_squared() > 0.0 {
                    segment(&mut frame, &view_proj, base, base + force * FORCE_SCALE, FORCE);
                }
            }
        }
        frame
    }
}

impl Default for SkeletonRenderer {
    fn default() -> Self {
        Self::new(Skeleton::biped(6))
    }
}

impl Renderer for SkeletonRenderer {
    fn render(
        &mut self,
        trajectory: &[Snapshot],
        settings: &RenderSettings,
    ) -> Result<Vec<RgbImage>, RenderError> {
        if trajectory.is_empty() {
            return Err(RenderError::EmptyTrajectory);
        }
        if settings.width == 0 || settings.height == 0 {
            return Err(RenderError::InvalidFrameSize { width: settings.width, height: settings.height });
        }
        let expected = self.skeleton.required_qpos();
        if let Some((index, s)) = trajectory.iter().enumerate().find(|(_, s)| s.qpos.len() < expected) {
            return Err(RenderError::ShortState { index, len: s.qpos.len(), expected });
        }
        let camera = Camera::tracking(settings.width, settings.height);
        Ok(trajectory.iter().map(|s| self.draw(s, settings, &camera)).collect())
    }
}

fn blend(a: Rgb<u8>, b: Rgb<u8>) -> Rgb<u8> {
    let mix = |x: u8, y: u8| u8::try_from((u16::from(x) + u16::from(y)) / 2).unwrap_or(u8::MAX);
    Rgb([mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])])
}

fn segment(frame: &mut RgbImage, view_proj: &Mat4, a: Vec3, b: Vec3, color: Rgb<u8>) {
    let (w, h) = frame.dimensions();
    if let (Some(p), Some(q)) =
        (Camera::project(view_proj, a, w, h), Camera::project(view_proj, b, w, h))
    {
        line(frame, p, q, color);
    }
}

fn thick_segment(frame: &mut RgbImage, view_proj: &Mat4, a: Vec3, b: Vec3, color: Rgb<u8>) {
    let (w, h) = frame.dimensions();
    if let (Some(p), Some(q)) =
        (Camera::project(view_proj, a, w, h), Camera::project(view_proj, b, w, h))
    {
        for d in -2i8..=2 {
            let d = f32::from(d);
            line(frame, (p.0 + d, p.1), (q.0 + d, q.1), color);
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn marker(frame: &mut RgbImage, view_proj: &Mat4, p: Vec3, color: Rgb<u8>) {
    let (w, h) = frame.dimensions();
    if let Some((x, y)) = Camera::project(view_proj, p, w, h) {
        for dy in -3..=3 {
            for dx in -3..=3 {
                put(frame, x.round() as i64 + dx, y.round() as i64 + dy, color);
            }
        }
    }
}

/// DDA line between two pixel positions, clipped to the frame.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn line(frame: &mut RgbImage, (x0, y0): (f32, f32), (x1, y1): (f32, f32), color: Rgb<u8>) {
    let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0);
    if !steps.is_finite() || steps > 10_000.0 {
        return;
    }
    let n = steps as usize;
    for i in 0..=n {
        let t = i as f32 / steps;
        let x = (x0 + (x1 - x0) * t).round() as i64;
        let y = (y0 + (y1 - y0) * t).round() as i64;
        put(frame, x, y, color);
    }
}

fn put(frame: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    let (w, h) = frame.dimensions();
    if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
        if x < w && y < h {
            frame.put_pixel(x, y, color);
        }
    }
}
