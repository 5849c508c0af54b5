//! # Camera
//!
//! A perspective camera described by a position and a yaw/pitch orientation. Yaw turns
//! about +Y, with yaw 0 looking down -Z; pitch tilts up toward +Y. Both controllers write
//! this pose: first-person through mouse deltas, orbit through [`Camera::look_at`].

use nalgebra_glm as glm;

use crate::config::CameraSettings;

/// Pitch stays this far away from straight up or down so the view basis never degenerates.
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: glm::Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
}

impl Camera {
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            position: glm::make_vec3(&settings.start),
            yaw: 0.0,
            pitch: 0.0,
            fov_y: settings.fov_y_degrees.to_radians(),
            near: settings.near,
            far: settings.far,
            aspect: 1.0,
        }
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> glm::Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        glm::vec3(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    /// Unit vector to the camera's right, always horizontal.
    pub fn right(&self) -> glm::Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        glm::vec3(cos_yaw, 0.0, -sin_yaw)
    }

    /// Camera-relative up, perpendicular to `forward` and `right`.
    pub fn up(&self) -> glm::Vec3 {
        glm::cross(&self.right(), &self.forward())
    }

    /// Forward direction flattened onto the ground plane.
    pub fn forward_flat(&self) -> glm::Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        glm::vec3(-sin_yaw, 0.0, -cos_yaw)
    }

    /// Adds look rotation, clamping pitch short of the poles.
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Turns the camera toward `target`. A target at the camera position is ignored.
    pub fn look_at(&mut self, target: &glm::Vec3) {
        let offset = target - self.position;
        if glm::length2(&offset) <= f32::EPSILON {
            return;
        }
        let dir = glm::normalize(&offset);
        self.pitch = dir.y.clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.yaw = (-dir.x).atan2(-dir.z);
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view(&self) -> glm::Mat4 {
        glm::look_at_rh(
            &self.position,
            &(self.position + self.forward()),
            &glm::Vec3::y(),
        )
    }

    pub fn projection(&self) -> glm::Mat4 {
        glm::perspective_rh_zo(self.aspect, self.fov_y, self.near, self.far)
    }

    pub fn view_projection(&self) -> glm::Mat4 {
        self.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn camera() -> Camera {
        Camera::new(&CameraSettings::default())
    }

    #[test]
    fn test_default_looks_down_negative_z() {
        let cam = camera();
        let f = cam.forward();
        assert!(approx_eq(f.x, 0.0) && approx_eq(f.y, 0.0) && approx_eq(f.z, -1.0));
        let r = cam.right();
        assert!(approx_eq(r.x, 1.0) && approx_eq(r.z, 0.0));
        assert!(approx_eq(cam.up().y, 1.0));
    }

    #[test]
    fn test_look_at_points_forward_at_target() {
        let mut cam = camera();
        cam.position = glm::vec3(3.0, 4.0, 5.0);
        let target = glm::vec3(-1.0, 0.0, 2.0);
        cam.look_at(&target);
        let expected = glm::normalize(&(target - cam.position));
        let f = cam.forward();
        assert!(approx_eq(f.x, expected.x));
        assert!(approx_eq(f.y, expected.y));
        assert!(approx_eq(f.z, expected.z));
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut cam = camera();
        cam.rotate(0.0, 10.0);
        assert!(cam.pitch < std::f32::consts::FRAC_PI_2);
        cam.rotate(0.0, -20.0);
        assert!(cam.pitch > -std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_view_projection_maps_point_ahead_into_clip_volume() {
        let mut cam = camera();
        cam.set_aspect(1600, 900);
        let ahead = cam.position + cam.forward() * 10.0;
        let clip = cam.view_projection() * glm::vec4(ahead.x, ahead.y, ahead.z, 1.0);
        let ndc = clip / clip.w;
        assert!(approx_eq(ndc.x, 0.0) && approx_eq(ndc.y, 0.0));
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_zero_sized_viewport_keeps_aspect() {
        let mut cam = camera();
        cam.set_aspect(800, 400);
        cam.set_aspect(0, 400);
        assert!(approx_eq(cam.aspect, 2.0));
    }
}
