//! # Orbit Controls
//!
//! Rotates, pans and zooms the camera around a target point.
//!
//! - Left drag: the camera's spherical offset from the target turns by
//!   `2π · delta · rotate_speed / viewport_height` in azimuth and polar angle. Dragging
//!   right swings the camera towards +X; dragging down lowers it.
//! - Right drag: target and camera slide together in the view plane, scaled so the point
//!   under the cursor follows it.
//! - Wheel: the offset is multiplied (zoom in) or divided (zoom out) by `0.95^zoom_speed`.
//!
//! The drag gesture is a three-state machine keyed off button press and release, see
//! [`OrbitState`].

use std::f32::consts::{PI, TAU};

use nalgebra_glm as glm;

use super::{CameraController, InputEvent, MouseButton};
use crate::camera::Camera;
use crate::config::{ControlScheme, OrbitTuning};

/// Keeps the polar angle off the poles so the offset never lines up with +Y.
const POLAR_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitState {
    None,
    Rotate,
    Pan,
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    tuning: OrbitTuning,
    target: glm::Vec3,
    state: OrbitState,
    last_cursor: glm::Vec2,
    viewport_height: f32,
}

impl OrbitControls {
    pub fn new(tuning: OrbitTuning) -> Self {
        Self {
            tuning,
            target: glm::make_vec3(&tuning.target),
            state: OrbitState::None,
            last_cursor: glm::Vec2::zeros(),
            viewport_height: 600.0,
        }
    }

    pub fn state(&self) -> OrbitState {
        self.state
    }

    pub fn target(&self) -> glm::Vec3 {
        self.target
    }

    /// `0.95^zoom_speed`, the factor one wheel notch applies to the camera distance.
    pub fn zoom_scale(&self) -> f32 {
        0.95_f32.powf(self.tuning.zoom_speed)
    }

    fn rotate(&mut self, camera: &mut Camera, left: f32, up: f32) {
        let offset = camera.position - self.target;
        let radius = glm::length(&offset);
        if radius <= f32::EPSILON {
            return;
        }
        let theta = offset.x.atan2(offset.z) + left;
        let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() + up)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

        let offset = glm::vec3(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = self.target + offset;
        camera.look_at(&self.target);
    }

    fn dolly(&mut self, camera: &mut Camera, factor: f32) {
        let offset = (camera.position - self.target) * factor;
        camera.position = self.target + offset;
        camera.look_at(&self.target);
    }

    fn pan(&mut self, camera: &mut Camera, dx: f32, dy: f32) {
        let distance = glm::length(&(camera.position - self.target)) * (camera.fov_y / 2.0).tan();
        let height = self.viewport_height.max(1.0);
        let left = 2.0 * dx * distance / height * self.tuning.pan_speed;
        let up = 2.0 * dy * distance / height * self.tuning.pan_speed;

        let shift = camera.right() * -left + camera.up() * up;
        self.target += shift;
        camera.position += shift;
    }
}

impl CameraController for OrbitControls {
    fn scheme(&self) -> ControlScheme {
        ControlScheme::Orbit
    }

    fn handle_input(&mut self, event: &InputEvent, camera: &mut Camera) {
        match *event {
            InputEvent::MouseDown { button, x, y } => {
                self.state = match button {
                    MouseButton::Left => OrbitState::Rotate,
                    MouseButton::Right => OrbitState::Pan,
                    MouseButton::Middle => OrbitState::None,
                };
                self.last_cursor = glm::vec2(x, y);
            }
            InputEvent::MouseUp { .. } => self.state = OrbitState::None,
            InputEvent::CursorMoved { x, y } => {
                let cursor = glm::vec2(x, y);
                let delta = cursor - self.last_cursor;
                self.last_cursor = cursor;
                match self.state {
                    OrbitState::Rotate => {
                        let delta = delta * self.tuning.rotate_speed;
                        let height = self.viewport_height.max(1.0);
                        self.rotate(camera, TAU * delta.x / height, TAU * delta.y / height);
                    }
                    OrbitState::Pan => self.pan(camera, delta.x, delta.y),
                    OrbitState::None => {}
                }
            }
            InputEvent::Wheel { delta } if delta > 0.0 => {
                let scale = self.zoom_scale();
                self.dolly(camera, scale);
            }
            InputEvent::Wheel { delta } if delta < 0.0 => {
                let scale = self.zoom_scale();
                self.dolly(camera, 1.0 / scale);
            }
            _ => {}
        }
    }

    fn update(&mut self, camera: &mut Camera, _delta_time: f32) {
        camera.look_at(&self.target);
    }

    fn reset(&mut self, camera: &mut Camera) {
        self.state = OrbitState::None;
        self.target = glm::make_vec3(&self.tuning.target);
        camera.position = glm::make_vec3(&self.tuning.home);
        camera.look_at(&self.target);
    }

    fn set_viewport_height(&mut self, height: f32) {
        if height > 0.0 {
            self.viewport_height = height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraSettings;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn setup() -> (OrbitControls, Camera) {
        let mut camera = Camera::new(&CameraSettings::default());
        let mut controls = OrbitControls::new(OrbitTuning::default());
        controls.reset(&mut camera);
        (controls, camera)
    }

    fn drag(controls: &mut OrbitControls, camera: &mut Camera, button: MouseButton, dx: f32, dy: f32) {
        controls.handle_input(&InputEvent::MouseDown { button, x: 100.0, y: 100.0 }, camera);
        controls.handle_input(&InputEvent::CursorMoved { x: 100.0 + dx, y: 100.0 + dy }, camera);
        controls.handle_input(&InputEvent::MouseUp { button }, camera);
    }

    #[test]
    fn test_reset_places_camera_at_home() {
        let (controls, camera) = setup();
        assert!(approx_eq(camera.position.z, 5.0));
        assert_eq!(controls.target(), glm::Vec3::zeros());
        assert!(approx_eq(camera.forward().z, -1.0));
    }

    #[test]
    fn test_button_state_machine() {
        let (mut controls, mut camera) = setup();
        assert_eq!(controls.state(), OrbitState::None);
        controls.handle_input(
            &InputEvent::MouseDown { button: MouseButton::Left, x: 0.0, y: 0.0 },
            &mut camera,
        );
        assert_eq!(controls.state(), OrbitState::Rotate);
        controls.handle_input(&InputEvent::MouseUp { button: MouseButton::Left }, &mut camera);
        assert_eq!(controls.state(), OrbitState::None);
        controls.handle_input(
            &InputEvent::MouseDown { button: MouseButton::Right, x: 0.0, y: 0.0 },
            &mut camera,
        );
        assert_eq!(controls.state(), OrbitState::Pan);
    }

    #[test]
    fn test_cursor_motion_without_button_does_nothing() {
        let (mut controls, mut camera) = setup();
        let before = camera.position;
        controls.handle_input(&InputEvent::CursorMoved { x: 300.0, y: 50.0 }, &mut camera);
        assert_eq!(camera.position, before);
    }

    #[test]
    fn test_rotate_keeps_distance_and_faces_target() {
        let (mut controls, mut camera) = setup();
        controls.set_viewport_height(600.0);
        drag(&mut controls, &mut camera, MouseButton::Left, 150.0, 0.0);
        assert!(approx_eq(glm::length(&camera.position), 5.0));
        // A quarter of the viewport height turns the azimuth by a quarter turn.
        assert!(approx_eq(camera.position.x, 5.0));
        let to_target = glm::normalize(&-camera.position);
        assert!(approx_eq(glm::dot(&camera.forward(), &to_target), 1.0));
    }

    #[test]
    fn test_dragging_down_lowers_the_camera() {
        let (mut controls, mut camera) = setup();
        controls.set_viewport_height(600.0);
        drag(&mut controls, &mut camera, MouseButton::Left, 0.0, 50.0);
        assert!(camera.position.y < 0.0);
        assert!(approx_eq(camera.position.x, 0.0));
        assert!(approx_eq(glm::length(&camera.position), 5.0));
    }

    #[test]
    fn test_vertical_rotate_stops_short_of_pole() {
        let (mut controls, mut camera) = setup();
        drag(&mut controls, &mut camera, MouseButton::Left, 0.0, 5000.0);
        assert!(camera.position.y < 5.0);
        assert!(approx_eq(glm::length(&camera.position), 5.0));
    }

    #[test]
    fn test_wheel_zooms_by_exponential_scale() {
        let (mut controls, mut camera) = setup();
        let scale = 0.95_f32.powf(1.2);
        controls.handle_input(&InputEvent::Wheel { delta: 1.0 }, &mut camera);
        assert!(approx_eq(glm::length(&camera.position), 5.0 * scale));
        controls.handle_input(&InputEvent::Wheel { delta: -1.0 }, &mut camera);
        controls.handle_input(&InputEvent::Wheel { delta: -1.0 }, &mut camera);
        assert!(approx_eq(glm::length(&camera.position), 5.0 / scale));
    }

    #[test]
    fn test_pan_moves_target_and_camera_together() {
        let (mut controls, mut camera) = setup();
        drag(&mut controls, &mut camera, MouseButton::Right, 100.0, 0.0);
        let offset = camera.position - controls.target();
        assert!(approx_eq(offset.z, 5.0));
        assert!(controls.target().x < 0.0);
    }
}
