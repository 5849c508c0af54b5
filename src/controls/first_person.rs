//! # First-Person Controls
//!
//! Walk-around controls with simple kinematics. While the pointer is captured, every
//! frame:
//!
//! 1. gravity pulls vertical velocity down by `gravity * mass * dt`;
//! 2. horizontal velocity loses `damping * dt` of itself;
//! 3. held movement keys push horizontal velocity along the normalized intent direction;
//! 4. the camera moves along its flattened forward and right axes;
//! 5. position is clamped to the square world boundary, then to the ground level, which
//!    stops the fall and re-arms jumping.
//!
//! Nothing moves while the pointer is free ([`LockState::Unlocked`]).

use nalgebra_glm as glm;

use super::{CameraController, InputEvent, Key};
use crate::camera::Camera;
use crate::config::{ControlScheme, FirstPersonTuning};

/// Pointer capture state, toggled by the platform's lock and unlock notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked,
}

#[derive(Debug, Clone)]
pub struct FirstPersonControls {
    tuning: FirstPersonTuning,
    home: glm::Vec3,
    move_forward: bool,
    move_backward: bool,
    move_left: bool,
    move_right: bool,
    can_jump: bool,
    lock: LockState,
    /// Camera-relative velocity: `x` along right, `z` along backward, `y` world up.
    velocity: glm::Vec3,
}

impl FirstPersonControls {
    pub fn new(tuning: FirstPersonTuning, home: glm::Vec3) -> Self {
        Self {
            tuning,
            home,
            move_forward: false,
            move_backward: false,
            move_left: false,
            move_right: false,
            can_jump: false,
            lock: LockState::Unlocked,
            velocity: glm::Vec3::zeros(),
        }
    }

    pub fn lock_state(&self) -> LockState {
        self.lock
    }

    pub fn velocity(&self) -> glm::Vec3 {
        self.velocity
    }

    pub fn can_jump(&self) -> bool {
        self.can_jump
    }

    fn set_intent(&mut self, key: Key, held: bool) {
        match key {
            Key::Forward => self.move_forward = held,
            Key::Backward => self.move_backward = held,
            Key::Left => self.move_left = held,
            Key::Right => self.move_right = held,
            Key::Jump | Key::ToggleUi | Key::Escape => {}
        }
    }

    /// Normalized intent: `x` toward the right, `z` toward forward.
    fn intent_direction(&self) -> glm::Vec3 {
        let direction = glm::vec3(
            f32::from(u8::from(self.move_right)) - f32::from(u8::from(self.move_left)),
            0.0,
            f32::from(u8::from(self.move_forward)) - f32::from(u8::from(self.move_backward)),
        );
        if glm::length2(&direction) > 0.0 {
            glm::normalize(&direction)
        } else {
            direction
        }
    }
}

impl CameraController for FirstPersonControls {
    fn scheme(&self) -> ControlScheme {
        ControlScheme::FirstPerson
    }

    fn handle_input(&mut self, event: &InputEvent, camera: &mut Camera) {
        match *event {
            InputEvent::KeyDown(Key::Jump) => {
                if self.can_jump {
                    self.velocity.y += self.tuning.jump_velocity;
                }
                self.can_jump = false;
            }
            InputEvent::KeyDown(key) => self.set_intent(key, true),
            InputEvent::KeyUp(key) => self.set_intent(key, false),
            InputEvent::MouseMotion { dx, dy } if self.lock == LockState::Locked => {
                let sensitivity = self.tuning.look_sensitivity;
                camera.rotate(-dx * sensitivity, -dy * sensitivity);
            }
            InputEvent::PointerLocked => {
                log::debug!("Pointer lock acquired");
                self.lock = LockState::Locked;
            }
            InputEvent::PointerUnlocked => {
                log::debug!("Pointer lock released");
                self.lock = LockState::Unlocked;
            }
            _ => {}
        }
    }

    fn update(&mut self, camera: &mut Camera, delta_time: f32) {
        if self.lock != LockState::Locked {
            return;
        }
        let t = &self.tuning;
        let dt = delta_time;

        self.velocity.y -= t.gravity * t.mass * dt;
        self.velocity.x -= self.velocity.x * t.damping * dt;
        self.velocity.z -= self.velocity.z * t.damping * dt;

        let direction = self.intent_direction();
        if self.move_forward || self.move_backward {
            self.velocity.z -= direction.z * t.speed * dt;
        }
        if self.move_left || self.move_right {
            self.velocity.x -= direction.x * t.speed * dt;
        }

        camera.position += camera.right() * (-self.velocity.x * dt);
        camera.position += camera.forward_flat() * (-self.velocity.z * dt);
        camera.position.y += self.velocity.y * dt;

        camera.position.x = camera.position.x.clamp(-t.boundary, t.boundary);
        camera.position.z = camera.position.z.clamp(-t.boundary, t.boundary);

        if camera.position.y < t.ground_level {
            self.velocity.y = 0.0;
            camera.position.y = t.ground_level;
            self.can_jump = true;
        }
    }

    fn reset(&mut self, camera: &mut Camera) {
        self.velocity = glm::Vec3::zeros();
        camera.position = self.home;
        camera.yaw = 0.0;
        camera.pitch = 0.0;
    }

    fn wants_pointer_lock(&self) -> bool {
        self.lock == LockState::Unlocked
    }

    fn is_pointer_locked(&self) -> bool {
        self.lock == LockState::Locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraSettings;

    const EPSILON: f32 = 1e-4;
    const DT: f32 = 1.0 / 60.0;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn setup() -> (FirstPersonControls, Camera) {
        let mut camera = Camera::new(&CameraSettings::default());
        let mut controls =
            FirstPersonControls::new(FirstPersonTuning::default(), glm::vec3(0.0, 1.6, 5.0));
        controls.reset(&mut camera);
        (controls, camera)
    }

    fn locked() -> (FirstPersonControls, Camera) {
        let (mut controls, mut camera) = setup();
        controls.handle_input(&InputEvent::PointerLocked, &mut camera);
        (controls, camera)
    }

    #[test]
    fn test_no_integration_while_unlocked() {
        let (mut controls, mut camera) = setup();
        camera.position.y = 10.0;
        controls.handle_input(&InputEvent::KeyDown(Key::Forward), &mut camera);
        controls.update(&mut camera, DT);
        assert!(approx_eq(camera.position.y, 10.0));
        assert!(approx_eq(camera.position.z, 5.0));
        assert_eq!(controls.velocity(), glm::Vec3::zeros());
    }

    #[test]
    fn test_lock_state_follows_pointer_events() {
        let (mut controls, mut camera) = setup();
        assert_eq!(controls.lock_state(), LockState::Unlocked);
        assert!(controls.wants_pointer_lock());
        controls.handle_input(&InputEvent::PointerLocked, &mut camera);
        assert!(controls.is_pointer_locked());
        assert!(!controls.wants_pointer_lock());
        controls.handle_input(&InputEvent::PointerUnlocked, &mut camera);
        assert_eq!(controls.lock_state(), LockState::Unlocked);
    }

    #[test]
    fn test_one_tick_applies_gravity_and_damping() {
        let (mut controls, mut camera) = locked();
        camera.position.y = 10.0;
        controls.velocity = glm::vec3(2.0, 0.0, -3.0);
        controls.update(&mut camera, DT);

        let t = FirstPersonTuning::default();
        let v = controls.velocity();
        assert!(approx_eq(v.y, -t.gravity * t.mass * DT));
        assert!(approx_eq(v.x, 2.0 * (1.0 - t.damping * DT)));
        assert!(approx_eq(v.z, -3.0 * (1.0 - t.damping * DT)));
        assert!(camera.position.y < 10.0);
    }

    #[test]
    fn test_ground_clamp_stops_fall_and_rearms_jump() {
        let (mut controls, mut camera) = locked();
        camera.position.y = 1.61;
        controls.velocity.y = -50.0;
        assert!(!controls.can_jump());
        controls.update(&mut camera, DT);
        assert!(approx_eq(camera.position.y, 1.6));
        assert_eq!(controls.velocity().y, 0.0);
        assert!(controls.can_jump());
    }

    #[test]
    fn test_jump_only_when_grounded() {
        let (mut controls, mut camera) = locked();
        controls.handle_input(&InputEvent::KeyDown(Key::Jump), &mut camera);
        assert_eq!(controls.velocity().y, 0.0);

        controls.update(&mut camera, DT);
        assert!(controls.can_jump());
        controls.handle_input(&InputEvent::KeyDown(Key::Jump), &mut camera);
        assert!(approx_eq(controls.velocity().y, 100.0));
        assert!(!controls.can_jump());

        controls.update(&mut camera, DT);
        assert!(camera.position.y > 1.6);
    }

    #[test]
    fn test_forward_key_moves_along_view() {
        let (mut controls, mut camera) = locked();
        controls.handle_input(&InputEvent::KeyDown(Key::Forward), &mut camera);
        for _ in 0..30 {
            controls.update(&mut camera, DT);
        }
        assert!(camera.position.z < 5.0);
        assert!(approx_eq(camera.position.x, 0.0));

        controls.handle_input(&InputEvent::KeyUp(Key::Forward), &mut camera);
        for _ in 0..120 {
            controls.update(&mut camera, DT);
        }
        // Damping has brought the walk to a stop two seconds after release.
        let z = camera.position.z;
        for _ in 0..10 {
            controls.update(&mut camera, DT);
        }
        assert!((camera.position.z - z).abs() < 1e-3);
    }

    #[test]
    fn test_diagonal_intent_is_normalized() {
        let (mut controls, mut camera) = locked();
        controls.handle_input(&InputEvent::KeyDown(Key::Forward), &mut camera);
        controls.handle_input(&InputEvent::KeyDown(Key::Right), &mut camera);
        controls.update(&mut camera, DT);
        let v = controls.velocity();
        let horizontal = (v.x * v.x + v.z * v.z).sqrt();
        assert!(approx_eq(horizontal, 250.0 * DT));
    }

    #[test]
    fn test_boundary_clamp() {
        let (mut controls, mut camera) = locked();
        camera.position.x = 44.99;
        controls.velocity.x = -5000.0;
        controls.update(&mut camera, DT);
        assert!(approx_eq(camera.position.x, 45.0));
    }

    #[test]
    fn test_mouse_look_only_while_locked() {
        let (mut controls, mut camera) = setup();
        controls.handle_input(&InputEvent::MouseMotion { dx: 100.0, dy: 0.0 }, &mut camera);
        assert_eq!(camera.yaw, 0.0);
        controls.handle_input(&InputEvent::PointerLocked, &mut camera);
        controls.handle_input(&InputEvent::MouseMotion { dx: 100.0, dy: 50.0 }, &mut camera);
        assert!(approx_eq(camera.yaw, -0.2));
        assert!(approx_eq(camera.pitch, -0.1));
    }
}
