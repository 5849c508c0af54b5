//! # Camera Controls
//!
//! Two interchangeable control schemes drive the [`Camera`]:
//!
//! - [`OrbitControls`]: drag to rotate around a target, right-drag to pan, wheel to zoom.
//! - [`FirstPersonControls`]: pointer-locked mouse look with WASD movement under gravity.
//!
//! Both implement [`CameraController`] and consume platform-neutral [`InputEvent`]s, which
//! `input.rs` translates from `winit` events. Keeping the controllers free of `winit`
//! types lets the frame driver and the tests feed them synthetic input.

mod first_person;
mod input;
mod orbit;

pub use first_person::{FirstPersonControls, LockState};
pub use input::{key_from_code, mouse_button_from_winit};
pub use orbit::{OrbitControls, OrbitState};

use nalgebra_glm as glm;

use crate::camera::Camera;
use crate::config::{ControlScheme, StudioConfig};

/// Logical keys the studio reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
    ToggleUi,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Input after translation from the windowing system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    MouseDown { button: MouseButton, x: f32, y: f32 },
    MouseUp { button: MouseButton },
    /// Absolute cursor position in physical pixels.
    CursorMoved { x: f32, y: f32 },
    /// Raw relative motion, delivered while the pointer is captured.
    MouseMotion { dx: f32, dy: f32 },
    /// Positive values scroll away from the user (zoom in).
    Wheel { delta: f32 },
    PointerLocked,
    PointerUnlocked,
}

/// A camera control scheme.
///
/// `handle_input` runs once per event between frames; `update` runs once per frame from
/// the frame driver and integrates whatever state the events left behind.
pub trait CameraController {
    fn scheme(&self) -> ControlScheme;

    fn handle_input(&mut self, event: &InputEvent, camera: &mut Camera);

    fn update(&mut self, camera: &mut Camera, delta_time: f32);

    /// Puts the camera back at this scheme's home pose.
    fn reset(&mut self, camera: &mut Camera);

    /// Whether this scheme wants the pointer captured when the canvas is clicked.
    fn wants_pointer_lock(&self) -> bool {
        false
    }

    fn is_pointer_locked(&self) -> bool {
        false
    }

    /// Viewport height in pixels, used to scale drag gestures.
    fn set_viewport_height(&mut self, _height: f32) {}
}

/// Builds the controller for `scheme` and places the camera at its home pose.
pub fn create_controller(
    scheme: ControlScheme,
    config: &StudioConfig,
    camera: &mut Camera,
) -> Box<dyn CameraController> {
    let mut controller: Box<dyn CameraController> = match scheme {
        ControlScheme::Orbit => Box::new(OrbitControls::new(config.orbit)),
        ControlScheme::FirstPerson => Box::new(FirstPersonControls::new(
            config.first_person,
            glm::make_vec3(&config.camera.start),
        )),
    };
    log::info!("Camera controls: {scheme:?}");
    controller.reset(camera);
    controller
}
