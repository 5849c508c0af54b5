//! # Frame Driver
//!
//! [`StudioContext`] owns every piece of mutable application state: configuration, camera,
//! active controller, world, proximity activator, UI state and the animation clock. The
//! [`FrameDriver`] advances it once per redraw, in a fixed order:
//!
//! 1. apply queued UI actions (view reset, scheme switch, pointer-lock request);
//! 2. let the controller integrate the camera;
//! 3. advance the animation clock and the world, unless animation is paused;
//! 4. run the proximity activator against the camera position;
//! 5. tick the UI clock.
//!
//! Rendering happens after the tick, in `app.rs`, from the same context.
//!
//! A failed tick is logged once and halts the driver for good: no further frames run.

use web_time::{Duration, Instant};

use crate::camera::Camera;
use crate::config::{ControlScheme, StudioConfig};
use crate::controls::{create_controller, CameraController, InputEvent, Key};
use crate::error::StudioError;
use crate::proximity::ProximityActivator;
use crate::ui::{Tooltip, UiState};
use crate::world::World;

/// Frames longer than this are integrated as if they took this long.
pub const MAX_FRAME_DELTA: f32 = 0.1;

pub struct StudioContext {
    pub config: StudioConfig,
    pub camera: Camera,
    pub controller: Box<dyn CameraController>,
    pub world: World,
    pub activator: ProximityActivator,
    pub ui: UiState,
    /// Seconds of animation so far; stands still while animation is paused.
    pub animation_clock: f32,
    viewport: [f32; 2],
    lock_requested: bool,
}

impl StudioContext {
    pub fn new(config: StudioConfig, world: World, now: Instant) -> Self {
        let mut camera = Camera::new(&config.camera);
        let controller = create_controller(config.scheme, &config, &mut camera);
        Self {
            activator: ProximityActivator::new(config.activation_radius),
            ui: UiState::new(config.ui, now),
            camera,
            controller,
            world,
            config,
            animation_clock: 0.0,
            viewport: [1.0, 1.0],
            lock_requested: false,
        }
    }

    pub fn scheme(&self) -> ControlScheme {
        self.controller.scheme()
    }

    /// Routes one input event to the UI or the active controller.
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(Key::ToggleUi) => self.ui.toggle_panel(),
            InputEvent::KeyUp(Key::ToggleUi) => {}
            InputEvent::PointerLocked => {
                self.ui.on_pointer_locked();
                self.ui.set_tooltip(None);
                self.controller.handle_input(&event, &mut self.camera);
            }
            _ => self.controller.handle_input(&event, &mut self.camera),
        }
    }

    /// Asks the platform for pointer capture if the active scheme uses it.
    pub fn request_pointer_lock(&mut self) {
        if self.controller.wants_pointer_lock() {
            self.lock_requested = true;
        }
    }

    /// Returns and clears a pending pointer-lock request.
    pub fn take_pointer_lock_request(&mut self) -> bool {
        std::mem::take(&mut self.lock_requested)
    }

    /// The platform refused pointer capture: the controller stays unlocked and still.
    pub fn pointer_lock_failed(&mut self, error: &StudioError) {
        log::error!("{error}; first-person movement is disabled until the pointer is captured");
    }

    pub fn reset_view(&mut self) {
        self.controller.reset(&mut self.camera);
    }

    /// Swaps between orbit and first-person controls.
    pub fn switch_scheme(&mut self) {
        let next = match self.scheme() {
            ControlScheme::Orbit => ControlScheme::FirstPerson,
            ControlScheme::FirstPerson => ControlScheme::Orbit,
        };
        self.controller = create_controller(next, &self.config, &mut self.camera);
        self.controller.set_viewport_height(self.viewport[1]);
        self.ui.set_tooltip(None);
    }

    /// Viewport size in physical pixels.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
        self.viewport = [width.max(1) as f32, height.max(1) as f32];
        self.controller.set_viewport_height(self.viewport[1]);
    }

    pub fn viewport(&self) -> [f32; 2] {
        self.viewport
    }

    /// Updates the hover tooltip for a cursor position in physical pixels.
    ///
    /// `scale` converts to the logical pixels the UI draws in.
    pub fn update_hover(&mut self, cursor: Option<[f32; 2]>, scale: f32) {
        let tooltip = cursor
            .filter(|_| !self.controller.is_pointer_locked())
            .and_then(|cursor| {
                let text = self.world.tooltip_at(&self.camera, cursor, self.viewport)?;
                Some(Tooltip {
                    text,
                    position: [cursor[0] / scale, cursor[1] / scale],
                })
            });
        self.ui.set_tooltip(tooltip);
    }
}

/// Sequences one frame of the studio and stops for good after a failure.
#[derive(Debug, Default)]
pub struct FrameDriver {
    halted: bool,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Runs a tick and reports whether the loop should keep going.
    pub fn run_frame(&mut self, ctx: &mut StudioContext, delta: Duration, now: Instant) -> bool {
        if self.halted {
            return false;
        }
        if let Err(error) = self.tick(ctx, delta, now) {
            log::error!("{error}; stopping the animation loop");
            self.halted = true;
        }
        !self.halted
    }

    /// Advances the context by one frame of `delta`.
    pub fn tick(
        &mut self,
        ctx: &mut StudioContext,
        delta: Duration,
        now: Instant,
    ) -> Result<(), StudioError> {
        let dt = delta.as_secs_f32().min(MAX_FRAME_DELTA);

        let actions = ctx.ui.take_actions();
        if actions.switch_scheme {
            ctx.switch_scheme();
        }
        if actions.reset_view {
            ctx.reset_view();
        }
        if actions.request_pointer_lock {
            ctx.request_pointer_lock();
        }

        ctx.controller.update(&mut ctx.camera, dt);
        if !ctx.camera.position.iter().all(|c| c.is_finite()) {
            return Err(StudioError::Tick(format!(
                "camera position became non-finite: {:?}",
                ctx.camera.position
            )));
        }

        if ctx.ui.is_animation_active() {
            ctx.animation_clock += dt;
            ctx.world.update(ctx.animation_clock);
        }

        let StudioContext {
            camera,
            world,
            activator,
            ui,
            ..
        } = &mut *ctx;
        activator.update(&camera.position, &mut world.stations, &mut world.graph, ui);

        ctx.ui.tick(now);
        Ok(())
    }
}
