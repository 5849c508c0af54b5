//! # Application Core (`app.rs`)
//!
//! The `App` struct connects the `winit` event loop to the studio: it owns the window, the
//! `egui` integration, the renderer, and the [`StudioContext`] that the [`FrameDriver`]
//! advances every redraw.
//!
//! ## Event Flow
//!
//! - **Keyboard** events always reach the studio, even while `egui` has focus, because the
//!   UI has no text fields and Tab must keep toggling the panel.
//! - **Mouse** events reach the camera controller only when `egui` did not consume them.
//!   A left click on the world asks for pointer capture in first-person mode.
//! - **Raw mouse motion** arrives as a device event and is forwarded while the pointer is
//!   captured.
//! - **Redraw**: hover picking, one frame tick, the UI pass, then the GPU frame. A halted
//!   driver stops requesting redraws.
//!
//! ## Pointer Capture
//!
//! Capture tries `CursorGrabMode::Locked` and falls back to `Confined`. If both fail the
//! failure is logged and first-person look stays off. Escape or losing focus releases it.
//! Browsers end pointer lock on Escape without always delivering the key, so on the web the
//! cursor entering or leaving the canvas while captured is also treated as a release.
//!
//! ## Platform-Specific Notes
//!
//! - **Desktop**: The renderer is created synchronously with `pollster`.
//! - **WebAssembly**: The renderer is created with `spawn_local` and handed back through a
//!   `oneshot` channel. The canvas is appended to the `#canvas-container` element, or to the
//!   document body when the page lacks one.

use std::sync::Arc;

use web_time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent},
    window::{CursorGrabMode, Theme, Window},
};

use crate::config::StudioConfig;
use crate::controls::{key_from_code, mouse_button_from_winit, InputEvent, Key, MouseButton};
use crate::error::StudioError;
use crate::frame::{FrameDriver, StudioContext};
use crate::renderer::{Renderer, SceneFrame};
use crate::world::{World, WorldTextures};

/// Id of the page element the canvas is placed in.
pub const CANVAS_CONTAINER_ID: &str = "canvas-container";

/// The studio application driven by the `winit` event loop.
///
/// # Fields
///
/// - `window`: The main window, shared with the renderer's surface.
/// - `renderer`: Present once GPU initialization has finished.
/// - `gui_state`: `egui` context and its `winit` bridge.
/// - `last_render_time`: Start of the previous frame, for frame deltas.
/// - `renderer_receiver`: (WebAssembly only) Delivers the asynchronously created renderer.
/// - `last_size`: Surface size in physical pixels.
/// - `context`: Camera, controller, world, activator and UI state.
/// - `driver`: Sequences the per-frame update and halts on failure.
/// - `cursor`: Last cursor position in physical pixels, `None` once it leaves the window.
/// - `pointer_captured`: Whether the window currently holds a cursor grab.
pub struct App {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    gui_state: Option<egui_winit::State>,
    last_render_time: Option<Instant>,
    #[cfg(target_arch = "wasm32")]
    renderer_receiver: Option<futures::channel::oneshot::Receiver<Result<Renderer, StudioError>>>,
    last_size: (u32, u32),
    context: StudioContext,
    driver: FrameDriver,
    cursor: Option<[f32; 2]>,
    pointer_captured: bool,
}

impl App {
    /// Builds the world from `config` and waits for the event loop to resume.
    pub fn new(config: StudioConfig) -> Self {
        let world = World::new(WorldTextures::load(&config.asset_root));
        log::info!(
            "World ready: {} nodes, {} stations, {} animated objects",
            world.graph.node_count(),
            world.stations.len(),
            world.animatable_count()
        );
        Self {
            window: None,
            renderer: None,
            gui_state: None,
            last_render_time: None,
            #[cfg(target_arch = "wasm32")]
            renderer_receiver: None,
            last_size: (1, 1),
            context: StudioContext::new(config, world, Instant::now()),
            driver: FrameDriver::new(),
            cursor: None,
            pointer_captured: false,
        }
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.last_size = (width, height);
        self.context.set_viewport(width, height);
    }
}

/// Captures the cursor for first-person look.
fn grab_pointer(window: &Window) -> Result<(), StudioError> {
    window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
        .map_err(|e| StudioError::PointerLockUnavailable(e.to_string()))?;
    window.set_cursor_visible(false);
    Ok(())
}

fn release_pointer(window: &Window) {
    if let Err(error) = window.set_cursor_grab(CursorGrabMode::None) {
        log::warn!("Failed to release the cursor grab: {error}");
    }
    window.set_cursor_visible(true);
}

/// Applies a pending pointer-lock request, if any.
fn apply_pointer_lock_request(window: &Window, context: &mut StudioContext, captured: &mut bool) {
    if !context.take_pointer_lock_request() || *captured {
        return;
    }
    match grab_pointer(window) {
        Ok(()) => {
            *captured = true;
            context.handle_input(InputEvent::PointerLocked);
        }
        Err(error) => context.pointer_lock_failed(&error),
    }
}

fn apply_pointer_release(window: &Window, context: &mut StudioContext, captured: &mut bool) {
    if !*captured {
        return;
    }
    release_pointer(window);
    *captured = false;
    context.handle_input(InputEvent::PointerUnlocked);
}

/// Window events after which a held cursor grab is no longer in effect.
///
/// In the browser a locked cursor never crosses the canvas edge, so entering or leaving
/// means the page dropped the lock itself.
fn ends_pointer_capture(event: &WindowEvent) -> bool {
    match event {
        WindowEvent::Focused(false) => true,
        WindowEvent::CursorLeft { .. } | WindowEvent::CursorEntered { .. } => {
            cfg!(target_arch = "wasm32")
        }
        _ => false,
    }
}

/// Places the winit canvas in the page and returns its initial size.
#[cfg(target_arch = "wasm32")]
fn attach_canvas(window: &Window) -> Result<(u32, u32), StudioError> {
    use winit::platform::web::WindowExtWebSys;

    let canvas = window
        .canvas()
        .ok_or(StudioError::MissingElement("canvas"))?;
    let web_window = web_sys::window().ok_or(StudioError::MissingElement("window"))?;
    let document = web_window
        .document()
        .ok_or(StudioError::MissingElement("document"))?;

    let parent: web_sys::Element = match document.get_element_by_id(CANVAS_CONTAINER_ID) {
        Some(container) => container,
        None => {
            log::error!(
                "{}; appending the canvas to the document body",
                StudioError::MissingElement(CANVAS_CONTAINER_ID)
            );
            document
                .body()
                .map(web_sys::Element::from)
                .ok_or(StudioError::MissingElement("body"))?
        }
    };
    parent
        .append_child(&canvas)
        .map_err(|_| StudioError::MissingElement(CANVAS_CONTAINER_ID))?;

    let dimension = |value: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(1.0)
    };
    let scale = window.scale_factor();
    let width = (dimension(web_window.inner_width()) * scale) as u32;
    let height = (dimension(web_window.inner_height()) * scale) as u32;
    let _ = window.request_inner_size(PhysicalSize::new(width, height));
    Ok((width.max(1), height.max(1)))
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let mut attributes = Window::default_attributes();

        #[cfg(not(target_arch = "wasm32"))]
        {
            attributes = attributes.with_title("Graphics Studio");
        }

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(error) => {
                log::error!("Failed to create the window: {error}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        #[cfg(not(target_arch = "wasm32"))]
        let (width, height) = {
            let inner_size = window.inner_size();
            (inner_size.width.max(1), inner_size.height.max(1))
        };

        #[cfg(target_arch = "wasm32")]
        let (width, height) = match attach_canvas(&window) {
            Ok(size) => size,
            Err(error) => {
                log::error!("{error}");
                (1, 1)
            }
        };

        self.set_size(width, height);
        log::info!("Surface dimensions: ({width} x {height})");

        let gui_context = egui::Context::default();

        #[cfg(target_arch = "wasm32")]
        {
            gui_context.set_pixels_per_point(window.scale_factor() as f32);
        }

        let viewport_id = gui_context.viewport_id();
        let gui_state = egui_winit::State::new(
            gui_context,
            viewport_id,
            &window,
            Some(window.scale_factor() as _),
            Some(Theme::Dark),
            None,
        );

        #[cfg(not(target_arch = "wasm32"))]
        {
            let graph = &self.context.world.graph;
            let renderer = pollster::block_on(Renderer::new(window.clone(), width, height, graph));
            match renderer {
                Ok(renderer) => {
                    self.renderer = Some(renderer);
                    self.context.ui.set_renderer_ready();
                }
                Err(error) => {
                    log::error!("Failed to initialize the renderer: {error}");
                    event_loop.exit();
                    return;
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let (sender, receiver) = futures::channel::oneshot::channel();
            self.renderer_receiver = Some(receiver);
            let graph = self.context.world.graph.clone();
            let window = window.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let renderer = Renderer::new(window, width, height, &graph).await;
                if sender.send(renderer).is_err() {
                    log::error!("Failed to send the renderer to the event loop");
                }
            });
        }

        self.gui_state = Some(gui_state);
        self.last_render_time = Some(Instant::now());
        window.request_redraw();
    }

    fn device_event(
        &mut self,
        _event_loop: &winit::event_loop::ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.pointer_captured {
                self.context.handle_input(InputEvent::MouseMotion {
                    dx: dx as f32,
                    dy: dy as f32,
                });
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        #[cfg(target_arch = "wasm32")]
        {
            let mut renderer_received = false;
            if let Some(receiver) = self.renderer_receiver.as_mut() {
                if let Ok(Some(result)) = receiver.try_recv() {
                    match result {
                        Ok(renderer) => {
                            self.renderer = Some(renderer);
                            self.context.ui.set_renderer_ready();
                            let (width, height) = self.last_size;
                            if let Some(renderer) = self.renderer.as_mut() {
                                renderer.resize(width, height);
                            }
                        }
                        Err(error) => log::error!("Failed to initialize the renderer: {error}"),
                    }
                    renderer_received = true;
                }
            }
            if renderer_received {
                self.renderer_receiver = None;
            }
        }

        if let WindowEvent::Resized(PhysicalSize { width, height }) = event {
            if width > 0 && height > 0 {
                log::info!("Resizing renderer surface to: ({width}, {height})");
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(width, height);
                }
                self.set_size(width, height);
            }
        }

        let (Some(gui_state), Some(window), Some(last_render_time)) = (
            self.gui_state.as_mut(),
            self.window.as_ref(),
            self.last_render_time.as_mut(),
        ) else {
            return;
        };

        let consumed = gui_state.on_window_event(window, &event).consumed;

        if ends_pointer_capture(&event) {
            apply_pointer_release(window, &mut self.context, &mut self.pointer_captured);
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let Some(key) = key_from_code(key_code) else {
                    return;
                };
                if key == Key::ToggleUi && repeat {
                    return;
                }
                match state {
                    ElementState::Pressed => {
                        if key == Key::Escape {
                            apply_pointer_release(
                                window,
                                &mut self.context,
                                &mut self.pointer_captured,
                            );
                        }
                        self.context.handle_input(InputEvent::KeyDown(key));
                    }
                    ElementState::Released => self.context.handle_input(InputEvent::KeyUp(key)),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                self.cursor = Some([x, y]);
                if !consumed {
                    self.context.handle_input(InputEvent::CursorMoved { x, y });
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = mouse_button_from_winit(button) else {
                    return;
                };
                match state {
                    ElementState::Pressed if !consumed => {
                        let [x, y] = self.cursor.unwrap_or([0.0, 0.0]);
                        self.context
                            .handle_input(InputEvent::MouseDown { button, x, y });
                        if button == MouseButton::Left {
                            self.context.request_pointer_lock();
                            apply_pointer_lock_request(
                                window,
                                &mut self.context,
                                &mut self.pointer_captured,
                            );
                        }
                    }
                    ElementState::Pressed => {}
                    // Releases always reach the controller so a drag cannot get stuck.
                    ElementState::Released => {
                        self.context.handle_input(InputEvent::MouseUp { button })
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !consumed => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32,
                };
                self.context.handle_input(InputEvent::Wheel { delta });
            }
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting...");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let Some(renderer) = self.renderer.as_mut() else {
                    window.request_redraw();
                    return;
                };

                let now = Instant::now();
                let delta_time = now - *last_render_time;
                *last_render_time = now;

                let scale = window.scale_factor() as f32;
                self.context.update_hover(self.cursor, scale);

                if !self.driver.run_frame(&mut self.context, delta_time, now) {
                    return;
                }

                // A scheme switch may have dropped the first-person controller.
                if self.pointer_captured && !self.context.controller.is_pointer_locked() {
                    release_pointer(window);
                    self.pointer_captured = false;
                }

                let gui_input = gui_state.take_egui_input(window);
                gui_state.egui_ctx().begin_pass(gui_input);

                let viewport = self.context.viewport();
                let labels = self
                    .context
                    .world
                    .station_labels(&self.context.camera, viewport)
                    .into_iter()
                    .map(|mut label| {
                        label.position = [label.position[0] / scale, label.position[1] / scale];
                        label
                    })
                    .collect::<Vec<_>>();
                let scheme = self.context.scheme();
                self.context.ui.draw(gui_state.egui_ctx(), scheme, &labels);

                let egui_winit::egui::FullOutput {
                    textures_delta,
                    shapes,
                    pixels_per_point,
                    platform_output,
                    ..
                } = gui_state.egui_ctx().end_pass();

                gui_state.handle_platform_output(window, platform_output);

                let paint_jobs = gui_state.egui_ctx().tessellate(shapes, pixels_per_point);

                let screen_descriptor = {
                    let (width, height) = self.last_size;
                    egui_wgpu::ScreenDescriptor {
                        size_in_pixels: [width, height],
                        pixels_per_point: window.scale_factor() as f32,
                    }
                };

                let frame = SceneFrame {
                    graph: &self.context.world.graph,
                    camera: &self.context.camera,
                    time: self.context.animation_clock,
                    wireframe: self.context.ui.is_wireframe(),
                };
                if let Err(error) =
                    renderer.render_frame(frame, screen_descriptor, paint_jobs, textures_delta)
                {
                    log::error!("{error}; exiting");
                    event_loop.exit();
                    return;
                }

                apply_pointer_lock_request(window, &mut self.context, &mut self.pointer_captured);
            }
            _ => (),
        }

        if !self.driver.is_halted() {
            window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_loss_ends_capture() {
        assert!(ends_pointer_capture(&WindowEvent::Focused(false)));
        assert!(!ends_pointer_capture(&WindowEvent::Focused(true)));
        assert!(!ends_pointer_capture(&WindowEvent::RedrawRequested));
    }

    #[test]
    fn test_cursor_crossing_ends_capture_only_on_the_web() {
        // SAFETY: the id is only compared, never handed to the platform.
        let device_id = unsafe { winit::event::DeviceId::dummy() };
        let left = WindowEvent::CursorLeft { device_id };
        let entered = WindowEvent::CursorEntered { device_id };
        assert_eq!(ends_pointer_capture(&left), cfg!(target_arch = "wasm32"));
        assert_eq!(ends_pointer_capture(&entered), cfg!(target_arch = "wasm32"));
    }
}
