//! # Graphics Learning Studio
//!
//! An explorable 3D sandbox for teaching computer-graphics concepts. A visitor walks (or
//! orbits) around a small world holding five learning stations: the rendering pipeline,
//! lighting, texturing, geometry and shaders. Walking within reach of a station lights up
//! its platform, reveals its animated demo, and shows its explanation in the side panel.
//!
//! ## Modules
//!
//! Headless core, usable and testable without a GPU:
//!
//! - [`config`]: tuning values, loaded from JSON on native builds.
//! - [`error`]: the [`StudioError`] type every fallible operation returns.
//! - [`camera`] and [`controls`]: the camera and its orbit and first-person controllers.
//! - [`geometry`] and [`graph`]: mesh builders and the scene graph the world lives in.
//! - [`stations`] and [`proximity`]: station records and the proximity activator.
//! - [`animation`]: the per-frame animated behaviours.
//! - [`world`]: builds the whole world and advances its animations.
//! - [`picking`]: cursor rays and screen projection.
//! - [`ui`]: panel, info message, tooltips and overlays, drawn with `egui`.
//! - [`frame`]: [`StudioContext`] and the [`FrameDriver`] that ticks it.
//! - [`assets`]: optional textures and skybox faces with solid-color fallbacks.
//!
//! GPU and platform layer:
//!
//! - `app`: the `winit` application handler.
//! - `gpu`, `renderer`, `scene`, `skybox`: device set-up and frame encoding with `wgpu`.
//! - `vertex`, `uniform_buffer`, `uniform_binding`: GPU data layouts.
//!
//! ## Constants
//!
//! ### [`SHADER_SOURCE`]
//!
//! The WGSL scene shader: lit, unlit and procedural "radial sweep" shading for every mesh.
//!
//! ### [`SKYBOX_SHADER_SOURCE`]
//!
//! The WGSL fullscreen cube-map shader drawn behind the world.
//!
//! ## Entry Points
//!
//! - Native: [`run`] initializes `env_logger`, loads the configuration and runs the event
//!   loop until the window closes.
//! - WebAssembly: `start` runs on module load, routes `log` to the browser console and
//!   spawns the event loop.

pub mod animation;
mod app;
pub mod assets;
pub mod camera;
pub mod config;
pub mod controls;
pub mod error;
pub mod frame;
pub mod geometry;
mod gpu;
pub mod graph;
pub mod picking;
pub mod proximity;
mod renderer;
pub mod scene;
mod skybox;
pub mod stations;
pub mod ui;
mod uniform_binding;
pub mod uniform_buffer;
pub mod vertex;
pub mod world;

pub use crate::app::App;
pub use crate::config::StudioConfig;
pub use crate::error::StudioError;
pub use crate::frame::{FrameDriver, StudioContext};
pub use crate::gpu::Gpu;
pub use crate::renderer::{Renderer, SceneFrame};
pub use crate::world::{World, WorldTextures};

pub const SHADER_SOURCE: &str = include_str!("shader_source.wgsl");

pub const SKYBOX_SHADER_SOURCE: &str = include_str!("skybox.wgsl");

/// Runs the studio in a native window until it is closed.
#[cfg(not(target_arch = "wasm32"))]
pub fn run() -> Result<(), StudioError> {
    env_logger::init();
    let config = StudioConfig::load();
    let event_loop = winit::event_loop::EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}

/// Browser entry point.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    use winit::platform::web::EventLoopExtWebSys;

    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger was already initialized".into());
    }

    match winit::event_loop::EventLoop::new() {
        Ok(event_loop) => event_loop.spawn_app(App::new(StudioConfig::load())),
        Err(error) => log::error!("{}", StudioError::from(error)),
    }
}
