//! # `renderer.rs` - Renderer Module
//!
//! The `renderer.rs` module contains the `Renderer` struct, which draws one frame of the
//! studio: the sky, the world held in a [`SceneGraph`], and the `egui` overlay on top.
//!
//! ## Key Features
//!
//! - **GPU Management**: The `Renderer` owns the [`Gpu`] wrapper (device, queue, surface).
//!
//! - **Depth Buffering**: A `Depth32Float` depth texture sized to the surface keeps the
//!   terrain, stations and trees correctly occluded.
//!
//! - **Scene Integration**: The [`Scene`] mirrors the graph on the GPU. The renderer hands it
//!   the graph, camera, animation time and wireframe flag every frame.
//!
//! - **GUI Rendering**: An `egui_wgpu::Renderer` draws the side panel, info message, labels
//!   and overlays in the same render pass, after the world.
//!
//! ## Surface Loss
//!
//! A lost or outdated surface is reconfigured and the frame is skipped. A timeout skips the
//! frame as well. Only an out-of-memory error is returned to the caller.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut renderer = Renderer::new(window, width, height, &world.graph).await?;
//!
//! renderer.render_frame(
//!     SceneFrame { graph: &world.graph, camera: &camera, time, wireframe },
//!     screen_descriptor,
//!     paint_jobs,
//!     textures_delta,
//! )?;
//! ```

use crate::camera::Camera;
use crate::error::StudioError;
use crate::gpu::Gpu;
use crate::graph::SceneGraph;
use crate::scene::Scene;

/// What the world looks like this frame.
///
/// # Fields
///
/// - `graph`: The scene graph to draw.
/// - `camera`: The viewpoint.
/// - `time`: Animation clock in seconds, fed to the procedural shader.
/// - `wireframe`: Draws every triangle mesh as edges when set.
#[derive(Clone, Copy)]
pub struct SceneFrame<'a> {
    pub graph: &'a SceneGraph,
    pub camera: &'a Camera,
    pub time: f32,
    pub wireframe: bool,
}

/// Renders the studio world and its GUI into the window surface.
///
/// # Fields
///
/// - `gpu`: Device, queue and surface configuration.
/// - `depth_texture_view`: Depth buffer matching the surface size.
/// - `egui_renderer`: Turns `egui` paint jobs into draw calls.
/// - `scene`: GPU mirror of the scene graph.
pub struct Renderer {
    gpu: Gpu,

    /// Recreated on every resize so it always matches the surface.
    depth_texture_view: wgpu::TextureView,

    egui_renderer: egui_wgpu::Renderer,

    scene: Scene,
}

impl Renderer {
    /// The texture format used for the depth buffer in 3D rendering.
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates the GPU context, depth buffer, `egui` renderer and scene mirror.
    ///
    /// # Parameters
    ///
    /// - `window`: The window or canvas to render into.
    /// - `width`, `height`: Initial surface size in physical pixels.
    /// - `graph`: The world to mirror. Its textures and skybox are uploaded right away.
    ///
    /// # Errors
    ///
    /// Fails when no surface, adapter or device can be obtained.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        graph: &SceneGraph,
    ) -> Result<Self, StudioError> {
        let gpu = Gpu::new_async(window, width, height).await?;

        let depth_texture_view = gpu.create_depth_texture(width, height);

        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.surface_config.format,
            Some(Self::DEPTH_FORMAT),
            1,
            false,
        );

        let scene = Scene::new(&gpu.device, &gpu.queue, gpu.surface_format, graph);

        Ok(Self {
            gpu,
            depth_texture_view,
            egui_renderer,
            scene,
        })
    }

    /// Resizes the surface and the depth buffer. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        self.depth_texture_view = self.gpu.create_depth_texture(width, height);
    }

    /// Renders a single frame: sky, world, then the `egui` overlay.
    ///
    /// # Parameters
    ///
    /// - `frame`: The world state to draw.
    /// - `screen_descriptor`: Surface size and scale for `egui`.
    /// - `paint_jobs`: Tessellated `egui` output.
    /// - `textures_delta`: `egui` textures to upload or free.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::SurfaceTexture`] when the GPU is out of memory. Other surface
    /// errors skip the frame.
    pub fn render_frame(
        &mut self,
        frame: SceneFrame<'_>,
        screen_descriptor: egui_wgpu::ScreenDescriptor,
        paint_jobs: Vec<egui::epaint::ClippedPrimitive>,
        textures_delta: egui::TexturesDelta,
    ) -> Result<(), StudioError> {
        self.scene.prepare(
            &self.gpu.device,
            &self.gpu.queue,
            frame.graph,
            frame.camera,
            frame.time,
            frame.wireframe,
        );

        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(&self.gpu.device, &self.gpu.queue, *id, image_delta);
        }

        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        let surface_texture = match self.gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated; reconfiguring");
                let (width, height) = (self.gpu.surface_config.width, self.gpu.surface_config.height);
                self.gpu.resize(width, height);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out waiting for the surface texture; skipping frame");
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.egui_renderer.update_buffers(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        let surface_texture_view =
            surface_texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor {
                    format: Some(self.gpu.surface_format),
                    ..Default::default()
                });

        let [r, g, b] = frame.graph.background;

        encoder.insert_debug_marker("Render scene");

        // This scope around the render pass prevents it from holding a borrow to the
        // encoder, which would prevent calling `.finish()` before submission.
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.scene.render(&mut render_pass, frame.graph);

            self.egui_renderer.render(
                &mut render_pass.forget_lifetime(),
                &paint_jobs,
                &screen_descriptor,
            );
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }
}
