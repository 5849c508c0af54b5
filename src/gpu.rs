//! Device, queue and window surface for the studio.
//!
//! [`Gpu::new_async`] reports every set-up failure as a [`StudioError`]; the host logs it
//! and gives up on rendering. Surface sizes are clamped to at least one pixel, because a
//! minimized window reports zero.

use wgpu::InstanceDescriptor;

use crate::error::StudioError;
use crate::renderer::Renderer;

/// The GPU resources shared by every part of the renderer.
pub struct Gpu {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface_config: wgpu::SurfaceConfiguration,
    /// Non-sRGB when the surface offers one, since `egui` writes gamma-space colors.
    pub surface_format: wgpu::TextureFormat,
}

impl Gpu {
    /// Reconfigures the surface for a new size in physical pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface_config.width = width.max(1);
        self.surface_config.height = height.max(1);
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Depth buffer for the scene pass, sized to match the surface.
    pub fn create_depth_texture(&self, width: u32, height: u32) -> wgpu::TextureView {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Studio Depth Buffer"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Renderer::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Creates the surface for `window`, picks an adapter and requests a device.
    ///
    /// # Errors
    ///
    /// - [`StudioError::Surface`] when the window cannot host a surface.
    /// - [`StudioError::NoAdapter`] when no adapter can present to it.
    /// - [`StudioError::Device`] when the adapter refuses the device request.
    /// - [`StudioError::NoSurfaceFormat`] when the surface offers nothing to render into.
    pub async fn new_async(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, StudioError> {
        let instance = wgpu::Instance::new(&InstanceDescriptor::default());
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(StudioError::NoAdapter)?;
        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Studio Device"),
                    memory_hints: wgpu::MemoryHints::default(),
                    required_features: wgpu::Features::default(),
                    required_limits: required_limits(&adapter),
                },
                None,
            )
            .await?;

        let capabilities = surface.get_capabilities(&adapter);
        let surface_config = surface_configuration(&capabilities, width, height)?;
        surface.configure(&device, &surface_config);

        Ok(Self {
            surface,
            device,
            queue,
            surface_format: surface_config.format,
            surface_config,
        })
    }
}

#[cfg(not(all(target_arch = "wasm32", feature = "webgl")))]
fn required_limits(adapter: &wgpu::Adapter) -> wgpu::Limits {
    wgpu::Limits::default().using_resolution(adapter.limits())
}

#[cfg(all(target_arch = "wasm32", feature = "webgl"))]
fn required_limits(adapter: &wgpu::Adapter) -> wgpu::Limits {
    wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits())
}

/// Chooses format, present mode and alpha mode from what the surface supports.
fn surface_configuration(
    capabilities: &wgpu::SurfaceCapabilities,
    width: u32,
    height: u32,
) -> Result<wgpu::SurfaceConfiguration, StudioError> {
    let format = capabilities
        .formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| capabilities.formats.first().copied())
        .ok_or(StudioError::NoSurfaceFormat)?;

    Ok(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: width.max(1),
        height: height.max(1),
        present_mode: capabilities
            .present_modes
            .first()
            .copied()
            .unwrap_or(wgpu::PresentMode::Fifo),
        alpha_mode: capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    })
}
