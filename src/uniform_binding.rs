//! # Uniform Binding Module
//!
//! This module defines the `UniformBinding` struct, which pairs a GPU uniform buffer with the
//! bind group that exposes it to the scene shader.
//!
//! ## Overview
//!
//! The `UniformBinding` struct encapsulates:
//!
//! - **Uniform buffer**: A buffer holding one value of a `bytemuck::Pod` type, such as
//!   [`FrameUniform`](crate::uniform_buffer::FrameUniform) or
//!   [`ObjectUniform`](crate::uniform_buffer::ObjectUniform).
//! - **Bind group**: Makes the buffer visible at binding 0 of its group.
//!
//! The bind group layout is created separately through [`UniformBinding::layout`], because many
//! bindings share one layout: the scene keeps one `UniformBinding<ObjectUniform>` per drawn
//! node, all bound at the same group index of the same pipeline.
//!
//! ## Example
//!
//! ```rust,ignore
//! let layout = UniformBinding::<FrameUniform>::layout(&device, "frame");
//! let mut frame = UniformBinding::new(&device, &layout, &FrameUniform::default());
//!
//! frame.update_buffer(&queue, &FrameUniform::new(&camera, &graph, time));
//! render_pass.set_bind_group(0, &frame.bind_group, &[]);
//! ```

use std::marker::PhantomData;

/// A uniform buffer holding one `T` together with its bind group.
///
/// # Fields
///
/// - `buffer`: The GPU buffer, sized for exactly one `T` and writable with `COPY_DST`.
/// - `bind_group`: Binds `buffer` at binding 0 using the layout passed to [`UniformBinding::new`].
pub struct UniformBinding<T> {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    _value: PhantomData<T>,
}

impl<T: bytemuck::Pod> UniformBinding<T> {
    /// Creates the layout shared by every binding of this value type.
    ///
    /// The buffer is visible to both the vertex and fragment stages.
    pub fn layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
                },
                count: None,
            }],
            label: Some(label),
        })
    }

    /// Allocates the buffer with `initial` as its contents and binds it with `layout`.
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, initial: &T) -> Self {
        let buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Uniform Buffer"),
                contents: bytemuck::bytes_of(initial),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        Self {
            buffer,
            bind_group,
            _value: PhantomData,
        }
    }

    /// Queues a write of `value` into the buffer. It takes effect at the next submit.
    pub fn update_buffer(&mut self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value))
    }
}
