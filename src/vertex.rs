//! # Vertex Module
//!
//! This module provides the `Vertex` struct shared by every mesh in the studio, from the
//! terrain plane down to a single particle. Vertices carry a position, a normal for
//! lighting, texture coordinates for the textured materials, and a per-vertex color that
//! is multiplied into the material color (white for ordinary meshes, random for particles).
//!
//! ## Methods
//!
//! - [`Vertex::vertex_attributes`]: Returns the attribute layout the scene shader expects.
//! - [`Vertex::description`]: Returns the buffer layout used during pipeline creation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let attributes = Vertex::vertex_attributes();
//! let layout = Vertex::description(&attributes);
//! ```

/// A single vertex of a studio mesh.
///
/// # Memory Layout
///
/// The struct is `#[repr(C)]` and derives `bytemuck::Pod`, so a `Vec<Vertex>` can be cast
/// straight into the bytes of a vertex buffer. The field order matches the shader
/// locations:
///
/// | location | field      | format      |
/// |----------|------------|-------------|
/// | 0        | `position` | `Float32x3` |
/// | 1        | `normal`   | `Float32x3` |
/// | 2        | `uv`       | `Float32x2` |
/// | 3        | `color`    | `Float32x4` |
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],

    /// Object-space unit normal.
    pub normal: [f32; 3],

    /// Texture coordinates, `(0, 0)` at the top-left of the image.
    pub uv: [f32; 2],

    /// Linear RGBA tint multiplied into the material color.
    pub color: [f32; 4],
}

impl Vertex {
    /// A white vertex with the given position, normal and texture coordinates.
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }

    /// Generates the vertex attributes layout for the `Vertex` struct.
    ///
    /// The locations are consumed by `vertex_main` in the scene shader.
    pub fn vertex_attributes() -> Vec<wgpu::VertexAttribute> {
        wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x2,
            3 => Float32x4
        ]
        .to_vec()
    }

    /// Returns the vertex buffer layout for the `Vertex` struct.
    ///
    /// # Parameters
    ///
    /// - `attributes`: The attribute list from [`Vertex::vertex_attributes`]. It is borrowed
    ///   because the returned layout must not outlive it.
    pub fn description(attributes: &[wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_matches_attribute_formats() {
        let attributes = Vertex::vertex_attributes();
        let layout = Vertex::description(&attributes);
        assert_eq!(layout.array_stride, (3 + 3 + 2 + 4) * 4);
        assert_eq!(attributes.len(), 4);
        assert_eq!(attributes[3].offset, (3 + 3 + 2) * 4);
    }
}
