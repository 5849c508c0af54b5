//! # Uniform Buffers
//!
//! This module defines the plain-old-data structs that carry per-frame and per-object state
//! from the CPU to the scene shader. Both are uploaded verbatim with `bytemuck`, so their
//! field order and padding mirror the `FrameUniforms` and `ObjectUniforms` declarations in
//! `shader_source.wgsl`.
//!
//! ## Overview
//!
//! - [`FrameUniform`]: camera, ambient light, the directional "sun" and up to
//!   [`MAX_POINT_LIGHTS`] point lights. Written once per frame.
//! - [`ObjectUniform`]: model matrix and material of one node. Written once per drawn node.
//!
//! ### Memory Layout and Traits
//!
//! Every field is a 16-byte multiple (`vec4`/`mat4x4` in WGSL), which satisfies the uniform
//! address space alignment rules without hidden padding:
//!
//! - `#[repr(C)]` keeps the declared order.
//! - `bytemuck::Pod` and `bytemuck::Zeroable` allow a safe cast to bytes.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let frame = FrameUniform::new(&camera, &graph, time);
//! queue.write_buffer(&buffer, 0, bytemuck::bytes_of(&frame));
//! ```

use nalgebra_glm as glm;

use crate::camera::Camera;
use crate::graph::{Material, SceneGraph};

/// Point lights beyond this many are ignored by the shader.
pub const MAX_POINT_LIGHTS: usize = 4;

/// Scene-wide state for one frame.
///
/// # Fields
///
/// - `view_proj`: Combined view and projection matrix of the active camera.
/// - `camera_position`: World-space eye position in `xyz`; `w` carries the animation time in
///   seconds, which drives the procedural shader.
/// - `ambient`: Ambient color already multiplied by its intensity.
/// - `sun_direction`: Unit vector from the surface toward the directional light.
/// - `sun_color`: Directional light color multiplied by its intensity.
/// - `point_positions`: World position in `xyz`, fade-out range in `w`.
/// - `point_colors`: Light color multiplied by its intensity.
/// - `counts`: `x` holds the number of active point lights.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub ambient: [f32; 4],
    pub sun_direction: [f32; 4],
    pub sun_color: [f32; 4],
    pub point_positions: [[f32; 4]; MAX_POINT_LIGHTS],
    pub point_colors: [[f32; 4]; MAX_POINT_LIGHTS],
    pub counts: [u32; 4],
}

impl Default for FrameUniform {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

fn scaled(color: [f32; 3], intensity: f32) -> [f32; 4] {
    [
        color[0] * intensity,
        color[1] * intensity,
        color[2] * intensity,
        1.0,
    ]
}

impl FrameUniform {
    /// Collects the camera and lighting state of `graph`.
    ///
    /// Point lights attached to hidden nodes are skipped, so hiding a station demo also turns
    /// its lamp off.
    pub fn new(camera: &Camera, graph: &SceneGraph, time: f32) -> Self {
        let lights = &graph.lights;
        let sun = glm::normalize(&lights.sun_position);

        let mut uniform = Self {
            view_proj: camera.view_projection().into(),
            camera_position: [camera.position.x, camera.position.y, camera.position.z, time],
            ambient: scaled(lights.ambient_color, lights.ambient_intensity),
            sun_direction: [sun.x, sun.y, sun.z, 0.0],
            sun_color: scaled(lights.sun_color, lights.sun_intensity),
            ..Self::default()
        };

        let active = lights
            .points
            .iter()
            .filter(|light| graph.is_visible(light.node))
            .take(MAX_POINT_LIGHTS);
        let mut count = 0;
        for (slot, light) in active.enumerate() {
            let p = graph.world_position(light.node);
            uniform.point_positions[slot] = [p.x, p.y, p.z, light.range];
            uniform.point_colors[slot] = scaled(light.color, light.intensity);
            count += 1;
        }
        uniform.counts[0] = count;
        uniform
    }

    pub fn point_light_count(&self) -> usize {
        self.counts[0] as usize
    }
}

/// Per-node model matrix and material.
///
/// # Fields
///
/// - `model`: Local-to-world matrix of the node.
/// - `color`: Base color in `rgb`, opacity in `a`.
/// - `emissive`: Emissive color multiplied by its intensity.
/// - `surface`: `x` metalness, `y` roughness, `zw` texture repeat.
/// - `flags`: `x` shading model code, `y` 1 when a texture is bound.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub emissive: [f32; 4],
    pub surface: [f32; 4],
    pub flags: [u32; 4],
}

impl Default for ObjectUniform {
    fn default() -> Self {
        Self::new(&glm::Mat4::identity(), &Material::default())
    }
}

impl ObjectUniform {
    pub fn new(model: &glm::Mat4, material: &Material) -> Self {
        let [r, g, b] = material.color;
        Self {
            model: (*model).into(),
            color: [r, g, b, material.opacity],
            emissive: scaled(material.emissive, material.emissive_intensity),
            surface: [
                material.metalness,
                material.roughness,
                material.uv_repeat[0],
                material.uv_repeat[1],
            ],
            flags: [
                material.shading.code(),
                u32::from(material.texture.is_some()),
                0,
                0,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraSettings;
    use crate::graph::{Node, PointLight, Shading};

    #[test]
    fn test_sizes_are_uniform_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 64 + 16 * 4);
    }

    #[test]
    fn test_hidden_point_lights_are_skipped() {
        let mut graph = SceneGraph::new();
        let lamp = graph.add(Node::group().at(1.0, 2.0, 3.0));
        let hidden = graph.add(Node::group().hidden());
        for node in [hidden, lamp] {
            graph.lights.points.push(PointLight {
                node,
                color: [1.0, 0.5, 0.0],
                intensity: 2.0,
                range: 10.0,
            });
        }
        let camera = Camera::new(&CameraSettings::default());
        let frame = FrameUniform::new(&camera, &graph, 1.5);

        assert_eq!(frame.point_light_count(), 1);
        assert_eq!(frame.point_positions[0], [1.0, 2.0, 3.0, 10.0]);
        assert_eq!(frame.point_colors[0], [2.0, 1.0, 0.0, 1.0]);
        assert_eq!(frame.camera_position[3], 1.5);
    }

    #[test]
    fn test_point_lights_are_capped() {
        let mut graph = SceneGraph::new();
        for i in 0..(MAX_POINT_LIGHTS + 2) {
            let node = graph.add(Node::group().at(i as f32, 0.0, 0.0));
            graph.lights.points.push(PointLight {
                node,
                color: [1.0, 1.0, 1.0],
                intensity: 1.0,
                range: 5.0,
            });
        }
        let camera = Camera::new(&CameraSettings::default());
        let frame = FrameUniform::new(&camera, &graph, 0.0);
        assert_eq!(frame.point_light_count(), MAX_POINT_LIGHTS);
    }

    #[test]
    fn test_object_uniform_packs_material() {
        let mut material = Material::standard(0xff0000)
            .opacity(0.5)
            .emissive(0x00ff00, 0.5)
            .shading(Shading::RadialSweep);
        material.uv_repeat = [10.0, 10.0];
        let object = ObjectUniform::new(&glm::Mat4::identity(), &material);

        assert_eq!(object.color, [1.0, 0.0, 0.0, 0.5]);
        assert_eq!(object.emissive, [0.0, 0.5, 0.0, 1.0]);
        assert_eq!(object.surface[2..], [10.0, 10.0]);
        assert_eq!(object.flags[0], Shading::RadialSweep.code());
        assert_eq!(object.flags[1], 0);
        assert_eq!(object.model[3][3], 1.0);
    }
}
