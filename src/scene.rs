//! # Scene Module
//!
//! The `Scene` struct is the GPU mirror of a [`SceneGraph`]. It owns every buffer, texture
//! and pipeline needed to draw the studio world, and brings them up to date with the graph
//! once per frame in [`Scene::prepare`] before [`Scene::render`] records the draw calls.
//!
//! ## Synchronization
//!
//! - **Meshes** are uploaded the first time they are seen and again whenever their revision
//!   changes (the particle cloud is edited every frame).
//! - **Textures** never change after the world is built. They are uploaded as they appear.
//!   Untextured nodes bind a 1x1 white texture so that every draw uses the same layout.
//! - **Nodes** get one object uniform each, rewritten every frame with their world matrix and
//!   material.
//!
//! ## Draw Order
//!
//! [`plan_draws`] turns the graph into an ordered list of [`DrawItem`]s: opaque surfaces
//! first in graph order, then transparent surfaces and point clouds from far to near. Hidden
//! nodes and nodes under a hidden ancestor are skipped. With wireframe enabled, every
//! triangle mesh is drawn as its edge list instead.

use std::collections::HashMap;

use nalgebra_glm as glm;

use crate::camera::Camera;
use crate::geometry::Topology;
use crate::graph::{MeshId, NodeId, SceneGraph, TextureImage};
use crate::renderer::Renderer;
use crate::skybox::Skybox;
use crate::uniform_binding::UniformBinding;
use crate::uniform_buffer::{FrameUniform, ObjectUniform};
use crate::vertex::Vertex;
use crate::SHADER_SOURCE;

/// Which pipeline a node is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawPass {
    Opaque,
    Transparent,
    Wireframe,
    Points,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub node: NodeId,
    pub mesh: MeshId,
    pub pass: DrawPass,
}

/// Orders the visible mesh nodes of `graph` for drawing from `eye`.
pub fn plan_draws(graph: &SceneGraph, eye: &glm::Vec3, wireframe: bool) -> Vec<DrawItem> {
    let mut opaque = Vec::new();
    let mut blended = Vec::new();

    for (node_id, node) in graph.nodes() {
        let Some(mesh) = node.mesh else { continue };
        if !graph.is_visible(node_id) || graph.mesh(mesh).data.indices.is_empty() {
            continue;
        }
        let points = graph.mesh(mesh).data.topology == Topology::Points;
        let pass = match (points, wireframe, node.material.is_transparent()) {
            (true, _, _) => DrawPass::Points,
            (false, true, _) => DrawPass::Wireframe,
            (false, false, true) => DrawPass::Transparent,
            (false, false, false) => DrawPass::Opaque,
        };
        let item = DrawItem {
            node: node_id,
            mesh,
            pass,
        };
        match pass {
            DrawPass::Opaque | DrawPass::Wireframe => opaque.push(item),
            DrawPass::Transparent | DrawPass::Points => {
                let distance = glm::distance2(&graph.world_position(node_id), eye);
                blended.push((distance, item));
            }
        }
    }

    blended.sort_by(|a, b| b.0.total_cmp(&a.0));
    opaque.extend(blended.into_iter().map(|(_, item)| item));
    opaque
}

/// Vertex data of one mesh on the GPU.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    edge_buffer: wgpu::Buffer,
    edge_count: u32,
    revision: u64,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, mesh: &crate::graph::StoredMesh) -> Self {
        let edges = mesh.data.edge_indices();
        let buffer = |label: &str, contents: &[u8], usage: wgpu::BufferUsages| {
            wgpu::util::DeviceExt::create_buffer_init(
                device,
                &wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents,
                    usage,
                },
            )
        };
        Self {
            vertex_buffer: buffer(
                "Vertex Buffer",
                bytemuck::cast_slice(&mesh.data.vertices),
                wgpu::BufferUsages::VERTEX,
            ),
            index_buffer: buffer(
                "Index Buffer",
                bytemuck::cast_slice(&mesh.data.indices),
                wgpu::BufferUsages::INDEX,
            ),
            index_count: mesh.data.indices.len() as u32,
            edge_buffer: buffer(
                "Edge Buffer",
                bytemuck::cast_slice(&edges),
                wgpu::BufferUsages::INDEX,
            ),
            edge_count: edges.len() as u32,
            revision: mesh.revision,
        }
    }
}

struct Pipelines {
    opaque: wgpu::RenderPipeline,
    transparent: wgpu::RenderPipeline,
    wireframe: wgpu::RenderPipeline,
    points: wgpu::RenderPipeline,
}

impl Pipelines {
    fn get(&self, pass: DrawPass) -> &wgpu::RenderPipeline {
        match pass {
            DrawPass::Opaque => &self.opaque,
            DrawPass::Transparent => &self.transparent,
            DrawPass::Wireframe => &self.wireframe,
            DrawPass::Points => &self.points,
        }
    }
}

pub struct Scene {
    frame: UniformBinding<FrameUniform>,
    object_layout: wgpu::BindGroupLayout,
    objects: Vec<UniformBinding<ObjectUniform>>,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white_texture: wgpu::BindGroup,
    textures: Vec<wgpu::BindGroup>,
    meshes: HashMap<MeshId, GpuMesh>,
    pipelines: Pipelines,
    skybox: Option<Skybox>,
    draws: Vec<DrawItem>,
}

impl Scene {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        graph: &SceneGraph,
    ) -> Self {
        let frame_layout = UniformBinding::<FrameUniform>::layout(device, "frame_bind_group_layout");
        let frame = UniformBinding::new(device, &frame_layout, &FrameUniform::default());
        let object_layout =
            UniformBinding::<ObjectUniform>::layout(device, "object_bind_group_layout");

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        // Repeat addressing lets the ground texture tile across the terrain.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Texture Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let white = TextureImage {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        };
        let white_texture =
            Self::create_texture_bind_group(device, queue, &texture_layout, &sampler, &white);

        let pipelines = Self::create_pipelines(
            device,
            surface_format,
            &[&frame_layout, &object_layout, &texture_layout],
        );

        let skybox = graph
            .skybox
            .as_deref()
            .map(|faces| Skybox::new(device, queue, surface_format, faces));

        let mut scene = Self {
            frame,
            object_layout,
            objects: Vec::new(),
            texture_layout,
            sampler,
            white_texture,
            textures: Vec::new(),
            meshes: HashMap::new(),
            pipelines,
            skybox,
            draws: Vec::new(),
        };
        scene.sync_resources(device, queue, graph);
        scene
    }

    pub fn has_skybox(&self) -> bool {
        self.skybox.is_some()
    }

    /// Brings GPU resources up to date with `graph` and writes this frame's uniforms.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        graph: &SceneGraph,
        camera: &Camera,
        time: f32,
        wireframe: bool,
    ) {
        self.sync_resources(device, queue, graph);

        self.frame
            .update_buffer(queue, &FrameUniform::new(camera, graph, time));
        if let Some(skybox) = &self.skybox {
            skybox.update(queue, camera);
        }

        self.draws = plan_draws(graph, &camera.position, wireframe);
        for draw in &self.draws {
            let node = graph.node(draw.node);
            let uniform = ObjectUniform::new(&graph.world_matrix(draw.node), &node.material);
            self.objects[draw.node.index()].update_buffer(queue, &uniform);
        }
    }

    /// Records the skybox and every planned draw into `render_pass`.
    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>, graph: &SceneGraph) {
        if let Some(skybox) = &self.skybox {
            skybox.render(render_pass);
        }

        render_pass.set_bind_group(0, &self.frame.bind_group, &[]);
        for draw in &self.draws {
            let Some(mesh) = self.meshes.get(&draw.mesh) else {
                continue;
            };
            let texture = graph
                .node(draw.node)
                .material
                .texture
                .and_then(|id| self.textures.get(id.index()))
                .unwrap_or(&self.white_texture);

            render_pass.set_pipeline(self.pipelines.get(draw.pass));
            render_pass.set_bind_group(1, &self.objects[draw.node.index()].bind_group, &[]);
            render_pass.set_bind_group(2, texture, &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            let (indices, count) = match draw.pass {
                DrawPass::Wireframe => (&mesh.edge_buffer, mesh.edge_count),
                _ => (&mesh.index_buffer, mesh.index_count),
            };
            if count == 0 {
                continue;
            }
            render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..count, 0, 0..1);
        }
    }

    fn sync_resources(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, graph: &SceneGraph) {
        for (id, stored) in graph.mesh_entries() {
            if stored.data.indices.is_empty() {
                continue;
            }
            let stale = self
                .meshes
                .get(&id)
                .is_none_or(|gpu| gpu.revision != stored.revision);
            if stale {
                self.meshes.insert(id, GpuMesh::upload(device, stored));
            }
        }

        for image in graph.textures().iter().skip(self.textures.len()) {
            let bind_group = Self::create_texture_bind_group(
                device,
                queue,
                &self.texture_layout,
                &self.sampler,
                image,
            );
            self.textures.push(bind_group);
        }

        while self.objects.len() < graph.node_count() {
            self.objects.push(UniformBinding::new(
                device,
                &self.object_layout,
                &ObjectUniform::default(),
            ));
        }
    }

    fn create_texture_bind_group(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        image: &TextureImage,
    ) -> wgpu::BindGroup {
        let size = wgpu::Extent3d {
            width: image.width.max(1),
            height: image.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Material Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.width),
                rows_per_image: Some(size.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texture_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn create_pipelines(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
    ) -> Pipelines {
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Borrowed(SHADER_SOURCE)),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts,
            push_constant_ranges: &[],
        });

        let create = |label: &str, topology: wgpu::PrimitiveTopology, blended: bool| {
            Self::create_pipeline(
                device,
                &pipeline_layout,
                &shader_module,
                surface_format,
                label,
                topology,
                blended,
            )
        };

        Pipelines {
            opaque: create("Opaque Pipeline", wgpu::PrimitiveTopology::TriangleList, false),
            transparent: create(
                "Transparent Pipeline",
                wgpu::PrimitiveTopology::TriangleList,
                true,
            ),
            wireframe: create("Wireframe Pipeline", wgpu::PrimitiveTopology::LineList, false),
            points: create("Points Pipeline", wgpu::PrimitiveTopology::PointList, true),
        }
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader_module: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
        label: &str,
        topology: wgpu::PrimitiveTopology,
        blended: bool,
    ) -> wgpu::RenderPipeline {
        let attributes = Vertex::vertex_attributes();
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader_module,
                entry_point: Some("vertex_main"),
                buffers: &[Vertex::description(&attributes)],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None, // Planes are seen from both sides; the shader flips back-face normals.
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
                unclipped_depth: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: Renderer::DEPTH_FORMAT,
                depth_write_enabled: !blended, // Blended surfaces test against depth but leave it untouched.
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: shader_module,
                entry_point: Some("fragment_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: blended.then_some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MeshData;
    use crate::graph::{Material, Node};

    fn graph() -> (SceneGraph, [NodeId; 4]) {
        let mut graph = SceneGraph::new();
        let cube = graph.add_mesh(MeshData::cuboid(1.0, 1.0, 1.0));
        let cloud = graph.add_mesh(MeshData::points(&[[0.0; 3]], &[[1.0; 3]]));
        let solid = graph.add(Node::mesh(cube, Material::standard(0xff0000)));
        let near_glass = graph.add(
            Node::mesh(cube, Material::standard(0x00ff00).opacity(0.5)).at(0.0, 0.0, 3.0),
        );
        let far_glass = graph.add(
            Node::mesh(cube, Material::standard(0x0000ff).opacity(0.5)).at(0.0, 0.0, -3.0),
        );
        let points = graph.add(Node::mesh(cloud, Material::unlit(0xffffff)).at(0.0, 0.0, -20.0));
        (graph, [solid, near_glass, far_glass, points])
    }

    #[test]
    fn test_opaque_first_then_blended_far_to_near() {
        let (graph, [solid, near_glass, far_glass, points]) = graph();
        let eye = glm::vec3(0.0, 0.0, 10.0);
        let order: Vec<_> = plan_draws(&graph, &eye, false)
            .into_iter()
            .map(|d| (d.node, d.pass))
            .collect();
        assert_eq!(
            order,
            vec![
                (solid, DrawPass::Opaque),
                (points, DrawPass::Points),
                (far_glass, DrawPass::Transparent),
                (near_glass, DrawPass::Transparent),
            ]
        );
    }

    #[test]
    fn test_wireframe_replaces_triangle_passes_only() {
        let (graph, [_, _, _, points]) = graph();
        let draws = plan_draws(&graph, &glm::Vec3::zeros(), true);
        for draw in draws {
            if draw.node == points {
                assert_eq!(draw.pass, DrawPass::Points);
            } else {
                assert_eq!(draw.pass, DrawPass::Wireframe);
            }
        }
    }

    #[test]
    fn test_hidden_subtrees_are_not_drawn() {
        let mut graph = SceneGraph::new();
        let cube = graph.add_mesh(MeshData::cuboid(1.0, 1.0, 1.0));
        let group = graph.add(Node::group().hidden());
        graph.add_child(group, Node::mesh(cube, Material::default()));
        let shown = graph.add(Node::mesh(cube, Material::default()));

        let draws = plan_draws(&graph, &glm::Vec3::zeros(), false);
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].node, shown);

        graph.set_visible(group, true);
        assert_eq!(plan_draws(&graph, &glm::Vec3::zeros(), false).len(), 2);
    }
}
