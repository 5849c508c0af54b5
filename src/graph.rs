//! # Scene Graph
//!
//! The CPU-side description of everything the renderer draws. Nodes live in a flat arena
//! and refer to their parent by [`NodeId`], so a group (a car, a station demo) is a node
//! without a mesh whose children inherit its transform and visibility.
//!
//! Meshes and textures are stored once in the graph and shared between nodes by id. A
//! mesh carries a revision counter that bumps whenever it is edited through
//! [`SceneGraph::mesh_mut`], which tells the GPU mirror in `scene.rs` to upload it again.

use nalgebra_glm as glm;

use crate::geometry::MeshData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(usize);

impl MeshId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(usize);

impl TextureId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Converts a `0xRRGGBB` color into RGB components in `[0, 1]`.
pub fn rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Translation, Euler rotation (radians, applied Z then Y then X) and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: glm::Vec3,
    pub rotation: glm::Vec3,
    pub scale: glm::Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: glm::Vec3::zeros(),
            rotation: glm::Vec3::zeros(),
            scale: glm::vec3(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Local-to-parent matrix, `T * Rx * Ry * Rz * S`.
    pub fn matrix(&self) -> glm::Mat4 {
        let mut m = glm::translation(&self.translation);
        m = glm::rotate_x(&m, self.rotation.x);
        m = glm::rotate_y(&m, self.rotation.y);
        m = glm::rotate_z(&m, self.rotation.z);
        glm::scale(&m, &self.scale)
    }
}

/// How a surface turns light into color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shading {
    /// Ambient, directional and point lights with a roughness-driven highlight.
    Lit,
    /// Flat material color, ignores lights.
    Unlit,
    /// Animated procedural pattern used by the shader station.
    RadialSweep,
}

impl Shading {
    pub fn code(self) -> u32 {
        match self {
            Shading::Lit => 0,
            Shading::Unlit => 1,
            Shading::RadialSweep => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub metalness: f32,
    pub roughness: f32,
    /// Below 1.0 the node is drawn after opaque nodes with blending.
    pub opacity: f32,
    pub shading: Shading,
    pub texture: Option<TextureId>,
    /// How many times the texture tiles across the surface.
    pub uv_repeat: [f32; 2],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            emissive: [0.0, 0.0, 0.0],
            emissive_intensity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
            opacity: 1.0,
            shading: Shading::Lit,
            texture: None,
            uv_repeat: [1.0, 1.0],
        }
    }
}

impl Material {
    pub fn standard(color: u32) -> Self {
        Self {
            color: rgb(color),
            ..Self::default()
        }
    }

    pub fn unlit(color: u32) -> Self {
        Self {
            color: rgb(color),
            shading: Shading::Unlit,
            ..Self::default()
        }
    }

    pub fn metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness;
        self
    }

    pub fn roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    pub fn emissive(mut self, color: u32, intensity: f32) -> Self {
        self.emissive = rgb(color);
        self.emissive_intensity = intensity;
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: Option<&'static str>,
    pub parent: Option<NodeId>,
    pub transform: Transform,
    pub mesh: Option<MeshId>,
    pub material: Material,
    pub visible: bool,
}

impl Node {
    /// A mesh-less node used to move several children together.
    pub fn group() -> Self {
        Self {
            name: None,
            parent: None,
            transform: Transform::default(),
            mesh: None,
            material: Material::default(),
            visible: true,
        }
    }

    pub fn mesh(mesh: MeshId, material: Material) -> Self {
        Self {
            mesh: Some(mesh),
            material,
            ..Self::group()
        }
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform.translation = glm::vec3(x, y, z);
        self
    }

    pub fn rotated(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform.rotation = glm::vec3(x, y, z);
        self
    }

    pub fn scaled(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform.scale = glm::vec3(x, y, z);
        self
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// A mesh together with its edit revision.
#[derive(Debug, Clone)]
pub struct StoredMesh {
    pub data: MeshData,
    pub revision: u64,
    pub bounding_radius: f32,
    /// Local-space bounds at creation time.
    pub bounds: (glm::Vec3, glm::Vec3),
}

/// Decoded RGBA8 pixels ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// The light sits at this node's world position and is off while the node is hidden.
    pub node: NodeId,
    pub color: [f32; 3],
    pub intensity: f32,
    /// Distance at which the light has faded out completely.
    pub range: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lights {
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    /// Position the directional light shines from, toward the origin.
    pub sun_position: glm::Vec3,
    pub sun_color: [f32; 3],
    pub sun_intensity: f32,
    pub points: Vec<PointLight>,
}

impl Default for Lights {
    fn default() -> Self {
        Self {
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.0,
            sun_position: glm::vec3(0.0, 1.0, 0.0),
            sun_color: [1.0, 1.0, 1.0],
            sun_intensity: 0.0,
            points: Vec::new(),
        }
    }
}

/// Everything the renderer needs to draw one frame of the world.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    meshes: Vec<StoredMesh>,
    textures: Vec<TextureImage>,
    pub lights: Lights,
    /// Clear color when no skybox is loaded.
    pub background: [f32; 3],
    /// Six cube-map faces in `px, nx, py, ny, pz, nz` order.
    pub skybox: Option<Vec<TextureImage>>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            meshes: Vec::new(),
            textures: Vec::new(),
            lights: Lights::default(),
            background: rgb(0x2c3e50),
            skybox: None,
        }
    }

    pub fn add_mesh(&mut self, data: MeshData) -> MeshId {
        let bounding_radius = data.bounding_radius();
        let bounds = data.bounds();
        self.meshes.push(StoredMesh {
            data,
            revision: 0,
            bounding_radius,
            bounds,
        });
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_texture(&mut self, image: TextureImage) -> TextureId {
        self.textures.push(image);
        TextureId(self.textures.len() - 1)
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        node.parent = Some(parent);
        self.add(node)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name == Some(name))
            .map(NodeId)
    }

    pub fn mesh(&self, id: MeshId) -> &StoredMesh {
        &self.meshes[id.0]
    }

    /// Mutable access to mesh data; marks the mesh for re-upload.
    pub fn mesh_mut(&mut self, id: MeshId) -> &mut MeshData {
        let stored = &mut self.meshes[id.0];
        stored.revision += 1;
        &mut stored.data
    }

    pub fn meshes(&self) -> &[StoredMesh] {
        &self.meshes
    }

    pub fn mesh_entries(&self) -> impl Iterator<Item = (MeshId, &StoredMesh)> {
        self.meshes.iter().enumerate().map(|(i, m)| (MeshId(i), m))
    }

    pub fn textures(&self) -> &[TextureImage] {
        &self.textures
    }

    /// Local-to-world matrix, composed through every ancestor.
    pub fn world_matrix(&self, id: NodeId) -> glm::Mat4 {
        let node = &self.nodes[id.0];
        let local = node.transform.matrix();
        match node.parent {
            Some(parent) => self.world_matrix(parent) * local,
            None => local,
        }
    }

    pub fn world_position(&self, id: NodeId) -> glm::Vec3 {
        let m = self.world_matrix(id);
        glm::vec3(m[(0, 3)], m[(1, 3)], m[(2, 3)])
    }

    /// A node is drawn only when it and all of its ancestors are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let node = &self.nodes[id.0];
        node.visible && node.parent.is_none_or(|parent| self.is_visible(parent))
    }

    /// Shows or hides one node and, through inheritance, its children.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.nodes[id.0].visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_rgb_splits_channels() {
        assert_eq!(rgb(0xff0000), [1.0, 0.0, 0.0]);
        let c = rgb(0x4caf50);
        assert!(approx_eq(c[0], 76.0 / 255.0));
        assert!(approx_eq(c[1], 175.0 / 255.0));
        assert!(approx_eq(c[2], 80.0 / 255.0));
    }

    #[test]
    fn test_child_inherits_parent_translation() {
        let mut graph = SceneGraph::new();
        let parent = graph.add(Node::group().at(10.0, 0.0, -5.0));
        let child = graph.add_child(parent, Node::group().at(1.0, 2.0, 0.0));
        let p = graph.world_position(child);
        assert!(approx_eq(p.x, 11.0));
        assert!(approx_eq(p.y, 2.0));
        assert!(approx_eq(p.z, -5.0));
    }

    #[test]
    fn test_parent_rotation_moves_child() {
        let mut graph = SceneGraph::new();
        let parent = graph.add(Node::group().rotated(0.0, std::f32::consts::FRAC_PI_2, 0.0));
        let child = graph.add_child(parent, Node::group().at(1.0, 0.0, 0.0));
        let p = graph.world_position(child);
        // +X rotated a quarter turn about +Y lands on -Z.
        assert!(approx_eq(p.x, 0.0));
        assert!(approx_eq(p.z, -1.0));
    }

    #[test]
    fn test_hidden_parent_hides_children() {
        let mut graph = SceneGraph::new();
        let parent = graph.add(Node::group().hidden());
        let child = graph.add_child(parent, Node::group());
        assert!(!graph.is_visible(child));
        graph.set_visible(parent, true);
        assert!(graph.is_visible(child));
    }

    #[test]
    fn test_mesh_mut_bumps_revision() {
        let mut graph = SceneGraph::new();
        let mesh = graph.add_mesh(MeshData::plane(1.0, 1.0));
        assert_eq!(graph.mesh(mesh).revision, 0);
        graph.mesh_mut(mesh).vertices[0].position[1] = 3.0;
        assert_eq!(graph.mesh(mesh).revision, 1);
    }

    #[test]
    fn test_find_by_name() {
        let mut graph = SceneGraph::new();
        graph.add(Node::group());
        let cube = graph.add(Node::group().named("cube"));
        assert_eq!(graph.find("cube"), Some(cube));
        assert_eq!(graph.find("car"), None);
    }
}
