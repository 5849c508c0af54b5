//! # Animation
//!
//! Everything that moves on its own implements [`Animatable`]. The world keeps its
//! animatables in one ordered list and calls [`Animatable::update`] on each, in insertion
//! order, with the animation clock in seconds.
//!
//! Most behaviours are pure functions of time and write absolute transforms. The particle
//! cloud is the exception: it nudges its vertices a little every call, the way a bobbing
//! cloud drifts.

use nalgebra_glm as glm;

use crate::graph::{MeshId, NodeId, SceneGraph};

/// Something in the world that changes with the animation clock.
pub trait Animatable {
    fn update(&mut self, time: f32, graph: &mut SceneGraph);
}

// ============================================================================
// SIMPLE RNG (xorshift32)
// ============================================================================

/// Deterministic xorshift32 generator used to scatter decorations.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// A zero seed is bumped to 1, xorshift32 needs a non-zero state.
    pub fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform in `[0.0, 1.0]`.
    pub fn next_f32(&mut self) -> f32 {
        self.next_u32() as f32 / u32::MAX as f32
    }

    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }
}

// ============================================================================
// BEHAVIOURS
// ============================================================================

/// Constant angular velocity around each axis, in radians per second.
#[derive(Debug, Clone)]
pub struct Spin {
    pub node: NodeId,
    pub rates: glm::Vec3,
}

impl Animatable for Spin {
    fn update(&mut self, time: f32, graph: &mut SceneGraph) {
        graph.node_mut(self.node).transform.rotation = self.rates * time;
    }
}

/// Moves a node (usually one carrying a point light) around a horizontal circle.
///
/// Position is `(sin(ωt) · r, height, cos(ωt) · r)` in the parent's space.
#[derive(Debug, Clone)]
pub struct Circle {
    pub node: NodeId,
    pub radius: f32,
    pub height: f32,
    pub angular_speed: f32,
}

impl Animatable for Circle {
    fn update(&mut self, time: f32, graph: &mut SceneGraph) {
        let angle = time * self.angular_speed;
        graph.node_mut(self.node).transform.translation = glm::vec3(
            angle.sin() * self.radius,
            self.height,
            angle.cos() * self.radius,
        );
    }
}

/// The textured cube: steady turn around Y with a gentle rock around X.
#[derive(Debug, Clone)]
pub struct TexturingSpin {
    pub node: NodeId,
}

impl Animatable for TexturingSpin {
    fn update(&mut self, time: f32, graph: &mut SceneGraph) {
        let rotation = &mut graph.node_mut(self.node).transform.rotation;
        rotation.y = time * 0.5;
        rotation.x = time.sin() * 0.2;
    }
}

/// Polyhedra tumbling at slightly different rates so they never line up.
#[derive(Debug, Clone)]
pub struct GeometryTumble {
    pub shapes: Vec<NodeId>,
}

impl Animatable for GeometryTumble {
    fn update(&mut self, time: f32, graph: &mut SceneGraph) {
        for (i, &shape) in self.shapes.iter().enumerate() {
            let i = i as f32;
            let rotation = &mut graph.node_mut(shape).transform.rotation;
            rotation.x = time * (0.5 + i * 0.2);
            rotation.y = time * (0.3 + i * 0.1);
        }
    }
}

/// Slowly turns the radial-sweep plane; the sweep itself runs in the fragment shader.
#[derive(Debug, Clone)]
pub struct ShaderSweep {
    pub node: NodeId,
}

impl Animatable for ShaderSweep {
    fn update(&mut self, time: f32, graph: &mut SceneGraph) {
        graph.node_mut(self.node).transform.rotation.z = time * 0.2;
    }
}

/// The car circling the world, nose along the direction of travel, wheels turning.
#[derive(Debug, Clone)]
pub struct CarDrive {
    pub car: NodeId,
    pub wheels: [NodeId; 4],
    pub radius: f32,
    pub angular_speed: f32,
    /// Wheel spin in radians per second.
    pub wheel_rate: f32,
}

impl CarDrive {
    pub fn new(car: NodeId, wheels: [NodeId; 4]) -> Self {
        Self {
            car,
            wheels,
            radius: 20.0,
            angular_speed: 0.1,
            wheel_rate: 6.0,
        }
    }
}

impl Animatable for CarDrive {
    fn update(&mut self, time: f32, graph: &mut SceneGraph) {
        let angle = time * self.angular_speed;
        let transform = &mut graph.node_mut(self.car).transform;
        transform.translation.x = angle.cos() * self.radius;
        transform.translation.z = angle.sin() * self.radius;
        transform.rotation.y = (-angle.cos()).atan2(-angle.sin());

        for &wheel in &self.wheels {
            graph.node_mut(wheel).transform.rotation.x = time * self.wheel_rate;
        }
    }
}

/// Bobs every particle of a point cloud and wraps it between two heights.
#[derive(Debug, Clone)]
pub struct ParticleDrift {
    pub mesh: MeshId,
    pub floor: f32,
    pub ceiling: f32,
}

impl ParticleDrift {
    pub fn new(mesh: MeshId) -> Self {
        Self {
            mesh,
            floor: 5.0,
            ceiling: 30.0,
        }
    }
}

impl Animatable for ParticleDrift {
    fn update(&mut self, time: f32, graph: &mut SceneGraph) {
        for (i, vertex) in graph.mesh_mut(self.mesh).vertices.iter_mut().enumerate() {
            let y = &mut vertex.position[1];
            *y += (time + i as f32).sin() * 0.01;
            if *y > self.ceiling {
                *y = self.floor;
            }
            if *y < self.floor {
                *y = self.ceiling;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MeshData;
    use crate::graph::Node;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_rng_is_deterministic_and_in_range() {
        let mut a = SimpleRng::new(42);
        let mut b = SimpleRng::new(42);
        for _ in 0..100 {
            let x = a.range(-50.0, 50.0);
            assert_eq!(x, b.range(-50.0, 50.0));
            assert!((-50.0..=50.0).contains(&x));
        }
        assert_ne!(SimpleRng::new(0).next_u32(), 0);
    }

    #[test]
    fn test_spin_is_a_function_of_time() {
        let mut graph = SceneGraph::new();
        let node = graph.add(Node::group());
        let mut spin = Spin {
            node,
            rates: glm::vec3(0.6, 0.6, 0.0),
        };
        spin.update(2.0, &mut graph);
        spin.update(2.0, &mut graph);
        let r = graph.node(node).transform.rotation;
        assert!(approx_eq(r.x, 1.2));
        assert!(approx_eq(r.z, 0.0));
    }

    #[test]
    fn test_circle_follows_sin_cos() {
        let mut graph = SceneGraph::new();
        let node = graph.add(Node::group());
        let mut circle = Circle {
            node,
            radius: 1.5,
            height: 0.0,
            angular_speed: 2.0,
        };
        circle.update(0.25, &mut graph);
        let p = graph.node(node).transform.translation;
        assert!(approx_eq(p.x, 0.5_f32.sin() * 1.5));
        assert!(approx_eq(p.z, 0.5_f32.cos() * 1.5));
        assert!(approx_eq(glm::length(&p), 1.5));
    }

    #[test]
    fn test_geometry_tumble_rates_differ_per_shape() {
        let mut graph = SceneGraph::new();
        let shapes: Vec<_> = (0..3).map(|_| graph.add(Node::group())).collect();
        let mut tumble = GeometryTumble {
            shapes: shapes.clone(),
        };
        tumble.update(1.0, &mut graph);
        assert!(approx_eq(graph.node(shapes[0]).transform.rotation.x, 0.5));
        assert!(approx_eq(graph.node(shapes[2]).transform.rotation.x, 0.9));
        assert!(approx_eq(graph.node(shapes[2]).transform.rotation.y, 0.5));
    }

    #[test]
    fn test_texturing_spin_and_shader_sweep() {
        let mut graph = SceneGraph::new();
        let cube = graph.add(Node::group());
        let plane = graph.add(Node::group());
        TexturingSpin { node: cube }.update(2.0, &mut graph);
        ShaderSweep { node: plane }.update(2.0, &mut graph);
        let r = graph.node(cube).transform.rotation;
        assert!(approx_eq(r.y, 1.0));
        assert!(approx_eq(r.x, 2.0_f32.sin() * 0.2));
        assert!(approx_eq(graph.node(plane).transform.rotation.z, 0.4));
    }

    #[test]
    fn test_car_drives_circle_facing_travel() {
        let mut graph = SceneGraph::new();
        let car = graph.add(Node::group());
        let wheels = [(); 4].map(|_| graph.add_child(car, Node::group()));
        let mut drive = CarDrive::new(car, wheels);

        drive.update(0.0, &mut graph);
        let t = graph.node(car).transform;
        assert!(approx_eq(t.translation.x, 20.0));
        assert!(approx_eq(t.translation.z, 0.0));
        assert!(approx_eq(t.rotation.y, (-1.0_f32).atan2(-0.0)));

        drive.update(10.0, &mut graph);
        let p = graph.node(car).transform.translation;
        assert!(approx_eq((p.x * p.x + p.z * p.z).sqrt(), 20.0));
        assert!(approx_eq(graph.node(wheels[3]).transform.rotation.x, 60.0));
    }

    #[test]
    fn test_particles_stay_between_floor_and_ceiling() {
        let mut graph = SceneGraph::new();
        let positions = [[0.0, 5.001, 0.0], [0.0, 29.999, 0.0], [0.0, 12.0, 0.0]];
        let colors = [[1.0, 1.0, 1.0]; 3];
        let mesh = graph.add_mesh(MeshData::points(&positions, &colors));
        let mut drift = ParticleDrift::new(mesh);

        for frame in 0..600 {
            drift.update(frame as f32 / 60.0, &mut graph);
            for v in &graph.mesh(mesh).data.vertices {
                assert!((5.0..=30.0).contains(&v.position[1]));
            }
        }
        assert_eq!(graph.mesh(mesh).revision, 600);
    }
}
