//! # World
//!
//! One-shot construction of everything in the sandbox, and the per-frame update that
//! drives its animations.
//!
//! ## Contents
//!
//! - **Overview geometry**: a cube, a sphere and a floor plane near the origin, with an
//!   orange point light circling them. These three carry hover tooltips.
//! - **Lights**: white ambient at 0.4 and a white directional light from (5, 10, 7).
//! - **Terrain**: a 100×100 ground plane at y = -2 and two cone hills.
//! - **Stations**: the five learning stations, each with a platform, a holographic display,
//!   a label plate and a demo that only shows while the station is active.
//! - **Decorations**: eight trees, a car circling the world and a cloud of particles.
//!
//! ## Animation order
//!
//! [`World::update`] walks the animatables in the order they were added: overview, station
//! demos in station order, car, particles.

use std::f32::consts::{FRAC_PI_2, PI};
use std::path::Path;

use nalgebra_glm as glm;

use crate::animation::{
    Animatable, CarDrive, Circle, GeometryTumble, ParticleDrift, ShaderSweep, SimpleRng, Spin,
    TexturingSpin,
};
use crate::assets;
use crate::camera::Camera;
use crate::geometry::MeshData;
use crate::graph::{rgb, Material, Node, NodeId, PointLight, SceneGraph, Shading, TextureImage};
use crate::picking::{pick_nearest, project_to_screen, Ray};
use crate::stations::{Station, StationKind, StationRegistry, StationVisuals};
use crate::ui::StationLabel;

const CUBE_TOOLTIP: &str = "This cube demonstrates basic 3D geometry and shows how vertices, \
                            edges, and faces combine to create 3D objects.";
const SPHERE_TOOLTIP: &str = "This sphere demonstrates smooth shading. Notice how light \
                              interacts with its curved surface compared to the cube.";
const PLANE_TOOLTIP: &str = "This plane demonstrates texture mapping, showing how 2D images can \
                             be applied to 3D surfaces.";

/// Clear color used when the skybox faces are missing.
const SKY_FALLBACK: u32 = 0x88ccee;

const TREE_POSITIONS: [[f32; 2]; 8] = [
    [-20.0, -10.0],
    [25.0, -20.0],
    [-15.0, 25.0],
    [30.0, 15.0],
    [-25.0, 5.0],
    [10.0, 30.0],
    [-30.0, -25.0],
    [20.0, -5.0],
];

const PARTICLE_COUNT: usize = 500;
const PARTICLE_SEED: u32 = 0x5eed_0001;

/// Optional images; any of them may be missing.
#[derive(Debug, Clone, Default)]
pub struct WorldTextures {
    pub ground: Option<TextureImage>,
    pub demo: Option<TextureImage>,
    pub skybox: Option<Vec<TextureImage>>,
}

impl WorldTextures {
    /// Loads every optional image under `root`, logging and skipping the missing ones.
    pub fn load(root: &Path) -> Self {
        Self {
            ground: assets::texture_or_fallback(&assets::ground_texture_path(root)),
            demo: assets::texture_or_fallback(&assets::demo_texture_path(root)),
            skybox: assets::skybox_or_fallback(&assets::skybox_dir(root)),
        }
    }
}

pub struct World {
    pub graph: SceneGraph,
    pub stations: StationRegistry,
    animatables: Vec<Box<dyn Animatable>>,
    tooltips: Vec<(NodeId, &'static str)>,
}

impl World {
    pub fn new(textures: WorldTextures) -> Self {
        let mut world = Self {
            graph: SceneGraph::new(),
            stations: StationRegistry::default(),
            animatables: Vec::new(),
            tooltips: Vec::new(),
        };

        world.add_sky(textures.skybox);
        world.add_lights();
        world.add_overview();
        world.add_terrain(textures.ground);
        world.add_stations(textures.demo);
        world.add_trees();
        world.add_car();
        world.add_particles();

        log::info!(
            "World built: {} nodes, {} meshes, {} stations, {} animatables",
            world.graph.node_count(),
            world.graph.meshes().len(),
            world.stations.len(),
            world.animatables.len()
        );
        world
    }

    /// Advances every animatable to `time` seconds on the animation clock.
    pub fn update(&mut self, time: f32) {
        for animatable in &mut self.animatables {
            animatable.update(time, &mut self.graph);
        }
    }

    pub fn animatable_count(&self) -> usize {
        self.animatables.len()
    }

    /// Tooltip text of the nearest object under the cursor, if that object carries one.
    pub fn tooltip_at(
        &self,
        camera: &Camera,
        cursor: [f32; 2],
        viewport: [f32; 2],
    ) -> Option<&'static str> {
        let ray = Ray::from_cursor(camera, cursor, viewport)?;
        let (hit, _) = pick_nearest(&ray, &self.graph)?;
        self.tooltips
            .iter()
            .find(|(node, _)| *node == hit)
            .map(|&(_, text)| text)
    }

    /// Screen positions for the station names, just above each label plate.
    pub fn station_labels(&self, camera: &Camera, viewport: [f32; 2]) -> Vec<StationLabel> {
        let view_projection = camera.view_projection();
        self.stations
            .iter()
            .filter_map(|station| {
                let anchor = self.graph.world_position(station.visuals.label) + glm::vec3(0.0, 0.6, 0.0);
                let position = project_to_screen(&view_projection, &anchor, viewport)?;
                Some(StationLabel {
                    text: station.name(),
                    position,
                    color: rgb(station.kind.color()),
                })
            })
            .collect()
    }

    fn animate(&mut self, animatable: impl Animatable + 'static) {
        self.animatables.push(Box::new(animatable));
    }

    fn add_sky(&mut self, skybox: Option<Vec<TextureImage>>) {
        self.graph.background = rgb(SKY_FALLBACK);
        self.graph.skybox = skybox;
    }

    fn add_lights(&mut self) {
        let lights = &mut self.graph.lights;
        lights.ambient_color = rgb(0xffffff);
        lights.ambient_intensity = 0.4;
        lights.sun_position = glm::vec3(5.0, 10.0, 7.0);
        lights.sun_color = rgb(0xffffff);
        lights.sun_intensity = 0.7;
    }

    fn add_overview(&mut self) {
        let graph = &mut self.graph;

        let cube_mesh = graph.add_mesh(MeshData::cuboid(1.0, 1.0, 1.0));
        let cube = graph.add(
            Node::mesh(
                cube_mesh,
                Material::standard(0x3498db).metalness(0.3).roughness(0.4),
            )
            .named("cube")
            .at(-2.0, 0.0, 0.0),
        );

        let sphere_mesh = graph.add_mesh(MeshData::sphere(0.7, 32, 32));
        let sphere = graph.add(
            Node::mesh(
                sphere_mesh,
                Material::standard(0xe74c3c).metalness(0.3).roughness(0.4),
            )
            .named("sphere")
            .at(2.0, 0.0, 0.0),
        );

        let plane_mesh = graph.add_mesh(MeshData::plane(10.0, 10.0));
        let plane = graph.add(
            Node::mesh(plane_mesh, Material::standard(0xecf0f1))
                .named("plane")
                .at(0.0, -1.5, 0.0)
                .rotated(FRAC_PI_2, 0.0, 0.0),
        );

        let light = graph.add(Node::group().named("overview-light").at(0.0, 2.0, 3.0));
        graph.lights.points.push(PointLight {
            node: light,
            color: rgb(0xffa500),
            intensity: 0.5,
            range: 10.0,
        });

        self.tooltips
            .extend([(cube, CUBE_TOOLTIP), (sphere, SPHERE_TOOLTIP), (plane, PLANE_TOOLTIP)]);

        // Sixty frames a second at 0.01 rad per frame.
        self.animate(Spin {
            node: cube,
            rates: glm::vec3(0.6, 0.6, 0.0),
        });
        self.animate(Spin {
            node: sphere,
            rates: glm::vec3(0.0, 0.6, 0.0),
        });
        self.animate(Circle {
            node: light,
            radius: 3.0,
            height: 2.0,
            angular_speed: 1.0,
        });
    }

    fn add_terrain(&mut self, ground: Option<TextureImage>) {
        let graph = &mut self.graph;

        let mut material = Material::standard(0x567d46).roughness(0.8).metalness(0.2);
        if let Some(image) = ground {
            material.texture = Some(graph.add_texture(image));
            material.uv_repeat = [10.0, 10.0];
        }
        let ground_mesh = graph.add_mesh(MeshData::plane(100.0, 100.0));
        graph.add(
            Node::mesh(ground_mesh, material)
                .named("terrain")
                .at(0.0, -2.0, 0.0)
                .rotated(-FRAC_PI_2, 0.0, 0.0),
        );

        let hill_mesh = graph.add_mesh(MeshData::cone(10.0, 5.0, 16));
        let hill = Material::standard(0x567d46).roughness(0.9);
        graph.add(
            Node::mesh(hill_mesh, hill)
                .at(-30.0, -2.0, -20.0)
                .scaled(1.0, 0.5, 1.0),
        );
        graph.add(
            Node::mesh(hill_mesh, hill)
                .at(25.0, -2.0, -15.0)
                .scaled(0.8, 0.6, 0.8),
        );
    }

    fn add_stations(&mut self, demo_texture: Option<TextureImage>) {
        let platform_mesh = self.graph.add_mesh(MeshData::cylinder(5.0, 5.0, 0.5, 32));
        let display_mesh = self.graph.add_mesh(MeshData::cuboid(3.0, 4.0, 0.1));
        let label_mesh = self.graph.add_mesh(MeshData::plane(4.0, 0.8));
        let demo_texture = demo_texture.map(|image| self.graph.add_texture(image));

        let mut stations = Vec::with_capacity(StationKind::ALL.len());
        for kind in StationKind::ALL {
            let color = kind.color();
            let p = kind.position();
            let graph = &mut self.graph;

            let root = graph.add(Node::group().named(kind.name()).at(p.x, p.y, p.z));
            let platform = graph.add_child(
                root,
                Node::mesh(
                    platform_mesh,
                    Material::standard(color)
                        .metalness(0.3)
                        .roughness(0.5)
                        .emissive(color, 0.0),
                )
                .at(0.0, -0.25, 0.0),
            );
            let display = graph.add_child(
                root,
                Node::mesh(
                    display_mesh,
                    Material::standard(0xffffff)
                        .emissive(color, 0.5)
                        .opacity(0.7),
                )
                .at(0.0, 2.0, 0.0),
            );
            let label = graph.add_child(
                root,
                Node::mesh(label_mesh, Material::unlit(0xffffff)).at(0.0, 4.5, 0.0),
            );
            let demo = graph.add_child(root, Node::group().at(0.0, 1.5, 0.0).hidden());

            match kind {
                StationKind::Pipeline => self.add_pipeline_demo(demo, color),
                StationKind::Lighting => self.add_lighting_demo(demo, color),
                StationKind::Texturing => self.add_texturing_demo(demo, color, demo_texture),
                StationKind::Geometry => self.add_geometry_demo(demo),
                StationKind::Shaders => self.add_shader_demo(demo, color),
            }

            stations.push(Station::new(
                kind,
                StationVisuals {
                    platform,
                    display,
                    label,
                    demo,
                },
            ));
        }
        self.stations = StationRegistry::new(stations);
    }

    fn add_pipeline_demo(&mut self, demo: NodeId, color: u32) {
        const STAGES: usize = 5;
        const SPACING: f32 = 1.2;

        let graph = &mut self.graph;
        let stage_mesh = graph.add_mesh(MeshData::cuboid(1.0, 0.5, 0.5));
        let pipe_mesh = graph.add_mesh(MeshData::cylinder(0.1, 0.1, SPACING - 0.2, 8));
        let stage = Material::standard(color).metalness(0.5).roughness(0.5);
        let pipe = Material::standard(0x888888).metalness(0.8).roughness(0.2);

        for i in 0..STAGES {
            let x = (i as f32 - (STAGES - 1) as f32 / 2.0) * SPACING;
            graph.add_child(demo, Node::mesh(stage_mesh, stage).at(x, 0.0, 0.0));
            if i < STAGES - 1 {
                graph.add_child(
                    demo,
                    Node::mesh(pipe_mesh, pipe)
                        .at(x + SPACING / 2.0, 0.0, 0.0)
                        .rotated(0.0, 0.0, FRAC_PI_2),
                );
            }
        }
    }

    fn add_lighting_demo(&mut self, demo: NodeId, color: u32) {
        let graph = &mut self.graph;
        let sphere_mesh = graph.add_mesh(MeshData::sphere(0.7, 32, 32));
        graph.add_child(
            demo,
            Node::mesh(
                sphere_mesh,
                Material::standard(0xffffff).metalness(0.1).roughness(0.2),
            ),
        );

        let marker_mesh = graph.add_mesh(MeshData::sphere(0.1, 16, 16));
        let marker = graph.add_child(
            demo,
            Node::mesh(marker_mesh, Material::unlit(color)).at(1.5, 0.0, 0.0),
        );
        graph.lights.points.push(PointLight {
            node: marker,
            color: rgb(color),
            intensity: 1.0,
            range: 10.0,
        });

        self.animate(Circle {
            node: marker,
            radius: 1.5,
            height: 0.0,
            angular_speed: 2.0,
        });
    }

    fn add_texturing_demo(
        &mut self,
        demo: NodeId,
        color: u32,
        texture: Option<crate::graph::TextureId>,
    ) {
        let graph = &mut self.graph;
        let cube_mesh = graph.add_mesh(MeshData::cuboid(1.2, 1.2, 1.2));
        let mut material = Material::standard(color).metalness(0.1).roughness(0.8);
        material.texture = texture;
        let cube = graph.add_child(demo, Node::mesh(cube_mesh, material));
        self.animate(TexturingSpin { node: cube });
    }

    fn add_geometry_demo(&mut self, demo: NodeId) {
        let graph = &mut self.graph;
        let shapes = [
            (MeshData::tetrahedron(0.5), 0xff5252, -1.0),
            (MeshData::octahedron(0.5), 0x4caf50, 0.0),
            (MeshData::dodecahedron(0.5), 0x2196f3, 1.0),
        ]
        .into_iter()
        .map(|(mesh, color, x)| {
            let mesh = graph.add_mesh(mesh);
            let material = Material::standard(color).metalness(0.2).roughness(0.5);
            graph.add_child(demo, Node::mesh(mesh, material).at(x, 0.0, 0.0))
        })
        .collect();
        self.animate(GeometryTumble { shapes });
    }

    fn add_shader_demo(&mut self, demo: NodeId, color: u32) {
        let graph = &mut self.graph;
        let plane_mesh = graph.add_mesh(MeshData::plane(2.0, 2.0));
        let plane = graph.add_child(
            demo,
            Node::mesh(plane_mesh, Material::standard(color).shading(Shading::RadialSweep)),
        );
        self.animate(ShaderSweep { node: plane });
    }

    fn add_trees(&mut self) {
        let graph = &mut self.graph;
        let trunk_mesh = graph.add_mesh(MeshData::cylinder(0.2, 0.3, 1.5, 8));
        let foliage_mesh = graph.add_mesh(MeshData::cone(1.0, 2.0, 8));
        let trunk = Material::standard(0x8b4513).roughness(0.9);
        let foliage = Material::standard(0x2e8b57).roughness(0.8);

        for [x, z] in TREE_POSITIONS {
            let tree = graph.add(Node::group().at(x, 0.0, z));
            graph.add_child(tree, Node::mesh(trunk_mesh, trunk).at(0.0, 0.75, 0.0));
            graph.add_child(tree, Node::mesh(foliage_mesh, foliage).at(0.0, 2.5, 0.0));
        }
    }

    fn add_car(&mut self) {
        let graph = &mut self.graph;
        let car = graph.add(Node::group().named("car"));

        let body_mesh = graph.add_mesh(MeshData::cuboid(4.0, 1.0, 2.0));
        graph.add_child(
            car,
            Node::mesh(
                body_mesh,
                Material::standard(0x3498db).metalness(0.7).roughness(0.3),
            )
            .at(0.0, 0.5, 0.0),
        );

        let cabin_mesh = graph.add_mesh(MeshData::cuboid(2.0, 1.0, 1.8));
        graph.add_child(
            car,
            Node::mesh(
                cabin_mesh,
                Material::standard(0x2c3e50)
                    .metalness(0.5)
                    .roughness(0.5)
                    .opacity(0.7),
            )
            .at(-0.5, 1.5, 0.0),
        );

        let wheel_mesh = graph.add_mesh(MeshData::cylinder(0.4, 0.4, 0.3, 16));
        let wheel = Material::standard(0x333333).metalness(0.5).roughness(0.7);
        let wheels = [(1.3, 1.0), (1.3, -1.0), (-1.3, 1.0), (-1.3, -1.0)].map(|(x, z)| {
            graph.add_child(
                car,
                Node::mesh(wheel_mesh, wheel)
                    .at(x, 0.4, z)
                    .rotated(0.0, 0.0, PI / 2.0),
            )
        });

        self.animate(CarDrive::new(car, wheels));
    }

    fn add_particles(&mut self) {
        let mut rng = SimpleRng::new(PARTICLE_SEED);
        let mut positions = Vec::with_capacity(PARTICLE_COUNT);
        let mut colors = Vec::with_capacity(PARTICLE_COUNT);
        for _ in 0..PARTICLE_COUNT {
            positions.push([
                rng.range(-50.0, 50.0),
                rng.range(5.0, 25.0),
                rng.range(-50.0, 50.0),
            ]);
            colors.push([rng.next_f32(), rng.next_f32(), rng.next_f32()]);
        }

        let mesh = self.graph.add_mesh(MeshData::points(&positions, &colors));
        self.graph.add(
            Node::mesh(mesh, Material::unlit(0xffffff).opacity(0.6)).named("particles"),
        );
        self.animate(ParticleDrift::new(mesh));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraSettings;
    use crate::geometry::Topology;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn world() -> World {
        World::new(WorldTextures::default())
    }

    #[test]
    fn test_stations_in_declaration_order_all_inactive() {
        let world = world();
        let kinds: Vec<_> = world.stations.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, StationKind::ALL);
        for station in world.stations.iter() {
            assert!(!station.is_active());
            assert!(!world.graph.is_visible(station.visuals.demo));
            let platform = world.graph.world_position(station.visuals.platform);
            assert!(approx_eq(platform.y, -0.25));
            assert!(approx_eq(platform.x, station.position.x));
        }
    }

    #[test]
    fn test_fallbacks_without_assets() {
        let world = world();
        assert!(world.graph.skybox.is_none());
        assert_eq!(world.graph.background, rgb(SKY_FALLBACK));
        assert!(world.graph.textures().is_empty());
        let terrain = world.graph.find("terrain").unwrap();
        assert_eq!(world.graph.node(terrain).material.texture, None);
    }

    #[test]
    fn test_ground_texture_repeats() {
        let textures = WorldTextures {
            ground: Some(TextureImage {
                width: 1,
                height: 1,
                pixels: vec![255; 4],
            }),
            ..WorldTextures::default()
        };
        let world = World::new(textures);
        let terrain = world.graph.find("terrain").unwrap();
        let material = world.graph.node(terrain).material;
        assert!(material.texture.is_some());
        assert_eq!(material.uv_repeat, [10.0, 10.0]);
    }

    #[test]
    fn test_animatables_cover_every_moving_part() {
        // Cube, sphere, overview light, four animated demos, car, particles.
        assert_eq!(world().animatable_count(), 9);
    }

    #[test]
    fn test_update_moves_car_and_overview_light() {
        let mut world = world();
        world.update(0.0);
        let car = world.graph.find("car").unwrap();
        assert!(approx_eq(world.graph.node(car).transform.translation.x, 20.0));

        world.update(std::f32::consts::FRAC_PI_2);
        let light = world.graph.find("overview-light").unwrap();
        let p = world.graph.node(light).transform.translation;
        assert!(approx_eq(p.x, 3.0));
        assert!(approx_eq(p.y, 2.0));
    }

    #[test]
    fn test_particle_cloud_bounds() {
        let world = world();
        let node = world.graph.find("particles").unwrap();
        let mesh = world.graph.mesh(world.graph.node(node).mesh.unwrap());
        assert_eq!(mesh.data.topology, Topology::Points);
        assert_eq!(mesh.data.vertices.len(), PARTICLE_COUNT);
        for v in &mesh.data.vertices {
            assert!((-50.0..=50.0).contains(&v.position[0]));
            assert!((5.0..=25.0).contains(&v.position[1]));
        }
    }

    #[test]
    fn test_point_lights() {
        let world = world();
        assert_eq!(world.graph.lights.points.len(), 2);
        let demo_light = world.graph.lights.points[1];
        // The lighting demo's light is hidden with its station.
        assert!(!world.graph.is_visible(demo_light.node));
    }

    #[test]
    fn test_tooltip_under_cursor() {
        let world = world();
        let mut camera = Camera::new(&CameraSettings::default());
        camera.position = glm::vec3(-2.0, 0.0, 5.0);
        camera.set_aspect(800, 600);
        let text = world.tooltip_at(&camera, [400.0, 300.0], [800.0, 600.0]);
        assert_eq!(text, Some(CUBE_TOOLTIP));
    }

    #[test]
    fn test_nearer_mesh_hides_the_tooltip_behind_it() {
        let mut world = world();
        let blocker = world.graph.add_mesh(MeshData::cuboid(1.0, 1.0, 1.0));
        world
            .graph
            .add(Node::mesh(blocker, Material::standard(0xffffff)).at(-2.0, 0.0, 2.5));
        let mut camera = Camera::new(&CameraSettings::default());
        camera.position = glm::vec3(-2.0, 0.0, 5.0);
        camera.set_aspect(800, 600);
        assert_eq!(world.tooltip_at(&camera, [400.0, 300.0], [800.0, 600.0]), None);
    }

    #[test]
    fn test_station_labels_project_in_front_only() {
        let world = world();
        let mut camera = Camera::new(&CameraSettings::default());
        camera.set_aspect(800, 600);
        // From (0, 1.6, 5) looking down -Z, the two stations behind the camera are culled.
        let labels = world.station_labels(&camera, [800.0, 600.0]);
        let names: Vec<_> = labels.iter().map(|l| l.text).collect();
        assert_eq!(names, ["Pipeline", "Lighting", "Shaders"]);
    }
}
