//! Screen/world conversions: cursor rays for hover picking and projection of world points
//! onto the screen for station labels.
//!
//! Picking tests rays against each mesh's bounding box. That is coarse for the sphere but
//! plenty for deciding which tooltip to show. The nearest hit over the whole graph wins, so
//! an untipped mesh in front of a tooltip object hides its tooltip.

use nalgebra_glm as glm;

use crate::camera::Camera;
use crate::geometry::Topology;
use crate::graph::{NodeId, SceneGraph};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: glm::Vec3,
    /// Unit length.
    pub direction: glm::Vec3,
}

impl Ray {
    /// The ray from the camera through a cursor position given in pixels, origin top-left.
    pub fn from_cursor(camera: &Camera, cursor: [f32; 2], viewport: [f32; 2]) -> Option<Self> {
        if viewport[0] <= 0.0 || viewport[1] <= 0.0 {
            return None;
        }
        let ndc_x = cursor[0] / viewport[0] * 2.0 - 1.0;
        let ndc_y = 1.0 - cursor[1] / viewport[1] * 2.0;

        let inverse = glm::inverse(&camera.view_projection());
        let unproject = |z: f32| {
            let p = inverse * glm::vec4(ndc_x, ndc_y, z, 1.0);
            glm::vec3(p.x, p.y, p.z) / p.w
        };
        let near = unproject(0.0);
        let far = unproject(1.0);
        let direction = far - near;
        if glm::length2(&direction) <= f32::EPSILON {
            return None;
        }
        Some(Self {
            origin: camera.position,
            direction: glm::normalize(&direction),
        })
    }

    /// Ray parameter of the first point inside the box, if the box is ahead.
    ///
    /// Slab test; a zero-thickness box (a plane) is hit when the ray crosses it.
    pub fn intersect_box(&self, min: &glm::Vec3, max: &glm::Vec3) -> Option<f32> {
        let mut near = f32::NEG_INFINITY;
        let mut far = f32::INFINITY;
        for axis in 0..3 {
            let origin = self.origin[axis];
            let direction = self.direction[axis];
            if direction.abs() <= f32::EPSILON {
                if origin < min[axis] || origin > max[axis] {
                    return None;
                }
                continue;
            }
            let a = (min[axis] - origin) / direction;
            let b = (max[axis] - origin) / direction;
            near = near.max(a.min(b));
            far = far.min(a.max(b));
        }
        if far < near.max(0.0) {
            None
        } else {
            Some(near.max(0.0))
        }
    }
}

/// Distance along the ray to the node's mesh, tested as the mesh's local bounding box.
///
/// Rotated and scaled nodes are handled by moving the ray into the node's space.
fn hit_distance(ray: &Ray, graph: &SceneGraph, node: NodeId) -> Option<f32> {
    let mesh = graph.node(node).mesh?;
    let inverse = glm::inverse(&graph.world_matrix(node));
    let origin = inverse * glm::vec4(ray.origin.x, ray.origin.y, ray.origin.z, 1.0);
    let direction = inverse * glm::vec4(ray.direction.x, ray.direction.y, ray.direction.z, 0.0);
    // Left unnormalized so the parameter stays in world units.
    let local = Ray {
        origin: glm::vec3(origin.x, origin.y, origin.z),
        direction: glm::vec3(direction.x, direction.y, direction.z),
    };
    let (min, max) = graph.mesh(mesh).bounds;
    local.intersect_box(&min, &max)
}

/// The nearest visible surface the ray hits, with its distance.
///
/// Every visible triangle mesh in the graph takes part, so a mesh in front hides the ones
/// behind it. Point clouds are ignored.
pub fn pick_nearest(ray: &Ray, graph: &SceneGraph) -> Option<(NodeId, f32)> {
    graph
        .nodes()
        .filter(|(_, node)| {
            node.mesh
                .is_some_and(|mesh| graph.mesh(mesh).data.topology == Topology::Triangles)
        })
        .filter(|(id, _)| graph.is_visible(*id))
        .filter_map(|(id, _)| hit_distance(ray, graph, id).map(|distance| (id, distance)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Projects a world point to pixels, origin top-left. `None` when behind the camera.
pub fn project_to_screen(
    view_projection: &glm::Mat4,
    point: &glm::Vec3,
    viewport: [f32; 2],
) -> Option<[f32; 2]> {
    let clip = view_projection * glm::vec4(point.x, point.y, point.z, 1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = glm::vec2(clip.x, clip.y) / clip.w;
    Some([
        (ndc.x + 1.0) * 0.5 * viewport[0],
        (1.0 - ndc.y) * 0.5 * viewport[1],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraSettings;
    use crate::geometry::MeshData;
    use crate::graph::{Material, Node};

    const EPSILON: f32 = 1e-3;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn camera() -> Camera {
        let mut camera = Camera::new(&CameraSettings::default());
        camera.position = glm::vec3(0.0, 0.0, 5.0);
        camera.set_aspect(800, 600);
        camera
    }

    #[test]
    fn test_center_ray_points_forward() {
        let ray = Ray::from_cursor(&camera(), [400.0, 300.0], [800.0, 600.0]).unwrap();
        assert!(approx_eq(ray.direction.z, -1.0));
        assert!(approx_eq(ray.origin.z, 5.0));
    }

    #[test]
    fn test_degenerate_viewport() {
        assert!(Ray::from_cursor(&camera(), [0.0, 0.0], [0.0, 600.0]).is_none());
    }

    #[test]
    fn test_box_hit_and_miss() {
        let ray = Ray {
            origin: glm::vec3(0.0, 0.0, 5.0),
            direction: glm::vec3(0.0, 0.0, -1.0),
        };
        let unit = glm::vec3(1.0, 1.0, 1.0);
        assert!(approx_eq(ray.intersect_box(&-unit, &unit).unwrap(), 4.0));
        let shifted = glm::vec3(3.0, 0.0, 0.0);
        assert!(ray.intersect_box(&(shifted - unit), &(shifted + unit)).is_none());
        let behind = glm::vec3(0.0, 0.0, 10.0);
        assert!(ray.intersect_box(&(behind - unit), &(behind + unit)).is_none());
    }

    #[test]
    fn test_ray_parallel_to_plane_misses_it() {
        let mut graph = SceneGraph::new();
        let mesh = graph.add_mesh(MeshData::plane(10.0, 10.0));
        let floor = graph.add(
            Node::mesh(mesh, Material::default())
                .at(0.0, -1.5, 0.0)
                .rotated(std::f32::consts::FRAC_PI_2, 0.0, 0.0),
        );
        let level = Ray {
            origin: glm::vec3(0.0, 0.0, 5.0),
            direction: glm::vec3(0.0, 0.0, -1.0),
        };
        assert!(pick_nearest(&level, &graph).is_none());

        let down = Ray {
            origin: glm::vec3(0.0, 3.0, 0.0),
            direction: glm::vec3(0.0, -1.0, 0.0),
        };
        let (node, distance) = pick_nearest(&down, &graph).unwrap();
        assert_eq!(node, floor);
        assert!(approx_eq(distance, 4.5));
    }

    #[test]
    fn test_pick_prefers_nearest_visible() {
        let mut graph = SceneGraph::new();
        let mesh = graph.add_mesh(MeshData::sphere(0.5, 8, 6));
        let far = graph.add(Node::mesh(mesh, Material::default()).at(0.0, 0.0, -3.0));
        let near = graph.add(Node::mesh(mesh, Material::default()));
        let hidden = graph.add(Node::mesh(mesh, Material::default()).at(0.0, 0.0, 2.0).hidden());

        let ray = Ray::from_cursor(&camera(), [400.0, 300.0], [800.0, 600.0]).unwrap();
        let (node, _) = pick_nearest(&ray, &graph).unwrap();
        assert_eq!(node, near);
        assert_ne!(node, far);
        assert_ne!(node, hidden);
    }

    #[test]
    fn test_point_clouds_are_not_pickable() {
        let mut graph = SceneGraph::new();
        let cloud = graph.add_mesh(MeshData::points(
            &[[0.0, 0.0, 0.0], [0.0, 0.0, -4.0]],
            &[[1.0, 1.0, 1.0], [1.0, 1.0, 1.0]],
        ));
        graph.add(Node::mesh(cloud, Material::default()));
        let ray = Ray::from_cursor(&camera(), [400.0, 300.0], [800.0, 600.0]).unwrap();
        assert!(pick_nearest(&ray, &graph).is_none());
    }

    #[test]
    fn test_scaled_node_grows_its_sphere() {
        let mut graph = SceneGraph::new();
        let mesh = graph.add_mesh(MeshData::sphere(0.5, 8, 6));
        let node = graph.add(Node::mesh(mesh, Material::default()).at(1.5, 0.0, 0.0).scaled(4.0, 4.0, 4.0));
        let ray = Ray {
            origin: glm::vec3(0.0, 0.0, 5.0),
            direction: glm::vec3(0.0, 0.0, -1.0),
        };
        assert_eq!(pick_nearest(&ray, &graph).map(|(hit, _)| hit), Some(node));
    }

    #[test]
    fn test_projection_of_origin_is_screen_center() {
        let cam = camera();
        let p = project_to_screen(&cam.view_projection(), &glm::Vec3::zeros(), [800.0, 600.0]).unwrap();
        assert!(approx_eq(p[0], 400.0));
        assert!(approx_eq(p[1], 300.0));
        assert!(project_to_screen(&cam.view_projection(), &glm::vec3(0.0, 0.0, 10.0), [800.0, 600.0]).is_none());
    }
}
