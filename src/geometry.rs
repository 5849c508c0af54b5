//! # Geometry
//!
//! CPU-side mesh builders for every shape the studio places in the world. All shapes are
//! centered on the origin of their local space, Y up, so a node's translation is the
//! center of its shape:
//!
//! - [`MeshData::cuboid`], [`MeshData::sphere`], [`MeshData::cylinder`] / [`MeshData::cone`],
//!   [`MeshData::plane`] (in the XY plane, facing +Z);
//! - flat-shaded [`MeshData::tetrahedron`], [`MeshData::octahedron`] and
//!   [`MeshData::dodecahedron`];
//! - [`MeshData::points`] for particle clouds.
//!
//! Faces are wound counter-clockwise when seen from outside.

use std::f32::consts::{PI, TAU};

use nalgebra_glm as glm;

use crate::vertex::Vertex;

/// How the index buffer of a mesh is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Points,
}

/// Vertex and index data for one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl MeshData {
    fn triangles(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            topology: Topology::Triangles,
        }
    }

    /// An axis-aligned box with four vertices per face so each face has its own normal.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (hx, hy, hz) = (width / 2.0, height / 2.0, depth / 2.0);

        // (normal, u axis, v axis) per face; u and v span the face in the right-handed sense.
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        let half = glm::vec3(hx, hy, hz);

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u_axis, v_axis) in faces {
            let n = glm::make_vec3(&normal);
            let u = glm::make_vec3(&u_axis);
            let v = glm::make_vec3(&v_axis);
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = (n + u * su + v * sv).component_mul(&half);
                vertices.push(Vertex::new(
                    [p.x, p.y, p.z],
                    normal,
                    [(su + 1.0) / 2.0, (1.0 - sv) / 2.0],
                ));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::triangles(vertices, indices)
    }

    /// A UV sphere.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let mut vertices = Vec::new();
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let phi = v * PI;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let theta = u * TAU;
                let normal = [
                    -theta.cos() * phi.sin(),
                    phi.cos(),
                    theta.sin() * phi.sin(),
                ];
                vertices.push(Vertex::new(
                    [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                    normal,
                    [u, v],
                ));
            }
        }

        let row = width_segments + 1;
        let mut indices = Vec::new();
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self::triangles(vertices, indices)
    }

    /// A capped cylinder along Y. A zero `radius_top` gives a cone.
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> Self {
        let segments = radial_segments.max(3);
        let half = height / 2.0;
        let slope = (radius_bottom - radius_top) / height.max(f32::EPSILON);

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // Side wall: two rings with outward, slope-adjusted normals.
        for ix in 0..=segments {
            let u = ix as f32 / segments as f32;
            let theta = u * TAU;
            let (sin, cos) = theta.sin_cos();
            let normal = glm::normalize(&glm::vec3(sin, slope, cos));
            for (radius, y, v) in [(radius_top, half, 0.0), (radius_bottom, -half, 1.0)] {
                vertices.push(Vertex::new(
                    [radius * sin, y, radius * cos],
                    [normal.x, normal.y, normal.z],
                    [u, v],
                ));
            }
        }
        for ix in 0..segments {
            let top = ix * 2;
            let bottom = top + 1;
            let next_top = top + 2;
            let next_bottom = top + 3;
            indices.extend_from_slice(&[top, bottom, next_bottom, top, next_bottom, next_top]);
        }

        for (radius, y, ny) in [(radius_top, half, 1.0_f32), (radius_bottom, -half, -1.0)] {
            if radius <= 0.0 {
                continue;
            }
            let center = vertices.len() as u32;
            vertices.push(Vertex::new([0.0, y, 0.0], [0.0, ny, 0.0], [0.5, 0.5]));
            for ix in 0..=segments {
                let theta = ix as f32 / segments as f32 * TAU;
                let (sin, cos) = theta.sin_cos();
                vertices.push(Vertex::new(
                    [radius * sin, y, radius * cos],
                    [0.0, ny, 0.0],
                    [sin * 0.5 + 0.5, cos * 0.5 * ny + 0.5],
                ));
            }
            for ix in 0..segments {
                let a = center + 1 + ix;
                let b = a + 1;
                if ny > 0.0 {
                    indices.extend_from_slice(&[center, a, b]);
                } else {
                    indices.extend_from_slice(&[center, b, a]);
                }
            }
        }

        Self::triangles(vertices, indices)
    }

    pub fn cone(radius: f32, height: f32, radial_segments: u32) -> Self {
        Self::cylinder(0.0, radius, height, radial_segments)
    }

    /// A rectangle in the XY plane facing +Z.
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        let normal = [0.0, 0.0, 1.0];
        let vertices = vec![
            Vertex::new([-hw, -hh, 0.0], normal, [0.0, 1.0]),
            Vertex::new([hw, -hh, 0.0], normal, [1.0, 1.0]),
            Vertex::new([hw, hh, 0.0], normal, [1.0, 0.0]),
            Vertex::new([-hw, hh, 0.0], normal, [0.0, 0.0]),
        ];
        Self::triangles(vertices, vec![0, 1, 2, 0, 2, 3])
    }

    pub fn tetrahedron(radius: f32) -> Self {
        const CORNERS: [[f32; 3]; 4] = [
            [1.0, 1.0, 1.0],
            [-1.0, -1.0, 1.0],
            [-1.0, 1.0, -1.0],
            [1.0, -1.0, -1.0],
        ];
        const FACES: [u32; 12] = [2, 1, 0, 0, 3, 2, 1, 3, 0, 2, 3, 1];
        Self::polyhedron(&CORNERS, &FACES, radius)
    }

    pub fn octahedron(radius: f32) -> Self {
        const CORNERS: [[f32; 3]; 6] = [
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ];
        const FACES: [u32; 24] = [
            0, 2, 4, 0, 4, 3, 0, 3, 5, 0, 5, 2, 1, 2, 5, 1, 5, 3, 1, 3, 4, 1, 4, 2,
        ];
        Self::polyhedron(&CORNERS, &FACES, radius)
    }

    pub fn dodecahedron(radius: f32) -> Self {
        let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let r = 1.0 / t;
        let corners = [
            [-1.0, -1.0, -1.0],
            [-1.0, -1.0, 1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, 1.0, 1.0],
            [1.0, -1.0, -1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, -1.0],
            [1.0, 1.0, 1.0],
            [0.0, -r, -t],
            [0.0, -r, t],
            [0.0, r, -t],
            [0.0, r, t],
            [-r, -t, 0.0],
            [-r, t, 0.0],
            [r, -t, 0.0],
            [r, t, 0.0],
            [-t, 0.0, -r],
            [t, 0.0, -r],
            [-t, 0.0, r],
            [t, 0.0, r],
        ];
        const FACES: [u32; 108] = [
            3, 11, 7, 3, 7, 15, 3, 15, 13, 7, 19, 17, 7, 17, 6, 7, 6, 15, 17, 4, 8, 17, 8, 10, 17,
            10, 6, 8, 0, 16, 8, 16, 2, 8, 2, 10, 0, 12, 1, 0, 1, 18, 0, 18, 16, 6, 10, 2, 6, 2, 13,
            6, 13, 15, 2, 16, 18, 2, 18, 3, 2, 3, 13, 18, 1, 9, 18, 9, 11, 18, 11, 3, 4, 14, 12, 4,
            12, 0, 4, 0, 8, 11, 9, 5, 11, 5, 19, 11, 19, 7, 19, 5, 14, 19, 14, 4, 19, 4, 17, 1, 12,
            14, 1, 14, 5, 1, 5, 9,
        ];
        Self::polyhedron(&corners, &FACES, radius)
    }

    /// Projects `corners` onto a sphere of `radius` and emits one flat-shaded triangle per
    /// index triple, flipped where needed so every face points away from the center.
    fn polyhedron(corners: &[[f32; 3]], faces: &[u32], radius: f32) -> Self {
        let projected: Vec<glm::Vec3> = corners
            .iter()
            .map(|c| glm::normalize(&glm::make_vec3(c)) * radius)
            .collect();

        let mut vertices = Vec::with_capacity(faces.len());
        for triangle in faces.chunks_exact(3) {
            let mut a = projected[triangle[0] as usize];
            let b = projected[triangle[1] as usize];
            let mut c = projected[triangle[2] as usize];
            let mut normal = glm::normalize(&glm::cross(&(b - a), &(c - a)));
            if glm::dot(&normal, &((a + b + c) / 3.0)) < 0.0 {
                std::mem::swap(&mut a, &mut c);
                normal = -normal;
            }
            let n = [normal.x, normal.y, normal.z];
            for (p, uv) in [(a, [0.0, 1.0]), (b, [1.0, 1.0]), (c, [0.5, 0.0])] {
                vertices.push(Vertex::new([p.x, p.y, p.z], n, uv));
            }
        }

        let indices = (0..vertices.len() as u32).collect();
        Self::triangles(vertices, indices)
    }

    /// A point cloud with one colored vertex per position.
    pub fn points(positions: &[[f32; 3]], colors: &[[f32; 3]]) -> Self {
        let vertices = positions
            .iter()
            .zip(colors)
            .map(|(&position, &[r, g, b])| Vertex {
                position,
                normal: [0.0, 1.0, 0.0],
                uv: [0.0, 0.0],
                color: [r, g, b, 1.0],
            })
            .collect::<Vec<_>>();
        let indices = (0..vertices.len() as u32).collect();
        Self {
            vertices,
            indices,
            topology: Topology::Points,
        }
    }

    /// Distance from the local origin to the farthest vertex.
    pub fn bounding_radius(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| glm::length(&glm::make_vec3(&v.position)))
            .fold(0.0, f32::max)
    }

    /// Axis-aligned bounds in local space, `(min, max)`. Empty meshes give zeros.
    pub fn bounds(&self) -> (glm::Vec3, glm::Vec3) {
        let mut vertices = self.vertices.iter().map(|v| glm::make_vec3(&v.position));
        let Some(first) = vertices.next() else {
            return (glm::Vec3::zeros(), glm::Vec3::zeros());
        };
        vertices.fold((first, first), |(min, max), p| (glm::min2(&min, &p), glm::max2(&max, &p)))
    }

    /// Unique undirected edges of the triangles, as a line-list index buffer.
    ///
    /// Points meshes have no edges and return their point indices unchanged.
    pub fn edge_indices(&self) -> Vec<u32> {
        if self.topology == Topology::Points {
            return self.indices.clone();
        }

        let mut seen = std::collections::HashSet::new();
        let mut lines = Vec::new();
        for triangle in self.indices.chunks_exact(3) {
            for (a, b) in [
                (triangle[0], triangle[1]),
                (triangle[1], triangle[2]),
                (triangle[2], triangle[0]),
            ] {
                // Positions, not indices: split vertices along a crease are one edge.
                let key = edge_key(&self.vertices[a as usize], &self.vertices[b as usize]);
                if seen.insert(key) {
                    lines.extend_from_slice(&[a, b]);
                }
            }
        }
        lines
    }
}

type EdgeKey = ([u32; 3], [u32; 3]);

fn edge_key(a: &Vertex, b: &Vertex) -> EdgeKey {
    let bits = |v: &Vertex| v.position.map(|c| (c + 0.0).to_bits());
    let (a, b) = (bits(a), bits(b));
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
