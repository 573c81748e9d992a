//! Procedural geometry for the primitive shapes used by the scene.
//!
//! Every builder returns a [`Geometry`] buffer of interleaved [`Vertex`]
//! values plus triangle indices with counter-clockwise winding. Normals
//! authored here are provisional: [`Geometry::recompute_face_normals`]
//! replaces them when a mesh is built.

use std::f32::consts::TAU;
use std::mem::offset_of;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Smallest sector count that still closes a cylinder.
pub const MIN_CYLINDER_SECTORS: u32 = 3;

/// Interleaved vertex uploaded verbatim to the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const POSITION_OFFSET: u64 = offset_of!(Vertex, position) as u64;
    pub const COLOR_OFFSET: u64 = offset_of!(Vertex, color) as u64;
    pub const NORMAL_OFFSET: u64 = offset_of!(Vertex, normal) as u64;
    pub const UV_OFFSET: u64 = offset_of!(Vertex, uv) as u64;
    pub const STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;

    const fn new(position: [f32; 3], color: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            color,
            normal: [0.0; 3],
            uv,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }
}

/// Vertex and index arrays describing one mesh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Overwrites every vertex color.
    pub fn with_color(mut self, color: Vec3) -> Self {
        for vertex in &mut self.vertices {
            vertex.color = color.to_array();
        }
        self
    }

    /// Assigns each triangle's face normal to its three corners.
    ///
    /// Corners shared between triangles keep the normal of the last triangle
    /// that references them, so shading stays faceted.
    pub fn recompute_face_normals(&mut self) {
        for triangle in self.indices.chunks_exact(3) {
            let [a, b, c] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            let normal = face_normal(
                self.vertices[a].position(),
                self.vertices[b].position(),
                self.vertices[c].position(),
            )
            .to_array();
            self.vertices[a].normal = normal;
            self.vertices[b].normal = normal;
            self.vertices[c].normal = normal;
        }
    }
}

/// Right-handed normal of the triangle `p1, p2, p3`.
pub fn face_normal(p1: Vec3, p2: Vec3, p3: Vec3) -> Vec3 {
    (p2 - p1).cross(p3 - p1).normalize_or_zero()
}

/// Unit cube centred on the origin, one color per face.
pub fn cube() -> Geometry {
    Geometry::new(CUBE_VERTICES.to_vec(), CUBE_INDICES.to_vec())
}

/// Unit quad lying at `y = -0.5`, facing +Y.
pub fn plane() -> Geometry {
    Geometry::new(PLANE_VERTICES.to_vec(), PLANE_INDICES.to_vec())
}

/// Square pyramid with its base on `y = 0` and apex at `(0, 1, 0)`.
pub fn pyramid() -> Geometry {
    Geometry::new(PYRAMID_VERTICES.to_vec(), PYRAMID_INDICES.to_vec())
}

/// Points on the unit circle in the XY plane; the first point is repeated at
/// the end so that rings close without wrap-around indexing.
fn unit_circle(sector_count: u32) -> Vec<Vec3> {
    let step = TAU / sector_count as f32;
    (0..=sector_count)
        .map(|i| {
            let angle = i as f32 * step;
            Vec3::new(angle.cos(), angle.sin(), 0.0)
        })
        .collect()
}

/// Cylinder along the Z axis, centred on the origin.
///
/// Layout: bottom side ring, top side ring, then the bottom cap (center
/// followed by its ring) and the top cap. Each ring holds
/// `sector_count + 1` vertices.
///
/// Side normals are authored as the outward ring direction, but mesh builds
/// recompute them per face, so the side renders faceted.
pub fn cylinder(sector_count: u32, base_radius: f32, height: f32) -> Geometry {
    let sectors = sector_count.max(MIN_CYLINDER_SECTORS);
    if sectors != sector_count {
        log::warn!("cylinder needs at least {MIN_CYLINDER_SECTORS} sectors, got {sector_count}");
    }
    let circle = unit_circle(sectors);
    let ring_len = sectors + 1;
    let mut vertices = Vec::with_capacity((4 * ring_len + 2) as usize);
    let mut indices = Vec::with_capacity((12 * sectors) as usize);

    for ring in 0..2 {
        let z = -height / 2.0 + ring as f32 * height;
        let v = 1.0 - ring as f32;
        for (i, dir) in circle.iter().enumerate() {
            vertices.push(Vertex {
                position: [dir.x * base_radius, dir.y * base_radius, z],
                color: stripe_color(i),
                normal: dir.to_array(),
                uv: [i as f32 / sectors as f32, v],
            });
        }
    }

    let bottom_center = vertices.len() as u32;
    let top_center = bottom_center + ring_len + 1;

    for cap in 0..2 {
        let z = -height / 2.0 + cap as f32 * height;
        let nz = -1.0 + cap as f32 * 2.0;
        vertices.push(Vertex {
            position: [0.0, 0.0, z],
            color: [1.0; 3],
            normal: [0.0, 0.0, nz],
            uv: [0.5, 0.5],
        });
        for (i, dir) in circle.iter().enumerate() {
            vertices.push(Vertex {
                position: [dir.x * base_radius, dir.y * base_radius, z],
                color: stripe_color(i),
                normal: [0.0, 0.0, nz],
                uv: [-dir.x * 0.5 + 0.5, -dir.y * 0.5 + 0.5],
            });
        }
    }

    let mut k1 = 0;
    let mut k2 = ring_len;
    for _ in 0..sectors {
        indices.extend_from_slice(&[k1, k1 + 1, k2]);
        indices.extend_from_slice(&[k2, k1 + 1, k2 + 1]);
        k1 += 1;
        k2 += 1;
    }

    // bottom fan winds clockwise seen from +Z so it faces -Z
    for i in 0..sectors {
        let k = bottom_center + 1 + i;
        indices.extend_from_slice(&[bottom_center, k + 1, k]);
    }

    for i in 0..sectors {
        let k = top_center + 1 + i;
        indices.extend_from_slice(&[top_center, k, k + 1]);
    }

    Geometry::new(vertices, indices)
}

fn stripe_color(index: usize) -> [f32; 3] {
    if index % 3 == 0 {
        [1.0; 3]
    } else {
        [0.0; 3]
    }
}

const RED: [f32; 3] = [1.0, 0.0, 0.0];
const GREEN: [f32; 3] = [0.0, 1.0, 0.0];
const CYAN: [f32; 3] = [0.0, 1.0, 1.0];
const MAGENTA: [f32; 3] = [1.0, 0.0, 1.0];
const YELLOW: [f32; 3] = [1.0, 1.0, 0.0];
const BLUE: [f32; 3] = [0.0, 0.0, 1.0];

#[rustfmt::skip]
const CUBE_VERTICES: [Vertex; 24] = [
    // front (+z)
    Vertex::new([-0.5, 0.5, 0.5], RED, [0.0, 1.0]),
    Vertex::new([-0.5, -0.5, 0.5], RED, [0.0, 0.0]),
    Vertex::new([0.5, -0.5, 0.5], RED, [1.0, 0.0]),
    Vertex::new([0.5, 0.5, 0.5], RED, [1.0, 1.0]),
    // right (+x)
    Vertex::new([0.5, 0.5, 0.5], GREEN, [0.0, 1.0]),
    Vertex::new([0.5, -0.5, 0.5], GREEN, [0.0, 0.0]),
    Vertex::new([0.5, -0.5, -0.5], GREEN, [1.0, 0.0]),
    Vertex::new([0.5, 0.5, -0.5], GREEN, [1.0, 1.0]),
    // back (-z)
    Vertex::new([0.5, 0.5, -0.5], CYAN, [0.0, 1.0]),
    Vertex::new([0.5, -0.5, -0.5], CYAN, [0.0, 0.0]),
    Vertex::new([-0.5, -0.5, -0.5], CYAN, [1.0, 0.0]),
    Vertex::new([-0.5, 0.5, -0.5], CYAN, [1.0, 1.0]),
    // left (-x)
    Vertex::new([-0.5, 0.5, -0.5], MAGENTA, [0.0, 1.0]),
    Vertex::new([-0.5, -0.5, -0.5], MAGENTA, [0.0, 0.0]),
    Vertex::new([-0.5, -0.5, 0.5], MAGENTA, [1.0, 0.0]),
    Vertex::new([-0.5, 0.5, 0.5], MAGENTA, [1.0, 1.0]),
    // top (+y)
    Vertex::new([-0.5, 0.5, -0.5], YELLOW, [0.0, 1.0]),
    Vertex::new([-0.5, 0.5, 0.5], YELLOW, [0.0, 0.0]),
    Vertex::new([0.5, 0.5, 0.5], YELLOW, [1.0, 0.0]),
    Vertex::new([0.5, 0.5, -0.5], YELLOW, [1.0, 1.0]),
    // bottom (-y)
    Vertex::new([0.5, -0.5, 0.5], BLUE, [0.0, 1.0]),
    Vertex::new([0.5, -0.5, -0.5], BLUE, [0.0, 0.0]),
    Vertex::new([-0.5, -0.5, -0.5], BLUE, [1.0, 0.0]),
    Vertex::new([-0.5, -0.5, 0.5], BLUE, [1.0, 1.0]),
];

#[rustfmt::skip]
const CUBE_INDICES: [u32; 36] = [
    0, 1, 3, 1, 2, 3, // front
    4, 5, 7, 5, 6, 7, // right
    8, 9, 11, 9, 10, 11, // back
    12, 13, 15, 13, 14, 15, // left
    16, 17, 19, 17, 18, 19, // top
    20, 23, 21, 21, 23, 22, // bottom
];

const PLANE_VERTICES: [Vertex; 4] = [
    Vertex::new([0.5, -0.5, 0.5], BLUE, [0.0, 1.0]),
    Vertex::new([0.5, -0.5, -0.5], BLUE, [0.0, 0.0]),
    Vertex::new([-0.5, -0.5, -0.5], BLUE, [1.0, 0.0]),
    Vertex::new([-0.5, -0.5, 0.5], BLUE, [1.0, 1.0]),
];

const PLANE_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

#[rustfmt::skip]
const PYRAMID_VERTICES: [Vertex; 16] = [
    // front
    Vertex::new([-0.5, 0.0, 0.5], BLUE, [0.0, 0.0]),
    Vertex::new([0.0, 1.0, 0.0], BLUE, [0.5, 1.0]),
    Vertex::new([0.5, 0.0, 0.5], BLUE, [1.0, 0.0]),
    // right
    Vertex::new([0.5, 0.0, 0.5], BLUE, [0.0, 0.0]),
    Vertex::new([0.0, 1.0, 0.0], BLUE, [0.5, 1.0]),
    Vertex::new([0.5, 0.0, -0.5], BLUE, [1.0, 0.0]),
    // back
    Vertex::new([0.5, 0.0, -0.5], BLUE, [0.0, 0.0]),
    Vertex::new([0.0, 1.0, 0.0], BLUE, [0.5, 1.0]),
    Vertex::new([-0.5, 0.0, -0.5], BLUE, [1.0, 0.0]),
    // left
    Vertex::new([-0.5, 0.0, -0.5], BLUE, [0.0, 0.0]),
    Vertex::new([0.0, 1.0, 0.0], BLUE, [0.5, 1.0]),
    Vertex::new([-0.5, 0.0, 0.5], BLUE, [1.0, 0.0]),
    // base
    Vertex::new([-0.5, 0.0, -0.5], BLUE, [0.0, 0.0]),
    Vertex::new([-0.5, 0.0, 0.5], BLUE, [0.0, 1.0]),
    Vertex::new([0.5, 0.0, -0.5], BLUE, [1.0, 0.0]),
    Vertex::new([0.5, 0.0, 0.5], BLUE, [1.0, 1.0]),
];

#[rustfmt::skip]
const PYRAMID_INDICES: [u32; 18] = [
    2, 1, 0, // front
    5, 4, 3, // right
    8, 7, 6, // back
    11, 10, 9, // left
    14, 13, 12, // base
    14, 15, 13,
];
