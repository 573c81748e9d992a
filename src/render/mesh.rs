use glam::{Mat4, Vec3};

use crate::geometry::Geometry;
use crate::render::device::{DrawList, GraphicsDevice, MeshId};

/// Uploaded geometry plus a local transform.
///
/// Cloning a mesh shares its GPU buffers; each clone keeps its own
/// transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    label: String,
    id: MeshId,
    index_count: u32,
    transform: Mat4,
}

impl Mesh {
    /// Recomputes face normals and uploads the buffers.
    pub fn build(device: &mut dyn GraphicsDevice, label: &str, mut geometry: Geometry) -> Self {
        geometry.recompute_face_normals();
        let id = device.upload_mesh(label, &geometry.vertices, &geometry.indices);
        Self {
            label: label.to_string(),
            id,
            index_count: geometry.indices.len() as u32,
            transform: Mat4::IDENTITY,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    // The three builders below post-multiply, so the last call applies
    // first to the vertices.
    pub fn translate(&mut self, offset: Vec3) -> &mut Self {
        self.transform *= Mat4::from_translation(offset);
        self
    }

    pub fn rotate(&mut self, degrees: f32, axis: Vec3) -> &mut Self {
        let axis = axis.normalize_or_zero();
        if axis != Vec3::ZERO {
            self.transform *= Mat4::from_axis_angle(axis, degrees.to_radians());
        }
        self
    }

    pub fn scale(&mut self, factors: Vec3) -> &mut Self {
        self.transform *= Mat4::from_scale(factors);
        self
    }

    /// Records an indexed triangle-list draw with the given uniform snapshot.
    pub fn draw(&self, list: &mut DrawList, uniforms: Vec<u8>) {
        list.draw_indexed(self.id, self.index_count, uniforms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{cube, cylinder};
    use crate::render::device::{NullDevice, ProgramId};

    #[test]
    fn build_uploads_and_counts_indices() {
        let mut device = NullDevice::new();
        let mesh = Mesh::build(&mut device, "cube", cube());
        assert_eq!(mesh.index_count(), 36);
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(device.mesh_count(), 1);
        assert_eq!(mesh.transform(), Mat4::IDENTITY);
    }

    #[test]
    fn transforms_compose_like_a_matrix_stack() {
        let mut device = NullDevice::new();
        let mut mesh = Mesh::build(&mut device, "pin", cylinder(8, 0.1, 0.2));
        mesh.translate(Vec3::new(1.0, 0.0, 0.0))
            .scale(Vec3::splat(2.0));
        let point = mesh.transform().transform_point3(Vec3::new(1.0, 1.0, 1.0));
        assert!(point.abs_diff_eq(Vec3::new(3.0, 2.0, 2.0), 1e-6));
    }

    #[test]
    fn clones_share_buffers_but_not_transforms() {
        let mut device = NullDevice::new();
        let mesh = Mesh::build(&mut device, "pin", cylinder(8, 0.1, 0.2));
        let mut moved = mesh.clone();
        moved.rotate(90.0, Vec3::X);
        assert_eq!(moved.id(), mesh.id());
        assert_ne!(moved.transform(), mesh.transform());
        assert_eq!(device.mesh_count(), 1);
    }

    #[test]
    fn draw_records_the_mesh() {
        let mut device = NullDevice::new();
        let mesh = Mesh::build(&mut device, "cube", cube());
        let mut list = DrawList::new();
        list.bind_program(Some(ProgramId(0)));
        mesh.draw(&mut list, Vec::new());
        assert_eq!(list.commands()[0].mesh, mesh.id());
        assert_eq!(list.commands()[0].index_count, 36);
    }
}
