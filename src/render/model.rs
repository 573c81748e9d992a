use std::sync::Arc;

use crate::render::mesh::Mesh;
use crate::render::program::ShaderProgram;

/// A mesh paired with the program that draws it.
#[derive(Debug, Clone)]
pub struct Model {
    pub mesh: Mesh,
    pub program: Arc<ShaderProgram>,
}

impl Model {
    pub fn new(mesh: Mesh, program: Arc<ShaderProgram>) -> Self {
        Self { mesh, program }
    }

    /// True when both models draw through the same program instance.
    pub fn shares_program(&self, program: &Arc<ShaderProgram>) -> bool {
        Arc::ptr_eq(&self.program, program)
    }
}
