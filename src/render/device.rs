//! Seam between scene code and the GPU.
//!
//! Scene objects never touch wgpu directly: they create resources through a
//! [`GraphicsDevice`] and receive opaque handles, then record their draws
//! into a [`DrawList`] that the backend replays once per frame.

use log::trace;

use crate::geometry::Vertex;
use crate::render::error::ShaderError;

/// Number of texture units a program can sample from.
pub const MAX_TEXTURE_UNITS: usize = 2;

/// Handle to vertex and index buffers owned by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

/// Handle to a linked shader program owned by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub(crate) usize);

/// Handle to an uploaded texture owned by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) usize);

/// Resource factory implemented by each rendering backend.
pub trait GraphicsDevice {
    fn upload_mesh(&mut self, label: &str, vertices: &[Vertex], indices: &[u32]) -> MeshId;

    /// Links a program from already validated WGSL stages. `uniform_size` is
    /// the byte size of the `@group(0) @binding(0)` block.
    fn create_program(
        &mut self,
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
        uniform_size: u64,
    ) -> Result<ProgramId, ShaderError>;

    /// Uploads tightly packed RGBA8 pixels.
    fn upload_texture(&mut self, label: &str, width: u32, height: u32, rgba: &[u8]) -> TextureId;
}

/// Device without a GPU. Hands out sequential handles and keeps counts so
/// scenes can be assembled and exercised headless.
#[derive(Debug, Default)]
pub struct NullDevice {
    meshes: usize,
    programs: usize,
    textures: usize,
}

impl NullDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes
    }

    pub fn program_count(&self) -> usize {
        self.programs
    }

    pub fn texture_count(&self) -> usize {
        self.textures
    }
}

impl GraphicsDevice for NullDevice {
    fn upload_mesh(&mut self, label: &str, vertices: &[Vertex], indices: &[u32]) -> MeshId {
        trace!("{label}: {} vertices, {} indices", vertices.len(), indices.len());
        self.meshes += 1;
        MeshId(self.meshes - 1)
    }

    fn create_program(
        &mut self,
        label: &str,
        _vertex_source: &str,
        _fragment_source: &str,
        uniform_size: u64,
    ) -> Result<ProgramId, ShaderError> {
        trace!("{label}: {uniform_size} uniform bytes");
        self.programs += 1;
        Ok(ProgramId(self.programs - 1))
    }

    fn upload_texture(&mut self, label: &str, width: u32, height: u32, _rgba: &[u8]) -> TextureId {
        trace!("{label}: {width}x{height}");
        self.textures += 1;
        TextureId(self.textures - 1)
    }
}

/// One recorded indexed draw with the state it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub program: ProgramId,
    pub textures: [Option<TextureId>; MAX_TEXTURE_UNITS],
    pub mesh: MeshId,
    pub index_count: u32,
    /// Snapshot of the program's uniform block at draw time.
    pub uniforms: Vec<u8>,
}

/// Per-frame command recorder.
///
/// Tracks the bound program and texture units the same way a GL context
/// would; every draw captures that state.
#[derive(Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
    program: Option<ProgramId>,
    textures: [Option<TextureId>; MAX_TEXTURE_UNITS],
    program_binds: usize,
    skipped: usize,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `program` current. `None` stands for a program that failed to
    /// build; draws are dropped until a usable program is bound.
    pub fn bind_program(&mut self, program: Option<ProgramId>) {
        self.program = program;
        self.program_binds += 1;
    }

    pub fn bind_texture(&mut self, unit: usize, texture: TextureId) {
        if let Some(slot) = self.textures.get_mut(unit) {
            *slot = Some(texture);
        } else {
            trace!("ignoring texture unit {unit}");
        }
    }

    pub fn draw_indexed(&mut self, mesh: MeshId, index_count: u32, uniforms: Vec<u8>) {
        let Some(program) = self.program else {
            self.skipped += 1;
            return;
        };
        self.commands.push(DrawCommand {
            program,
            textures: self.textures,
            mesh,
            index_count,
            uniforms,
        });
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn program_binds(&self) -> usize {
        self.program_binds
    }

    pub fn skipped_draws(&self) -> usize {
        self.skipped
    }
}
