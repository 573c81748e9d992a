use glam::{Mat4, Vec3};
use log::{debug, error};
use naga::valid::{Capabilities, ValidationFlags, Validator};
use parking_lot::Mutex;

use crate::render::device::{DrawList, GraphicsDevice, ProgramId};
use crate::render::error::{ShaderError, ShaderStage};
use crate::render::uniform::{UniformBlock, UniformLayout, UniformLocation};

/// Entry point every vertex stage must export.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Entry point every fragment stage must export.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// A linked pair of WGSL stages plus the CPU copy of their uniform block.
///
/// Programs are shared between models through `Arc`, so uniform writes go
/// through a lock. A program that failed to build is still a valid value:
/// it has no device handle, binds as "nothing", and swallows every setter.
#[derive(Debug)]
pub struct ShaderProgram {
    label: String,
    id: Option<ProgramId>,
    uniforms: Mutex<UniformBlock>,
}

impl ShaderProgram {
    /// Compiles and links, logging any failure and returning a degraded
    /// program in its place.
    pub fn compile(
        device: &mut dyn GraphicsDevice,
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Self {
        match Self::try_compile(device, label, vertex_source, fragment_source) {
            Ok(program) => program,
            Err(err) => {
                error!("{err}");
                Self::degraded(label)
            }
        }
    }

    pub fn try_compile(
        device: &mut dyn GraphicsDevice,
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        let vertex = parse_stage(label, ShaderStage::Vertex, vertex_source)?;
        let fragment = parse_stage(label, ShaderStage::Fragment, fragment_source)?;

        require_entry_point(label, &vertex, naga::ShaderStage::Vertex, VERTEX_ENTRY)?;
        require_entry_point(label, &fragment, naga::ShaderStage::Fragment, FRAGMENT_ENTRY)?;

        let mut layout = UniformLayout::reflect(&vertex);
        let fragment_layout = UniformLayout::reflect(&fragment);
        if !layout.is_empty()
            && !fragment_layout.is_empty()
            && layout.size() != fragment_layout.size()
        {
            return Err(ShaderError::Link {
                label: label.to_string(),
                message: format!(
                    "uniform block is {} bytes in the vertex stage but {} bytes in the fragment stage",
                    layout.size(),
                    fragment_layout.size()
                ),
            });
        }
        layout.merge(fragment_layout);

        let id = device.create_program(
            label,
            vertex_source,
            fragment_source,
            u64::from(layout.size()),
        )?;
        debug!("linked `{label}` with {} uniforms", layout.len());

        Ok(Self {
            label: label.to_string(),
            id: Some(id),
            uniforms: Mutex::new(UniformBlock::new(layout)),
        })
    }

    /// Program standing in for one that failed to build.
    pub fn degraded(label: &str) -> Self {
        Self {
            label: label.to_string(),
            id: None,
            uniforms: Mutex::new(UniformBlock::new(UniformLayout::default())),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn id(&self) -> Option<ProgramId> {
        self.id
    }

    pub fn is_linked(&self) -> bool {
        self.id.is_some()
    }

    /// Makes this program current for the following draws.
    pub fn bind(&self, list: &mut DrawList) {
        list.bind_program(self.id);
    }

    pub fn set_vec3(&self, name: &str, value: Vec3) {
        self.uniforms.lock().set_vec3(name, value);
    }

    pub fn set_mat4(&self, name: &str, value: Mat4) {
        self.uniforms.lock().set_mat4(name, value);
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.uniforms.lock().set_int(name, value);
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.uniforms.lock().set_float(name, value);
    }

    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.lock().layout().location(name)
    }

    pub fn layout(&self) -> UniformLayout {
        self.uniforms.lock().layout().clone()
    }

    /// Copy of the uniform block as it stands right now.
    pub fn uniform_bytes(&self) -> Vec<u8> {
        self.uniforms.lock().as_bytes().to_vec()
    }
}

fn parse_stage(label: &str, stage: ShaderStage, source: &str) -> Result<naga::Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| ShaderError::Compile {
        label: label.to_string(),
        stage,
        message: err.emit_to_string(source),
    })?;
    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|err| ShaderError::Compile {
            label: label.to_string(),
            stage,
            message: err.emit_to_string(source),
        })?;
    Ok(module)
}

fn require_entry_point(
    label: &str,
    module: &naga::Module,
    stage: naga::ShaderStage,
    name: &str,
) -> Result<(), ShaderError> {
    if module
        .entry_points
        .iter()
        .any(|entry| entry.stage == stage && entry.name == name)
    {
        Ok(())
    } else {
        Err(ShaderError::Link {
            label: label.to_string(),
            message: format!("missing {stage:?} entry point `{name}`"),
        })
    }
}
