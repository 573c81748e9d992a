pub mod device;
pub mod error;
pub mod mesh;
pub mod model;
pub mod native;
pub mod program;
pub mod texture;
pub mod uniform;

pub use device::{
    DrawCommand, DrawList, GraphicsDevice, MeshId, NullDevice, ProgramId, TextureId,
    MAX_TEXTURE_UNITS,
};
pub use error::{DeviceError, ShaderError, ShaderStage, TextureError};
pub use mesh::Mesh;
pub use model::Model;
pub use native::WgpuRenderer;
pub use program::ShaderProgram;
pub use texture::Texture;
pub use uniform::{UniformBlock, UniformKind, UniformLayout, UniformLocation};
