use std::path::Path;

use log::debug;

use crate::render::device::{DrawList, GraphicsDevice, TextureId};
use crate::render::error::TextureError;

/// Handle to an uploaded RGBA texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    label: String,
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    /// Decodes an image file and uploads it, flipped so that uv (0, 0) is
    /// the bottom-left corner.
    pub fn load(device: &mut dyn GraphicsDevice, path: &Path) -> Result<Self, TextureError> {
        let bytes = std::fs::read(path).map_err(|source| TextureError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let image = image::load_from_memory(&bytes).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = image.flipv().to_rgba8();
        let (width, height) = rgba.dimensions();
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("loaded texture {label} ({width}x{height})");
        Ok(Self::from_rgba(device, &label, width, height, rgba.as_raw()))
    }

    /// 1x1 opaque white texture used when a file cannot be loaded.
    pub fn placeholder(device: &mut dyn GraphicsDevice) -> Self {
        Self::from_rgba(device, "placeholder", 1, 1, &[255; 4])
    }

    pub fn from_rgba(
        device: &mut dyn GraphicsDevice,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Self {
        let id = device.upload_texture(label, width, height, rgba);
        Self {
            label: label.to_string(),
            id,
            width,
            height,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bind(&self, unit: usize, list: &mut DrawList) {
        list.bind_texture(unit, self.id);
    }
}
