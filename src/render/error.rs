use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage a shader source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// Failures while loading, compiling or linking a shader program.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("unable to read {stage} shader {}", path.display())]
    Read {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} shader of `{label}` failed to compile:\n{message}")]
    Compile {
        label: String,
        stage: ShaderStage,
        message: String,
    },
    #[error("shader program `{label}` failed to link: {message}")]
    Link { label: String, message: String },
}

/// Failures while loading a texture image.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("unable to read texture {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to decode texture {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Failures while bringing up the GPU for a window.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("window has zero area")]
    ZeroSizedWindow,
    #[error("surface reports no supported texture formats")]
    NoSurfaceFormat,
    #[error("unable to create rendering surface")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("unable to create GPU device")]
    Device(#[from] wgpu::RequestDeviceError),
}
