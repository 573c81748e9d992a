use std::fs;
use std::path::{Path, PathBuf};

use crate::render::error::{ShaderError, ShaderStage};

/// Resolves bundled shader and texture files under one root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLoader {
    root: PathBuf,
}

/// Both stages of a shader program as UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn shader_path(&self, name: &str, stage: ShaderStage) -> PathBuf {
        let extension = match stage {
            ShaderStage::Vertex => "vert.wgsl",
            ShaderStage::Fragment => "frag.wgsl",
        };
        self.root.join("shaders").join(format!("{name}.{extension}"))
    }

    pub fn texture_path(&self, file: &str) -> PathBuf {
        self.root.join("textures").join(file)
    }

    pub fn shader_sources(&self, name: &str) -> Result<ShaderSources, ShaderError> {
        Ok(ShaderSources {
            vertex: self.read_stage(name, ShaderStage::Vertex)?,
            fragment: self.read_stage(name, ShaderStage::Fragment)?,
        })
    }

    fn read_stage(&self, name: &str, stage: ShaderStage) -> Result<String, ShaderError> {
        let path = self.shader_path(name, stage);
        fs::read_to_string(&path).map_err(|source| ShaderError::Read {
            stage,
            path,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_both_stages() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("shaders")).unwrap();
        fs::write(dir.path().join("shaders/flat.vert.wgsl"), "// vertex").unwrap();
        fs::write(dir.path().join("shaders/flat.frag.wgsl"), "// fragment").unwrap();

        let loader = AssetLoader::new(dir.path());
        let sources = loader.shader_sources("flat").unwrap();
        assert_eq!(sources.vertex, "// vertex");
        assert_eq!(sources.fragment, "// fragment");
    }

    #[test]
    fn missing_stage_reports_its_path() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("shaders")).unwrap();
        fs::write(dir.path().join("shaders/flat.vert.wgsl"), "// vertex").unwrap();

        let loader = AssetLoader::new(dir.path());
        match loader.shader_sources("flat") {
            Err(ShaderError::Read { stage, path, .. }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(path.ends_with("shaders/flat.frag.wgsl"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn textures_live_under_textures() {
        let loader = AssetLoader::new("assets");
        assert_eq!(
            loader.texture_path("wood2.png"),
            Path::new("assets/textures/wood2.png")
        );
    }
}
