use std::collections::HashMap;
use std::sync::Arc;

use log::{error, warn};

use crate::assets::AssetLoader;
use crate::geometry::Geometry;
use crate::render::{GraphicsDevice, Mesh, ShaderProgram, Texture};

/// Everything a scene object needs while building its models.
///
/// Load failures never surface here: they are logged and replaced by a
/// degraded program or the placeholder texture.
pub struct Resources<'a> {
    device: &'a mut dyn GraphicsDevice,
    assets: &'a AssetLoader,
    programs: HashMap<String, Arc<ShaderProgram>>,
    textures: HashMap<String, Texture>,
    placeholder: Option<Texture>,
    failures: usize,
}

impl<'a> Resources<'a> {
    pub fn new(device: &'a mut dyn GraphicsDevice, assets: &'a AssetLoader) -> Self {
        Self {
            device,
            assets,
            programs: HashMap::new(),
            textures: HashMap::new(),
            placeholder: None,
            failures: 0,
        }
    }

    /// Loads `<root>/shaders/<name>.{vert,frag}.wgsl`. Every request for the
    /// same name returns the same program.
    pub fn program(&mut self, name: &str) -> Arc<ShaderProgram> {
        if let Some(program) = self.programs.get(name) {
            return Arc::clone(program);
        }
        let program = match self.assets.shader_sources(name) {
            Ok(sources) => ShaderProgram::compile(
                &mut *self.device,
                name,
                &sources.vertex,
                &sources.fragment,
            ),
            Err(err) => {
                error!("{}", error_chain(&err));
                ShaderProgram::degraded(name)
            }
        };
        if !program.is_linked() {
            self.failures += 1;
        }
        let program = Arc::new(program);
        self.programs.insert(name.to_string(), Arc::clone(&program));
        program
    }

    /// Loads `<root>/textures/<file>`, falling back to the shared
    /// placeholder. Each file is decoded and uploaded once.
    pub fn texture(&mut self, file: &str) -> Texture {
        if let Some(texture) = self.textures.get(file) {
            return texture.clone();
        }
        let path = self.assets.texture_path(file);
        let texture = match Texture::load(&mut *self.device, &path) {
            Ok(texture) => texture,
            Err(err) => {
                warn!("{}; using placeholder", error_chain(&err));
                self.failures += 1;
                self.placeholder()
            }
        };
        self.textures.insert(file.to_string(), texture.clone());
        texture
    }

    pub fn placeholder(&mut self) -> Texture {
        if let Some(texture) = &self.placeholder {
            return texture.clone();
        }
        let texture = Texture::placeholder(&mut *self.device);
        self.placeholder = Some(texture.clone());
        texture
    }

    pub fn mesh(&mut self, label: &str, geometry: Geometry) -> Mesh {
        Mesh::build(&mut *self.device, label, geometry)
    }

    /// Number of programs and textures that fell back so far.
    pub fn failures(&self) -> usize {
        self.failures
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::cube;
    use crate::render::NullDevice;
    use std::fs;
    use tempfile::tempdir;

    const VERTEX: &str = "@vertex fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> { return vec4<f32>(p, 1.0); }";
    const FRAGMENT: &str = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";

    #[test]
    fn programs_are_shared_by_name() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("shaders")).unwrap();
        fs::write(dir.path().join("shaders/flat.vert.wgsl"), VERTEX).unwrap();
        fs::write(dir.path().join("shaders/flat.frag.wgsl"), FRAGMENT).unwrap();

        let assets = AssetLoader::new(dir.path());
        let mut device = NullDevice::new();
        let mut resources = Resources::new(&mut device, &assets);
        let first = resources.program("flat");
        let second = resources.program("flat");
        assert!(first.is_linked());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resources.failures(), 0);
        drop(resources);
        assert_eq!(device.program_count(), 1);
    }

    #[test]
    fn missing_assets_degrade() {
        let dir = tempdir().unwrap();
        let assets = AssetLoader::new(dir.path());
        let mut device = NullDevice::new();
        let mut resources = Resources::new(&mut device, &assets);

        let program = resources.program("basic_lit");
        assert!(!program.is_linked());

        let first = resources.texture("wood2.png");
        let second = resources.texture("plastic1.png");
        assert_eq!(first, second);
        assert_eq!(first.label(), "placeholder");
        assert_eq!(resources.failures(), 3);

        let mesh = resources.mesh("cube", cube());
        assert_eq!(mesh.index_count(), 36);
        drop(resources);
        assert_eq!(device.texture_count(), 1);
    }

    #[test]
    fn textures_are_uploaded_once_per_file() {
        let assets =
            AssetLoader::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("assets"));
        let mut device = NullDevice::new();
        let mut resources = Resources::new(&mut device, &assets);

        let first = resources.texture("plastic2.png");
        let second = resources.texture("plastic2.png");
        let other = resources.texture("plastic1.png");
        assert_eq!(first, second);
        assert_ne!(first.id(), other.id());
        assert_eq!(resources.failures(), 0);
        drop(resources);
        assert_eq!(device.texture_count(), 2);
    }

    #[test]
    fn a_missing_texture_counts_as_one_failure() {
        let dir = tempdir().unwrap();
        let assets = AssetLoader::new(dir.path());
        let mut device = NullDevice::new();
        let mut resources = Resources::new(&mut device, &assets);

        for _ in 0..3 {
            assert_eq!(resources.texture("plastic2.png").label(), "placeholder");
        }
        assert_eq!(resources.failures(), 1);
    }
}
