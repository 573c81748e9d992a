//! Name-addressed uniform storage.
//!
//! A program's uniforms live in one WGSL struct bound at
//! `@group(0) @binding(0)`. Reflection flattens that struct into GL-style
//! names (`dirLight.Direction`, `pointLights[2].Linear`), each mapped to a
//! byte offset, and [`UniformBlock`] writes values into a CPU copy of the
//! block. Names that do not resolve are ignored.

use std::collections::HashMap;

use bytemuck::Pod;
use glam::{Mat4, Vec3};
use naga::{ArraySize, Handle, Module, ScalarKind, Type, TypeInner, VectorSize};

pub const UNIFORM_GROUP: u32 = 0;
pub const UNIFORM_BINDING: u32 = 0;

/// Value type stored at a uniform location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Int,
    Uint,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    fn from_type(inner: &TypeInner) -> Option<Self> {
        match *inner {
            TypeInner::Scalar(scalar) if scalar.width == 4 => match scalar.kind {
                ScalarKind::Float => Some(Self::Float),
                ScalarKind::Sint => Some(Self::Int),
                ScalarKind::Uint => Some(Self::Uint),
                _ => None,
            },
            TypeInner::Vector { size, scalar }
                if scalar.kind == ScalarKind::Float && scalar.width == 4 =>
            {
                Some(match size {
                    VectorSize::Bi => Self::Vec2,
                    VectorSize::Tri => Self::Vec3,
                    VectorSize::Quad => Self::Vec4,
                })
            }
            TypeInner::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Quad,
                scalar,
            } if scalar.width == 4 => Some(Self::Mat4),
            _ => None,
        }
    }

    fn byte_size(self) -> u32 {
        match self {
            Self::Float | Self::Int | Self::Uint => 4,
            Self::Vec2 => 8,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
        }
    }
}

/// Resolved uniform slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLocation {
    pub offset: u32,
    pub kind: UniformKind,
}

/// Flattened name → location table of one uniform block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformLayout {
    locations: HashMap<String, UniformLocation>,
    size: u32,
}

impl UniformLayout {
    /// Reflects the uniform block declared by a parsed WGSL module. Modules
    /// without one produce an empty layout.
    pub fn reflect(module: &Module) -> Self {
        let mut layout = Self::default();
        for (_, var) in module.global_variables.iter() {
            let bound = var
                .binding
                .as_ref()
                .is_some_and(|b| b.group == UNIFORM_GROUP && b.binding == UNIFORM_BINDING);
            if var.space != naga::AddressSpace::Uniform || !bound {
                continue;
            }
            match &module.types[var.ty].inner {
                TypeInner::Struct { span, .. } => {
                    layout.size = *span;
                    layout.collect(module, var.ty, String::new(), 0);
                }
                _ => {
                    let name = var.name.clone().unwrap_or_default();
                    layout.collect(module, var.ty, name, 0);
                    layout.size = layout
                        .locations
                        .values()
                        .map(|loc| loc.offset + loc.kind.byte_size())
                        .max()
                        .unwrap_or(0)
                        .next_multiple_of(16);
                }
            }
        }
        layout
    }

    fn collect(&mut self, module: &Module, ty: Handle<Type>, path: String, offset: u32) {
        match &module.types[ty].inner {
            TypeInner::Struct { members, .. } => {
                for member in members {
                    let Some(name) = member.name.as_deref() else {
                        continue;
                    };
                    let path = if path.is_empty() {
                        name.to_string()
                    } else {
                        format!("{path}.{name}")
                    };
                    self.collect(module, member.ty, path, offset + member.offset);
                }
            }
            TypeInner::Array {
                base,
                size: ArraySize::Constant(count),
                stride,
            } => {
                for i in 0..count.get() {
                    self.collect(module, *base, format!("{path}[{i}]"), offset + i * stride);
                }
            }
            inner => {
                if let Some(kind) = UniformKind::from_type(inner) {
                    self.locations.insert(path, UniformLocation { offset, kind });
                }
            }
        }
    }

    /// Adds the locations of another stage's view of the same block.
    pub fn merge(&mut self, other: UniformLayout) {
        self.size = self.size.max(other.size);
        for (name, location) in other.locations {
            self.locations.entry(name).or_insert(location);
        }
    }

    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        self.locations.get(name).copied()
    }

    /// Byte size of the whole block.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    fn read<T: Pod>(&self, bytes: &[u8], name: &str, kind: UniformKind) -> Option<T> {
        let location = self.location(name).filter(|loc| loc.kind == kind)?;
        let start = location.offset as usize;
        let slice = bytes.get(start..start + std::mem::size_of::<T>())?;
        Some(bytemuck::pod_read_unaligned(slice))
    }

    /// Decodes a `vec3<f32>` from a block snapshot.
    pub fn read_vec3(&self, bytes: &[u8], name: &str) -> Option<Vec3> {
        self.read::<[f32; 3]>(bytes, name, UniformKind::Vec3)
            .map(Vec3::from_array)
    }

    pub fn read_mat4(&self, bytes: &[u8], name: &str) -> Option<Mat4> {
        self.read::<[f32; 16]>(bytes, name, UniformKind::Mat4)
            .map(|cols| Mat4::from_cols_array(&cols))
    }

    pub fn read_float(&self, bytes: &[u8], name: &str) -> Option<f32> {
        self.read(bytes, name, UniformKind::Float)
    }

    pub fn read_int(&self, bytes: &[u8], name: &str) -> Option<i32> {
        self.read(bytes, name, UniformKind::Int)
    }
}

/// CPU copy of a uniform block, written by name.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    layout: UniformLayout,
    bytes: Vec<u8>,
}

impl UniformBlock {
    pub fn new(layout: UniformLayout) -> Self {
        let bytes = vec![0; layout.size() as usize];
        Self { layout, bytes }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.write(name, UniformKind::Float, bytemuck::bytes_of(&value));
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        self.write(name, UniformKind::Int, bytemuck::bytes_of(&value));
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.write(name, UniformKind::Vec3, bytemuck::bytes_of(&value.to_array()));
    }

    pub fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.write(
            name,
            UniformKind::Mat4,
            bytemuck::bytes_of(&value.to_cols_array()),
        );
    }

    // Unknown names and mismatched kinds fall through silently.
    fn write(&mut self, name: &str, kind: UniformKind, data: &[u8]) {
        let Some(location) = self.layout.location(name) else {
            return;
        };
        if location.kind != kind {
            return;
        }
        let start = location.offset as usize;
        if let Some(target) = self.bytes.get_mut(start..start + data.len()) {
            target.copy_from_slice(data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
struct Light {
    Position: vec3<f32>,
    Constant: f32,
    DiffuseColor: vec3<f32>,
    Linear: f32,
}

struct Uniforms {
    projection: mat4x4<f32>,
    eyePos: vec3<f32>,
    textureCount: i32,
    lights: array<Light, 2>,
}

@group(0) @binding(0)
var<uniform> u: Uniforms;

@vertex
fn vs_main() -> @builtin(position) vec4<f32> {
    return u.projection * vec4<f32>(u.eyePos, 1.0);
}
"#;

    fn layout() -> UniformLayout {
        let module = naga::front::wgsl::parse_str(SOURCE).expect("valid wgsl");
        UniformLayout::reflect(&module)
    }

    #[test]
    fn reflection_flattens_nested_names() {
        let layout = layout();
        assert_eq!(layout.size(), 144);
        assert_eq!(
            layout.location("projection"),
            Some(UniformLocation {
                offset: 0,
                kind: UniformKind::Mat4
            })
        );
        assert_eq!(layout.location("eyePos").map(|l| l.offset), Some(64));
        assert_eq!(
            layout.location("textureCount"),
            Some(UniformLocation {
                offset: 76,
                kind: UniformKind::Int
            })
        );
        assert_eq!(layout.location("lights[0].Position").map(|l| l.offset), Some(80));
        assert_eq!(
            layout.location("lights[1].Linear"),
            Some(UniformLocation {
                offset: 140,
                kind: UniformKind::Float
            })
        );
        assert_eq!(layout.len(), 3 + 2 * 4);
    }

    #[test]
    fn module_without_uniforms_has_empty_layout() {
        let module = naga::front::wgsl::parse_str(
            "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }",
        )
        .expect("valid wgsl");
        let layout = UniformLayout::reflect(&module);
        assert!(layout.is_empty());
        assert_eq!(layout.size(), 0);
    }

    #[test]
    fn setters_round_trip_through_the_layout() {
        let mut block = UniformBlock::new(layout());
        let matrix = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        block.set_mat4("projection", matrix);
        block.set_vec3("lights[1].DiffuseColor", Vec3::new(1.0, 0.0, 0.0));
        block.set_float("lights[0].Constant", 1.0);
        block.set_int("textureCount", 2);

        let layout = block.layout().clone();
        let bytes = block.as_bytes();
        assert_eq!(layout.read_mat4(bytes, "projection"), Some(matrix));
        assert_eq!(
            layout.read_vec3(bytes, "lights[1].DiffuseColor"),
            Some(Vec3::X)
        );
        assert_eq!(layout.read_float(bytes, "lights[0].Constant"), Some(1.0));
        assert_eq!(layout.read_int(bytes, "textureCount"), Some(2));
    }

    #[test]
    fn unknown_names_leave_the_block_untouched() {
        let mut block = UniformBlock::new(layout());
        block.set_vec3("eyePos", Vec3::new(4.0, 5.0, 6.0));
        let before = block.as_bytes().to_vec();

        block.set_vec3("eyePosition", Vec3::ONE);
        block.set_float("lights[2].Linear", 0.5);
        block.set_mat4("view", Mat4::IDENTITY);

        assert_eq!(block.as_bytes(), before.as_slice());
    }

    #[test]
    fn mismatched_kinds_are_ignored() {
        let mut block = UniformBlock::new(layout());
        block.set_float("eyePos", 3.0);
        block.set_int("lights[0].Linear", 7);
        assert!(block.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn merge_keeps_locations_from_both_stages() {
        let mut first = UniformLayout::default();
        first.locations.insert(
            "model".into(),
            UniformLocation {
                offset: 0,
                kind: UniformKind::Mat4,
            },
        );
        first.size = 64;
        let mut combined = layout();
        combined.merge(first);
        assert!(combined.location("model").is_some());
        assert!(combined.location("eyePos").is_some());
        assert_eq!(combined.size(), 144);
    }
}
