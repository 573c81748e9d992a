use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::render::{DrawList, Model, ShaderProgram, Texture, MAX_TEXTURE_UNITS};
use crate::scene::params::{SceneParameters, MAX_POINT_LIGHTS};
use crate::scene::resources::Resources;

/// A hard-coded thing in the scene: props, lights.
///
/// Each frame the scene calls `update` on every object, then
/// `process_lighting` on every object, then `draw` on every object.
pub trait SceneObject {
    fn name(&self) -> &str;

    fn transform(&self) -> Mat4;

    fn transform_mut(&mut self) -> &mut Mat4;

    /// Builds meshes and loads programs and textures.
    fn init(&mut self, resources: &mut Resources<'_>);

    fn update(&mut self, _dt: f32) {}

    /// Light emitters append their record here; everything else ignores it.
    fn process_lighting(&self, _params: &mut SceneParameters) {}

    fn draw(&self, params: &SceneParameters, list: &mut DrawList);

    fn translate(&mut self, offset: Vec3) {
        *self.transform_mut() *= Mat4::from_translation(offset);
    }

    fn rotate(&mut self, degrees: f32, axis: Vec3) {
        let axis = axis.normalize_or_zero();
        if axis != Vec3::ZERO {
            *self.transform_mut() *= Mat4::from_axis_angle(axis, degrees.to_radians());
        }
    }
}

/// Writes the per-frame uniforms: camera, every point-light slot and the
/// directional light.
pub fn push_scene_uniforms(program: &ShaderProgram, params: &SceneParameters) {
    program.set_mat4("projection", params.projection);
    program.set_mat4("view", params.view);
    program.set_vec3("eyePos", params.camera_position);

    for index in 0..MAX_POINT_LIGHTS {
        let light = params.point_light_or_default(index);
        let base = format!("pointLights[{index}]");
        program.set_vec3(&format!("{base}.Position"), light.position);
        program.set_vec3(&format!("{base}.AmbientColor"), light.ambient);
        program.set_vec3(&format!("{base}.DiffuseColor"), light.diffuse);
        program.set_vec3(&format!("{base}.SpecularColor"), light.specular);
        program.set_float(&format!("{base}.Constant"), light.constant);
        program.set_float(&format!("{base}.Linear"), light.linear);
        program.set_float(&format!("{base}.Quadratic"), light.quadratic);
    }

    let sun = &params.directional;
    program.set_vec3("dirLight.Direction", sun.direction);
    program.set_vec3("dirLight.AmbientColor", sun.ambient);
    program.set_vec3("dirLight.DiffuseColor", sun.diffuse);
    program.set_vec3("dirLight.SpecularColor", sun.specular);
}

/// Models and textures of a lit prop.
#[derive(Debug, Clone, Default)]
pub struct LitBody {
    pub models: Vec<Model>,
    pub textures: Vec<Texture>,
}

impl LitBody {
    /// Draws every model under `transform`. Scene uniforms are pushed only
    /// when the program changes from the previous model's.
    pub fn draw(&self, transform: Mat4, params: &SceneParameters, list: &mut DrawList) {
        let texture_count = self.textures.len().min(MAX_TEXTURE_UNITS);
        let mut bound: Option<&Arc<ShaderProgram>> = None;

        for model in &self.models {
            let program = &model.program;
            if !bound.is_some_and(|last| model.shares_program(last)) {
                program.bind(list);
                push_scene_uniforms(program, params);
                bound = Some(program);
            }

            program.set_int("textureCount", texture_count as i32);
            for (unit, texture) in self.textures.iter().take(MAX_TEXTURE_UNITS).enumerate() {
                texture.bind(unit, list);
            }
            program.set_mat4("model", transform * model.mesh.transform());
            model.mesh.draw(list, program.uniform_bytes());
        }
    }
}
