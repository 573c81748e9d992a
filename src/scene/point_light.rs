use glam::{Mat4, Vec3};

use crate::geometry::cube;
use crate::render::{DrawList, Model};
use crate::scene::object::SceneObject;
use crate::scene::params::{PointLightRecord, SceneParameters};
use crate::scene::resources::Resources;

pub const INDICATOR_PROGRAM: &str = "basic_unlit_color";
const INDICATOR_SCALE: f32 = 0.1;

/// Attenuated point light, drawn as a small unlit white cube.
///
/// Colors and attenuation are plain fields, set when the scene is
/// assembled.
#[derive(Debug, Clone)]
pub struct PointLight {
    name: String,
    transform: Mat4,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    models: Vec<Model>,
}

impl PointLight {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            ambient: Vec3::ZERO,
            diffuse: Vec3::ONE,
            specular: Vec3::ONE,
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
            models: Vec::new(),
        }
    }

    pub fn with_colors(mut self, ambient: Vec3, diffuse: Vec3, specular: Vec3) -> Self {
        self.ambient = ambient;
        self.diffuse = diffuse;
        self.specular = specular;
        self
    }

    pub fn with_attenuation(mut self, constant: f32, linear: f32, quadratic: f32) -> Self {
        self.constant = constant;
        self.linear = linear;
        self.quadratic = quadratic;
        self
    }

    /// World-space position: the translation column of the transform.
    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }

    pub fn record(&self) -> PointLightRecord {
        PointLightRecord {
            position: self.position(),
            ambient: self.ambient,
            diffuse: self.diffuse,
            specular: self.specular,
            constant: self.constant,
            linear: self.linear,
            quadratic: self.quadratic,
        }
    }
}

impl SceneObject for PointLight {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self) -> Mat4 {
        self.transform
    }

    fn transform_mut(&mut self) -> &mut Mat4 {
        &mut self.transform
    }

    fn init(&mut self, resources: &mut Resources<'_>) {
        let program = resources.program(INDICATOR_PROGRAM);
        let mut mesh = resources.mesh(
            &format!("{}-indicator", self.name),
            cube().with_color(Vec3::ONE),
        );
        mesh.scale(Vec3::splat(INDICATOR_SCALE));
        self.models = vec![Model::new(mesh, program)];
    }

    fn process_lighting(&self, params: &mut SceneParameters) {
        params.push_point_light(self.record());
    }

    fn draw(&self, params: &SceneParameters, list: &mut DrawList) {
        for model in &self.models {
            let program = &model.program;
            program.bind(list);
            program.set_mat4("projection", params.projection);
            program.set_mat4("view", params.view);
            program.set_mat4("model", self.transform * model.mesh.transform());
            model.mesh.draw(list, program.uniform_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_uses_translation_and_own_colors() {
        let mut light = PointLight::new("lamp")
            .with_colors(Vec3::splat(0.1), Vec3::X, Vec3::Y)
            .with_attenuation(1.0, 0.35, 0.44);
        light.translate(Vec3::new(-2.0, 1.0, 1.0));
        light.rotate(30.0, Vec3::Y);

        let record = light.record();
        assert!(record.position.abs_diff_eq(Vec3::new(-2.0, 1.0, 1.0), 1e-6));
        assert_eq!(record.ambient, Vec3::splat(0.1));
        assert_eq!(record.diffuse, Vec3::X);
        assert_eq!(record.specular, Vec3::Y);
        assert_eq!((record.constant, record.linear, record.quadratic), (1.0, 0.35, 0.44));
    }

    #[test]
    fn lighting_respects_the_cap() {
        let light = PointLight::new("lamp");
        let mut params = SceneParameters::default();
        for _ in 0..10 {
            light.process_lighting(&mut params);
        }
        assert_eq!(params.point_lights().len(), crate::scene::params::MAX_POINT_LIGHTS);
    }

    #[test]
    fn draws_nothing_before_init() {
        let light = PointLight::new("lamp");
        let mut list = DrawList::new();
        light.draw(&SceneParameters::default(), &mut list);
        assert!(list.commands().is_empty());
        assert_eq!(list.program_binds(), 0);
    }
}
