//! Scene objects and the per-frame update, lighting and draw passes.

pub mod desk;
pub mod object;
pub mod params;
pub mod point_light;
pub mod props;
pub mod resources;

use glam::Vec3;
use log::{debug, info};

use crate::camera::Camera;
use crate::render::DrawList;

pub use desk::desk_scene;
pub use object::{push_scene_uniforms, LitBody, SceneObject};
pub use params::{DirectionalLight, PointLightRecord, SceneParameters, MAX_POINT_LIGHTS};
pub use point_light::PointLight;
pub use props::{Calculator, Charger, Computer, PeanutJar, TableLamp, TableTop};
pub use resources::Resources;

pub const CLEAR_COLOR: Vec3 = Vec3::new(0.2, 0.196, 0.184);

/// Output of one frame: the lighting state it was drawn under and the
/// recorded draws.
#[derive(Debug)]
pub struct Frame {
    pub parameters: SceneParameters,
    pub draws: DrawList,
}

/// Flat list of scene objects, drawn in insertion order.
pub struct Scene {
    objects: Vec<Box<dyn SceneObject>>,
    directional: DirectionalLight,
    clear_color: Vec3,
}

impl Scene {
    pub fn new(directional: DirectionalLight) -> Self {
        Self {
            objects: Vec::new(),
            directional,
            clear_color: CLEAR_COLOR,
        }
    }

    pub fn push(&mut self, object: impl SceneObject + 'static) {
        self.objects.push(Box::new(object));
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> impl Iterator<Item = &dyn SceneObject> + '_ {
        self.objects.iter().map(|object| object.as_ref())
    }

    pub fn clear_color(&self) -> Vec3 {
        self.clear_color
    }

    /// Builds every object's GPU resources. Returns how many loads fell
    /// back to a degraded program or the placeholder texture.
    pub fn init(&mut self, resources: &mut Resources<'_>) -> usize {
        for object in &mut self.objects {
            object.init(resources);
        }
        let failures = resources.failures();
        info!(
            "scene ready: {} objects, {} fallback resources",
            self.objects.len(),
            failures
        );
        failures
    }

    pub fn update(&mut self, dt: f32) {
        for object in &mut self.objects {
            object.update(dt);
        }
    }

    /// Camera state plus the directional light, with no point lights yet.
    pub fn parameters(&self, camera: &Camera) -> SceneParameters {
        SceneParameters::new(
            camera.projection_matrix(),
            camera.view_matrix(),
            camera.position(),
            self.directional,
        )
    }

    pub fn process_lighting(&self, params: &mut SceneParameters) {
        for object in &self.objects {
            object.process_lighting(params);
        }
    }

    pub fn draw(&self, params: &SceneParameters, list: &mut DrawList) {
        for object in &self.objects {
            object.draw(params, list);
        }
    }

    /// Runs update, then lighting over every object, then drawing over
    /// every object.
    pub fn frame(&mut self, camera: &Camera, dt: f32) -> Frame {
        self.update(dt);
        let mut parameters = self.parameters(camera);
        self.process_lighting(&mut parameters);
        let mut draws = DrawList::new();
        self.draw(&parameters, &mut draws);
        debug!(
            "frame: {} lights, {} draws, {} program switches",
            parameters.point_lights().len(),
            draws.commands().len(),
            draws.program_binds()
        );
        Frame { parameters, draws }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(DirectionalLight::default())
    }
}
