use glam::{Mat4, Vec3};

/// Upper bound on point lights a frame can carry.
pub const MAX_POINT_LIGHTS: usize = 4;

/// One point light as seen by the shaders this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointLightRecord {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.2, -0.5, 1.0).normalize(),
            ambient: Vec3::new(0.1, 0.2, 0.05),
            diffuse: Vec3::new(1.0, 0.9, 0.9),
            specular: Vec3::new(1.0, 0.9, 0.9),
        }
    }
}

/// Per-frame camera and lighting state shared by every draw.
///
/// Point lights can only be appended, and only up to [`MAX_POINT_LIGHTS`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneParameters {
    pub projection: Mat4,
    pub view: Mat4,
    pub camera_position: Vec3,
    pub directional: DirectionalLight,
    point_lights: Vec<PointLightRecord>,
}

impl SceneParameters {
    pub fn new(
        projection: Mat4,
        view: Mat4,
        camera_position: Vec3,
        directional: DirectionalLight,
    ) -> Self {
        Self {
            projection,
            view,
            camera_position,
            directional,
            point_lights: Vec::with_capacity(MAX_POINT_LIGHTS),
        }
    }

    /// Appends a light. Returns false, leaving the list untouched, once the
    /// cap is reached.
    pub fn push_point_light(&mut self, record: PointLightRecord) -> bool {
        if self.point_lights.len() >= MAX_POINT_LIGHTS {
            return false;
        }
        self.point_lights.push(record);
        true
    }

    pub fn point_lights(&self) -> &[PointLightRecord] {
        &self.point_lights
    }

    /// Light `index`, or a zeroed record for unused slots.
    pub fn point_light_or_default(&self, index: usize) -> PointLightRecord {
        self.point_lights.get(index).copied().unwrap_or_default()
    }
}

impl Default for SceneParameters {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::ZERO, DirectionalLight::default())
    }
}
