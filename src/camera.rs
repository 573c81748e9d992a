use glam::{Mat4, Vec3};

pub const DEFAULT_FOV: f32 = 45.0;
pub const MIN_FOV: f32 = 1.0;
pub const MAX_FOV: f32 = 75.0;
/// Pitch is kept strictly inside ±90° so the look vector never lines up
/// with world-up.
pub const PITCH_LIMIT: f32 = 89.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;
/// Half the visible height of the orthographic view at [`DEFAULT_FOV`].
pub const ORTHO_HALF_HEIGHT: f32 = 2.0;

const DEFAULT_YAW: f32 = -90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Free-fly camera driven by yaw/pitch angles in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    width: u32,
    height: u32,
    position: Vec3,
    yaw: f32,
    pitch: f32,
    fov: f32,
    perspective: bool,
    look: Vec3,
}

impl Camera {
    /// Camera at `position` looking down −Z.
    pub fn new(width: u32, height: u32, position: Vec3, perspective: bool) -> Self {
        let mut camera = Self {
            width,
            height,
            position,
            yaw: DEFAULT_YAW,
            pitch: 0.0,
            fov: DEFAULT_FOV,
            perspective,
            look: Vec3::NEG_Z,
        };
        camera.recompute_look();
        camera
    }

    pub fn move_by(&mut self, direction: MoveDirection, amount: f32) {
        let right = self.look.cross(Vec3::Y).normalize_or_zero();
        let offset = match direction {
            MoveDirection::Forward => self.look,
            MoveDirection::Backward => -self.look,
            MoveDirection::Left => -right,
            MoveDirection::Right => right,
            MoveDirection::Up => Vec3::Y,
            MoveDirection::Down => Vec3::NEG_Y,
        };
        self.position += offset * amount;
    }

    /// Adds already-scaled yaw and pitch deltas, in degrees.
    pub fn rotate_by(&mut self, yaw: f32, pitch: f32) {
        self.yaw += yaw;
        self.pitch = (self.pitch + pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.recompute_look();
    }

    /// Positive deltas zoom in (narrower field of view).
    pub fn increment_zoom(&mut self, delta: f32) {
        self.fov = (self.fov - delta).clamp(MIN_FOV, MAX_FOV);
    }

    pub fn set_perspective(&mut self, perspective: bool) {
        self.perspective = perspective;
    }

    pub fn is_perspective(&self) -> bool {
        self.perspective
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn look(&self) -> Vec3 {
        self.look
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.look, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let aspect = self.aspect_ratio();
        if self.perspective {
            Mat4::perspective_rh(self.fov.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
        } else {
            let half_height = ORTHO_HALF_HEIGHT * self.fov / DEFAULT_FOV;
            let half_width = half_height * aspect;
            Mat4::orthographic_rh(
                -half_width,
                half_width,
                -half_height,
                half_height,
                NEAR_PLANE,
                FAR_PLANE,
            )
        }
    }

    fn recompute_look(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.look = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(800, 600, Vec3::new(0.0, 0.0, 3.0), true)
    }

    #[test]
    fn starts_looking_down_negative_z() {
        let camera = camera();
        assert!(camera.look().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        let eye = camera.view_matrix().transform_point3(camera.position());
        assert!(eye.abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn zero_rotation_changes_nothing() {
        let mut camera = camera();
        camera.rotate_by(12.0, -7.5);
        let before = camera.clone();
        camera.rotate_by(0.0, 0.0);
        assert_eq!(camera.look(), before.look());
        assert_eq!(camera.view_matrix(), before.view_matrix());
    }

    #[test]
    fn forward_then_backward_returns_home() {
        let mut camera = camera();
        camera.rotate_by(33.0, 20.0);
        let start = camera.position();
        camera.move_by(MoveDirection::Forward, 1.25);
        assert!(!camera.position().abs_diff_eq(start, 1e-3));
        camera.move_by(MoveDirection::Backward, 1.25);
        assert!(camera.position().abs_diff_eq(start, 1e-5));
    }

    #[test]
    fn strafing_is_horizontal_and_perpendicular() {
        let mut camera = camera();
        camera.move_by(MoveDirection::Right, 1.0);
        assert!(camera.position().abs_diff_eq(Vec3::new(1.0, 0.0, 3.0), 1e-6));
        camera.move_by(MoveDirection::Left, 2.0);
        assert!(camera.position().abs_diff_eq(Vec3::new(-1.0, 0.0, 3.0), 1e-6));
        camera.move_by(MoveDirection::Up, 0.5);
        camera.move_by(MoveDirection::Down, 0.25);
        assert!((camera.position().y - 0.25).abs() < 1e-6);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = camera();
        camera.rotate_by(0.0, 500.0);
        assert_eq!(camera.pitch(), PITCH_LIMIT);
        assert!(camera.look().y < 1.0);
        camera.move_by(MoveDirection::Right, 1.0);
        assert!(camera.position().is_finite());
        camera.rotate_by(0.0, -1000.0);
        assert_eq!(camera.pitch(), -PITCH_LIMIT);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = camera();
        camera.increment_zoom(100.0);
        assert_eq!(camera.fov(), MIN_FOV);
        camera.increment_zoom(-100.0);
        assert_eq!(camera.fov(), MAX_FOV);
        camera.increment_zoom(30.0);
        assert_eq!(camera.fov(), 45.0);
    }

    #[test]
    fn projection_toggle_switches_matrices() {
        let mut camera = camera();
        let perspective = camera.projection_matrix();
        camera.set_perspective(false);
        assert!(!camera.is_perspective());
        let orthographic = camera.projection_matrix();
        assert_ne!(perspective, orthographic);
        // orthographic projections keep w = 1
        assert_eq!(orthographic.w_axis.w, 1.0);
        assert_eq!(perspective.w_axis.w, 0.0);
    }

    #[test]
    fn orthographic_extent_follows_zoom() {
        let mut camera = camera();
        camera.set_perspective(false);
        let wide = camera.projection_matrix();
        camera.increment_zoom(22.5);
        let narrow = camera.projection_matrix();
        assert!((narrow.y_axis.y / wide.y_axis.y - 2.0).abs() < 1e-5);
    }

    #[test]
    fn aspect_ratio_tracks_resizes() {
        let mut camera = camera();
        camera.set_size(1000, 500);
        assert_eq!(camera.aspect_ratio(), 2.0);
        camera.set_size(1000, 0);
        assert_eq!(camera.aspect_ratio(), 1.0);
        camera.set_size(0, 600);
        assert_eq!(camera.aspect_ratio(), 1.0);
        assert!(camera.projection_matrix().is_finite());
    }
}
