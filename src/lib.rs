//! A small real-time renderer for a hard-coded desk scene.
//!
//! Scene objects record their draws into a [`render::DrawList`] through the
//! [`render::GraphicsDevice`] seam, so everything above the wgpu backend
//! runs headless against [`render::NullDevice`].

pub mod app;
pub mod assets;
pub mod camera;
pub mod geometry;
pub mod input;
pub mod render;
pub mod scene;

pub use app::{
    handle_input, run_headless, run_interactive, AppConfig, AppControl, Application, FrameClock,
    WindowInitError,
};
pub use assets::AssetLoader;
pub use camera::{Camera, MoveDirection};
pub use geometry::{Geometry, Vertex};
pub use input::{FrameInput, InputEvent, InputState, KeyCode, NamedKey};
pub use render::{
    DrawList, GraphicsDevice, Mesh, Model, NullDevice, ShaderProgram, Texture, WgpuRenderer,
};
pub use scene::{desk_scene, Frame, Resources, Scene, SceneObject, SceneParameters};
