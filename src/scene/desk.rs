use glam::Vec3;

use crate::scene::object::SceneObject;
use crate::scene::params::DirectionalLight;
use crate::scene::point_light::PointLight;
use crate::scene::props::{Calculator, Charger, Computer, PeanutJar, TableLamp, TableTop};
use crate::scene::Scene;

/// The white key light to the left of the desk.
pub fn key_light() -> PointLight {
    let mut light = PointLight::new("key light")
        .with_colors(Vec3::ZERO, Vec3::ONE, Vec3::ONE)
        .with_attenuation(1.0, 0.35, 0.44);
    light.translate(Vec3::new(-2.0, 1.0, 1.0));
    light
}

/// The long-range red light to the right of the desk.
pub fn fill_light() -> PointLight {
    let red = Vec3::new(1.0, 0.0, 0.0);
    let mut light = PointLight::new("fill light")
        .with_colors(Vec3::ZERO, red, red)
        .with_attenuation(1.0, 0.007, 0.0002);
    light.translate(Vec3::new(2.0, 0.0, 1.0));
    light
}

/// Assembles the desk: two point lights followed by six props.
pub fn desk_scene() -> Scene {
    let mut scene = Scene::new(DirectionalLight::default());
    scene.push(key_light());
    scene.push(fill_light());

    scene.push(TableTop::new());

    let mut computer = Computer::new();
    computer.translate(Vec3::new(0.0, 0.0, 0.25));
    scene.push(computer);

    let mut jar = PeanutJar::new();
    jar.translate(Vec3::new(1.5, -0.46, 0.0));
    jar.rotate(90.0, Vec3::X);
    scene.push(jar);

    let mut lamp = TableLamp::new();
    lamp.translate(Vec3::new(0.0, -0.844, 0.0));
    scene.push(lamp);

    let mut charger = Charger::new();
    charger.translate(Vec3::new(-1.8, -0.975, 0.0));
    charger.rotate(45.0, Vec3::Y);
    scene.push(charger);

    let mut calculator = Calculator::new();
    calculator.translate(Vec3::new(-1.8, -0.975, 1.0));
    scene.push(calculator);

    scene
}
