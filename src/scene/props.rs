//! The static desk props. Each one is a handful of primitive meshes drawn
//! with the lit program and one or two textures.

use glam::{Mat4, Vec3};

use crate::geometry::{cube, cylinder, plane};
use crate::render::{DrawList, Model};
use crate::scene::object::{LitBody, SceneObject};
use crate::scene::params::SceneParameters;
use crate::scene::resources::Resources;

pub const LIT_PROGRAM: &str = "basic_lit";

const CYLINDER_SECTORS: u32 = 32;

macro_rules! lit_prop {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            transform: Mat4,
            body: LitBody,
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    transform: Mat4::IDENTITY,
                    body: LitBody::default(),
                }
            }

            pub fn body(&self) -> &LitBody {
                &self.body
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl SceneObject for $name {
            fn name(&self) -> &str {
                $label
            }

            fn transform(&self) -> Mat4 {
                self.transform
            }

            fn transform_mut(&mut self) -> &mut Mat4 {
                &mut self.transform
            }

            fn init(&mut self, resources: &mut Resources<'_>) {
                self.body = Self::build(resources);
            }

            fn draw(&self, params: &SceneParameters, list: &mut DrawList) {
                self.body.draw(self.transform, params, list);
            }
        }
    };
}

lit_prop!(
    /// Wooden plane the other props stand on.
    TableTop,
    "table top"
);
lit_prop!(
    /// Closed laptop: one flattened cube with a logo decal.
    Computer,
    "computer"
);
lit_prop!(PeanutJar, "peanut jar");
lit_prop!(
    /// Desk lamp: base plate, tilted arm and a short cylindrical visor.
    TableLamp,
    "table lamp"
);
lit_prop!(Charger, "charger");
lit_prop!(
    /// Calculator body resting on four cylindrical feet.
    Calculator,
    "calculator"
);

impl TableTop {
    fn build(resources: &mut Resources<'_>) -> LitBody {
        let program = resources.program(LIT_PROGRAM);
        let mut top = resources.mesh("table-top", plane().with_color(Vec3::ONE));
        top.translate(Vec3::new(0.0, -0.35, 1.0))
            .scale(Vec3::new(5.0, 1.0, 3.5));
        LitBody {
            models: vec![Model::new(top, program)],
            textures: vec![resources.texture("wood2.png")],
        }
    }
}

impl Computer {
    fn build(resources: &mut Resources<'_>) -> LitBody {
        let program = resources.program(LIT_PROGRAM);
        let mut lid = resources.mesh("computer", cube().with_color(Vec3::ONE));
        lid.translate(Vec3::new(0.0, -0.835, 1.0))
            .scale(Vec3::new(2.5, 0.025, 1.8));
        LitBody {
            models: vec![Model::new(lid, program)],
            textures: vec![
                resources.texture("aluminium.png"),
                resources.texture("apple.png"),
            ],
        }
    }
}

impl PeanutJar {
    fn build(resources: &mut Resources<'_>) -> LitBody {
        let program = resources.program(LIT_PROGRAM);
        let jar = || cylinder(CYLINDER_SECTORS, 0.25, 0.75);

        let body = resources.mesh("jar-body", jar().with_color(Vec3::new(0.8, 0.702, 0.302)));
        let mut lid = resources.mesh("jar-lid", jar().with_color(Vec3::new(0.8, 0.2, 0.2)));
        lid.translate(Vec3::new(0.0, 0.0, -0.35))
            .scale(Vec3::new(1.25, 1.15, 0.25));

        LitBody {
            models: vec![
                Model::new(body, program.clone()),
                Model::new(lid, program),
            ],
            textures: vec![resources.texture("plastic2.png")],
        }
    }
}

impl TableLamp {
    fn build(resources: &mut Resources<'_>) -> LitBody {
        let program = resources.program(LIT_PROGRAM);
        let brass = Vec3::new(0.6, 0.42, 0.12);

        let mut base = resources.mesh("lamp-base", cube().with_color(brass));
        base.scale(Vec3::new(0.46, 0.015, 0.36));

        let mut arm = resources.mesh("lamp-arm", cube().with_color(brass));
        arm.translate(Vec3::new(0.0, 0.175, 0.1))
            .rotate(65.0, Vec3::X)
            .scale(Vec3::new(0.46, 0.08, 0.36));

        let mut visor = resources.mesh(
            "lamp-visor",
            cylinder(CYLINDER_SECTORS, 0.1, 0.15).with_color(brass),
        );
        visor
            .translate(Vec3::new(0.0, 0.175, 0.15))
            .rotate(-25.0, Vec3::X);

        LitBody {
            models: vec![
                Model::new(base, program.clone()),
                Model::new(arm, program.clone()),
                Model::new(visor, program),
            ],
            textures: vec![resources.texture("plastic2.png")],
        }
    }
}

impl Charger {
    fn build(resources: &mut Resources<'_>) -> LitBody {
        let program = resources.program(LIT_PROGRAM);

        let mut pin = resources.mesh("charger-pin", cube().with_color(Vec3::ONE));
        pin.translate(Vec3::new(-0.175, 0.175, 0.325))
            .scale(Vec3::splat(0.08));

        let mut body = resources.mesh("charger-body", cube().with_color(Vec3::ONE));
        body.translate(Vec3::new(0.0, 0.175, 0.1))
            .scale(Vec3::new(0.5, 0.1, 0.5));

        LitBody {
            models: vec![Model::new(pin, program.clone()), Model::new(body, program)],
            textures: vec![resources.texture("plastic2.png")],
        }
    }
}

impl Calculator {
    const FEET: [Vec3; 4] = [
        Vec3::new(-0.2, 0.21, 0.55),
        Vec3::new(0.2, 0.21, 0.55),
        Vec3::new(-0.2, 0.21, -0.35),
        Vec3::new(0.2, 0.21, -0.35),
    ];

    fn build(resources: &mut Resources<'_>) -> LitBody {
        let program = resources.program(LIT_PROGRAM);
        let charcoal = Vec3::splat(0.2);

        let mut body = resources.mesh("calculator-body", cube().with_color(charcoal));
        body.translate(Vec3::new(0.0, 0.175, 0.1))
            .scale(Vec3::new(0.5, 0.1, 1.0));

        let mut models = vec![Model::new(body, program.clone())];

        // All four feet reuse one uploaded cylinder.
        let foot = resources.mesh(
            "calculator-foot",
            cylinder(CYLINDER_SECTORS, 0.025, 0.05).with_color(charcoal),
        );
        for offset in Self::FEET {
            let mut mesh = foot.clone();
            mesh.translate(offset).rotate(-90.0, Vec3::X);
            models.push(Model::new(mesh, program.clone()));
        }

        LitBody {
            models,
            textures: vec![resources.texture("plastic1.png")],
        }
    }
}
