//! Orbit Camera — dependency-ordered init and input routing.
//!
//! The camera entity lists `OrbitController` before `Transform` and
//! `KeyInput`; the dependency sort still initializes it last. A scripted
//! sequence of key events stands in for a window.
//!
//! Run with: `cargo run -p vefa --example orbit_camera`

use vefa::prelude::*;

const SCENE: &str = include_str!("assets/orbit_camera.json");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut registry = TypeRegistry::new();
    register_builtin(&mut registry);

    let resources = ResourceGraph::from_json(SCENE)?;
    let mut scene = Scene::from_resources(registry, resources)?;
    println!("init order: {:?}", scene.graph().init_order_ids());

    let camera = scene
        .find_entity("Camera")
        .ok_or("scene has no Camera entity")?
        .handle();

    // Hold Right for half a second, then Up for a quarter.
    let script = [
        (0, InputEvent::KeyPressed(Key::Right)),
        (30, InputEvent::KeyReleased(Key::Right)),
        (30, InputEvent::KeyPressed(Key::Up)),
        (45, InputEvent::KeyReleased(Key::Up)),
    ];

    for frame in 0..60 {
        for (_, event) in script.iter().filter(|(at, _)| *at == frame) {
            route_event(scene.graph_mut(), camera, event);
        }
        scene.update(1.0 / 60.0);
        update_transforms(scene.graph_mut());
        clear_frame_state(scene.graph_mut());

        if frame % 15 == 0 {
            let position = scene
                .find_entity("Camera")
                .and_then(|e| e.find_component::<Transform>())
                .map(Transform::global_translation)
                .unwrap_or_default();
            println!(
                "frame {frame:>2}: camera at ({:.2}, {:.2}, {:.2})",
                position.x, position.y, position.z
            );
        }
    }
    Ok(())
}
