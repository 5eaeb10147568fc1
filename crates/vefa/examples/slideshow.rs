//! Slideshow — prototype spawning from `init()`.
//!
//! `Slideshow` spawns copies of the `Slide` prototype as children while the
//! scene loads. More copies are spawned at runtime with `Scene::spawn`, and
//! one is destroyed again.
//!
//! Run with: `cargo run -p vefa --example slideshow`

use vefa::prelude::*;

const SCENE: &str = include_str!("assets/slideshow.json");

fn print_tree(entity: EntityRef<'_>, depth: usize) {
    let components: Vec<_> = entity.components().map(|c| c.id()).collect();
    println!("{:indent$}{} {:?}", "", entity.id(), components, indent = depth * 2);
    for child in entity.children() {
        print_tree(child, depth + 1);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut registry = TypeRegistry::new();
    register_builtin(&mut registry);
    let mut scene = Scene::from_resources(registry, ResourceGraph::from_json(SCENE)?)?;

    for root in scene.graph().roots() {
        print_tree(root, 0);
    }

    for _ in 0..6 {
        scene.update(0.25);
        let show = scene
            .find_entity("World")
            .and_then(|e| e.find_component::<Slideshow>())
            .ok_or("scene has no Slideshow")?;
        println!("showing slide {}", show.current());
    }

    let extra = scene.spawn("Slide")?;
    let named = scene.spawn_as("Slide", "Encore")?;
    println!(
        "spawned {} and {}",
        scene.graph().entity(extra).map(|e| e.id()).unwrap_or("?"),
        scene.graph().entity(named).map(|e| e.id()).unwrap_or("?"),
    );

    if let Err(e) = scene.spawn_as("Slide", "Encore") {
        println!("second spawn_as rejected: {e}");
    }

    scene.destroy(extra);
    println!("{} entities after destroy", scene.graph().entity_count());
    Ok(())
}
