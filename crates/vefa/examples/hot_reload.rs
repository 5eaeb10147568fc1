//! Hot Reload — edit a scene file while it runs.
//!
//! Copies the orbit camera scene to a temporary file and watches it. Edit the
//! file (the path is printed at startup): valid edits replace the running
//! scene, broken ones are logged and the previous scene keeps running.
//!
//! Run with: `RUST_LOG=info cargo run -p vefa --example hot_reload`

use std::time::Duration;

use vefa::prelude::*;

const SCENE: &str = include_str!("assets/orbit_camera.json");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let path = std::env::temp_dir().join("vefa_hot_reload.json");
    std::fs::write(&path, SCENE)?;
    println!("watching {}", path.display());

    let mut registry = TypeRegistry::new();
    register_builtin(&mut registry);
    let mut scene = Scene::load_file(registry, &path)?;
    if !scene.watch(WatchConfig::default()) {
        println!("file watching unavailable; the scene will not reload");
    }

    let frame = Duration::from_millis(16);
    loop {
        scene.update(frame.as_secs_f64());
        update_transforms(scene.graph_mut());

        #[cfg(feature = "diagnostics")]
        for event in scene.drain_reload_log() {
            match event.error {
                None => println!("[{:>7.2}s] reloaded {}", event.timestamp_secs, event.path),
                Some(e) => println!("[{:>7.2}s] kept previous scene: {e}", event.timestamp_secs),
            }
        }

        std::thread::sleep(frame);
    }
}
