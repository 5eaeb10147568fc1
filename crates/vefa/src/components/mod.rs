//! Built-in component types.
//!
//! | type              | depends on             | purpose                               |
//! |-------------------|------------------------|---------------------------------------|
//! | `Transform`       |                        | local transform + world matrix        |
//! | `KeyInput`        |                        | keyboard / pointer state              |
//! | `OrbitController` | `Transform`, `KeyInput`| keyboard-driven orbit camera          |
//! | `Slideshow`       |                        | spawns prototype copies as children   |

pub mod key_input;
pub mod orbit;
pub mod slideshow;
pub mod transform;

use crate::registry::TypeRegistry;

pub use key_input::KeyInput;
pub use orbit::OrbitController;
pub use slideshow::Slideshow;
pub use transform::{Transform, update_transforms};

/// Register every built-in component type.
pub fn register_builtin(registry: &mut TypeRegistry) {
    registry.register::<Transform>();
    registry.register::<KeyInput>();
    registry.register::<OrbitController>();
    registry.register::<Slideshow>();
}
