//! Convenient re-exports for scene code.

pub use crate::component::{Component, ComponentType};
pub use crate::components::{
    KeyInput, OrbitController, Slideshow, Transform, register_builtin, update_transforms,
};
pub use crate::context::{CreateContext, InitContext, UpdateContext};
pub use crate::error::{InitError, InstantiateError, LoadError, PointerFailure, ReloadError};
pub use crate::input::{Input, InputEvent, Key, clear_frame_state, route_event, route_event_recursive};
pub use crate::instance::{ComponentHandle, ComponentRef, EntityHandle, EntityRef, InstanceGraph};
pub use crate::ptr::{AnyComponentPtr, ComponentPtr, EntityPtr};
pub use crate::registry::TypeRegistry;
pub use crate::resource::{ComponentResource, EntityResource, ResourceGraph, SceneFile};
pub use crate::scene::Scene;

#[cfg(feature = "diagnostics")]
pub use crate::scene::ReloadEvent;

#[cfg(feature = "hot-reload")]
pub use crate::watch::{SceneWatcher, WatchConfig};

pub use glam::{Mat4, Quat, Vec2, Vec3};
