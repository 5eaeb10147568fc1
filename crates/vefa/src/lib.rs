//! # Vefa — Data-Driven Scene Instantiation
//!
//! Scenes are declared as JSON resource graphs (entities, components, typed
//! cross-references) and turned into a live instance graph: components are
//! constructed through a type registry, pointers are bound (forward
//! references included), and `init()` runs in dependency order. A running
//! scene can be hot-reloaded atomically from its source file.
//!
//! ```text
//! ResourceGraph ──► depsort (per entity) ──► build ──► resolve ──► init ──► InstanceGraph
//!      ▲                                                                        │
//!      └──────────────── Scene::apply_pending_reload (swap on success) ◄────────┘
//! ```
//!
//! Start with `use vefa::prelude::*` and a [`Scene`](scene::Scene).

pub mod component;
pub mod components;
pub mod context;
pub mod error;
pub mod input;
pub mod instance;
pub mod prelude;
pub mod ptr;
pub mod registry;
pub mod resource;
pub mod scene;

pub(crate) mod arena;
pub(crate) mod builder;
pub(crate) mod depsort;

#[cfg(feature = "hot-reload")]
pub mod watch;

#[cfg(test)]
pub(crate) mod testing;
