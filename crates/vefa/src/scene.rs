//! # Scene — Load, Run, Reload
//!
//! A [`Scene`] owns the running [`InstanceGraph`] and everything needed to
//! replace it: the type registry, the source file, and (with the `hot-reload`
//! feature) a file watcher.
//!
//! ## Quick Start
//!
//! ```ignore
//! use vefa::prelude::*;
//!
//! let mut registry = TypeRegistry::new();
//! register_builtin(&mut registry);
//!
//! let mut scene = Scene::load_file(registry, "scene.json")?;
//! scene.watch(WatchConfig::default());
//!
//! loop {
//!     scene.update(1.0 / 60.0);   // applies pending reloads first
//! }
//! ```
//!
//! ## Atomic Reload
//!
//! ```text
//! running: G1 ─────────────────────────────────────────────► G1 (on failure)
//!                │                                      │
//!                └─► build G2 in isolation ─► resolve ─► init ─► swap ─► G2
//! ```
//!
//! The candidate graph shares nothing mutable with the running one. Only a
//! fully built, resolved and initialized G2 replaces G1; G1's components
//! then get `on_destroy()` in reverse init order. Any failure drops G2 and
//! G1 keeps running untouched.

use std::mem;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[cfg(feature = "diagnostics")]
use std::time::Instant;

use crate::builder::{build_graph, spawn_into};
use crate::error::{InstantiateError, ReloadError};
use crate::instance::{EntityHandle, EntityRef, InstanceGraph};
use crate::registry::TypeRegistry;
use crate::resource::ResourceGraph;

#[cfg(feature = "hot-reload")]
use crate::watch::{SceneWatcher, WatchConfig};

/// A record of one reload attempt (diagnostics only).
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone)]
pub struct ReloadEvent {
    /// Seconds since the scene was created.
    pub timestamp_secs: f32,
    pub path: String,
    pub success: bool,
    pub error: Option<String>,
}

/// A running scene.
pub struct Scene {
    registry: Rc<TypeRegistry>,
    graph: InstanceGraph,
    source: Option<PathBuf>,
    #[cfg(feature = "hot-reload")]
    watcher: Option<SceneWatcher>,
    #[cfg(feature = "diagnostics")]
    created: Instant,
    #[cfg(feature = "diagnostics")]
    reload_log: Vec<ReloadEvent>,
}

impl Scene {
    /// An empty scene.
    pub fn new(registry: TypeRegistry) -> Self {
        let registry = Rc::new(registry);
        let graph = InstanceGraph::empty(Rc::clone(&registry), Rc::new(ResourceGraph::default()));
        Self {
            registry,
            graph,
            source: None,
            #[cfg(feature = "hot-reload")]
            watcher: None,
            #[cfg(feature = "diagnostics")]
            created: Instant::now(),
            #[cfg(feature = "diagnostics")]
            reload_log: Vec::new(),
        }
    }

    /// Build a scene from in-memory resources.
    pub fn from_resources(
        registry: TypeRegistry,
        resources: ResourceGraph,
    ) -> Result<Self, InstantiateError> {
        let mut scene = Self::new(registry);
        scene.load(resources)?;
        Ok(scene)
    }

    /// Read and build a scene file.
    pub fn load_file(registry: TypeRegistry, path: impl AsRef<Path>) -> Result<Self, ReloadError> {
        let mut scene = Self::new(registry);
        scene.reload_file(path)?;
        Ok(scene)
    }

    /// Replace the running graph with one built from `resources`.
    ///
    /// On error the running graph is untouched.
    pub fn load(&mut self, resources: ResourceGraph) -> Result<(), InstantiateError> {
        let candidate = build_graph(Rc::clone(&self.registry), Rc::new(resources))?;
        let previous = mem::replace(&mut self.graph, candidate);
        drop(previous);
        Ok(())
    }

    /// Replace the running graph with one built from the file at `path`.
    ///
    /// On success `path` becomes the scene's source. On error the running
    /// graph is untouched and the failure is logged.
    pub fn reload_file(&mut self, path: impl AsRef<Path>) -> Result<(), ReloadError> {
        let path = path.as_ref();
        let result = ResourceGraph::load_file(path)
            .map_err(ReloadError::from)
            .and_then(|resources| self.load(resources).map_err(ReloadError::from));

        match &result {
            Ok(()) => {
                self.source = Some(path.to_path_buf());
                log::info!("Loaded scene '{}'", path.display());
            }
            Err(e) => {
                log::warn!(
                    "Reload of '{}' failed: {e}. Keeping previous scene.",
                    path.display()
                );
            }
        }

        #[cfg(feature = "diagnostics")]
        self.push_reload_event(path, &result);

        result
    }

    /// The file the running graph was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Start watching the source file. Returns `false` if there is no source
    /// or the watcher could not be started.
    #[cfg(feature = "hot-reload")]
    pub fn watch(&mut self, config: WatchConfig) -> bool {
        let Some(source) = &self.source else {
            log::warn!("Scene has no source file. Hot-reload disabled.");
            return false;
        };
        let watcher = SceneWatcher::new(source, config);
        let active = watcher.is_active();
        self.watcher = Some(watcher);
        active
    }

    #[cfg(feature = "hot-reload")]
    pub fn watcher_mut(&mut self) -> Option<&mut SceneWatcher> {
        self.watcher.as_mut()
    }

    /// Reload the source file if the watcher reports a settled change.
    ///
    /// Returns `None` when nothing was due. Called by [`update`](Self::update).
    #[cfg(feature = "hot-reload")]
    pub fn apply_pending_reload(&mut self) -> Option<Result<(), ReloadError>> {
        let watcher = self.watcher.as_mut()?;
        if !watcher.reload_ready() {
            return None;
        }
        let path = watcher.path().to_path_buf();
        Some(self.reload_file(path))
    }

    /// Advance one frame: apply a pending reload, then update every
    /// component depth-first.
    pub fn update(&mut self, delta_time: f64) {
        #[cfg(feature = "hot-reload")]
        let _ = self.apply_pending_reload();

        self.graph.update(delta_time);
    }

    /// Instantiate prototype entity `prototype` as a new root.
    ///
    /// On error the scene is left exactly as it was.
    pub fn spawn(&mut self, prototype: &str) -> Result<EntityHandle, InstantiateError> {
        spawn_into(&mut self.graph, prototype, None)
    }

    /// Like [`spawn`](Self::spawn), with an explicit instance id for the
    /// root entity. An id already in use is an error.
    pub fn spawn_as(&mut self, prototype: &str, id: &str) -> Result<EntityHandle, InstantiateError> {
        spawn_into(&mut self.graph, prototype, Some(id))
    }

    /// Destroy an entity and its subtree. Returns `false` for a stale handle.
    pub fn destroy(&mut self, entity: EntityHandle) -> bool {
        self.graph.destroy(entity)
    }

    pub fn find_entity(&self, id: &str) -> Option<EntityRef<'_>> {
        self.graph.find_entity(id)
    }

    pub fn graph(&self) -> &InstanceGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut InstanceGraph {
        &mut self.graph
    }

    pub fn resources(&self) -> &ResourceGraph {
        self.graph.resources()
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Take every reload record since the last call.
    #[cfg(feature = "diagnostics")]
    pub fn drain_reload_log(&mut self) -> Vec<ReloadEvent> {
        mem::take(&mut self.reload_log)
    }

    #[cfg(feature = "diagnostics")]
    fn push_reload_event(&mut self, path: &Path, result: &Result<(), ReloadError>) {
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.reload_log.push(ReloadEvent {
            timestamp_secs: self.created.elapsed().as_secs_f32(),
            path: filename,
            success: result.is_ok(),
            error: result.as_ref().err().map(ToString::to_string),
        });
    }
}
