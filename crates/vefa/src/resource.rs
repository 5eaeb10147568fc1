//! # Resource Graph — The Static Scene Description
//!
//! Resources are plain data: what a scene file declares, before anything is
//! constructed. A scene file is a JSON object with two flat lists, each entry
//! keyed by a unique string id:
//!
//! ```json
//! {
//!   "components": [
//!     { "id": "CamTransform", "type": "Transform", "properties": { "Translation": [0, 2, 8] } },
//!     { "id": "CamOrbit", "type": "OrbitController", "properties": { "LookAt": "TargetTransform" } }
//!   ],
//!   "entities": [
//!     { "id": "Camera", "components": ["CamTransform", "CamOrbit"], "children": [] }
//!   ]
//! }
//! ```
//!
//! Entities reference components and children by id. Pointer properties are
//! ordinary strings here; they are only interpreted when an instance graph is
//! built.
//!
//! [`ResourceGraph`] validates the whole file up front (unique ids, no
//! dangling references, no cycles in the child relation) and is immutable
//! afterwards.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Static description of one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentResource {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Property values by name. Pointer fields are stored as id or path strings.
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// Static description of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityResource {
    pub id: String,
    /// Component resource ids, in declaration order.
    #[serde(default)]
    pub components: Vec<String>,
    /// Child entity resource ids, in declaration order.
    #[serde(default)]
    pub children: Vec<String>,
    /// Spawn automatically when the scene loads. Entities with this unset are
    /// only instantiated as prototypes.
    #[serde(default = "default_auto_spawn")]
    pub auto_spawn: bool,
}

fn default_auto_spawn() -> bool {
    true
}

/// On-disk layout of a scene file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub components: Vec<ComponentResource>,
    #[serde(default)]
    pub entities: Vec<EntityResource>,
}

/// A validated, immutable set of entity and component resources.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    components: Vec<ComponentResource>,
    entities: Vec<EntityResource>,
    component_index: HashMap<String, usize>,
    entity_index: HashMap<String, usize>,
}

impl ResourceGraph {
    /// Validate and index a scene description.
    pub fn new(file: SceneFile) -> Result<Self, LoadError> {
        let SceneFile {
            components,
            entities,
        } = file;

        let mut component_index = HashMap::with_capacity(components.len());
        let mut entity_index = HashMap::with_capacity(entities.len());

        for (index, component) in components.iter().enumerate() {
            if component.id.is_empty() {
                return Err(LoadError::MissingId);
            }
            if component_index.insert(component.id.clone(), index).is_some() {
                return Err(LoadError::DuplicateId(component.id.clone()));
            }
        }

        for (index, entity) in entities.iter().enumerate() {
            if entity.id.is_empty() {
                return Err(LoadError::MissingId);
            }
            if component_index.contains_key(&entity.id)
                || entity_index.insert(entity.id.clone(), index).is_some()
            {
                return Err(LoadError::DuplicateId(entity.id.clone()));
            }
        }

        for entity in &entities {
            if let Some(missing) = entity
                .components
                .iter()
                .find(|id| !component_index.contains_key(*id))
            {
                return Err(LoadError::UnknownComponent {
                    entity: entity.id.clone(),
                    component: missing.clone(),
                });
            }
            if let Some(missing) = entity
                .children
                .iter()
                .find(|id| !entity_index.contains_key(*id))
            {
                return Err(LoadError::UnknownChild {
                    entity: entity.id.clone(),
                    child: missing.clone(),
                });
            }
        }

        let graph = Self {
            components,
            entities,
            component_index,
            entity_index,
        };
        graph.check_child_cycles()?;
        Ok(graph)
    }

    /// Parse and validate a scene from a JSON string.
    pub fn from_json(source: &str) -> Result<Self, LoadError> {
        Self::new(serde_json::from_str(source)?)
    }

    /// Parse and validate a scene from an in-memory JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, LoadError> {
        Self::new(serde_json::from_value(value)?)
    }

    /// Read, parse and validate a scene file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&source)
    }

    pub fn component(&self, id: &str) -> Option<&ComponentResource> {
        self.component_index
            .get(id)
            .map(|&index| &self.components[index])
    }

    pub fn entity(&self, id: &str) -> Option<&EntityResource> {
        self.entity_index.get(id).map(|&index| &self.entities[index])
    }

    pub fn components(&self) -> &[ComponentResource] {
        &self.components
    }

    pub fn entities(&self) -> &[EntityResource] {
        &self.entities
    }

    /// Entities spawned on load: auto-spawn entities that are nobody's child,
    /// in declaration order. Children are spawned with their parent.
    pub fn auto_spawn_roots(&self) -> impl Iterator<Item = &EntityResource> {
        self.entities.iter().filter(move |entity| {
            entity.auto_spawn
                && !self
                    .entities
                    .iter()
                    .any(|parent| parent.children.iter().any(|child| *child == entity.id))
        })
    }

    pub(crate) fn component_index(&self, id: &str) -> Option<usize> {
        self.component_index.get(id).copied()
    }

    pub(crate) fn component_at(&self, index: usize) -> &ComponentResource {
        &self.components[index]
    }

    // ── Validation ──────────────────────────────────────────────────────

    fn check_child_cycles(&self) -> Result<(), LoadError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnPath,
            Done,
        }

        fn visit<'a>(
            graph: &'a ResourceGraph,
            index: usize,
            marks: &mut [Mark],
            path: &mut Vec<&'a str>,
        ) -> Result<(), LoadError> {
            let entity = &graph.entities[index];
            marks[index] = Mark::OnPath;
            path.push(&entity.id);

            for child in &entity.children {
                let child_index = graph.entity_index[child.as_str()];
                match marks[child_index] {
                    Mark::Done => {}
                    Mark::Unvisited => visit(graph, child_index, marks, path)?,
                    Mark::OnPath => {
                        let start = path.iter().position(|id| *id == child.as_str()).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            path[start..].iter().map(|id| id.to_string()).collect();
                        cycle.push(child.clone());
                        return Err(LoadError::ChildCycle(cycle));
                    }
                }
            }

            path.pop();
            marks[index] = Mark::Done;
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.entities.len()];
        let mut path = Vec::new();
        for index in 0..self.entities.len() {
            if marks[index] == Mark::Unvisited {
                visit(self, index, &mut marks, &mut path)?;
            }
        }
        Ok(())
    }
}
