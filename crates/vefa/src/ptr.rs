//! # Pointers — Typed Cross-References Between Instances
//!
//! A pointer field starts life as a string in a component resource and ends
//! up as a handle into the live instance graph:
//!
//! ```text
//! resource:   "LookAt": "../Target/TargetTransform"
//!                 │
//! create():   cx.component_ptr::<Transform>("LookAt")
//!                 │      ┌────────────────────────────────────┐
//!                 ├─────►│ PendingLink (owner, field, target) │  pushed on the
//!                 │      └────────────────────────────────────┘  pass worklist
//!                 ▼
//!             ComponentPtr<Transform> { cell: unbound }
//!                 │
//! resolve:    link bound once every instance of the pass exists
//!                 ▼
//!             ComponentPtr<Transform> { cell: ComponentHandle(12v0) }
//! ```
//!
//! The pointer and its pending link share the binding cell, so the component
//! that owns the pointer sees the handle without being touched again. Because
//! binding happens after construction, targets declared later in the scene
//! (forward references) resolve the same way as earlier ones.
//!
//! ## Target Syntax
//!
//! ```text
//! CamTransform                  direct resource id (must be unambiguous)
//! ./CamTransform                component on the owner's entity
//! ../Target/TargetTransform     sibling entity "Target", then its component
//! World/Slide:2/SlideImage      entity "World", its third "Slide" child, ...
//! ```
//!
//! A path starts at the owner entity (`.`), its parent (`..`) or an entity
//! instance id. Middle elements step to `.`, `..` or a child by resource id.
//! A bare child id must match exactly one child; `:index` picks among
//! children that share it. For
//! component pointers the last element names a component on the entity the
//! path ends on.

use std::cell::OnceCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::component::{Component, ComponentType, downcast_mut, downcast_ref};
use crate::error::PointerFailure;
use crate::instance::{ComponentHandle, EntityHandle, EntityRef, InstanceGraph};

// ── Typed Pointers ──────────────────────────────────────────────────────

/// Pointer to a component of exactly type `T`.
///
/// A target of a derived type fails the pass with a type mismatch; point at
/// derived types through [`AnyComponentPtr`].
pub struct ComponentPtr<T: ComponentType> {
    path: String,
    cell: Rc<OnceCell<ComponentHandle>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ComponentType> ComponentPtr<T> {
    pub(crate) fn new(path: String, cell: Rc<OnceCell<ComponentHandle>>) -> Self {
        Self {
            path,
            cell,
            _marker: PhantomData,
        }
    }

    /// The target as written in the resource.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The bound handle. `None` only before the pass resolved it.
    pub fn handle(&self) -> Option<ComponentHandle> {
        self.cell.get().copied()
    }

    pub fn is_bound(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Dereference against the graph. `None` if unbound, if the target was
    /// destroyed, or while the target itself is updating.
    pub fn get<'g>(&self, graph: &'g InstanceGraph) -> Option<&'g T> {
        graph.component_as::<T>(self.handle()?)
    }

    pub fn get_mut<'g>(&self, graph: &'g mut InstanceGraph) -> Option<&'g mut T> {
        graph.component_as_mut::<T>(self.handle()?)
    }
}

impl<T: ComponentType> Clone for ComponentPtr<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            cell: Rc::clone(&self.cell),
            _marker: PhantomData,
        }
    }
}

impl<T: ComponentType> fmt::Debug for ComponentPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentPtr")
            .field("type", &T::TYPE_NAME)
            .field("path", &self.path)
            .field("handle", &self.handle())
            .finish()
    }
}

/// Pointer to any component that is a kind of a named type.
///
/// Use this when the target may be a derived type: the result is a trait
/// object rather than a concrete `T`.
#[derive(Clone)]
pub struct AnyComponentPtr {
    path: String,
    kind: &'static str,
    cell: Rc<OnceCell<ComponentHandle>>,
}

impl AnyComponentPtr {
    pub(crate) fn new(path: String, kind: &'static str, cell: Rc<OnceCell<ComponentHandle>>) -> Self {
        Self { path, kind, cell }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The type every target is a kind of.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn handle(&self) -> Option<ComponentHandle> {
        self.cell.get().copied()
    }

    pub fn get<'g>(&self, graph: &'g InstanceGraph) -> Option<&'g dyn Component> {
        graph.component_dyn(self.handle()?)
    }

    /// Downcast the target to a concrete type.
    pub fn get_as<'g, T: ComponentType>(&self, graph: &'g InstanceGraph) -> Option<&'g T> {
        downcast_ref::<T>(self.get(graph)?)
    }

    pub fn get_as_mut<'g, T: ComponentType>(&self, graph: &'g mut InstanceGraph) -> Option<&'g mut T> {
        downcast_mut::<T>(graph.component_dyn_mut(self.handle()?)?)
    }
}

impl fmt::Debug for AnyComponentPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyComponentPtr")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("handle", &self.handle())
            .finish()
    }
}

/// Pointer to an entity instance.
#[derive(Clone)]
pub struct EntityPtr {
    path: String,
    cell: Rc<OnceCell<EntityHandle>>,
}

impl EntityPtr {
    pub(crate) fn new(path: String, cell: Rc<OnceCell<EntityHandle>>) -> Self {
        Self { path, cell }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handle(&self) -> Option<EntityHandle> {
        self.cell.get().copied()
    }

    pub fn get<'g>(&self, graph: &'g InstanceGraph) -> Option<EntityRef<'g>> {
        graph.entity(self.handle()?)
    }
}

impl fmt::Debug for EntityPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityPtr")
            .field("path", &self.path)
            .field("handle", &self.handle())
            .finish()
    }
}

// ── Pending Links ───────────────────────────────────────────────────────

/// What a pending link expects its target to be, and where to bind it.
pub(crate) enum LinkTarget {
    /// `exact` targets must be of type `kind` itself, not a subtype.
    Component {
        kind: &'static str,
        exact: bool,
        cell: Rc<OnceCell<ComponentHandle>>,
    },
    Entity {
        cell: Rc<OnceCell<EntityHandle>>,
    },
}

impl LinkTarget {
    pub fn expected(&self) -> String {
        match self {
            LinkTarget::Component { kind, exact: true, .. } => format!("component of type '{kind}'"),
            LinkTarget::Component { kind, .. } => format!("component of kind '{kind}'"),
            LinkTarget::Entity { .. } => "entity".to_string(),
        }
    }
}

/// One unresolved pointer field, collected while components are created.
pub(crate) struct PendingLink {
    pub owner: ComponentHandle,
    pub field: String,
    pub target: String,
    pub link: LinkTarget,
}

// ── Path Parsing ────────────────────────────────────────────────────────

/// Where a path starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathRoot {
    /// `.`: the owner's entity.
    Owner,
    /// `..`: the owner entity's parent.
    Parent,
    /// An entity instance id.
    Entity(String),
}

/// One step from an entity to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathStep {
    Current,
    Parent,
    /// `index` is required when several children share `id`.
    Child { id: String, index: Option<usize> },
}

/// A parsed pointer target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// A bare resource id.
    Direct(String),
    /// A path; `component` is set for component pointers.
    Path {
        root: PathRoot,
        steps: Vec<PathStep>,
        component: Option<String>,
    },
}

/// Parse `target` for a component pointer (`component = true`) or an entity
/// pointer.
pub(crate) fn parse_target(target: &str, component: bool) -> Result<Target, PointerFailure> {
    if target.is_empty() {
        return Err(PointerFailure::InvalidPath("empty target".into()));
    }

    let is_path = target.contains('/') || target == "." || target == "..";
    if !is_path {
        return Ok(Target::Direct(target.to_string()));
    }

    let mut elements: Vec<&str> = target.split('/').collect();
    if elements.iter().any(|e| e.is_empty()) {
        return Err(PointerFailure::InvalidPath(format!(
            "'{target}' contains an empty path element"
        )));
    }

    let component_id = if component {
        if elements.len() < 2 {
            return Err(PointerFailure::InvalidPath(format!(
                "'{target}' does not name a component"
            )));
        }
        elements.pop().map(str::to_string)
    } else {
        None
    };

    let root = match elements[0] {
        "." => PathRoot::Owner,
        ".." => PathRoot::Parent,
        id => PathRoot::Entity(id.to_string()),
    };

    let steps = elements[1..]
        .iter()
        .map(|element| parse_step(element, target))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Target::Path {
        root,
        steps,
        component: component_id,
    })
}

fn parse_step(element: &str, target: &str) -> Result<PathStep, PointerFailure> {
    match element {
        "." => Ok(PathStep::Current),
        ".." => Ok(PathStep::Parent),
        _ => match element.split_once(':') {
            None => Ok(PathStep::Child {
                id: element.to_string(),
                index: None,
            }),
            Some((id, index)) => {
                let index = index.parse::<usize>().map_err(|_| {
                    PointerFailure::InvalidPath(format!(
                        "'{target}' has invalid child index in '{element}'"
                    ))
                })?;
                Ok(PathStep::Child {
                    id: id.to_string(),
                    index: Some(index),
                })
            }
        },
    }
}
