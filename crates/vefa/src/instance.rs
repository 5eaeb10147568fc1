//! # Instance Graph — Live Entities and Components
//!
//! The instance graph is what a scene runs. It owns every entity and
//! component instance in two generational arenas; all cross-references are
//! handles into those arenas.
//!
//! ```text
//! InstanceGraph
//! ├── entities:   Arena<EntityNode>      id, parent, children, components
//! ├── components: Arena<ComponentSlot>   id, type, owner entity, Box<dyn Component>
//! ├── roots:      [EntityHandle]         top-level entities, in spawn order
//! ├── ids:        IdTable                instance id → handle (pipeline only)
//! └── init_order: [ComponentHandle]      every initialized component, in init order
//! ```
//!
//! ## Queries
//!
//! [`EntityRef`] is a borrowed view of one entity with the navigation and
//! lookup API. Lookups never recurse unless the method name says so:
//!
//! | method                           | match                     |
//! |----------------------------------|---------------------------|
//! | `find_component::<T>()`          | exact type, first match   |
//! | `components_of_type::<T>()`      | kind-of, all matches      |
//! | `has_component::<T>()`           | exact type, no allocation |
//! | `has_components_of_type::<T>()`  | kind-of, no allocation    |
//! | `components_of_type_recursive()` | kind-of, whole subtree    |
//!
//! ## Teardown
//!
//! Dropping the graph calls `on_destroy()` on every initialized component in
//! reverse init order before anything is freed.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::arena::{Arena, Key};
use crate::component::{Component, ComponentType, downcast_mut, downcast_ref};
use crate::context::UpdateContext;
use crate::error::InstantiateError;
use crate::registry::TypeRegistry;
use crate::resource::ResourceGraph;

// ── Handles ─────────────────────────────────────────────────────────────

/// Non-owning reference to an entity instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub(crate) Key);

/// Non-owning reference to a component instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentHandle(pub(crate) Key);

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityHandle({:?})", self.0)
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentHandle({:?})", self.0)
    }
}

/// Either kind of instance, as stored in the id table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Instance {
    Entity(EntityHandle),
    Component(ComponentHandle),
}

// ── Storage ─────────────────────────────────────────────────────────────

pub(crate) struct EntityNode {
    pub id: String,
    pub resource_id: String,
    pub parent: Option<EntityHandle>,
    pub children: Vec<EntityHandle>,
    pub components: Vec<ComponentHandle>,
}

pub(crate) struct ComponentSlot {
    pub id: String,
    pub resource_index: usize,
    pub resource_id: String,
    pub type_name: &'static str,
    pub entity: EntityHandle,
    /// `None` while the instance is being created, initialized or updated.
    pub instance: Option<Box<dyn Component>>,
    pub initialized: bool,
}

/// Instance id lookup used while building and resolving.
///
/// `by_id` is keyed by the unique instance id; `by_resource` lists every
/// instance created from a resource id, in creation order.
#[derive(Clone, Default)]
pub(crate) struct IdTable {
    by_id: HashMap<String, Instance>,
    by_resource: HashMap<String, Vec<Instance>>,
}

impl IdTable {
    pub fn insert(
        &mut self,
        id: &str,
        resource_id: &str,
        instance: Instance,
    ) -> Result<(), InstantiateError> {
        if self.by_id.contains_key(id) {
            return Err(InstantiateError::DuplicateId(id.to_string()));
        }
        self.by_id.insert(id.to_string(), instance);
        self.by_resource
            .entry(resource_id.to_string())
            .or_default()
            .push(instance);
        Ok(())
    }

    /// Remove `instance`. An id held by a different instance is left alone.
    pub fn remove(&mut self, id: &str, resource_id: &str, instance: Instance) {
        if self.by_id.get(id) == Some(&instance) {
            self.by_id.remove(id);
        }
        if let Some(list) = self.by_resource.get_mut(resource_id) {
            list.retain(|i| *i != instance);
            if list.is_empty() {
                self.by_resource.remove(resource_id);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Instance> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn instances_of(&self, resource_id: &str) -> &[Instance] {
        self.by_resource
            .get(resource_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `base` if free, otherwise the first free `base_0`, `base_1`, ...
    pub fn generate_id(&self, base: &str) -> String {
        if !self.contains(base) {
            return base.to_string();
        }
        (0usize..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

// ── InstanceGraph ───────────────────────────────────────────────────────

/// The live entity/component tree built from a [`ResourceGraph`].
pub struct InstanceGraph {
    pub(crate) entities: Arena<EntityNode>,
    pub(crate) components: Arena<ComponentSlot>,
    pub(crate) roots: Vec<EntityHandle>,
    pub(crate) ids: IdTable,
    pub(crate) init_order: Vec<ComponentHandle>,
    pub(crate) registry: Rc<TypeRegistry>,
    pub(crate) resources: Rc<ResourceGraph>,
}

impl InstanceGraph {
    pub(crate) fn empty(registry: Rc<TypeRegistry>, resources: Rc<ResourceGraph>) -> Self {
        Self {
            entities: Arena::new(),
            components: Arena::new(),
            roots: Vec::new(),
            ids: IdTable::default(),
            init_order: Vec::new(),
            registry,
            resources,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn resources(&self) -> &ResourceGraph {
        &self.resources
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Top-level entities, in spawn order.
    pub fn roots(&self) -> impl Iterator<Item = EntityRef<'_>> + '_ {
        self.roots.iter().filter_map(|&handle| self.entity(handle))
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<EntityRef<'_>> {
        let node = self.entities.get(handle.0)?;
        Some(EntityRef {
            graph: self,
            handle,
            node,
        })
    }

    /// Find an entity by instance id.
    pub fn find_entity(&self, id: &str) -> Option<EntityRef<'_>> {
        match self.ids.get(id)? {
            Instance::Entity(handle) => self.entity(handle),
            Instance::Component(_) => None,
        }
    }

    /// Find a component by instance id.
    pub fn find_component(&self, id: &str) -> Option<ComponentRef<'_>> {
        match self.ids.get(id)? {
            Instance::Component(handle) => self.component(handle),
            Instance::Entity(_) => None,
        }
    }

    pub fn component(&self, handle: ComponentHandle) -> Option<ComponentRef<'_>> {
        let slot = self.components.get(handle.0)?;
        Some(ComponentRef {
            graph: self,
            handle,
            slot,
        })
    }

    pub fn component_dyn(&self, handle: ComponentHandle) -> Option<&dyn Component> {
        self.components.get(handle.0)?.instance.as_deref()
    }

    pub fn component_dyn_mut(&mut self, handle: ComponentHandle) -> Option<&mut dyn Component> {
        self.components.get_mut(handle.0)?.instance.as_deref_mut()
    }

    pub fn component_as<T: ComponentType>(&self, handle: ComponentHandle) -> Option<&T> {
        downcast_ref::<T>(self.component_dyn(handle)?)
    }

    pub fn component_as_mut<T: ComponentType>(&mut self, handle: ComponentHandle) -> Option<&mut T> {
        downcast_mut::<T>(self.component_dyn_mut(handle)?)
    }

    /// Every initialized component, in the order `init()` ran.
    pub fn init_order(&self) -> &[ComponentHandle] {
        &self.init_order
    }

    /// Instance ids of [`init_order`](Self::init_order).
    pub fn init_order_ids(&self) -> Vec<&str> {
        self.init_order
            .iter()
            .filter_map(|&handle| self.components.get(handle.0))
            .map(|slot| slot.id.as_str())
            .collect()
    }

    // ── Per-frame update ────────────────────────────────────────────────

    /// Update every component once: depth-first over the hierarchy, parents
    /// before children, components in declaration order.
    ///
    /// A component may destroy its own entity from `update()`; it then gets
    /// `on_destroy()` after the rest of the subtree.
    pub fn update(&mut self, delta_time: f64) {
        let roots = self.roots.clone();
        for root in roots {
            self.update_entity(root, delta_time);
        }
    }

    fn update_entity(&mut self, entity: EntityHandle, delta_time: f64) {
        let Some(node) = self.entities.get(entity.0) else {
            return;
        };
        let components = node.components.clone();
        let children = node.children.clone();

        for handle in components {
            let Some((mut instance, initialized)) = self
                .components
                .get_mut(handle.0)
                .and_then(|slot| Some((slot.instance.take()?, slot.initialized)))
            else {
                continue;
            };

            let mut cx = UpdateContext::new(self, entity, handle);
            instance.update(delta_time, &mut cx);

            match self.components.get_mut(handle.0) {
                Some(slot) => slot.instance = Some(instance),
                // Destroyed from its own update(); destroy() could not reach it.
                None if initialized => instance.on_destroy(),
                None => {}
            }
        }

        for child in children {
            self.update_entity(child, delta_time);
        }
    }

    // ── Destruction ─────────────────────────────────────────────────────

    /// Destroy an entity and its whole subtree.
    ///
    /// Initialized components get `on_destroy()` in reverse init order, then
    /// everything is removed from the hierarchy, the id table and the arenas.
    /// Returns `false` if the handle is stale.
    pub fn destroy(&mut self, entity: EntityHandle) -> bool {
        if !self.entities.contains(entity.0) {
            return false;
        }

        let subtree = self.subtree(entity);
        let mut doomed: Vec<ComponentHandle> = Vec::new();
        for &e in &subtree {
            if let Some(node) = self.entities.get(e.0) {
                doomed.extend(node.components.iter().copied());
            }
        }

        let (destroyed, kept): (Vec<_>, Vec<_>) = self
            .init_order
            .iter()
            .copied()
            .partition(|handle| doomed.contains(handle));
        self.init_order = kept;
        for handle in destroyed.into_iter().rev() {
            if let Some(instance) = self.component_dyn_mut(handle) {
                instance.on_destroy();
            }
        }

        self.detach(entity);
        for handle in doomed {
            self.remove_component(handle);
        }
        for e in subtree {
            self.remove_entity(e);
        }
        true
    }

    /// `entity` followed by all of its descendants, depth-first.
    pub(crate) fn subtree(&self, entity: EntityHandle) -> Vec<EntityHandle> {
        let mut out = Vec::new();
        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            let Some(node) = self.entities.get(current.0) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Unlink `entity` from its parent's children, or from the roots.
    pub(crate) fn detach(&mut self, entity: EntityHandle) {
        let parent = self.entities.get(entity.0).and_then(|node| node.parent);
        match parent {
            Some(parent) => {
                if let Some(node) = self.entities.get_mut(parent.0) {
                    node.children.retain(|&child| child != entity);
                }
            }
            None => self.roots.retain(|&root| root != entity),
        }
    }

    pub(crate) fn remove_component(&mut self, handle: ComponentHandle) {
        if let Some(slot) = self.components.remove(handle.0) {
            self.ids
                .remove(&slot.id, &slot.resource_id, Instance::Component(handle));
            if let Some(node) = self.entities.get_mut(slot.entity.0) {
                node.components.retain(|&c| c != handle);
            }
        }
    }

    pub(crate) fn remove_entity(&mut self, handle: EntityHandle) {
        if let Some(node) = self.entities.remove(handle.0) {
            self.ids
                .remove(&node.id, &node.resource_id, Instance::Entity(handle));
        }
    }
}

impl Drop for InstanceGraph {
    fn drop(&mut self) {
        let order = std::mem::take(&mut self.init_order);
        for handle in order.into_iter().rev() {
            if let Some(instance) = self.component_dyn_mut(handle) {
                instance.on_destroy();
            }
        }
    }
}

impl fmt::Debug for InstanceGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceGraph")
            .field("entities", &self.entities.len())
            .field("components", &self.components.len())
            .field("roots", &self.roots.len())
            .finish()
    }
}

// ── EntityRef ───────────────────────────────────────────────────────────

/// Borrowed view of one entity instance.
#[derive(Clone, Copy)]
pub struct EntityRef<'g> {
    graph: &'g InstanceGraph,
    handle: EntityHandle,
    node: &'g EntityNode,
}

impl<'g> EntityRef<'g> {
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// Unique instance id.
    pub fn id(&self) -> &'g str {
        &self.node.id
    }

    /// Id of the resource this entity was built from.
    pub fn resource_id(&self) -> &'g str {
        &self.node.resource_id
    }

    pub fn parent(&self) -> Option<EntityRef<'g>> {
        self.graph.entity(self.node.parent?)
    }

    pub fn children(&self) -> impl Iterator<Item = EntityRef<'g>> + use<'g> {
        let graph = self.graph;
        self.node
            .children
            .iter()
            .filter_map(move |&child| graph.entity(child))
    }

    pub fn child_count(&self) -> usize {
        self.node.children.len()
    }

    /// Components in declaration order.
    pub fn components(&self) -> impl Iterator<Item = ComponentRef<'g>> + use<'g> {
        let graph = self.graph;
        self.node
            .components
            .iter()
            .filter_map(move |&handle| graph.component(handle))
    }

    fn slots(&self) -> impl Iterator<Item = (ComponentHandle, &'g ComponentSlot)> + use<'g> {
        let graph = self.graph;
        self.node
            .components
            .iter()
            .filter_map(move |&handle| graph.components.get(handle.0).map(|slot| (handle, slot)))
    }

    /// First component whose type is exactly `T`.
    pub fn find_component<T: ComponentType>(&self) -> Option<&'g T> {
        let handle = self.find_component_handle::<T>()?;
        self.graph.component_as::<T>(handle)
    }

    pub fn find_component_handle<T: ComponentType>(&self) -> Option<ComponentHandle> {
        self.slots()
            .find(|(_, slot)| slot.type_name == T::TYPE_NAME)
            .map(|(handle, _)| handle)
    }

    /// First component whose type name is exactly `type_name`.
    pub fn find_component_by_type(&self, type_name: &str) -> Option<ComponentRef<'g>> {
        self.components().find(|c| c.type_name() == type_name)
    }

    /// Component by instance id or resource id.
    pub fn find_component_by_id(&self, id: &str) -> Option<ComponentRef<'g>> {
        self.components()
            .find(|c| c.id() == id)
            .or_else(|| self.components().find(|c| c.resource_id() == id))
    }

    /// Every component that is a kind of `T`, in declaration order.
    pub fn components_of_type<T: ComponentType>(&self) -> Vec<ComponentRef<'g>> {
        self.components_of_kind(T::TYPE_NAME)
    }

    /// Every component that is a kind of `kind`, in declaration order.
    pub fn components_of_kind(&self, kind: &str) -> Vec<ComponentRef<'g>> {
        let registry = &self.graph.registry;
        self.components()
            .filter(|c| registry.is_kind_of(c.type_name(), kind))
            .collect()
    }

    pub fn has_component<T: ComponentType>(&self) -> bool {
        self.slots().any(|(_, slot)| slot.type_name == T::TYPE_NAME)
    }

    pub fn has_components_of_type<T: ComponentType>(&self) -> bool {
        let registry = &self.graph.registry;
        self.slots()
            .any(|(_, slot)| registry.is_kind_of(slot.type_name, T::TYPE_NAME))
    }

    /// Like [`components_of_type`](Self::components_of_type), but also
    /// searches every descendant, depth-first.
    pub fn components_of_type_recursive<T: ComponentType>(&self) -> Vec<ComponentRef<'g>> {
        let mut out = Vec::new();
        for entity in self.graph.subtree(self.handle) {
            if let Some(entity) = self.graph.entity(entity) {
                out.extend(entity.components_of_kind(T::TYPE_NAME));
            }
        }
        out
    }
}

impl fmt::Debug for EntityRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("id", &self.node.id)
            .field("handle", &self.handle)
            .finish()
    }
}

// ── ComponentRef ────────────────────────────────────────────────────────

/// Borrowed view of one component instance.
#[derive(Clone, Copy)]
pub struct ComponentRef<'g> {
    graph: &'g InstanceGraph,
    handle: ComponentHandle,
    slot: &'g ComponentSlot,
}

impl<'g> ComponentRef<'g> {
    pub fn handle(&self) -> ComponentHandle {
        self.handle
    }

    pub fn id(&self) -> &'g str {
        &self.slot.id
    }

    pub fn resource_id(&self) -> &'g str {
        &self.slot.resource_id
    }

    pub fn type_name(&self) -> &'static str {
        self.slot.type_name
    }

    pub fn is_initialized(&self) -> bool {
        self.slot.initialized
    }

    pub fn entity(&self) -> Option<EntityRef<'g>> {
        self.graph.entity(self.slot.entity)
    }

    /// The instance. `None` while it is updating.
    pub fn as_dyn(&self) -> Option<&'g dyn Component> {
        self.slot.instance.as_deref()
    }

    pub fn get<T: ComponentType>(&self) -> Option<&'g T> {
        downcast_ref::<T>(self.as_dyn()?)
    }
}

impl fmt::Debug for ComponentRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("id", &self.slot.id)
            .field("type", &self.slot.type_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::builder::build_graph;
    use crate::components::transform::Transform;
    use crate::testing::{Base, Derived, fixture_registry, log_of};

    fn build(value: serde_json::Value) -> InstanceGraph {
        let resources = ResourceGraph::from_value(value).unwrap();
        build_graph(Rc::new(fixture_registry()), Rc::new(resources)).unwrap()
    }

    #[test]
    fn generate_id_skips_taken() {
        let mut table = IdTable::default();
        assert_eq!(table.generate_id("Slide"), "Slide");
        let dummy = Instance::Entity(EntityHandle(Key {
            index: 0,
            generation: 0,
        }));
        table.insert("Slide", "Slide", dummy).unwrap();
        table.insert("Slide_0", "Slide", dummy).unwrap();
        assert_eq!(table.generate_id("Slide"), "Slide_1");
        assert!(matches!(
            table.insert("Slide", "Slide", dummy),
            Err(InstantiateError::DuplicateId(id)) if id == "Slide"
        ));
    }

    #[test]
    fn find_component_is_exact_and_components_of_type_is_polymorphic() {
        let graph = build(json!({
            "components": [
                { "id": "B", "type": "Base", "properties": { "Value": 1 } },
                { "id": "D", "type": "Derived", "properties": { "Value": 2 } }
            ],
            "entities": [{ "id": "E", "components": ["B", "D"] }]
        }));
        let entity = graph.find_entity("E").unwrap();

        let base = entity.find_component::<Base>().unwrap();
        assert_eq!(base.value, 1);
        assert_eq!(entity.find_component::<Derived>().unwrap().value, 2);

        let all: Vec<_> = entity
            .components_of_type::<Base>()
            .iter()
            .map(|c| c.id())
            .collect();
        assert_eq!(all, vec!["B", "D"]);
        let derived_only: Vec<_> = entity
            .components_of_type::<Derived>()
            .iter()
            .map(|c| c.id())
            .collect();
        assert_eq!(derived_only, vec!["D"]);

        assert!(entity.has_component::<Base>());
        assert!(entity.has_components_of_type::<Base>());
        assert!(!entity.has_component::<Transform>());
        assert!(!entity.has_components_of_type::<Transform>());
    }

    #[test]
    fn find_component_on_derived_only_entity_is_none() {
        let graph = build(json!({
            "components": [{ "id": "D", "type": "Derived" }],
            "entities": [{ "id": "E", "components": ["D"] }]
        }));
        let entity = graph.find_entity("E").unwrap();
        assert!(entity.find_component::<Base>().is_none());
        assert!(!entity.has_component::<Base>());
        assert!(entity.has_components_of_type::<Base>());
        assert_eq!(entity.components_of_kind("Node").len(), 1);
    }

    #[test]
    fn navigation_and_recursive_query() {
        let graph = build(json!({
            "components": [
                { "id": "RootBase", "type": "Base" },
                { "id": "ChildBase", "type": "Base" },
                { "id": "GrandDerived", "type": "Derived" }
            ],
            "entities": [
                { "id": "Root", "components": ["RootBase"], "children": ["Child"] },
                { "id": "Child", "components": ["ChildBase"], "children": ["Grand"] },
                { "id": "Grand", "components": ["GrandDerived"] }
            ]
        }));

        let root = graph.find_entity("Root").unwrap();
        assert!(root.parent().is_none());
        assert_eq!(root.child_count(), 1);
        let child = root.children().next().unwrap();
        assert_eq!(child.id(), "Child");
        assert_eq!(child.parent().unwrap().id(), "Root");

        // Non-recursive lookup sees only the entity itself.
        assert_eq!(root.components_of_type::<Base>().len(), 1);
        let ids: Vec<_> = root
            .components_of_type_recursive::<Base>()
            .iter()
            .map(|c| c.id())
            .collect();
        assert_eq!(ids, vec!["RootBase", "ChildBase", "GrandDerived"]);
    }

    #[test]
    fn find_component_by_id_and_type() {
        let graph = build(json!({
            "components": [{ "id": "T", "type": "Transform" }],
            "entities": [{ "id": "E", "components": ["T"] }]
        }));
        let entity = graph.find_entity("E").unwrap();
        assert_eq!(entity.find_component_by_id("T").unwrap().type_name(), "Transform");
        assert!(entity.find_component_by_type("Transform").is_some());
        assert!(entity.find_component_by_type("Base").is_none());
        assert!(graph.find_entity("T").is_none());
        assert!(graph.find_component("T").unwrap().is_initialized());
    }

    #[test]
    fn update_is_depth_first_parent_before_children() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let graph_value = json!({
            "components": [
                { "id": "R1", "type": "Recorder" },
                { "id": "R2", "type": "Recorder" },
                { "id": "C1", "type": "Recorder" },
                { "id": "S1", "type": "Recorder" }
            ],
            "entities": [
                { "id": "Root", "components": ["R1", "R2"], "children": ["Child"] },
                { "id": "Child", "components": ["C1"] },
                { "id": "Sibling", "components": ["S1"] }
            ]
        });
        let mut graph = crate::testing::with_log(&log, || build(graph_value));
        log.borrow_mut().clear();

        graph.update(0.016);
        assert_eq!(
            log_of(&log),
            vec!["update R1", "update R2", "update C1", "update S1"]
        );
    }

    #[test]
    fn destroy_runs_on_destroy_in_reverse_and_unlinks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut graph = crate::testing::with_log(&log, || {
            build(json!({
                "components": [
                    { "id": "P", "type": "Recorder" },
                    { "id": "C", "type": "Recorder" },
                    { "id": "K", "type": "Recorder" }
                ],
                "entities": [
                    { "id": "Parent", "components": ["P"], "children": ["Child"] },
                    { "id": "Child", "components": ["C"] },
                    { "id": "Keep", "components": ["K"] }
                ]
            }))
        });
        log.borrow_mut().clear();

        let parent = graph.find_entity("Parent").unwrap().handle();
        assert!(graph.destroy(parent));
        assert_eq!(log_of(&log), vec!["destroy C", "destroy P"]);

        assert!(graph.find_entity("Parent").is_none());
        assert!(graph.find_entity("Child").is_none());
        assert_eq!(graph.entity_count(), 1);
        assert_eq!(graph.component_count(), 1);
        assert_eq!(graph.init_order_ids(), vec!["K"]);
        assert!(!graph.destroy(parent));
    }

    #[test]
    fn destroying_own_entity_from_update_still_runs_on_destroy() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut graph = crate::testing::with_log(&log, || {
            build(json!({
                "components": [
                    { "id": "R", "type": "Recorder" },
                    { "id": "X", "type": "SelfDestruct" },
                    { "id": "C", "type": "Recorder" }
                ],
                "entities": [
                    { "id": "E", "components": ["R", "X"], "children": ["Child"] },
                    { "id": "Child", "components": ["C"] }
                ]
            }))
        });
        log.borrow_mut().clear();

        graph.update(0.016);
        assert_eq!(
            log_of(&log),
            vec!["update R", "update X", "destroy C", "destroy R", "destroy X"]
        );
        assert_eq!(graph.entity_count(), 0);
        assert_eq!(graph.component_count(), 0);

        log.borrow_mut().clear();
        drop(graph);
        assert!(log_of(&log).is_empty());
    }

    #[test]
    fn drop_runs_on_destroy_in_reverse_init_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let graph = crate::testing::with_log(&log, || {
            build(json!({
                "components": [
                    { "id": "A", "type": "Recorder" },
                    { "id": "B", "type": "Recorder" }
                ],
                "entities": [{ "id": "E", "components": ["A", "B"] }]
            }))
        });
        log.borrow_mut().clear();

        drop(graph);
        assert_eq!(log_of(&log), vec!["destroy B", "destroy A"]);
    }
}
