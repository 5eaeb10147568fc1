//! # Build Pass — Resources In, Initialized Instances Out
//!
//! A build pass turns entity resources into live instances inside an
//! [`InstanceGraph`]. Every pass, whether it loads a whole scene or spawns
//! one prototype, runs the same three stages:
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌───────────────────────────┐
//! │ 1. build    │───►│ 2. resolve   │───►│ 3. init                   │
//! │ entities +  │    │ every pending│    │ per entity in dependency  │
//! │ components, │    │ pointer link │    │ order, parents before     │
//! │ register ids│    │              │    │ children                  │
//! └─────────────┘    └──────────────┘    └───────────────────────────┘
//!        │                  │                        │
//!        └──────── first error: roll back this scope ┘
//! ```
//!
//! ## Scopes
//!
//! `init()` may spawn prototypes. A spawn opens a nested scope on the same
//! pass: the outer scope's pending links and init queue are set aside, the
//! prototype runs all three stages, and the outer state is restored. A failed
//! scope rolls back only what it created: `on_destroy()` in reverse init
//! order for what it initialized, then removal of every instance it built.
//!
//! ## Id Table
//!
//! The pass works on its own copy of the graph's id table and writes it back
//! on commit. A pass that fails never touches the graph's table.

use std::collections::HashMap;
use std::mem;
use std::rc::Rc;
use std::time::Instant;

use crate::context::{CreateContext, InitContext};
use crate::depsort::dependency_order;
use crate::error::{InitError, InstantiateError, PointerFailure};
use crate::instance::{
    ComponentHandle, ComponentSlot, EntityHandle, EntityNode, IdTable, Instance, InstanceGraph,
};
use crate::ptr::{LinkTarget, PathRoot, PathStep, PendingLink, Target, parse_target};
use crate::registry::TypeRegistry;
use crate::resource::ResourceGraph;

/// Build a fresh graph from every auto-spawn root of `resources`.
///
/// On error the partially built graph is torn down and dropped.
pub(crate) fn build_graph(
    registry: Rc<TypeRegistry>,
    resources: Rc<ResourceGraph>,
) -> Result<InstanceGraph, InstantiateError> {
    let start = Instant::now();
    let mut graph = InstanceGraph::empty(registry, Rc::clone(&resources));
    let roots: Vec<String> = resources
        .auto_spawn_roots()
        .map(|entity| entity.id.clone())
        .collect();

    let mut pass = BuildPass::new(&graph);
    pass.instantiate_roots(&mut graph, &roots)?;
    pass.commit(&mut graph);

    log::info!(
        "Built instance graph: {} entities, {} components in {:.2?}",
        graph.entity_count(),
        graph.component_count(),
        start.elapsed()
    );
    Ok(graph)
}

/// Spawn `prototype` as a new root of a running graph.
///
/// On error the graph is left exactly as it was.
pub(crate) fn spawn_into(
    graph: &mut InstanceGraph,
    prototype: &str,
    id: Option<&str>,
) -> Result<EntityHandle, InstantiateError> {
    let mut pass = BuildPass::new(graph);
    let handle = pass.spawn(graph, prototype, None, id)?;
    pass.commit(graph);
    Ok(handle)
}

/// Where a scope started, for rollback.
struct Checkpoint {
    entities: usize,
    components: usize,
    initialized: usize,
}

/// State of one build pass. Lives for a single load or spawn.
pub(crate) struct BuildPass {
    ids: IdTable,
    registry: Rc<TypeRegistry>,
    resources: Rc<ResourceGraph>,
    /// Pointer links of the current scope.
    links: Vec<PendingLink>,
    /// Entities of the current scope with their sorted components.
    pending_init: Vec<(EntityHandle, Vec<ComponentHandle>)>,
    /// Instances of the current scope by resource id, preferred for direct ids.
    scope: HashMap<String, Vec<Instance>>,
    created_entities: Vec<EntityHandle>,
    created_components: Vec<ComponentHandle>,
    /// Prototypes currently being spawned, outermost first.
    spawn_stack: Vec<String>,
}

impl BuildPass {
    pub fn new(graph: &InstanceGraph) -> Self {
        Self {
            ids: graph.ids.clone(),
            registry: Rc::clone(&graph.registry),
            resources: Rc::clone(&graph.resources),
            links: Vec::new(),
            pending_init: Vec::new(),
            scope: HashMap::new(),
            created_entities: Vec::new(),
            created_components: Vec::new(),
            spawn_stack: Vec::new(),
        }
    }

    /// Publish the pass's id table to the graph.
    pub fn commit(self, graph: &mut InstanceGraph) {
        log::debug!(
            "Committed build pass: {} entities, {} components",
            self.created_entities.len(),
            self.created_components.len()
        );
        graph.ids = self.ids;
    }

    pub fn instantiate_roots(
        &mut self,
        graph: &mut InstanceGraph,
        roots: &[String],
    ) -> Result<Vec<EntityHandle>, InstantiateError> {
        self.scoped(graph, |pass, graph| {
            roots
                .iter()
                .map(|root| pass.construct_entity(graph, root, None, None))
                .collect()
        })
    }

    pub fn spawn(
        &mut self,
        graph: &mut InstanceGraph,
        prototype: &str,
        parent: Option<EntityHandle>,
        id: Option<&str>,
    ) -> Result<EntityHandle, InstantiateError> {
        if self.spawn_stack.iter().any(|p| p == prototype) {
            return Err(InstantiateError::RecursiveSpawn(prototype.to_string()));
        }

        self.spawn_stack.push(prototype.to_string());
        let result = self.scoped(graph, |pass, graph| {
            pass.construct_entity(graph, prototype, parent, id)
        });
        self.spawn_stack.pop();

        if let Ok(handle) = &result {
            log::debug!("Spawned prototype '{prototype}' as {handle:?}");
        }
        result
    }

    /// Run `build`, then resolve and init everything it queued. Rolls back
    /// this scope on any error.
    fn scoped<R>(
        &mut self,
        graph: &mut InstanceGraph,
        build: impl FnOnce(&mut Self, &mut InstanceGraph) -> Result<R, InstantiateError>,
    ) -> Result<R, InstantiateError> {
        let outer_links = mem::take(&mut self.links);
        let outer_pending = mem::take(&mut self.pending_init);
        let outer_scope = mem::take(&mut self.scope);
        let checkpoint = Checkpoint {
            entities: self.created_entities.len(),
            components: self.created_components.len(),
            initialized: graph.init_order.len(),
        };

        let result = build(self, graph).and_then(|value| {
            self.resolve_links(graph)?;
            self.init_pending(graph)?;
            Ok(value)
        });

        if let Err(err) = &result {
            log::debug!("Rolling back build scope: {err}");
            self.rollback(graph, &checkpoint);
        }

        self.links = outer_links;
        self.pending_init = outer_pending;
        self.scope = outer_scope;
        result
    }

    fn register(
        &mut self,
        id: &str,
        resource_id: &str,
        instance: Instance,
    ) -> Result<(), InstantiateError> {
        self.ids.insert(id, resource_id, instance)?;
        self.scope
            .entry(resource_id.to_string())
            .or_default()
            .push(instance);
        Ok(())
    }

    // ── Stage 1: build ──────────────────────────────────────────────────

    /// Build one entity, its components and (recursively) its children.
    ///
    /// Component types and the dependency order are checked before anything
    /// of the entity is created.
    fn construct_entity(
        &mut self,
        graph: &mut InstanceGraph,
        resource_id: &str,
        parent: Option<EntityHandle>,
        explicit_id: Option<&str>,
    ) -> Result<EntityHandle, InstantiateError> {
        let resources = Rc::clone(&self.resources);
        let registry = Rc::clone(&self.registry);
        let resource = resources
            .entity(resource_id)
            .ok_or_else(|| InstantiateError::UnknownEntity(resource_id.to_string()))?;

        let mut indices = Vec::with_capacity(resource.components.len());
        let mut types: Vec<&'static str> = Vec::with_capacity(resource.components.len());
        for component_id in &resource.components {
            let index = resources
                .component_index(component_id)
                .ok_or_else(|| InstantiateError::UnknownComponent(component_id.clone()))?;
            let component = resources.component_at(index);
            let type_name = registry.static_name(&component.type_name).ok_or_else(|| {
                InstantiateError::UnknownType {
                    component: component.id.clone(),
                    type_name: component.type_name.clone(),
                }
            })?;
            indices.push(index);
            types.push(type_name);
        }

        let order = dependency_order(types.len(), |a, b| {
            registry
                .dependencies(types[a])
                .iter()
                .any(|dep| registry.is_kind_of(types[b], dep))
        })
        .map_err(|cycle| InstantiateError::DependencyCycle {
            entity: resource.id.clone(),
            cycle: cycle.into_iter().map(|i| types[i].to_string()).collect(),
        })?;

        let id = match explicit_id {
            Some(id) => id.to_string(),
            None => self.ids.generate_id(&resource.id),
        };
        let handle = EntityHandle(graph.entities.insert(EntityNode {
            id: id.clone(),
            resource_id: resource.id.clone(),
            parent,
            children: Vec::new(),
            components: Vec::new(),
        }));
        self.created_entities.push(handle);
        self.register(&id, &resource.id, Instance::Entity(handle))?;
        match parent {
            Some(parent) => {
                if let Some(node) = graph.entities.get_mut(parent.0) {
                    node.children.push(handle);
                }
            }
            None => graph.roots.push(handle),
        }

        let mut handles = Vec::with_capacity(indices.len());
        for (&index, &type_name) in indices.iter().zip(&types) {
            handles.push(self.construct_component(graph, &registry, handle, index, type_name)?);
        }
        self.pending_init
            .push((handle, order.iter().map(|&i| handles[i]).collect()));

        for child in &resource.children {
            self.construct_entity(graph, child, Some(handle), None)?;
        }

        Ok(handle)
    }

    fn construct_component(
        &mut self,
        graph: &mut InstanceGraph,
        registry: &TypeRegistry,
        entity: EntityHandle,
        index: usize,
        type_name: &'static str,
    ) -> Result<ComponentHandle, InstantiateError> {
        let resources = Rc::clone(&self.resources);
        let resource = resources.component_at(index);
        let id = self.ids.generate_id(&resource.id);

        let handle = ComponentHandle(graph.components.insert(ComponentSlot {
            id: id.clone(),
            resource_index: index,
            resource_id: resource.id.clone(),
            type_name,
            entity,
            instance: None,
            initialized: false,
        }));
        self.created_components.push(handle);
        if let Some(node) = graph.entities.get_mut(entity.0) {
            node.components.push(handle);
        }
        self.register(&id, &resource.id, Instance::Component(handle))?;

        let mut cx = CreateContext::new(resource, handle, &mut self.links);
        let instance = registry.construct(type_name, &mut cx)?;
        if let Some(slot) = graph.components.get_mut(handle.0) {
            slot.instance = Some(instance);
        }
        Ok(handle)
    }

    // ── Stage 2: resolve ────────────────────────────────────────────────

    fn resolve_links(&mut self, graph: &InstanceGraph) -> Result<(), InstantiateError> {
        for link in mem::take(&mut self.links) {
            if let Err(reason) = self.resolve(graph, &link) {
                let owner = graph
                    .components
                    .get(link.owner.0)
                    .map(|slot| slot.id.clone())
                    .unwrap_or_default();
                let expected = link.link.expected();
                return Err(InstantiateError::UnresolvedPointer {
                    owner,
                    field: link.field,
                    target: link.target,
                    expected,
                    reason,
                });
            }
            log::trace!("Bound pointer '{}' -> '{}'", link.field, link.target);
        }
        Ok(())
    }

    fn resolve(&self, graph: &InstanceGraph, link: &PendingLink) -> Result<(), PointerFailure> {
        let wants_component = matches!(link.link, LinkTarget::Component { .. });
        let found = match parse_target(&link.target, wants_component)? {
            Target::Direct(id) => self.lookup_direct(&id)?,
            Target::Path {
                root,
                steps,
                component,
            } => {
                let owner_entity = graph
                    .components
                    .get(link.owner.0)
                    .map(|slot| slot.entity)
                    .ok_or(PointerFailure::NotFound)?;

                let mut entity = match root {
                    PathRoot::Owner => owner_entity,
                    PathRoot::Parent => parent_of(graph, owner_entity)?,
                    PathRoot::Entity(id) => match self.ids.get(&id) {
                        Some(Instance::Entity(handle)) => handle,
                        Some(Instance::Component(handle)) => {
                            return Err(mismatch(graph, Instance::Component(handle)));
                        }
                        None => return Err(PointerFailure::NotFound),
                    },
                };
                for step in steps {
                    entity = match step {
                        PathStep::Current => entity,
                        PathStep::Parent => parent_of(graph, entity)?,
                        PathStep::Child { id, index } => child_of(graph, entity, &id, index)?,
                    };
                }

                match component {
                    Some(id) => Instance::Component(component_on(graph, entity, &id)?),
                    None => Instance::Entity(entity),
                }
            }
        };

        match (&link.link, found) {
            (LinkTarget::Component { kind, exact, cell }, Instance::Component(handle)) => {
                let slot = graph.components.get(handle.0).ok_or(PointerFailure::NotFound)?;
                let accepted = if *exact {
                    slot.type_name == *kind
                } else {
                    self.registry.is_kind_of(slot.type_name, kind)
                };
                if !accepted {
                    return Err(PointerFailure::TypeMismatch {
                        found: slot.type_name.to_string(),
                    });
                }
                let _ = cell.set(handle);
                Ok(())
            }
            (LinkTarget::Entity { cell }, Instance::Entity(handle)) => {
                let _ = cell.set(handle);
                Ok(())
            }
            (_, other) => Err(mismatch(graph, other)),
        }
    }

    /// A bare id: instances of that resource in the current scope, else in
    /// the whole table, else an instance id. Must match exactly one.
    fn lookup_direct(&self, id: &str) -> Result<Instance, PointerFailure> {
        let local = self.scope.get(id).map(Vec::as_slice).unwrap_or(&[]);
        let candidates = if local.is_empty() {
            self.ids.instances_of(id)
        } else {
            local
        };
        match candidates {
            [] => self.ids.get(id).ok_or(PointerFailure::NotFound),
            [only] => Ok(*only),
            many => Err(PointerFailure::Ambiguous(many.len())),
        }
    }

    // ── Stage 3: init ───────────────────────────────────────────────────

    fn init_pending(&mut self, graph: &mut InstanceGraph) -> Result<(), InstantiateError> {
        for (_, order) in mem::take(&mut self.pending_init) {
            for handle in order {
                self.init_component(graph, handle)?;
            }
        }
        Ok(())
    }

    fn init_component(
        &mut self,
        graph: &mut InstanceGraph,
        handle: ComponentHandle,
    ) -> Result<(), InstantiateError> {
        let Some(slot) = graph.components.get_mut(handle.0) else {
            return Ok(());
        };
        let Some(mut instance) = slot.instance.take() else {
            return Ok(());
        };
        let entity = slot.entity;
        let resource_index = slot.resource_index;
        let id = slot.id.clone();

        let resources = Rc::clone(&self.resources);
        let resource = resources.component_at(resource_index);
        let result = {
            let mut cx = InitContext::new(graph, self, resource, entity, handle);
            instance.init(&mut cx)
        };

        let initialized = result.is_ok();
        if let Some(slot) = graph.components.get_mut(handle.0) {
            slot.instance = Some(instance);
            slot.initialized = initialized;
        }

        match result {
            Ok(()) => {
                graph.init_order.push(handle);
                log::debug!("Initialized component '{id}'");
                Ok(())
            }
            Err(InitError::Message(message)) => {
                Err(InstantiateError::InitFailed { component: id, message })
            }
            Err(InitError::Spawn(err)) => Err(err),
        }
    }

    // ── Rollback ────────────────────────────────────────────────────────

    fn rollback(&mut self, graph: &mut InstanceGraph, checkpoint: &Checkpoint) {
        let keep = checkpoint.initialized.min(graph.init_order.len());
        let initialized = graph.init_order.split_off(keep);
        for &handle in initialized.iter().rev() {
            if let Some(instance) = graph.component_dyn_mut(handle) {
                instance.on_destroy();
            }
        }

        let components = self.created_components.split_off(checkpoint.components);
        for handle in components {
            if let Some(slot) = graph.components.get(handle.0) {
                self.ids
                    .remove(&slot.id, &slot.resource_id, Instance::Component(handle));
            }
            graph.remove_component(handle);
        }

        let entities = self.created_entities.split_off(checkpoint.entities);
        for handle in entities.into_iter().rev() {
            if let Some(node) = graph.entities.get(handle.0) {
                self.ids
                    .remove(&node.id, &node.resource_id, Instance::Entity(handle));
            }
            graph.detach(handle);
            graph.remove_entity(handle);
        }
    }
}

// ── Path helpers ────────────────────────────────────────────────────────

fn parent_of(graph: &InstanceGraph, entity: EntityHandle) -> Result<EntityHandle, PointerFailure> {
    graph
        .entities
        .get(entity.0)
        .and_then(|node| node.parent)
        .ok_or(PointerFailure::NotFound)
}

/// The child of `entity` built from resource `id`. Without an `index` the
/// id must match exactly one child.
fn child_of(
    graph: &InstanceGraph,
    entity: EntityHandle,
    id: &str,
    index: Option<usize>,
) -> Result<EntityHandle, PointerFailure> {
    let node = graph.entities.get(entity.0).ok_or(PointerFailure::NotFound)?;
    let matching: Vec<EntityHandle> = node
        .children
        .iter()
        .copied()
        .filter(|child| {
            graph
                .entities
                .get(child.0)
                .is_some_and(|c| c.resource_id == id)
        })
        .collect();

    match (index, matching.as_slice()) {
        (Some(index), children) => children.get(index).copied().ok_or(PointerFailure::NotFound),
        (None, []) => Err(PointerFailure::NotFound),
        (None, [only]) => Ok(*only),
        (None, many) => Err(PointerFailure::Ambiguous(many.len())),
    }
}

/// The component of `entity` with instance id or resource id `id`.
fn component_on(
    graph: &InstanceGraph,
    entity: EntityHandle,
    id: &str,
) -> Result<ComponentHandle, PointerFailure> {
    let node = graph.entities.get(entity.0).ok_or(PointerFailure::NotFound)?;
    let slots = || {
        node.components
            .iter()
            .filter_map(|&h| graph.components.get(h.0).map(|slot| (h, slot)))
    };
    slots()
        .find(|(_, slot)| slot.id == id)
        .or_else(|| slots().find(|(_, slot)| slot.resource_id == id))
        .map(|(handle, _)| handle)
        .ok_or(PointerFailure::NotFound)
}

fn mismatch(graph: &InstanceGraph, found: Instance) -> PointerFailure {
    let found = match found {
        Instance::Entity(_) => "entity".to_string(),
        Instance::Component(handle) => graph
            .components
            .get(handle.0)
            .map(|slot| slot.type_name.to_string())
            .unwrap_or_else(|| "component".to_string()),
    };
    PointerFailure::TypeMismatch { found }
}
