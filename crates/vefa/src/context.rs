//! # Contexts — What a Component Sees at Each Stage
//!
//! ```text
//! CreateContext   create()   own resource, property reads, pointer declarations
//! InitContext     init()     own resource, live graph, prototype spawning
//! UpdateContext   update()   live graph, owner entity
//! ```
//!
//! None of them expose the id table of the build pass: components see the
//! graph only through handles and already-bound pointers.

use std::cell::OnceCell;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::builder::BuildPass;
use crate::component::ComponentType;
use crate::error::InstantiateError;
use crate::instance::{ComponentHandle, EntityHandle, EntityRef, InstanceGraph};
use crate::ptr::{AnyComponentPtr, ComponentPtr, EntityPtr, LinkTarget, PendingLink};
use crate::resource::ComponentResource;

fn property_error(
    resource: &ComponentResource,
    name: &str,
    reason: impl Into<String>,
) -> InstantiateError {
    InstantiateError::Property {
        component: resource.id.clone(),
        property: name.to_string(),
        reason: reason.into(),
    }
}

/// Read an optional property. Missing and `null` both read as `None`.
fn read_property<V: DeserializeOwned>(
    resource: &ComponentResource,
    name: &str,
) -> Result<Option<V>, InstantiateError> {
    match resource.properties.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| property_error(resource, name, format!("is invalid: {e}"))),
    }
}

// ── CreateContext ───────────────────────────────────────────────────────

/// Passed to [`ComponentType::create`].
///
/// Pointer declarations return unbound pointers and queue a pending link;
/// the build pass binds them all before any `init()` runs.
pub struct CreateContext<'a> {
    resource: &'a ComponentResource,
    owner: ComponentHandle,
    links: &'a mut Vec<PendingLink>,
}

impl<'a> CreateContext<'a> {
    pub(crate) fn new(
        resource: &'a ComponentResource,
        owner: ComponentHandle,
        links: &'a mut Vec<PendingLink>,
    ) -> Self {
        Self {
            resource,
            owner,
            links,
        }
    }

    pub fn resource(&self) -> &ComponentResource {
        self.resource
    }

    /// A required property.
    pub fn property<V: DeserializeOwned>(&self, name: &str) -> Result<V, InstantiateError> {
        read_property(self.resource, name)?
            .ok_or_else(|| property_error(self.resource, name, "is missing"))
    }

    /// An optional property with a fallback.
    pub fn property_or<V: DeserializeOwned>(
        &self,
        name: &str,
        default: V,
    ) -> Result<V, InstantiateError> {
        Ok(read_property(self.resource, name)?.unwrap_or(default))
    }

    pub fn optional_property<V: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<V>, InstantiateError> {
        read_property(self.resource, name)
    }

    /// A pointer target string; missing, `null` and `""` read as `None`.
    fn target(&self, field: &str) -> Result<Option<String>, InstantiateError> {
        match self.resource.properties.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(property_error(
                self.resource,
                field,
                "must be a pointer string",
            )),
        }
    }

    fn required_target(&self, field: &str) -> Result<String, InstantiateError> {
        self.target(field)?
            .ok_or_else(|| property_error(self.resource, field, "is missing"))
    }

    fn link_component(
        &mut self,
        field: String,
        target: String,
        kind: &'static str,
        exact: bool,
    ) -> Rc<OnceCell<ComponentHandle>> {
        let cell = Rc::new(OnceCell::new());
        self.links.push(PendingLink {
            owner: self.owner,
            field,
            target,
            link: LinkTarget::Component {
                kind,
                exact,
                cell: Rc::clone(&cell),
            },
        });
        cell
    }

    fn link_entity(&mut self, field: String, target: String) -> Rc<OnceCell<EntityHandle>> {
        let cell = Rc::new(OnceCell::new());
        self.links.push(PendingLink {
            owner: self.owner,
            field,
            target,
            link: LinkTarget::Entity {
                cell: Rc::clone(&cell),
            },
        });
        cell
    }

    /// A required pointer to a component of exactly type `T`.
    pub fn component_ptr<T: ComponentType>(
        &mut self,
        field: &str,
    ) -> Result<ComponentPtr<T>, InstantiateError> {
        let target = self.required_target(field)?;
        let cell = self.link_component(field.to_string(), target.clone(), T::TYPE_NAME, true);
        Ok(ComponentPtr::new(target, cell))
    }

    /// Like [`component_ptr`](Self::component_ptr), but an absent field
    /// yields `None` instead of an error.
    pub fn optional_component_ptr<T: ComponentType>(
        &mut self,
        field: &str,
    ) -> Result<Option<ComponentPtr<T>>, InstantiateError> {
        let Some(target) = self.target(field)? else {
            return Ok(None);
        };
        let cell = self.link_component(field.to_string(), target.clone(), T::TYPE_NAME, true);
        Ok(Some(ComponentPtr::new(target, cell)))
    }

    /// A required pointer to any component that is a kind of `kind`.
    pub fn any_component_ptr(
        &mut self,
        field: &str,
        kind: &'static str,
    ) -> Result<AnyComponentPtr, InstantiateError> {
        let target = self.required_target(field)?;
        let cell = self.link_component(field.to_string(), target.clone(), kind, false);
        Ok(AnyComponentPtr::new(target, kind, cell))
    }

    /// A list of component pointers. A missing field is an empty list.
    pub fn component_ptr_list<T: ComponentType>(
        &mut self,
        field: &str,
    ) -> Result<Vec<ComponentPtr<T>>, InstantiateError> {
        let targets: Vec<String> = match self.resource.properties.get(field) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) if !s.is_empty() => Ok(s.clone()),
                    _ => Err(property_error(
                        self.resource,
                        field,
                        "must be a list of pointer strings",
                    )),
                })
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(property_error(
                    self.resource,
                    field,
                    "must be a list of pointer strings",
                ));
            }
        };

        Ok(targets
            .into_iter()
            .enumerate()
            .map(|(index, target)| {
                let cell = self.link_component(
                    format!("{field}[{index}]"),
                    target.clone(),
                    T::TYPE_NAME,
                    true,
                );
                ComponentPtr::new(target, cell)
            })
            .collect())
    }

    /// A required pointer to an entity.
    pub fn entity_ptr(&mut self, field: &str) -> Result<EntityPtr, InstantiateError> {
        let target = self.required_target(field)?;
        let cell = self.link_entity(field.to_string(), target.clone());
        Ok(EntityPtr::new(target, cell))
    }

    pub fn optional_entity_ptr(&mut self, field: &str) -> Result<Option<EntityPtr>, InstantiateError> {
        let Some(target) = self.target(field)? else {
            return Ok(None);
        };
        let cell = self.link_entity(field.to_string(), target.clone());
        Ok(Some(EntityPtr::new(target, cell)))
    }
}

// ── InitContext ─────────────────────────────────────────────────────────

/// Passed to [`Component::init`](crate::component::Component::init).
///
/// All pointers of the pass are bound by now. Targets on earlier entities and
/// dependencies on the same entity are initialized; other targets exist but
/// may not be.
pub struct InitContext<'a> {
    graph: &'a mut InstanceGraph,
    pass: &'a mut BuildPass,
    resource: &'a ComponentResource,
    entity: EntityHandle,
    component: ComponentHandle,
}

impl<'a> InitContext<'a> {
    pub(crate) fn new(
        graph: &'a mut InstanceGraph,
        pass: &'a mut BuildPass,
        resource: &'a ComponentResource,
        entity: EntityHandle,
        component: ComponentHandle,
    ) -> Self {
        Self {
            graph,
            pass,
            resource,
            entity,
            component,
        }
    }

    pub fn resource(&self) -> &ComponentResource {
        self.resource
    }

    pub fn property<V: DeserializeOwned>(&self, name: &str) -> Result<V, InstantiateError> {
        read_property(self.resource, name)?
            .ok_or_else(|| property_error(self.resource, name, "is missing"))
    }

    pub fn property_or<V: DeserializeOwned>(
        &self,
        name: &str,
        default: V,
    ) -> Result<V, InstantiateError> {
        Ok(read_property(self.resource, name)?.unwrap_or(default))
    }

    pub fn graph(&self) -> &InstanceGraph {
        &*self.graph
    }

    pub fn graph_mut(&mut self) -> &mut InstanceGraph {
        &mut *self.graph
    }

    /// The entity that owns the initializing component.
    pub fn entity(&self) -> Option<EntityRef<'_>> {
        self.graph.entity(self.entity)
    }

    pub fn entity_handle(&self) -> EntityHandle {
        self.entity
    }

    pub fn component_handle(&self) -> ComponentHandle {
        self.component
    }

    /// Instantiate a prototype entity as a new root.
    ///
    /// The subtree is built, resolved and initialized before this returns. On
    /// failure nothing of it remains; returning the error from `init()` fails
    /// the enclosing pass with that same error.
    pub fn spawn(&mut self, prototype: &str) -> Result<EntityHandle, InstantiateError> {
        self.pass.spawn(&mut *self.graph, prototype, None, None)
    }

    /// Instantiate a prototype entity as a child of the owner entity.
    pub fn spawn_child(&mut self, prototype: &str) -> Result<EntityHandle, InstantiateError> {
        self.pass.spawn(&mut *self.graph, prototype, Some(self.entity), None)
    }
}

// ── UpdateContext ───────────────────────────────────────────────────────

/// Passed to [`Component::update`](crate::component::Component::update).
///
/// The updating component is out of the graph for the duration of the call,
/// so pointers to itself dereference to `None`.
pub struct UpdateContext<'a> {
    graph: &'a mut InstanceGraph,
    entity: EntityHandle,
    component: ComponentHandle,
}

impl<'a> UpdateContext<'a> {
    pub(crate) fn new(
        graph: &'a mut InstanceGraph,
        entity: EntityHandle,
        component: ComponentHandle,
    ) -> Self {
        Self {
            graph,
            entity,
            component,
        }
    }

    pub fn graph(&self) -> &InstanceGraph {
        &*self.graph
    }

    pub fn graph_mut(&mut self) -> &mut InstanceGraph {
        &mut *self.graph
    }

    pub fn entity(&self) -> Option<EntityRef<'_>> {
        self.graph.entity(self.entity)
    }

    pub fn entity_handle(&self) -> EntityHandle {
        self.entity
    }

    pub fn component_handle(&self) -> ComponentHandle {
        self.component
    }
}
