//! # Type Registry — Names, Kinds, and Factories
//!
//! Scene files name component types by string. The registry maps each name
//! to what the pipeline needs to know about it:
//!
//! ```text
//! "OrbitController" ──► TypeInfo {
//!                          base:         None,
//!                          dependencies: ["Transform", "KeyInput"],
//!                          factory:      create_boxed::<OrbitController>,
//!                       }
//! ```
//!
//! Types form a single-inheritance is-kind-of tree through their base name.
//! Abstract types (registered with [`TypeRegistry::register_abstract`]) have
//! no factory: they can appear as pointer or dependency kinds, never as the
//! type of a component resource.

use std::any::TypeId;
use std::collections::HashMap;

use crate::component::{Component, ComponentType};
use crate::context::CreateContext;
use crate::error::InstantiateError;

type Factory = fn(&mut CreateContext<'_>) -> Result<Box<dyn Component>, InstantiateError>;

fn create_boxed<T: ComponentType>(
    cx: &mut CreateContext<'_>,
) -> Result<Box<dyn Component>, InstantiateError> {
    Ok(Box::new(T::create(cx)?))
}

/// What the registry knows about one type name.
#[derive(Clone)]
pub struct TypeInfo {
    pub name: &'static str,
    pub base: Option<&'static str>,
    pub dependencies: &'static [&'static str],
    type_id: Option<TypeId>,
    factory: Option<Factory>,
}

impl TypeInfo {
    /// `false` for abstract types.
    pub fn is_constructible(&self) -> bool {
        self.factory.is_some()
    }

    /// The Rust type behind this name, if it is concrete.
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }
}

/// Maps component type names to their [`TypeInfo`].
///
/// Register every component type a scene may reference before loading it.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    by_name: HashMap<&'static str, TypeInfo>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a concrete component type.
    ///
    /// # Panics
    ///
    /// Panics if a type with the same name is already registered.
    pub fn register<T: ComponentType>(&mut self) {
        self.insert(TypeInfo {
            name: T::TYPE_NAME,
            base: T::BASE_TYPE,
            dependencies: T::DEPENDENCIES,
            type_id: Some(TypeId::of::<T>()),
            factory: Some(create_boxed::<T> as Factory),
        });
    }

    /// Register an abstract type that concrete types can name as their base.
    ///
    /// # Panics
    ///
    /// Panics if a type with the same name is already registered.
    pub fn register_abstract(&mut self, name: &'static str, base: Option<&'static str>) {
        self.insert(TypeInfo {
            name,
            base,
            dependencies: &[],
            type_id: None,
            factory: None,
        });
    }

    fn insert(&mut self, info: TypeInfo) {
        if self.by_name.contains_key(info.name) {
            panic!(
                "component type '{}' is already registered; type names must be unique",
                info.name
            );
        }
        self.by_name.insert(info.name, info);
    }

    pub fn get(&self, name: &str) -> Option<&TypeInfo> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// `true` if `type_name` is `kind` or (transitively) derives from it.
    ///
    /// Unknown names are only kind-of themselves.
    pub fn is_kind_of(&self, type_name: &str, kind: &str) -> bool {
        let mut current = Some(type_name);
        // Bounded walk: a malformed base chain cannot loop forever.
        for _ in 0..=self.by_name.len() {
            match current {
                Some(name) if name == kind => return true,
                Some(name) => current = self.by_name.get(name).and_then(|info| info.base),
                None => return false,
            }
        }
        false
    }

    /// Declared dependency types of `type_name` (empty for unknown types).
    pub fn dependencies(&self, type_name: &str) -> &'static [&'static str] {
        self.by_name
            .get(type_name)
            .map(|info| info.dependencies)
            .unwrap_or(&[])
    }

    /// Build a component instance of `type_name` from the resource in `cx`.
    pub fn construct(
        &self,
        type_name: &str,
        cx: &mut CreateContext<'_>,
    ) -> Result<Box<dyn Component>, InstantiateError> {
        let info = self
            .by_name
            .get(type_name)
            .ok_or_else(|| InstantiateError::UnknownType {
                component: cx.resource().id.clone(),
                type_name: type_name.to_string(),
            })?;
        let factory = info.factory.ok_or_else(|| InstantiateError::NotConstructible {
            component: cx.resource().id.clone(),
            type_name: type_name.to_string(),
        })?;
        factory(cx)
    }

    /// Resolve a registered name to its `'static` form.
    pub(crate) fn static_name(&self, name: &str) -> Option<&'static str> {
        self.by_name.get(name).map(|info| info.name)
    }
}
