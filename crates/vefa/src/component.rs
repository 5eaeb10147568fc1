//! # Components — Runtime Behavior Attached to Entities
//!
//! A component type is a plain Rust struct that implements [`Component`]
//! (runtime behavior) and [`ComponentType`] (static identity plus a factory
//! that builds it from its resource).
//!
//! ```ignore
//! struct Spin { speed: f32, transform: ComponentPtr<Transform> }
//!
//! impl ComponentType for Spin {
//!     const TYPE_NAME: &'static str = "Spin";
//!     const DEPENDENCIES: &'static [&'static str] = &[Transform::TYPE_NAME];
//!
//!     fn create(cx: &mut CreateContext) -> Result<Self, InstantiateError> {
//!         Ok(Self {
//!             speed: cx.property_or("Speed", 1.0)?,
//!             transform: cx.component_ptr("Transform")?,
//!         })
//!     }
//! }
//!
//! impl Component for Spin {
//!     fn update(&mut self, dt: f64, cx: &mut UpdateContext) { /* ... */ }
//! }
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! create()      once, while the entity tree is constructed (pointers unbound)
//! init()        once, after every pointer is bound, in dependency order
//! update(dt)    once per frame, depth-first, parents before children
//! on_destroy()  once, in reverse init order, before the instance is dropped
//! ```
//!
//! `on_destroy()` is only called on components whose `init()` succeeded.

use std::any::Any;

use crate::context::{CreateContext, InitContext, UpdateContext};
use crate::error::{InitError, InstantiateError};

/// Upcast to [`Any`] for downcasting trait objects back to concrete types.
///
/// Implemented for every `'static` type; call it on `&dyn Component`, not on
/// the `Box` that owns it.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Runtime behavior of a component instance.
pub trait Component: AsAny {
    /// Called once after all pointers of the pass are bound and every
    /// dependency on the same entity is initialized.
    ///
    /// Returning an error fails the whole instantiation pass.
    fn init(&mut self, _cx: &mut InitContext<'_>) -> Result<(), InitError> {
        Ok(())
    }

    /// Called once per frame.
    fn update(&mut self, _delta_time: f64, _cx: &mut UpdateContext<'_>) {}

    /// Called once before the instance is torn down.
    fn on_destroy(&mut self) {}
}

/// Static identity of a concrete component type.
pub trait ComponentType: Component + Sized {
    /// Name used in scene files and in the [`TypeRegistry`](crate::registry::TypeRegistry).
    const TYPE_NAME: &'static str;

    /// Parent type in the is-kind-of hierarchy.
    const BASE_TYPE: Option<&'static str> = None;

    /// Types that must be initialized before this one when present on the
    /// same entity. A dependency is satisfied by any component that is
    /// kind-of the named type.
    const DEPENDENCIES: &'static [&'static str] = &[];

    /// Build the instance from its resource. Pointer fields are declared here
    /// and bound later, before `init()`.
    fn create(cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError>;
}

pub(crate) fn downcast_ref<T: ComponentType>(component: &dyn Component) -> Option<&T> {
    component.as_any().downcast_ref::<T>()
}

pub(crate) fn downcast_mut<T: ComponentType>(component: &mut dyn Component) -> Option<&mut T> {
    component.as_any_mut().downcast_mut::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Base, Derived};

    #[test]
    fn downcast_matches_concrete_type_only() {
        let base: Box<dyn Component> = Box::new(Base::default());
        let derived: Box<dyn Component> = Box::new(Derived::default());

        assert!(downcast_ref::<Base>(&*base).is_some());
        assert!(downcast_ref::<Derived>(&*base).is_none());
        assert!(downcast_ref::<Base>(&*derived).is_none());
    }

    #[test]
    fn downcast_mut_allows_mutation() {
        let mut base: Box<dyn Component> = Box::new(Base::default());
        downcast_mut::<Base>(&mut *base).unwrap().value = 7;
        assert_eq!(downcast_ref::<Base>(&*base).unwrap().value, 7);
    }
}
