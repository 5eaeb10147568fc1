//! Component fixtures shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::component::{Component, ComponentType};
use crate::components::register_builtin;
use crate::components::transform::Transform;
use crate::context::{CreateContext, InitContext, UpdateContext};
use crate::error::{InitError, InstantiateError};
use crate::instance::EntityHandle;
use crate::ptr::{AnyComponentPtr, ComponentPtr, EntityPtr};
use crate::registry::TypeRegistry;

pub type Log = Rc<RefCell<Vec<String>>>;

thread_local! {
    static LOG: RefCell<Option<Log>> = const { RefCell::new(None) };
}

/// Run `f` with `log` as the destination of every `Recorder` created inside.
pub fn with_log<R>(log: &Log, f: impl FnOnce() -> R) -> R {
    LOG.with(|current| *current.borrow_mut() = Some(Rc::clone(log)));
    let result = f();
    LOG.with(|current| *current.borrow_mut() = None);
    result
}

pub fn log_of(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

/// Abstract `Node`, the built-ins, and every fixture below.
pub fn fixture_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register_abstract("Node", None);
    register_builtin(&mut registry);
    registry.register::<Base>();
    registry.register::<Derived>();
    registry.register::<NeedsBase>();
    registry.register::<CycleA>();
    registry.register::<CycleB>();
    registry.register::<SelfDependent>();
    registry.register::<Recorder>();
    registry.register::<LateRecorder>();
    registry.register::<SelfDestruct>();
    registry.register::<FailingInit>();
    registry.register::<Linker>();
    registry.register::<NodeLinker>();
    registry.register::<BaseLinker>();
    registry.register::<Spawner>();
    registry
}

// ── Kinds ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Base {
    pub value: i64,
}

impl Component for Base {}

impl ComponentType for Base {
    const TYPE_NAME: &'static str = "Base";
    const BASE_TYPE: Option<&'static str> = Some("Node");

    fn create(cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError> {
        Ok(Self {
            value: cx.property_or("Value", 0)?,
        })
    }
}

#[derive(Debug, Default)]
pub struct Derived {
    pub value: i64,
}

impl Component for Derived {}

impl ComponentType for Derived {
    const TYPE_NAME: &'static str = "Derived";
    const BASE_TYPE: Option<&'static str> = Some("Base");

    fn create(cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError> {
        Ok(Self {
            value: cx.property_or("Value", 0)?,
        })
    }
}

// ── Dependencies ────────────────────────────────────────────────────────

macro_rules! dependent_fixture {
    ($name:ident, $deps:expr) => {
        #[derive(Debug, Default)]
        pub struct $name;

        impl Component for $name {}

        impl ComponentType for $name {
            const TYPE_NAME: &'static str = stringify!($name);
            const DEPENDENCIES: &'static [&'static str] = $deps;

            fn create(_cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError> {
                Ok(Self)
            }
        }
    };
}

dependent_fixture!(NeedsBase, &["Base"]);
dependent_fixture!(CycleA, &["CycleB"]);
dependent_fixture!(CycleB, &["CycleA"]);
dependent_fixture!(SelfDependent, &["SelfDependent"]);

// ── Lifecycle ───────────────────────────────────────────────────────────

/// Logs `init`, `update` and `destroy` with its resource id.
#[derive(Debug)]
pub struct Recorder {
    id: String,
    log: Option<Log>,
}

impl Recorder {
    fn record(&self, event: &str) {
        if let Some(log) = &self.log {
            log.borrow_mut().push(format!("{event} {}", self.id));
        }
    }
}

impl Component for Recorder {
    fn init(&mut self, _cx: &mut InitContext<'_>) -> Result<(), InitError> {
        self.record("init");
        Ok(())
    }

    fn update(&mut self, _delta_time: f64, _cx: &mut UpdateContext<'_>) {
        self.record("update");
    }

    fn on_destroy(&mut self) {
        self.record("destroy");
    }
}

impl ComponentType for Recorder {
    const TYPE_NAME: &'static str = "Recorder";

    fn create(cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError> {
        Ok(Self {
            id: cx.resource().id.clone(),
            log: LOG.with(|current| current.borrow().clone()),
        })
    }
}

/// A `Recorder` that depends on `Recorder`.
#[derive(Debug)]
pub struct LateRecorder(Recorder);

impl Component for LateRecorder {
    fn init(&mut self, _cx: &mut InitContext<'_>) -> Result<(), InitError> {
        self.0.record("init");
        Ok(())
    }

    fn on_destroy(&mut self) {
        self.0.record("destroy");
    }
}

impl ComponentType for LateRecorder {
    const TYPE_NAME: &'static str = "LateRecorder";
    const DEPENDENCIES: &'static [&'static str] = &["Recorder"];

    fn create(cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError> {
        Ok(Self(Recorder::create(cx)?))
    }
}

/// A `Recorder` that destroys its own entity on the first update.
#[derive(Debug)]
pub struct SelfDestruct(Recorder);

impl Component for SelfDestruct {
    fn init(&mut self, _cx: &mut InitContext<'_>) -> Result<(), InitError> {
        self.0.record("init");
        Ok(())
    }

    fn update(&mut self, _delta_time: f64, cx: &mut UpdateContext<'_>) {
        self.0.record("update");
        let entity = cx.entity_handle();
        cx.graph_mut().destroy(entity);
    }

    fn on_destroy(&mut self) {
        self.0.record("destroy");
    }
}

impl ComponentType for SelfDestruct {
    const TYPE_NAME: &'static str = "SelfDestruct";

    fn create(cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError> {
        Ok(Self(Recorder::create(cx)?))
    }
}

/// Fails `init()` the way a component waiting on the GPU would.
#[derive(Debug)]
pub struct FailingInit;

impl Component for FailingInit {
    fn init(&mut self, _cx: &mut InitContext<'_>) -> Result<(), InitError> {
        Err("GPU not ready".into())
    }
}

impl ComponentType for FailingInit {
    const TYPE_NAME: &'static str = "FailingInit";

    fn create(_cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError> {
        Ok(Self)
    }
}

// ── Pointers ────────────────────────────────────────────────────────────

/// A required `Transform` pointer, an optional entity pointer and a pointer
/// list. Remembers whether every pointer was bound when `init()` ran.
#[derive(Debug)]
pub struct Linker {
    pub target: ComponentPtr<Transform>,
    pub entity: Option<EntityPtr>,
    pub targets: Vec<ComponentPtr<Transform>>,
    pub bound_at_init: bool,
}

impl Component for Linker {
    fn init(&mut self, _cx: &mut InitContext<'_>) -> Result<(), InitError> {
        self.bound_at_init = self.target.is_bound()
            && self.entity.as_ref().is_none_or(|e| e.handle().is_some())
            && self.targets.iter().all(ComponentPtr::is_bound);
        Ok(())
    }
}

impl ComponentType for Linker {
    const TYPE_NAME: &'static str = "Linker";

    fn create(cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError> {
        Ok(Self {
            target: cx.component_ptr("Target")?,
            entity: cx.optional_entity_ptr("Entity")?,
            targets: cx.component_ptr_list("Targets")?,
            bound_at_init: false,
        })
    }
}

/// Points at any component that is a kind of `Node`.
#[derive(Debug)]
pub struct NodeLinker {
    pub node: AnyComponentPtr,
}

impl Component for NodeLinker {}

impl ComponentType for NodeLinker {
    const TYPE_NAME: &'static str = "NodeLinker";

    fn create(cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError> {
        Ok(Self {
            node: cx.any_component_ptr("Node", "Node")?,
        })
    }
}

/// Points at exactly a `Base`.
#[derive(Debug)]
pub struct BaseLinker {
    pub target: ComponentPtr<Base>,
}

impl Component for BaseLinker {}

impl ComponentType for BaseLinker {
    const TYPE_NAME: &'static str = "BaseLinker";

    fn create(cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError> {
        Ok(Self {
            target: cx.component_ptr("Target")?,
        })
    }
}

// ── Spawning ────────────────────────────────────────────────────────────

/// Spawns `Prototype` in `init()`, as a child when `AsChild` is set.
#[derive(Debug)]
pub struct Spawner {
    prototype: String,
    as_child: bool,
    pub spawned: Option<EntityHandle>,
}

impl Component for Spawner {
    fn init(&mut self, cx: &mut InitContext<'_>) -> Result<(), InitError> {
        let spawned = if self.as_child {
            cx.spawn_child(&self.prototype)?
        } else {
            cx.spawn(&self.prototype)?
        };
        self.spawned = Some(spawned);
        Ok(())
    }
}

impl ComponentType for Spawner {
    const TYPE_NAME: &'static str = "Spawner";

    fn create(cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError> {
        Ok(Self {
            prototype: cx.property("Prototype")?,
            as_child: cx.property_or("AsChild", false)?,
            spawned: None,
        })
    }
}
