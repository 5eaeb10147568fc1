//! Error types for loading, instantiating, and reloading scenes.
//!
//! Every stage of the pipeline returns a `Result`. The first fatal error
//! aborts the pass and is handed back to the caller unchanged; recovery is
//! done per pass (the candidate graph is thrown away), never per object.

use std::path::PathBuf;

/// Errors raised while reading or validating a [`ResourceGraph`](crate::resource::ResourceGraph).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The scene file could not be read.
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scene file is not valid JSON, or does not match the resource layout.
    #[error("failed to parse scene: {0}")]
    Json(#[from] serde_json::Error),

    /// Two resources share the same identifier.
    #[error("duplicate resource id '{0}'")]
    DuplicateId(String),

    /// A resource was declared with an empty identifier.
    #[error("encountered resource without an id")]
    MissingId,

    /// An entity lists a component id that does not exist.
    #[error("entity '{entity}' references unknown component '{component}'")]
    UnknownComponent { entity: String, component: String },

    /// An entity lists a child id that does not exist.
    #[error("entity '{entity}' references unknown child entity '{child}'")]
    UnknownChild { entity: String, child: String },

    /// The child relation loops back on itself.
    #[error("entity hierarchy contains a cycle: {}", .0.join(" -> "))]
    ChildCycle(Vec<String>),
}

/// Why a single pointer field could not be bound.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointerFailure {
    #[error("target not found")]
    NotFound,

    #[error("target is ambiguous ({0} matches); use a path or 'child_id:child_index'")]
    Ambiguous(usize),

    #[error("target is of type '{found}'")]
    TypeMismatch { found: String },

    #[error("{0}")]
    InvalidPath(String),
}

/// Errors raised while building, resolving, or initializing an instance graph.
#[derive(Debug, thiserror::Error)]
pub enum InstantiateError {
    /// The declared component dependencies of one entity form a cycle.
    #[error("dependency cycle on entity '{entity}': {}", .cycle.join(" -> "))]
    DependencyCycle { entity: String, cycle: Vec<String> },

    /// The type registry has no type with this name.
    #[error("component '{component}' has unknown type '{type_name}'")]
    UnknownType { component: String, type_name: String },

    /// The type is registered but has no factory (an abstract base type).
    #[error("component '{component}' has type '{type_name}' which cannot be constructed")]
    NotConstructible { component: String, type_name: String },

    /// A property value was missing or had the wrong shape.
    #[error("component '{component}': property '{property}' {reason}")]
    Property {
        component: String,
        property: String,
        reason: String,
    },

    /// A component's `init()` reported failure.
    #[error("failed to init component '{component}': {message}")]
    InitFailed { component: String, message: String },

    /// A pointer field could not be resolved.
    #[error("unable to resolve pointer '{field}' on '{owner}' to '{target}' (expected {expected}): {reason}")]
    UnresolvedPointer {
        owner: String,
        field: String,
        target: String,
        expected: String,
        reason: PointerFailure,
    },

    /// Two instances registered the same identifier within one pass.
    #[error("duplicate instance id '{0}'")]
    DuplicateId(String),

    /// An entity lists a component resource that does not exist.
    #[error("unknown component resource '{0}'")]
    UnknownComponent(String),

    /// A spawn named an entity resource that does not exist.
    #[error("unknown entity resource '{0}'")]
    UnknownEntity(String),

    /// A prototype tried to spawn itself while it was being instantiated.
    #[error("prototype '{0}' spawns itself recursively")]
    RecursiveSpawn(String),
}

/// Errors raised by a (re)load of a scene from disk or from data.
///
/// On any of these the previously running graph is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Instantiate(#[from] InstantiateError),
}

/// The error a component returns from [`Component::init`](crate::component::Component::init).
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// A plain failure message; reported verbatim as [`InstantiateError::InitFailed`].
    #[error("{0}")]
    Message(String),

    /// A nested prototype spawn failed. The inner error is propagated as-is.
    #[error(transparent)]
    Spawn(#[from] InstantiateError),
}

impl InitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl From<String> for InitError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for InitError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}
