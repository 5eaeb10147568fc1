//! # Transform — Position, Rotation, Scale
//!
//! The local transform of an entity, plus the world-space matrix computed by
//! [`update_transforms`].
//!
//! ```json
//! { "id": "CamTransform", "type": "Transform",
//!   "properties": { "Translation": [0, 2, 8], "Rotation": [0, 0, 0, 1], "Scale": [1, 1, 1] } }
//! ```
//!
//! Rotation is a quaternion in `[x, y, z, w]` order. Every property is
//! optional and defaults to identity.

use glam::{Mat4, Quat, Vec3};

use crate::component::{Component, ComponentType};
use crate::context::CreateContext;
use crate::error::InstantiateError;
use crate::instance::{EntityHandle, InstanceGraph};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// World-space matrix as of the last [`update_transforms`].
    pub global: Mat4,
}

impl Transform {
    /// Identity transform (origin, no rotation, uniform scale of 1).
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
        global: Mat4::IDENTITY,
    };

    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            ..Self::IDENTITY
        }
    }

    /// Rotate so that -Z points from the current position toward `target`.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        if (target - self.translation).length_squared() <= f32::EPSILON {
            return;
        }
        let look = Mat4::look_at_rh(self.translation, target, up);
        let (_, rotation, _) = look.inverse().to_scale_rotation_translation();
        self.rotation = rotation;
    }

    /// The local 4x4 model matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// World-space position as of the last [`update_transforms`].
    pub fn global_translation(&self) -> Vec3 {
        self.global.w_axis.truncate()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for Transform {}

impl ComponentType for Transform {
    const TYPE_NAME: &'static str = "Transform";

    fn create(cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError> {
        let translation = cx.property_or("Translation", Vec3::ZERO)?;
        let rotation: Quat = cx.property_or("Rotation", Quat::IDENTITY)?;
        let scale = cx.property_or("Scale", Vec3::ONE)?;
        let mut transform = Self {
            translation,
            rotation: rotation.normalize(),
            scale,
            global: Mat4::IDENTITY,
        };
        transform.global = transform.matrix();
        Ok(transform)
    }
}

/// Propagate local transforms down the entity hierarchy.
///
/// - Roots get `global = local.matrix()`.
/// - Children get `global = parent_global * local.matrix()`.
/// - Entities without a `Transform` pass their parent's matrix through.
///
/// Traversal is depth-first, so parents are always computed before children.
pub fn update_transforms(graph: &mut InstanceGraph) {
    let roots = graph.roots.clone();
    for root in roots {
        propagate(graph, root, Mat4::IDENTITY);
    }
}

fn propagate(graph: &mut InstanceGraph, entity: EntityHandle, parent: Mat4) {
    let Some(node) = graph.entity(entity) else {
        return;
    };
    let handle = node.find_component_handle::<Transform>();
    let children: Vec<_> = node.children().map(|child| child.handle()).collect();

    let global = match handle.and_then(|h| graph.component_as_mut::<Transform>(h)) {
        Some(transform) => {
            transform.global = parent * transform.matrix();
            transform.global
        }
        None => parent,
    };

    for child in children {
        propagate(graph, child, global);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::builder::build_graph;
    use crate::resource::ResourceGraph;
    use crate::testing::fixture_registry;

    fn build(value: serde_json::Value) -> InstanceGraph {
        let resources = ResourceGraph::from_value(value).unwrap();
        build_graph(Rc::new(fixture_registry()), Rc::new(resources)).unwrap()
    }

    fn global_x(graph: &InstanceGraph, entity: &str) -> f32 {
        graph
            .find_entity(entity)
            .unwrap()
            .find_component::<Transform>()
            .unwrap()
            .global_translation()
            .x
    }

    #[test]
    fn properties_default_to_identity() {
        let graph = build(json!({
            "components": [{ "id": "T", "type": "Transform" }],
            "entities": [{ "id": "E", "components": ["T"] }]
        }));
        let t = graph.find_entity("E").unwrap().find_component::<Transform>().unwrap();
        assert_eq!(t.translation, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn malformed_translation_is_a_property_error() {
        let resources = ResourceGraph::from_value(json!({
            "components": [{ "id": "T", "type": "Transform", "properties": { "Translation": "up" } }],
            "entities": [{ "id": "E", "components": ["T"] }]
        }))
        .unwrap();
        let err = build_graph(Rc::new(fixture_registry()), Rc::new(resources)).unwrap_err();
        assert!(matches!(
            err,
            InstantiateError::Property { ref component, ref property, .. }
                if component == "T" && property == "Translation"
        ));
    }

    #[test]
    fn deep_hierarchy_propagation() {
        let mut graph = build(json!({
            "components": [
                { "id": "TA", "type": "Transform", "properties": { "Translation": [1, 0, 0] } },
                { "id": "TB", "type": "Transform", "properties": { "Translation": [2, 0, 0] } },
                { "id": "TC", "type": "Transform", "properties": { "Translation": [3, 0, 0] } }
            ],
            "entities": [
                { "id": "A", "components": ["TA"], "children": ["B"] },
                { "id": "B", "components": ["TB"], "children": ["C"] },
                { "id": "C", "components": ["TC"] }
            ]
        }));

        update_transforms(&mut graph);
        assert!((global_x(&graph, "A") - 1.0).abs() < 0.001);
        assert!((global_x(&graph, "C") - 6.0).abs() < 0.001); // 1 + 2 + 3
    }

    #[test]
    fn entity_without_transform_passes_parent_through() {
        let mut graph = build(json!({
            "components": [
                { "id": "TA", "type": "Transform", "properties": { "Translation": [10, 0, 0] } },
                { "id": "TC", "type": "Transform", "properties": { "Translation": [5, 0, 0] } }
            ],
            "entities": [
                { "id": "A", "components": ["TA"], "children": ["Group"] },
                { "id": "Group", "children": ["C"] },
                { "id": "C", "components": ["TC"] }
            ]
        }));

        update_transforms(&mut graph);
        assert!((global_x(&graph, "C") - 15.0).abs() < 0.001);
    }

    #[test]
    fn parent_moves_child_follows() {
        let mut graph = build(json!({
            "components": [
                { "id": "TP", "type": "Transform" },
                { "id": "TC", "type": "Transform", "properties": { "Translation": [5, 0, 0] } }
            ],
            "entities": [
                { "id": "P", "components": ["TP"], "children": ["C"] },
                { "id": "C", "components": ["TC"] }
            ]
        }));

        update_transforms(&mut graph);
        let parent = graph.find_component("TP").unwrap().handle();
        graph.component_as_mut::<Transform>(parent).unwrap().translation = Vec3::new(50.0, 0.0, 0.0);
        update_transforms(&mut graph);

        assert!((global_x(&graph, "C") - 55.0).abs() < 0.001);
    }

    #[test]
    fn look_at_points_negative_z_at_target() {
        let mut t = Transform::from_xyz(0.0, 0.0, 10.0);
        t.look_at(Vec3::ZERO, Vec3::Y);
        let forward = t.rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::NEG_Z).length() < 0.001);
    }
}
