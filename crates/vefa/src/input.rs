//! Engine-level input events and per-component input state.
//!
//! Platform translation (windowing, raw key codes) happens outside the
//! engine; what arrives here is an [`InputEvent`]. Events are routed to the
//! [`KeyInput`](crate::components::key_input::KeyInput) components of one
//! entity, or of a whole subtree with the explicitly named recursive variant.
//!
//! ```text
//! platform ──► InputEvent ──► route_event(graph, entity, &event)
//!                                 │
//!                                 └─► KeyInput.keys: Input<Key>
//!                                        pressed / just_pressed / just_released
//! ```

use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::component::ComponentType;
use crate::components::key_input::KeyInput;
use crate::instance::{ComponentHandle, EntityHandle, InstanceGraph};

/// Engine-level key identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    Enter,
    Escape,
    W,
    A,
    S,
    D,
    Q,
    E,
}

/// An input event after platform translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyPressed(Key),
    KeyReleased(Key),
    /// Pointer position in window coordinates.
    PointerMoved { x: f32, y: f32 },
}

/// Tracks the state of a set of inputs (keys or buttons).
///
/// - `pressed`: currently held down
/// - `just_pressed`: pressed this frame (not held last frame)
/// - `just_released`: released this frame
#[derive(Debug, Clone)]
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    /// Returns `true` if the input is currently held down.
    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    /// Returns `true` if the input was pressed this frame.
    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    /// Returns `true` if the input was released this frame.
    pub fn just_released(&self, input: T) -> bool {
        self.just_released.contains(&input)
    }

    pub(crate) fn press(&mut self, input: T) {
        if self.pressed.insert(input) {
            self.just_pressed.insert(input);
        }
    }

    pub(crate) fn release(&mut self, input: T) {
        if self.pressed.remove(&input) {
            self.just_released.insert(input);
        }
    }

    /// Clear per-frame state.
    pub(crate) fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deliver `event` to every `KeyInput` on `entity`. Children are not visited.
///
/// Returns the number of components that received the event.
pub fn route_event(graph: &mut InstanceGraph, entity: EntityHandle, event: &InputEvent) -> usize {
    let handles: Vec<_> = match graph.entity(entity) {
        Some(entity) => entity
            .components()
            .filter(|c| c.type_name() == KeyInput::TYPE_NAME)
            .map(|c| c.handle())
            .collect(),
        None => return 0,
    };

    let mut delivered = 0;
    for handle in handles {
        if let Some(input) = graph.component_as_mut::<KeyInput>(handle) {
            input.handle_event(event);
            delivered += 1;
        }
    }
    delivered
}

/// Like [`route_event`], for `entity` and every descendant, depth-first.
pub fn route_event_recursive(
    graph: &mut InstanceGraph,
    entity: EntityHandle,
    event: &InputEvent,
) -> usize {
    graph
        .subtree(entity)
        .into_iter()
        .map(|e| route_event(graph, e, event))
        .sum()
}

/// Clear the per-frame state of every `KeyInput` in the graph. Call once per
/// frame after `update()`.
pub fn clear_frame_state(graph: &mut InstanceGraph) {
    let handles: Vec<_> = graph
        .components
        .iter()
        .filter(|(_, slot)| slot.type_name == KeyInput::TYPE_NAME)
        .map(|(key, _)| ComponentHandle(key))
        .collect();
    for handle in handles {
        if let Some(input) = graph.component_as_mut::<KeyInput>(handle) {
            input.keys.clear_just();
        }
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

    #[test]
    fn press_and_release_track_frame_state() {
        let mut input = Input::new();
        input.press(Key::Space);
        assert!(input.pressed(Key::Space));
        assert!(input.just_pressed(Key::Space));

        input.clear_just();
        input.press(Key::Space);
        assert!(input.pressed(Key::Space));
        assert!(!input.just_pressed(Key::Space));

        input.release(Key::Space);
        assert!(!input.pressed(Key::Space));
        assert!(input.just_released(Key::Space));

        // Releasing a key that is not held is ignored.
        input.clear_just();
        input.release(Key::Enter);
        assert!(!input.just_released(Key::Enter));
    }

    fn graph() -> InstanceGraph {
        let resources = ResourceGraph::from_value(json!({
            "components": [
                { "id": "ParentKeys", "type": "KeyInput" },
                { "id": "ChildKeys", "type": "KeyInput" }
            ],
            "entities": [
                { "id": "Parent", "components": ["ParentKeys"], "children": ["Child"] },
                { "id": "Child", "components": ["ChildKeys"] }
            ]
        }))
        .unwrap();
        build_graph(Rc::new(fixture_registry()), Rc::new(resources)).unwrap()
    }

    fn held(graph: &InstanceGraph, entity: &str, key: Key) -> bool {
        graph
            .find_entity(entity)
            .unwrap()
            .find_component::<KeyInput>()
            .unwrap()
            .keys
            .pressed(key)
    }

    #[test]
    fn route_event_reaches_one_entity_only() {
        let mut graph = graph();
        let parent = graph.find_entity("Parent").unwrap().handle();

        assert_eq!(route_event(&mut graph, parent, &InputEvent::KeyPressed(Key::Left)), 1);
        assert!(held(&graph, "Parent", Key::Left));
        assert!(!held(&graph, "Child", Key::Left));
    }

    #[test]
    fn recursive_routing_reaches_descendants() {
        let mut graph = graph();
        let parent = graph.find_entity("Parent").unwrap().handle();

        let event = InputEvent::KeyPressed(Key::W);
        assert_eq!(route_event_recursive(&mut graph, parent, &event), 2);
        assert!(held(&graph, "Child", Key::W));

        clear_frame_state(&mut graph);
        let child = graph.find_entity("Child").unwrap();
        let keys = &child.find_component::<KeyInput>().unwrap().keys;
        assert!(keys.pressed(Key::W));
        assert!(!keys.just_pressed(Key::W));
    }

    #[test]
    fn pointer_position_is_recorded() {
        let mut graph = graph();
        let parent = graph.find_entity("Parent").unwrap().handle();
        route_event(&mut graph, parent, &InputEvent::PointerMoved { x: 3.0, y: 4.0 });

        let keys = graph
            .find_entity("Parent")
            .unwrap()
            .find_component::<KeyInput>()
            .unwrap();
        assert_eq!(keys.pointer, glam::Vec2::new(3.0, 4.0));
    }
}
