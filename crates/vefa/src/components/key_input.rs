//! Keyboard and pointer state of one entity.
//!
//! Filled by [`route_event`](crate::input::route_event); read by sibling
//! components during `update()`.

use glam::Vec2;

use crate::component::{Component, ComponentType};
use crate::context::CreateContext;
use crate::error::InstantiateError;
use crate::input::{Input, InputEvent, Key};

#[derive(Debug, Clone, Default)]
pub struct KeyInput {
    pub keys: Input<Key>,
    /// Last pointer position in window coordinates.
    pub pointer: Vec2,
}

impl KeyInput {
    pub(crate) fn handle_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyPressed(key) => self.keys.press(key),
            InputEvent::KeyReleased(key) => self.keys.release(key),
            InputEvent::PointerMoved { x, y } => self.pointer = Vec2::new(x, y),
        }
    }

    /// `+1.0` while only `positive` is held, `-1.0` while only `negative` is.
    pub fn axis(&self, negative: Key, positive: Key) -> f32 {
        let mut value = 0.0;
        if self.keys.pressed(positive) {
            value += 1.0;
        }
        if self.keys.pressed(negative) {
            value -= 1.0;
        }
        value
    }
}

impl Component for KeyInput {}

impl ComponentType for KeyInput {
    const TYPE_NAME: &'static str = "KeyInput";

    fn create(_cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError> {
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_cancels_when_both_held() {
        let mut input = KeyInput::default();
        input.handle_event(&InputEvent::KeyPressed(Key::Right));
        assert_eq!(input.axis(Key::Left, Key::Right), 1.0);

        input.handle_event(&InputEvent::KeyPressed(Key::Left));
        assert_eq!(input.axis(Key::Left, Key::Right), 0.0);

        input.handle_event(&InputEvent::KeyReleased(Key::Right));
        assert_eq!(input.axis(Key::Left, Key::Right), -1.0);
    }
}
