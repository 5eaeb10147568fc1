//! # Orbit Controller — Keyboard-Driven Camera Orbit
//!
//! Moves its entity's [`Transform`] on a sphere around a target and keeps it
//! looking at that target.
//!
//! ```text
//!                 LookAt (optional ComponentPtr<Transform>)
//!                    ●  target = LookAt global position, or the origin
//!                   ╱
//!      Distance    ╱   yaw   ← Left / Right
//!                 ╱    pitch ← Down / Up
//!           Camera ◉
//! ```
//!
//! Declares `Transform` and `KeyInput` as dependencies, so both are
//! initialized before it no matter how the entity lists its components.
//! A missing `Transform` is an init failure; without a `KeyInput` the camera
//! simply holds its angle.

use glam::Vec3;

use crate::component::{Component, ComponentType};
use crate::components::key_input::KeyInput;
use crate::components::transform::Transform;
use crate::context::{CreateContext, InitContext, UpdateContext};
use crate::error::{InitError, InstantiateError};
use crate::input::Key;
use crate::instance::{ComponentHandle, InstanceGraph};
use crate::ptr::ComponentPtr;

const PITCH_LIMIT: f32 = 1.5;

#[derive(Debug)]
pub struct OrbitController {
    /// Radians per second.
    pub speed: f32,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub look_at: Option<ComponentPtr<Transform>>,
    transform: Option<ComponentHandle>,
    input: Option<ComponentHandle>,
}

impl OrbitController {
    fn target(&self, graph: &InstanceGraph) -> Vec3 {
        self.look_at
            .as_ref()
            .and_then(|ptr| ptr.get(graph))
            .map(Transform::global_translation)
            .unwrap_or(Vec3::ZERO)
    }

    fn place(&self, graph: &mut InstanceGraph) {
        let target = self.target(graph);
        let offset = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        ) * self.distance;

        if let Some(transform) = self
            .transform
            .and_then(|h| graph.component_as_mut::<Transform>(h))
        {
            transform.translation = target + offset;
            transform.look_at(target, Vec3::Y);
        }
    }
}

impl Component for OrbitController {
    fn init(&mut self, cx: &mut InitContext<'_>) -> Result<(), InitError> {
        let entity = cx
            .entity()
            .ok_or_else(|| InitError::new("OrbitController has no entity"))?;
        self.transform = entity.find_component_handle::<Transform>();
        self.input = entity.find_component_handle::<KeyInput>();
        if self.transform.is_none() {
            return Err(InitError::new("OrbitController needs a Transform on its entity"));
        }
        self.place(cx.graph_mut());
        Ok(())
    }

    fn update(&mut self, delta_time: f64, cx: &mut UpdateContext<'_>) {
        let dt = delta_time as f32;
        if let Some(input) = self.input.and_then(|h| cx.graph().component_as::<KeyInput>(h)) {
            self.yaw += input.axis(Key::Left, Key::Right) * self.speed * dt;
            self.pitch += input.axis(Key::Down, Key::Up) * self.speed * dt;
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
        self.place(cx.graph_mut());
    }
}

impl ComponentType for OrbitController {
    const TYPE_NAME: &'static str = "OrbitController";
    const DEPENDENCIES: &'static [&'static str] = &[Transform::TYPE_NAME, KeyInput::TYPE_NAME];

    fn create(cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError> {
        Ok(Self {
            speed: cx.property_or("Speed", 1.0)?,
            distance: cx.property_or("Distance", 5.0)?,
            yaw: cx.property_or("Yaw", 0.0)?,
            pitch: cx.property_or("Pitch", 0.0)?,
            look_at: cx.optional_component_ptr("LookAt")?,
            transform: None,
            input: None,
        })
    }
}
