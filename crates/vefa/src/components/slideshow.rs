//! Spawns copies of a prototype entity as children and cycles through them.
//!
//! ```json
//! { "id": "Show", "type": "Slideshow",
//!   "properties": { "Prototype": "Slide", "Count": 3, "Interval": 2.0 } }
//! ```
//!
//! The copies are spawned in `init()`, so they exist (built, resolved and
//! initialized) before any later component of the pass initializes.

use crate::component::{Component, ComponentType};
use crate::context::{CreateContext, InitContext, UpdateContext};
use crate::error::{InitError, InstantiateError};
use crate::instance::EntityHandle;

#[derive(Debug)]
pub struct Slideshow {
    pub prototype: String,
    pub count: usize,
    /// Seconds per slide.
    pub interval: f64,
    slides: Vec<EntityHandle>,
    current: usize,
    elapsed: f64,
}

impl Slideshow {
    pub fn slides(&self) -> &[EntityHandle] {
        &self.slides
    }

    /// Index of the slide on show.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_slide(&self) -> Option<EntityHandle> {
        self.slides.get(self.current).copied()
    }
}

impl Component for Slideshow {
    fn init(&mut self, cx: &mut InitContext<'_>) -> Result<(), InitError> {
        for _ in 0..self.count {
            let slide = cx.spawn_child(&self.prototype)?;
            self.slides.push(slide);
        }
        log::debug!("Slideshow spawned {} '{}' slides", self.slides.len(), self.prototype);
        Ok(())
    }

    fn update(&mut self, delta_time: f64, _cx: &mut UpdateContext<'_>) {
        if self.slides.is_empty() || self.interval <= 0.0 {
            return;
        }
        self.elapsed += delta_time;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            self.current = (self.current + 1) % self.slides.len();
        }
    }
}

impl ComponentType for Slideshow {
    const TYPE_NAME: &'static str = "Slideshow";

    fn create(cx: &mut CreateContext<'_>) -> Result<Self, InstantiateError> {
        Ok(Self {
            prototype: cx.property("Prototype")?,
            count: cx.property_or("Count", 1)?,
            interval: cx.property_or("Interval", 1.0)?,
            slides: Vec::new(),
            current: 0,
            elapsed: 0.0,
        })
    }
}
