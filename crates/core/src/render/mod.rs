//! Renderer seam between animation steps and whatever actually draws.
//!
//! A step hands its mutation to a [`Renderer`] whenever it has a non-zero
//! duration. The renderer applies the resulting property changes over time
//! and reports back through the completion block. Two simulated renderers ship
//! with the crate; anything else can be plugged in through the
//! [`RendererRegistry`].

use std::{collections::HashMap, fmt, rc::Rc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Closure, RunLoop, Scene, Settings};

mod interpolating;
mod timed;

pub use interpolating::InterpolatingRenderer;
pub use timed::TimedRenderer;

/// Something that can play a mutation over time.
///
/// Contract:
/// - `start` applies the changes made by `mutation` over `settings.duration`
///   with `settings.ease`, honouring `settings.user_interaction`, and calls
///   `completion` exactly once when the transition ends.
/// - After `stop` returns, `completion` must never be called. Properties stay
///   where they were last rendered. Calling `stop` with nothing running is a
///   no-op.
pub trait Renderer {
    fn start(&mut self, mutation: Closure, completion: Closure, settings: &Settings);

    fn stop(&mut self);
}

/// Which registered renderer a step asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    /// Interpolates recorded property writes frame by frame.
    #[default]
    Interpolating,
    /// Applies the mutation at once and completes after a timer.
    Timed,
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interpolating => f.write_str("interpolating"),
            Self::Timed => f.write_str("timed"),
        }
    }
}

/// Builds a fresh renderer for one step.
pub type RendererFactory = Rc<dyn Fn() -> Box<dyn Renderer>>;

/// Maps [`RendererKind`] to the factory that builds it.
#[derive(Clone, Default)]
pub struct RendererRegistry {
    factories: HashMap<RendererKind, RendererFactory>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with both bundled renderers drawing into `scene`.
    pub fn with_defaults(scene: &Scene, run_loop: &RunLoop, frame_interval: Duration) -> Self {
        let mut registry = Self::new();

        let (s, r) = (scene.clone(), run_loop.clone());
        registry.register(RendererKind::Interpolating, move || {
            Box::new(InterpolatingRenderer::new(s.clone(), r.clone(), frame_interval))
        });

        let (s, r) = (scene.clone(), run_loop.clone());
        registry.register(RendererKind::Timed, move || {
            Box::new(TimedRenderer::new(s.clone(), r.clone()))
        });

        registry
    }

    /// Installs or replaces the factory for `kind`.
    pub fn register<F>(&mut self, kind: RendererKind, factory: F)
    where
        F: Fn() -> Box<dyn Renderer> + 'static,
    {
        self.factories.insert(kind, Rc::new(factory));
    }

    pub fn factory(&self, kind: RendererKind) -> Option<RendererFactory> {
        self.factories.get(&kind).cloned()
    }

    pub fn create(&self, kind: RendererKind) -> Option<Box<dyn Renderer>> {
        self.factories.get(&kind).map(|factory| factory())
    }

    pub fn contains(&self, kind: RendererKind) -> bool {
        self.factories.contains_key(&kind)
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.factories.keys().map(ToString::to_string).collect();
        kinds.sort();
        f.debug_struct("RendererRegistry").field("kinds", &kinds).finish()
    }
}
