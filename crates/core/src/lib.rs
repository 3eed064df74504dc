//! Core library for chained, cancellable animations.
//!
//! An animation is built as a chain of steps. Each step waits for its delay,
//! applies a mutation through a [`Renderer`] over its duration, runs its
//! completion and then starts the next step. Stopping any step of a chain
//! cancels whatever has not finished yet.
//!
//! Everything runs on one thread, driven by a [`RunLoop`]. The defaults every
//! new step copies live in an [`AnimContext`], alongside the run loop, the
//! [`Scene`] the bundled renderers animate and the renderer registry.

pub mod chain;
pub mod config;
pub mod context;
pub mod ease;
pub mod error;
pub mod layout;
pub mod render;
pub mod scene;
pub mod settings;
pub mod timeline;

pub use chain::{Anim, StepId, StepState};
pub use config::{AnimConfig, EaseSpec, SettingsConfig};
pub use context::AnimContext;
pub use ease::{Ease, Point};
pub use error::{AnimError, Result};
pub use layout::{ConstraintLayout, LayoutRoot};
pub use render::{
    InterpolatingRenderer, Renderer, RendererFactory, RendererKind, RendererRegistry,
    TimedRenderer,
};
pub use scene::{Layer, PropertyKey, PropertyWrite, Scene};
pub use settings::{closure, Closure, Settings};
pub use timeline::{Pacing, PlaybackClock, RunLoop, TimerId};
