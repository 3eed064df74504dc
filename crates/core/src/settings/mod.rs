use std::{fmt, rc::Rc, time::Duration};

use crate::{Ease, RendererKind};

/// Mutation or callback block. Shared so settings stay cheap to copy.
pub type Closure = Rc<dyn Fn()>;

/// Wraps any `Fn()` into a [`Closure`].
pub fn closure<F: Fn() + 'static>(f: F) -> Closure {
    Rc::new(f)
}

/// Per-step animation settings.
///
/// Every step takes its own copy of the context defaults when it is created and
/// may override any field before it starts running.
#[derive(Clone)]
pub struct Settings {
    /// Wait before the mutation runs.
    pub delay: Duration,
    /// Length of the interpolation. Zero runs the mutation synchronously.
    pub duration: Duration,
    pub ease: Ease,
    /// Runs after the step finishes, before the next step starts.
    pub completion: Option<Closure>,
    /// Whether the scene keeps accepting interaction while this step animates.
    pub user_interaction: bool,
    /// Renderer used when `duration` is non-zero.
    pub renderer: RendererKind,
}

impl Settings {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn with_completion<F: Fn() + 'static>(mut self, completion: F) -> Self {
        self.completion = Some(closure(completion));
        self
    }

    pub fn with_renderer(mut self, renderer: RendererKind) -> Self {
        self.renderer = renderer;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            duration: Duration::from_secs(1),
            ease: Ease::EASE_OUT_QUINT,
            completion: None,
            user_interaction: false,
            renderer: RendererKind::default(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("delay", &self.delay)
            .field("duration", &self.duration)
            .field("ease", &self.ease)
            .field("completion", &self.completion.is_some())
            .field("user_interaction", &self.user_interaction)
            .field("renderer", &self.renderer)
            .finish()
    }
}
