use std::{fmt, rc::Rc};

use crate::{closure, Closure};

/// Entry point of an external layout engine.
///
/// Implementations turn pending constraint edits into concrete geometry,
/// synchronously, every time they are asked.
pub trait LayoutRoot {
    fn layout_if_needed(&self);
}

impl<F: Fn()> LayoutRoot for F {
    fn layout_if_needed(&self) {
        self()
    }
}

/// Step payload for constraint-driven animation.
///
/// The mutation only edits constraints. What actually animates is the layout
/// pass that follows, so the renderer is handed [`ConstraintLayout::relayout`]
/// instead of the mutation itself.
#[derive(Clone)]
pub struct ConstraintLayout {
    closure: Closure,
    parent: Rc<dyn LayoutRoot>,
}

impl ConstraintLayout {
    pub fn new(parent: Rc<dyn LayoutRoot>, closure: Closure) -> Self {
        Self { closure, parent }
    }

    /// The constraint-editing block.
    pub fn mutation(&self) -> Closure {
        self.closure.clone()
    }

    /// Flushes pending layout on the parent.
    pub fn update(&self) {
        self.parent.layout_if_needed();
    }

    /// Block that flushes layout, handed to renderers as the animation target.
    pub fn relayout(&self) -> Closure {
        let parent = self.parent.clone();
        closure(move || parent.layout_if_needed())
    }
}

impl fmt::Debug for ConstraintLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintLayout").finish_non_exhaustive()
    }
}
