//! Animation steps and the chains they form.
//!
//! A chain is a forward-linked list of [`Anim`] steps. Each step owns the next
//! one and keeps a weak link back to the previous one. Nothing drives a chain
//! from outside: a step that finishes starts its successor, so execution is a
//! sequence of continuations on the run loop.
//!
//! Cancellation never retracts work that is already scheduled. Every deferred
//! callback re-checks the step state before acting, and [`Anim::stop`] only
//! flips states and halts the active renderer.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
    time::Duration,
};

use crate::{closure, AnimContext, Closure, ConstraintLayout, LayoutRoot, Renderer, Settings};

#[cfg(test)]
mod tests;

/// Unique identifier of a step within its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(u64);

impl StepId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anim({})", self.0)
    }
}

/// Lifecycle of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepState {
    /// Linked but not started yet.
    #[default]
    Created,
    /// Waiting for its delay or animating.
    Started,
    Finished,
    Cancelled,
}

impl StepState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }
}

/// How a step applies its visual change.
#[derive(Clone)]
pub(crate) enum Payload {
    Closure(Closure),
    Layout(ConstraintLayout),
}

struct Step {
    id: StepId,
    context: AnimContext,
    settings: Settings,
    payload: Payload,
    state: StepState,
    next: Option<Anim>,
    prev: Weak<RefCell<Step>>,
    renderer: Option<Box<dyn Renderer>>,
}

impl Drop for Step {
    fn drop(&mut self) {
        // Unlink successors one at a time; a long chain would otherwise drop recursively.
        let mut next = self.next.take();
        while let Some(anim) = next {
            next = match Rc::try_unwrap(anim.step) {
                Ok(cell) => {
                    let mut step = cell.into_inner();
                    step.next.take()
                }
                Err(_) => None,
            };
        }
    }
}

/// Handle to one step of an animation chain.
///
/// Cloning the handle does not copy the step. Two handles compare equal when
/// they point at the same step.
#[derive(Clone)]
pub struct Anim {
    step: Rc<RefCell<Step>>,
}

impl Anim {
    pub(crate) fn create(context: &AnimContext, settings: Settings, payload: Payload) -> Self {
        let id = context.next_step_id();
        tracing::trace!(step = %id, ?settings, "created");
        Self {
            step: Rc::new(RefCell::new(Step {
                id,
                context: context.clone(),
                settings,
                payload,
                state: StepState::Created,
                next: None,
                prev: Weak::new(),
                renderer: None,
            })),
        }
    }

    pub fn id(&self) -> StepId {
        self.step.borrow().id
    }

    pub fn state(&self) -> StepState {
        self.step.borrow().state
    }

    /// Copy of the settings this step runs with.
    pub fn settings(&self) -> Settings {
        self.step.borrow().settings.clone()
    }

    pub fn context(&self) -> AnimContext {
        self.step.borrow().context.clone()
    }

    pub fn next(&self) -> Option<Anim> {
        self.step.borrow().next.clone()
    }

    /// Previous step, while something else still keeps it alive.
    pub fn prev(&self) -> Option<Anim> {
        self.step.borrow().prev.upgrade().map(|step| Anim { step })
    }

    /// Whether a renderer is currently animating this step.
    pub fn has_active_renderer(&self) -> bool {
        self.step.borrow().renderer.is_some()
    }

    pub fn ptr_eq(&self, other: &Anim) -> bool {
        Rc::ptr_eq(&self.step, &other.step)
    }

    /// Last step currently linked after this one.
    pub fn tail(&self) -> Anim {
        let mut tail = self.clone();
        while let Some(next) = tail.next() {
            tail = next;
        }
        tail
    }

    // --- chaining ----------------------------------------------------------

    /// Appends a step that runs `mutation` with the context defaults.
    pub fn then<M>(&self, mutation: M) -> Anim
    where
        M: Fn() + 'static,
    {
        self.then_with(|_| mutation)
    }

    /// Appends a step whose settings `customize` adjusts before returning the mutation.
    pub fn then_with<F, M>(&self, customize: F) -> Anim
    where
        F: FnOnce(&mut Settings) -> M,
        M: Fn() + 'static,
    {
        let context = self.context();
        let (settings, mutation) = context.prepare(customize);
        self.chain(Anim::create(&context, settings, Payload::Closure(mutation)))
    }

    /// Appends a constraint step animated through relayout of `parent`.
    pub fn then_layout<M>(&self, parent: Rc<dyn LayoutRoot>, mutation: M) -> Anim
    where
        M: Fn() + 'static,
    {
        self.then_layout_with(parent, |_| mutation)
    }

    pub fn then_layout_with<F, M>(&self, parent: Rc<dyn LayoutRoot>, customize: F) -> Anim
    where
        F: FnOnce(&mut Settings) -> M,
        M: Fn() + 'static,
    {
        let context = self.context();
        let (settings, mutation) = context.prepare(customize);
        let layout = ConstraintLayout::new(parent, mutation);
        self.chain(Anim::create(&context, settings, Payload::Layout(layout)))
    }

    /// Appends a step that only waits for `delay`.
    pub fn wait(&self, delay: Duration) -> Anim {
        let context = self.context();
        let mut settings = context.default_settings();
        settings.delay = delay;
        settings.duration = Duration::ZERO;
        self.chain(Anim::create(&context, settings, Payload::Closure(closure(|| {}))))
    }

    /// Appends a step that runs `block` synchronously between animations.
    pub fn callback<F>(&self, block: F) -> Anim
    where
        F: Fn() + 'static,
    {
        let context = self.context();
        let mut settings = context.default_settings();
        settings.delay = Duration::ZERO;
        settings.duration = Duration::ZERO;
        self.chain(Anim::create(&context, settings, Payload::Closure(closure(block))))
    }

    /// Links `next` after the current tail and starts it if the chain already ran out.
    ///
    /// Links are never rewritten, so chaining twice from the same step extends
    /// the chain rather than branching it.
    fn chain(&self, next: Anim) -> Anim {
        let tail = self.tail();
        let tail_state = {
            let mut tail_step = tail.step.borrow_mut();
            next.step.borrow_mut().prev = Rc::downgrade(&tail.step);
            tail_step.next = Some(next.clone());
            tail_step.state
        };
        tracing::trace!(step = %next.id(), after = %tail.id(), "chained");

        if tail_state == StepState::Finished {
            next.start();
        }
        next
    }

    // --- running -----------------------------------------------------------

    /// Starts the step: waits for the delay, then runs the mutation.
    ///
    /// Only a `Created` step can start; anything else is ignored.
    pub fn start(&self) {
        let (delay, context) = {
            let mut step = self.step.borrow_mut();
            if step.state != StepState::Created {
                tracing::trace!(step = %step.id, state = ?step.state, "start ignored");
                return;
            }
            step.state = StepState::Started;
            (step.settings.delay, step.context.clone())
        };
        tracing::trace!(step = %self.id(), ?delay, "started");

        if delay.is_zero() {
            self.run();
            return;
        }

        let this = self.clone();
        context.run_loop().schedule_after(delay, move || this.run());
    }

    fn run(&self) {
        let (payload, duration, kind, context) = {
            let step = self.step.borrow();
            if step.state != StepState::Started {
                tracing::trace!(step = %step.id, state = ?step.state, "run skipped");
                return;
            }
            (
                step.payload.clone(),
                step.settings.duration,
                step.settings.renderer,
                step.context.clone(),
            )
        };
        tracing::trace!(step = %self.id(), ?duration, "running");

        let mutation = match payload {
            Payload::Closure(mutation) => mutation,
            Payload::Layout(layout) => {
                layout.update();
                (layout.mutation())();
                if self.state() != StepState::Started {
                    return;
                }
                layout.relayout()
            }
        };

        if duration.is_zero() {
            mutation();
            self.complete();
            return;
        }

        let Some(mut renderer) = context.create_renderer(kind) else {
            tracing::warn!(step = %self.id(), renderer = %kind, "no renderer registered, applying without animation");
            mutation();
            self.complete();
            return;
        };
        tracing::debug!(step = %self.id(), renderer = %kind, "handing over to renderer");

        let this = self.clone();
        let settings = self.settings();
        renderer.start(mutation, closure(move || this.complete()), &settings);

        // The mutation may have stopped the chain, or the renderer may have
        // completed synchronously; keep the renderer only while it is live.
        let mut step = self.step.borrow_mut();
        let state = step.state;
        match state {
            StepState::Started => step.renderer = Some(renderer),
            StepState::Cancelled => {
                drop(step);
                renderer.stop();
            }
            StepState::Created | StepState::Finished => {}
        }
    }

    /// Completion continuation handed to renderers. Extra calls are ignored.
    fn complete(&self) {
        let (renderer, completion) = {
            let mut step = self.step.borrow_mut();
            if step.state != StepState::Started {
                tracing::trace!(step = %step.id, state = ?step.state, "completion ignored");
                return;
            }
            (step.renderer.take(), step.settings.completion.clone())
        };
        drop(renderer);

        if let Some(completion) = completion {
            completion();
        }

        let next = {
            let mut step = self.step.borrow_mut();
            // The completion block may have stopped the chain.
            if step.state != StepState::Started {
                return;
            }
            step.state = StepState::Finished;
            step.next.clone()
        };
        tracing::trace!(step = %self.id(), "finished");

        if let Some(next) = next {
            self.context().start_after_current(next);
        }
    }

    // --- cancelling --------------------------------------------------------

    /// Cancels the rest of the chain this step belongs to.
    ///
    /// Every step that has not started yet is cancelled, and the step that is
    /// currently waiting or animating is cancelled with its renderer stopped.
    /// Finished steps are left alone. Safe to call more than once.
    pub fn stop(&self) {
        let mut cursor = Some(self.tail());
        let mut skipped = 0usize;

        while let Some(current) = cursor.take() {
            let mut step = current.step.borrow_mut();
            let state = step.state;
            match state {
                StepState::Created => {
                    step.state = StepState::Cancelled;
                    skipped += 1;
                    cursor = step.prev.upgrade().map(|step| Anim { step });
                }
                StepState::Started => {
                    step.state = StepState::Cancelled;
                    let renderer = step.renderer.take();
                    let id = step.id;
                    drop(step);

                    tracing::debug!(step = %id, skipped, "stopped active step");
                    if let Some(mut renderer) = renderer {
                        renderer.stop();
                    }
                    return;
                }
                StepState::Finished | StepState::Cancelled => break,
            }
        }

        tracing::debug!(step = %self.id(), skipped, "stopped chain with no active step");
    }
}

impl PartialEq for Anim {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Anim {}

impl fmt::Display for Anim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl fmt::Debug for Anim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = self.step.borrow();
        f.debug_struct("Anim")
            .field("id", &step.id)
            .field("state", &step.state)
            .field("settings", &step.settings)
            .field("has_next", &step.next.is_some())
            .finish()
    }
}
