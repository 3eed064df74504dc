use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
    rc::Rc,
    time::Duration,
};

use crate::{
    chain::{Payload, StepId},
    closure, AnimConfig, Anim, Closure, ConstraintLayout, LayoutRoot, Renderer, RendererKind,
    RendererRegistry, Result, RunLoop, Scene, Settings,
};

const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

struct ContextState {
    defaults: RefCell<Settings>,
    run_loop: RunLoop,
    scene: Scene,
    renderers: RefCell<RendererRegistry>,
    next_id: Cell<u64>,
    /// Steps whose predecessor finished while an advance was already draining.
    pending_starts: RefCell<VecDeque<Anim>>,
    draining: Cell<bool>,
}

/// Everything an animation chain needs from its surroundings.
///
/// Holds the default [`Settings`] that every new step copies, the run loop
/// that drives delays and frames, the scene the bundled renderers draw into
/// and the renderer registry. Each context is independent, so tests never
/// share defaults. Handles are cheap clones of the same context.
#[derive(Clone)]
pub struct AnimContext {
    state: Rc<ContextState>,
}

impl AnimContext {
    /// Fresh context on a virtual-time run loop at 60 frames per second.
    pub fn new() -> Self {
        Self::with_run_loop(RunLoop::new(), DEFAULT_FRAME_INTERVAL)
    }

    pub fn with_run_loop(run_loop: RunLoop, frame_interval: Duration) -> Self {
        let scene = Scene::new();
        let renderers = RendererRegistry::with_defaults(&scene, &run_loop, frame_interval);
        Self {
            state: Rc::new(ContextState {
                defaults: RefCell::new(Settings::default()),
                run_loop,
                scene,
                renderers: RefCell::new(renderers),
                next_id: Cell::new(1),
                pending_starts: RefCell::new(VecDeque::new()),
                draining: Cell::new(false),
            }),
        }
    }

    /// Context whose defaults and frame rate come from `config`.
    pub fn from_config(config: &AnimConfig, run_loop: RunLoop) -> Result<Self> {
        let defaults = config.defaults.to_settings()?;
        let context = Self::with_run_loop(run_loop, config.frame_interval());
        context.set_default_settings(defaults);
        Ok(context)
    }

    /// Copy of the current defaults.
    pub fn default_settings(&self) -> Settings {
        self.state.defaults.borrow().clone()
    }

    /// Replaces the defaults. Steps created earlier keep their own copy.
    pub fn set_default_settings(&self, settings: Settings) {
        *self.state.defaults.borrow_mut() = settings;
    }

    pub fn update_default_settings<F: FnOnce(&mut Settings)>(&self, update: F) {
        update(&mut self.state.defaults.borrow_mut());
    }

    pub fn run_loop(&self) -> &RunLoop {
        &self.state.run_loop
    }

    pub fn scene(&self) -> &Scene {
        &self.state.scene
    }

    /// Installs or replaces the renderer built for `kind`.
    pub fn register_renderer<F>(&self, kind: RendererKind, factory: F)
    where
        F: Fn() -> Box<dyn Renderer> + 'static,
    {
        self.state.renderers.borrow_mut().register(kind, factory);
    }

    pub(crate) fn create_renderer(&self, kind: RendererKind) -> Option<Box<dyn Renderer>> {
        // Factories are user code; don't hold the registry borrow while one runs.
        let factory = self.state.renderers.borrow().factory(kind)?;
        Some(factory())
    }

    pub(crate) fn next_step_id(&self) -> StepId {
        let id = self.state.next_id.get();
        self.state.next_id.set(id + 1);
        StepId::new(id)
    }

    /// Starts `step` once every advance already in progress has returned.
    ///
    /// Zero-duration steps finish inside `start`, so starting successors
    /// directly would nest one call frame per step. The outermost advance
    /// drains the queue instead, in the order steps finished, still within
    /// the same run-loop turn.
    pub(crate) fn start_after_current(&self, step: Anim) {
        self.state.pending_starts.borrow_mut().push_back(step);
        if self.state.draining.replace(true) {
            return;
        }

        loop {
            let next = self.state.pending_starts.borrow_mut().pop_front();
            let Some(next) = next else {
                break;
            };
            next.start();
        }
        self.state.draining.set(false);
    }

    /// Settings copied from the defaults, customised, plus the mutation the customiser returned.
    pub(crate) fn prepare<F, M>(&self, customize: F) -> (Settings, Closure)
    where
        F: FnOnce(&mut Settings) -> M,
        M: Fn() + 'static,
    {
        let mut settings = self.default_settings();
        let mutation = customize(&mut settings);
        (settings, closure(mutation))
    }

    /// Creates the first step of a chain with default settings and starts it.
    pub fn anim<M>(&self, mutation: M) -> Anim
    where
        M: Fn() + 'static,
    {
        self.anim_with(|_| mutation)
    }

    /// Creates and starts the first step of a chain.
    ///
    /// `customize` receives a copy of the defaults to adjust and returns the
    /// mutation block.
    pub fn anim_with<F, M>(&self, customize: F) -> Anim
    where
        F: FnOnce(&mut Settings) -> M,
        M: Fn() + 'static,
    {
        let step = self.build_with(customize);
        step.start();
        step
    }

    /// Creates and starts a constraint step whose effect comes from relayout of `parent`.
    pub fn anim_layout<M>(&self, parent: Rc<dyn LayoutRoot>, mutation: M) -> Anim
    where
        M: Fn() + 'static,
    {
        self.anim_layout_with(parent, |_| mutation)
    }

    pub fn anim_layout_with<F, M>(&self, parent: Rc<dyn LayoutRoot>, customize: F) -> Anim
    where
        F: FnOnce(&mut Settings) -> M,
        M: Fn() + 'static,
    {
        let step = self.build_layout_with(parent, customize);
        step.start();
        step
    }

    /// Like [`AnimContext::anim`] but leaves the step in `Created` until
    /// [`Anim::start`] is called.
    pub fn build<M>(&self, mutation: M) -> Anim
    where
        M: Fn() + 'static,
    {
        self.build_with(|_| mutation)
    }

    pub fn build_with<F, M>(&self, customize: F) -> Anim
    where
        F: FnOnce(&mut Settings) -> M,
        M: Fn() + 'static,
    {
        let (settings, mutation) = self.prepare(customize);
        Anim::create(self, settings, Payload::Closure(mutation))
    }

    pub fn build_layout_with<F, M>(&self, parent: Rc<dyn LayoutRoot>, customize: F) -> Anim
    where
        F: FnOnce(&mut Settings) -> M,
        M: Fn() + 'static,
    {
        let (settings, mutation) = self.prepare(customize);
        let layout = ConstraintLayout::new(parent, mutation);
        Anim::create(self, settings, Payload::Layout(layout))
    }
}

impl Default for AnimContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AnimContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimContext")
            .field("defaults", &*self.state.defaults.borrow())
            .field("run_loop", &self.state.run_loop)
            .field("renderers", &*self.state.renderers.borrow())
            .finish()
    }
}
