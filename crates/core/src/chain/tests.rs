use std::cell::{Cell, RefCell};

use super::*;
use crate::{RendererKind, RunLoop};

type Log = Rc<RefCell<Vec<(&'static str, Duration)>>>;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn event_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn logger(log: &Log, run_loop: &RunLoop, name: &'static str) -> impl Fn() + 'static {
    let log = log.clone();
    let run_loop = run_loop.clone();
    move || log.borrow_mut().push((name, run_loop.now()))
}

fn names(log: &Log) -> Vec<&'static str> {
    log.borrow().iter().map(|(name, _)| *name).collect()
}

/// Context whose steps have no duration unless they ask for one.
fn instant_context() -> AnimContext {
    let context = AnimContext::new();
    context.update_default_settings(|s| s.duration = Duration::ZERO);
    context
}

fn counter() -> (Rc<Cell<usize>>, impl Fn() + Clone + 'static) {
    let count = Rc::new(Cell::new(0));
    let handle = count.clone();
    (count, move || handle.set(handle.get() + 1))
}

#[derive(Default)]
struct SpyState {
    starts: usize,
    stops: usize,
    mutation: Option<Closure>,
    completion: Option<Closure>,
}

/// Renderer that records what it was given and only completes when told to.
struct SpyRenderer(Rc<RefCell<SpyState>>);

impl Renderer for SpyRenderer {
    fn start(&mut self, mutation: Closure, completion: Closure, _settings: &Settings) {
        let mut state = self.0.borrow_mut();
        state.starts += 1;
        state.mutation = Some(mutation);
        state.completion = Some(completion);
    }

    fn stop(&mut self) {
        self.0.borrow_mut().stops += 1;
    }
}

fn install_spy(context: &AnimContext) -> Rc<RefCell<SpyState>> {
    let state = Rc::new(RefCell::new(SpyState::default()));
    let shared = state.clone();
    context.register_renderer(RendererKind::Interpolating, move || {
        Box::new(SpyRenderer(shared.clone()))
    });
    state
}

// --- ordering and timing ---------------------------------------------------

#[test]
fn chained_steps_run_in_construction_order() {
    let context = instant_context();
    let run_loop = context.run_loop().clone();
    let log = event_log();

    let first = context.anim(logger(&log, &run_loop, "a"));
    let second = first.then(logger(&log, &run_loop, "b"));
    let log_c = logger(&log, &run_loop, "c");
    let third = second.then_with(move |_| log_c);

    assert_eq!(names(&log), vec!["a", "b", "c"]);
    for step in [&first, &second, &third] {
        assert_eq!(step.state(), StepState::Finished);
    }
}

#[test]
fn delays_accumulate_along_the_chain() {
    let context = instant_context();
    let run_loop = context.run_loop().clone();
    let log = event_log();

    let (e1, e2, e3) = (
        logger(&log, &run_loop, "e1"),
        logger(&log, &run_loop, "e2"),
        logger(&log, &run_loop, "e3"),
    );
    context
        .anim_with(|s| {
            s.delay = ms(300);
            e1
        })
        .then_with(|s| {
            s.delay = ms(400);
            e2
        })
        .then_with(|s| {
            s.delay = ms(500);
            e3
        });

    assert!(log.borrow().is_empty());
    run_loop.run_until_idle();
    assert_eq!(
        *log.borrow(),
        vec![("e1", ms(300)), ("e2", ms(700)), ("e3", ms(1200))]
    );
}

#[test]
fn default_delay_applies_to_every_step() {
    let context = instant_context();
    context.update_default_settings(|s| s.delay = ms(300));
    let run_loop = context.run_loop().clone();
    let log = event_log();

    context
        .anim(logger(&log, &run_loop, "e1"))
        .then(logger(&log, &run_loop, "e2"))
        .then(logger(&log, &run_loop, "e3"));

    run_loop.run_until_idle();
    assert_eq!(
        *log.borrow(),
        vec![("e1", ms(300)), ("e2", ms(600)), ("e3", ms(900))]
    );
}

#[test]
fn wait_and_callback_slot_between_steps() {
    let context = instant_context();
    let run_loop = context.run_loop().clone();
    let log = event_log();

    context
        .anim(|| {})
        .wait(ms(700))
        .callback(logger(&log, &run_loop, "e1"))
        .wait(ms(400))
        .callback(logger(&log, &run_loop, "e2"));

    run_loop.run_until_idle();
    assert_eq!(*log.borrow(), vec![("e1", ms(700)), ("e2", ms(1100))]);
}

#[test]
fn callback_ignores_default_delay_and_duration() {
    let context = AnimContext::new();
    context.update_default_settings(|s| s.delay = ms(250));
    let run_loop = context.run_loop().clone();
    let log = event_log();

    let first = context.build_with(|s| {
        s.duration = Duration::ZERO;
        || {}
    });
    let callback = first.callback(logger(&log, &run_loop, "callback"));
    first.start();

    let settings = callback.settings();
    assert_eq!(settings.delay, Duration::ZERO);
    assert_eq!(settings.duration, Duration::ZERO);

    run_loop.run_until_idle();
    assert_eq!(*log.borrow(), vec![("callback", ms(250))]);
}

#[test]
fn zero_duration_runs_synchronously_without_a_renderer() {
    let context = instant_context();
    let spy = install_spy(&context);
    let run_loop = context.run_loop().clone();
    let log = event_log();

    let done = logger(&log, &run_loop, "completion");
    let mutation = logger(&log, &run_loop, "mutation");
    let step = context.anim_with(move |s| {
        s.delay = ms(200);
        s.completion = Some(closure(done));
        mutation
    });

    run_loop.advance(ms(199));
    assert!(log.borrow().is_empty());
    assert_eq!(step.state(), StepState::Started);

    run_loop.advance(ms(1));
    assert_eq!(
        *log.borrow(),
        vec![("mutation", ms(200)), ("completion", ms(200))]
    );
    assert_eq!(step.state(), StepState::Finished);
    assert!(run_loop.is_idle());
    assert_eq!(spy.borrow().starts, 0);
}

#[test]
fn states_follow_the_running_step() {
    let context = instant_context();
    context.update_default_settings(|s| s.delay = ms(500));
    let run_loop = context.run_loop().clone();

    let first = context.anim(|| {});
    let second = first.then(|| {});
    let third = second.then(|| {});

    run_loop.advance(ms(200));
    assert_eq!(first.state(), StepState::Started);
    assert_eq!(second.state(), StepState::Created);

    run_loop.advance(ms(500));
    assert_eq!(first.state(), StepState::Finished);
    assert_eq!(second.state(), StepState::Started);

    run_loop.advance(ms(500));
    assert_eq!(second.state(), StepState::Finished);
    assert_eq!(third.state(), StepState::Started);

    run_loop.run_until_idle();
    assert!(third.state().is_terminal());
}

#[test]
fn long_runs_of_instant_steps_complete_in_one_turn() {
    let context = instant_context();
    let (ran, tick) = counter();
    let order = Rc::new(RefCell::new(Vec::new()));

    let first = context.build(|| {});
    let mut tail = first.clone();
    for index in 0..10_000usize {
        let (tick, order) = (tick.clone(), order.clone());
        tail = tail.callback(move || {
            tick();
            if index % 2_500 == 0 {
                order.borrow_mut().push(index);
            }
        });
    }
    for _ in 0..2_000 {
        tail = tail.then(|| {});
    }

    first.start();
    assert_eq!(ran.get(), 10_000);
    assert_eq!(*order.borrow(), vec![0, 2_500, 5_000, 7_500]);
    assert_eq!(tail.state(), StepState::Finished);
    assert!(context.run_loop().is_idle());
}

#[test]
fn steps_finishing_in_one_turn_start_their_successors_in_order() {
    let context = instant_context();
    let run_loop = context.run_loop().clone();
    let log = event_log();

    let finished = logger(&log, &run_loop, "a done");
    let first = context.build_with(move |s| {
        s.completion = Some(closure(finished));
        || {}
    });
    first
        .callback(logger(&log, &run_loop, "b"))
        .callback(logger(&log, &run_loop, "c"));

    first.start();
    assert_eq!(names(&log), vec!["a done", "b", "c"]);
    assert!(first.tail().state().is_terminal());
}

#[test]
fn far_future_delay_does_not_overflow_the_clock() {
    let context = AnimContext::new();
    let run_loop = context.run_loop().clone();
    run_loop.advance(ms(1));

    let step = context.anim_with(|s| {
        s.delay = Duration::MAX;
        s.duration = ms(400);
        || {}
    });
    assert_eq!(step.state(), StepState::Started);
    assert_eq!(run_loop.next_deadline(), Some(Duration::MAX));

    run_loop.run_until_idle();
    assert_eq!(step.state(), StepState::Finished);
    assert_eq!(run_loop.now(), Duration::MAX);
}

// --- settings and completions -----------------------------------------------

#[test]
fn chained_steps_copy_the_defaults() {
    let context = AnimContext::new();
    context.update_default_settings(|s| {
        s.delay = ms(1537);
        s.duration = Duration::from_micros(142_100);
        s.ease = crate::Ease::EASE_IN_OUT_BACK;
    });

    let first = context.build(|| {});
    let second = first.then(|| {});
    for step in [first, second] {
        let settings = step.settings();
        assert_eq!(settings.delay, ms(1537));
        assert_eq!(settings.duration, Duration::from_micros(142_100));
        assert_eq!(settings.ease, crate::Ease::EASE_IN_OUT_BACK);
    }
}

#[test]
fn each_step_runs_its_own_completion() {
    let context = instant_context();
    let run_loop = context.run_loop().clone();
    let log = event_log();

    let (c1, c2) = (logger(&log, &run_loop, "e1"), logger(&log, &run_loop, "e2"));
    context
        .anim_with(|s| {
            s.delay = ms(500);
            s.completion = Some(closure(c1));
            || {}
        })
        .then_with(|s| {
            s.delay = ms(300);
            s.completion = Some(closure(c2));
            || {}
        });

    run_loop.run_until_idle();
    assert_eq!(*log.borrow(), vec![("e1", ms(500)), ("e2", ms(800))]);
}

#[test]
fn default_completion_is_copied_into_each_step() {
    let context = instant_context();
    let run_loop = context.run_loop().clone();
    let log = event_log();
    let done = closure(logger(&log, &run_loop, "done"));
    context.update_default_settings(|s| {
        s.delay = ms(600);
        s.completion = Some(done);
    });

    context.anim(|| {}).then(|| {}).then(|| {});

    run_loop.run_until_idle();
    assert_eq!(
        *log.borrow(),
        vec![("done", ms(600)), ("done", ms(1200)), ("done", ms(1800))]
    );
}

// --- links ------------------------------------------------------------------

#[test]
fn chaining_links_next_and_prev() {
    let context = AnimContext::new();
    let a = context.build(|| {});
    let t1 = a.then(|| {});
    let t2 = t1.then(|| {});
    let w = t2.wait(Duration::ZERO);
    let c = w.callback(|| {});

    assert_eq!(a.next(), Some(t1.clone()));
    assert_eq!(t1.next(), Some(t2.clone()));
    assert_eq!(t2.next(), Some(w.clone()));
    assert_eq!(w.next(), Some(c.clone()));
    assert_eq!(c.next(), None);

    assert_eq!(c.prev(), Some(w.clone()));
    assert_eq!(t1.prev(), Some(a.clone()));
    assert_eq!(a.prev(), None);
    assert_eq!(a.tail(), c);
}

#[test]
fn chaining_twice_from_one_step_extends_the_chain() {
    let context = AnimContext::new();
    let a = context.build(|| {});
    let b = a.then(|| {});
    let c = a.then(|| {});

    assert_eq!(a.next(), Some(b.clone()));
    assert_eq!(b.next(), Some(c.clone()));
    assert_eq!(c.prev(), Some(b));
}

#[test]
fn prev_link_does_not_keep_steps_alive() {
    let context = instant_context();
    let tail = {
        let first = context.anim(|| {});
        first.then(|| {})
    };

    assert_eq!(tail.state(), StepState::Finished);
    assert_eq!(tail.prev(), None);
}

#[test]
fn chain_runs_without_caller_handles() {
    let context = instant_context();
    let run_loop = context.run_loop().clone();
    let log = event_log();

    context
        .anim_with(|s| {
            s.delay = ms(100);
            || {}
        })
        .then(logger(&log, &run_loop, "tail"));

    run_loop.run_until_idle();
    assert_eq!(*log.borrow(), vec![("tail", ms(100))]);
}

#[test]
fn then_on_a_finished_chain_starts_immediately() {
    let context = instant_context();
    let run_loop = context.run_loop().clone();
    let log = event_log();

    let first = context.anim(|| {});
    run_loop.run_until_idle();
    assert_eq!(first.state(), StepState::Finished);

    let late = first.then(logger(&log, &run_loop, "late"));
    assert_eq!(names(&log), vec!["late"]);
    assert_eq!(late.state(), StepState::Finished);
}

#[test]
fn built_steps_wait_for_start() {
    let context = instant_context();
    let run_loop = context.run_loop().clone();
    let log = event_log();

    let step = context.build(logger(&log, &run_loop, "built"));
    run_loop.run_until_idle();
    assert_eq!(step.state(), StepState::Created);
    assert!(log.borrow().is_empty());

    step.start();
    step.start();
    assert_eq!(names(&log), vec!["built"]);
}

// --- stopping ---------------------------------------------------------------

#[test]
fn stop_truncates_the_remaining_chain() {
    let context = instant_context();
    let run_loop = context.run_loop().clone();
    let log = event_log();

    let (e1, e2) = (logger(&log, &run_loop, "e1"), logger(&log, &run_loop, "e2"));
    let (late, late_call) = counter();
    let late_again = late_call.clone();
    let first = context.anim_with(|s| {
        s.delay = ms(300);
        || {}
    });
    let tail = first
        .then_with(|s| {
            s.delay = ms(400);
            e1
        })
        .then_with(|s| {
            s.delay = ms(600);
            e2
        })
        .then_with(|s| {
            s.delay = ms(800);
            late_call
        })
        .then_with(|s| {
            s.delay = ms(400);
            late_again
        });

    run_loop.advance(ms(1500));
    tail.stop();
    run_loop.run_until_idle();

    assert_eq!(*log.borrow(), vec![("e1", ms(700)), ("e2", ms(1300))]);
    assert_eq!(late.get(), 0);

    let mut step = Some(first);
    let mut states = Vec::new();
    while let Some(current) = step {
        states.push(current.state());
        step = current.next();
    }
    assert_eq!(
        states,
        vec![
            StepState::Finished,
            StepState::Finished,
            StepState::Finished,
            StepState::Cancelled,
            StepState::Cancelled,
        ]
    );
}

#[test]
fn stop_from_the_first_step_cancels_later_steps() {
    let context = instant_context();
    context.update_default_settings(|s| s.delay = ms(400));
    let run_loop = context.run_loop().clone();
    let log = event_log();
    let (late, late_call) = counter();

    let first = context.anim(logger(&log, &run_loop, "e1"));
    let second = first.then(logger(&log, &run_loop, "e2"));
    let third = second.then(late_call);

    run_loop.advance(ms(600));
    first.stop();
    run_loop.run_until_idle();

    assert_eq!(*log.borrow(), vec![("e1", ms(400))]);
    assert_eq!(late.get(), 0);
    assert_eq!(first.state(), StepState::Finished);
    assert_eq!(second.state(), StepState::Cancelled);
    assert_eq!(third.state(), StepState::Cancelled);
}

#[test]
fn stop_during_delay_skips_the_mutation() {
    let context = AnimContext::new();
    let run_loop = context.run_loop().clone();
    let (ran, mutation) = counter();

    let step = context.anim_with(|s| {
        s.delay = ms(1000);
        mutation
    });
    run_loop.advance(ms(500));
    step.stop();
    run_loop.run_until_idle();

    assert_eq!(ran.get(), 0);
    assert_eq!(step.state(), StepState::Cancelled);
    assert_eq!(run_loop.now(), ms(1000));
}

#[test]
fn stop_mid_animation_halts_the_renderer() {
    let run_loop = RunLoop::new();
    let context = AnimContext::with_run_loop(run_loop.clone(), ms(100));
    let layer = context.scene().layer("card");
    layer.set("x", 0.0);

    let (first_target, second_target) = (layer.clone(), layer.clone());
    let first = context.anim_with(move |s| {
        s.ease = crate::Ease::LINEAR;
        move || first_target.set("x", 100.0)
    });
    let second = first.then(move || second_target.set("x", 200.0));

    run_loop.advance(ms(500));
    assert!(first.has_active_renderer());
    assert!(!context.scene().accepts_interaction());

    first.stop();
    let frozen = layer.presentation("x").unwrap();
    assert!(frozen > 0.0 && frozen < 100.0, "frozen at {frozen}");

    run_loop.run_until_idle();
    assert_eq!(layer.presentation("x"), Some(frozen));
    assert_eq!(layer.get("x"), Some(frozen));
    assert_eq!(first.state(), StepState::Cancelled);
    assert_eq!(second.state(), StepState::Cancelled);
    assert!(!first.has_active_renderer());
    assert!(context.scene().accepts_interaction());
}

#[test]
fn stop_reaches_the_renderer_of_the_active_step() {
    let context = AnimContext::new();
    let spy = install_spy(&context);

    let step = context.anim(|| {});
    assert_eq!(spy.borrow().starts, 1);
    assert!(step.has_active_renderer());

    step.stop();
    step.stop();
    assert_eq!(spy.borrow().stops, 1);

    let completion = spy.borrow().completion.clone().unwrap();
    completion();
    assert_eq!(step.state(), StepState::Cancelled);
}

#[test]
fn stop_after_the_chain_finished_changes_nothing() {
    let context = instant_context();
    let first = context.anim(|| {});
    let second = first.then(|| {});

    second.stop();
    assert_eq!(first.state(), StepState::Finished);
    assert_eq!(second.state(), StepState::Finished);
}

#[test]
fn completion_block_can_stop_its_chain() {
    let context = instant_context();
    let run_loop = context.run_loop().clone();
    let slot: Rc<RefCell<Option<Anim>>> = Rc::new(RefCell::new(None));
    let (ran, next_mutation) = counter();

    let stopper = slot.clone();
    let first = context.build_with(move |s| {
        s.completion = Some(closure(move || {
            if let Some(step) = stopper.borrow().as_ref() {
                step.stop();
            }
        }));
        || {}
    });
    let second = first.then(next_mutation);
    *slot.borrow_mut() = Some(second.clone());

    first.start();
    run_loop.run_until_idle();

    assert_eq!(ran.get(), 0);
    assert_eq!(first.state(), StepState::Cancelled);
    assert_eq!(second.state(), StepState::Cancelled);
    slot.borrow_mut().take();
}

#[test]
fn mutation_can_stop_its_own_step() {
    let context = AnimContext::new();
    let run_loop = context.run_loop().clone();
    let slot: Rc<RefCell<Option<Anim>>> = Rc::new(RefCell::new(None));

    let stopper = slot.clone();
    let step = context.build(move || {
        if let Some(step) = stopper.borrow().as_ref() {
            step.stop();
        }
    });
    *slot.borrow_mut() = Some(step.clone());
    step.start();
    run_loop.run_until_idle();

    assert_eq!(step.state(), StepState::Cancelled);
    assert!(!step.has_active_renderer());
    assert!(context.scene().accepts_interaction());
    slot.borrow_mut().take();
}

#[test]
fn stop_cancels_a_timed_step_before_its_completion() {
    let context = AnimContext::new();
    let run_loop = context.run_loop().clone();
    let layer = context.scene().layer("badge");
    layer.set("alpha", 0.0);
    let (completions, on_complete) = counter();
    let (next_runs, next_mutation) = counter();

    let target = layer.clone();
    let first = context.anim_with(move |s| {
        s.renderer = RendererKind::Timed;
        s.duration = ms(400);
        s.completion = Some(closure(on_complete));
        move || target.set("alpha", 1.0)
    });
    let second = first.then(next_mutation);

    run_loop.advance(ms(200));
    assert!(first.has_active_renderer());
    assert!(!context.scene().accepts_interaction());

    first.stop();
    assert!(context.scene().accepts_interaction());
    assert_eq!(run_loop.run_until_idle(), 0);

    assert_eq!(completions.get(), 0);
    assert_eq!(next_runs.get(), 0);
    assert_eq!(first.state(), StepState::Cancelled);
    assert_eq!(second.state(), StepState::Cancelled);
    assert_eq!(layer.presentation("alpha"), Some(1.0));
    assert_eq!(run_loop.now(), ms(200));
}

// --- renderers --------------------------------------------------------------

#[test]
fn repeated_renderer_completion_is_ignored() {
    let context = AnimContext::new();
    let spy = install_spy(&context);
    let (user_completions, on_complete) = counter();
    let (next_runs, next_mutation) = counter();

    let step = context.anim_with(|s| {
        s.completion = Some(closure(on_complete));
        || {}
    });
    step.callback(next_mutation);

    let completion = spy.borrow().completion.clone().unwrap();
    completion();
    completion();

    assert_eq!(user_completions.get(), 1);
    assert_eq!(next_runs.get(), 1);
    assert_eq!(step.state(), StepState::Finished);
    assert!(!step.has_active_renderer());
}

#[test]
fn renderer_kind_selects_the_renderer() {
    let context = AnimContext::new();
    let run_loop = context.run_loop().clone();
    let layer = context.scene().layer("dot");
    layer.set("alpha", 0.0);

    let target = layer.clone();
    let step = context.anim_with(move |s| {
        s.renderer = RendererKind::Timed;
        s.duration = ms(400);
        move || target.set("alpha", 1.0)
    });

    assert_eq!(layer.presentation("alpha"), Some(1.0));
    assert_eq!(step.state(), StepState::Started);
    run_loop.run_until_idle();
    assert_eq!(step.state(), StepState::Finished);
    assert_eq!(run_loop.now(), ms(400));
}

#[test]
fn interpolated_chain_finishes_after_total_duration() {
    let context = AnimContext::new();
    let run_loop = context.run_loop().clone();
    let layer = context.scene().layer("particle");
    layer.set("y", 0.0);
    layer.set("alpha", 0.0);

    let (up, fade_in, fade_out) = (layer.clone(), layer.clone(), layer.clone());
    context
        .anim_with(move |s| {
            s.duration = ms(300);
            move || {
                up.set("y", -80.0);
                fade_in.set("alpha", 1.0);
            }
        })
        .then_with(move |s| {
            s.duration = ms(200);
            s.ease = crate::Ease::EASE_IN_SINE;
            move || fade_out.set("alpha", 0.0)
        });

    run_loop.advance(ms(300));
    assert_eq!(layer.presentation("y"), Some(-80.0));
    assert_eq!(layer.presentation("alpha"), Some(1.0));

    run_loop.run_until_idle();
    assert_eq!(layer.presentation("alpha"), Some(0.0));
    assert_eq!(run_loop.now(), ms(500));
}

// --- constraint layout --------------------------------------------------------

#[test]
fn constraint_step_flushes_layout_before_mutation_and_animates_relayout() {
    let context = AnimContext::new();
    let spy = install_spy(&context);

    let flushes = Rc::new(Cell::new(0));
    let flush_counter = flushes.clone();
    let parent: Rc<dyn LayoutRoot> = Rc::new(move || flush_counter.set(flush_counter.get() + 1));

    let flushes_at_mutation = Rc::new(Cell::new(None));
    let (seen, watched) = (flushes_at_mutation.clone(), flushes.clone());
    let mutations = Rc::new(Cell::new(0));
    let mutation_count = mutations.clone();
    let step = context.anim_layout_with(parent, move |s| {
        s.duration = ms(300);
        move || {
            seen.set(Some(watched.get()));
            mutation_count.set(mutation_count.get() + 1);
        }
    });

    assert!(flushes_at_mutation.get().unwrap() >= 1);
    assert_eq!(mutations.get(), 1);
    assert_eq!(spy.borrow().starts, 1);

    let handed_over = spy.borrow().mutation.clone().unwrap();
    let before = flushes.get();
    handed_over();
    assert_eq!(flushes.get(), before + 1);
    assert_eq!(mutations.get(), 1);

    let completion = spy.borrow().completion.clone().unwrap();
    completion();
    assert_eq!(step.state(), StepState::Finished);
}

#[test]
fn constraint_steps_chain_like_plain_steps() {
    let context = instant_context();
    let run_loop = context.run_loop().clone();
    let log = event_log();
    let parent: Rc<dyn LayoutRoot> = Rc::new(|| {});

    let e3 = logger(&log, &run_loop, "e3");
    context
        .anim_layout(parent.clone(), logger(&log, &run_loop, "e1"))
        .then_layout(parent.clone(), logger(&log, &run_loop, "e2"))
        .then_layout_with(parent, |s| {
            s.delay = ms(1000);
            e3
        });

    run_loop.run_until_idle();
    assert_eq!(
        *log.borrow(),
        vec![("e1", ms(0)), ("e2", ms(0)), ("e3", ms(1000))]
    );
}

#[test]
fn constraint_geometry_is_interpolated_through_relayout() {
    let run_loop = RunLoop::new();
    let context = AnimContext::with_run_loop(run_loop.clone(), ms(100));
    let scene = context.scene().clone();
    let button = scene.layer("button");

    // Tiny layout engine: one constant drives the button's y position.
    let constant = Rc::new(Cell::new(0.0));
    let (source, target) = (constant.clone(), button.clone());
    let parent: Rc<dyn LayoutRoot> = Rc::new(move || target.set("y", source.get() * 2.0));
    parent.layout_if_needed();

    let edit = constant.clone();
    context.anim_layout_with(parent, move |s| {
        s.duration = ms(400);
        s.ease = crate::Ease::LINEAR;
        move || edit.set(50.0)
    });

    assert_eq!(button.get("y"), Some(100.0));
    assert_eq!(button.presentation("y"), Some(0.0));

    run_loop.advance(ms(200));
    let halfway = button.presentation("y").unwrap();
    assert!((halfway - 50.0).abs() < 0.5, "halfway was {halfway}");

    run_loop.run_until_idle();
    assert_eq!(button.presentation("y"), Some(100.0));
}

#[test]
fn stop_freezes_a_constraint_step_mid_relayout() {
    let run_loop = RunLoop::new();
    let context = AnimContext::with_run_loop(run_loop.clone(), ms(100));
    let button = context.scene().layer("button");

    let constant = Rc::new(Cell::new(0.0));
    let (source, target) = (constant.clone(), button.clone());
    let parent: Rc<dyn LayoutRoot> = Rc::new(move || target.set("y", source.get() * 2.0));
    parent.layout_if_needed();

    let (open, close) = (constant.clone(), constant.clone());
    let first = context.anim_layout_with(parent.clone(), move |s| {
        s.duration = ms(400);
        s.ease = crate::Ease::LINEAR;
        move || open.set(50.0)
    });
    let second = first.then_layout(parent, move || close.set(0.0));

    run_loop.advance(ms(200));
    first.stop();
    let frozen = button.presentation("y").unwrap();
    assert!((frozen - 50.0).abs() < 0.5, "frozen at {frozen}");

    run_loop.run_until_idle();
    assert_eq!(button.presentation("y"), Some(frozen));
    assert_eq!(button.get("y"), Some(frozen));
    assert_eq!(constant.get(), 50.0);
    assert_eq!(first.state(), StepState::Cancelled);
    assert_eq!(second.state(), StepState::Cancelled);
    assert!(context.scene().accepts_interaction());
}
