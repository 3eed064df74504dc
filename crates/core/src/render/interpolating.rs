use std::{cell::RefCell, rc::Rc, time::Duration};

use crate::{
    timeline::TimerId, Closure, Ease, PropertyWrite, Renderer, RunLoop, Scene, Settings,
};

/// Frame-driven renderer over a [`Scene`].
///
/// The mutation runs inside a scene recording, so its property writes are
/// captured in this renderer's own transition instead of landing on screen.
/// Each frame then moves the presentation values along the easing curve until
/// the duration has elapsed.
pub struct InterpolatingRenderer {
    scene: Scene,
    run_loop: RunLoop,
    frame_interval: Duration,
    active: Option<Rc<RefCell<Transition>>>,
}

struct Transition {
    writes: Vec<PropertyWrite>,
    started_at: Duration,
    duration: Duration,
    ease: Ease,
    completion: Option<Closure>,
    frame: Option<TimerId>,
    blocks_interaction: bool,
    done: bool,
}

impl InterpolatingRenderer {
    pub fn new(scene: Scene, run_loop: RunLoop, frame_interval: Duration) -> Self {
        Self {
            scene,
            run_loop,
            // A zero interval would spin the run loop without moving time.
            frame_interval: frame_interval.max(Duration::from_millis(1)),
            active: None,
        }
    }

    /// Whether a transition is currently playing.
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|transition| !transition.borrow().done)
    }
}

impl Renderer for InterpolatingRenderer {
    fn start(&mut self, mutation: Closure, completion: Closure, settings: &Settings) {
        self.stop();

        let writes = self.scene.record(|| mutation());
        tracing::trace!(
            writes = writes.len(),
            duration = ?settings.duration,
            ease = %settings.ease,
            "interpolating recorded writes"
        );

        let blocks_interaction = !settings.user_interaction;
        if blocks_interaction {
            self.scene.block_interaction();
        }

        let transition = Rc::new(RefCell::new(Transition {
            writes,
            started_at: self.run_loop.now(),
            duration: settings.duration,
            ease: settings.ease,
            completion: Some(completion),
            frame: None,
            blocks_interaction,
            done: false,
        }));
        self.active = Some(transition.clone());

        schedule_frame(&self.scene, &self.run_loop, self.frame_interval, transition);
    }

    fn stop(&mut self) {
        let Some(transition) = self.active.take() else {
            return;
        };

        let mut transition = transition.borrow_mut();
        if transition.done {
            return;
        }
        transition.done = true;
        transition.completion = None;
        if let Some(frame) = transition.frame.take() {
            self.run_loop.cancel(frame);
        }
        for write in &transition.writes {
            self.scene.commit_presentation(&write.key);
        }
        if transition.blocks_interaction {
            self.scene.unblock_interaction();
        }
    }
}

impl Transition {
    /// End of the transition, clamped to the latest representable time.
    fn ends_at(&self) -> Duration {
        self.started_at.saturating_add(self.duration)
    }
}

fn schedule_frame(
    scene: &Scene,
    run_loop: &RunLoop,
    frame_interval: Duration,
    transition: Rc<RefCell<Transition>>,
) {
    let remaining = {
        let t = transition.borrow();
        t.ends_at().saturating_sub(run_loop.now())
    };
    // Land the last frame exactly on the end of the transition.
    let delay = frame_interval.min(remaining);

    let (s, r) = (scene.clone(), run_loop.clone());
    let handle = transition.clone();
    let id = run_loop.schedule_after(delay, move || render_frame(&s, &r, frame_interval, handle));
    transition.borrow_mut().frame = Some(id);
}

fn render_frame(
    scene: &Scene,
    run_loop: &RunLoop,
    frame_interval: Duration,
    transition: Rc<RefCell<Transition>>,
) {
    let finished = {
        let mut t = transition.borrow_mut();
        t.frame = None;
        if t.done {
            return;
        }

        let now = run_loop.now();
        let elapsed = now.saturating_sub(t.started_at);
        let fraction = if t.duration.is_zero() || now >= t.ends_at() {
            1.0
        } else {
            elapsed.as_secs_f64() / t.duration.as_secs_f64()
        };

        if fraction >= 1.0 {
            for write in &t.writes {
                scene.present(&write.key, write.to);
            }
            t.done = true;
            if t.blocks_interaction {
                scene.unblock_interaction();
            }
            Some(t.completion.take())
        } else {
            let progress = t.ease.solve(fraction);
            for write in &t.writes {
                scene.present(&write.key, write.value_at(progress));
            }
            None
        }
    };

    match finished {
        Some(completion) => {
            if let Some(completion) = completion {
                completion();
            }
        }
        None => schedule_frame(scene, run_loop, frame_interval, transition),
    }
}
