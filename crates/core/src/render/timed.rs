use crate::{timeline::TimerId, Closure, Renderer, RunLoop, Scene, Settings};

/// Applies the mutation at once and reports completion after the duration.
///
/// Useful for backends that animate on their own and only need the scheduler
/// to wait, and for tests that care about timing but not about in-between
/// values.
pub struct TimedRenderer {
    scene: Scene,
    run_loop: RunLoop,
    pending: Option<Pending>,
}

struct Pending {
    timer: TimerId,
    blocks_interaction: bool,
}

impl TimedRenderer {
    pub fn new(scene: Scene, run_loop: RunLoop) -> Self {
        Self {
            scene,
            run_loop,
            pending: None,
        }
    }
}

impl Renderer for TimedRenderer {
    fn start(&mut self, mutation: Closure, completion: Closure, settings: &Settings) {
        self.stop();

        mutation();

        let blocks_interaction = !settings.user_interaction;
        if blocks_interaction {
            self.scene.block_interaction();
        }

        let scene = self.scene.clone();
        let timer = self.run_loop.schedule_after(settings.duration, move || {
            if blocks_interaction {
                scene.unblock_interaction();
            }
            completion();
        });
        self.pending = Some(Pending {
            timer,
            blocks_interaction,
        });
    }

    fn stop(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        // A timer that already fired has unblocked the scene itself.
        if self.run_loop.cancel(pending.timer) && pending.blocks_interaction {
            self.scene.unblock_interaction();
        }
    }
}
