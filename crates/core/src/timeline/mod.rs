use std::{cell::RefCell, collections::BTreeMap, fmt, rc::Rc, time::Duration};

/// Virtual time source driven by the [`RunLoop`].
#[derive(Debug, Default, Clone)]
pub struct PlaybackClock {
    now: Duration,
}

impl PlaybackClock {
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn reset(&mut self) {
        self.now = Duration::ZERO;
    }

    pub fn advance(&mut self, delta: Duration) {
        self.now = self.now.saturating_add(delta);
    }

    fn advance_to(&mut self, time: Duration) {
        self.now = self.now.max(time);
    }
}

/// How the run loop spends the time between two timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Jump straight to the next deadline.
    #[default]
    Virtual,
    /// Sleep the calling thread until the deadline, for interactive demos.
    RealTime,
}

/// Handle for a scheduled one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId {
    deadline: Duration,
    seq: u64,
}

impl TimerId {
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

type Task = Box<dyn FnOnce()>;

#[derive(Default)]
struct RunLoopState {
    clock: PlaybackClock,
    timers: BTreeMap<TimerId, Task>,
    next_seq: u64,
    pacing: Pacing,
}

/// Single-threaded cooperative event loop.
///
/// All waiting in the crate is expressed as one-shot timers on this loop.
/// Timers fire in deadline order, and timers sharing a deadline fire in the
/// order they were scheduled. Handles are cheap clones of the same loop.
#[derive(Clone, Default)]
pub struct RunLoop {
    state: Rc<RefCell<RunLoopState>>,
}

impl RunLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pacing(pacing: Pacing) -> Self {
        let run_loop = Self::new();
        run_loop.state.borrow_mut().pacing = pacing;
        run_loop
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.state.borrow().clock.now()
    }

    /// Number of timers still waiting to fire.
    pub fn pending(&self) -> usize {
        self.state.borrow().timers.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.state.borrow().timers.keys().next().map(TimerId::deadline)
    }

    /// Schedules `task` to run once, `delay` after the current time.
    ///
    /// A zero delay still defers the task to a later turn of the loop.
    pub fn schedule_after<F>(&self, delay: Duration, task: F) -> TimerId
    where
        F: FnOnce() + 'static,
    {
        let mut state = self.state.borrow_mut();
        let id = TimerId {
            deadline: state.clock.now().saturating_add(delay),
            seq: state.next_seq,
        };
        state.next_seq += 1;
        state.timers.insert(id, Box::new(task));
        id
    }

    /// Removes a timer that has not fired yet. Returns whether it was pending.
    pub fn cancel(&self, id: TimerId) -> bool {
        // Dropping the task may drop handles that re-enter the loop, so release the borrow first.
        let removed = self.state.borrow_mut().timers.remove(&id);
        removed.is_some()
    }

    /// Moves time forward by `delta`, firing every timer that falls due on the way.
    ///
    /// Returns the number of timers fired.
    pub fn advance(&self, delta: Duration) -> usize {
        let target = self.now().saturating_add(delta);
        self.run_until(target)
    }

    /// Fires every timer due at or before `time`, then parks the clock at `time`.
    pub fn run_until(&self, time: Duration) -> usize {
        let mut fired = 0;
        while self.next_deadline().is_some_and(|deadline| deadline <= time) {
            if self.fire_next() {
                fired += 1;
            }
        }
        self.wait_until(time);
        self.state.borrow_mut().clock.advance_to(time);
        fired
    }

    /// Fires timers until none are left.
    ///
    /// A timer that keeps rescheduling itself keeps this running; animation
    /// chains that never complete are the caller's concern.
    pub fn run_until_idle(&self) -> usize {
        let mut fired = 0;
        while self.fire_next() {
            fired += 1;
        }
        fired
    }

    fn fire_next(&self) -> bool {
        let next = {
            let mut state = self.state.borrow_mut();
            state.timers.pop_first()
        };
        let Some((id, task)) = next else {
            return false;
        };

        self.wait_until(id.deadline);
        self.state.borrow_mut().clock.advance_to(id.deadline);
        task();
        true
    }

    fn wait_until(&self, time: Duration) {
        let (pacing, now) = {
            let state = self.state.borrow();
            (state.pacing, state.clock.now())
        };
        if pacing == Pacing::RealTime && time > now {
            std::thread::sleep(time - now);
        }
    }
}

impl fmt::Debug for RunLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("RunLoop")
            .field("now", &state.clock.now())
            .field("pending", &state.timers.len())
            .field("pacing", &state.pacing)
            .finish()
    }
}
