//! Coalescing of change bursts into a single trigger.
//!
//! The first change arms a one-shot deadline one quiescence window away.
//! Changes seen while armed do not move the deadline: the window is measured
//! from the first change, and whatever queues up behind it is drained after
//! the trigger has run. At most one trigger fires per window.

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    Armed(Instant),
}

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    state: State,
}

impl Debouncer {
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            state: State::Idle,
        }
    }

    pub const fn state(&self) -> State {
        self.state
    }

    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Records a change seen at `now`. Returns true if this armed the timer.
    pub fn observe(&mut self, now: Instant) -> bool {
        match self.state {
            State::Idle => {
                self.state = State::Armed(now + self.window);
                true
            }
            State::Armed(_) => false,
        }
    }

    pub const fn deadline(&self) -> Option<Instant> {
        match self.state {
            State::Idle => None,
            State::Armed(deadline) => Some(deadline),
        }
    }

    /// How long to wait for more events before the trigger is due, or `None`
    /// to wait indefinitely.
    pub fn timeout(&self, now: Instant) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline().map_or(false, |deadline| now >= deadline)
    }

    /// Returns to idle once the trigger has run and the queue has been drained.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }
}
