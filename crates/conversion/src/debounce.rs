//! Debounced submission trigger.

use std::time::{Duration, Instant};

/// Collapses bursts of trigger calls into one invocation.
///
/// Every [`call`](DebouncedTrigger::call) replaces the pending arguments and
/// restarts the window. Time is supplied by the caller, so a UI loop or a
/// test drives it with explicit instants. Nothing carries over once it has
/// fired.
#[derive(Debug)]
pub struct DebouncedTrigger<A> {
    window: Duration,
    pending: Option<(A, Instant)>,
}

impl<A> DebouncedTrigger<A> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Register a call at `now`.
    pub fn call(&mut self, args: A, now: Instant) {
        self.pending = Some((args, now + self.window));
    }

    /// Invoke `f` with the pending arguments if the window has elapsed.
    pub fn fire_if_due<R>(&mut self, now: Instant, f: impl FnOnce(A) -> R) -> Option<R> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => {
                self.pending.take().map(|(args, _)| f(args))
            }
            _ => None,
        }
    }

    /// When the pending call becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop a pending call.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
