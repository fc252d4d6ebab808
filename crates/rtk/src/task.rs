//! Suspend/resume control for long-running tasks.
//!
//! A [`TaskGate`] replaces the scheduler's suspend/resume calls. The gate
//! is owned jointly by a task and the tasks allowed to control it: the
//! controlled task parks at its own suspension points with
//! [`TaskGate::wait_resumed`], while controllers flip the gate with
//! [`TaskGate::suspend`] and [`TaskGate::resume`].

use core::fmt;
use core::time::Duration;
use std::time::Instant;

use log::trace;
use parking_lot::{Condvar, Mutex};

/// Run state of a gated task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// The task is parked and has no side effects.
    Suspended,
    /// The task is allowed to run.
    Resumed,
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateState::Suspended => write!(f, "Suspended"),
            GateState::Resumed => write!(f, "Resumed"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for GateState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            GateState::Suspended => defmt::write!(fmt, "Suspended"),
            GateState::Resumed => defmt::write!(fmt, "Resumed"),
        }
    }
}

/// Suspend/resume gate for one task.
pub struct TaskGate {
    name: &'static str,
    state: Mutex<GateState>,
    resumed: Condvar,
}

impl TaskGate {
    pub fn new(name: &'static str, initial: GateState) -> Self {
        Self {
            name,
            state: Mutex::new(initial),
            resumed: Condvar::new(),
        }
    }

    /// Gate that starts parked.
    pub fn suspended(name: &'static str) -> Self {
        Self::new(name, GateState::Suspended)
    }

    /// Gate that starts running.
    pub fn resumed(name: &'static str) -> Self {
        Self::new(name, GateState::Resumed)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> GateState {
        *self.state.lock()
    }

    pub fn is_suspended(&self) -> bool {
        self.state() == GateState::Suspended
    }

    /// Park the task at its next suspension point.
    ///
    /// Blocks while the task is inside [`TaskGate::run_resumed`], so once
    /// this returns the task performs no further gated work.
    pub fn suspend(&self) {
        let mut state = self.state.lock();
        if *state != GateState::Suspended {
            trace!("task `{}` suspended", self.name);
            *state = GateState::Suspended;
        }
    }

    /// Let the task run again.
    pub fn resume(&self) {
        let mut state = self.state.lock();
        if *state != GateState::Resumed {
            trace!("task `{}` resumed", self.name);
            *state = GateState::Resumed;
            self.resumed.notify_all();
        }
    }

    /// Block the calling task until the gate is resumed.
    pub fn wait_resumed(&self) {
        let mut state = self.state.lock();
        while *state == GateState::Suspended {
            self.resumed.wait(&mut state);
        }
    }

    /// Like [`TaskGate::wait_resumed`] but gives up after `timeout`.
    ///
    /// Returns `true` if the gate was resumed in time.
    pub fn wait_resumed_for(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while *state == GateState::Suspended {
            if self.resumed.wait_until(&mut state, deadline).timed_out() {
                return *state == GateState::Resumed;
            }
        }
        true
    }

    /// Wait until resumed, then run `step` while holding the gate.
    ///
    /// A concurrent [`TaskGate::suspend`] waits for `step` to finish. Keep
    /// `step` short and never sleep inside it.
    pub fn run_resumed<R>(&self, step: impl FnOnce() -> R) -> R {
        let mut state = self.state.lock();
        while *state == GateState::Suspended {
            self.resumed.wait(&mut state);
        }
        step()
    }
}

impl fmt::Debug for TaskGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskGate")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

/// Sleep the calling task for `duration`.
pub fn delay(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn gate_starts_in_requested_state() {
        assert!(TaskGate::suspended("a").is_suspended());
        assert_eq!(TaskGate::resumed("b").state(), GateState::Resumed);
    }

    #[test]
    fn resume_wakes_parked_task() {
        let gate = Arc::new(TaskGate::suspended("worker"));
        let woke = Arc::new(AtomicUsize::new(0));

        let handle = {
            let gate = Arc::clone(&gate);
            let woke = Arc::clone(&woke);
            thread::spawn(move || {
                gate.wait_resumed();
                woke.fetch_add(1, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(20));
        assert_eq!(woke.load(Ordering::SeqCst), 0);

        gate.resume();
        handle.join().unwrap();
        assert_eq!(woke.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn wait_resumed_for_times_out_while_suspended() {
        let gate = TaskGate::suspended("idle");
        assert!(!gate.wait_resumed_for(Duration::from_millis(10)));

        gate.resume();
        assert!(gate.wait_resumed_for(Duration::from_millis(10)));
    }

    #[test]
    fn suspended_gate_blocks_gated_steps() {
        let gate = Arc::new(TaskGate::resumed("led"));
        let steps = Arc::new(AtomicUsize::new(0));

        gate.run_resumed(|| steps.fetch_add(1, Ordering::SeqCst));
        gate.suspend();

        let handle = {
            let gate = Arc::clone(&gate);
            let steps = Arc::clone(&steps);
            thread::spawn(move || {
                gate.run_resumed(|| steps.fetch_add(1, Ordering::SeqCst));
            })
        };

        thread::sleep(Duration::from_millis(20));
        assert_eq!(steps.load(Ordering::SeqCst), 1);

        gate.resume();
        handle.join().unwrap();
        assert_eq!(steps.load(Ordering::SeqCst), 2);
    }
}
