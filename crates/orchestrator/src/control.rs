//! Run-control signaling: pause/stop requests that take effect at step
//! boundaries, and the state machine the orchestrator reports through.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// `Idle -> Running -> {Paused, Recovering} -> Running -> {Completed, Failed}`.
/// Pause/stop requests are only observed between steps, never mid-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Running,
    Paused,
    Recovering,
    Completed,
    Failed,
}

impl OrchestratorState {
    fn to_tag(self) -> u8 {
        match self {
            OrchestratorState::Idle => 0,
            OrchestratorState::Running => 1,
            OrchestratorState::Paused => 2,
            OrchestratorState::Recovering => 3,
            OrchestratorState::Completed => 4,
            OrchestratorState::Failed => 5,
        }
    }

    fn from_tag(tag: u8) -> Self {
        match tag {
            1 => OrchestratorState::Running,
            2 => OrchestratorState::Paused,
            3 => OrchestratorState::Recovering,
            4 => OrchestratorState::Completed,
            5 => OrchestratorState::Failed,
            _ => OrchestratorState::Idle,
        }
    }
}

/// Shared handle a caller holds onto a running test so it can request a
/// pause or a stop from another task while the orchestrator loop executes.
pub struct RunControl {
    state: AtomicU8,
    paused: AtomicBool,
    stopped: AtomicBool,
    resume: Notify,
}

impl RunControl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: AtomicU8::new(OrchestratorState::Idle.to_tag()),
            paused: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            resume: Notify::new(),
        })
    }

    pub fn state(&self) -> OrchestratorState {
        OrchestratorState::from_tag(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: OrchestratorState) {
        self.state.store(state.to_tag(), Ordering::Release);
    }

    /// Requests a pause; takes effect at the next step boundary.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Lifts a pause request and wakes the orchestrator loop if it is
    /// currently waiting on one.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume.notify_waiters();
    }

    /// Requests the run stop; remaining steps are marked `Skipped` rather
    /// than executed.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.resume.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Blocks until an outstanding pause is lifted or a stop is requested.
    pub(crate) async fn wait_if_paused(&self) {
        if !self.paused.load(Ordering::Acquire) {
            return;
        }
        self.set_state(OrchestratorState::Paused);
        while self.paused.load(Ordering::Acquire) && !self.stopped.load(Ordering::Acquire) {
            self.resume.notified().await;
        }
        if !self.stopped.load(Ordering::Acquire) {
            self.set_state(OrchestratorState::Running);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pause_blocks_until_resume() {
        let control = RunControl::new();
        control.pause();
        let waiter = {
            let control = control.clone();
            tokio::spawn(async move {
                control.wait_if_paused().await;
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        control.resume();
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter).await.unwrap().unwrap();
    }

    #[test]
    fn stop_is_observed_independent_of_pause_state() {
        let control = RunControl::new();
        control.stop();
        assert!(control.is_stopped());
    }
}
