//! Component lifecycle: Uninitialized → Ready → Running ⇄ Stopped.
//!
//! Initialization happens exactly once. The limiter cycle only executes
//! while `Running`.

use std::fmt;

/// Lifecycle state of the limiter component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Nothing built yet.
    #[default]
    Uninitialized,
    /// Store and controllers built, cycle not running.
    Ready,
    /// Cycle executing every tick.
    Running,
    /// Cycle halted; may be re-activated.
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "Uninitialized",
            Self::Ready => "Ready",
            Self::Running => "Running",
            Self::Stopped => "Stopped",
        };
        f.write_str(s)
    }
}

/// Result of a lifecycle transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded; holds the new state.
    Ok(LifecycleState),
    /// Transition rejected with a reason.
    Rejected(&'static str),
}

/// Event driven by the cycle driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Parameters built from configuration and topology.
    Initialize,
    /// Start executing cycles.
    Activate,
    /// Stop executing cycles.
    Deactivate,
}

/// Lifecycle manager holding the current state.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    /// New lifecycle in `Uninitialized`.
    pub const fn new() -> Self {
        Self {
            state: LifecycleState::Uninitialized,
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// True while cycles should execute.
    #[inline]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, LifecycleState::Running)
    }

    /// Attempt a transition given an event.
    pub fn handle_event(&mut self, event: LifecycleEvent) -> TransitionResult {
        use LifecycleEvent::*;
        use LifecycleState::*;

        let next = match (self.state, event) {
            (Uninitialized, Initialize) => Ready,
            (Ready, Activate) | (Stopped, Activate) => Running,
            (Running, Deactivate) => Stopped,
            _ => return TransitionResult::Rejected(invalid_transition_reason(self.state, event)),
        };

        self.state = next;
        TransitionResult::Ok(next)
    }
}

fn invalid_transition_reason(state: LifecycleState, event: LifecycleEvent) -> &'static str {
    use LifecycleEvent::*;
    use LifecycleState::*;
    match (state, event) {
        (_, Initialize) => "already initialized",
        (Uninitialized, _) => "Uninitialized: only Initialize allowed",
        (Running, Activate) => "Running: already active",
        (Ready, Deactivate) | (Stopped, Deactivate) => "not running",
        _ => "invalid event for current state",
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
