//! Widget session state machine
//!
//! Pure state machine: receives events, returns (new_phase, action).
//! The caller ([`crate::WidgetBootstrap`] or a [`crate::LoadSignal`])
//! executes the DOM work or future resolution implied by each action.
//!
//! ```text
//! Idle --Initialize--> Loading --ScriptLoaded--> Ready
//!                         |  \--ScriptFailed--> Failed
//!                         |
//!  any --Cleanup--> Idle  (Loading abandons its pending future)
//! ```

/// Per-container widget phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetPhase {
    /// No resources injected
    #[default]
    Idle,
    /// Script injected, outcome not yet reported
    Loading,
    /// Script reported a successful load
    Ready,
    /// Script reported a load failure
    Failed,
}

/// Events that drive phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    /// Caller asked for a new session (after cleaning up any prior one)
    Initialize,
    /// Script `load` event
    ScriptLoaded,
    /// Script `error` event
    ScriptFailed,
    /// Caller asked to tear the session down
    Cleanup,
}

/// Actions the caller should execute after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetAction {
    /// Inject stylesheet and script
    Inject,
    /// Resolve the pending load future with success
    Resolve,
    /// Reject the pending load future with the load error
    Reject,
    /// Reject the pending future as superseded, then remove resources
    AbandonAndTeardown,
    /// Remove resources
    Teardown,
    /// No-op
    None,
}

/// Handle a phase transition. Pure function: no I/O.
pub fn handle_event(phase: WidgetPhase, event: WidgetEvent) -> (WidgetPhase, WidgetAction) {
    match (phase, event) {
        (WidgetPhase::Idle, WidgetEvent::Initialize) => (WidgetPhase::Loading, WidgetAction::Inject),

        (WidgetPhase::Loading, WidgetEvent::ScriptLoaded) => (WidgetPhase::Ready, WidgetAction::Resolve),
        (WidgetPhase::Loading, WidgetEvent::ScriptFailed) => (WidgetPhase::Failed, WidgetAction::Reject),

        (WidgetPhase::Loading, WidgetEvent::Cleanup) => {
            (WidgetPhase::Idle, WidgetAction::AbandonAndTeardown)
        }
        (_, WidgetEvent::Cleanup) => (WidgetPhase::Idle, WidgetAction::Teardown),

        // Initialize on a live session must go through Cleanup first; load
        // events after the outcome was delivered are duplicates.
        (phase, _event) => (phase, WidgetAction::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_initialize_injects() {
        let (phase, action) = handle_event(WidgetPhase::Idle, WidgetEvent::Initialize);
        assert_eq!(phase, WidgetPhase::Loading);
        assert_eq!(action, WidgetAction::Inject);
    }

    #[test]
    fn loading_resolves_or_rejects() {
        assert_eq!(
            handle_event(WidgetPhase::Loading, WidgetEvent::ScriptLoaded),
            (WidgetPhase::Ready, WidgetAction::Resolve)
        );
        assert_eq!(
            handle_event(WidgetPhase::Loading, WidgetEvent::ScriptFailed),
            (WidgetPhase::Failed, WidgetAction::Reject)
        );
    }

    #[test]
    fn outcome_is_delivered_once() {
        for settled in [WidgetPhase::Ready, WidgetPhase::Failed] {
            for event in [WidgetEvent::ScriptLoaded, WidgetEvent::ScriptFailed] {
                assert_eq!(
                    handle_event(settled, event),
                    (settled, WidgetAction::None),
                    "{settled:?} + {event:?} must be a no-op"
                );
            }
        }
    }

    #[test]
    fn cleanup_while_loading_abandons_pending() {
        assert_eq!(
            handle_event(WidgetPhase::Loading, WidgetEvent::Cleanup),
            (WidgetPhase::Idle, WidgetAction::AbandonAndTeardown)
        );
    }

    #[test]
    fn cleanup_is_idempotent() {
        for phase in [WidgetPhase::Idle, WidgetPhase::Ready, WidgetPhase::Failed] {
            assert_eq!(
                handle_event(phase, WidgetEvent::Cleanup),
                (WidgetPhase::Idle, WidgetAction::Teardown)
            );
        }
    }

    #[test]
    fn initialize_on_live_session_is_ignored() {
        for phase in [WidgetPhase::Loading, WidgetPhase::Ready, WidgetPhase::Failed] {
            assert_eq!(
                handle_event(phase, WidgetEvent::Initialize),
                (phase, WidgetAction::None)
            );
        }
    }

    #[test]
    fn idle_ignores_load_events() {
        assert_eq!(
            handle_event(WidgetPhase::Idle, WidgetEvent::ScriptLoaded),
            (WidgetPhase::Idle, WidgetAction::None)
        );
    }
}
