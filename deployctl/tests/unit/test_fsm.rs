//! FSM unit tests

use deployctl::deploy::fsm::{RunEvent, RunState, RunStateMachine};

#[test]
fn test_fsm_initial_state() {
    let fsm = RunStateMachine::new();
    assert_eq!(fsm.state(), RunState::Init);
    assert!(fsm.error().is_none());
    assert_eq!(fsm.history(), &[RunState::Init]);
}

#[test]
fn test_fsm_reactive_flow() {
    let mut fsm = RunStateMachine::new();

    // Init -> Submitting, no snapshot preparation
    fsm.process(RunEvent::Submit).unwrap();
    assert_eq!(fsm.state(), RunState::Submitting);

    // Submitting -> Polling
    fsm.process(RunEvent::Poll).unwrap();
    assert_eq!(fsm.state(), RunState::Polling);

    // Polling -> Finalizing -> Done
    fsm.process(RunEvent::Finalize).unwrap();
    fsm.process(RunEvent::Complete).unwrap();
    assert_eq!(fsm.state(), RunState::Done);
    assert!(fsm.state().is_terminal());
}

#[test]
fn test_fsm_invalid_transitions() {
    let mut fsm = RunStateMachine::new();

    // Cannot poll before submitting
    assert!(fsm.process(RunEvent::Poll).is_err());
    assert_eq!(fsm.state(), RunState::Init);

    // Cannot prepare a snapshot after submission
    fsm.process(RunEvent::Submit).unwrap();
    assert!(fsm.process(RunEvent::PrepareSnapshot).is_err());

    // Cannot complete without finalizing
    assert!(fsm.process(RunEvent::Complete).is_err());
}

#[test]
fn test_fsm_fail_from_snapshot_prep() {
    let mut fsm = RunStateMachine::new();
    fsm.process(RunEvent::PrepareSnapshot).unwrap();
    fsm.process(RunEvent::Fail("snapshot rejected".to_string()))
        .unwrap();

    assert_eq!(fsm.state(), RunState::Failed);
    assert_eq!(fsm.error(), Some("snapshot rejected"));
    assert!(fsm.process(RunEvent::Submit).is_err());
}
