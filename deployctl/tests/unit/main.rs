//! Integration tests for deployctl

mod test_fsm;
mod test_logging;
mod test_orchestrator;
mod test_request;
