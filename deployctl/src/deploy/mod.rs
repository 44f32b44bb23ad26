//! Deployment run: state machine, status polling and orchestration

pub mod fsm;
pub mod monitor;
pub mod orchestrator;

pub use orchestrator::{DeploymentOrchestrator, DeploymentOutcome, OrchestratorOptions};
