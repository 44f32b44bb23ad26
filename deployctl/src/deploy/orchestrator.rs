//! Runs one deployment request from snapshot preparation to property harvest

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::deploy::fsm::{RunEvent, RunState, RunStateMachine};
use crate::deploy::monitor::{MonitorOptions, PollingMonitor};
use crate::errors::DeployError;
use crate::harvest::PropertyPropagator;
use crate::models::request::{DeploymentRequest, SnapshotMode};
use crate::models::status::{DeploymentStatus, ProcessRequestId};
use crate::service::{DeploymentService, ProcessSubmission};
use crate::snapshot::SnapshotReconciler;
use crate::storage::property_store::PropertyStore;

/// Sleep used between status queries
pub type SleepFn = Arc<dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync>;

/// Orchestrator options
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub monitor: MonitorOptions,

    /// Copy application properties into the store after success
    pub harvest_properties: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            monitor: MonitorOptions::default(),
            harvest_properties: true,
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct DeploymentOutcome {
    pub request_id: ProcessRequestId,

    /// Terminal status; `None` when the wait was skipped
    pub status: Option<DeploymentStatus>,

    /// Time from the submission call to the end of polling
    pub duration: Duration,

    /// Link to the process request on the server
    pub audit_url: String,

    /// Snapshot the process was requested against
    pub snapshot: Option<String>,

    /// Properties written to the store
    pub harvested: usize,

    /// Wall clock time the run completed
    pub finished_at: DateTime<Utc>,

    /// States the run went through
    pub states: Vec<RunState>,
}

/// Deployment orchestrator
pub struct DeploymentOrchestrator<S: DeploymentService> {
    service: Arc<S>,
    store: Arc<dyn PropertyStore>,
    monitor: PollingMonitor,
    harvest_properties: bool,
    sleep_fn: SleepFn,
}

impl<S: DeploymentService> DeploymentOrchestrator<S> {
    pub fn new(service: Arc<S>, store: Arc<dyn PropertyStore>, options: OrchestratorOptions) -> Self {
        Self {
            service,
            store,
            monitor: PollingMonitor::new(options.monitor),
            harvest_properties: options.harvest_properties,
            sleep_fn: Arc::new(|d| tokio::time::sleep(d).boxed()),
        }
    }

    /// Replace the sleep between status queries
    pub fn with_sleep_fn<F>(mut self, sleep_fn: F) -> Self
    where
        F: Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.sleep_fn = Arc::new(sleep_fn);
        self
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    /// Run a deployment to completion
    ///
    /// Returns the first fatal error. Property harvest failures are logged and
    /// do not fail the run.
    pub async fn run(
        &self,
        request: &DeploymentRequest,
        cancel: &CancellationToken,
    ) -> Result<DeploymentOutcome, DeployError> {
        let mut fsm = RunStateMachine::new();

        match self.execute(request, &mut fsm, cancel).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if let Err(fsm_err) = fsm.process(RunEvent::Fail(e.to_string())) {
                    warn!("{}", fsm_err);
                }
                error!(state = ?fsm.history(), "Deployment failed: {}", e);
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        request: &DeploymentRequest,
        fsm: &mut RunStateMachine,
        cancel: &CancellationToken,
    ) -> Result<DeploymentOutcome, DeployError> {
        log_parameters(request);
        request.validate()?;

        let service = self.service.as_ref();

        if let Some(template) = request.create_process() {
            info!(
                "Creating application process '{}' for component '{}'",
                request.process(),
                template.component
            );
            service
                .create_process(request.application(), request.process(), template)
                .await?;
        }

        let mut snapshot = request.snapshot().map(str::to_string);
        let snapshot_spec = request.create_snapshot();

        if let Some(spec) = snapshot_spec.filter(|s| s.mode() == SnapshotMode::Eager) {
            fsm.process(RunEvent::PrepareSnapshot)?;
            SnapshotReconciler::new(
                service,
                request.application(),
                request.environment(),
                request.description(),
            )
            .reconcile(spec, request.component_versions())
            .await?;
            snapshot = Some(spec.name.clone());
        }

        fsm.process(RunEvent::Submit)?;
        let missing = service
            .unfilled_request_properties(
                request.application(),
                request.process(),
                snapshot.as_deref(),
                request.properties(),
            )
            .await?;
        if !missing.is_empty() {
            return Err(DeployError::ValidationError(format!(
                "Required application process request properties were not supplied: [{}]",
                missing.join(", ")
            )));
        }

        let submission = ProcessSubmission {
            application: request.application(),
            process: request.process(),
            description: request.description(),
            environment: request.environment(),
            snapshot: snapshot.as_deref(),
            only_changed: request.only_changed(),
            component_versions: request.component_versions(),
            properties: request.properties(),
        };
        let started = Instant::now();
        let request_id = service.request_application_process(&submission).await?;
        info!("Application process requested with id '{}'", request_id);

        let status = if request.skip_wait() {
            info!("'Skip Wait' option selected. Skipping check for deployment result");
            None
        } else {
            fsm.process(RunEvent::Poll)?;
            let sleep_fn = self.sleep_fn.clone();
            let result = self
                .monitor
                .wait(service, &request_id, move |d| sleep_fn(d), cancel)
                .await?;
            if result.status.is_failure() {
                return Err(DeployError::ProcessFailureError(format!(
                    "Deployment process failed with result {}",
                    result.status
                )));
            }
            Some(result.status)
        };
        let duration = started.elapsed();

        fsm.process(RunEvent::Finalize)?;

        if let Some(spec) = snapshot_spec.filter(|s| s.mode() == SnapshotMode::Reactive) {
            info!("Creating environment snapshot '{}'", spec.name);
            service
                .create_snapshot_of_environment(
                    request.environment(),
                    request.application(),
                    &spec.name,
                    request.description(),
                )
                .await?;
            info!("Created environment snapshot '{}'", spec.name);
        }

        let audit_url = format!(
            "{}/#applicationProcessRequest/{}",
            service.base_url().trim_end_matches('/'),
            request_id
        );
        info!(
            "Deployment request finished in {:.3}s with status {}",
            duration.as_secs_f64(),
            status.as_ref().map_or("UNKNOWN", |s| s.as_str())
        );
        info!("Deployment request audit: {}", audit_url);

        let harvested = if self.harvest_properties {
            PropertyPropagator::new(service, self.store.clone())
                .propagate(request.application())
                .await
        } else {
            0
        };

        fsm.process(RunEvent::Complete)?;

        Ok(DeploymentOutcome {
            request_id,
            status,
            duration,
            audit_url,
            snapshot,
            harvested,
            finished_at: Utc::now(),
            states: fsm.history().to_vec(),
        })
    }
}

fn log_parameters(request: &DeploymentRequest) {
    info!("Starting deployment process");
    info!("Application: {}", request.application());
    info!("Environment: {}", request.environment());
    info!("Process: {}", request.process());
    info!("Description: {}", request.description());
    if let Some(snapshot) = request.snapshot() {
        info!("Snapshot: {}", snapshot);
    }
    if !request.component_versions().is_empty() {
        info!("Component versions: {}", request.component_versions());
    }
    if !request.properties().is_empty() {
        let names: Vec<&str> = request.properties().keys().map(String::as_str).collect();
        info!("Request properties: [{}]", names.join(", "));
    }
    info!("Only changed versions: {}", request.only_changed());
    info!("Skip wait: {}", request.skip_wait());
    if let Some(spec) = request.create_snapshot() {
        info!(
            "Create snapshot: {} (deploy with snapshot: {}, include only deploy versions: {})",
            spec.name, spec.deploy_with_snapshot, spec.include_only_deploy_versions
        );
    }
    if let Some(template) = request.create_process() {
        info!("Create process from component: {}", template.component);
    }
}
