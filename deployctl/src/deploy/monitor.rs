//! Waits for an application process to reach a terminal status

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::DeployError;
use crate::models::status::{DeploymentStatus, ProcessRequestId};
use crate::service::DeploymentService;

/// Monitor options
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Delay between status queries
    pub interval: Duration,

    /// Give up after this long; `None` waits until a terminal status
    pub max_wait: Option<Duration>,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            max_wait: None,
        }
    }
}

/// Terminal status and how many queries it took to see it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    pub status: DeploymentStatus,
    pub queries: u32,
}

/// Fixed-interval status poller
#[derive(Debug, Clone, Default)]
pub struct PollingMonitor {
    options: MonitorOptions,
}

impl PollingMonitor {
    pub fn new(options: MonitorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MonitorOptions {
        &self.options
    }

    /// Query until a terminal status is seen, sleeping between queries
    ///
    /// A failed query is fatal. Cancelling `cancel` aborts the wait with a
    /// process failure; the remote process keeps running.
    pub async fn wait<D, S, F>(
        &self,
        service: &D,
        request_id: &ProcessRequestId,
        sleep_fn: S,
        cancel: &CancellationToken,
    ) -> Result<PollResult, DeployError>
    where
        D: DeploymentService + ?Sized,
        S: Fn(Duration) -> F,
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut queries = 0u32;

        loop {
            let raw = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(interrupted()),
                result = service.application_process_status(request_id) => {
                    result.map_err(|e| DeployError::CommunicationError(format!(
                        "Failed to acquire status of application process with id '{}': {}",
                        request_id, e
                    )))?
                }
            };
            queries += 1;

            let status = DeploymentStatus::parse(&raw);
            info!(request_id = %request_id, query = queries, "Deployment status: {}", status);

            if status.is_terminal() {
                return Ok(PollResult { status, queries });
            }

            if let Some(max_wait) = self.options.max_wait {
                if started.elapsed() >= max_wait {
                    return Err(DeployError::ProcessFailureError(format!(
                        "Deployment process '{}' did not finish within {} seconds",
                        request_id,
                        max_wait.as_secs()
                    )));
                }
            }

            debug!("Waiting {:?} before next status query", self.options.interval);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(interrupted()),
                _ = sleep_fn(self.options.interval) => {}
            }
        }
    }
}

fn interrupted() -> DeployError {
    DeployError::ProcessFailureError(
        "Could not wait to check deployment result: wait interrupted".to_string(),
    )
}
