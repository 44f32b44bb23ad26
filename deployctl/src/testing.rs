//! Scripted deployment service for tests
//!
//! Records every call it receives and answers from canned data.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use deploy_api::models::{
    ApplicationDetail, ApplicationSummary, PropSheetRef, PropertyValue, SnapshotComponent,
    SnapshotVersion,
};

use crate::errors::DeployError;
use crate::models::request::{ComponentVersionMap, ProcessTemplate, RequestProperties};
use crate::models::status::ProcessRequestId;
use crate::service::{DeploymentService, ProcessSubmission};

/// A call received by [`ScriptedService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateProcess { process: String },
    UnfilledProperties { snapshot: Option<String> },
    RequestProcess { snapshot: Option<String>, versions: usize },
    Status { request_id: String },
    CreateSnapshot { name: String },
    CreateEnvironmentSnapshot { name: String },
    SnapshotVersions { name: String },
    RemoveVersion { component: String, version_id: String },
    AddVersion { component: String, version: String },
    ListApplications,
    ApplicationDetail { id: String },
    PropertySheet { id: String, version_count: String },
}

impl Call {
    fn op(&self) -> &'static str {
        match self {
            Call::CreateProcess { .. } => "create_process",
            Call::UnfilledProperties { .. } => "unfilled_properties",
            Call::RequestProcess { .. } => "request_process",
            Call::Status { .. } => "status",
            Call::CreateSnapshot { .. } => "create_snapshot",
            Call::CreateEnvironmentSnapshot { .. } => "create_environment_snapshot",
            Call::SnapshotVersions { .. } => "snapshot_versions",
            Call::RemoveVersion { .. } => "remove_version",
            Call::AddVersion { .. } => "add_version",
            Call::ListApplications => "list_applications",
            Call::ApplicationDetail { .. } => "application_detail",
            Call::PropertySheet { .. } => "property_sheet",
        }
    }
}

/// In-memory [`DeploymentService`] driven by canned responses
pub struct ScriptedService {
    calls: Mutex<Vec<Call>>,
    statuses: Mutex<VecDeque<String>>,
    snapshot_contents: Vec<SnapshotComponent>,
    missing_properties: Vec<String>,
    applications: Vec<ApplicationSummary>,
    properties: Vec<PropertyValue>,
    failing_op: Option<&'static str>,
    submit_latency: Duration,
}

impl Default for ScriptedService {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedService {
    pub const REQUEST_ID: &'static str = "5f0c2a57-1b7e-4c1d-9c53-0e8f3d2b6a11";

    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            statuses: Mutex::new(VecDeque::new()),
            snapshot_contents: Vec::new(),
            missing_properties: Vec::new(),
            applications: Vec::new(),
            properties: Vec::new(),
            failing_op: None,
            submit_latency: Duration::ZERO,
        }
    }

    /// Delay before the process request returns its id
    pub fn with_submit_latency(mut self, latency: Duration) -> Self {
        self.submit_latency = latency;
        self
    }

    /// Results returned by successive status queries
    pub fn with_statuses<I, T>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.statuses = Mutex::new(statuses.into_iter().map(Into::into).collect());
        self
    }

    /// Versions the created snapshot reports for a component, as `(id, name)`
    pub fn with_snapshot_component(mut self, component: &str, versions: &[(&str, &str)]) -> Self {
        self.snapshot_contents.push(SnapshotComponent {
            name: component.to_string(),
            desired_versions: versions
                .iter()
                .map(|(id, name)| SnapshotVersion {
                    id: id.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        });
        self
    }

    /// Required request properties the server reports as missing
    pub fn with_missing_properties(mut self, names: &[&str]) -> Self {
        self.missing_properties = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_application(mut self, id: &str, name: &str) -> Self {
        self.applications.push(ApplicationSummary {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_property(mut self, name: &str, value: &str, secure: bool) -> Self {
        self.properties.push(PropertyValue {
            name: name.to_string(),
            value: value.to_string(),
            secure,
        });
        self
    }

    /// Make one operation fail with a communication error, e.g. `"add_version"`
    pub fn failing_on(mut self, op: &'static str) -> Self {
        self.failing_op = Some(op);
        self
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of status queries received
    pub fn status_queries(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Status { .. }))
            .count()
    }

    /// Number of process submissions received
    pub fn submissions(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::RequestProcess { .. }))
            .count()
    }

    fn record(&self, call: Call) -> Result<(), DeployError> {
        let op = call.op();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.failing_op == Some(op) {
            return Err(DeployError::CommunicationError(format!(
                "500 Internal Server Error using URI: scripted://{}",
                op
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DeploymentService for ScriptedService {
    fn base_url(&self) -> &str {
        "https://deploy.test"
    }

    async fn request_application_process(
        &self,
        submission: &ProcessSubmission<'_>,
    ) -> Result<ProcessRequestId, DeployError> {
        self.record(Call::RequestProcess {
            snapshot: submission.snapshot.map(str::to_string),
            versions: submission.component_versions.to_requested_versions().len(),
        })?;
        if !self.submit_latency.is_zero() {
            tokio::time::sleep(self.submit_latency).await;
        }
        Ok(ProcessRequestId::new(Self::REQUEST_ID))
    }

    async fn application_process_status(
        &self,
        request_id: &ProcessRequestId,
    ) -> Result<String, DeployError> {
        self.record(Call::Status {
            request_id: request_id.to_string(),
        })?;
        self.statuses
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .ok_or_else(|| DeployError::CommunicationError("no scripted status left".to_string()))
    }

    async fn unfilled_request_properties(
        &self,
        _application: &str,
        _process: &str,
        snapshot: Option<&str>,
        properties: &RequestProperties,
    ) -> Result<Vec<String>, DeployError> {
        self.record(Call::UnfilledProperties {
            snapshot: snapshot.map(str::to_string),
        })?;
        Ok(self
            .missing_properties
            .iter()
            .filter(|name| !properties.contains_key(*name))
            .cloned()
            .collect())
    }

    async fn create_snapshot(
        &self,
        name: &str,
        _description: &str,
        _application: &str,
        _versions: &ComponentVersionMap,
    ) -> Result<(), DeployError> {
        self.record(Call::CreateSnapshot {
            name: name.to_string(),
        })
    }

    async fn create_snapshot_of_environment(
        &self,
        _environment: &str,
        _application: &str,
        name: &str,
        _description: &str,
    ) -> Result<(), DeployError> {
        self.record(Call::CreateEnvironmentSnapshot {
            name: name.to_string(),
        })
    }

    async fn snapshot_versions(
        &self,
        snapshot: &str,
        _application: &str,
    ) -> Result<Vec<SnapshotComponent>, DeployError> {
        self.record(Call::SnapshotVersions {
            name: snapshot.to_string(),
        })?;
        Ok(self.snapshot_contents.clone())
    }

    async fn add_version_to_snapshot(
        &self,
        _snapshot: &str,
        _application: &str,
        version: &str,
        component: &str,
    ) -> Result<(), DeployError> {
        self.record(Call::AddVersion {
            component: component.to_string(),
            version: version.to_string(),
        })
    }

    async fn remove_version_from_snapshot(
        &self,
        _snapshot: &str,
        _application: &str,
        version_id: &str,
        component: &str,
    ) -> Result<(), DeployError> {
        self.record(Call::RemoveVersion {
            component: component.to_string(),
            version_id: version_id.to_string(),
        })
    }

    async fn list_applications(&self) -> Result<Vec<ApplicationSummary>, DeployError> {
        self.record(Call::ListApplications)?;
        Ok(self.applications.clone())
    }

    async fn application_detail(
        &self,
        application_id: &str,
    ) -> Result<ApplicationDetail, DeployError> {
        self.record(Call::ApplicationDetail {
            id: application_id.to_string(),
        })?;
        Ok(ApplicationDetail {
            id: Some(application_id.to_string()),
            name: None,
            prop_sheet: PropSheetRef {
                version_count: "3".to_string(),
            },
        })
    }

    async fn property_sheet_properties(
        &self,
        application_id: &str,
        version_count: &str,
    ) -> Result<Vec<PropertyValue>, DeployError> {
        self.record(Call::PropertySheet {
            id: application_id.to_string(),
            version_count: version_count.to_string(),
        })?;
        Ok(self.properties.clone())
    }

    async fn create_process(
        &self,
        _application: &str,
        process: &str,
        _template: &ProcessTemplate,
    ) -> Result<(), DeployError> {
        self.record(Call::CreateProcess {
            process: process.to_string(),
        })
    }
}
