//! Deployment server operations consumed by the orchestrator

use async_trait::async_trait;
use deploy_api::models::{
    ApplicationDetail, ApplicationSummary, PropertyValue, SnapshotComponent, SnapshotVersion,
};

use crate::errors::DeployError;
use crate::models::request::{ComponentVersionMap, ProcessTemplate, RequestProperties};
use crate::models::status::ProcessRequestId;

/// Everything needed to request an application process
#[derive(Debug, Clone)]
pub struct ProcessSubmission<'a> {
    pub application: &'a str,
    pub process: &'a str,
    pub description: &'a str,
    pub environment: &'a str,
    pub snapshot: Option<&'a str>,
    pub only_changed: bool,
    pub component_versions: &'a ComponentVersionMap,
    pub properties: &'a RequestProperties,
}

/// A version a snapshot currently holds, with its owning component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSnapshotVersion {
    pub id: String,
    pub name: String,
    pub component: String,
}

impl RemoteSnapshotVersion {
    /// Flatten a snapshot listing into per-version records
    pub fn from_components(components: Vec<SnapshotComponent>) -> Vec<Self> {
        components
            .into_iter()
            .flat_map(|component| {
                let owner = component.name;
                component
                    .desired_versions
                    .into_iter()
                    .map(move |SnapshotVersion { id, name }| RemoteSnapshotVersion {
                        id,
                        name,
                        component: owner.clone(),
                    })
            })
            .collect()
    }
}

/// Remote deployment service
///
/// Implemented over HTTP by [`crate::http::client::HttpClient`].
#[async_trait]
pub trait DeploymentService: Send + Sync {
    /// Base URL used for audit links
    fn base_url(&self) -> &str;

    /// Submit an application process request
    async fn request_application_process(
        &self,
        submission: &ProcessSubmission<'_>,
    ) -> Result<ProcessRequestId, DeployError>;

    /// Raw result string of a process request
    async fn application_process_status(
        &self,
        request_id: &ProcessRequestId,
    ) -> Result<String, DeployError>;

    /// Names of required request properties missing from `properties`
    async fn unfilled_request_properties(
        &self,
        application: &str,
        process: &str,
        snapshot: Option<&str>,
        properties: &RequestProperties,
    ) -> Result<Vec<String>, DeployError>;

    /// Create a snapshot holding exactly `versions`
    async fn create_snapshot(
        &self,
        name: &str,
        description: &str,
        application: &str,
        versions: &ComponentVersionMap,
    ) -> Result<(), DeployError>;

    /// Create a snapshot of what is currently deployed in an environment
    async fn create_snapshot_of_environment(
        &self,
        environment: &str,
        application: &str,
        name: &str,
        description: &str,
    ) -> Result<(), DeployError>;

    /// Current per-component contents of a snapshot
    async fn snapshot_versions(
        &self,
        snapshot: &str,
        application: &str,
    ) -> Result<Vec<SnapshotComponent>, DeployError>;

    async fn add_version_to_snapshot(
        &self,
        snapshot: &str,
        application: &str,
        version: &str,
        component: &str,
    ) -> Result<(), DeployError>;

    async fn remove_version_from_snapshot(
        &self,
        snapshot: &str,
        application: &str,
        version_id: &str,
        component: &str,
    ) -> Result<(), DeployError>;

    async fn list_applications(&self) -> Result<Vec<ApplicationSummary>, DeployError>;

    async fn application_detail(
        &self,
        application_id: &str,
    ) -> Result<ApplicationDetail, DeployError>;

    /// Properties of one version of an application's property sheet
    async fn property_sheet_properties(
        &self,
        application_id: &str,
        version_count: &str,
    ) -> Result<Vec<PropertyValue>, DeployError>;

    /// Create an application process that installs `template.component`
    async fn create_process(
        &self,
        application: &str,
        process: &str,
        template: &ProcessTemplate,
    ) -> Result<(), DeployError>;
}
