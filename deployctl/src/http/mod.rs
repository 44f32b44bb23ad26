//! HTTP binding of the deployment service

pub mod applications;
pub mod client;
pub mod processes;
pub mod snapshots;

use async_trait::async_trait;
use deploy_api::models::{ApplicationDetail, ApplicationSummary, PropertyValue, SnapshotComponent};

use crate::errors::DeployError;
use crate::models::request::{ComponentVersionMap, ProcessTemplate, RequestProperties};
use crate::models::status::ProcessRequestId;
use crate::service::{DeploymentService, ProcessSubmission};

use client::HttpClient;

#[async_trait]
impl DeploymentService for HttpClient {
    fn base_url(&self) -> &str {
        HttpClient::base_url(self)
    }

    async fn request_application_process(
        &self,
        submission: &ProcessSubmission<'_>,
    ) -> Result<ProcessRequestId, DeployError> {
        self.request_process(submission).await
    }

    async fn application_process_status(
        &self,
        request_id: &ProcessRequestId,
    ) -> Result<String, DeployError> {
        self.process_status(request_id).await
    }

    async fn unfilled_request_properties(
        &self,
        application: &str,
        process: &str,
        snapshot: Option<&str>,
        properties: &RequestProperties,
    ) -> Result<Vec<String>, DeployError> {
        self.unfilled_properties(application, process, snapshot, properties)
            .await
    }

    async fn create_snapshot(
        &self,
        name: &str,
        description: &str,
        application: &str,
        versions: &ComponentVersionMap,
    ) -> Result<(), DeployError> {
        self.create_snapshot_from_versions(name, description, application, versions)
            .await
    }

    async fn create_snapshot_of_environment(
        &self,
        environment: &str,
        application: &str,
        name: &str,
        description: &str,
    ) -> Result<(), DeployError> {
        self.create_environment_snapshot(environment, application, name, description)
            .await
    }

    async fn snapshot_versions(
        &self,
        snapshot: &str,
        application: &str,
    ) -> Result<Vec<SnapshotComponent>, DeployError> {
        self.get_snapshot_versions(snapshot, application).await
    }

    async fn add_version_to_snapshot(
        &self,
        snapshot: &str,
        application: &str,
        version: &str,
        component: &str,
    ) -> Result<(), DeployError> {
        self.add_snapshot_version(snapshot, application, version, component)
            .await
    }

    async fn remove_version_from_snapshot(
        &self,
        snapshot: &str,
        application: &str,
        version_id: &str,
        component: &str,
    ) -> Result<(), DeployError> {
        self.remove_snapshot_version(snapshot, application, version_id, component)
            .await
    }

    async fn list_applications(&self) -> Result<Vec<ApplicationSummary>, DeployError> {
        self.get_applications().await
    }

    async fn application_detail(
        &self,
        application_id: &str,
    ) -> Result<ApplicationDetail, DeployError> {
        self.get_application(application_id).await
    }

    async fn property_sheet_properties(
        &self,
        application_id: &str,
        version_count: &str,
    ) -> Result<Vec<PropertyValue>, DeployError> {
        self.get_property_sheet(application_id, version_count).await
    }

    async fn create_process(
        &self,
        application: &str,
        process: &str,
        template: &ProcessTemplate,
    ) -> Result<(), DeployError> {
        self.create_application_process(application, process, template)
            .await
    }
}
