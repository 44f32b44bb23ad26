//! Application process API

use std::collections::HashSet;

use deploy_api::models::{
    ApplicationProcessRequest, CreateProcessRequest, ProcessRequestResponse, ProcessRequestStatus,
    PropertyDefinition,
};
use tracing::debug;

use crate::errors::DeployError;
use crate::http::client::HttpClient;
use crate::models::request::{ProcessTemplate, RequestProperties};
use crate::models::status::ProcessRequestId;
use crate::service::ProcessSubmission;

impl HttpClient {
    /// Request an application process run
    pub async fn request_process(
        &self,
        submission: &ProcessSubmission<'_>,
    ) -> Result<ProcessRequestId, DeployError> {
        let body = ApplicationProcessRequest {
            application: submission.application.to_string(),
            application_process: submission.process.to_string(),
            description: submission.description.to_string(),
            environment: submission.environment.to_string(),
            only_changed: submission.only_changed,
            snapshot: submission.snapshot.map(str::to_string),
            versions: submission.component_versions.to_requested_versions(),
            properties: submission.properties.clone(),
        };

        let response: ProcessRequestResponse = self
            .put("/cli/applicationProcessRequest/request", &body)
            .await?;
        Ok(response.request_id.into())
    }

    /// Get the result of an application process request
    pub async fn process_status(
        &self,
        request_id: &ProcessRequestId,
    ) -> Result<String, DeployError> {
        let status: ProcessRequestStatus = self
            .get(
                "/cli/applicationProcessRequest/requestStatus",
                &[("request", request_id.as_str())],
            )
            .await?;
        debug!(
            "Process request {} status={} result={}",
            request_id, status.status, status.result
        );
        Ok(status.result)
    }

    /// Required request properties of a process that are not in `properties`
    pub async fn unfilled_properties(
        &self,
        application: &str,
        process: &str,
        snapshot: Option<&str>,
        properties: &RequestProperties,
    ) -> Result<Vec<String>, DeployError> {
        let mut query = vec![("application", application), ("processName", process)];
        if let Some(snapshot) = snapshot {
            query.push(("snapshot", snapshot));
        }

        let definitions: Vec<PropertyDefinition> = self
            .get("/cli/applicationProcess/unfilledProperties", &query)
            .await?;

        let mut seen = HashSet::new();
        Ok(definitions
            .into_iter()
            .filter(|def| def.required && !properties.contains_key(&def.name))
            .filter(|def| seen.insert(def.name.clone()))
            .map(|def| def.name)
            .collect())
    }

    /// Create an application process that installs one component
    pub async fn create_application_process(
        &self,
        application: &str,
        process: &str,
        template: &ProcessTemplate,
    ) -> Result<(), DeployError> {
        let body = CreateProcessRequest {
            application: application.to_string(),
            name: process.to_string(),
            description: template.description.clone(),
            component: template.component.clone(),
        };
        self.put_unit("/cli/applicationProcess/create", &[], Some(&body))
            .await
    }
}
