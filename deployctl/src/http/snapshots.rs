//! Snapshot API

use std::collections::BTreeMap;

use deploy_api::models::{CreateSnapshotRequest, SnapshotComponent};

use crate::errors::DeployError;
use crate::http::client::HttpClient;
use crate::models::request::ComponentVersionMap;

impl HttpClient {
    /// Create a snapshot from explicit component versions
    pub async fn create_snapshot_from_versions(
        &self,
        name: &str,
        description: &str,
        application: &str,
        versions: &ComponentVersionMap,
    ) -> Result<(), DeployError> {
        let body = CreateSnapshotRequest {
            name: name.to_string(),
            description: description.to_string(),
            application: application.to_string(),
            versions: versions
                .to_requested_versions()
                .into_iter()
                .map(|v| BTreeMap::from([(v.component, v.version)]))
                .collect(),
        };
        self.put_unit("/cli/snapshot/createSnapshot", &[], Some(&body))
            .await
    }

    /// Snapshot the versions currently deployed in an environment
    pub async fn create_environment_snapshot(
        &self,
        environment: &str,
        application: &str,
        name: &str,
        description: &str,
    ) -> Result<(), DeployError> {
        self.put_unit::<()>(
            "/cli/snapshot/createSnapshotOfEnvironment",
            &[
                ("environment", environment),
                ("application", application),
                ("name", name),
                ("description", description),
            ],
            None,
        )
        .await
    }

    /// List the versions a snapshot holds, grouped by component
    pub async fn get_snapshot_versions(
        &self,
        snapshot: &str,
        application: &str,
    ) -> Result<Vec<SnapshotComponent>, DeployError> {
        self.get(
            "/cli/snapshot/getSnapshotVersions",
            &[("snapshot", snapshot), ("application", application)],
        )
        .await
    }

    pub async fn add_snapshot_version(
        &self,
        snapshot: &str,
        application: &str,
        version: &str,
        component: &str,
    ) -> Result<(), DeployError> {
        self.put_unit::<()>(
            "/cli/snapshot/addVersionToSnapshot",
            &[
                ("snapshot", snapshot),
                ("application", application),
                ("version", version),
                ("component", component),
            ],
            None,
        )
        .await
    }

    pub async fn remove_snapshot_version(
        &self,
        snapshot: &str,
        application: &str,
        version_id: &str,
        component: &str,
    ) -> Result<(), DeployError> {
        self.put_unit::<()>(
            "/cli/snapshot/removeVersionFromSnapshot",
            &[
                ("snapshot", snapshot),
                ("application", application),
                ("version", version_id),
                ("component", component),
            ],
            None,
        )
        .await
    }
}
