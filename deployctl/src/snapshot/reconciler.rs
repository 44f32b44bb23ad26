//! Aligns a snapshot's contents with the versions a job asks for

use tracing::info;

use crate::errors::DeployError;
use crate::models::request::{ComponentVersionMap, SnapshotSpec};
use crate::service::{DeploymentService, RemoteSnapshotVersion};

/// A change made to a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotMutation {
    Removed {
        component: String,
        version_id: String,
        version_name: String,
    },
    Added {
        component: String,
        version: String,
    },
}

/// Mutations applied while reconciling, in the order they were made
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub mutations: Vec<SnapshotMutation>,
}

impl ReconcileReport {
    pub fn removed(&self) -> usize {
        self.mutations
            .iter()
            .filter(|m| matches!(m, SnapshotMutation::Removed { .. }))
            .count()
    }

    pub fn added(&self) -> usize {
        self.mutations
            .iter()
            .filter(|m| matches!(m, SnapshotMutation::Added { .. }))
            .count()
    }
}

/// Creates a snapshot and rewrites the listed components to the desired versions
///
/// Every removal and addition is its own server call. A rejected call stops the
/// reconciliation and leaves the snapshot as it is at that point.
pub struct SnapshotReconciler<'a, S: DeploymentService + ?Sized> {
    service: &'a S,
    application: &'a str,
    environment: &'a str,
    description: &'a str,
}

impl<'a, S: DeploymentService + ?Sized> SnapshotReconciler<'a, S> {
    pub fn new(
        service: &'a S,
        application: &'a str,
        environment: &'a str,
        description: &'a str,
    ) -> Self {
        Self {
            service,
            application,
            environment,
            description,
        }
    }

    /// Create `spec.name` and reconcile it against `desired`
    pub async fn reconcile(
        &self,
        spec: &SnapshotSpec,
        desired: &ComponentVersionMap,
    ) -> Result<ReconcileReport, DeployError> {
        let snapshot = spec.name.as_str();
        info!("Creating environment snapshot '{}'", snapshot);

        if spec.include_only_deploy_versions {
            self.service
                .create_snapshot(snapshot, self.description, self.application, desired)
                .await?;
        } else {
            self.service
                .create_snapshot_of_environment(
                    self.environment,
                    self.application,
                    snapshot,
                    self.description,
                )
                .await?;
        }

        info!("Acquiring all versions of the snapshot");
        let current = RemoteSnapshotVersion::from_components(
            self.service
                .snapshot_versions(snapshot, self.application)
                .await?,
        );

        let mut report = ReconcileReport::default();
        for (component, versions) in desired.iter() {
            // Clear the component first so stale and desired versions never coexist
            for old in current.iter().filter(|v| v.component == component) {
                info!(
                    "Removing past version '{}' of component '{}' from snapshot",
                    old.name, component
                );
                self.service
                    .remove_version_from_snapshot(snapshot, self.application, &old.id, component)
                    .await?;
                report.mutations.push(SnapshotMutation::Removed {
                    component: component.to_string(),
                    version_id: old.id.clone(),
                    version_name: old.name.clone(),
                });
            }

            for version in versions {
                info!(
                    "Adding component version '{}' of component '{}' to snapshot",
                    version, component
                );
                self.service
                    .add_version_to_snapshot(snapshot, self.application, version, component)
                    .await?;
                report.mutations.push(SnapshotMutation::Added {
                    component: component.to_string(),
                    version: version.clone(),
                });
            }
        }

        info!(
            snapshot,
            removed = report.removed(),
            added = report.added(),
            "Snapshot reconciled"
        );
        Ok(report)
    }
}
