//! Deployment request models

use std::collections::BTreeMap;
use std::fmt;

use deploy_api::models::RequestedVersion;
use serde::{Deserialize, Serialize};

use crate::errors::DeployError;

/// Request properties passed to the application process
pub type RequestProperties = BTreeMap<String, String>;

/// Component name to ordered versions, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentVersionMap {
    entries: Vec<(String, Vec<String>)>,
}

impl ComponentVersionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a version to a component, creating the component entry on first use
    pub fn push(
        &mut self,
        component: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<(), DeployError> {
        let component = component.into();
        if component.is_empty() {
            return Err(DeployError::ValidationError(
                "Component name must not be empty".to_string(),
            ));
        }

        let version = version.into();
        match self.entries.iter_mut().find(|(name, _)| *name == component) {
            Some((_, versions)) => versions.push(version),
            None => self.entries.push((component, vec![version])),
        }
        Ok(())
    }

    /// Versions declared for a component
    pub fn get(&self, component: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == component)
            .map(|(_, versions)| versions.as_slice())
    }

    /// Iterate components in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, versions)| (name.as_str(), versions.as_slice()))
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten into the wire representation, one entry per version
    pub fn to_requested_versions(&self) -> Vec<RequestedVersion> {
        self.iter()
            .flat_map(|(component, versions)| {
                versions.iter().map(move |version| RequestedVersion {
                    component: component.to_string(),
                    version: version.clone(),
                })
            })
            .collect()
    }
}

impl fmt::Display for ComponentVersionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (component, versions)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}=[{}]", component, versions.join(", "))?;
        }
        write!(f, "}}")
    }
}

/// What the version lines of a job resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    /// Deploy an existing snapshot
    Snapshot(String),

    /// Deploy explicit component versions
    Components(ComponentVersionMap),
}

/// When a requested snapshot gets created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotMode {
    /// Built from the desired versions before submission, then deployed
    Eager,

    /// Taken from the environment after a successful deployment
    Reactive,
}

/// Snapshot creation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSpec {
    pub name: String,
    pub deploy_with_snapshot: bool,
    pub include_only_deploy_versions: bool,
}

impl SnapshotSpec {
    pub fn mode(&self) -> SnapshotMode {
        if self.deploy_with_snapshot {
            SnapshotMode::Eager
        } else {
            SnapshotMode::Reactive
        }
    }
}

/// Application process to create before deploying
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessTemplate {
    /// Component whose install step the process runs
    pub component: String,
    pub description: String,
}

/// A validated deployment request
///
/// Built once per run by [`crate::request::RequestBuilder`]; read-only afterwards.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub(crate) application: String,
    pub(crate) environment: String,
    pub(crate) process: String,
    pub(crate) description: String,
    pub(crate) snapshot: Option<String>,
    pub(crate) component_versions: ComponentVersionMap,
    pub(crate) properties: RequestProperties,
    pub(crate) only_changed: bool,
    pub(crate) skip_wait: bool,
    pub(crate) create_snapshot: Option<SnapshotSpec>,
    pub(crate) create_process: Option<ProcessTemplate>,
}

impl DeploymentRequest {
    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn process(&self) -> &str {
        &self.process
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Existing snapshot to deploy. Always `None` in eager snapshot mode.
    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    pub fn component_versions(&self) -> &ComponentVersionMap {
        &self.component_versions
    }

    pub fn properties(&self) -> &RequestProperties {
        &self.properties
    }

    pub fn only_changed(&self) -> bool {
        self.only_changed
    }

    pub fn skip_wait(&self) -> bool {
        self.skip_wait
    }

    pub fn create_snapshot(&self) -> Option<&SnapshotSpec> {
        self.create_snapshot.as_ref()
    }

    pub fn create_process(&self) -> Option<&ProcessTemplate> {
        self.create_process.as_ref()
    }

    /// Check the invariants every submitted request must hold
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.application.is_empty() {
            return Err(required_field("Deploy Application"));
        }
        if self.environment.is_empty() {
            return Err(required_field("Deploy Environment"));
        }
        if self.process.is_empty() {
            return Err(required_field("Deploy Process"));
        }
        if let (Some(spec), Some(snapshot)) = (&self.create_snapshot, &self.snapshot) {
            if spec.mode() == SnapshotMode::Eager {
                return Err(DeployError::ValidationError(format!(
                    "Snapshot '{}' cannot be deployed alongside the new snapshot '{}'",
                    snapshot, spec.name
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn required_field(label: &str) -> DeployError {
    DeployError::ValidationError(format!("{} is a required field for deployment.", label))
}
