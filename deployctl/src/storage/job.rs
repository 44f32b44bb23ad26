//! Deployment job file
//!
//! The job file carries the raw, unexpanded deploy block exactly as the user
//! wrote it. [`crate::request::RequestBuilder`] turns it into a request.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::errors::DeployError;
use crate::filesys::file::File;
use crate::storage::settings::deserialize_secret;

/// A deployment job
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployJob {
    /// Run the job with different credentials than the configured ones
    #[serde(default)]
    pub alt_user: Option<UserBlock>,

    pub deploy: DeployBlock,
}

/// Raw deploy block, every string still subject to variable expansion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeployBlock {
    pub deploy_app: String,
    pub deploy_env: String,
    pub deploy_proc: String,
    pub skip_wait: bool,
    pub create_process: Option<CreateProcessBlock>,
    pub create_snapshot: Option<CreateSnapshotBlock>,

    /// `component:version` lines, or a single `SNAPSHOT=name` line
    pub deploy_versions: String,

    /// `key=value` lines
    pub deploy_req_props: String,

    pub deploy_desc: String,
    pub deploy_only_changed: bool,
}

/// Snapshot creation block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSnapshotBlock {
    pub snapshot_name: String,
    pub deploy_with_snapshot: bool,
    pub include_only_deploy_versions: bool,
}

/// Process creation block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateProcessBlock {
    pub process_component: String,
    pub description: String,
}

/// Alternative credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBlock {
    #[serde(default)]
    pub alt_username: String,

    #[serde(deserialize_with = "deserialize_secret")]
    pub alt_password: SecretString,
}

impl DeployJob {
    /// Load a job from a JSON file
    pub async fn load(file: &File) -> Result<Self, DeployError> {
        if !file.exists().await {
            return Err(DeployError::ConfigError(format!(
                "Job file does not exist: {}",
                file.path().display()
            )));
        }
        file.read_json().await
    }

    /// Validate the alternative user block, if present
    pub fn alt_user(&self) -> Result<Option<&UserBlock>, DeployError> {
        match &self.alt_user {
            Some(user) if user.alt_username.trim().is_empty() => {
                Err(DeployError::ValidationError(
                    "Alternative username is a required property when specifying the optional \
                     'Run as Alternative User' property."
                        .to_string(),
                ))
            }
            other => Ok(other.as_ref()),
        }
    }
}
