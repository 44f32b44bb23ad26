//! Builds a validated deployment request from a raw deploy block

use tracing::{debug, warn};

use crate::errors::DeployError;
use crate::models::request::{
    required_field, ComponentVersionMap, DeploymentRequest, ProcessTemplate, SnapshotMode,
    SnapshotSpec, VersionSelector,
};
use crate::request::parse::{
    is_snapshot_reference, parse_component_versions, parse_deploy_versions, parse_properties,
};
use crate::storage::job::DeployBlock;
use crate::vars::EnvVars;

/// Expands and validates the fields of a deploy block
pub struct RequestBuilder<'a> {
    vars: &'a EnvVars,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(vars: &'a EnvVars) -> Self {
        Self { vars }
    }

    /// Build the request for one run
    pub fn build(&self, block: &DeployBlock) -> Result<DeploymentRequest, DeployError> {
        let application = self.expand_required(&block.deploy_app, "Deploy Application")?;
        let environment = self.expand_required(&block.deploy_env, "Deploy Environment")?;
        let process = self.expand_required(&block.deploy_proc, "Deploy Process")?;
        let description = self.vars.expand(&block.deploy_desc);
        let properties = parse_properties(&self.vars.expand(&block.deploy_req_props))?;

        let create_snapshot = match &block.create_snapshot {
            Some(snapshot) => {
                let name = self.vars.expand(&snapshot.snapshot_name).trim().to_string();
                if name.is_empty() {
                    return Err(DeployError::ValidationError(
                        "Snapshot name is a required field when creating a snapshot.".to_string(),
                    ));
                }
                Some(SnapshotSpec {
                    name,
                    deploy_with_snapshot: snapshot.deploy_with_snapshot,
                    include_only_deploy_versions: snapshot.include_only_deploy_versions,
                })
            }
            None => None,
        };

        let versions_raw = self.vars.expand(&block.deploy_versions);
        let eager = create_snapshot
            .as_ref()
            .is_some_and(|spec| spec.mode() == SnapshotMode::Eager);

        let (snapshot, component_versions) = if eager {
            // The snapshot built before deploying replaces any snapshot named here
            if is_snapshot_reference(&versions_raw) {
                warn!(
                    "When deploying with a build environment snapshot, additional snapshots \
                     may not be specified in the versions field. It will be ignored for this deployment."
                );
                (None, ComponentVersionMap::new())
            } else {
                (None, parse_component_versions(&versions_raw)?)
            }
        } else {
            match parse_deploy_versions(&versions_raw)? {
                VersionSelector::Snapshot(name) => (Some(name), ComponentVersionMap::new()),
                VersionSelector::Components(map) => (None, map),
            }
        };

        let create_process = block.create_process.as_ref().map(|p| ProcessTemplate {
            component: self.vars.expand(&p.process_component),
            description: self.vars.expand(&p.description),
        });

        let request = DeploymentRequest {
            application,
            environment,
            process,
            description,
            snapshot,
            component_versions,
            properties,
            only_changed: block.deploy_only_changed,
            skip_wait: block.skip_wait,
            create_snapshot,
            create_process,
        };
        request.validate()?;

        debug!("Built deployment request: {:?}", request);
        Ok(request)
    }

    fn expand_required(&self, raw: &str, label: &str) -> Result<String, DeployError> {
        let value = self.vars.expand(raw).trim().to_string();
        if value.is_empty() {
            return Err(required_field(label));
        }
        Ok(value)
    }
}
