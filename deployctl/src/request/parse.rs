//! Parsers for the multi-line job fields

use crate::errors::DeployError;
use crate::models::request::{ComponentVersionMap, RequestProperties, VersionSelector};

const SNAPSHOT_PREFIX: &str = "SNAPSHOT=";

/// Whether a version payload names a snapshot rather than component versions
pub fn is_snapshot_reference(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.len() >= SNAPSHOT_PREFIX.len()
        && trimmed.is_char_boundary(SNAPSHOT_PREFIX.len())
        && trimmed[..SNAPSHOT_PREFIX.len()].eq_ignore_ascii_case(SNAPSHOT_PREFIX)
}

/// Resolve a version payload into a snapshot reference or a component map
pub fn parse_deploy_versions(raw: &str) -> Result<VersionSelector, DeployError> {
    if !is_snapshot_reference(raw) {
        return parse_component_versions(raw).map(VersionSelector::Components);
    }

    let trimmed = raw.trim();
    if trimmed.contains('\n') {
        return Err(DeployError::ValidationError(
            "Only a single SNAPSHOT can be specified".to_string(),
        ));
    }

    let name = trimmed[SNAPSHOT_PREFIX.len()..].trim();
    if name.is_empty() {
        return Err(DeployError::ValidationError(
            "SNAPSHOT= must be followed by a snapshot name".to_string(),
        ));
    }
    Ok(VersionSelector::Snapshot(name.to_string()))
}

/// Parse `component:version` lines
///
/// Blank lines are skipped. A component listed on several lines collects
/// all of its versions in order.
pub fn parse_component_versions(raw: &str) -> Result<ComponentVersionMap, DeployError> {
    let mut versions = ComponentVersionMap::new();

    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let (component, version) = match line.split_once(':') {
            Some((component, version)) if !component.trim().is_empty() => {
                (component.trim(), version.trim())
            }
            _ => {
                return Err(DeployError::ValidationError(
                    "Component/version pairs must be of the form {Component}:{Version #}"
                        .to_string(),
                ))
            }
        };

        versions.push(component, version)?;
    }

    Ok(versions)
}

/// Parse `key=value` lines; a repeated key keeps its last value
pub fn parse_properties(raw: &str) -> Result<RequestProperties, DeployError> {
    let mut properties = RequestProperties::new();

    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }

        match line.split_once('=') {
            Some((key, value)) => {
                properties.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => {
                return Err(DeployError::ValidationError(format!(
                    "Missing property delimiter '=' in property definition '{}'",
                    line
                )))
            }
        }
    }

    Ok(properties)
}
