//! Remote process status classification

use std::fmt;

use uuid::Uuid;

/// Identifier returned when an application process is requested
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessRequestId(String);

impl ProcessRequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Uuid> for ProcessRequestId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ProcessRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of an application process as reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentStatus {
    /// "NONE" or empty: still running
    Pending,
    /// "SCHEDULED FOR FUTURE"
    Scheduled,
    /// "SUCCEEDED"
    Succeeded,
    /// "FAULTED"
    Faulted,
    /// "FAILED TO START"
    FailedToStart,
    /// "CANCELED"
    Canceled,
    /// Any other terminal result, kept verbatim
    Other(String),
}

impl DeploymentStatus {
    /// Classify a raw result string, ignoring case
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_uppercase().as_str() {
            "" | "NONE" => DeploymentStatus::Pending,
            "SCHEDULED FOR FUTURE" => DeploymentStatus::Scheduled,
            "SUCCEEDED" => DeploymentStatus::Succeeded,
            "FAULTED" => DeploymentStatus::Faulted,
            "FAILED TO START" => DeploymentStatus::FailedToStart,
            "CANCELED" => DeploymentStatus::Canceled,
            _ => DeploymentStatus::Other(trimmed.to_string()),
        }
    }

    /// No further state change will occur
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeploymentStatus::Pending | DeploymentStatus::Scheduled)
    }

    /// Terminal and unsuccessful
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            DeploymentStatus::Faulted | DeploymentStatus::FailedToStart | DeploymentStatus::Canceled
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeploymentStatus::Pending => "NONE",
            DeploymentStatus::Scheduled => "SCHEDULED FOR FUTURE",
            DeploymentStatus::Succeeded => "SUCCEEDED",
            DeploymentStatus::Faulted => "FAULTED",
            DeploymentStatus::FailedToStart => "FAILED TO START",
            DeploymentStatus::Canceled => "CANCELED",
            DeploymentStatus::Other(raw) => raw,
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
