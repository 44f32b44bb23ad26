//! Storage layout configuration

use std::path::PathBuf;

use crate::filesys::file::File;

/// On-disk locations used by deployctl
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Base directory for all storage
    pub base_dir: PathBuf,
}

impl StorageLayout {
    /// Create a new storage layout
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Get the settings file path
    pub fn settings_file(&self) -> File {
        File::new(self.base_dir.join("settings.json"))
    }

    /// Get the shared property store file
    pub fn property_store_file(&self) -> File {
        File::new(self.base_dir.join("properties.json"))
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        // DEPLOYCTL_HOME wins, then /etc/deployctl on Linux, then the home directory
        if let Some(home) = std::env::var_os("DEPLOYCTL_HOME") {
            return Self::new(home);
        }

        #[cfg(target_os = "linux")]
        let base_dir = PathBuf::from("/etc/deployctl");

        #[cfg(not(target_os = "linux"))]
        let base_dir = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".deployctl");

        Self::new(base_dir)
    }
}
