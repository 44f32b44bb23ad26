//! Copies an application's non-secure properties into the property store

use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::DeployError;
use crate::service::DeploymentService;
use crate::storage::property_store::PropertyStore;

/// Harvests application properties after a successful deployment
pub struct PropertyPropagator<'a, S: DeploymentService + ?Sized> {
    service: &'a S,
    store: Arc<dyn PropertyStore>,
}

impl<'a, S: DeploymentService + ?Sized> PropertyPropagator<'a, S> {
    pub fn new(service: &'a S, store: Arc<dyn PropertyStore>) -> Self {
        Self { service, store }
    }

    /// Harvest and store properties, returning how many were written
    ///
    /// Every failure is reported as a [`DeployError::PropertyHarvestError`].
    pub async fn harvest(&self, application: &str) -> Result<usize, DeployError> {
        self.harvest_inner(application)
            .await
            .map_err(|e| match e {
                DeployError::PropertyHarvestError(_) => e,
                other => DeployError::PropertyHarvestError(other.to_string()),
            })
    }

    /// Harvest without ever failing; errors are logged
    pub async fn propagate(&self, application: &str) -> usize {
        info!("Starting application property fetching");
        let count = match self.harvest(application).await {
            Ok(count) => count,
            Err(e) => {
                warn!("Application property fetching failed: {}", e);
                0
            }
        };
        info!("End application property fetching");
        count
    }

    async fn harvest_inner(&self, application: &str) -> Result<usize, DeployError> {
        let applications = self.service.list_applications().await?;
        let application_id = applications
            .iter()
            .find(|app| app.name.eq_ignore_ascii_case(application))
            .map(|app| app.id.clone())
            .ok_or_else(|| {
                DeployError::PropertyHarvestError(format!(
                    "Application '{}' not found on the deployment server",
                    application
                ))
            })?;
        info!("Application id is {}", application_id);

        let detail = self.service.application_detail(&application_id).await?;
        let version_count = detail.prop_sheet.version_count;

        let properties = self
            .service
            .property_sheet_properties(&application_id, &version_count)
            .await?;

        let entries: Vec<(String, String)> = properties
            .into_iter()
            .filter(|p| !p.secure)
            .map(|p| {
                info!("Env : {}={}", p.name, p.value);
                (p.name, p.value)
            })
            .collect();

        if !entries.is_empty() {
            self.store.upsert_all(&entries).await?;
        }
        Ok(entries.len())
    }
}
