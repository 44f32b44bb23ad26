//! Application and property sheet API

use deploy_api::models::{ApplicationDetail, ApplicationSummary, PropertySheet, PropertyValue};

use crate::errors::DeployError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// List all applications visible to the user
    pub async fn get_applications(&self) -> Result<Vec<ApplicationSummary>, DeployError> {
        self.get("/rest/deploy/application", &[]).await
    }

    /// Get an application, including its property sheet reference
    pub async fn get_application(
        &self,
        application_id: &str,
    ) -> Result<ApplicationDetail, DeployError> {
        let path = format!("/rest/deploy/application/{}", application_id);
        self.get(&path, &[]).await
    }

    /// Get the properties of one property sheet version
    pub async fn get_property_sheet(
        &self,
        application_id: &str,
        version_count: &str,
    ) -> Result<Vec<PropertyValue>, DeployError> {
        let path = format!(
            "/property/propSheet/applications%26{}%26propSheet.{}",
            application_id, version_count
        );
        let sheet: PropertySheet = self.get(&path, &[]).await?;
        Ok(sheet.properties)
    }
}
