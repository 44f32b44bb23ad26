//! HTTP client implementation

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::errors::DeployError;
use crate::storage::settings::ServerSettings;

/// HTTP client for the deployment server
pub struct HttpClient {
    client: Client,
    base_url: String,
    username: String,
    password: SecretString,
}

impl HttpClient {
    /// Create a client using the configured credentials
    pub fn new(settings: &ServerSettings) -> Result<Self, DeployError> {
        Self::with_credentials(settings, &settings.username, settings.password.clone())
    }

    /// Create a client that authenticates as a different user
    pub fn with_credentials(
        settings: &ServerSettings,
        username: &str,
        password: SecretString,
    ) -> Result<Self, DeployError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .danger_accept_invalid_certs(settings.trust_all_certs)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, DeployError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self.send(self.client.get(&url).query(query), &url).await?;
        Ok(response.json().await?)
    }

    /// Make a PUT request with a JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DeployError> {
        let url = self.url(path);
        debug!("PUT {}", url);

        let response = self.send(self.client.put(&url).json(body), &url).await?;
        Ok(response.json().await?)
    }

    /// Make a PUT request whose response body is ignored
    pub async fn put_unit<B: Serialize>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<(), DeployError> {
        let url = self.url(path);
        debug!("PUT {}", url);

        let mut request = self.client.put(&url).query(query);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request, &url).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, DeployError> {
        let response = request
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            error!("HTTP request to {} rejected: invalid credentials", url);
            return Err(DeployError::CommunicationError(
                "Error connecting to the deployment server: Invalid user and/or password"
                    .to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP request failed: {} - {}", status, body);
            return Err(DeployError::CommunicationError(format!(
                "{} using URI: {}: {}",
                status, url, body
            )));
        }

        Ok(response)
    }
}
