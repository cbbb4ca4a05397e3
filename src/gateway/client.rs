use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::GatewayError;

/// Shared GET-and-decode plumbing for the product services.
pub struct HttpGateway {
    http_client: reqwest::Client,
    base_url: String,
    name: &'static str,
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpGateway {
    pub fn new(name: &'static str, base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|source| GatewayError::Transport { gateway: name, source })?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            name,
        })
    }

    #[cfg(test)]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `<base><path>` and decode a JSON body from a 200 response
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(gateway = self.name, url = %url, "Calling gateway");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|source| GatewayError::Transport { gateway: self.name, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| GatewayError::Transport { gateway: self.name, source })?;

        if status != reqwest::StatusCode::OK {
            return Err(GatewayError::Status {
                gateway: self.name,
                status,
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| GatewayError::Decode {
            gateway: self.name,
            source,
        })
    }
}
