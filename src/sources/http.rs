//! HTTP-backed implementations of the remote collaborator traits
//!
//! Each store speaks a small JSON facade: one GET per lookup, the name passed
//! as a query parameter, the value returned in a single-field JSON object.

use super::{EndpointResolver, ParameterStore, SecretStore};
use crate::error::SourceError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ValueResponse {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddressResponse {
    address: Option<String>,
}

fn facade_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}

async fn get_checked(
    client: &reqwest::Client,
    url: &str,
    name: &str,
) -> Result<reqwest::Response, SourceError> {
    let response = client.get(url).query(&[("name", name)]).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response)
}

/// Secret store reached over HTTP: `GET {base}/secrets?name=...` returning
/// `{"value": "<combined PEM>"}`.
#[derive(Debug, Clone)]
pub struct HttpSecretStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSecretStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: facade_client(),
        }
    }
}

#[async_trait]
impl SecretStore for HttpSecretStore {
    async fn fetch_secret(&self, name: &str) -> Result<String, SourceError> {
        let url = format!("{}/secrets", self.base_url.trim_end_matches('/'));
        let response = get_checked(&self.client, &url, name).await?;
        let body: ValueResponse = response.json().await?;
        body.value
            .ok_or_else(|| SourceError::MissingField("value".to_string()))
    }
}

/// Parameter store reached over HTTP: `GET {base}/parameters?name=...`
/// returning `{"value": "..."}`.
#[derive(Debug, Clone)]
pub struct HttpParameterStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpParameterStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: facade_client(),
        }
    }
}

#[async_trait]
impl ParameterStore for HttpParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<String, SourceError> {
        let url = format!("{}/parameters", self.base_url.trim_end_matches('/'));
        let response = get_checked(&self.client, &url, name).await?;
        let body: ValueResponse = response.json().await?;
        body.value
            .ok_or_else(|| SourceError::MissingField("value".to_string()))
    }
}

/// Broker endpoint lookup over HTTP: `GET {base}/endpoints?name=<kind>`
/// returning `{"address": "<hostname>"}`.
#[derive(Debug, Clone)]
pub struct HttpEndpointResolver {
    base_url: String,
    client: reqwest::Client,
}

impl HttpEndpointResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: facade_client(),
        }
    }
}

#[async_trait]
impl EndpointResolver for HttpEndpointResolver {
    async fn resolve(&self, kind: &str) -> Result<String, SourceError> {
        let url = format!("{}/endpoints", self.base_url.trim_end_matches('/'));
        let response = get_checked(&self.client, &url, kind).await?;
        let body: AddressResponse = response.json().await?;
        body.address
            .ok_or_else(|| SourceError::MissingField("address".to_string()))
    }
}
