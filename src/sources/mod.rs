//! Remote collaborator interfaces
//!
//! The simulator talks to three external services: a secret store (combined
//! key+certificate PEM), a parameter store (topic name, publish interval), and
//! a broker endpoint lookup. Each is a trait seam so the publish loop and the
//! connection manager can be exercised against mocks.

use crate::error::SourceError;
use async_trait::async_trait;

pub mod http;

pub use http::{HttpEndpointResolver, HttpParameterStore, HttpSecretStore};

/// Remote store of sensitive strings, addressed by name.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch one opaque secret value. Absence is a hard failure.
    async fn fetch_secret(&self, name: &str) -> Result<String, SourceError>;
}

/// Remote configuration source for runtime-adjustable settings.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch the string value of a named setting.
    async fn get_parameter(&self, name: &str) -> Result<String, SourceError>;
}

/// Lookup of the broker's DNS name by endpoint category.
#[async_trait]
pub trait EndpointResolver: Send + Sync {
    /// Resolve the broker hostname for the given endpoint kind.
    async fn resolve(&self, kind: &str) -> Result<String, SourceError>;
}
