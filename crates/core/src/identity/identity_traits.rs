use async_trait::async_trait;

use super::identity_model::Identity;
use crate::errors::Result;

/// External identity provider.
#[async_trait]
pub trait IdentityProviderTrait: Send + Sync {
    /// Runs the provider flow identified by `operation` (e.g. "google").
    async fn sign_in(&self, operation: &str) -> Result<Identity>;
}
