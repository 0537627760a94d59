//! Single-flight sign-in.
//!
//! Concurrent sign-ins for the same operation key share one provider call
//! instead of racing on a process-wide "in progress" flag. The shared entry
//! is dropped once it has resolved, so the next sign-in starts a fresh flow.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use log::debug;

use super::identity_model::Identity;
use super::identity_traits::IdentityProviderTrait;
use crate::errors::{require_field, Error, Result};
use crate::profiles::{ProfileMerge, ProfileRepositoryTrait};
use crate::saga::SagaTracker;

type InFlight = Shared<BoxFuture<'static, std::result::Result<Identity, String>>>;

pub struct SignInService {
    provider: Arc<dyn IdentityProviderTrait>,
    profile_repository: Arc<dyn ProfileRepositoryTrait>,
    in_flight: DashMap<String, InFlight>,
}

impl SignInService {
    pub fn new(
        provider: Arc<dyn IdentityProviderTrait>,
        profile_repository: Arc<dyn ProfileRepositoryTrait>,
    ) -> Self {
        Self {
            provider,
            profile_repository,
            in_flight: DashMap::new(),
        }
    }

    /// Number of provider calls currently shared by callers.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Signs in through the provider and provisions the profile.
    ///
    /// Profile provisioning is best-effort: a failure there is logged and the
    /// identity is still returned, since reads treat a missing profile as
    /// "not provisioned yet".
    pub async fn sign_in(&self, operation: &str) -> Result<Identity> {
        require_field("operation", operation)?;

        let call = match self.in_flight.entry(operation.to_string()) {
            Entry::Occupied(existing) => {
                debug!("Joining in-flight sign-in '{}'", operation);
                existing.get().clone()
            }
            Entry::Vacant(slot) => {
                let provider = Arc::clone(&self.provider);
                let op = operation.to_string();
                let call = async move { provider.sign_in(&op).await.map_err(|e| e.to_string()) }
                    .boxed()
                    .shared();
                slot.insert(call.clone());
                call
            }
        };

        let outcome = call.await;
        // Only evict a resolved entry; a newer flow may already sit here.
        self.in_flight
            .remove_if(operation, |_, entry| entry.peek().is_some());

        let identity = outcome.map_err(Error::Identity)?;
        self.provision_profile(&identity).await;
        Ok(identity)
    }

    async fn provision_profile(&self, identity: &Identity) {
        let mut saga = SagaTracker::new("sign_in", identity.uid.as_str());
        saga.record("identity", Ok(())).ok();

        let existing = match saga.record_best_effort(
            "load_profile",
            self.profile_repository.find_by_id(&identity.uid),
        ) {
            Some(existing) => existing,
            None => return,
        };

        let mut merge = ProfileMerge {
            email: identity.email.clone(),
            ..ProfileMerge::new(identity.uid.as_str())
        };
        // A display name edited by the user wins over the provider's.
        if existing.as_ref().map_or(true, |p| p.display_name.is_none()) {
            merge.display_name = identity.display_name.clone();
        }
        saga.record_best_effort(
            "provision_profile",
            self.profile_repository.upsert_merge(merge).await,
        );
    }
}
