//! Identity module - sign-in against the external identity provider.

mod identity_model;
mod identity_traits;
mod sign_in_service;

pub use identity_model::Identity;
pub use identity_traits::IdentityProviderTrait;
pub use sign_in_service::SignInService;
