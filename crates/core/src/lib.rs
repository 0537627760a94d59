//! Questboard Core - Domain entities, services, and traits.
//!
//! This crate contains the business logic for quest meetups: quests and
//! their status machine, user profiles, the join-request workflow, the
//! append-only badge ledger and the completion rule derived from it.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod badges;
pub mod cleanup;
pub mod completion;
pub mod errors;
pub mod events;
pub mod identity;
pub mod join_requests;
pub mod profiles;
pub mod quests;
pub mod saga;
pub mod subscriptions;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
