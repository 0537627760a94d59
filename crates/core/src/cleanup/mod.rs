//! Reference cleanup - prunes ids of deleted quests from profiles.

mod cleanup_model;
mod cleanup_service;

pub use cleanup_model::CleanupReport;
pub use cleanup_service::ReferenceCleanupService;
